use super::check_length;
use super::prelude::*;

/// The server's answer to a CONNECT.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnAck {
    pub fixed_header: FixedHeader,
    pub session_present: bool,
    pub return_code: ReturnCode,
}

impl Default for ConnAck {
    fn default() -> ConnAck {
        ConnAck {
            fixed_header: FixedHeader::new(PacketType::ConnAck),
            session_present: false,
            return_code: ReturnCode::Accepted,
        }
    }
}

impl ConnAck {
    pub fn new(session_present: bool, return_code: ReturnCode) -> ConnAck {
        let mut packet = ConnAck {
            session_present,
            return_code,
            ..ConnAck::default()
        };
        packet.sync_remaining_length();
        packet
    }

    pub fn flags(&self) -> ConnAckFlags {
        let mut flags = ConnAckFlags::empty();
        flags.set(ConnAckFlags::SP, self.session_present);
        flags
    }
}

impl ControlPacket for ConnAck {
    const PACKET_TYPE: PacketType = PacketType::ConnAck;

    fn fixed_header(&self) -> &FixedHeader {
        &self.fixed_header
    }

    fn fixed_header_mut(&mut self) -> &mut FixedHeader {
        &mut self.fixed_header
    }

    fn body_len(&self) -> usize {
        2
    }

    fn encode_body<B: BufMut>(&self, out: &mut B) -> Result<(), EncodeError> {
        out.put_u8(self.flags().bits());
        out.put_u8(self.return_code as u8);
        Ok(())
    }

    fn parse_body(fixed_header: FixedHeader, body: &[u8]) -> Result<ConnAck, DecodeError> {
        check_length(PacketType::ConnAck, 2, body)?;
        let flags = ConnAckFlags::try_from(body[0])?;
        let return_code = ReturnCode::try_from(body[1])?;

        Ok(ConnAck {
            fixed_header,
            session_present: flags.session_present(),
            return_code,
        })
    }

    /// A well formed CONNACK validates to the return code it carries.
    fn validate(&self) -> Result<ReturnCode, ValidationError> {
        rules::check_flags(&self.fixed_header)?;
        ensure!(
            self.return_code.is_accepted() || !self.session_present,
            SessionPresentOnRefusal
        );
        Ok(self.return_code)
    }
}
