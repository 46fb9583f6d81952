use super::prelude::*;

/// The server's answer to a SUBSCRIBE, one return code per requested filter in request order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubAck {
    pub fixed_header: FixedHeader,
    pub packet_id: u16,
    pub return_codes: Vec<SubAckReturnCode>,
}

impl Default for SubAck {
    fn default() -> SubAck {
        SubAck {
            fixed_header: FixedHeader::new(PacketType::SubAck),
            packet_id: 0,
            return_codes: Vec::new(),
        }
    }
}

impl SubAck {
    pub fn new(packet_id: u16, return_codes: Vec<SubAckReturnCode>) -> SubAck {
        let mut packet = SubAck {
            packet_id,
            return_codes,
            ..SubAck::default()
        };
        packet.sync_remaining_length();
        packet
    }
}

fn sub_ack_body(fixed_header: FixedHeader, input: &[u8]) -> ParserResult<SubAck> {
    let (input, packet_id) = packet_id(input)?;
    let mut return_codes = Vec::with_capacity(input.len());
    for &code in input {
        match SubAckReturnCode::try_from(code) {
            Ok(code) => return_codes.push(code),
            Err(e) => return failure(e),
        }
    }

    Ok((
        &input[input.len()..],
        SubAck {
            fixed_header,
            packet_id,
            return_codes,
        },
    ))
}

impl ControlPacket for SubAck {
    const PACKET_TYPE: PacketType = PacketType::SubAck;

    fn fixed_header(&self) -> &FixedHeader {
        &self.fixed_header
    }

    fn fixed_header_mut(&mut self) -> &mut FixedHeader {
        &mut self.fixed_header
    }

    fn packet_id(&self) -> Option<u16> {
        Some(self.packet_id)
    }

    fn body_len(&self) -> usize {
        2 + self.return_codes.encoded_length()
    }

    fn encode_body<B: BufMut>(&self, out: &mut B) -> Result<(), EncodeError> {
        out.put_u16(self.packet_id);
        self.return_codes.encode(out)
    }

    fn parse_body(fixed_header: FixedHeader, body: &[u8]) -> Result<SubAck, DecodeError> {
        parsers::body(body, |input| sub_ack_body(fixed_header, input))
    }

    fn validate(&self) -> Result<ReturnCode, ValidationError> {
        rules::check_flags(&self.fixed_header)?;
        rules::check_packet_id(&self.fixed_header, self.packet_id)?;
        ensure!(!self.return_codes.is_empty(), EmptyPayload { ty: PacketType::SubAck });
        Ok(ReturnCode::Accepted)
    }
}
