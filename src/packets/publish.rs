use super::prelude::*;

/// Carries an application message in either direction.
///
/// The QoS, DUP and RETAIN flags live in the fixed header. `packet_id` is only on the wire when QoS is above 0,
/// and is kept at 0 otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Publish {
    pub fixed_header: FixedHeader,
    pub topic_name: String,
    pub packet_id: u16,
    pub payload: Bytes,
}

impl Default for Publish {
    fn default() -> Publish {
        Publish {
            fixed_header: FixedHeader::new(PacketType::Publish),
            topic_name: String::new(),
            packet_id: 0,
            payload: Bytes::new(),
        }
    }
}

impl Publish {
    /// A QoS 0 message.
    pub fn new<S: Into<String>, P: Into<Bytes>>(topic_name: S, payload: P) -> Publish {
        let mut packet = Publish {
            topic_name: topic_name.into(),
            payload: payload.into(),
            ..Publish::default()
        };
        packet.sync_remaining_length();
        packet
    }

    /// Sets the QoS together with the packet id it needs; the id is dropped for QoS 0.
    pub fn with_qos(mut self, qos: QualityOfService, packet_id: u16) -> Publish {
        self.fixed_header.qos = qos;
        self.packet_id = if qos == QualityOfService::QoS0 { 0 } else { packet_id };
        self.sync_remaining_length();
        self
    }

    pub fn with_retain(mut self, retain: bool) -> Publish {
        self.fixed_header.retain = retain;
        self
    }

    pub fn with_dup(mut self, dup: bool) -> Publish {
        self.fixed_header.dup = dup;
        self
    }

    pub fn qos(&self) -> QualityOfService {
        self.fixed_header.qos
    }

    pub fn retain(&self) -> bool {
        self.fixed_header.retain
    }

    pub fn dup(&self) -> bool {
        self.fixed_header.dup
    }
}

fn publish_body(fixed_header: FixedHeader, input: &[u8]) -> ParserResult<Publish> {
    let (input, topic_name) = mqtt_string(input)?;
    let (input, packet_id) = if fixed_header.qos != QualityOfService::QoS0 {
        packet_id(input)?
    } else {
        (input, 0)
    };

    let payload = Bytes::copy_from_slice(input);
    Ok((
        &input[input.len()..],
        Publish {
            fixed_header,
            topic_name,
            packet_id,
            payload,
        },
    ))
}

impl ControlPacket for Publish {
    const PACKET_TYPE: PacketType = PacketType::Publish;

    fn fixed_header(&self) -> &FixedHeader {
        &self.fixed_header
    }

    fn fixed_header_mut(&mut self) -> &mut FixedHeader {
        &mut self.fixed_header
    }

    fn packet_id(&self) -> Option<u16> {
        if self.qos() == QualityOfService::QoS0 {
            None
        } else {
            Some(self.packet_id)
        }
    }

    fn check_fields(&self) -> Result<(), EncodeError> {
        self.topic_name.check_encodable()
    }

    fn body_len(&self) -> usize {
        let id_len = if self.qos() == QualityOfService::QoS0 { 0 } else { 2 };
        self.topic_name.encoded_length() + id_len + self.payload.len()
    }

    fn encode_body<B: BufMut>(&self, out: &mut B) -> Result<(), EncodeError> {
        self.topic_name.encode(out)?;
        if self.qos() != QualityOfService::QoS0 {
            out.put_u16(self.packet_id);
        }
        out.put_slice(&self.payload);
        Ok(())
    }

    fn parse_body(fixed_header: FixedHeader, body: &[u8]) -> Result<Publish, DecodeError> {
        parsers::body(body, |input| publish_body(fixed_header, input))
    }

    fn validate(&self) -> Result<ReturnCode, ValidationError> {
        rules::check_flags(&self.fixed_header)?;
        rules::check_packet_id(&self.fixed_header, self.packet_id)?;
        if self.qos() == QualityOfService::QoS0 {
            ensure!(self.packet_id == 0, UnexpectedPacketId);
            ensure!(!self.dup(), DupWithQos0);
        }
        validate_topic_name(&self.topic_name)?;
        Ok(ReturnCode::Accepted)
    }
}
