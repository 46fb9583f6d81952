use super::prelude::*;

/// Removes one or more subscriptions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unsubscribe {
    pub fixed_header: FixedHeader,
    pub packet_id: u16,
    pub topic_filters: Vec<String>,
}

impl Default for Unsubscribe {
    fn default() -> Unsubscribe {
        Unsubscribe {
            fixed_header: FixedHeader::new(PacketType::Unsubscribe),
            packet_id: 0,
            topic_filters: Vec::new(),
        }
    }
}

impl Unsubscribe {
    pub fn new(packet_id: u16, topic_filters: Vec<String>) -> Unsubscribe {
        let mut packet = Unsubscribe {
            packet_id,
            topic_filters,
            ..Unsubscribe::default()
        };
        packet.sync_remaining_length();
        packet
    }
}

fn unsubscribe_body(fixed_header: FixedHeader, input: &[u8]) -> ParserResult<Unsubscribe> {
    let (mut input, packet_id) = packet_id(input)?;
    let mut topic_filters = Vec::new();
    while !input.is_empty() {
        let (rest, filter) = mqtt_string(input)?;
        topic_filters.push(filter);
        input = rest;
    }

    Ok((
        input,
        Unsubscribe {
            fixed_header,
            packet_id,
            topic_filters,
        },
    ))
}

impl ControlPacket for Unsubscribe {
    const PACKET_TYPE: PacketType = PacketType::Unsubscribe;

    fn fixed_header(&self) -> &FixedHeader {
        &self.fixed_header
    }

    fn fixed_header_mut(&mut self) -> &mut FixedHeader {
        &mut self.fixed_header
    }

    fn packet_id(&self) -> Option<u16> {
        Some(self.packet_id)
    }

    fn check_fields(&self) -> Result<(), EncodeError> {
        self.topic_filters.check_encodable()
    }

    fn body_len(&self) -> usize {
        2 + self.topic_filters.encoded_length()
    }

    fn encode_body<B: BufMut>(&self, out: &mut B) -> Result<(), EncodeError> {
        out.put_u16(self.packet_id);
        self.topic_filters.encode(out)
    }

    fn parse_body(fixed_header: FixedHeader, body: &[u8]) -> Result<Unsubscribe, DecodeError> {
        parsers::body(body, |input| unsubscribe_body(fixed_header, input))
    }

    fn validate(&self) -> Result<ReturnCode, ValidationError> {
        rules::check_flags(&self.fixed_header)?;
        rules::check_packet_id(&self.fixed_header, self.packet_id)?;
        ensure!(!self.topic_filters.is_empty(), EmptyPayload { ty: PacketType::Unsubscribe });
        for filter in &self.topic_filters {
            validate_topic_filter(filter)?;
        }
        Ok(ReturnCode::Accepted)
    }
}
