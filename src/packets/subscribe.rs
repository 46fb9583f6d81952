use super::prelude::*;

/// One topic filter of a SUBSCRIBE and the maximum QoS requested for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscription {
    pub topic_filter: String,
    pub qos: QualityOfService,
}

impl Subscription {
    pub fn new<S: Into<String>>(topic_filter: S, qos: QualityOfService) -> Subscription {
        Subscription {
            topic_filter: topic_filter.into(),
            qos,
        }
    }
}

impl Encodable for Subscription {
    fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), EncodeError> {
        self.topic_filter.encode(out)?;
        self.qos.encode(out)
    }

    fn encoded_length(&self) -> usize {
        self.topic_filter.encoded_length() + self.qos.encoded_length()
    }

    fn check_encodable(&self) -> Result<(), EncodeError> {
        self.topic_filter.check_encodable()
    }
}

/// Requests one or more subscriptions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscribe {
    pub fixed_header: FixedHeader,
    pub packet_id: u16,
    pub subscriptions: Vec<Subscription>,
}

impl Default for Subscribe {
    fn default() -> Subscribe {
        Subscribe {
            fixed_header: FixedHeader::new(PacketType::Subscribe),
            packet_id: 0,
            subscriptions: Vec::new(),
        }
    }
}

impl Subscribe {
    pub fn new(packet_id: u16, subscriptions: Vec<Subscription>) -> Subscribe {
        let mut packet = Subscribe {
            packet_id,
            subscriptions,
            ..Subscribe::default()
        };
        packet.sync_remaining_length();
        packet
    }
}

fn subscription(input: &[u8]) -> ParserResult<Subscription> {
    let (input, topic_filter) = mqtt_string(input)?;
    let (input, options) = byte(input)?;
    if options & 0b1111_1100 != 0 {
        return failure(DecodeError::InvalidSubscriptionOptions { options });
    }
    match QualityOfService::try_from(options) {
        Ok(qos) => Ok((input, Subscription { topic_filter, qos })),
        Err(e) => failure(e),
    }
}

fn subscribe_body(fixed_header: FixedHeader, input: &[u8]) -> ParserResult<Subscribe> {
    let (mut input, packet_id) = packet_id(input)?;
    let mut subscriptions = Vec::new();
    while !input.is_empty() {
        let (rest, sub) = subscription(input)?;
        subscriptions.push(sub);
        input = rest;
    }

    Ok((
        input,
        Subscribe {
            fixed_header,
            packet_id,
            subscriptions,
        },
    ))
}

impl ControlPacket for Subscribe {
    const PACKET_TYPE: PacketType = PacketType::Subscribe;

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
        self.subscriptions.check_encodable()
    }

    fn body_len(&self) -> usize {
        2 + self.subscriptions.encoded_length()
    }

    fn encode_body<B: BufMut>(&self, out: &mut B) -> Result<(), EncodeError> {
        out.put_u16(self.packet_id);
        self.subscriptions.encode(out)
    }

    fn parse_body(fixed_header: FixedHeader, body: &[u8]) -> Result<Subscribe, DecodeError> {
        parsers::body(body, |input| subscribe_body(fixed_header, input))
    }

    fn validate(&self) -> Result<ReturnCode, ValidationError> {
        rules::check_flags(&self.fixed_header)?;
        rules::check_packet_id(&self.fixed_header, self.packet_id)?;
        ensure!(!self.subscriptions.is_empty(), EmptyPayload { ty: PacketType::Subscribe });
        for sub in &self.subscriptions {
            validate_topic_filter(&sub.topic_filter)?;
        }
        Ok(ReturnCode::Accepted)
    }
}
