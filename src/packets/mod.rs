//! The fourteen MQTT 3.1.1 control packets.
//!
//! Every variant implements [`ControlPacket`], which supplies the framing shared by all of them: the fixed header
//! is written with a freshly computed remaining length, decoding is all-or-nothing and validation starts from
//! the per-type rules table. [`Packet`] wraps the variants for callers that only learn the type at runtime.

use std::convert::TryFrom;
use std::io::Write;

use bytes::BufMut;
use snafu::{ensure, ResultExt};

#[macro_use]
mod macros;

pub mod connect;
pub mod conn_ack;
pub mod publish;
pub mod pub_resp;
pub mod subscribe;
pub mod sub_ack;
pub mod unsubscribe;
pub mod unsub_ack;
pub mod ping;
pub mod disconnect;

mod prelude {
    pub(crate) use bytes::{BufMut, Bytes};
    pub(crate) use snafu::ensure;
    pub(crate) use std::convert::TryFrom;

    pub(crate) use super::ControlPacket;
    pub(crate) use crate::errors::*;
    pub(crate) use crate::header::FixedHeader;
    pub(crate) use crate::parsers::{self, binary, byte, failure, mqtt_string, packet_id, uint16, ParserResult};
    pub(crate) use crate::rules;
    pub(crate) use crate::topic::{check_string, validate_topic_filter, validate_topic_name};
    pub(crate) use crate::types::*;
}

pub use self::conn_ack::ConnAck;
pub use self::connect::{Connect, LastWill, LastWillBuilder};
pub use self::disconnect::Disconnect;
pub use self::ping::{PingReq, PingResp};
pub use self::pub_resp::{PubAck, PubComp, PubRec, PubRel};
pub use self::publish::Publish;
pub use self::sub_ack::SubAck;
pub use self::subscribe::{Subscribe, Subscription};
pub use self::unsub_ack::UnsubAck;
pub use self::unsubscribe::Unsubscribe;

use crate::errors::*;
use crate::header::FixedHeader;
use crate::types::{PacketType, ReturnCode};
use crate::vle::{self, MAX_REMAINING_LENGTH};

/// Behaviour shared by every control packet.
///
/// Implementors provide the variable header and payload handling; the fixed header, size bookkeeping and
/// atomic decoding come from the provided methods.
pub trait ControlPacket: Default + Sized {
    const PACKET_TYPE: PacketType;

    fn fixed_header(&self) -> &FixedHeader;

    fn fixed_header_mut(&mut self) -> &mut FixedHeader;

    /// Byte count of the variable header plus payload.
    fn body_len(&self) -> usize;

    /// Writes the variable header and payload.
    fn encode_body<B: BufMut>(&self, out: &mut B) -> Result<(), EncodeError>;

    /// Builds a packet from a complete body. `fixed_header` already carries the body length.
    fn parse_body(fixed_header: FixedHeader, body: &[u8]) -> Result<Self, DecodeError>;

    /// Checks the packet against the protocol rules, returning the return code a server should answer with.
    fn validate(&self) -> Result<ReturnCode, ValidationError>;

    fn packet_id(&self) -> Option<u16> {
        None
    }

    /// Fails if a length prefixed field is too long for its 16 bit prefix.
    fn check_fields(&self) -> Result<(), EncodeError> {
        Ok(())
    }

    /// Total encoded size, fixed header included. Fails for packets that cannot be encoded at all.
    fn encoded_len(&self) -> Result<usize, EncodeError> {
        self.check_fields()?;
        let body = self.body_len();
        Ok(1 + vle::encoded_len(body)? + body)
    }

    /// Writes the whole packet. Nothing is written when the packet cannot be encoded or does not fit in `out`.
    fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), EncodeError> {
        let needed = self.encoded_len()?;
        let available = out.remaining_mut();
        ensure!(available >= needed, InsufficientCapacity { needed, available });

        let mut header = *self.fixed_header();
        header.packet_type = Self::PACKET_TYPE;
        header.remaining_length = self.body_len() as u32;
        header.encode(out)?;
        self.encode_body(out)
    }

    /// Replaces the variable header and payload with the contents of `body`.
    ///
    /// The flags already in the fixed header are kept. On error the packet is left as it was.
    fn decode(&mut self, body: &[u8]) -> Result<(), DecodeError> {
        ensure!(body.len() <= MAX_REMAINING_LENGTH as usize, MalformedLength);

        let mut header = *self.fixed_header();
        header.remaining_length = body.len() as u32;
        *self = Self::parse_body(header, body)?;
        Ok(())
    }

    /// Stores the current body length in the fixed header.
    fn sync_remaining_length(&mut self) {
        let len = self.body_len() as u32;
        self.fixed_header_mut().remaining_length = len;
    }

    /// Returns the packet to its empty state.
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Fails unless a fixed size body is exactly `expected` bytes long.
pub(crate) fn check_length(ty: PacketType, expected: usize, body: &[u8]) -> Result<(), DecodeError> {
    ensure!(body.len() == expected, LengthMismatch { ty, expected, actual: body.len() });
    Ok(())
}

/// Any control packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Packet {
    Connect(Connect),
    ConnAck(ConnAck),
    Publish(Publish),
    PubAck(PubAck),
    PubRec(PubRec),
    PubRel(PubRel),
    PubComp(PubComp),
    Subscribe(Subscribe),
    SubAck(SubAck),
    Unsubscribe(Unsubscribe),
    UnsubAck(UnsubAck),
    PingReq(PingReq),
    PingResp(PingResp),
    Disconnect(Disconnect),
}

macro_rules! dispatch {
    ($packet:expr, $p:ident => $body:expr) => {
        match $packet {
            Packet::Connect($p) => $body,
            Packet::ConnAck($p) => $body,
            Packet::Publish($p) => $body,
            Packet::PubAck($p) => $body,
            Packet::PubRec($p) => $body,
            Packet::PubRel($p) => $body,
            Packet::PubComp($p) => $body,
            Packet::Subscribe($p) => $body,
            Packet::SubAck($p) => $body,
            Packet::Unsubscribe($p) => $body,
            Packet::UnsubAck($p) => $body,
            Packet::PingReq($p) => $body,
            Packet::PingResp($p) => $body,
            Packet::Disconnect($p) => $body,
        }
    };
}

macro_rules! packet_from {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Packet {
                fn from(packet: $variant) -> Packet {
                    Packet::$variant(packet)
                }
            }
        )*
    };
}

packet_from!(
    Connect, ConnAck, Publish, PubAck, PubRec, PubRel, PubComp, Subscribe, SubAck, Unsubscribe, UnsubAck,
    PingReq, PingResp, Disconnect
);

impl Packet {
    /// An empty packet for a raw type value, 1 (CONNECT) through 14 (DISCONNECT).
    pub fn new(ty: u8) -> Result<Packet, DecodeError> {
        PacketType::try_from(ty).map(Packet::from_type)
    }

    /// An empty packet of the given type.
    pub fn from_type(ty: PacketType) -> Packet {
        match ty {
            PacketType::Connect => Packet::Connect(Connect::default()),
            PacketType::ConnAck => Packet::ConnAck(ConnAck::default()),
            PacketType::Publish => Packet::Publish(Publish::default()),
            PacketType::PubAck => Packet::PubAck(PubAck::default()),
            PacketType::PubRec => Packet::PubRec(PubRec::default()),
            PacketType::PubRel => Packet::PubRel(PubRel::default()),
            PacketType::PubComp => Packet::PubComp(PubComp::default()),
            PacketType::Subscribe => Packet::Subscribe(Subscribe::default()),
            PacketType::SubAck => Packet::SubAck(SubAck::default()),
            PacketType::Unsubscribe => Packet::Unsubscribe(Unsubscribe::default()),
            PacketType::UnsubAck => Packet::UnsubAck(UnsubAck::default()),
            PacketType::PingReq => Packet::PingReq(PingReq::default()),
            PacketType::PingResp => Packet::PingResp(PingResp::default()),
            PacketType::Disconnect => Packet::Disconnect(Disconnect::default()),
        }
    }

    /// Decodes a packet from its first header byte and its complete body.
    pub fn decode(header_byte: u8, body: &[u8]) -> Result<Packet, DecodeError> {
        let header = FixedHeader::decode(header_byte)?;
        let mut packet = Packet::from_type(header.packet_type);
        *packet.fixed_header_mut() = header;
        packet.decode_body(body)?;
        Ok(packet)
    }

    /// Replaces this packet's body, keeping its type and flags.
    pub fn decode_body(&mut self, body: &[u8]) -> Result<(), DecodeError> {
        dispatch!(self, p => p.decode(body))
    }

    pub fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), EncodeError> {
        dispatch!(self, p => p.encode(out))
    }

    /// Encodes the packet and writes it to `w` in one call.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<(), EncodeError> {
        let mut buf = Vec::with_capacity(self.encoded_len()?);
        self.encode(&mut buf)?;
        w.write_all(&buf).context(Io)
    }

    pub fn encoded_len(&self) -> Result<usize, EncodeError> {
        dispatch!(self, p => p.encoded_len())
    }

    pub fn validate(&self) -> Result<ReturnCode, ValidationError> {
        dispatch!(self, p => p.validate())
    }

    pub fn reset(&mut self) {
        dispatch!(self, p => p.reset())
    }

    pub fn sync_remaining_length(&mut self) {
        dispatch!(self, p => p.sync_remaining_length())
    }

    pub fn packet_type(&self) -> PacketType {
        dispatch!(self, p => p.fixed_header().packet_type)
    }

    pub fn fixed_header(&self) -> &FixedHeader {
        dispatch!(self, p => p.fixed_header())
    }

    pub fn fixed_header_mut(&mut self) -> &mut FixedHeader {
        dispatch!(self, p => p.fixed_header_mut())
    }

    pub fn packet_id(&self) -> Option<u16> {
        dispatch!(self, p => p.packet_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QualityOfService;

    #[test]
    fn registry_covers_every_type() {
        for ty in 1..=14u8 {
            let packet = Packet::new(ty).unwrap();
            assert_eq!(packet.packet_type() as u8, ty);
            assert_eq!(packet.fixed_header().remaining_length, 0);
        }
        assert_eq!(Packet::new(0), Err(DecodeError::UnknownType { ty: 0 }));
        assert_eq!(Packet::new(15), Err(DecodeError::UnknownType { ty: 15 }));
    }

    #[test]
    fn decode_keeps_header_flags() {
        let packet = Packet::decode(0x62, &[0x00, 0x0A]).unwrap();
        assert_eq!(packet, Packet::PubRel(PubRel::new(10)));
        assert_eq!(packet.fixed_header().qos, QualityOfService::QoS1);
        assert_eq!(packet.packet_id(), Some(10));
    }

    #[test]
    fn failed_decode_leaves_packet_untouched() {
        let mut packet = Packet::from(PubAck::new(7));
        assert_eq!(
            packet.decode_body(&[0x00]),
            Err(DecodeError::LengthMismatch { ty: PacketType::PubAck, expected: 2, actual: 1 })
        );
        assert_eq!(packet, Packet::PubAck(PubAck::new(7)));
    }

    #[test]
    fn insufficient_capacity_writes_nothing() {
        let packet = Packet::from(PubAck::new(7));
        let mut storage = [0u8; 3];
        let mut out = &mut storage[..];
        match packet.encode(&mut out) {
            Err(EncodeError::InsufficientCapacity { needed, available }) => {
                assert_eq!(needed, 4);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(storage, [0u8; 3]);
    }

    #[test]
    fn write_to_sink() {
        let mut sink = Vec::new();
        Packet::from(PingReq::new()).write_to(&mut sink).unwrap();
        assert_eq!(sink, vec![0xC0, 0x00]);
    }

    #[test]
    fn reset_returns_to_empty() {
        let mut packet = Packet::from(Subscribe::new(
            3,
            vec![Subscription::new("a/b", QualityOfService::QoS1)],
        ));
        packet.reset();
        assert_eq!(packet, Packet::from_type(PacketType::Subscribe));
    }
}
