use bytes::{BufMut, Bytes};
use enum_primitive::FromPrimitive;
use snafu::ensure;
use std::convert::TryFrom;
use std::fmt;

use crate::errors::{BinaryTooLong, DecodeError, EncodeError, InvalidConnectFlags, StringTooLong, ValidationError};

bitflags! {
    /// The low nibble of the first fixed header byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PacketFlags: u8 {
        const DUP  = 0b1000;
        const QOS2 = 0b0100;
        const QOS1 = 0b0010;
        const RET  = 0b0001;
    }
}

impl PacketFlags {
    pub fn is_retain(&self) -> bool {
        self.intersects(Self::RET)
    }

    pub fn is_duplicate(&self) -> bool {
        self.intersects(Self::DUP)
    }

    /// The raw two QoS bits, which may be the illegal value 3.
    pub fn qos_bits(&self) -> u8 {
        (self.bits() & 0b0110) >> 1
    }
}

impl From<QualityOfService> for PacketFlags {
    fn from(value: QualityOfService) -> PacketFlags {
        match value {
            QualityOfService::QoS0 => PacketFlags::empty(),
            QualityOfService::QoS1 => PacketFlags::QOS1,
            QualityOfService::QoS2 => PacketFlags::QOS2,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ConnFlags: u8 {
        const USERNAME    = 0b1000_0000;
        const PASSWORD    = 0b0100_0000;
        const WILL_RETAIN = 0b0010_0000;
        const WILL_QOS2   = 0b0001_0000;
        const WILL_QOS1   = 0b0000_1000;
        const WILL_FLAG   = 0b0000_0100;
        const CLEAN_SESS  = 0b0000_0010;
    }
}

impl ConnFlags {
    fn will_qos_bits(&self) -> u8 {
        (self.bits() & 0b0001_1000) >> 3
    }
}

/// Parses the connect flags byte, rejecting the combinations 3.1.1 forbids: the reserved bit, will QoS/retain
/// without a will, will QoS 3 and a password without a username.
impl TryFrom<u8> for ConnFlags {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<ConnFlags, DecodeError> {
        let flags = ConnFlags::from_bits(value).ok_or(DecodeError::InvalidConnectFlags { flags: value })?;
        let will_bits = ConnFlags::WILL_RETAIN | ConnFlags::WILL_QOS1 | ConnFlags::WILL_QOS2;

        ensure!(
            flags.contains(ConnFlags::WILL_FLAG) || !flags.intersects(will_bits),
            InvalidConnectFlags { flags: value }
        );
        ensure!(flags.will_qos_bits() != 3, InvalidConnectFlags { flags: value });
        ensure!(
            flags.contains(ConnFlags::USERNAME) || !flags.contains(ConnFlags::PASSWORD),
            InvalidConnectFlags { flags: value }
        );

        Ok(flags)
    }
}

impl From<QualityOfService> for ConnFlags {
    fn from(value: QualityOfService) -> ConnFlags {
        match value {
            QualityOfService::QoS0 => ConnFlags::empty(),
            QualityOfService::QoS1 => ConnFlags::WILL_QOS1,
            QualityOfService::QoS2 => ConnFlags::WILL_QOS2,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ConnAckFlags: u8 {
        const SP = 0b0001;
    }
}

impl ConnAckFlags {
    pub fn session_present(&self) -> bool {
        self.intersects(Self::SP)
    }
}

impl TryFrom<u8> for ConnAckFlags {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<ConnAckFlags, DecodeError> {
        ConnAckFlags::from_bits(value).ok_or(DecodeError::InvalidConnAckFlags { flags: value })
    }
}

enum_from_primitive! {
    /// Types of packets in the MQTT Protocol.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum PacketType {
        Connect     = 1,
        ConnAck     = 2,
        Publish     = 3,
        PubAck      = 4,
        PubRec      = 5,
        PubRel      = 6,
        PubComp     = 7,
        Subscribe   = 8,
        SubAck      = 9,
        Unsubscribe = 10,
        UnsubAck    = 11,
        PingReq     = 12,
        PingResp    = 13,
        Disconnect  = 14,
    }
}

impl TryFrom<u8> for PacketType {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<PacketType, DecodeError> {
        PacketType::from_u8(value).ok_or(DecodeError::UnknownType { ty: value })
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::PacketType::*;
        match self {
            Connect => write!(f, "CONNECT"),
            ConnAck => write!(f, "CONNACK"),
            Publish => write!(f, "PUBLISH"),
            PubAck => write!(f, "PUBACK"),
            PubRec => write!(f, "PUBREC"),
            PubRel => write!(f, "PUBREL"),
            PubComp => write!(f, "PUBCOMP"),
            Subscribe => write!(f, "SUBSCRIBE"),
            SubAck => write!(f, "SUBACK"),
            Unsubscribe => write!(f, "UNSUBSCRIBE"),
            UnsubAck => write!(f, "UNSUBACK"),
            PingReq => write!(f, "PINGREQ"),
            PingResp => write!(f, "PINGRESP"),
            Disconnect => write!(f, "DISCONNECT"),
        }
    }
}

enum_from_primitive! {
    /// Connection return codes carried by CONNACK, and the outcome of validating a packet.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum ReturnCode {
        Accepted                    = 0,
        UnacceptableProtocolVersion = 1,
        IdentifierRejected          = 2,
        ServerUnavailable           = 3,
        BadUsernameOrPassword       = 4,
        NotAuthorized               = 5,
    }
}

impl ReturnCode {
    pub fn is_accepted(&self) -> bool {
        *self == ReturnCode::Accepted
    }
}

impl Default for ReturnCode {
    fn default() -> ReturnCode {
        ReturnCode::Accepted
    }
}

impl TryFrom<u8> for ReturnCode {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<ReturnCode, DecodeError> {
        ReturnCode::from_u8(value).ok_or(DecodeError::InvalidReturnCode { code: value })
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let reason = match self {
            ReturnCode::Accepted => "connection accepted",
            ReturnCode::UnacceptableProtocolVersion => "unacceptable protocol version",
            ReturnCode::IdentifierRejected => "identifier rejected",
            ReturnCode::ServerUnavailable => "server unavailable",
            ReturnCode::BadUsernameOrPassword => "bad user name or password",
            ReturnCode::NotAuthorized => "not authorized",
        };
        write!(f, "{:#04x} {}", *self as u8, reason)
    }
}

enum_from_primitive! {
    /// The protocol version used by a connection.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    #[allow(non_camel_case_types)]
    pub enum ProtoLvl {
        V3_1   = 3,
        V3_1_1 = 4,
    }
}

impl ProtoLvl {
    /// The protocol name a CONNECT at this level must carry.
    pub fn protocol_name(&self) -> &'static str {
        match self {
            ProtoLvl::V3_1 => "MQIsdp",
            ProtoLvl::V3_1_1 => "MQTT",
        }
    }
}

impl TryFrom<u8> for ProtoLvl {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<ProtoLvl, ValidationError> {
        ProtoLvl::from_u8(value).ok_or(ValidationError::UnsupportedProtocolLevel { level: value })
    }
}

enum_from_primitive! {
    /// Delivery guarantee requested for a message.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
    pub enum QualityOfService {
        QoS0 = 0,
        QoS1 = 1,
        QoS2 = 2
    }
}

impl Default for QualityOfService {
    fn default() -> QualityOfService {
        QualityOfService::QoS0
    }
}

impl TryFrom<u8> for QualityOfService {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<QualityOfService, DecodeError> {
        QualityOfService::from_u8(value).ok_or(DecodeError::InvalidQos { qos: value })
    }
}

impl From<ConnFlags> for QualityOfService {
    fn from(value: ConnFlags) -> QualityOfService {
        if value.intersects(ConnFlags::WILL_QOS2) {
            QualityOfService::QoS2
        } else if value.intersects(ConnFlags::WILL_QOS1) {
            QualityOfService::QoS1
        } else {
            QualityOfService::QoS0
        }
    }
}

impl fmt::Display for QualityOfService {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QualityOfService::QoS0 => write!(f, "QOS0"),
            QualityOfService::QoS1 => write!(f, "QOS1"),
            QualityOfService::QoS2 => write!(f, "QOS2"),
        }
    }
}

enum_from_primitive! {
    /// Per-filter result carried by a SUBACK.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum SubAckReturnCode {
        MaxQoS0 = 0,
        MaxQoS1 = 1,
        MaxQoS2 = 2,
        Failure = 128,
    }
}

impl SubAckReturnCode {
    /// The granted QoS, or `None` when the subscription was refused.
    pub fn granted(&self) -> Option<QualityOfService> {
        match self {
            SubAckReturnCode::MaxQoS0 => Some(QualityOfService::QoS0),
            SubAckReturnCode::MaxQoS1 => Some(QualityOfService::QoS1),
            SubAckReturnCode::MaxQoS2 => Some(QualityOfService::QoS2),
            SubAckReturnCode::Failure => None,
        }
    }
}

impl From<Option<QualityOfService>> for SubAckReturnCode {
    fn from(value: Option<QualityOfService>) -> SubAckReturnCode {
        match value {
            Some(QualityOfService::QoS0) => SubAckReturnCode::MaxQoS0,
            Some(QualityOfService::QoS1) => SubAckReturnCode::MaxQoS1,
            Some(QualityOfService::QoS2) => SubAckReturnCode::MaxQoS2,
            None => SubAckReturnCode::Failure,
        }
    }
}

impl TryFrom<u8> for SubAckReturnCode {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<SubAckReturnCode, DecodeError> {
        SubAckReturnCode::from_u8(value).ok_or(DecodeError::InvalidSubAckReturnCode { code: value })
    }
}

pub(crate) trait Encodable {
    // Encodes the packet section into a buffer.
    fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), EncodeError>;
    // Returns the size of the encoded section.
    fn encoded_length(&self) -> usize;
    // Fails if the section cannot be written, without writing anything.
    fn check_encodable(&self) -> Result<(), EncodeError> {
        Ok(())
    }
}

impl<T: Encodable> Encodable for Vec<T> {
    fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), EncodeError> {
        for item in self {
            item.encode(out)?;
        }
        Ok(())
    }

    fn check_encodable(&self) -> Result<(), EncodeError> {
        self.iter().try_for_each(|item| item.check_encodable())
    }

    fn encoded_length(&self) -> usize {
        self.iter().fold(0, |acc, t| acc + t.encoded_length())
    }
}

impl Encodable for str {
    fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), EncodeError> {
        self.check_encodable()?;
        out.put_u16(self.len() as u16);
        out.put_slice(self.as_bytes());
        Ok(())
    }

    fn encoded_length(&self) -> usize {
        2 + self.len()
    }

    fn check_encodable(&self) -> Result<(), EncodeError> {
        ensure!(self.len() <= u16::MAX as usize, StringTooLong { len: self.len() });
        Ok(())
    }
}

impl Encodable for String {
    fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), EncodeError> {
        self.as_str().encode(out)
    }

    fn encoded_length(&self) -> usize {
        self.as_str().encoded_length()
    }

    fn check_encodable(&self) -> Result<(), EncodeError> {
        self.as_str().check_encodable()
    }
}

impl Encodable for Bytes {
    fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), EncodeError> {
        self.check_encodable()?;
        out.put_u16(self.len() as u16);
        out.put_slice(self);
        Ok(())
    }

    fn encoded_length(&self) -> usize {
        2 + self.len()
    }

    fn check_encodable(&self) -> Result<(), EncodeError> {
        ensure!(self.len() <= u16::MAX as usize, BinaryTooLong { len: self.len() });
        Ok(())
    }
}

impl Encodable for QualityOfService {
    fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), EncodeError> {
        out.put_u8(*self as u8);
        Ok(())
    }

    fn encoded_length(&self) -> usize {
        1
    }
}

impl Encodable for SubAckReturnCode {
    fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), EncodeError> {
        out.put_u8(*self as u8);
        Ok(())
    }

    fn encoded_length(&self) -> usize {
        1
    }
}
