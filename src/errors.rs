use snafu::Snafu;
use std::io;
use std::str::Utf8Error;

use crate::types::{PacketType, ReturnCode};

/// Errors raised while writing a packet to a sink.
#[derive(Snafu, Debug)]
#[snafu(visibility(pub(crate)), context(suffix(false)))]
pub enum EncodeError {
    #[snafu(display("{} is too big for a remaining length (max 268435455).", value))]
    LengthOverflow { value: usize },
    #[snafu(display("{} bytes is too big for a MQTT UTF-8 string.", len))]
    StringTooLong { len: usize },
    #[snafu(display("{} bytes is too big for MQTT binary data.", len))]
    BinaryTooLong { len: usize },
    #[snafu(display("Packet needs {} bytes but the sink only has room for {}.", needed, available))]
    InsufficientCapacity { needed: usize, available: usize },
    #[snafu(display("Packet of {} bytes exceeds the configured maximum of {}.", size, max))]
    TooLargeToSend { size: usize, max: u32 },
    #[snafu(display("I/O error while writing packet: {}", source))]
    Io { source: io::Error },
}

/// Errors raised while turning bytes into a packet.
///
/// Decoding stops at the first violation in wire order, so a given input always produces the same value.
#[derive(Snafu, Debug, Clone, PartialEq, Eq)]
#[snafu(visibility(pub(crate)), context(suffix(false)))]
pub enum DecodeError {
    #[snafu(display("Malformed remaining length."))]
    MalformedLength,
    #[snafu(display("Remaining length {} is not minimally encoded.", value))]
    NonMinimalLength { value: u32 },
    #[snafu(display("{} is not a known MQTT packet type.", ty))]
    UnknownType { ty: u8 },
    #[snafu(display("{} packet must have flags {:#06b}, got {:#06b}.", ty, expected, received))]
    InvalidFlags { ty: PacketType, expected: u8, received: u8 },
    #[snafu(display("'{}' is not a valid quality of service.", qos))]
    InvalidQos { qos: u8 },
    #[snafu(display("Packet body ended before the packet was complete."))]
    Truncated,
    #[snafu(display("{} unexpected bytes after the end of the packet.", count))]
    TrailingBytes { count: usize },
    #[snafu(display("{} packet body must be {} bytes, got {}.", ty, expected, actual))]
    LengthMismatch { ty: PacketType, expected: usize, actual: usize },
    #[snafu(display("String is not a valid UTF-8 string. {}", source))]
    InvalidUtf8 { source: Utf8Error },
    #[snafu(display("Invalid connect flags {:#010b}.", flags))]
    InvalidConnectFlags { flags: u8 },
    #[snafu(display("Invalid connect acknowledge flags {:#010b}.", flags))]
    InvalidConnAckFlags { flags: u8 },
    #[snafu(display("'{}' is not a valid connect return code.", code))]
    InvalidReturnCode { code: u8 },
    #[snafu(display("Invalid subscription options {:#010b}.", options))]
    InvalidSubscriptionOptions { options: u8 },
    #[snafu(display("'{}' is not a valid subscribe return code.", code))]
    InvalidSubAckReturnCode { code: u8 },
    #[snafu(display("Packet of {} bytes exceeds the maximum of {}.", size, max))]
    PacketTooLarge { size: usize, max: u32 },
}

/// A packet that parsed fine but breaks a protocol rule.
#[derive(Snafu, Debug, Clone, PartialEq, Eq)]
#[snafu(visibility(pub(crate)), context(suffix(false)))]
pub enum ValidationError {
    #[snafu(display("{} packet must have flags {:#06b}, has {:#06b}.", ty, expected, actual))]
    UnexpectedFlags { ty: PacketType, expected: u8, actual: u8 },
    #[snafu(display("{} packet needs a non-zero packet id.", ty))]
    MissingPacketId { ty: PacketType },
    #[snafu(display("Publish packet @ QoS0 must not have a packet id."))]
    UnexpectedPacketId,
    #[snafu(display("Publish DUP flag must be 0 for QoS0."))]
    DupWithQos0,
    #[snafu(display("{} packet payload cannot be empty.", ty))]
    EmptyPayload { ty: PacketType },
    #[snafu(display("Invalid topic name '{}'.", topic))]
    InvalidTopicName { topic: String },
    #[snafu(display("Invalid topic filter '{}'.", filter))]
    InvalidTopicFilter { filter: String },
    #[snafu(display("{} contains the null character.", field))]
    NullCharacter { field: &'static str },
    #[snafu(display("{} is {} bytes, too big for a MQTT string.", field, len))]
    FieldTooLong { field: &'static str, len: usize },
    #[snafu(display("Protocol name '{}' does not match protocol level {}.", name, level))]
    InvalidProtocolName { name: String, level: u8 },
    #[snafu(display("Unrecognised protocol level '{}'.", level))]
    UnsupportedProtocolLevel { level: u8 },
    #[snafu(display("Client identifier '{}' rejected.", client_id))]
    IdentifierRejected { client_id: String },
    #[snafu(display("Password given without a username."))]
    PasswordWithoutUsername,
    #[snafu(display("Session present should not be set if the connect return code is an error."))]
    SessionPresentOnRefusal,
}

impl ValidationError {
    /// The CONNACK return code a server should answer a refused CONNECT with.
    ///
    /// `None` means the packet breaks the protocol and the network connection should simply be closed.
    pub fn return_code(&self) -> Option<ReturnCode> {
        match self {
            ValidationError::UnsupportedProtocolLevel { .. } => Some(ReturnCode::UnacceptableProtocolVersion),
            ValidationError::IdentifierRejected { .. } => Some(ReturnCode::IdentifierRejected),
            _ => None,
        }
    }
}

/// Umbrella error returned by [`Codec`](crate::Codec).
#[derive(Snafu, Debug)]
pub enum Error {
    #[snafu(display("Error occurred while encoding packet: {}", source))]
    #[snafu(context(false))]
    Encode { source: EncodeError },
    #[snafu(display("Error occurred while decoding packet: {}", source))]
    #[snafu(context(false))]
    Decode { source: DecodeError },
    #[snafu(display("Packet breaks the MQTT protocol: {}", source))]
    #[snafu(context(false))]
    Validation { source: ValidationError },
}
