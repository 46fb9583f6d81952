use crate::types::PacketType;

header_only!(
    /// Sent by the client right before it closes the connection.
    Disconnect,
    PacketType::Disconnect
);
