use crate::types::PacketType;

header_only!(
    /// Keep alive ping from the client.
    PingReq,
    PacketType::PingReq
);

header_only!(
    /// The server's answer to a PINGREQ.
    PingResp,
    PacketType::PingResp
);
