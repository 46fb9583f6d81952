use crate::types::PacketType;

packet_id_only!(
    /// Confirms an UNSUBSCRIBE. Carries nothing but the packet id in 3.1.1.
    UnsubAck,
    PacketType::UnsubAck
);
