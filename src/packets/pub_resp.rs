//! The acknowledgements of the PUBLISH flows: PUBACK for QoS 1, PUBREC, PUBREL and PUBCOMP for QoS 2.

use crate::types::PacketType;

packet_id_only!(
    /// Acknowledges a QoS 1 PUBLISH.
    PubAck,
    PacketType::PubAck
);

packet_id_only!(
    /// First response to a QoS 2 PUBLISH.
    PubRec,
    PacketType::PubRec
);

packet_id_only!(
    /// Answer to a PUBREC. Always sent with flags `0b0010`.
    PubRel,
    PacketType::PubRel
);

packet_id_only!(
    /// Final packet of the QoS 2 flow.
    PubComp,
    PacketType::PubComp
);
