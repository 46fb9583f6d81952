//! Per packet type protocol rules that are shared by header decoding and validation.

use snafu::ensure;

use crate::errors::*;
use crate::header::FixedHeader;
use crate::types::{PacketType, QualityOfService};

/// When a packet type carries a packet identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketIdRule {
    Never,
    Always,
    /// Only when the fixed header QoS is above 0 (PUBLISH).
    WhenQos,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PacketRules {
    pub packet_id: PacketIdRule,
    /// The flag nibble the type must carry, or `None` when the flags are live (PUBLISH).
    pub fixed_flags: Option<u8>,
}

impl PacketRules {
    const fn new(packet_id: PacketIdRule, fixed_flags: Option<u8>) -> PacketRules {
        PacketRules { packet_id, fixed_flags }
    }
}

use self::PacketIdRule::*;

static RULES: [PacketRules; 14] = [
    PacketRules::new(Never, Some(0b0000)),   // CONNECT
    PacketRules::new(Never, Some(0b0000)),   // CONNACK
    PacketRules::new(WhenQos, None),         // PUBLISH
    PacketRules::new(Always, Some(0b0000)),  // PUBACK
    PacketRules::new(Always, Some(0b0000)),  // PUBREC
    PacketRules::new(Always, Some(0b0010)),  // PUBREL
    PacketRules::new(Always, Some(0b0000)),  // PUBCOMP
    PacketRules::new(Always, Some(0b0010)),  // SUBSCRIBE
    PacketRules::new(Always, Some(0b0000)),  // SUBACK
    PacketRules::new(Always, Some(0b0010)),  // UNSUBSCRIBE
    PacketRules::new(Always, Some(0b0000)),  // UNSUBACK
    PacketRules::new(Never, Some(0b0000)),   // PINGREQ
    PacketRules::new(Never, Some(0b0000)),   // PINGRESP
    PacketRules::new(Never, Some(0b0000)),   // DISCONNECT
];

impl PacketType {
    pub fn rules(self) -> PacketRules {
        RULES[self as usize - 1]
    }

    /// Whether a packet of this type with the given QoS must carry a non-zero packet id.
    pub fn requires_packet_id(self, qos: QualityOfService) -> bool {
        match self.rules().packet_id {
            Never => false,
            Always => true,
            WhenQos => qos != QualityOfService::QoS0,
        }
    }
}

/// Checks the flag nibble against the type's fixed flags.
pub(crate) fn check_flags(header: &FixedHeader) -> Result<(), ValidationError> {
    if let Some(expected) = header.packet_type.rules().fixed_flags {
        let actual = header.flags();
        ensure!(
            actual == expected,
            UnexpectedFlags { ty: header.packet_type, expected, actual }
        );
    }
    Ok(())
}

/// Checks that a packet id is present when the type requires one.
pub(crate) fn check_packet_id(header: &FixedHeader, packet_id: u16) -> Result<(), ValidationError> {
    if header.packet_type.requires_packet_id(header.qos) {
        ensure!(packet_id != 0, MissingPacketId { ty: header.packet_type });
    }
    Ok(())
}
