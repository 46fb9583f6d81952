use bytes::BufMut;
use std::convert::TryFrom;

use crate::errors::*;
use crate::types::{PacketFlags, PacketType, QualityOfService};
use crate::vle;

/// The first one to five bytes of every control packet.
///
/// `dup`, `qos` and `retain` are only meaningful for PUBLISH; for every other type they mirror the flag nibble
/// the type is fixed to (PUBREL, SUBSCRIBE and UNSUBSCRIBE carry `qos = QoS1`).
///
/// Two headers are equal when their type and flags match. The remaining length follows from the packet's fields
/// and is left out, so a packet filled in by hand equals its own decoded encoding.
#[derive(Clone, Copy, Debug, Eq)]
pub struct FixedHeader {
    pub packet_type: PacketType,
    pub dup: bool,
    pub qos: QualityOfService,
    pub retain: bool,
    /// Byte count of the variable header and payload, as last decoded or synced.
    pub remaining_length: u32,
}

impl PartialEq for FixedHeader {
    fn eq(&self, other: &FixedHeader) -> bool {
        self.packet_type == other.packet_type
            && self.dup == other.dup
            && self.qos == other.qos
            && self.retain == other.retain
    }
}

impl FixedHeader {
    /// A header for `ty` with the flags the type requires and no remaining length.
    pub fn new(ty: PacketType) -> FixedHeader {
        let flags = PacketFlags::from_bits_truncate(ty.rules().fixed_flags.unwrap_or(0));
        FixedHeader::with_flags(ty, flags)
    }

    fn with_flags(ty: PacketType, flags: PacketFlags) -> FixedHeader {
        FixedHeader {
            packet_type: ty,
            dup: flags.is_duplicate(),
            qos: if flags.contains(PacketFlags::QOS2) {
                QualityOfService::QoS2
            } else if flags.contains(PacketFlags::QOS1) {
                QualityOfService::QoS1
            } else {
                QualityOfService::QoS0
            },
            retain: flags.is_retain(),
            remaining_length: 0,
        }
    }

    /// Parses the type and flags from the first header byte.
    ///
    /// The remaining length is left at 0; the caller reads it before handing the body to the packet.
    pub fn decode(byte: u8) -> Result<FixedHeader, DecodeError> {
        let ty = PacketType::try_from(byte >> 4)?;
        let received = byte & 0x0F;

        match ty.rules().fixed_flags {
            Some(expected) if expected != received => {
                return InvalidFlags { ty, expected, received }.fail();
            }
            _ => {}
        }

        let flags = PacketFlags::from_bits_truncate(received);
        if flags.qos_bits() == 3 {
            return InvalidQos { qos: 3u8 }.fail();
        }

        Ok(FixedHeader::with_flags(ty, flags))
    }

    /// The flag nibble as written to the wire.
    pub fn flags(&self) -> u8 {
        let mut flags: PacketFlags = self.qos.into();
        flags.set(PacketFlags::DUP, self.dup);
        flags.set(PacketFlags::RET, self.retain);
        flags.bits()
    }

    /// The first header byte.
    pub fn first_byte(&self) -> u8 {
        ((self.packet_type as u8) << 4) | self.flags()
    }

    /// Writes the first byte and the remaining length.
    pub fn encode<B: BufMut>(&self, out: &mut B) -> Result<(), EncodeError> {
        vle::encoded_len(self.remaining_length as usize)?;
        out.put_u8(self.first_byte());
        vle::encode(self.remaining_length as usize, out)?;
        Ok(())
    }

    /// Encoded size of the header itself.
    pub fn len(&self) -> Result<usize, EncodeError> {
        Ok(1 + vle::encoded_len(self.remaining_length as usize)?)
    }
}
