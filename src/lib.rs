//! Encoding, decoding and validation of MQTT 3.1.1 control packets.
//!
//! The packet types in [`packets`] turn a complete packet body into a typed value and back, and check it against
//! the protocol rules. [`Packet`] covers all fourteen of them when the type is only known at runtime, and
//! [`Codec`] adds framing from a byte stream, size limits and logging on top.
//!
//! ```
//! use mqtt3_codec::{Codec, ControlPacket, Packet, PubRec};
//!
//! let mut out = Vec::new();
//! PubRec::new(0x1234).encode(&mut out).unwrap();
//! assert_eq!(out, vec![0x50, 0x02, 0x12, 0x34]);
//!
//! let codec = Codec::default();
//! let (packet, used) = codec.read_packet(&out).unwrap().unwrap();
//! assert_eq!(packet, Packet::from(PubRec::new(0x1234)));
//! assert_eq!(used, 4);
//! ```

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate derive_builder;
#[macro_use]
extern crate enum_primitive;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate slog;

pub mod codec;
pub mod errors;
pub mod header;
pub mod packets;
mod parsers;
pub mod rules;
pub mod topic;
pub mod types;
pub mod vle;

pub use crate::codec::{Codec, CodecConfig, CodecConfigBuilder, MAX_PACKET_SIZE};
pub use crate::errors::{DecodeError, EncodeError, Error, ValidationError};
pub use crate::header::FixedHeader;
pub use crate::packets::*;
pub use crate::types::*;
pub use crate::vle::LengthPolicy;
