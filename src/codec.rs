//! A configured entry point around the packet types: size limits, length policy, validation and logging.

use std::fmt;
use std::io::Write;

use bytes::{Buf, BufMut, BytesMut};
use slog::{Drain, Logger};

use crate::errors::*;
use crate::header::FixedHeader;
use crate::packets::Packet;
use crate::vle::{self, LengthPolicy, MAX_REMAINING_LENGTH};

/// Largest packet the protocol can express: one type byte, four length bytes and the biggest body.
pub const MAX_PACKET_SIZE: u32 = MAX_REMAINING_LENGTH + 5;

/// Used to configure a [`Codec`]. Defaults are as follows
///  - Max Packet Size: 268,435,460 bytes (no limit beyond the protocol's)
///  - Length Policy: strict
///  - Validate Incoming: true
///  - Validate Outgoing: true
///  - Logger: `log`
#[derive(Clone, Debug, Builder)]
#[builder(setter(into))]
pub struct CodecConfig {
    /// Packets bigger than this, fixed header included, are refused in both directions.
    #[builder(default = "MAX_PACKET_SIZE")]
    pub max_packet_size: u32,
    /// How to treat remaining lengths that use more bytes than needed.
    #[builder(default = "LengthPolicy::Strict")]
    pub length_policy: LengthPolicy,
    /// Run `validate` on every decoded packet.
    #[builder(default = "true")]
    pub validate_incoming: bool,
    /// Run `validate` before encoding.
    #[builder(default = "true")]
    pub validate_outgoing: bool,
    /// Specify a logger for the codec. Defaults to passing to `log`
    #[builder(default = "self.default_logger()")]
    pub logger: Logger,
}

impl CodecConfigBuilder {
    fn default_logger(&self) -> Logger {
        default_logger()
    }
}

fn default_logger() -> Logger {
    Logger::root(slog_stdlog::StdLog.fuse(), o!())
}

impl Default for CodecConfig {
    fn default() -> CodecConfig {
        CodecConfig {
            max_packet_size: MAX_PACKET_SIZE,
            length_policy: LengthPolicy::Strict,
            validate_incoming: true,
            validate_outgoing: true,
            logger: default_logger(),
        }
    }
}

/// Frames, encodes and decodes packets according to a [`CodecConfig`].
#[derive(Clone, Debug, Default)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    pub fn new(config: CodecConfig) -> Codec {
        Codec { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Validates (when configured) and encodes `packet` into `out`.
    pub fn encode<B: BufMut>(&self, packet: &Packet, out: &mut B) -> Result<(), Error> {
        let size = self.check_outgoing(packet)?;
        packet.encode(out).map_err(|e| self.rejected(packet, e))?;

        trace!(self.config.logger, "Encoded packet"; "type" => %packet.packet_type(), "size" => size);
        Ok(())
    }

    /// Like [`Codec::encode`], writing to an `io::Write` sink.
    pub fn write_to<W: Write>(&self, packet: &Packet, w: &mut W) -> Result<(), Error> {
        self.check_outgoing(packet)?;
        packet.write_to(w).map_err(|e| self.rejected(packet, e))?;

        trace!(self.config.logger, "Wrote packet"; "type" => %packet.packet_type());
        Ok(())
    }

    /// Decodes a packet from its first header byte and complete body.
    pub fn decode(&self, header_byte: u8, body: &[u8]) -> Result<Packet, Error> {
        let size = 1 + vle::encoded_len(body.len()).unwrap_or(4) + body.len();
        self.check_size(size)?;

        let packet = Packet::decode(header_byte, body).map_err(|e| {
            debug!(self.config.logger, "Failed to decode packet";
                "header" => format!("{:#04x}", header_byte),
                "error" => %e);
            e
        })?;

        if self.config.validate_incoming {
            packet.validate().map_err(|e| self.rejected(&packet, e))?;
        }

        trace!(self.config.logger, "Decoded packet";
            "type" => %packet.packet_type(),
            "remaining_length" => packet.fixed_header().remaining_length);
        Ok(packet)
    }

    /// Frames one packet from the front of `buf`.
    ///
    /// Returns the packet and how many bytes it took up, or `Ok(None)` if `buf` does not hold a whole packet
    /// yet. Oversized packets are refused as soon as their length is known.
    pub fn read_packet(&self, buf: &[u8]) -> Result<Option<(Packet, usize)>, Error> {
        let header_byte = match buf.first() {
            Some(&b) => b,
            None => return Ok(None),
        };
        FixedHeader::decode(header_byte)?;

        let (remaining, len_bytes) = match vle::scan(&buf[1..], self.config.length_policy)? {
            Some(found) => found,
            None => return Ok(None),
        };

        let body_start = 1 + len_bytes;
        let total = body_start + remaining as usize;
        self.check_size(total)?;

        if buf.len() < total {
            return Ok(None);
        }

        let packet = self.decode(header_byte, &buf[body_start..total])?;
        Ok(Some((packet, total)))
    }

    /// Like [`Codec::read_packet`], consuming the packet's bytes from `buf`.
    pub fn decode_frame(&self, buf: &mut BytesMut) -> Result<Option<Packet>, Error> {
        match self.read_packet(buf)? {
            Some((packet, consumed)) => {
                buf.advance(consumed);
                Ok(Some(packet))
            }
            None => Ok(None),
        }
    }

    fn check_outgoing(&self, packet: &Packet) -> Result<usize, Error> {
        if self.config.validate_outgoing {
            packet.validate().map_err(|e| self.rejected(packet, e))?;
        }

        let size = packet.encoded_len().map_err(|e| self.rejected(packet, e))?;
        if size > self.config.max_packet_size as usize {
            let e = EncodeError::TooLargeToSend { size, max: self.config.max_packet_size };
            return Err(self.rejected(packet, e).into());
        }
        Ok(size)
    }

    fn check_size(&self, size: usize) -> Result<(), DecodeError> {
        let max = self.config.max_packet_size;
        if size > max as usize {
            debug!(self.config.logger, "Refusing oversized packet"; "size" => size, "max" => max);
            return PacketTooLarge { size, max }.fail();
        }
        Ok(())
    }

    fn rejected<E: fmt::Display>(&self, packet: &Packet, e: E) -> E {
        debug!(self.config.logger, "Rejected packet"; "type" => %packet.packet_type(), "error" => %e);
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packets::{PingReq, PubAck, Publish};
    use crate::types::{PacketType, QualityOfService};

    fn quiet(builder: &mut CodecConfigBuilder) -> Codec {
        Codec::new(builder.logger(Logger::root(slog::Discard, o!())).build().unwrap())
    }

    #[test]
    fn defaults() {
        let config = CodecConfigBuilder::default().build().unwrap();
        assert_eq!(config.max_packet_size, 268_435_460);
        assert_eq!(config.length_policy, LengthPolicy::Strict);
        assert!(config.validate_incoming);
        assert!(config.validate_outgoing);
    }

    #[test]
    fn read_partial_buffers() {
        let codec = quiet(&mut CodecConfigBuilder::default());
        let data = [0x40, 0x02, 0x00, 0x01, 0xC0];

        assert!(codec.read_packet(&[]).unwrap().is_none());
        assert!(codec.read_packet(&data[..1]).unwrap().is_none());
        assert!(codec.read_packet(&data[..3]).unwrap().is_none());

        let (packet, consumed) = codec.read_packet(&data).unwrap().unwrap();
        assert_eq!(packet, Packet::from(PubAck::new(1)));
        assert_eq!(consumed, 4);
    }

    #[test]
    fn decode_frame_advances() {
        let codec = quiet(&mut CodecConfigBuilder::default());
        let mut buf = BytesMut::from(&[0xC0, 0x00, 0xD0, 0x00, 0xE0][..]);

        assert_eq!(codec.decode_frame(&mut buf).unwrap(), Some(Packet::from(PingReq::new())));
        assert_eq!(codec.decode_frame(&mut buf).unwrap().map(|p| p.packet_type()), Some(PacketType::PingResp));
        assert_eq!(codec.decode_frame(&mut buf).unwrap(), None);
        assert_eq!(&buf[..], &[0xE0][..]);
    }

    #[test]
    fn bad_header_before_length() {
        let codec = quiet(&mut CodecConfigBuilder::default());
        match codec.read_packet(&[0x00]) {
            Err(Error::Decode { source }) => assert_eq!(source, DecodeError::UnknownType { ty: 0 }),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn length_policy() {
        let strict = quiet(&mut CodecConfigBuilder::default());
        let lenient = quiet(CodecConfigBuilder::default().length_policy(LengthPolicy::Lenient));
        let padded = [0xC0, 0x80, 0x00];

        match strict.read_packet(&padded) {
            Err(Error::Decode { source }) => assert_eq!(source, DecodeError::NonMinimalLength { value: 0 }),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(lenient.read_packet(&padded).unwrap(), Some((Packet::from(PingReq::new()), 3)));
    }

    #[test]
    fn max_packet_size() {
        let codec = quiet(CodecConfigBuilder::default().max_packet_size(8u32));
        let big = Packet::from(Publish::new("topic", &b"payload"[..]));

        let mut out = Vec::new();
        match codec.encode(&big, &mut out) {
            Err(Error::Encode { source: EncodeError::TooLargeToSend { size, max } }) => {
                assert_eq!(size, 16);
                assert_eq!(max, 8);
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert!(out.is_empty());

        let unbounded = quiet(&mut CodecConfigBuilder::default());
        unbounded.encode(&big, &mut out).unwrap();

        // Refused from the header alone, before the body arrives.
        match codec.read_packet(&out[..2]) {
            Err(Error::Decode { source }) => {
                assert_eq!(source, DecodeError::PacketTooLarge { size: 16, max: 8 })
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn validation_toggles() {
        let zero_id = Packet::from(PubAck::new(0));
        let strict = quiet(&mut CodecConfigBuilder::default());
        let relaxed = quiet(
            CodecConfigBuilder::default()
                .validate_incoming(false)
                .validate_outgoing(false),
        );

        let mut out = Vec::new();
        match strict.encode(&zero_id, &mut out) {
            Err(Error::Validation { source }) => {
                assert_eq!(source, ValidationError::MissingPacketId { ty: PacketType::PubAck })
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert!(out.is_empty());

        relaxed.encode(&zero_id, &mut out).unwrap();
        assert_eq!(out, vec![0x40, 0x02, 0x00, 0x00]);
        assert_eq!(relaxed.decode(0x40, &out[2..]).unwrap(), zero_id);
        assert!(strict.decode(0x40, &out[2..]).is_err());
    }

    #[test]
    fn oversized_string_rejected_before_writing() {
        let codec = quiet(CodecConfigBuilder::default().validate_outgoing(false));
        let packet = Packet::from(Publish::new("t".repeat(65_536), &b"x"[..]));

        let mut out = Vec::new();
        match codec.encode(&packet, &mut out) {
            Err(Error::Encode { source: EncodeError::StringTooLong { len } }) => assert_eq!(len, 65_536),
            other => panic!("unexpected result {:?}", other),
        }
        assert!(out.is_empty());
    }

    #[test]
    fn write_to_sink() {
        let codec = quiet(&mut CodecConfigBuilder::default());
        let packet = Packet::from(Publish::new("t", &b"x"[..]).with_qos(QualityOfService::QoS1, 2));

        let mut sink = Vec::new();
        codec.write_to(&packet, &mut sink).unwrap();
        assert_eq!(sink, vec![0x32, 0x06, 0, 1, 0x74, 0x00, 0x02, 0x78]);
        assert_eq!(codec.read_packet(&sink).unwrap(), Some((packet, 8)));
    }
}
