#![allow(dead_code)]

pub use mqtt3_codec::*;

/// A codec that logs nowhere.
pub fn codec() -> Codec {
    let logger = slog::Logger::root(slog::Discard, slog::o!());
    Codec::new(CodecConfigBuilder::default().logger(logger).build().unwrap())
}

pub fn check_encode<P: Into<Packet>>(packet: P, packet_data: &[u8]) {
    let packet = packet.into();
    let mut buf: Vec<u8> = Vec::with_capacity(packet_data.len());
    packet.encode(&mut buf).unwrap();
    assert_eq!(buf, packet_data);
    assert_eq!(packet.encoded_len().unwrap(), packet_data.len());
    assert_eq!(
        packet.fixed_header().len().unwrap() + packet.fixed_header().remaining_length as usize,
        packet_data.len()
    );
}

pub fn check_decode<P: Into<Packet>>(packet_data: &[u8], packet: P) {
    let packet = packet.into();
    assert_eq!(codec().read_packet(packet_data).unwrap(), Some((packet.clone(), packet_data.len())));

    let (_, len_bytes) = vle::decode(&packet_data[1..]).unwrap();
    assert_eq!(Packet::decode(packet_data[0], &packet_data[1 + len_bytes..]), Ok(packet));
}

pub fn decode_err(packet_data: &[u8]) -> DecodeError {
    let (_, len_bytes) = vle::decode(&packet_data[1..]).unwrap();
    Packet::decode(packet_data[0], &packet_data[1 + len_bytes..]).unwrap_err()
}
