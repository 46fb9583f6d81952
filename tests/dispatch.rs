mod common;

use bytes::{Bytes, BytesMut};
use common::*;

fn sample_packets() -> Vec<Packet> {
    let will = LastWillBuilder::default()
        .topic("status/c1")
        .qos(QualityOfService::QoS2)
        .retain(true)
        .message(&b"offline"[..])
        .build()
        .unwrap();

    vec![
        Connect::new("c1", true, 60).with_will(will).into(),
        ConnAck::new(false, ReturnCode::Accepted).into(),
        Publish::new("a/b", &b"payload"[..]).with_qos(QualityOfService::QoS1, 5).into(),
        PubAck::new(5).into(),
        PubRec::new(6).into(),
        PubRel::new(6).into(),
        PubComp::new(6).into(),
        Subscribe::new(7, vec![Subscription::new("a/+", QualityOfService::QoS1)]).into(),
        SubAck::new(7, vec![SubAckReturnCode::MaxQoS1]).into(),
        Unsubscribe::new(8, vec!["a/+".to_owned()]).into(),
        UnsubAck::new(8).into(),
        PingReq::new().into(),
        PingResp::new().into(),
        Disconnect::new().into(),
    ]
}

#[test]
fn round_trip_every_type() {
    for packet in sample_packets() {
        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();

        let (remaining, len_bytes) = vle::decode(&buf[1..]).unwrap();
        assert_eq!(remaining, packet.fixed_header().remaining_length);
        assert_eq!(buf.len(), 1 + len_bytes + remaining as usize);

        let decoded = Packet::decode(buf[0], &buf[1 + len_bytes..]).unwrap();
        assert_eq!(decoded, packet);
        assert_eq!(decoded.validate(), Ok(ReturnCode::Accepted), "{}", packet.packet_type());
    }
}

#[test]
fn filled_in_packets_round_trip() {
    for ty in 1..=14u8 {
        let mut packet = Packet::new(ty).unwrap();
        match &mut packet {
            Packet::Connect(p) => {
                p.client_id = "c1".to_owned();
                p.clean_session = true;
                p.keep_alive = 30;
                p.username = Some("user".to_owned());
            }
            Packet::ConnAck(p) => p.return_code = ReturnCode::NotAuthorized,
            Packet::Publish(p) => {
                p.fixed_header.qos = QualityOfService::QoS2;
                p.topic_name = "a/b".to_owned();
                p.packet_id = 9;
                p.payload = Bytes::from_static(b"hello");
            }
            Packet::PubAck(p) => p.packet_id = 0x1234,
            Packet::PubRec(p) => p.packet_id = 0x1234,
            Packet::PubRel(p) => p.packet_id = 0x1234,
            Packet::PubComp(p) => p.packet_id = 0x1234,
            Packet::Subscribe(p) => {
                p.packet_id = 1;
                p.subscriptions.push(Subscription::new("a/#", QualityOfService::QoS1));
            }
            Packet::SubAck(p) => {
                p.packet_id = 1;
                p.return_codes.push(SubAckReturnCode::Failure);
            }
            Packet::Unsubscribe(p) => {
                p.packet_id = 2;
                p.topic_filters.push("a/#".to_owned());
            }
            Packet::UnsubAck(p) => p.packet_id = 2,
            Packet::PingReq(_) | Packet::PingResp(_) | Packet::Disconnect(_) => {}
        }
        assert!(packet.validate().is_ok(), "{}", packet.packet_type());

        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();
        let (_, len_bytes) = vle::decode(&buf[1..]).unwrap();
        let decoded = Packet::decode(buf[0], &buf[1 + len_bytes..]).unwrap();
        assert_eq!(decoded, packet, "{}", packet.packet_type());
    }

    let mut buf = Vec::new();
    let mut pubrec = Packet::new(5).unwrap();
    if let Packet::PubRec(p) = &mut pubrec {
        p.packet_id = 0x1234;
    }
    pubrec.encode(&mut buf).unwrap();
    assert_eq!(buf, vec![0x50, 0x02, 0x12, 0x34]);
    assert_eq!(Packet::decode(0x50, &buf[2..]), Ok(pubrec));
}

#[test]
fn struct_literal_round_trip() {
    let packet = Subscribe {
        packet_id: 1,
        subscriptions: vec![Subscription::new("a/b", QualityOfService::QoS0)],
        ..Subscribe::default()
    };
    assert_eq!(packet.fixed_header.remaining_length, 0);

    let mut buf = Vec::new();
    packet.encode(&mut buf).unwrap();
    assert_eq!(buf[1], 8);

    let mut decoded = Subscribe::default();
    decoded.decode(&buf[2..]).unwrap();
    assert_eq!(decoded.fixed_header.remaining_length, 8);
    assert_eq!(decoded, packet);
}

#[test]
fn stream_of_packets() {
    let codec = codec();
    let packets = sample_packets();

    let mut buf = BytesMut::new();
    for packet in &packets {
        codec.encode(packet, &mut buf).unwrap();
    }

    let mut decoded = Vec::new();
    while let Some(packet) = codec.decode_frame(&mut buf).unwrap() {
        decoded.push(packet);
    }
    assert_eq!(decoded, packets);
    assert!(buf.is_empty());
}

#[test]
fn zero_packet_id_fails_validation() {
    let zero_id: Vec<Packet> = vec![
        PubAck::new(0).into(),
        PubRec::new(0).into(),
        PubRel::new(0).into(),
        PubComp::new(0).into(),
        Subscribe::new(0, vec![Subscription::new("a", QualityOfService::QoS0)]).into(),
        SubAck::new(0, vec![SubAckReturnCode::MaxQoS0]).into(),
        Unsubscribe::new(0, vec!["a".to_owned()]).into(),
        UnsubAck::new(0).into(),
    ];

    for packet in zero_id {
        assert_eq!(
            packet.validate(),
            Err(ValidationError::MissingPacketId { ty: packet.packet_type() })
        );
    }
}

#[test]
fn failures_repeat() {
    let malformed: Vec<Vec<u8>> = vec![
        vec![0x00, 0x00],
        vec![0x30, 0x02, 0x00],
        vec![0x10, 0x03, 0x00, 0x04, 0x4d],
        vec![0x82, 0x04, 0x00, 0x01, 0x00, 0x05],
        vec![0x20, 0x02, 0xFF, 0x00],
    ];

    for data in malformed {
        let first = Packet::decode(data[0], &data[2..]);
        let second = Packet::decode(data[0], &data[2..]);
        assert!(first.is_err(), "{:?}", data);
        assert_eq!(first, second);
    }
}

#[test]
fn reset_and_reuse() {
    let mut packet = Packet::from(Publish::new("a/b", &b"x"[..]));
    packet.reset();
    assert_eq!(packet, Packet::new(3).unwrap());

    packet.decode_body(&[0, 1, 0x63, 0x79]).unwrap();
    assert_eq!(packet, Packet::from(Publish::new("c", &b"y"[..])));
}

#[test]
fn unknown_types() {
    assert_eq!(Packet::new(0), Err(DecodeError::UnknownType { ty: 0 }));
    assert_eq!(Packet::new(15), Err(DecodeError::UnknownType { ty: 15 }));
    assert_eq!(Packet::new(14).unwrap().packet_type(), PacketType::Disconnect);
}
