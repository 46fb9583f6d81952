use super::prelude::*;

/// The message a server publishes on the client's behalf when the client goes away without a DISCONNECT.
#[derive(Builder, Clone, Debug, PartialEq, Eq)]
#[builder(setter(into))]
pub struct LastWill {
    pub topic: String,
    #[builder(default = "QualityOfService::QoS0")]
    pub qos: QualityOfService,
    #[builder(default = "false")]
    pub retain: bool,
    #[builder(default)]
    pub message: Bytes,
}

/// First packet a client sends on a new connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connect {
    pub fixed_header: FixedHeader,
    /// `MQTT` for 3.1.1, `MQIsdp` for 3.1.
    pub protocol_name: String,
    pub protocol_level: u8,
    pub clean_session: bool,
    /// Seconds. 0 turns the keep alive mechanism off.
    pub keep_alive: u16,
    pub client_id: String,
    pub will: Option<LastWill>,
    pub username: Option<String>,
    pub password: Option<Bytes>,
}

impl Default for Connect {
    fn default() -> Connect {
        Connect {
            fixed_header: FixedHeader::new(PacketType::Connect),
            protocol_name: ProtoLvl::V3_1_1.protocol_name().to_owned(),
            protocol_level: ProtoLvl::V3_1_1 as u8,
            clean_session: false,
            keep_alive: 0,
            client_id: String::new(),
            will: None,
            username: None,
            password: None,
        }
    }
}

impl Connect {
    /// A 3.1.1 CONNECT without will or credentials.
    pub fn new<S: Into<String>>(client_id: S, clean_session: bool, keep_alive: u16) -> Connect {
        let mut packet = Connect {
            clean_session,
            keep_alive,
            client_id: client_id.into(),
            ..Connect::default()
        };
        packet.sync_remaining_length();
        packet
    }

    /// Switches the protocol name and level together, e.g. to speak 3.1 (`MQIsdp`, level 3).
    pub fn with_protocol(mut self, level: ProtoLvl) -> Connect {
        self.protocol_name = level.protocol_name().to_owned();
        self.protocol_level = level as u8;
        self.sync_remaining_length();
        self
    }

    pub fn with_will(mut self, will: LastWill) -> Connect {
        self.will = Some(will);
        self.sync_remaining_length();
        self
    }

    pub fn with_credentials<S: Into<String>>(mut self, username: S, password: Option<Bytes>) -> Connect {
        self.username = Some(username.into());
        self.password = password;
        self.sync_remaining_length();
        self
    }

    /// The connect flags byte implied by the packet's fields.
    pub fn connect_flags(&self) -> ConnFlags {
        let mut flags = ConnFlags::empty();
        flags.set(ConnFlags::CLEAN_SESS, self.clean_session);
        if let Some(will) = &self.will {
            flags |= ConnFlags::WILL_FLAG | ConnFlags::from(will.qos);
            flags.set(ConnFlags::WILL_RETAIN, will.retain);
        }
        flags.set(ConnFlags::USERNAME, self.username.is_some());
        flags.set(ConnFlags::PASSWORD, self.password.is_some());
        flags
    }
}

fn connect_body(fixed_header: FixedHeader, input: &[u8]) -> ParserResult<Connect> {
    let (input, protocol_name) = mqtt_string(input)?;
    let (input, protocol_level) = byte(input)?;
    let (input, flags) = byte(input)?;
    let flags = match ConnFlags::try_from(flags) {
        Ok(flags) => flags,
        Err(e) => return failure(e),
    };
    let (input, keep_alive) = uint16(input)?;
    let (input, client_id) = mqtt_string(input)?;

    let (input, will) = if flags.contains(ConnFlags::WILL_FLAG) {
        let (input, topic) = mqtt_string(input)?;
        let (input, message) = binary(input)?;
        let will = LastWill {
            topic,
            qos: QualityOfService::from(flags),
            retain: flags.contains(ConnFlags::WILL_RETAIN),
            message,
        };
        (input, Some(will))
    } else {
        (input, None)
    };

    let (input, username) = if flags.contains(ConnFlags::USERNAME) {
        let (input, username) = mqtt_string(input)?;
        (input, Some(username))
    } else {
        (input, None)
    };

    let (input, password) = if flags.contains(ConnFlags::PASSWORD) {
        let (input, password) = binary(input)?;
        (input, Some(password))
    } else {
        (input, None)
    };

    Ok((
        input,
        Connect {
            fixed_header,
            protocol_name,
            protocol_level,
            clean_session: flags.contains(ConnFlags::CLEAN_SESS),
            keep_alive,
            client_id,
            will,
            username,
            password,
        },
    ))
}

impl ControlPacket for Connect {
    const PACKET_TYPE: PacketType = PacketType::Connect;

    fn fixed_header(&self) -> &FixedHeader {
        &self.fixed_header
    }

    fn fixed_header_mut(&mut self) -> &mut FixedHeader {
        &mut self.fixed_header
    }

    fn check_fields(&self) -> Result<(), EncodeError> {
        self.protocol_name.check_encodable()?;
        self.client_id.check_encodable()?;
        if let Some(will) = &self.will {
            will.topic.check_encodable()?;
            will.message.check_encodable()?;
        }
        if let Some(username) = &self.username {
            username.check_encodable()?;
        }
        if let Some(password) = &self.password {
            password.check_encodable()?;
        }
        Ok(())
    }

    fn body_len(&self) -> usize {
        let mut len = self.protocol_name.encoded_length() + 4 + self.client_id.encoded_length();
        if let Some(will) = &self.will {
            len += will.topic.encoded_length() + will.message.encoded_length();
        }
        if let Some(username) = &self.username {
            len += username.encoded_length();
        }
        if let Some(password) = &self.password {
            len += password.encoded_length();
        }
        len
    }

    fn encode_body<B: BufMut>(&self, out: &mut B) -> Result<(), EncodeError> {
        self.protocol_name.encode(out)?;
        out.put_u8(self.protocol_level);
        out.put_u8(self.connect_flags().bits());
        out.put_u16(self.keep_alive);
        self.client_id.encode(out)?;
        if let Some(will) = &self.will {
            will.topic.encode(out)?;
            will.message.encode(out)?;
        }
        if let Some(username) = &self.username {
            username.encode(out)?;
        }
        if let Some(password) = &self.password {
            password.encode(out)?;
        }
        Ok(())
    }

    fn parse_body(fixed_header: FixedHeader, body: &[u8]) -> Result<Connect, DecodeError> {
        parsers::body(body, |input| connect_body(fixed_header, input))
    }

    /// A failure that maps to a CONNACK return code is reported through [`ValidationError::return_code`].
    fn validate(&self) -> Result<ReturnCode, ValidationError> {
        rules::check_flags(&self.fixed_header)?;

        check_string("Protocol name", &self.protocol_name)?;
        let known_name = [ProtoLvl::V3_1, ProtoLvl::V3_1_1]
            .iter()
            .any(|level| level.protocol_name() == self.protocol_name);
        ensure!(
            known_name,
            InvalidProtocolName { name: self.protocol_name.as_str(), level: self.protocol_level }
        );

        let level = ProtoLvl::try_from(self.protocol_level)?;
        ensure!(
            level.protocol_name() == self.protocol_name,
            InvalidProtocolName { name: self.protocol_name.as_str(), level: self.protocol_level }
        );

        check_string("Client identifier", &self.client_id)?;
        let id_ok = match level {
            ProtoLvl::V3_1 => !self.client_id.is_empty() && self.client_id.len() <= 23,
            ProtoLvl::V3_1_1 => self.clean_session || !self.client_id.is_empty(),
        };
        ensure!(id_ok, IdentifierRejected { client_id: self.client_id.as_str() });

        if let Some(will) = &self.will {
            validate_topic_name(&will.topic)?;
            ensure!(
                will.message.len() <= u16::MAX as usize,
                FieldTooLong { field: "Will message", len: will.message.len() }
            );
        }

        if let Some(username) = &self.username {
            check_string("User name", username)?;
        }
        ensure!(self.username.is_some() || self.password.is_none(), PasswordWithoutUsername);
        if let Some(password) = &self.password {
            ensure!(
                password.len() <= u16::MAX as usize,
                FieldTooLong { field: "Password", len: password.len() }
            );
        }

        Ok(ReturnCode::Accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic_body() -> Vec<u8> {
        vec![
            0, 4, 0x4d, 0x51, 0x54, 0x54, // Protocol Name
            4,    // Protocol Level
            0b00000010, // Connect Flags
            0, 60, // Keep Alive
            0, 4, 0x4d, 0x51, 0x54, 0x54, // Client ID
        ]
    }

    #[test]
    fn decode_basic() {
        let mut packet = Connect::default();
        packet.decode(&basic_body()).unwrap();
        assert_eq!(packet, Connect::new("MQTT", true, 60));
        assert_eq!(packet.fixed_header.remaining_length, 16);
        assert_eq!(packet.validate(), Ok(ReturnCode::Accepted));
    }

    #[test]
    fn encode_with_will_and_credentials() {
        let will = LastWillBuilder::default()
            .topic("a/b")
            .qos(QualityOfService::QoS1)
            .retain(true)
            .message(&b"bye"[..])
            .build()
            .unwrap();
        let packet = Connect::new("c", false, 10)
            .with_will(will)
            .with_credentials("user", Some(Bytes::from_static(b"pw")));

        let mut out = Vec::new();
        packet.encode(&mut out).unwrap();
        assert_eq!(
            out,
            vec![
                0x10, 0x21, // Fixed Header
                0, 4, 0x4d, 0x51, 0x54, 0x54, // Protocol Name
                4, // Protocol Level
                0b11101100, // Connect Flags
                0, 10, // Keep Alive
                0, 1, 0x63, // Client ID
                0, 3, 0x61, 0x2F, 0x62, // Will Topic
                0, 3, 0x62, 0x79, 0x65, // Will Message
                0, 4, 0x75, 0x73, 0x65, 0x72, // Username
                0, 2, 0x70, 0x77, // Password
            ]
        );

        let mut decoded = Connect::default();
        decoded.decode(&out[2..]).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn reserved_flag() {
        let mut body = basic_body();
        body[7] = 0b00000011;
        let mut packet = Connect::default();
        assert_eq!(packet.decode(&body), Err(DecodeError::InvalidConnectFlags { flags: 0b00000011 }));
        assert_eq!(packet, Connect::default());
    }

    #[test]
    fn will_bits_without_will() {
        let mut body = basic_body();
        body[7] = 0b00100000;
        assert_eq!(
            Connect::default().decode(&body),
            Err(DecodeError::InvalidConnectFlags { flags: 0b00100000 })
        );
        body[7] = 0b00011100;
        assert_eq!(
            Connect::default().decode(&body),
            Err(DecodeError::InvalidConnectFlags { flags: 0b00011100 })
        );
    }

    #[test]
    fn missing_will_fields() {
        let mut body = basic_body();
        body[7] = 0b00000100;
        assert_eq!(Connect::default().decode(&body), Err(DecodeError::Truncated));
    }

    #[test]
    fn protocol_3_1() {
        let packet = Connect::new("client", true, 0).with_protocol(ProtoLvl::V3_1);
        assert_eq!(packet.protocol_name, "MQIsdp");
        assert_eq!(packet.validate(), Ok(ReturnCode::Accepted));

        let long = Connect::new("a".repeat(24), true, 0).with_protocol(ProtoLvl::V3_1);
        let err = long.validate().unwrap_err();
        assert_eq!(err, ValidationError::IdentifierRejected { client_id: "a".repeat(24) });
        assert_eq!(err.return_code(), Some(ReturnCode::IdentifierRejected));
    }

    #[test]
    fn unknown_protocol() {
        let mut packet = Connect::new("c", true, 0);
        packet.protocol_name = "MQTTC".to_owned();
        assert_eq!(
            packet.validate(),
            Err(ValidationError::InvalidProtocolName { name: "MQTTC".to_owned(), level: 4 })
        );

        let mut packet = Connect::new("c", true, 0);
        packet.protocol_level = 5;
        let err = packet.validate().unwrap_err();
        assert_eq!(err, ValidationError::UnsupportedProtocolLevel { level: 5 });
        assert_eq!(err.return_code(), Some(ReturnCode::UnacceptableProtocolVersion));

        let mut packet = Connect::new("c", true, 0);
        packet.protocol_level = 3;
        assert_eq!(
            packet.validate(),
            Err(ValidationError::InvalidProtocolName { name: "MQTT".to_owned(), level: 3 })
        );
    }

    #[test]
    fn empty_client_id() {
        assert_eq!(Connect::new("", true, 0).validate(), Ok(ReturnCode::Accepted));
        assert_eq!(
            Connect::new("", false, 0).validate(),
            Err(ValidationError::IdentifierRejected { client_id: String::new() })
        );
    }

    #[test]
    fn password_without_username() {
        let mut packet = Connect::new("c", true, 0);
        packet.password = Some(Bytes::from_static(b"secret"));
        assert_eq!(packet.validate(), Err(ValidationError::PasswordWithoutUsername));
    }

    #[test]
    fn oversized_password_writes_nothing() {
        let packet = Connect::new("c", true, 0).with_credentials("user", Some(Bytes::from(vec![0u8; 65_536])));
        let mut out = Vec::new();
        match packet.encode(&mut out) {
            Err(EncodeError::BinaryTooLong { len }) => assert_eq!(len, 65_536),
            other => panic!("unexpected result {:?}", other),
        }
        assert!(out.is_empty());
        assert!(packet.encoded_len().is_err());
    }

    #[test]
    fn will_topic_wildcard() {
        let will = LastWillBuilder::default().topic("a/#").build().unwrap();
        assert_eq!(
            Connect::new("c", true, 0).with_will(will).validate(),
            Err(ValidationError::InvalidTopicName { topic: "a/#".to_owned() })
        );
    }
}
