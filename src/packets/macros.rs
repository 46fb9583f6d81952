/// Declares a packet whose whole body is a two byte packet identifier.
macro_rules! packet_id_only {
    ($(#[$meta:meta])* $name:ident, $ty:expr) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq)]
        pub struct $name {
            pub fixed_header: $crate::header::FixedHeader,
            pub packet_id: u16,
        }

        impl $name {
            pub fn new(packet_id: u16) -> $name {
                let mut packet = $name { packet_id, ..$name::default() };
                $crate::packets::ControlPacket::sync_remaining_length(&mut packet);
                packet
            }
        }

        impl Default for $name {
            fn default() -> $name {
                $name {
                    fixed_header: $crate::header::FixedHeader::new($ty),
                    packet_id: 0,
                }
            }
        }

        impl $crate::packets::ControlPacket for $name {
            const PACKET_TYPE: $crate::types::PacketType = $ty;

            fn fixed_header(&self) -> &$crate::header::FixedHeader {
                &self.fixed_header
            }

            fn fixed_header_mut(&mut self) -> &mut $crate::header::FixedHeader {
                &mut self.fixed_header
            }

            fn packet_id(&self) -> Option<u16> {
                Some(self.packet_id)
            }

            fn body_len(&self) -> usize {
                2
            }

            fn encode_body<B: ::bytes::BufMut>(&self, out: &mut B) -> Result<(), $crate::errors::EncodeError> {
                out.put_u16(self.packet_id);
                Ok(())
            }

            fn parse_body(
                fixed_header: $crate::header::FixedHeader,
                body: &[u8],
            ) -> Result<$name, $crate::errors::DecodeError> {
                $crate::packets::check_length($ty, 2, body)?;
                let packet_id = $crate::parsers::body(body, $crate::parsers::packet_id)?;
                Ok($name { fixed_header, packet_id })
            }

            fn validate(&self) -> Result<$crate::types::ReturnCode, $crate::errors::ValidationError> {
                $crate::rules::check_flags(&self.fixed_header)?;
                $crate::rules::check_packet_id(&self.fixed_header, self.packet_id)?;
                Ok($crate::types::ReturnCode::Accepted)
            }
        }
    };
}

/// Declares a packet that is only a fixed header.
macro_rules! header_only {
    ($(#[$meta:meta])* $name:ident, $ty:expr) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq)]
        pub struct $name {
            pub fixed_header: $crate::header::FixedHeader,
        }

        impl $name {
            pub fn new() -> $name {
                $name::default()
            }
        }

        impl Default for $name {
            fn default() -> $name {
                $name { fixed_header: $crate::header::FixedHeader::new($ty) }
            }
        }

        impl $crate::packets::ControlPacket for $name {
            const PACKET_TYPE: $crate::types::PacketType = $ty;

            fn fixed_header(&self) -> &$crate::header::FixedHeader {
                &self.fixed_header
            }

            fn fixed_header_mut(&mut self) -> &mut $crate::header::FixedHeader {
                &mut self.fixed_header
            }

            fn body_len(&self) -> usize {
                0
            }

            fn encode_body<B: ::bytes::BufMut>(&self, _: &mut B) -> Result<(), $crate::errors::EncodeError> {
                Ok(())
            }

            fn parse_body(
                fixed_header: $crate::header::FixedHeader,
                body: &[u8],
            ) -> Result<$name, $crate::errors::DecodeError> {
                $crate::packets::check_length($ty, 0, body)?;
                Ok($name { fixed_header })
            }

            fn validate(&self) -> Result<$crate::types::ReturnCode, $crate::errors::ValidationError> {
                $crate::rules::check_flags(&self.fixed_header)?;
                Ok($crate::types::ReturnCode::Accepted)
            }
        }
    };
}
