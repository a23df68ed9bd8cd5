//! Packet envelope types built on top of [`Header`], grounded on
//! `original_source/src/librnp/rnp_packet.{h,cpp}` and
//! `rnp_netman_packets.h`.

use crate::err::{DeError, SerError};
use crate::header::Header;
use crate::route::Route;
use crate::wire::Wire;

/// An owned on-wire byte buffer plus a parsed view of its header, grounded
/// on `RnpPacketSerialized`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedPacket {
    /// Parsed view of the header at the front of `raw`.
    pub header: Header,
    raw: Vec<u8>,
}

impl SerializedPacket {
    /// Parse `raw`'s header; `raw` is retained whole (header bytes ∥ body
    /// bytes) so forwarding can rewrite the header in place.
    pub fn from_bytes(raw: Vec<u8>) -> Result<SerializedPacket, DeError> {
        let mut offset = 0;
        let header = Header::read(&raw, &mut offset)?;
        Ok(SerializedPacket { header, raw })
    }

    /// Build directly from a header and body bytes.
    pub fn from_parts(header: Header, body: &[u8]) -> SerializedPacket {
        let mut raw = Vec::with_capacity(Header::WIRE_SIZE + body.len());
        header.write(&mut raw);
        raw.extend_from_slice(body);
        SerializedPacket { header, raw }
    }

    /// Bytes following the header.
    pub fn body(&self) -> &[u8] {
        &self.raw[Header::WIRE_SIZE.min(self.raw.len())..]
    }

    /// `max(0, raw.len() - header_size)`.
    pub fn body_size(&self) -> usize {
        self.raw.len().saturating_sub(Header::WIRE_SIZE)
    }

    /// Re-encode `self.header` into the first [`Header::WIRE_SIZE`] bytes
    /// of the raw buffer. Call this after mutating `header` (e.g. during
    /// forwarding) and before [`SerializedPacket::into_bytes`].
    pub fn reserialize_header(&mut self) {
        let mut encoded = Vec::with_capacity(Header::WIRE_SIZE);
        self.header.write(&mut encoded);
        self.raw[..Header::WIRE_SIZE].copy_from_slice(&encoded);
    }

    /// Re-serialize the header and consume into the full wire buffer.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.reserialize_header();
        self.raw
    }
}

/// Validate a [`SerializedPacket`] against an expected fixed body size,
/// returning its header on success. Used by fixed-size typed packet
/// constructors (§4.3).
fn validate_fixed_size(
    p: &SerializedPacket,
    expected_body_len: u16,
) -> Result<Header, SerError> {
    if p.header.packet_len != expected_body_len || p.body_size() != expected_body_len as usize {
        return Err(SerError::SizeMismatch {
            declared: p.header.packet_len,
            actual: p.body_size(),
        });
    }
    Ok(p.header.clone())
}

/// Fixed-size packet whose body is the raw little-endian image of a
/// scalar `T`. `SERVICE`/`TYPE` stand in for the original's non-type
/// template parameters as const generics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicDataPacket<T: Wire + Copy, const SERVICE: u8, const TYPE: u8> {
    /// Packet header.
    pub header: Header,
    /// The scalar payload.
    pub data: T,
}

impl<T: Wire + Copy, const SERVICE: u8, const TYPE: u8> BasicDataPacket<T, SERVICE, TYPE> {
    /// Build a new outbound packet carrying `data`.
    pub fn new(data: T) -> BasicDataPacket<T, SERVICE, TYPE> {
        BasicDataPacket {
            header: Header::new(0, SERVICE, TYPE, T::WIRE_SIZE as u16),
            data,
        }
    }

    /// Parse from a received, size-validated [`SerializedPacket`].
    pub fn from_serialized(
        p: &SerializedPacket,
    ) -> Result<BasicDataPacket<T, SERVICE, TYPE>, SerError> {
        let header = validate_fixed_size(p, T::WIRE_SIZE as u16)?;
        let mut offset = 0;
        let data = T::read(p.body(), &mut offset).map_err(|_| SerError::SizeMismatch {
            declared: p.header.packet_len,
            actual: p.body_size(),
        })?;
        Ok(BasicDataPacket { header, data })
    }

    /// Build from an already-constructed header (e.g. one derived via
    /// [`Header::generate_response`]) rather than a fresh one.
    pub fn from_header(header: Header, data: T) -> BasicDataPacket<T, SERVICE, TYPE> {
        BasicDataPacket { header, data }
    }

    /// Serialize header and body into `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        self.header.write(out);
        self.data.write(out);
    }
}

/// Variable-length UTF-8 message body (§4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePacket<const SERVICE: u8, const TYPE: u8> {
    /// Packet header.
    pub header: Header,
    /// The message text.
    pub message: String,
}

impl<const SERVICE: u8, const TYPE: u8> MessagePacket<SERVICE, TYPE> {
    /// Build a new outbound message packet.
    pub fn new(message: impl Into<String>) -> MessagePacket<SERVICE, TYPE> {
        let message = message.into();
        let header = Header::new(0, SERVICE, TYPE, message.len() as u16);
        MessagePacket { header, message }
    }

    /// Parse from a received [`SerializedPacket`]; accepts any body length.
    pub fn from_serialized(p: &SerializedPacket) -> Result<MessagePacket<SERVICE, TYPE>, DeError> {
        let message = std::str::from_utf8(p.body())?.to_owned();
        Ok(MessagePacket {
            header: p.header.clone(),
            message,
        })
    }

    /// Serialize header and message bytes into `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        self.header.write(out);
        out.extend_from_slice(self.message.as_bytes());
    }
}

/// Max length of the link-layer address bytes embedded in a
/// [`SetRoutePacket`] body.
pub const ADDRESS_DATA_LEN: usize = 32;

/// Fixed-size body for the NETMAN `SET_ROUTE` message, grounded on
/// `rnp_netman_packets.h`'s `SetRoutePacket`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetRoutePacket {
    /// Packet header.
    pub header: Header,
    /// Address the described route is for.
    pub destination: u8,
    /// Egress interface id for the route.
    pub iface: u8,
    /// Route metric/hop cost.
    pub metric: u8,
    /// Kind of link-layer address carried in `address_data`.
    pub address_type: crate::consts::AddressKind,
    /// Number of valid bytes in `address_data`.
    pub address_len: u8,
    /// Fixed-size link-layer address buffer, `address_len` bytes valid.
    pub address_data: [u8; ADDRESS_DATA_LEN],
}

impl SetRoutePacket {
    /// Fixed wire body size: 5 scalar fields plus the 32-byte address
    /// buffer.
    pub const BODY_SIZE: usize = 5 + ADDRESS_DATA_LEN;

    /// Build a `SET_ROUTE` packet describing `route` for `destination`.
    /// An address that doesn't fit in [`ADDRESS_DATA_LEN`] bytes is
    /// truncated to it (link-layer addresses in this protocol are never
    /// expected to exceed it).
    pub fn from_route(destination: u8, route: &Route) -> SetRoutePacket {
        let mut address_data = [0u8; ADDRESS_DATA_LEN];
        let (address_type, address_len) = match route.address() {
            Some(addr) => {
                let bytes = addr.as_bytes();
                let len = bytes.len().min(ADDRESS_DATA_LEN);
                address_data[..len].copy_from_slice(&bytes[..len]);
                (crate::consts::AddressKind::String, len as u8)
            }
            None => (crate::consts::AddressKind::None, 0),
        };
        SetRoutePacket {
            header: Header::new(
                0,
                crate::consts::SERVICE_NETMAN,
                crate::consts::NetmanType::SetRoute.into(),
                Self::BODY_SIZE as u16,
            ),
            destination,
            iface: route.iface(),
            metric: route.metric(),
            address_type,
            address_len,
            address_data,
        }
    }

    /// Parse from a received, size-validated [`SerializedPacket`].
    pub fn from_serialized(p: &SerializedPacket) -> Result<SetRoutePacket, SerError> {
        let header = validate_fixed_size(p, Self::BODY_SIZE as u16)?;
        let body = p.body();
        let destination = body[0];
        let iface = body[1];
        let metric = body[2];
        let address_type = crate::consts::AddressKind::from(body[3]);
        let address_len = body[4];
        let mut address_data = [0u8; ADDRESS_DATA_LEN];
        address_data.copy_from_slice(&body[5..5 + ADDRESS_DATA_LEN]);
        Ok(SetRoutePacket {
            header,
            destination,
            iface,
            metric,
            address_type,
            address_len,
            address_data,
        })
    }

    /// Serialize header and body into `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        self.header.write(out);
        out.push(self.destination);
        out.push(self.iface);
        out.push(self.metric);
        out.push(self.address_type.into());
        out.push(self.address_len);
        out.extend_from_slice(&self.address_data);
    }

    /// Reconstruct the [`Route`] this packet describes.
    pub fn route(&self) -> Route {
        let address = match self.address_type {
            crate::consts::AddressKind::String => {
                let len = self.address_len as usize;
                std::str::from_utf8(&self.address_data[..len.min(ADDRESS_DATA_LEN)])
                    .ok()
                    .map(str::to_owned)
            }
            _ => None,
        };
        Route::new(self.iface, self.metric, address)
    }
}

/// Command identifier carried by a [`SimpleCommandPacket`].
pub type Command = u8;

/// `COMMAND` service packet body — `command: u8, arg: u32` — supplementing
/// spec.md's distillation, grounded on
/// `original_source/src/librnp/default_packets/simplecommandpacket.{h,cpp}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleCommandPacket {
    /// Packet header.
    pub header: Header,
    /// Command identifier.
    pub command: Command,
    /// Command argument.
    pub arg: u32,
}

impl SimpleCommandPacket {
    /// Fixed wire body size.
    pub const BODY_SIZE: usize = 1 + 4;

    /// Build a new outbound command packet.
    pub fn new(command: Command, arg: u32) -> SimpleCommandPacket {
        SimpleCommandPacket {
            header: Header::new(
                0,
                crate::consts::SERVICE_COMMAND,
                0,
                Self::BODY_SIZE as u16,
            ),
            command,
            arg,
        }
    }

    /// Parse from a received, size-validated [`SerializedPacket`].
    pub fn from_serialized(p: &SerializedPacket) -> Result<SimpleCommandPacket, SerError> {
        let header = validate_fixed_size(p, Self::BODY_SIZE as u16)?;
        let body = p.body();
        let command = body[0];
        let arg = u32::from_le_bytes([body[1], body[2], body[3], body[4]]);
        Ok(SimpleCommandPacket {
            header,
            command,
            arg,
        })
    }

    /// Serialize header and body into `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        self.header.write(out);
        out.push(self.command);
        out.extend_from_slice(&self.arg.to_le_bytes());
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::consts::{AddressKind, SERVICE_NETMAN};

    #[test]
    fn serialized_packet_body_roundtrip() {
        let header = Header::new(0, 9, 1, 3);
        let sp = SerializedPacket::from_parts(header, &[1, 2, 3]);
        assert_eq!(sp.body(), &[1, 2, 3]);
        assert_eq!(sp.body_size(), 3);
    }

    #[test]
    fn serialized_packet_from_bytes_short_fails() {
        assert!(SerializedPacket::from_bytes(vec![0xAF, 0, 0]).is_err());
    }

    #[test]
    fn reserialize_header_updates_raw() {
        let header = Header::new(0, 9, 1, 0);
        let mut sp = SerializedPacket::from_parts(header, &[]);
        sp.header.destination = 42;
        sp.reserialize_header();
        let bytes = sp.into_bytes();
        let mut off = 0;
        let back = Header::read(&bytes, &mut off).unwrap();
        assert_eq!(back.destination, 42);
    }

    #[test]
    fn basic_data_packet_roundtrip() {
        type Ping = BasicDataPacket<u32, SERVICE_NETMAN, 1>;
        let p = Ping::new(0xDEADBEEF);
        let mut bytes = Vec::new();
        p.write(&mut bytes);
        let sp = SerializedPacket::from_bytes(bytes).unwrap();
        let back = Ping::from_serialized(&sp).unwrap();
        assert_eq!(back.data, 0xDEADBEEF);
    }

    #[test]
    fn basic_data_packet_size_mismatch() {
        type Ping = BasicDataPacket<u32, SERVICE_NETMAN, 1>;
        let header = Header::new(0, SERVICE_NETMAN, 1, 2);
        let sp = SerializedPacket::from_parts(header, &[1, 2]);
        assert!(Ping::from_serialized(&sp).is_err());
    }

    #[test]
    fn message_packet_roundtrip() {
        type Msg = MessagePacket<0, 0>;
        let p = Msg::new("hello");
        let mut bytes = Vec::new();
        p.write(&mut bytes);
        let sp = SerializedPacket::from_bytes(bytes).unwrap();
        let back = Msg::from_serialized(&sp).unwrap();
        assert_eq!(back.message, "hello");
    }

    #[test]
    fn set_route_packet_roundtrip_with_address() {
        let route = Route::new(3, 1, Some("aa:bb:cc".into()));
        let p = SetRoutePacket::from_route(7, &route);
        assert_eq!(p.address_type, AddressKind::String);
        let mut bytes = Vec::new();
        p.write(&mut bytes);
        let sp = SerializedPacket::from_bytes(bytes).unwrap();
        let back = SetRoutePacket::from_serialized(&sp).unwrap();
        assert_eq!(back.destination, 7);
        assert_eq!(back.route(), route);
    }

    #[test]
    fn set_route_packet_no_address() {
        let route = Route::new(3, 1, None);
        let p = SetRoutePacket::from_route(7, &route);
        assert_eq!(p.address_type, AddressKind::None);
        assert_eq!(p.address_len, 0);
        assert_eq!(p.route(), route);
    }

    #[test]
    fn simple_command_packet_roundtrip() {
        let p = SimpleCommandPacket::new(5, 0x1234);
        let mut bytes = Vec::new();
        p.write(&mut bytes);
        let sp = SerializedPacket::from_bytes(bytes).unwrap();
        let back = SimpleCommandPacket::from_serialized(&sp).unwrap();
        assert_eq!(back.command, 5);
        assert_eq!(back.arg, 0x1234);
    }
}
