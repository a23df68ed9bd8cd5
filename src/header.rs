//! The 11-byte on-wire packet header plus its non-serialized runtime
//! metadata, grounded on `original_source/src/rnp_header.{h,cpp}`.
//!
//! [`wire_record!`][crate::macros::wire_record] only covers fixed `Wire`
//! fields, so the two fields a receiving interface stamps in after framing
//! (`src_iface`, `lladdress`) live on the outer [`Header`] alongside an
//! embedded [`HeaderFields`] generated by the macro, rather than inside it.

use crate::err::DeError;
use crate::macros::wire_record;

wire_record! {
    /// The fixed, on-wire portion of a packet header (§3).
    struct HeaderFields {
        /// Frame sync marker, always `0xAF`.
        start_byte: u8,
        /// Length of the body following this header, in bytes.
        packet_len: u16,
        /// Request/response correlation id.
        uid: u16,
        /// Originating service on the source node.
        source_service: u8,
        /// Target service on the destination node.
        destination_service: u8,
        /// Packet type, scoped to the destination service.
        r#type: u8,
        /// Originating node address.
        source: u8,
        /// Target node address.
        destination: u8,
        /// Number of hops this packet has been forwarded.
        hops: u8,
    }
}

/// Packet header: [`HeaderFields`]'s wire image plus the metadata a link
/// interface fills in on receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// The fixed, on-wire fields.
    pub fields: HeaderFields,
    /// Interface a received packet arrived over. Meaningless until set by
    /// the receiving interface.
    pub src_iface: u8,
    /// Link-layer address of the sender, opaque to the core and used only
    /// by link drivers that need it (e.g. to address a reply).
    pub lladdress: Option<String>,
}

impl std::ops::Deref for Header {
    type Target = HeaderFields;

    fn deref(&self) -> &HeaderFields {
        &self.fields
    }
}

impl std::ops::DerefMut for Header {
    fn deref_mut(&mut self) -> &mut HeaderFields {
        &mut self.fields
    }
}

impl Header {
    /// Size in bytes of the serialized portion of a header.
    pub const WIRE_SIZE: usize = HeaderFields::WIRE_SIZE;

    /// Build a header for an outbound packet. `source`/`destination`
    /// default to 0 and `hops` to 0, matching the original constructor;
    /// the manager fills in addressing before send.
    pub fn new(source_service: u8, destination_service: u8, r#type: u8, body_len: u16) -> Header {
        Header {
            fields: HeaderFields {
                start_byte: crate::consts::START_BYTE,
                packet_len: body_len,
                uid: 0,
                source_service,
                destination_service,
                r#type,
                source: 0,
                destination: 0,
                hops: 0,
            },
            src_iface: 0,
            lladdress: None,
        }
    }

    /// Assign a `uid`, builder-style.
    pub fn with_uid(mut self, uid: u16) -> Header {
        self.fields.uid = uid;
        self
    }

    /// Append this header's wire image to `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        self.fields.write(out);
    }

    /// Parse a header from the front of `buf`, advancing `*offset`. Fails
    /// with [`DeError::ShortBuffer`] if fewer than [`Header::WIRE_SIZE`]
    /// bytes remain.
    pub fn read(buf: &[u8], offset: &mut usize) -> Result<Header, DeError> {
        let fields = HeaderFields::read(buf, offset)?;
        if fields.start_byte != crate::consts::START_BYTE {
            return Err(DeError::BadStartByte(fields.start_byte));
        }
        Ok(Header {
            fields,
            src_iface: 0,
            lladdress: None,
        })
    }

    /// Build a response header to `req`: copies `uid` and `hops`, swaps
    /// `(source, destination)` and `(source_service, destination_service)`.
    /// `type` is left at 0 for the caller to set; `src_iface` and
    /// `lladdress` start at their defaults (original_source mutates an
    /// existing response header in place; this returns a fresh one, the
    /// safe-Rust equivalent).
    pub fn generate_response(req: &Header) -> Header {
        Header {
            fields: HeaderFields {
                start_byte: crate::consts::START_BYTE,
                packet_len: 0,
                uid: req.uid,
                source_service: req.destination_service,
                destination_service: req.source_service,
                r#type: 0,
                source: req.destination,
                destination: req.source,
                hops: req.hops,
            },
            src_iface: 0,
            lladdress: None,
        }
    }
}

impl std::fmt::Display for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, ">>>HEADER<<<")?;
        writeln!(f, "start_byte: {}", self.start_byte)?;
        writeln!(f, "packet_len: {}", self.packet_len)?;
        writeln!(f, "uid: {}", self.uid)?;
        writeln!(f, "source_service: {}", self.source_service)?;
        writeln!(f, "destination_service: {}", self.destination_service)?;
        writeln!(f, "type: {}", self.r#type)?;
        writeln!(f, "source: {}", self.source)?;
        writeln!(f, "destination: {}", self.destination)?;
        write!(f, "hops: {}", self.hops)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn new_sets_start_byte_and_defaults() {
        let h = Header::new(1, 2, 3, 4);
        assert_eq!(h.start_byte, 0xAF);
        assert_eq!(h.packet_len, 4);
        assert_eq!(h.source_service, 1);
        assert_eq!(h.destination_service, 2);
        assert_eq!(h.r#type, 3);
        assert_eq!(h.source, 0);
        assert_eq!(h.destination, 0);
        assert_eq!(h.hops, 0);
    }

    #[test]
    fn roundtrip() {
        let h = Header::new(1, 2, 3, 5).with_uid(0xBEEF);
        let mut buf = Vec::new();
        h.write(&mut buf);
        assert_eq!(buf.len(), Header::WIRE_SIZE);
        let mut off = 0;
        let back = Header::read(&buf, &mut off).unwrap();
        assert_eq!(back, h);
        assert_eq!(off, Header::WIRE_SIZE);
    }

    #[test]
    fn short_buffer() {
        let buf = [0xAFu8, 0, 0];
        let mut off = 0;
        assert!(matches!(
            Header::read(&buf, &mut off),
            Err(DeError::ShortBuffer { .. })
        ));
    }

    #[test]
    fn bad_start_byte() {
        let mut buf = vec![0u8; Header::WIRE_SIZE];
        buf[0] = 0x00;
        let mut off = 0;
        assert!(matches!(
            Header::read(&buf, &mut off),
            Err(DeError::BadStartByte(0))
        ));
    }

    #[test]
    fn generate_response_swaps_addressing() {
        let mut req = Header::new(1, 2, 9, 0).with_uid(7);
        req.source = 10;
        req.destination = 20;
        let resp = Header::generate_response(&req);
        assert_eq!(resp.uid, 7);
        assert_eq!(resp.source, 20);
        assert_eq!(resp.destination, 10);
        assert_eq!(resp.source_service, 2);
        assert_eq!(resp.destination_service, 1);
    }
}
