//! Field-ordered little-endian wire codec.
//!
//! [`Wire`] is the base trait every fixed-size scalar field implements; the
//! [`crate::wire_record`] macro composes them into whole records (the
//! on-wire [`crate::header::Header`], [`crate::packet::SetRoutePacket`]
//! body, and so on) by writing each field's image in declaration order.
//! Variable-length payloads (message bodies, route link-layer addresses)
//! are not `Wire` types; the owning packet appends their bytes after the
//! fixed part itself.

use byteorder::{ByteOrder, LittleEndian};

use crate::err::DeError;

/// A fixed-size value with a little-endian wire representation.
pub trait Wire: Sized {
    /// Size in bytes of this type's wire representation.
    const WIRE_SIZE: usize;

    /// Append the little-endian image of `self` to `out`.
    fn write(&self, out: &mut Vec<u8>);

    /// Read a value starting at `*offset`, advancing `*offset` by
    /// [`Self::WIRE_SIZE`]. Fails with [`DeError::ShortBuffer`] if `buf`
    /// does not hold enough bytes.
    fn read(buf: &[u8], offset: &mut usize) -> Result<Self, DeError>;
}

impl Wire for u8 {
    const WIRE_SIZE: usize = 1;

    fn write(&self, out: &mut Vec<u8>) {
        out.push(*self);
    }

    fn read(buf: &[u8], offset: &mut usize) -> Result<Self, DeError> {
        let end = *offset + Self::WIRE_SIZE;
        if buf.len() < end {
            return Err(DeError::ShortBuffer {
                wanted: end,
                got: buf.len(),
            });
        }
        let v = buf[*offset];
        *offset = end;
        Ok(v)
    }
}

impl Wire for u16 {
    const WIRE_SIZE: usize = 2;

    fn write(&self, out: &mut Vec<u8>) {
        let mut buf = [0u8; 2];
        LittleEndian::write_u16(&mut buf, *self);
        out.extend_from_slice(&buf);
    }

    fn read(buf: &[u8], offset: &mut usize) -> Result<Self, DeError> {
        let end = *offset + Self::WIRE_SIZE;
        if buf.len() < end {
            return Err(DeError::ShortBuffer {
                wanted: end,
                got: buf.len(),
            });
        }
        let v = LittleEndian::read_u16(&buf[*offset..end]);
        *offset = end;
        Ok(v)
    }
}

impl Wire for u32 {
    const WIRE_SIZE: usize = 4;

    fn write(&self, out: &mut Vec<u8>) {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, *self);
        out.extend_from_slice(&buf);
    }

    fn read(buf: &[u8], offset: &mut usize) -> Result<Self, DeError> {
        let end = *offset + Self::WIRE_SIZE;
        if buf.len() < end {
            return Err(DeError::ShortBuffer {
                wanted: end,
                got: buf.len(),
            });
        }
        let v = LittleEndian::read_u32(&buf[*offset..end]);
        *offset = end;
        Ok(v)
    }
}

impl Wire for [u8; 32] {
    const WIRE_SIZE: usize = 32;

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self);
    }

    fn read(buf: &[u8], offset: &mut usize) -> Result<Self, DeError> {
        let end = *offset + Self::WIRE_SIZE;
        if buf.len() < end {
            return Err(DeError::ShortBuffer {
                wanted: end,
                got: buf.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&buf[*offset..end]);
        *offset = end;
        Ok(arr)
    }
}
