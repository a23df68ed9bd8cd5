// Declarative macros generating the field-ordered wire codec used throughout
// this crate. These are the Rust-native equivalent of the original's
// compile-time member-pointer serialiser: instead of a tuple of member
// pointers built at compile time, we emit a `serialize`/`deserialize` pair
// directly from an ordered field list, so the field order in the macro
// invocation is the wire layout.

/// Define a fixed-layout, little-endian wire record.
///
/// ```ignore
/// wire_record! {
///     struct Header {
///         start_byte: u8,
///         packet_len: u16,
///     }
/// }
/// ```
///
/// Generates `$name::WIRE_SIZE`, `$name::write(&self, out: &mut Vec<u8>)`,
/// and `$name::read(buf: &[u8], offset: &mut usize) -> Result<Self, DeError>`.
/// Only fixed-size [`Wire`][crate::wire::Wire] fields may appear; variable
/// length payloads are appended by the owning packet type after the record,
/// never inside it.
macro_rules! wire_record {
    (
        $(#[$meta:meta])*
        struct $name:ident {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty ),*
        }

        impl $name {
            /// Size in bytes of this record's wire layout.
            pub const WIRE_SIZE: usize = 0 $( + <$ty as $crate::wire::Wire>::WIRE_SIZE )*;

            /// Append the wire image of every field, in declaration order.
            pub fn write(&self, out: &mut Vec<u8>) {
                $( $crate::wire::Wire::write(&self.$field, out); )*
            }

            /// Consume exactly [`Self::WIRE_SIZE`] bytes from `buf` starting at
            /// `*offset`, advancing `*offset` past the record.
            pub fn read(buf: &[u8], offset: &mut usize) -> Result<Self, $crate::err::DeError> {
                if buf.len() < *offset + Self::WIRE_SIZE {
                    return Err($crate::err::DeError::ShortBuffer {
                        wanted: *offset + Self::WIRE_SIZE,
                        got: buf.len(),
                    });
                }
                $( let $field = <$ty as $crate::wire::Wire>::read(buf, offset)?; )*
                Ok($name { $( $field ),* })
            }
        }
    };
}

/// Define a `u8`-backed wire enum with a fallback variant for values that
/// don't match a known name, mirroring the teacher's `impl_var!` family
/// (`src/consts/macros.rs` in the corpus) but scoped to the single integer
/// width this protocol needs.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        enum $name:ident {
            $( $variant:ident = $val:expr ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( #[allow(missing_docs)] $variant ),*,
            /// A value with no matching named variant.
            Unrecognized(u8),
        }

        impl From<u8> for $name {
            fn from(v: u8) -> Self {
                match v {
                    $( $val => $name::$variant, )*
                    other => $name::Unrecognized(other),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(v: $name) -> u8 {
                match v {
                    $( $name::$variant => $val, )*
                    $name::Unrecognized(other) => other,
                }
            }
        }
    };
}

pub(crate) use wire_enum;
pub(crate) use wire_record;
