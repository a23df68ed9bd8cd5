//! Error types used throughout this crate.
//!
//! There are three main types:
//! * [`SerError`] - error while serializing a packet.
//! * [`DeError`] - error while deserializing a packet or header.
//! * [`IfaceError`] - error reported by a link [`crate::iface::Interface`].
//!
//! # Design decisions
//!
//! None of these are ever surfaced by [`crate::manager::NetworkManager`]
//! itself: per-packet failures are dropped and logged (see
//! [`DropReason`]), matching the original's "never throws to callers"
//! failure policy. These types exist for the narrower, local failures
//! inside (de)serialization constructors and interface I/O, where a
//! `Result` is the natural shape.

use std::{
    error::Error,
    fmt::{self, Display},
};

/// Error while serializing a packet into its wire representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerError {
    /// Declared `packet_len` does not match the actual body length being
    /// serialized.
    SizeMismatch {
        /// Size declared in the header.
        declared: u16,
        /// Actual body length.
        actual: usize,
    },
}

impl Display for SerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SerError::SizeMismatch { declared, actual } => write!(
                f,
                "packet_len {declared} does not match body length {actual}"
            ),
        }
    }
}

impl Error for SerError {}

/// Error while deserializing a packet or header from bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeError {
    /// The buffer did not hold enough bytes for the record being parsed.
    ShortBuffer {
        /// Total bytes needed (offset + record size).
        wanted: usize,
        /// Bytes actually available.
        got: usize,
    },
    /// A header's `start_byte` was not `0xAF`.
    BadStartByte(u8),
    /// A message body was not valid UTF-8.
    Utf8,
}

impl Display for DeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeError::ShortBuffer { wanted, got } => {
                write!(f, "buffer too short: wanted {wanted} bytes, got {got}")
            }
            DeError::BadStartByte(b) => {
                write!(f, "bad start byte: {b:#04x}, expected 0xaf")
            }
            DeError::Utf8 => write!(f, "message body was not valid utf-8"),
        }
    }
}

impl Error for DeError {}

impl From<std::str::Utf8Error> for DeError {
    fn from(_: std::str::Utf8Error) -> Self {
        DeError::Utf8
    }
}

/// Error reported by a link [`crate::iface::Interface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IfaceError {
    /// The interface's ingress queue was at capacity.
    QueueFull,
    /// The interface is not currently up.
    Down,
}

impl Display for IfaceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IfaceError::QueueFull => write!(f, "ingress queue full"),
            IfaceError::Down => write!(f, "interface down"),
        }
    }
}

impl Error for IfaceError {}

/// Reason a packet was silently dropped by the manager, exposed purely for
/// logging and test introspection (see `NetworkManager::last_drop` in
/// SPEC_FULL.md's `[TESTING]` section). These correspond 1:1 to spec.md
/// §7's error taxonomy for routing-level failures, none of which are ever
/// returned as a `Result` to a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// No route to the packet's destination and `noRouteAction == Dump`.
    NoRoute,
    /// Chosen egress interface ID has no registered interface.
    BadInterface(u8),
    /// Route pointed at the loopback interface but the destination wasn't
    /// the current address.
    MisroutedLoopback,
    /// Destination service had no registered callback.
    UnknownService(u8),
    /// Attempt to register/unregister service ID 0 (`NOSERVICE`).
    IllegalServiceId,
    /// Packet claimed to be from the current address but didn't arrive
    /// over loopback.
    LoopbackSanity,
    /// Packet forwarded by a non-hub node.
    NotAHub,
    /// Forwarding would send back out the interface the packet arrived on.
    ForwardBounce,
}

impl Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DropReason::NoRoute => write!(f, "no route to destination"),
            DropReason::BadInterface(id) => write!(f, "invalid/non-existent interface {id}"),
            DropReason::MisroutedLoopback => {
                write!(f, "bad route: loopback selected for non-local destination")
            }
            DropReason::UnknownService(id) => write!(f, "no handler registered for service {id}"),
            DropReason::IllegalServiceId => write!(f, "illegal service identifier 0"),
            DropReason::LoopbackSanity => write!(
                f,
                "packet addressed from current node but not received over loopback"
            ),
            DropReason::NotAHub => write!(f, "non-hub node dropped a packet not addressed to it"),
            DropReason::ForwardBounce => {
                write!(f, "refusing to forward back out the arrival interface")
            }
        }
    }
}
