//! Reserved protocol constants and small wire-level enums.
//!
//! Addresses, service IDs, and interface IDs are plain `u8`s on the wire
//! (spec.md §3); only the small number of values with defined meaning are
//! named here as `const`s, same as the original's `DEFAULT_ADDRESS` /
//! `DEFAULT_SERVICES` / `DEFAULT_INTERFACES` enums. `NodeType` and
//! `NoRouteAction` get full wire enums via [`crate::wire_enum`] since
//! they're carried as NETMAN payloads and need an `Unrecognized` fallback,
//! mirroring the teacher's `impl_var!`-generated constant wrappers
//! (`src/consts/macros.rs`, `src/consts/nl.rs` in the corpus).

use crate::macros::wire_enum;

/// Address meaning "unassigned"; nodes may ping this address to discover
/// their own.
pub const ADDR_NOADDRESS: u8 = 0;
/// Reserved address for a debug host.
pub const ADDR_DEBUG: u8 = 1;
/// Reserved address for the flight computer.
pub const ADDR_ROCKET: u8 = 2;
/// Reserved address for the ground station gateway.
pub const ADDR_GROUNDSTATION_GATEWAY: u8 = 3;
/// Reserved address for the ground station.
pub const ADDR_GROUNDSTATION: u8 = 4;

/// Debug-passthrough service: routed to the debug interface rather than
/// dispatched locally.
pub const SERVICE_NOSERVICE: u8 = 0;
/// In-band node management service.
pub const SERVICE_NETMAN: u8 = 1;
/// Reserved service ID for host-defined command processors.
pub const SERVICE_COMMAND: u8 = 2;

/// Built-in loopback interface ID. Always present (invariant I5).
pub const IFACE_LOOPBACK: u8 = 0;
/// Conventional ID for a USB serial link.
pub const IFACE_USBSERIAL: u8 = 1;

/// Fixed value of [`crate::header::Header::start_byte`] for any
/// well-formed packet (invariant I2).
pub const START_BYTE: u8 = 0xAF;

wire_enum! {
    /// Node forwarding role. Only [`NodeType::Hub`] nodes forward packets
    /// not addressed to them (§4.6.6).
    enum NodeType {
        Leaf = 0,
        Hub = 1,
    }
}

impl Default for NodeType {
    fn default() -> Self {
        NodeType::Leaf
    }
}

wire_enum! {
    /// What to do with a packet whose destination has no route.
    enum NoRouteAction {
        Dump = 0,
        Broadcast = 1,
    }
}

impl Default for NoRouteAction {
    fn default() -> Self {
        NoRouteAction::Dump
    }
}

wire_enum! {
    /// `SetRoutePacket::address_type` discriminant (§4.3, §6).
    enum AddressKind {
        None = 0,
        String = 1,
    }
}

wire_enum! {
    /// NETMAN service wire types (§4.6.7).
    enum NetmanType {
        PingReq = 1,
        PingRes = 2,
        SetAddress = 3,
        SetRoute = 4,
        SetType = 5,
        SetNoRouteAction = 6,
        SetRouteGen = 7,
        SaveConf = 8,
        ResetNetman = 9,
    }
}
