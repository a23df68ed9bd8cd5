//! # RNP — Rocket Networking Protocol
//!
//! ## Rationale
//!
//! This crate is a pure Rust implementation of an embedded networking stack
//! that routes best-effort datagrams between address- and
//! service-multiplexed endpoints over pluggable link interfaces (serial,
//! radio, loopback, whatever a host wires up). It grew out of the needs of
//! a small fleet of cooperatively-scheduled embedded nodes: a rocket's
//! flight computer, its ground station gateway, and whatever debug tooling
//! is plugged in over USB at the time.
//!
//! ## The crate is broken down into the following modules:
//! * [`wire`] - the `Wire` trait used by every fixed-layout field and
//!   record in the protocol.
//! * [`err`] - serialization, deserialization, interface, and routing-drop
//!   error types.
//! * [`consts`] - reserved addresses, services, interface IDs, and the
//!   small wire-level enums (`NodeType`, `NoRouteAction`, `NetmanType`, ...).
//! * [`header`] - the 11-byte on-wire packet header.
//! * [`packet`] - typed packet bodies built on top of a header
//!   (`BasicDataPacket`, `MessagePacket`, `SetRoutePacket`,
//!   `SimpleCommandPacket`).
//! * [`route`] - the dense, address-indexed routing table.
//! * [`iface`] - the `Interface` trait, the bounded ingress queue, and the
//!   built-in loopback interface.
//! * [`config`] - node configuration and its optional persistence hook.
//! * [`manager`] - [`manager::NetworkManager`], the router/forwarder/NETMAN
//!   handler that ties everything above together.
//!
//! ## Design decisions
//!
//! This library runs single-threaded, cooperative-scheduling style: there
//! is no async runtime and no background thread pump. A host calls
//! [`manager::NetworkManager::update`] from its own main loop, which drains
//! interfaces and routes at most one ingress packet per call. Interfaces
//! hand packets to the manager through a bounded, mutex-guarded queue
//! rather than a channel, since the targets this protocol runs on don't
//! always have one available.
//!
//! Routing-level failures (no route, unknown service, a non-hub node asked
//! to forward) are never surfaced as `Result`s — they're silently dropped
//! and logged, with the reason available via
//! [`manager::NetworkManager::last_drop`] for diagnostics and tests. Only
//! local, synchronous failures (malformed input to a packet constructor, an
//! interface's send call) use `Result`.
#![deny(missing_docs)]

mod macros;

pub mod config;
pub mod consts;
pub mod err;
pub mod header;
pub mod iface;
pub mod manager;
pub mod packet;
pub mod route;
pub mod wire;

pub use config::{ConfigStore, ManagerConfig, NoRouteAction, NodeType};
pub use err::{DeError, DropReason, IfaceError, SerError};
pub use header::Header;
pub use iface::{IngressHandle, IngressQueue, Interface, Loopback};
pub use manager::NetworkManager;
pub use packet::{BasicDataPacket, MessagePacket, SerializedPacket};
pub use route::{Route, RoutingTable};
pub use wire::Wire;
