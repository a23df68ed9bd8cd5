//! The network manager: ingress owner, router, forwarder, service
//! dispatcher, and NETMAN handler. Grounded on
//! `original_source/src/rnp_networkmanager.{h,cpp}`.

use crate::config::{ConfigStore, ManagerConfig, NoRouteAction, NodeType, NoopStore, PersistedConfig};
use crate::consts::{self, NetmanType};
use crate::err::{DropReason, IfaceError};
use crate::header::Header;
use crate::iface::{IngressQueue, Interface, InterfaceInfo};
use crate::packet::{BasicDataPacket, SerializedPacket, SetRoutePacket};
use crate::route::{Route, RoutingTable};

/// Bound on the shared ingress queue (§9: "a bounded MPSC queue is the
/// expected shape"). Not specified further by the spec; chosen generously
/// for a single in-flight-per-tick consumer.
pub const DEFAULT_INGRESS_CAPACITY: usize = 64;

type ServiceHandler = Box<dyn FnMut(SerializedPacket) + Send>;

/// Type-agnostic NETMAN data packet: every NETMAN message besides
/// `SET_ROUTE` carries a `u32` payload, read only for its low byte or
/// truthiness (§9 design note).
type Generic = BasicDataPacket<u32, { consts::SERVICE_NETMAN }, 0>;

/// The core network manager (§4.6). `Q` is the config persistence
/// backend, defaulting to [`NoopStore`] (no persistence).
pub struct NetworkManager<Q: ConfigStore = NoopStore> {
    ingress: IngressQueue,
    interfaces: Vec<Option<Box<dyn Interface>>>,
    service_registry: Vec<Option<ServiceHandler>>,
    routing_table: RoutingTable,
    base_table: RoutingTable,
    config: ManagerConfig,
    broadcast_list: Vec<u8>,
    config_store: Q,
    log_cb: Option<Box<dyn FnMut(&str) + Send>>,
    logging_enabled: bool,
    last_drop: Option<DropReason>,
}

impl NetworkManager<NoopStore> {
    /// Default-configured manager: `noRouteAction = DUMP`,
    /// `routeGenEnabled = false`, no persistence backend.
    pub fn new(address: u8, node_type: NodeType, logging_enabled: bool) -> NetworkManager<NoopStore> {
        NetworkManager::with_store(
            ManagerConfig {
                current_address: address,
                node_type,
                ..Default::default()
            },
            logging_enabled,
            NoopStore,
        )
    }

    /// Build from an explicit [`ManagerConfig`], no persistence backend.
    pub fn with_config(config: ManagerConfig, logging_enabled: bool) -> NetworkManager<NoopStore> {
        NetworkManager::with_store(config, logging_enabled, NoopStore)
    }
}

impl<Q: ConfigStore> NetworkManager<Q> {
    /// Build with an explicit config store backend.
    pub fn with_store(config: ManagerConfig, logging_enabled: bool, store: Q) -> NetworkManager<Q> {
        let mut mgr = NetworkManager {
            ingress: IngressQueue::new(DEFAULT_INGRESS_CAPACITY),
            interfaces: Vec::new(),
            service_registry: Vec::new(),
            routing_table: RoutingTable::new(),
            base_table: RoutingTable::new(),
            config,
            broadcast_list: Vec::new(),
            config_store: store,
            log_cb: None,
            logging_enabled,
            last_drop: None,
        };
        let mut loopback = crate::iface::Loopback::default();
        loopback.setup();
        mgr.add_interface(Box::new(loopback));
        mgr.generate_default_routes();
        mgr
    }

    /// This node's current address.
    pub fn address(&self) -> u8 {
        self.config.current_address
    }

    /// Current forwarding role.
    pub fn node_type(&self) -> NodeType {
        self.config.node_type
    }

    /// Read-only view of the live routing table, for diagnostics.
    pub fn routing_table(&self) -> &RoutingTable {
        &self.routing_table
    }

    /// Reason the most recently dropped packet was dropped, if any.
    /// Testing/introspection hook; not part of the wire protocol.
    pub fn last_drop(&self) -> Option<&DropReason> {
        self.last_drop.as_ref()
    }

    /// Push `packet` directly onto the ingress queue, as if it had just
    /// been received over some interface. Fails with
    /// [`IfaceError::QueueFull`] under the same backpressure an
    /// [`Interface`] would hit. Useful for drivers that receive
    /// out-of-band (e.g. from an interrupt handler) rather than through
    /// [`Interface::update`].
    pub fn inject(&self, packet: SerializedPacket) -> Result<(), IfaceError> {
        self.ingress.handle().push(packet)
    }

    /// Install a host-side log sink. Only invoked while logging is
    /// enabled (see [`NetworkManager::with_store`]).
    pub fn set_log_cb(&mut self, cb: impl FnMut(&str) + Send + 'static) {
        self.log_cb = Some(Box::new(cb));
    }

    fn log(&mut self, msg: &str) {
        log::debug!(target: "rnp::manager", "{msg}");
        if !self.logging_enabled {
            return;
        }
        match &mut self.log_cb {
            Some(cb) => cb(msg),
            None => log::info!(target: "rnp::manager", "{msg}"),
        }
    }

    fn record_drop(&mut self, reason: DropReason) {
        let msg = reason.to_string();
        self.last_drop = Some(reason);
        self.log(&msg);
    }

    /// Replace the routing table and configuration together: the table
    /// first, so a config/table address mismatch still leaves a working
    /// default route (§4.6.2).
    pub fn reconfigure(&mut self, config: ManagerConfig, new_table: RoutingTable) {
        self.set_routing_table(new_table);
        self.load_config(config);
    }

    /// Load a new config, first clearing any stale loopback route for the
    /// old address.
    pub fn load_config(&mut self, config: ManagerConfig) {
        self.set_address(config.current_address);
        self.config = config;
    }

    /// Replace the routing table, regenerating the default routes
    /// afterward so the node can still be reached.
    pub fn set_routing_table(&mut self, new_table: RoutingTable) {
        self.routing_table = new_table;
        self.generate_default_routes();
    }

    /// Snapshot the current routing table as the reset baseline.
    pub fn update_base_table(&mut self) {
        self.base_table = self.routing_table.clone();
    }

    /// Restore the routing table from the last [`Self::update_base_table`]
    /// snapshot and regenerate default routes.
    pub fn reset(&mut self) {
        self.routing_table = self.base_table.clone();
        self.generate_default_routes();
    }

    /// Ensure a loopback route to `current_address` and a route to the
    /// debug address always exist (I3).
    pub fn generate_default_routes(&mut self) {
        self.routing_table.set_route(
            self.config.current_address,
            Route::new(consts::IFACE_LOOPBACK, 1, None),
        );
        self.routing_table.set_route(
            consts::ADDR_DEBUG,
            Route::new(consts::IFACE_USBSERIAL, 1, None),
        );
    }

    /// Change this node's address, cleaning up the old loopback route
    /// first and regenerating default routes for the new one.
    pub fn set_address(&mut self, address: u8) {
        if let Some(route) = self.routing_table.get_route(self.config.current_address) {
            if route.iface() == consts::IFACE_LOOPBACK {
                self.routing_table.delete_route(self.config.current_address);
            }
        }
        self.config.current_address = address;
        self.generate_default_routes();
    }

    /// Switch forwarding role.
    pub fn set_node_type(&mut self, node_type: NodeType) {
        self.config.node_type = node_type;
    }

    /// Set the no-route policy and (for BROADCAST) the interfaces it
    /// targets; an empty list means "all interfaces".
    pub fn set_no_route_action(&mut self, action: NoRouteAction, ifaces: Vec<u8>) {
        self.config.no_route_action = action;
        self.broadcast_list = ifaces;
    }

    /// Toggle automatic route learning from unknown ingress sources.
    pub fn enable_auto_route_gen(&mut self, enabled: bool) {
        self.config.route_gen_enabled = enabled;
    }

    /// Register `iface` at its own ID, growing the interface table if
    /// needed and wiring up the shared ingress queue.
    pub fn add_interface(&mut self, mut iface: Box<dyn Interface>) {
        let id = iface.id() as usize;
        if id >= self.interfaces.len() {
            self.interfaces.resize_with(id + 1, || None);
        }
        if self.interfaces[id].is_some() {
            self.log("non-unique interface identifier");
        }
        iface.set_ingress(self.ingress.handle());
        self.interfaces[id] = Some(iface);
    }

    /// Current diagnostics snapshot for interface `id`, if registered.
    pub fn interface_info(&self, id: u8) -> Option<InterfaceInfo> {
        self.interfaces
            .get(id as usize)
            .and_then(|slot| slot.as_ref())
            .map(|iface| iface.info())
    }

    /// Unregister the interface at `id`, shrinking the table if it was
    /// the last slot.
    pub fn remove_interface(&mut self, id: u8) {
        let idx = id as usize;
        if idx >= self.interfaces.len() {
            self.log("interface identifier out of range");
            return;
        }
        self.interfaces[idx] = None;
        if idx == self.interfaces.len() - 1 {
            self.interfaces.pop();
        }
    }

    /// Register a per-service packet callback. Rejects service ID 0
    /// (`NOSERVICE` is handled by the manager itself).
    pub fn register_service(
        &mut self,
        service_id: u8,
        handler: impl FnMut(SerializedPacket) + Send + 'static,
    ) {
        if service_id == 0 {
            self.record_drop(DropReason::IllegalServiceId);
            return;
        }
        let idx = service_id as usize;
        if idx >= self.service_registry.len() {
            self.service_registry.resize_with(idx + 1, || None);
        }
        self.service_registry[idx] = Some(Box::new(handler));
    }

    /// Remove the callback for `service_id`, shrinking the table if it
    /// was the last slot.
    pub fn unregister_service(&mut self, service_id: u8) {
        if service_id == 0 {
            self.record_drop(DropReason::IllegalServiceId);
            return;
        }
        let idx = service_id as usize;
        if idx >= self.service_registry.len() {
            self.log("unregisterService: service ID out of range");
            return;
        }
        self.service_registry[idx] = None;
        if idx == self.service_registry.len() - 1 {
            self.service_registry.pop();
        }
    }

    /// Run one tick: update every interface, then process at most one
    /// ingress packet.
    pub fn update(&mut self) {
        for slot in self.interfaces.iter_mut() {
            if let Some(iface) = slot {
                iface.update();
            }
        }
        self.route_packets();
    }

    fn route_packets(&mut self) {
        let Some(mut packet) = self.ingress.pop() else {
            return;
        };

        if self.config.route_gen_enabled
            && self
                .routing_table
                .get_route(packet.header.source)
                .is_none()
        {
            let route = Route::new(
                packet.header.src_iface,
                packet.header.hops,
                packet.header.lladdress.clone(),
            );
            self.routing_table.set_route(packet.header.source, route);
        }

        if packet.header.source == consts::ADDR_DEBUG
            && packet.header.destination == consts::ADDR_NOADDRESS
        {
            packet.header.destination = self.config.current_address;
        }

        if packet.header.destination != self.config.current_address {
            self.forward_packet(&mut packet);
            return;
        }

        if packet.header.source == self.config.current_address
            && packet.header.src_iface != consts::IFACE_LOOPBACK
        {
            self.record_drop(DropReason::LoopbackSanity);
            return;
        }

        let service = packet.header.destination_service;
        match service {
            consts::SERVICE_NOSERVICE => {
                packet.header.destination = consts::ADDR_DEBUG;
                self.send_packet(&mut packet);
            }
            consts::SERVICE_NETMAN => self.netman_handler(packet),
            _ => {
                let idx = service as usize;
                let handler = self
                    .service_registry
                    .get_mut(idx)
                    .and_then(Option::take);
                match handler {
                    Some(mut cb) => {
                        cb(packet);
                        self.service_registry[idx] = Some(cb);
                    }
                    None => self.record_drop(DropReason::UnknownService(service)),
                }
            }
        }
    }

    fn forward_packet(&mut self, packet: &mut SerializedPacket) {
        if packet.header.source == consts::ADDR_DEBUG
            && packet.header.source_service == consts::SERVICE_NOSERVICE
        {
            packet.header.source = self.config.current_address;
        } else if self.config.node_type != NodeType::Hub {
            self.record_drop(DropReason::NotAHub);
            return;
        }
        self.send_packet(packet);
    }

    /// Send `packet`, consulting the routing table and, on a miss,
    /// applying the configured no-route policy. BROADCAST is terminal: no
    /// further send happens after broadcasting (§9 Open Question — the
    /// source's switch fall-through is not replicated).
    pub fn send_packet(&mut self, packet: &mut SerializedPacket) {
        packet.header.hops = packet.header.hops.wrapping_add(1);
        let destination = packet.header.destination;

        let route = match self.routing_table.get_route(destination) {
            Some(route) => route,
            None => {
                match self.config.no_route_action {
                    NoRouteAction::Broadcast => self.broadcast(packet),
                    _ => self.record_drop(DropReason::NoRoute),
                }
                return;
            }
        };

        if packet.header.source != self.config.current_address
            && packet.header.src_iface == route.iface()
        {
            self.record_drop(DropReason::ForwardBounce);
            return;
        }

        self.send_by_route(&route, packet);
    }

    fn broadcast(&mut self, packet: &mut SerializedPacket) {
        let targets: Vec<u8> = if self.broadcast_list.is_empty() {
            (0..self.interfaces.len() as u8).collect()
        } else {
            self.broadcast_list.clone()
        };
        for iface_id in targets {
            if iface_id == packet.header.src_iface || iface_id == consts::IFACE_LOOPBACK {
                continue;
            }
            let route = Route::new(iface_id, 0, None);
            self.send_by_route(&route, packet);
        }
    }

    fn send_by_route(&mut self, route: &Route, packet: &mut SerializedPacket) {
        let iface_id = route.iface();
        if iface_id == consts::IFACE_LOOPBACK && packet.header.destination != self.config.current_address {
            self.record_drop(DropReason::MisroutedLoopback);
            return;
        }

        let Some(Some(iface)) = self.interfaces.get_mut(iface_id as usize) else {
            self.record_drop(DropReason::BadInterface(iface_id));
            return;
        };

        packet.header.lladdress = route.address().clone();
        packet.reserialize_header();
        if let Err(e) = iface.send(packet) {
            let msg = format!("interface {iface_id} send failed: {e}");
            self.log(&msg);
        }
    }

    fn netman_handler(&mut self, packet: SerializedPacket) {
        match NetmanType::from(packet.header.r#type) {
            NetmanType::PingReq => {
                let Ok(ping) = Generic::from_serialized(&packet) else {
                    return;
                };
                let mut header = Header::generate_response(&ping.header);
                header.r#type = NetmanType::PingRes.into();
                header.packet_len = <u32 as crate::wire::Wire>::WIRE_SIZE as u16;
                let pong = Generic::from_header(header, ping.data);
                let mut bytes = Vec::new();
                pong.write(&mut bytes);
                if let Ok(mut sp) = SerializedPacket::from_bytes(bytes) {
                    self.send_packet(&mut sp);
                }
                self.log("Ping sent");
            }
            NetmanType::PingRes => {
                if let Ok(ping) = Generic::from_serialized(&packet) {
                    let msg = format!("Ping received with systime of {}", ping.data);
                    self.log(&msg);
                }
            }
            NetmanType::SetAddress => {
                if let Ok(generic) = Generic::from_serialized(&packet) {
                    let address = generic.data as u8;
                    self.set_address(address);
                    let msg = format!("Node address is now {address}");
                    self.log(&msg);
                }
            }
            NetmanType::SetRoute => {
                if let Ok(set_route) = SetRoutePacket::from_serialized(&packet) {
                    self.routing_table
                        .set_route(set_route.destination, set_route.route());
                    let msg = format!("Route for Node {} has been updated", set_route.destination);
                    self.log(&msg);
                }
            }
            NetmanType::SetType => {
                if let Ok(generic) = Generic::from_serialized(&packet) {
                    self.config.node_type = NodeType::from(generic.data as u8);
                    let msg = format!("Node type is now {:?}", self.config.node_type);
                    self.log(&msg);
                }
            }
            NetmanType::SetNoRouteAction => {
                if let Ok(generic) = Generic::from_serialized(&packet) {
                    self.config.no_route_action = NoRouteAction::from(generic.data as u8);
                    let msg = format!("Node NoRouteAction is now {:?}", self.config.no_route_action);
                    self.log(&msg);
                }
            }
            NetmanType::SetRouteGen => {
                if let Ok(generic) = Generic::from_serialized(&packet) {
                    self.config.route_gen_enabled = generic.data != 0;
                    let msg = format!("Node RouteGen is now {}", self.config.route_gen_enabled);
                    self.log(&msg);
                }
            }
            NetmanType::SaveConf => {
                let persisted = PersistedConfig::from(&self.config);
                let failed = self.config_store.save(&persisted);
                self.log(if failed {
                    "Configuration Failed to Save!"
                } else {
                    "Configuration Saved!"
                });
            }
            NetmanType::ResetNetman => self.reset(),
            NetmanType::Unrecognized(_) => {}
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::iface::IngressHandle;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct Counters {
        sent: Vec<Vec<u8>>,
    }

    struct MockInterface {
        id: u8,
        ingress: Option<IngressHandle>,
        sent: Arc<Mutex<Counters>>,
        info: InterfaceInfo,
    }

    impl MockInterface {
        fn new(id: u8) -> (MockInterface, Arc<Mutex<Counters>>) {
            let sent = Arc::new(Mutex::new(Counters::default()));
            (
                MockInterface {
                    id,
                    ingress: None,
                    sent: Arc::clone(&sent),
                    info: InterfaceInfo::new(256),
                },
                sent,
            )
        }
    }

    impl Interface for MockInterface {
        fn id(&self) -> u8 {
            self.id
        }

        fn name(&self) -> &str {
            "mock"
        }

        fn setup(&mut self) {
            self.info = InterfaceInfo::new(256);
        }

        fn set_ingress(&mut self, ingress: IngressHandle) {
            self.ingress = Some(ingress);
        }

        fn update(&mut self) {}

        fn send(&mut self, packet: &SerializedPacket) -> Result<(), crate::err::IfaceError> {
            let mut sp = packet.clone();
            sp.reserialize_header();
            self.sent.lock().unwrap().sent.push(sp.into_bytes());
            Ok(())
        }

        fn info(&self) -> InterfaceInfo {
            self.info
        }
    }

    fn send_basic(mgr: &mut NetworkManager<NoopStore>, source: u8, destination: u8, service: u8, data: u32) {
        let mut header = Header::new(0, service, 0, 4);
        header.source = source;
        header.destination = destination;
        let packet = Generic::from_header(header, data);
        let mut bytes = Vec::new();
        packet.write(&mut bytes);
        let mut sp = SerializedPacket::from_bytes(bytes).unwrap();
        mgr.send_packet(&mut sp);
    }

    #[test]
    fn self_loopback_delivers_to_service_callback() {
        let mut mgr = NetworkManager::new(5, NodeType::Leaf, false);
        let received = Arc::new(Mutex::new(Vec::new()));
        let received2 = Arc::clone(&received);
        mgr.register_service(2, move |p| {
            received2.lock().unwrap().push(p.header.src_iface);
        });

        send_basic(&mut mgr, 5, 5, 2, 42);
        mgr.update();

        let got = received.lock().unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0], consts::IFACE_LOOPBACK);
    }

    #[test]
    fn unknown_destination_dump_drops_silently() {
        let mut mgr = NetworkManager::new(5, NodeType::Leaf, false);
        let (iface1, sent1) = MockInterface::new(1);
        mgr.add_interface(Box::new(iface1));

        send_basic(&mut mgr, 5, 9, 2, 1);
        mgr.update();

        assert!(sent1.lock().unwrap().sent.is_empty());
        assert_eq!(mgr.last_drop(), Some(&DropReason::NoRoute));
    }

    #[test]
    fn unknown_destination_broadcast_hits_listed_iface_only() {
        let mut mgr = NetworkManager::new(5, NodeType::Leaf, false);
        let (iface1, sent1) = MockInterface::new(1);
        mgr.add_interface(Box::new(iface1));
        mgr.set_no_route_action(NoRouteAction::Broadcast, vec![1]);

        let mut header = Header::new(0, 2, 0, 4);
        header.source = 5;
        header.destination = 9;
        header.src_iface = 2;
        let packet = Generic::from_header(header, 7u32);
        let mut bytes = Vec::new();
        packet.write(&mut bytes);
        let mut sp = SerializedPacket::from_bytes(bytes).unwrap();
        mgr.send_packet(&mut sp);

        assert_eq!(sent1.lock().unwrap().sent.len(), 1);
    }

    #[test]
    fn hub_forwards_between_interfaces() {
        let mut mgr = NetworkManager::new(5, NodeType::Hub, false);
        let (iface1, sent1) = MockInterface::new(1);
        let (iface2, sent2) = MockInterface::new(2);
        mgr.add_interface(Box::new(iface1));
        mgr.add_interface(Box::new(iface2));
        mgr.set_routing_table({
            let mut t = RoutingTable::new();
            t.set_route(7, Route::new(1, 0, None));
            t.set_route(9, Route::new(2, 0, None));
            t
        });

        let mut header = Header::new(0, 2, 0, 4);
        header.source = 7;
        header.destination = 9;
        header.src_iface = 1;
        let packet = Generic::from_header(header, 1u32);
        let mut bytes = Vec::new();
        packet.write(&mut bytes);
        let sp = SerializedPacket::from_bytes(bytes).unwrap();
        mgr.inject(sp).unwrap();
        mgr.update();

        assert_eq!(sent2.lock().unwrap().sent.len(), 1);
        assert!(sent1.lock().unwrap().sent.is_empty());
    }

    #[test]
    fn debug_impersonation_ping_req_gets_answered() {
        let mut mgr = NetworkManager::new(5, NodeType::Leaf, false);
        let (iface1, sent1) = MockInterface::new(1);
        mgr.add_interface(Box::new(iface1));

        let mut header = Header::new(
            consts::SERVICE_NOSERVICE,
            consts::SERVICE_NETMAN,
            NetmanType::PingReq.into(),
            4,
        );
        header.source = consts::ADDR_DEBUG;
        header.destination = consts::ADDR_NOADDRESS;
        header.src_iface = 1;
        let packet = Generic::from_header(header, 0xDEADBEEFu32);
        let mut bytes = Vec::new();
        packet.write(&mut bytes);
        let sp = SerializedPacket::from_bytes(bytes).unwrap();
        mgr.inject(sp).unwrap();
        mgr.update();

        let sent = sent1.lock().unwrap();
        assert_eq!(sent.sent.len(), 1);
        let reply = SerializedPacket::from_bytes(sent.sent[0].clone()).unwrap();
        assert_eq!(reply.header.source, 5);
        assert_eq!(reply.header.destination, consts::ADDR_DEBUG);
        let decoded = Generic::from_serialized(&reply).unwrap();
        assert_eq!(decoded.data, 0xDEADBEEF);
    }

    #[test]
    fn auto_route_gen_learns_once() {
        let mut mgr = NetworkManager::new(5, NodeType::Leaf, false);
        mgr.enable_auto_route_gen(true);

        let mut header = Header::new(0, 2, 0, 4);
        header.source = 99;
        header.destination = 5;
        header.src_iface = 3;
        header.hops = 7;
        let mut packet = Generic::from_header(header, 1u32);
        packet.header.lladdress = Some("X".to_string());
        let mut bytes = Vec::new();
        packet.write(&mut bytes);
        let sp = SerializedPacket::from_bytes(bytes).unwrap();
        mgr.inject(sp).unwrap();
        mgr.update();

        let route = mgr.routing_table().get_route(99).unwrap();
        assert_eq!(route.iface(), 3);
        assert_eq!(route.metric(), 7);
        assert_eq!(route.address(), &Some("X".to_string()));

        let mut header2 = Header::new(0, 2, 0, 4);
        header2.source = 99;
        header2.destination = 5;
        header2.src_iface = 1;
        let packet2 = Generic::from_header(header2, 1u32);
        let mut bytes2 = Vec::new();
        packet2.write(&mut bytes2);
        let sp2 = SerializedPacket::from_bytes(bytes2).unwrap();
        mgr.inject(sp2).unwrap();
        mgr.update();

        let route_after = mgr.routing_table().get_route(99).unwrap();
        assert_eq!(route_after.iface(), 3, "existing learned route must not be overwritten");
    }
}
