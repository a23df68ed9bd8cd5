//! Node configuration and its optional persistence hook, grounded on
//! `original_source/src/rnp_networkmanager.h`'s `RnpNetworkManagerConfig`
//! and `SaveConfigImpl`.

use derive_builder::Builder;

pub use crate::consts::{NoRouteAction, NodeType};

/// Live network manager configuration (§4.6.1).
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), default)]
pub struct ManagerConfig {
    /// This node's address. `0` means unassigned.
    pub current_address: u8,
    /// Leaf or hub forwarding role.
    pub node_type: NodeType,
    /// What to do when a destination has no route.
    pub no_route_action: NoRouteAction,
    /// Whether to learn routes from unknown ingress sources.
    pub route_gen_enabled: bool,
}

impl Default for ManagerConfig {
    fn default() -> ManagerConfig {
        ManagerConfig {
            current_address: 0,
            node_type: NodeType::Leaf,
            no_route_action: NoRouteAction::Dump,
            route_gen_enabled: false,
        }
    }
}

/// Wire/persistence layout for [`ManagerConfig`] (§6), the opaque blob
/// handed to a [`ConfigStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistedConfig {
    /// This node's address. `0` means unassigned.
    pub current_address: u8,
    /// [`NodeType`] encoded as its wire `u8`.
    pub node_type: u8,
    /// [`NoRouteAction`] encoded as its wire `u8`.
    pub no_route_action: u8,
    /// Boolean flag encoded as `0`/`1`.
    pub route_gen_enabled: u8,
}

impl From<&ManagerConfig> for PersistedConfig {
    fn from(c: &ManagerConfig) -> PersistedConfig {
        PersistedConfig {
            current_address: c.current_address,
            node_type: c.node_type.into(),
            no_route_action: c.no_route_action.into(),
            route_gen_enabled: c.route_gen_enabled as u8,
        }
    }
}

impl From<PersistedConfig> for ManagerConfig {
    fn from(p: PersistedConfig) -> ManagerConfig {
        ManagerConfig {
            current_address: p.current_address,
            node_type: NodeType::from(p.node_type),
            no_route_action: NoRouteAction::from(p.no_route_action),
            route_gen_enabled: p.route_gen_enabled != 0,
        }
    }
}

/// An embedded-side persistent config store (§6, §9).
///
/// Both methods use the convention settled by the source's ESP/host-stub
/// polarity mismatch (§9 Open Question): `true` means the operation
/// failed, `false` means success. Reading a [`PersistedConfig`] whose
/// `current_address == 0` is treated by the caller as "no valid config
/// was ever saved", not as address `0` itself being meaningful.
pub trait ConfigStore {
    /// Persist `config`. Returns `true` on failure.
    fn save(&mut self, config: &PersistedConfig) -> bool;

    /// Load the last persisted config into `out`. Returns `true` on
    /// failure; `out` is left unmodified in that case.
    fn read(&mut self, out: &mut PersistedConfig) -> bool;
}

/// A [`ConfigStore`] that never has anything saved. The manager's default
/// when no backing store is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

impl ConfigStore for NoopStore {
    fn save(&mut self, _config: &PersistedConfig) -> bool {
        true
    }

    fn read(&mut self, _out: &mut PersistedConfig) -> bool {
        true
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// In-memory JSON-backed store for tests, standing in for the flash
    /// or NVS-backed implementations a real embedded host would provide.
    #[derive(Debug, Default)]
    pub struct JsonConfigStore {
        blob: Option<String>,
    }

    #[derive(serde::Serialize, serde::Deserialize)]
    struct Wire {
        current_address: u8,
        node_type: u8,
        no_route_action: u8,
        route_gen_enabled: u8,
    }

    impl ConfigStore for JsonConfigStore {
        fn save(&mut self, config: &PersistedConfig) -> bool {
            let wire = Wire {
                current_address: config.current_address,
                node_type: config.node_type,
                no_route_action: config.no_route_action,
                route_gen_enabled: config.route_gen_enabled,
            };
            match serde_json::to_string(&wire) {
                Ok(json) => {
                    self.blob = Some(json);
                    false
                }
                Err(_) => true,
            }
        }

        fn read(&mut self, out: &mut PersistedConfig) -> bool {
            let Some(blob) = &self.blob else {
                return true;
            };
            match serde_json::from_str::<Wire>(blob) {
                Ok(w) => {
                    *out = PersistedConfig {
                        current_address: w.current_address,
                        node_type: w.node_type,
                        no_route_action: w.no_route_action,
                        route_gen_enabled: w.route_gen_enabled,
                    };
                    false
                }
                Err(_) => true,
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::test_support::JsonConfigStore;
    use super::*;

    #[test]
    fn default_config() {
        let c = ManagerConfig::default();
        assert_eq!(c.current_address, 0);
        assert_eq!(c.node_type, NodeType::Leaf);
        assert_eq!(c.no_route_action, NoRouteAction::Dump);
        assert!(!c.route_gen_enabled);
    }

    #[test]
    fn builder_overrides_defaults() {
        let c = ManagerConfigBuilder::default()
            .current_address(5u8)
            .node_type(NodeType::Hub)
            .build()
            .unwrap();
        assert_eq!(c.current_address, 5);
        assert_eq!(c.node_type, NodeType::Hub);
        assert_eq!(c.no_route_action, NoRouteAction::Dump);
    }

    #[test]
    fn persisted_roundtrip() {
        let c = ManagerConfig {
            current_address: 9,
            node_type: NodeType::Hub,
            no_route_action: NoRouteAction::Broadcast,
            route_gen_enabled: true,
        };
        let p = PersistedConfig::from(&c);
        let back = ManagerConfig::from(p);
        assert_eq!(back.current_address, c.current_address);
        assert_eq!(back.node_type, c.node_type);
        assert_eq!(back.no_route_action, c.no_route_action);
        assert_eq!(back.route_gen_enabled, c.route_gen_enabled);
    }

    #[test]
    fn noop_store_always_errors() {
        let mut store = NoopStore;
        let mut out = PersistedConfig {
            current_address: 0,
            node_type: 0,
            no_route_action: 0,
            route_gen_enabled: 0,
        };
        assert!(store.read(&mut out));
        let cfg = PersistedConfig {
            current_address: 1,
            node_type: 0,
            no_route_action: 0,
            route_gen_enabled: 0,
        };
        assert!(store.save(&cfg));
    }

    #[test]
    fn json_store_roundtrip() {
        let mut store = JsonConfigStore::default();
        let cfg = PersistedConfig {
            current_address: 7,
            node_type: 1,
            no_route_action: 1,
            route_gen_enabled: 1,
        };
        assert!(!store.save(&cfg));
        let mut out = PersistedConfig {
            current_address: 0,
            node_type: 0,
            no_route_action: 0,
            route_gen_enabled: 0,
        };
        assert!(!store.read(&mut out));
        assert_eq!(out, cfg);
    }
}
