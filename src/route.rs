//! Dense routing table, grounded on
//! `original_source/src/librnp/rnp_routingtable.h`.

use getset::{CopyGetters, Getters};

/// A single routing table entry (§3).
#[derive(Debug, Clone, Default, PartialEq, Eq, CopyGetters, Getters)]
pub struct Route {
    /// Egress interface ID.
    #[getset(get_copy = "pub")]
    iface: u8,
    /// Route cost, lower is preferred (unused by any tie-breaking logic
    /// today; carried for forward compatibility with the original).
    #[getset(get_copy = "pub")]
    metric: u8,
    /// Link-layer address handed to the egress interface, if any.
    #[getset(get = "pub")]
    address: Option<String>,
}

impl Route {
    /// Build a new route.
    pub fn new(iface: u8, metric: u8, address: Option<String>) -> Route {
        Route {
            iface,
            metric,
            address,
        }
    }
}

/// Dense, address-indexed routing table (§4.4).
///
/// Slot `i` holds the route for destination address `i`. Setting a route
/// past the current length grows the table with empty slots filling the
/// gap; deleting the last slot shrinks the table, deleting an interior
/// slot only empties it — `_table.erase`/`resize` in the original.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    slots: Vec<Option<Route>>,
}

impl RoutingTable {
    /// An empty table.
    pub fn new() -> RoutingTable {
        RoutingTable { slots: Vec::new() }
    }

    /// Number of slots currently allocated (not the number of routes set).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the table holds no slots at all.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Set (or overwrite) the route for `destination`, growing the table
    /// if necessary.
    pub fn set_route(&mut self, destination: u8, route: Route) {
        let idx = destination as usize;
        if idx >= self.slots.len() {
            self.slots.resize(idx + 1, None);
        }
        self.slots[idx] = Some(route);
    }

    /// Look up the route for `destination`, if any.
    pub fn get_route(&self, destination: u8) -> Option<Route> {
        self.slots.get(destination as usize).cloned().flatten()
    }

    /// Remove the route for `destination`. Shrinks the table if it was
    /// the last slot, otherwise just empties it.
    pub fn delete_route(&mut self, destination: u8) {
        let idx = destination as usize;
        if idx >= self.slots.len() {
            return;
        }
        if idx == self.slots.len() - 1 {
            self.slots.pop();
        } else {
            self.slots[idx] = None;
        }
    }

    /// Remove every route and shrink the table to empty.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Tabular rendering used by diagnostics, matching `printTable()`'s
    /// column layout.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for RoutingTable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, ">>>ROUTING TABLE<<<")?;
        writeln!(f, "|destination|iface|metric|link layer address|")?;
        for (i, slot) in self.slots.iter().enumerate() {
            match slot {
                None => writeln!(f, "| {i} | - NO ROUTE - ")?,
                Some(r) => {
                    write!(f, "| {i} | {} | {} | ", r.iface, r.metric)?;
                    match &r.address {
                        None => writeln!(f, " - NO ADDRESS - |")?,
                        Some(a) => writeln!(f, "{a} |")?,
                    }
                }
            }
        }
        Ok(())
    }
}
