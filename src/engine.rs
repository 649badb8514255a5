//! Bellman–Ford update engine.
//!
//! `process_neighbor_dv` is the single primary operation, invoked both for
//! genuine DV announcements and for the synthetic "empty DV" input used
//! when a neighbor is declared dead. It never increases a route's cost
//! directly — increases are only ever discovered by the global
//! re-minimization in step 2 — which is the asymmetry that keeps the
//! protocol loop-free without split-horizon or poisoned-reverse.

use crate::dv::{DvEntry, RoutingTable, MAX_COST};
use crate::error::EngineError;
use crate::neighbor::NeighborRegistry;

pub struct Engine {
    self_port: u16,
}

impl Engine {
    pub fn new(self_port: u16) -> Self {
        Self { self_port }
    }

    /// Apply a DV received from `sender` (or a synthetic empty DV for a
    /// death notification). Returns the number of changes applied to the
    /// own DV, or `Err` if `sender` is not a registered neighbor.
    pub fn process_neighbor_dv(
        &self,
        registry: &mut NeighborRegistry,
        table: &mut RoutingTable,
        sender: u16,
        received_entries: Vec<DvEntry>,
    ) -> Result<usize, EngineError> {
        if !registry.is_neighbor(sender) {
            return Err(EngineError::UnknownNeighbor(sender));
        }
        let link_cost = registry.link_cost(sender).expect("checked is_neighbor above");

        // Step 1: overwrite the sender's cached DV.
        registry.update_last_dv(sender, received_entries);

        let mut changes = 0usize;

        // Step 2: reconsider routes currently first-hopped through the
        // sender. A route whose cost via the sender has gone up (or
        // vanished) cannot simply be re-raised — that risks count-to-
        // infinity — so it is recomputed from scratch across every alive
        // neighbor's cached DV.
        for dest in table.dests_via(sender) {
            if dest == sender {
                continue;
            }
            let current = *table.find(dest).expect("dests_via only returns present entries");
            let cost_via_sender = registry
                .lookup(sender)
                .and_then(|n| n.cost_to(dest))
                .map(|c| link_cost.saturating_add(c));
            let worsened = match cost_via_sender {
                Some(c) => c > current.cost,
                None => true,
            };
            if !worsened {
                continue;
            }
            match self.best_via_any_neighbor(registry, dest) {
                Some((hop, cost)) if cost < MAX_COST => {
                    let _ = table.insert_or_replace(DvEntry {
                        dest_port: dest,
                        first_hop_port: hop,
                        cost,
                    });
                    changes += 1;
                }
                _ => {
                    table.remove(dest);
                    changes += 1;
                }
            }
        }

        // Step 3: relaxation pass over everything the sender announced.
        let sender_dv = registry
            .lookup(sender)
            .map(|n| n.last_seen_dv.clone())
            .unwrap_or_default();
        for entry in sender_dv {
            let cost_via = link_cost.saturating_add(entry.cost);
            if self.relax(table, entry.dest_port, sender, cost_via) {
                changes += 1;
            }
        }

        // Step 4: relax the sender itself, in case it was previously
        // considered dead or simply absent from the own DV.
        if self.relax(table, sender, sender, link_cost) {
            changes += 1;
        }

        Ok(changes)
    }

    /// A KILLED packet from `sender`: mark it dead, drop the direct
    /// entry, and sweep everything that routed through it.
    pub fn handle_death(
        &self,
        registry: &mut NeighborRegistry,
        table: &mut RoutingTable,
        sender: u16,
    ) -> Result<usize, EngineError> {
        if !registry.is_neighbor(sender) {
            return Err(EngineError::UnknownNeighbor(sender));
        }
        registry.mark_dead(sender);

        let mut changes = 0usize;
        if table.remove(sender).is_some() {
            changes += 1;
        }

        changes += self.process_neighbor_dv(registry, table, sender, Vec::new())?;

        if table.remove(sender).is_some() {
            tracing::warn!(port = sender, "neighbor still present in DV after death sweep");
            changes += 1;
        }

        Ok(changes)
    }

    /// `relax(dest, via, c_via)`: the only place a route's cost is ever
    /// lowered. Never increases an existing cost — step 2's global
    /// re-minimization handles increases.
    fn relax(&self, table: &mut RoutingTable, dest: u16, via: u16, c_via: u32) -> bool {
        if dest == self.self_port {
            return false;
        }
        match table.find(dest).copied() {
            None => {
                if c_via >= MAX_COST {
                    return false;
                }
                table
                    .insert_or_replace(DvEntry { dest_port: dest, first_hop_port: via, cost: c_via })
                    .is_ok()
            }
            Some(current) => {
                if c_via >= MAX_COST {
                    table.remove(dest);
                    true
                } else if c_via < current.cost {
                    let _ = table.insert_or_replace(DvEntry {
                        dest_port: dest,
                        first_hop_port: via,
                        cost: c_via,
                    });
                    true
                } else {
                    false
                }
            }
        }
    }

    fn best_via_any_neighbor(&self, registry: &NeighborRegistry, dest: u16) -> Option<(u16, u32)> {
        registry
            .alive_iter()
            .filter_map(|n| n.cost_to(dest).map(|c| (n.port, n.link_cost.saturating_add(c))))
            .min_by_key(|&(_, cost)| cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(dest: u16, hop: u16, cost: u32) -> DvEntry {
        DvEntry { dest_port: dest, first_hop_port: hop, cost }
    }

    struct Fixture {
        registry: NeighborRegistry,
        table: RoutingTable,
        engine: Engine,
    }

    impl Fixture {
        fn new(self_port: u16) -> Self {
            Self { registry: NeighborRegistry::new(), table: RoutingTable::new(), engine: Engine::new(self_port) }
        }
    }

    #[test]
    fn rejects_non_neighbor_sender() {
        let mut f = Fixture::new(10000);
        let err = f.engine.process_neighbor_dv(&mut f.registry, &mut f.table, 10001, vec![]);
        assert_eq!(err, Err(EngineError::UnknownNeighbor(10001)));
    }

    #[test]
    fn direct_neighbor_self_relaxes_on_first_contact() {
        let mut f = Fixture::new(10000);
        f.registry.register(10001, 1);
        let changes = f
            .engine
            .process_neighbor_dv(&mut f.registry, &mut f.table, 10001, vec![])
            .unwrap();
        assert_eq!(changes, 1);
        assert_eq!(f.table.find(10001), Some(&entry(10001, 10001, 1)));
    }

    #[test]
    fn relaxation_adopts_cheaper_indirect_route() {
        let mut f = Fixture::new(10000);
        f.registry.register(10001, 1);
        f.engine.process_neighbor_dv(&mut f.registry, &mut f.table, 10001, vec![]).unwrap();
        let changes = f
            .engine
            .process_neighbor_dv(&mut f.registry, &mut f.table, 10001, vec![entry(10002, 10001, 1)])
            .unwrap();
        assert!(changes >= 1);
        assert_eq!(f.table.find(10002), Some(&entry(10002, 10001, 2)));
    }

    #[test]
    fn idempotent_on_repeated_identical_dv() {
        let mut f = Fixture::new(10000);
        f.registry.register(10001, 1);
        let dv = vec![entry(10002, 10001, 1)];
        f.engine.process_neighbor_dv(&mut f.registry, &mut f.table, 10001, vec![]).unwrap();
        f.engine
            .process_neighbor_dv(&mut f.registry, &mut f.table, 10001, dv.clone())
            .unwrap();
        let changes = f
            .engine
            .process_neighbor_dv(&mut f.registry, &mut f.table, 10001, dv)
            .unwrap();
        assert_eq!(changes, 0);
    }

    #[test]
    fn poisoning_removes_entry_at_threshold() {
        // A--B(1), B--C(62): A learns (C, B, 63). If B's cost to C rises
        // to 64, A must withdraw the route.
        let mut f = Fixture::new(10000); // node A
        f.registry.register(10001, 1); // neighbor B, link cost 1
        f.engine
            .process_neighbor_dv(&mut f.registry, &mut f.table, 10001, vec![entry(10002, 10001, 62)])
            .unwrap();
        assert_eq!(f.table.find(10002).map(|e| e.cost), Some(63));

        let changes = f
            .engine
            .process_neighbor_dv(&mut f.registry, &mut f.table, 10001, vec![entry(10002, 10001, 63)])
            .unwrap();
        assert!(changes >= 1);
        assert_eq!(f.table.find(10002), None);
    }

    #[test]
    fn triangle_shortcut_is_preferred_by_relay_node() {
        // A--B(1), B--C(10), A--C(2). From B's perspective: direct to C
        // costs 10, but via A costs 1 + 2 = 3.
        let mut f = Fixture::new(10002); // node B
        f.registry.register(10001, 1); // A
        f.registry.register(10003, 10); // C direct
        f.engine.process_neighbor_dv(&mut f.registry, &mut f.table, 10001, vec![]).unwrap();
        f.engine.process_neighbor_dv(&mut f.registry, &mut f.table, 10003, vec![]).unwrap();
        f.engine
            .process_neighbor_dv(&mut f.registry, &mut f.table, 10001, vec![entry(10003, 10001, 2)])
            .unwrap();
        assert_eq!(f.table.find(10003), Some(&entry(10003, 10001, 3)));
    }

    #[test]
    fn death_removes_direct_route_and_anything_via_it() {
        let mut f = Fixture::new(10002); // node B
        f.registry.register(10001, 1); // A
        f.registry.register(10003, 10); // C direct
        f.engine.process_neighbor_dv(&mut f.registry, &mut f.table, 10001, vec![]).unwrap();
        f.engine.process_neighbor_dv(&mut f.registry, &mut f.table, 10003, vec![]).unwrap();
        f.engine
            .process_neighbor_dv(&mut f.registry, &mut f.table, 10001, vec![entry(10003, 10001, 2)])
            .unwrap();
        assert_eq!(f.table.find(10003), Some(&entry(10003, 10001, 3)));

        f.engine.handle_death(&mut f.registry, &mut f.table, 10001).unwrap();
        assert_eq!(f.table.find(10001), None);
        // B falls back to its own direct link to C.
        assert_eq!(f.table.find(10003), Some(&entry(10003, 10003, 10)));
    }

    #[test]
    fn death_is_equivalent_to_empty_dv_plus_removal() {
        let mut via_death = Fixture::new(10000);
        via_death.registry.register(10001, 1);
        via_death.registry.register(10002, 5);
        via_death
            .engine
            .process_neighbor_dv(&mut via_death.registry, &mut via_death.table, 10001, vec![])
            .unwrap();
        via_death
            .engine
            .process_neighbor_dv(&mut via_death.registry, &mut via_death.table, 10002, vec![])
            .unwrap();
        via_death
            .engine
            .process_neighbor_dv(&mut via_death.registry, &mut via_death.table, 10001, vec![entry(10003, 10001, 1)])
            .unwrap();
        via_death.engine.handle_death(&mut via_death.registry, &mut via_death.table, 10001).unwrap();

        assert!(via_death.table.iter().all(|e| e.first_hop_port != 10001));
    }

    #[test]
    fn table_full_drops_new_destination_but_keeps_existing() {
        let mut f = Fixture::new(10000);
        f.registry.register(10001, 1);
        f.engine.process_neighbor_dv(&mut f.registry, &mut f.table, 10001, vec![]).unwrap();
        let mut dv = Vec::new();
        for i in 0..crate::dv::DV_CAPACITY as u16 {
            dv.push(entry(20000 + i, 10001, 1));
        }
        f.engine.process_neighbor_dv(&mut f.registry, &mut f.table, 10001, dv).unwrap();
        assert_eq!(f.table.len(), crate::dv::DV_CAPACITY);
        assert!(f.table.find(20000).is_some());
        assert!(f.table.find(20000 + crate::dv::DV_CAPACITY as u16 - 1).is_none());
    }
}
