//! Packet dispatch: classify an inbound datagram and route it to the
//! engine, the forwarder, or the death handler. This is the single place
//! that decides, after a DV/INITIAL_DV/KILLED update, whether the node's
//! own DV changed enough to warrant broadcasting it to every neighbor.

use crate::forwarder;
use crate::net::codec::{self, Packet};
use crate::node::Node;

/// Handle one datagram received from `from_port`. Malformed datagrams and
/// updates from non-neighbors are logged and dropped; they never bring
/// the process down.
pub async fn dispatch(node: &mut Node, from_port: u16, datagram: &[u8]) {
    let packet = match codec::decode(datagram) {
        Ok(p) => p,
        Err(err) => {
            tracing::warn!(%err, from = from_port, "dropping malformed datagram");
            return;
        }
    };

    match packet {
        Packet::Data { src_label, dst_label, dst_port, payload } => {
            forwarder::handle_data(node, from_port, src_label, dst_label, dst_port, &payload).await;
        }
        Packet::Dv(entries) => {
            node.registry.mark_alive(from_port);
            apply_update(node, from_port, entries).await;
        }
        Packet::InitialDv(entries) => {
            node.registry.mark_alive(from_port);
            if !apply_update(node, from_port, entries).await {
                // No change: reply with our own current DV so the new
                // neighbor still gets something to bootstrap from.
                let own = Packet::Dv(node.own_dv());
                if let Err(err) = node.send_to(from_port, &own).await {
                    tracing::warn!(%err, neighbor = from_port, "failed to reply with own DV");
                }
            }
        }
        Packet::Killed => {
            handle_death(node, from_port).await;
        }
    }
}

/// Run a DV through the engine; broadcast the node's own DV if anything
/// changed. Returns whether a broadcast happened.
async fn apply_update(node: &mut Node, from_port: u16, entries: Vec<crate::dv::DvEntry>) -> bool {
    let changes = match node.engine.process_neighbor_dv(&mut node.registry, &mut node.table, from_port, entries) {
        Ok(c) => c,
        Err(err) => {
            tracing::warn!(%err, from = from_port, "rejected DV update");
            return false;
        }
    };
    if changes > 0 {
        let own = Packet::Dv(node.own_dv());
        node.broadcast(&own).await;
        true
    } else {
        false
    }
}

async fn handle_death(node: &mut Node, from_port: u16) {
    match node.engine.handle_death(&mut node.registry, &mut node.table, from_port) {
        Ok(changes) => {
            tracing::info!(neighbor = from_port, changes, "neighbor declared dead");
            // Unconditional, unlike the ordinary DV broadcast-on-change
            // rule: a dying neighbor's own link cost could already be
            // >= MAX_COST, in which case handle_death reports zero changes
            // even though every other neighbor still needs to hear this.
            let own = Packet::Dv(node.own_dv());
            node.broadcast(&own).await;
        }
        Err(err) => {
            tracing::warn!(%err, from = from_port, "KILLED from non-neighbor");
        }
    }
}
