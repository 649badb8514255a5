//! DATA packet handling: deliver locally or forward unmodified toward the
//! next hop named by this node's own DV.

use crate::net::codec::Packet;
use crate::node::Node;

/// `prev_port` is the port the datagram arrived from (the previous hop);
/// the run log's `arrivalPort` field is always this node's own port.
pub async fn handle_data(
    node: &mut Node,
    prev_port: u16,
    src_label: char,
    dst_label: char,
    dst_port: u16,
    payload: &[u8],
) {
    if dst_port == node.port {
        if let Err(err) = node.log.record(src_label, dst_label, node.port, prev_port) {
            tracing::error!(%err, "failed to write run log entry");
        }
        tracing::info!(src = %src_label, dst = %dst_label, "delivered locally");
        return;
    }

    let next_hop = node.table.find(dst_port).map(|e| e.first_hop_port);
    match next_hop {
        Some(hop) => {
            if let Err(err) = node.log.record(src_label, dst_label, node.port, prev_port) {
                tracing::error!(%err, "failed to write run log entry");
            }
            let packet = Packet::Data {
                src_label,
                dst_label,
                dst_port,
                payload: payload.to_vec(),
            };
            if let Err(err) = node.send_to(hop, &packet).await {
                tracing::warn!(%err, next_hop = hop, "failed to forward DATA packet");
            }
        }
        None => {
            tracing::warn!(dst_port, "no route to destination; dropping DATA packet");
        }
    }
}
