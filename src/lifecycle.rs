//! Startup and shutdown announcements.
//!
//! The original C daemon sent its KILLED broadcast from inside a SIGINT
//! handler, which is unsound (most of what it called is not
//! async-signal-safe). Here shutdown is driven by a termination flag
//! observed from the main select loop after `tokio::signal::ctrl_c()`
//! resolves, so the broadcast runs on the ordinary async call stack.

use crate::net::codec::Packet;
use crate::node::Node;

/// Announce this node's (likely empty) DV to every neighbor at startup so
/// they can begin relaxing against it immediately.
pub async fn announce_startup(node: &Node) {
    let packet = Packet::InitialDv(node.own_dv());
    node.broadcast(&packet).await;
}

/// Tell every neighbor this node is going away.
pub async fn announce_shutdown(node: &Node) {
    node.broadcast(&Packet::Killed).await;
}
