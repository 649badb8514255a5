//! The node context: everything one routing daemon process owns, bundled
//! behind a single handle instead of the module-level globals the original
//! implementation relied on.

use crate::dv::RoutingTable;
use crate::engine::Engine;
use crate::error::ConfigError;
use crate::net::codec::{self, Packet};
use crate::neighbor::NeighborRegistry;
use crate::runlog::RunLog;
use crate::topology::{self, Link};
use std::path::Path;
use tokio::net::UdpSocket;

/// Owns the socket, the protocol state, and the run log for one node.
/// Constructed once at startup and then shared (via `Rc`/`Arc` at the call
/// site, as the concurrency model requires) between the receive loop and
/// the signal-triggered shutdown path.
pub struct Node {
    pub label: char,
    pub port: u16,
    pub socket: UdpSocket,
    pub registry: NeighborRegistry,
    pub table: RoutingTable,
    pub engine: Engine,
    pub log: RunLog,
}

impl Node {
    /// Bootstrap: parse the topology file, bind the UDP socket, open the
    /// run log, and register every outgoing link as a neighbor.
    pub async fn bootstrap(topology_path: &Path, port: u16, log_dir: &Path) -> Result<Self, ConfigError> {
        let (label, links) = topology::load(topology_path, port)?;

        let socket = UdpSocket::bind(("127.0.0.1", port))
            .await
            .map_err(|source| ConfigError::Bind { port, source })?;

        let log = RunLog::open(log_dir, label)?;

        let mut registry = NeighborRegistry::new();
        for Link { neighbor_port, cost } in links {
            registry.register(neighbor_port, cost);
        }

        Ok(Self {
            label,
            port,
            socket,
            registry,
            table: RoutingTable::new(),
            engine: Engine::new(port),
            log,
        })
    }

    /// Send a framed packet to `dest_port` on localhost.
    pub async fn send_to(&self, dest_port: u16, packet: &Packet) -> std::io::Result<()> {
        let wire = codec::encode(packet);
        self.socket.send_to(&wire, ("127.0.0.1", dest_port)).await?;
        Ok(())
    }

    /// Broadcast a packet to every registered neighbor (alive or not; a
    /// dead neighbor simply won't be listening).
    pub async fn broadcast(&self, packet: &Packet) {
        let ports: Vec<u16> = self.registry.ports().collect();
        for port in ports {
            if let Err(err) = self.send_to(port, packet).await {
                tracing::warn!(%err, neighbor = port, "failed to send to neighbor");
            }
        }
    }

    /// Snapshot of this node's own DV, for broadcast packets.
    pub fn own_dv(&self) -> Vec<crate::dv::DvEntry> {
        self.table.iter().copied().collect()
    }
}
