//! One-shot traffic injector: not a routing node, just a client that
//! submits a single DATA packet into the network and exits.

use crate::error::ConfigError;
use crate::net::codec::{self, Packet};
use std::path::Path;
use tokio::net::UdpSocket;

const RESERVED_RANGE: std::ops::RangeInclusive<u16> = 10000..=10005;

/// Send `payload` as a DATA packet from `src_label` addressed to
/// `dst_label`, entering the network at `src_label`'s router.
///
/// `own_port` is the injector's own ephemeral socket, and must fall
/// outside the range reserved for routing nodes.
pub async fn inject(
    topology_path: &Path,
    own_port: u16,
    src_label: char,
    dst_label: char,
    payload: &[u8],
) -> Result<(), ConfigError> {
    if RESERVED_RANGE.contains(&own_port) {
        return Err(ConfigError::ReservedPort(own_port));
    }
    if payload.len() > crate::net::codec::MAX_PAYLOAD {
        return Err(ConfigError::MalformedLine {
            line: 0,
            text: format!("payload of {} bytes exceeds {} byte limit", payload.len(), crate::net::codec::MAX_PAYLOAD),
        });
    }

    let entry_port = crate::topology::port_for_label(topology_path, src_label)?;
    let dst_port = crate::topology::port_for_label(topology_path, dst_label)?;

    let socket = UdpSocket::bind(("127.0.0.1", own_port))
        .await
        .map_err(|source| ConfigError::Bind { port: own_port, source })?;

    let packet = Packet::Data { src_label, dst_label, dst_port, payload: payload.to_vec() };
    let wire = codec::encode(&packet);
    socket
        .send_to(&wire, ("127.0.0.1", entry_port))
        .await
        .map_err(ConfigError::Io)?;

    tracing::info!(src = %src_label, dst = %dst_label, entry_port, "injected DATA packet");
    Ok(())
}
