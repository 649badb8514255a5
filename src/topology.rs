//! Topology file parsing (external boundary, component H).
//!
//! Line-oriented ASCII, one directed edge per line:
//! `src_label,dst_label,dst_port,link_cost`. A node's own label is the
//! `dst_label` of the first line whose `dst_port` equals its own bound
//! port; its outgoing links are every line whose `src_label` matches that
//! label.

use crate::error::ConfigError;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub neighbor_port: u16,
    pub cost: u32,
}

struct Edge {
    src_label: char,
    dst_label: char,
    dst_port: u16,
    cost: u32,
}

fn parse_line(line_no: usize, line: &str) -> Result<Edge, ConfigError> {
    let malformed = || ConfigError::MalformedLine { line: line_no, text: line.to_string() };
    let mut fields = line.split(',');
    let src_label = fields.next().ok_or_else(malformed)?.trim().chars().next().ok_or_else(malformed)?;
    let dst_label = fields.next().ok_or_else(malformed)?.trim().chars().next().ok_or_else(malformed)?;
    let dst_port: u16 = fields.next().ok_or_else(malformed)?.trim().parse().map_err(|_| malformed())?;
    let cost: u32 = fields.next().ok_or_else(malformed)?.trim().parse().map_err(|_| malformed())?;
    if fields.next().is_some() {
        return Err(malformed());
    }
    Ok(Edge { src_label, dst_label, dst_port, cost })
}

fn read_edges(path: &Path) -> Result<Vec<Edge>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::TopologyNotFound(path.to_path_buf())
        } else {
            ConfigError::Io(source)
        }
    })?;
    text.lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| parse_line(i + 1, l))
        .collect()
}

/// Find this node's own label: the `dst_label` of the first line whose
/// `dst_port` matches `self_port`.
fn find_label(edges: &[Edge], self_port: u16) -> Result<char, ConfigError> {
    edges
        .iter()
        .find(|e| e.dst_port == self_port)
        .map(|e| e.dst_label)
        .ok_or(ConfigError::LabelNotFound(self_port))
}

/// Load the topology file and resolve this node's label and its outgoing
/// links (the edges whose `src_label` matches that label).
pub fn load<P: AsRef<Path>>(path: P, self_port: u16) -> Result<(char, Vec<Link>), ConfigError> {
    let edges = read_edges(path.as_ref())?;
    let label = find_label(&edges, self_port)?;
    let links = edges
        .iter()
        .filter(|e| e.src_label == label)
        .map(|e| Link { neighbor_port: e.dst_port, cost: e.cost })
        .collect();
    Ok((label, links))
}

/// Resolve the port for `label`, for the traffic-injector CLI mode, which
/// needs to translate the `<src_label> <dst_label>` arguments into ports.
pub fn port_for_label<P: AsRef<Path>>(path: P, label: char) -> Result<u16, ConfigError> {
    let edges = read_edges(path.as_ref())?;
    edges
        .iter()
        .find(|e| e.dst_label == label)
        .map(|e| e.dst_port)
        .ok_or(ConfigError::LabelNotFound(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_topology(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{contents}").unwrap();
        f
    }

    const CHAIN: &str = "\
A,B,10002,1
B,A,10001,1
B,C,10003,1
C,B,10002,1
";

    #[test]
    fn finds_own_label_and_links() {
        let f = write_topology(CHAIN);
        let (label, links) = load(f.path(), 10002).unwrap();
        assert_eq!(label, 'B');
        let mut ports: Vec<u16> = links.iter().map(|l| l.neighbor_port).collect();
        ports.sort();
        assert_eq!(ports, vec![10001, 10003]);
    }

    #[test]
    fn unknown_port_is_an_error() {
        let f = write_topology(CHAIN);
        assert!(matches!(load(f.path(), 19999), Err(ConfigError::LabelNotFound(19999))));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(matches!(
            load("/nonexistent/topology.txt", 10001),
            Err(ConfigError::TopologyNotFound(_))
        ));
    }

    #[test]
    fn resolves_port_for_label() {
        let f = write_topology(CHAIN);
        assert_eq!(port_for_label(f.path(), 'A').unwrap(), 10001);
        assert_eq!(port_for_label(f.path(), 'C').unwrap(), 10003);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let f = write_topology("A,B,10002,1\n\nB,A,10001,1\n");
        let (label, links) = load(f.path(), 10002).unwrap();
        assert_eq!(label, 'B');
        assert_eq!(links.len(), 1);
    }
}
