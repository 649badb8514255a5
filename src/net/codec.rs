//! Packet framing and byte-order discipline.
//!
//! Four packet types, discriminated by the first byte on the wire. The
//! codec only frames and converts byte order; it never interprets
//! protocol semantics.
//!
//! ```text
//! DATA        src_label(1) | dst_label(1) | dst_port(2, be) | payload(<=80)
//! DV          7 bytes pad | entries(8 bytes each)
//! KILLED      (no body)
//! INITIAL_DV  same body layout as DV
//! ```
//!
//! DV framing: the datagram length must be a multiple of 8 (the entry
//! size); the first 8-byte slot is the header and its padding, so
//! `entry_count = (length / 8) - 1`.

use crate::dv::{DvEntry, DV_CAPACITY};
use crate::error::CodecError;

pub const MAX_PAYLOAD: usize = 80;
pub const DV_ENTRY_SIZE: usize = 8;

const TYPE_DATA: u8 = 1;
const TYPE_DV: u8 = 2;
const TYPE_KILLED: u8 = 3;
const TYPE_INITIAL_DV: u8 = 4;

/// A framed packet with owned, host-order fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Data {
        src_label: char,
        dst_label: char,
        dst_port: u16,
        payload: Vec<u8>,
    },
    Dv(Vec<DvEntry>),
    Killed,
    InitialDv(Vec<DvEntry>),
}

impl Packet {
    pub fn command(&self) -> &'static str {
        match self {
            Packet::Data { .. } => "data",
            Packet::Dv(_) => "dv",
            Packet::Killed => "killed",
            Packet::InitialDv(_) => "initial_dv",
        }
    }
}

/// Encode a packet to its wire representation.
pub fn encode(packet: &Packet) -> Vec<u8> {
    match packet {
        Packet::Data { src_label, dst_label, dst_port, payload } => {
            let mut buf = Vec::with_capacity(4 + payload.len());
            buf.push(TYPE_DATA);
            buf.push(*src_label as u8);
            buf.push(*dst_label as u8);
            buf.extend_from_slice(&dst_port.to_be_bytes());
            buf.extend_from_slice(payload);
            buf
        }
        Packet::Dv(entries) => encode_dv(TYPE_DV, entries),
        Packet::Killed => vec![TYPE_KILLED],
        Packet::InitialDv(entries) => encode_dv(TYPE_INITIAL_DV, entries),
    }
}

fn encode_dv(type_byte: u8, entries: &[DvEntry]) -> Vec<u8> {
    let mut buf = vec![0u8; DV_ENTRY_SIZE * (entries.len() + 1)];
    buf[0] = type_byte;
    for (i, entry) in entries.iter().enumerate() {
        let off = DV_ENTRY_SIZE * (i + 1);
        buf[off..off + 2].copy_from_slice(&entry.dest_port.to_be_bytes());
        buf[off + 2..off + 4].copy_from_slice(&entry.first_hop_port.to_be_bytes());
        buf[off + 4..off + 8].copy_from_slice(&entry.cost.to_be_bytes());
    }
    buf
}

/// Decode a datagram. Rejects zero-length datagrams, unknown type bytes,
/// DATA packets shorter than the fixed header, and DV/INITIAL_DV
/// datagrams whose length is not a multiple of the entry size or whose
/// entry count exceeds `DV_CAPACITY`.
pub fn decode(buf: &[u8]) -> Result<Packet, CodecError> {
    if buf.is_empty() {
        return Err(CodecError::Empty);
    }
    match buf[0] {
        TYPE_DATA => decode_data(buf),
        TYPE_DV => Ok(Packet::Dv(decode_dv_entries(buf)?)),
        TYPE_KILLED => Ok(Packet::Killed),
        TYPE_INITIAL_DV => Ok(Packet::InitialDv(decode_dv_entries(buf)?)),
        other => Err(CodecError::UnknownType(other)),
    }
}

fn decode_data(buf: &[u8]) -> Result<Packet, CodecError> {
    const HEADER_LEN: usize = 5;
    if buf.len() < HEADER_LEN {
        return Err(CodecError::DataTooShort(buf.len()));
    }
    let payload = &buf[HEADER_LEN..];
    if payload.len() > MAX_PAYLOAD {
        return Err(CodecError::PayloadTooLarge { max: MAX_PAYLOAD, actual: payload.len() });
    }
    Ok(Packet::Data {
        src_label: buf[1] as char,
        dst_label: buf[2] as char,
        dst_port: u16::from_be_bytes([buf[3], buf[4]]),
        payload: payload.to_vec(),
    })
}

fn decode_dv_entries(buf: &[u8]) -> Result<Vec<DvEntry>, CodecError> {
    if buf.len() % DV_ENTRY_SIZE != 0 {
        return Err(CodecError::Unaligned(buf.len()));
    }
    let entry_count = buf.len() / DV_ENTRY_SIZE - 1;
    if entry_count > DV_CAPACITY {
        return Err(CodecError::TooManyEntries { count: entry_count, capacity: DV_CAPACITY });
    }
    let mut entries = Vec::with_capacity(entry_count);
    for i in 0..entry_count {
        let off = DV_ENTRY_SIZE * (i + 1);
        let dest_port = u16::from_be_bytes([buf[off], buf[off + 1]]);
        let first_hop_port = u16::from_be_bytes([buf[off + 2], buf[off + 3]]);
        let cost = u32::from_be_bytes([buf[off + 4], buf[off + 5], buf[off + 6], buf[off + 7]]);
        entries.push(DvEntry { dest_port, first_hop_port, cost });
    }
    Ok(entries)
}
