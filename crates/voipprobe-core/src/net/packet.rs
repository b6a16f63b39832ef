//! Probe datagram wire format
//!
//! Fixed-length UDP payload, all integers big-endian:
//!
//! ```text
//! seq: u32 | send_time_ns: u64 | magic: u32
//! ```
//!
//! The magic constant identifies probe traffic so unrelated datagrams
//! arriving on the socket are ignored as noise. The responder echoes the
//! bytes verbatim, so the received payload is wire-identical to what was
//! sent.

/// Magic sentinel identifying probe datagrams
pub const MAGIC: u32 = 0xABCD_1357;

/// Wire length of a probe packet in bytes
pub const PACKET_LEN: usize = 16;

/// A probe datagram as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbePacket {
    /// Sequence number, wraps at 2^32
    pub seq: u32,
    /// Sender wall-clock timestamp in nanoseconds since the Unix epoch
    pub send_time_ns: u64,
}

impl ProbePacket {
    /// Encode into the 16-byte wire image
    pub fn encode(&self) -> [u8; PACKET_LEN] {
        let mut buf = [0u8; PACKET_LEN];
        buf[0..4].copy_from_slice(&self.seq.to_be_bytes());
        buf[4..12].copy_from_slice(&self.send_time_ns.to_be_bytes());
        buf[12..16].copy_from_slice(&MAGIC.to_be_bytes());
        buf
    }

    /// Decode a received datagram
    ///
    /// Returns `None` for datagrams shorter than [`PACKET_LEN`] or with a
    /// magic mismatch. Both are treated as noise rather than errors:
    /// nothing is counted and nothing is logged above trace level.
    /// Trailing bytes beyond the fixed record are ignored.
    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() < PACKET_LEN {
            return None;
        }
        let seq = u32::from_be_bytes(data[0..4].try_into().ok()?);
        let send_time_ns = u64::from_be_bytes(data[4..12].try_into().ok()?);
        let magic = u32::from_be_bytes(data[12..16].try_into().ok()?);
        if magic != MAGIC {
            return None;
        }
        Some(Self { seq, send_time_ns })
    }
}
