//! IPv4 admission filter: the first thing that touches a network-layer
//! payload after link-layer demux. Everything here is local-recovery; a
//! malformed datagram produces a log line and is discarded, it never aborts
//! the capture loop.

use std::io::Write;

use log::{debug, warn};
use thiserror::Error;

use etherflow_proto::ethernet::ETH_P_IP;
use etherflow_proto::ipv4::{
    Ipv4Header, IP_FLAG_MORE_FRAGMENTS, IP_FRAGMENT_OFFSET_MASK, IP_HDR_SIZE_MIN, IP_VERSION_IPV4,
};

use crate::error::StackError;
use crate::registry::NetStack;

/// Why a datagram was refused admission. Diagnostic only: none of these
/// propagate as hard errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    #[error("too short: have {have} bytes, need {need}")]
    TooShort { have: usize, need: usize },

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("fragments not supported: offset field 0x{0:04x}")]
    FragmentationUnsupported(u16),
}

/// Structural admission check over a captured buffer. Every declared length
/// is cross-checked against the actual buffer length before it is believed;
/// no input can cause an out-of-bounds access.
pub fn screen(data: &[u8]) -> Result<&Ipv4Header, DropReason> {
    if data.len() < IP_HDR_SIZE_MIN {
        return Err(DropReason::TooShort {
            have: data.len(),
            need: IP_HDR_SIZE_MIN,
        });
    }

    // Length just checked; the view cast cannot fail.
    let hdr = match Ipv4Header::from_bytes(data) {
        Some(hdr) => hdr,
        None => {
            return Err(DropReason::TooShort {
                have: data.len(),
                need: IP_HDR_SIZE_MIN,
            })
        }
    };

    if hdr.version() != IP_VERSION_IPV4 {
        return Err(DropReason::UnsupportedVersion(hdr.version()));
    }

    let hlen = hdr.header_len();
    if data.len() < hlen {
        return Err(DropReason::TooShort {
            have: data.len(),
            need: hlen,
        });
    }

    let total = hdr.total_len() as usize;
    if data.len() < total {
        return Err(DropReason::TooShort {
            have: data.len(),
            need: total,
        });
    }
    // A datagram shorter than its own header is equally malformed.
    if total < hlen {
        return Err(DropReason::TooShort {
            have: total,
            need: hlen,
        });
    }

    // Rejects any fragment, a first fragment (offset 0, MF set) included.
    let offset = hdr.fragment_field();
    if offset & (IP_FLAG_MORE_FRAGMENTS | IP_FRAGMENT_OFFSET_MASK) != 0 {
        return Err(DropReason::FragmentationUnsupported(offset));
    }

    Ok(hdr)
}

/// Protocol-handler entry point registered for `ETH_P_IP`. Drops are logged
/// and swallowed; an accepted datagram is dumped and (routing being out of
/// scope here) goes no further.
pub fn ip_input(data: &[u8], dev: &str) {
    let hdr = match screen(data) {
        Ok(hdr) => hdr,
        Err(reason) => {
            warn!("datagram dropped, dev={}: {}", dev, reason);
            return;
        }
    };

    debug!(
        "dev={}, protocol={}, total={}",
        dev,
        hdr.protocol(),
        hdr.total_len()
    );
    dump(hdr);
}

/// Header field dump, one field per line, written under a single stderr
/// lock so dumps from different devices never interleave.
fn dump(hdr: &Ipv4Header) {
    let stderr = std::io::stderr();
    let mut out = stderr.lock();
    let hlen = hdr.header_len();
    let total = hdr.total_len();
    let _ = writeln!(
        out,
        "vhl: 0x{:02x} [v: {}, hl: {} ({})]",
        hdr.vhl(),
        hdr.version(),
        hdr.ihl(),
        hlen
    );
    let _ = writeln!(out, "tos: 0x{:02x}", hdr.tos());
    let _ = writeln!(out, "total: {} (payload: {})", total, total as usize - hlen);
    let _ = writeln!(out, "id: {}", hdr.id());
    let _ = writeln!(
        out,
        "offset: 0x{:04x} [flags={:x}, offset={}]",
        hdr.fragment_field(),
        hdr.flags(),
        hdr.fragment_offset()
    );
    let _ = writeln!(out, "ttl: {}", hdr.ttl());
    let _ = writeln!(out, "protocol: {}", hdr.protocol());
    let _ = writeln!(out, "sum: 0x{:04x}", hdr.checksum());
    let _ = writeln!(out, "src: {}", hdr.src());
    let _ = writeln!(out, "dst: {}", hdr.dst());
}

/// Hooks the validator into the dispatch registry. Called once at stack
/// bring-up; failure is fatal to initialization.
pub fn ip_init(stack: &mut NetStack) -> Result<(), StackError> {
    stack.register_protocol(ETH_P_IP, Box::new(|payload, dev| ip_input(payload, dev)))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal valid datagram: version 4, IHL 5, total length = buffer
    /// length, no fragmentation.
    fn datagram(len: usize) -> Vec<u8> {
        let mut data = vec![0u8; len];
        data[0] = 0x45;
        data[2..4].copy_from_slice(&(len as u16).to_be_bytes());
        data[8] = 64; // ttl
        data[9] = 1; // icmp
        data[12..16].copy_from_slice(&[192, 0, 2, 1]);
        data[16..20].copy_from_slice(&[192, 0, 2, 2]);
        data
    }

    #[test]
    fn test_accepts_minimal_datagram() {
        let data = datagram(20);
        let hdr = screen(&data).expect("Should pass admission");
        assert_eq!(hdr.version(), 4);
        assert_eq!(hdr.total_len(), 20);
    }

    #[test]
    fn test_short_buffers_always_too_short() {
        for len in 0..IP_HDR_SIZE_MIN {
            let data = vec![0x45u8; len];
            assert!(
                matches!(screen(&data), Err(DropReason::TooShort { .. })),
                "len={}",
                len
            );
        }
    }

    #[test]
    fn test_rejects_non_ipv4_version() {
        let mut data = datagram(20);
        data[0] = 0x65; // version 6
        assert!(matches!(
            screen(&data),
            Err(DropReason::UnsupportedVersion(6))
        ));
    }

    #[test]
    fn test_version_checked_before_lengths() {
        // Bad version with an otherwise absurd header still reports the
        // version, not a length problem.
        let mut data = datagram(20);
        data[0] = 0x9f;
        assert!(matches!(
            screen(&data),
            Err(DropReason::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn test_rejects_declared_header_longer_than_buffer() {
        let mut data = datagram(20);
        data[0] = 0x4f; // IHL 15 -> 60-byte header
        assert!(matches!(
            screen(&data),
            Err(DropReason::TooShort { need: 60, .. })
        ));
    }

    #[test]
    fn test_rejects_declared_total_longer_than_buffer() {
        let mut data = datagram(30);
        data[2..4].copy_from_slice(&40u16.to_be_bytes());
        assert!(matches!(
            screen(&data),
            Err(DropReason::TooShort { have: 30, need: 40 })
        ));
    }

    #[test]
    fn test_rejects_total_shorter_than_header() {
        let mut data = datagram(32);
        data[0] = 0x46; // 24-byte header
        data[2..4].copy_from_slice(&20u16.to_be_bytes()); // total < header
        assert!(matches!(
            screen(&data),
            Err(DropReason::TooShort { have: 20, need: 24 })
        ));
    }

    #[test]
    fn test_rejects_more_fragments_bit() {
        let mut data = datagram(20);
        data[6..8].copy_from_slice(&IP_FLAG_MORE_FRAGMENTS.to_be_bytes());
        assert!(matches!(
            screen(&data),
            Err(DropReason::FragmentationUnsupported(_))
        ));
    }

    #[test]
    fn test_rejects_nonzero_fragment_offset() {
        let mut data = datagram(20);
        data[6..8].copy_from_slice(&0x0008u16.to_be_bytes());
        assert!(matches!(
            screen(&data),
            Err(DropReason::FragmentationUnsupported(0x0008))
        ));
    }

    #[test]
    fn test_dont_fragment_bit_is_allowed() {
        let mut data = datagram(20);
        data[6..8].copy_from_slice(&0x4000u16.to_be_bytes()); // DF only
        assert!(screen(&data).is_ok());
    }

    #[test]
    fn test_accepts_options_and_payload() {
        let mut data = datagram(32);
        data[0] = 0x46; // IHL 6: 24-byte header, 8 bytes payload
        assert!(screen(&data).is_ok());
    }

    #[test]
    fn test_trailing_capture_slack_is_allowed() {
        // Captured buffer longer than the declared total (link padding).
        let mut data = datagram(60);
        data[2..4].copy_from_slice(&20u16.to_be_bytes());
        assert!(screen(&data).is_ok());
    }

    #[test]
    fn test_input_entry_point_never_panics() {
        ip_input(&[], "test0");
        ip_input(&[0x60; 40], "test0");
        ip_input(&datagram(20), "test0");
    }
}
