//! Capture-driver tests that talk to the real OS. They are written to pass
//! with or without CAP_NET_RAW: a failed open must behave identically
//! (error out, leak nothing) whether the socket call or the interface
//! lookup is what fails.

#![cfg(target_os = "linux")]

use std::fs;

use etherflow::device::pcap::PacketCapture;
use etherflow::device::{DeviceState, NetDevice};
use etherflow::error::StackError;
use etherflow_proto::ethernet::ETH_P_IP;
use etherflow_proto::MacAddr;

fn open_fd_count() -> usize {
    fs::read_dir("/proc/self/fd").expect("procfs").count()
}

#[test]
fn test_open_nonexistent_interface_fails_without_fd_leak() {
    let before = open_fd_count();

    let mut dev = PacketCapture::new("efnoiface0", None).expect("construct handle");
    let err = dev.open().expect_err("open must fail");
    assert!(matches!(
        err,
        StackError::Device { .. } | StackError::PermissionDenied
    ));

    // The handle that failed to open is unusable.
    assert!(matches!(dev.poll(), Err(StackError::NotOpen)));

    // Whatever step failed, no descriptor may survive a failed open: after
    // many more failed opens the fd table is back where it started.
    for _ in 0..64 {
        let mut dev = PacketCapture::new("efnoiface0", None).expect("construct handle");
        assert!(dev.open().is_err());
    }
    assert_eq!(open_fd_count(), before, "descriptor leaked by failed open");
}

#[test]
fn test_operations_rejected_before_open() {
    let mut dev = PacketCapture::new("lo", None).expect("construct handle");
    assert_eq!(dev.state(), DeviceState::Initialized);
    assert!(matches!(dev.poll(), Err(StackError::NotOpen)));
    assert!(matches!(
        dev.transmit(ETH_P_IP, &[0u8; 20], MacAddr::BROADCAST),
        Err(StackError::NotOpen)
    ));
    assert!(matches!(dev.close(), Err(StackError::NotOpen)));
}

#[test]
fn test_hwaddr_override_parsed_at_construction() {
    let dev = PacketCapture::new("lo", Some("02:00:00:00:00:01")).expect("construct handle");
    assert_eq!(
        dev.hwaddr(),
        MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, 0x01])
    );

    assert!(matches!(
        PacketCapture::new("lo", Some("not-a-mac")),
        Err(StackError::InvalidFormat(_))
    ));
}

#[test]
fn test_interface_name_length_enforced_on_open() {
    let mut dev =
        PacketCapture::new("far-too-long-interface-name", None).expect("construct handle");
    assert!(dev.open().is_err());
}
