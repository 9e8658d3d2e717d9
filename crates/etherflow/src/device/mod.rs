//! Link-layer device abstraction. A device is an operation table over one
//! capturable endpoint; the Linux packet-socket driver and the in-memory
//! loopback driver both satisfy it, so everything above this seam is
//! platform-independent.

pub mod loopback;
#[cfg(target_os = "linux")]
pub mod pcap;

use etherflow_proto::MacAddr;

use crate::error::StackError;

/// Handle lifecycle. There is no way back out of `Closed`; a handle is
/// opened once, closed once, then discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Initialized,
    Open,
    Closed,
}

/// Operation table of one capture/transmit endpoint.
///
/// `transmit` and `poll` are only valid while the device is open; drivers
/// must reject them with `StackError::NotOpen` in any other state rather
/// than silently proceeding.
pub trait NetDevice {
    fn name(&self) -> &str;

    /// Hardware address; `MacAddr::UNSET` until resolved by `open`.
    fn hwaddr(&self) -> MacAddr;

    fn state(&self) -> DeviceState;

    /// Binds the endpoint and makes it capturable. Valid exactly once, from
    /// the `Initialized` state. On failure no OS resource may be left
    /// behind and the handle must not be used again.
    fn open(&mut self) -> Result<(), StackError>;

    /// Releases the endpoint. Valid exactly once, from the `Open` state.
    fn close(&mut self) -> Result<(), StackError>;

    /// Builds an Ethernet frame around `payload` (source address is the
    /// device's own) and writes it out in a single write. Returns the byte
    /// count the OS accepted; a short write is reported as-is, not retried.
    fn transmit(&mut self, eth_type: u16, payload: &[u8], dst: MacAddr)
        -> Result<usize, StackError>;

    /// Non-blocking capture cycle: zero-timeout readiness check, then one
    /// read. `Ok(None)` means no frame this cycle; read/readiness failures
    /// other than interruption are logged and also yield `Ok(None)` so the
    /// poll loop is never aborted by a bad cycle. `Err` is reserved for
    /// misuse (handle not open).
    fn poll(&mut self) -> Result<Option<Vec<u8>>, StackError>;
}
