use std::io;

use thiserror::Error;

use etherflow_proto::AddrParseError;

#[derive(Error, Debug)]
pub enum StackError {
    /// OS-level setup failure during device bring-up. Fatal to that
    /// device's open; the handle must not be used afterwards.
    #[error("device setup failed ({context}): {source}")]
    Device {
        context: &'static str,
        source: io::Error,
    },

    #[error("permission denied (requires CAP_NET_RAW)")]
    PermissionDenied,

    /// Transmit or read syscall failure, reported to the caller as-is.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// Operation on a handle outside the open state.
    #[error("device is not open")]
    NotOpen,

    #[error("payload exceeds the maximum Ethernet payload size: {0} bytes")]
    PayloadTooLarge(usize),

    #[error("protocol handler already registered for type 0x{0:04x}")]
    DuplicateProtocol(u16),

    #[error(transparent)]
    InvalidFormat(#[from] AddrParseError),
}

impl StackError {
    /// Wraps an open-time OS error, promoting missing-capability errors to
    /// their own variant.
    pub(crate) fn device(context: &'static str, source: io::Error) -> StackError {
        if source.kind() == io::ErrorKind::PermissionDenied {
            return StackError::PermissionDenied;
        }
        StackError::Device { context, source }
    }
}
