use std::os::unix::io::RawFd;

use log::{debug, error};

use etherflow_core::sys::socket;
use etherflow_proto::ethernet::{build_frame, ETH_FRAME_SIZE_MAX, ETH_PAYLOAD_SIZE_MAX};
use etherflow_proto::MacAddr;

use crate::device::{DeviceState, NetDevice};
use crate::error::StackError;

const CLOSED_FD: RawFd = -1;

/// Promiscuous AF_PACKET capture driver for one named host interface.
pub struct PacketCapture {
    name: String,
    hwaddr: MacAddr,
    fd: RawFd,
    state: DeviceState,
}

impl PacketCapture {
    /// A handle bound to `name`, not yet opened. `hwaddr` overrides the
    /// interface's hardware address; when `None`, the address is resolved
    /// from the interface during `open`.
    pub fn new(name: &str, hwaddr: Option<&str>) -> Result<Self, StackError> {
        let hwaddr = match hwaddr {
            Some(text) => text.parse::<MacAddr>()?,
            None => MacAddr::UNSET,
        };
        Ok(Self {
            name: name.to_string(),
            hwaddr,
            fd: CLOSED_FD,
            state: DeviceState::Initialized,
        })
    }

    fn teardown(&mut self, context: &'static str, source: std::io::Error) -> StackError {
        if self.fd != CLOSED_FD {
            socket::close_socket(self.fd);
            self.fd = CLOSED_FD;
        }
        StackError::device(context, source)
    }
}

impl NetDevice for PacketCapture {
    fn name(&self) -> &str {
        &self.name
    }

    fn hwaddr(&self) -> MacAddr {
        self.hwaddr
    }

    fn state(&self) -> DeviceState {
        self.state
    }

    fn open(&mut self) -> Result<(), StackError> {
        if self.state != DeviceState::Initialized {
            return Err(StackError::NotOpen);
        }

        self.fd = socket::open_packet_socket()
            .map_err(|e| StackError::device("socket", e))?;

        let ifindex = socket::interface_index(self.fd, &self.name)
            .map_err(|e| self.teardown("SIOCGIFINDEX", e))?;
        socket::bind_interface(self.fd, ifindex)
            .map_err(|e| self.teardown("bind", e))?;
        socket::enable_promiscuous(self.fd, &self.name)
            .map_err(|e| self.teardown("IFF_PROMISC", e))?;

        if self.hwaddr.is_unset() {
            let raw = socket::hardware_address(&self.name)
                .map_err(|e| self.teardown("SIOCGIFHWADDR", e))?;
            self.hwaddr = MacAddr(raw);
        }

        self.state = DeviceState::Open;
        debug!("opened capture device, dev={}, addr={}", self.name, self.hwaddr);
        Ok(())
    }

    fn close(&mut self) -> Result<(), StackError> {
        if self.state != DeviceState::Open {
            return Err(StackError::NotOpen);
        }
        socket::close_socket(self.fd);
        self.fd = CLOSED_FD;
        self.state = DeviceState::Closed;
        debug!("closed capture device, dev={}", self.name);
        Ok(())
    }

    fn transmit(
        &mut self,
        eth_type: u16,
        payload: &[u8],
        dst: MacAddr,
    ) -> Result<usize, StackError> {
        if self.state != DeviceState::Open {
            return Err(StackError::NotOpen);
        }
        if payload.len() > ETH_PAYLOAD_SIZE_MAX {
            return Err(StackError::PayloadTooLarge(payload.len()));
        }
        let frame = build_frame(dst, self.hwaddr, eth_type, payload);
        let written = socket::send_frame(self.fd, &frame)?;
        Ok(written)
    }

    fn poll(&mut self) -> Result<Option<Vec<u8>>, StackError> {
        if self.state != DeviceState::Open {
            return Err(StackError::NotOpen);
        }

        match socket::poll_in(self.fd) {
            Ok(true) => {}
            Ok(false) => return Ok(None),
            Err(e) => {
                // EINTR just means "try again next cycle".
                if e.kind() != std::io::ErrorKind::Interrupted {
                    error!("poll: {}, dev={}", e, self.name);
                }
                return Ok(None);
            }
        }

        let mut buf = vec![0u8; ETH_FRAME_SIZE_MAX];
        match socket::recv_frame(self.fd, &mut buf) {
            Ok(0) => Ok(None),
            Ok(n) => {
                buf.truncate(n);
                Ok(Some(buf))
            }
            Err(e) => {
                if e.kind() != std::io::ErrorKind::Interrupted {
                    error!("read: {}, dev={}", e, self.name);
                }
                Ok(None)
            }
        }
    }
}

/// Backstop for handles dropped without an explicit close.
impl Drop for PacketCapture {
    fn drop(&mut self) {
        if self.state == DeviceState::Open && self.fd != CLOSED_FD {
            socket::close_socket(self.fd);
            self.fd = CLOSED_FD;
            self.state = DeviceState::Closed;
        }
    }
}
