use std::collections::HashMap;

use log::{error, trace};

use etherflow_proto::ethernet::parse_eth;

use crate::device::{DeviceState, NetDevice};
use crate::error::StackError;

/// Handler invoked synchronously once per received frame of the registered
/// type, with the frame payload and the source device's name.
pub type ProtocolHandler = Box<dyn FnMut(&[u8], &str)>;

/// Owned device and protocol registries plus the dispatch path between
/// them. Deliberately not global state: tests run against their own stack
/// instance with fake devices.
pub struct NetStack {
    devices: Vec<Box<dyn NetDevice>>,
    handlers: HashMap<u16, ProtocolHandler>,
}

impl NetStack {
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    /// Registers and opens a device. An open failure is fatal to that
    /// device only: the handle is dropped here and the error returned, but
    /// other devices are unaffected.
    pub fn register_device(&mut self, mut dev: Box<dyn NetDevice>) -> Result<usize, StackError> {
        dev.open()?;
        self.devices.push(dev);
        Ok(self.devices.len() - 1)
    }

    /// At most one handler per type code.
    pub fn register_protocol(
        &mut self,
        eth_type: u16,
        handler: ProtocolHandler,
    ) -> Result<(), StackError> {
        if self.handlers.contains_key(&eth_type) {
            return Err(StackError::DuplicateProtocol(eth_type));
        }
        self.handlers.insert(eth_type, handler);
        Ok(())
    }

    pub fn device(&self, index: usize) -> Option<&dyn NetDevice> {
        self.devices.get(index).map(|d| d.as_ref())
    }

    pub fn device_mut(&mut self, index: usize) -> Option<&mut dyn NetDevice> {
        self.devices.get_mut(index).map(|d| &mut **d as &mut dyn NetDevice)
    }

    /// One cooperative capture cycle: polls every device once, in
    /// registration order, and dispatches each received frame by its type
    /// code. Returns the number of frames handed to a handler. Per-device
    /// errors are logged and never stop the cycle.
    pub fn poll_once(&mut self) -> usize {
        let mut dispatched = 0;
        for i in 0..self.devices.len() {
            let frame = match self.devices[i].poll() {
                Ok(Some(frame)) => frame,
                Ok(None) => continue,
                Err(e) => {
                    error!("poll failed, dev={}: {}", self.devices[i].name(), e);
                    continue;
                }
            };

            let Some((header, payload)) = parse_eth(&frame) else {
                trace!("runt frame dropped, dev={}, len={}", self.devices[i].name(), frame.len());
                continue;
            };

            let name = self.devices[i].name();
            match self.handlers.get_mut(&header.eth_type()) {
                Some(handler) => {
                    handler(payload, name);
                    dispatched += 1;
                }
                None => {
                    trace!(
                        "no handler for type 0x{:04x}, dev={}",
                        header.eth_type(),
                        name
                    );
                }
            }
        }
        dispatched
    }

    /// Closes every still-open device.
    pub fn shutdown(&mut self) {
        for dev in self.devices.iter_mut() {
            if dev.state() == DeviceState::Open {
                if let Err(e) = dev.close() {
                    error!("close failed, dev={}: {}", dev.name(), e);
                }
            }
        }
    }
}

impl Default for NetStack {
    fn default() -> Self {
        Self::new()
    }
}
