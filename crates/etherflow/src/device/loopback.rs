use std::collections::VecDeque;

use log::debug;

use etherflow_proto::ethernet::{build_frame, ETH_PAYLOAD_SIZE_MAX};
use etherflow_proto::MacAddr;

use crate::device::{DeviceState, NetDevice};
use crate::error::StackError;

/// In-memory driver satisfying the same operation table as the packet
/// capture driver: transmitted frames are queued and handed back by the
/// next polls. Lets the dispatch path run without privileges or a real
/// interface.
pub struct Loopback {
    name: String,
    queue: VecDeque<Vec<u8>>,
    state: DeviceState,
}

impl Loopback {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            queue: VecDeque::new(),
            state: DeviceState::Initialized,
        }
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

impl NetDevice for Loopback {
    fn name(&self) -> &str {
        &self.name
    }

    fn hwaddr(&self) -> MacAddr {
        MacAddr::UNSET
    }

    fn state(&self) -> DeviceState {
        self.state
    }

    fn open(&mut self) -> Result<(), StackError> {
        if self.state != DeviceState::Initialized {
            return Err(StackError::NotOpen);
        }
        self.state = DeviceState::Open;
        debug!("opened loopback device, dev={}", self.name);
        Ok(())
    }

    fn close(&mut self) -> Result<(), StackError> {
        if self.state != DeviceState::Open {
            return Err(StackError::NotOpen);
        }
        self.queue.clear();
        self.state = DeviceState::Closed;
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
        let frame = build_frame(dst, self.hwaddr(), eth_type, payload);
        let len = frame.len();
        self.queue.push_back(frame);
        Ok(len)
    }

    fn poll(&mut self) -> Result<Option<Vec<u8>>, StackError> {
        if self.state != DeviceState::Open {
            return Err(StackError::NotOpen);
        }
        Ok(self.queue.pop_front())
    }
}
