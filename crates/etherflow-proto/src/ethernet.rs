use crate::addr::MacAddr;

pub const ETH_HDR_SIZE: usize = 14;
/// Minimum frame size on the wire, FCS excluded.
pub const ETH_FRAME_SIZE_MIN: usize = 60;
pub const ETH_FRAME_SIZE_MAX: usize = 1514;
pub const ETH_PAYLOAD_SIZE_MAX: usize = ETH_FRAME_SIZE_MAX - ETH_HDR_SIZE;

pub const ETH_P_IP: u16 = 0x0800;
pub const ETH_P_ARP: u16 = 0x0806;
pub const ETH_P_IPV6: u16 = 0x86DD;

#[derive(Debug, Clone, Copy)]
#[repr(C, packed)]
pub struct EthHeader {
    dst: [u8; 6],
    src: [u8; 6],
    eth_type: u16,
}

impl EthHeader {
    pub fn dst(&self) -> MacAddr {
        MacAddr(self.dst)
    }

    pub fn src(&self) -> MacAddr {
        MacAddr(self.src)
    }

    /// Demultiplexing key, host order. Opaque at this layer: the value is
    /// not validated here.
    pub fn eth_type(&self) -> u16 {
        u16::from_be(self.eth_type)
    }
}

pub fn parse_eth(data: &[u8]) -> Option<(&EthHeader, &[u8])> {
    if data.len() < ETH_HDR_SIZE {
        return None;
    }

    let ptr = data.as_ptr() as *const EthHeader;
    let header = unsafe { &*ptr };
    let payload = &data[ETH_HDR_SIZE..];

    Some((header, payload))
}

/// Assemble a frame for transmission, zero-padded up to the minimum frame
/// size. The caller enforces `ETH_PAYLOAD_SIZE_MAX`.
pub fn build_frame(dst: MacAddr, src: MacAddr, eth_type: u16, payload: &[u8]) -> Vec<u8> {
    let len = (ETH_HDR_SIZE + payload.len()).max(ETH_FRAME_SIZE_MIN);
    let mut frame = vec![0u8; len];
    frame[0..6].copy_from_slice(&dst.octets());
    frame[6..12].copy_from_slice(&src.octets());
    frame[12..14].copy_from_slice(&eth_type.to_be_bytes());
    frame[14..14 + payload.len()].copy_from_slice(payload);
    frame
}
