use crate::addr::Ipv4Address;

pub const IP_VERSION_IPV4: u8 = 4;
/// Fixed header size, no options.
pub const IP_HDR_SIZE_MIN: usize = 20;
pub const IP_HDR_SIZE_MAX: usize = 60;

/// "More fragments" bit of the flags/offset field.
pub const IP_FLAG_MORE_FRAGMENTS: u16 = 0x2000;
/// 13-bit fragment offset subfield.
pub const IP_FRAGMENT_OFFSET_MASK: u16 = 0x1fff;

pub const IP_PROTOCOL_ICMP: u8 = 1;
pub const IP_PROTOCOL_TCP: u8 = 6;
pub const IP_PROTOCOL_UDP: u8 = 17;

/// Read-only view over the fixed 20 bytes of an IPv4 header. Multi-byte
/// fields stay in network order; accessors convert. Options, if any, follow
/// the view in the caller's buffer.
#[derive(Debug, Clone, Copy)]
#[repr(C, packed)]
pub struct Ipv4Header {
    vhl: u8,
    tos: u8,
    total: u16,
    id: u16,
    offset: u16,
    ttl: u8,
    protocol: u8,
    sum: u16,
    src: [u8; 4],
    dst: [u8; 4],
}

impl Ipv4Header {
    /// Casts the start of `data` as a header view. Only the fixed-size
    /// length is checked here; cross-checks of the declared header/total
    /// lengths against the buffer belong to the admission filter.
    pub fn from_bytes(data: &[u8]) -> Option<&Ipv4Header> {
        if data.len() < IP_HDR_SIZE_MIN {
            return None;
        }
        let ptr = data.as_ptr() as *const Ipv4Header;
        Some(unsafe { &*ptr })
    }

    pub fn vhl(&self) -> u8 {
        self.vhl
    }

    pub fn version(&self) -> u8 {
        self.vhl >> 4
    }

    /// Header length in 32-bit words.
    pub fn ihl(&self) -> u8 {
        self.vhl & 0x0f
    }

    /// Declared header length in bytes. Untrusted: compare against the
    /// actual buffer length before indexing past the fixed header.
    pub fn header_len(&self) -> usize {
        (self.ihl() as usize) * 4
    }

    pub fn tos(&self) -> u8 {
        self.tos
    }

    /// Declared datagram length in bytes, header included. Untrusted.
    pub fn total_len(&self) -> u16 {
        u16::from_be(self.total)
    }

    pub fn id(&self) -> u16 {
        u16::from_be(self.id)
    }

    /// Raw flags + fragment-offset field, host order.
    pub fn fragment_field(&self) -> u16 {
        u16::from_be(self.offset)
    }

    /// Upper 3 flag bits of the fragment field.
    pub fn flags(&self) -> u8 {
        ((self.fragment_field() & 0xe000) >> 13) as u8
    }

    pub fn fragment_offset(&self) -> u16 {
        self.fragment_field() & IP_FRAGMENT_OFFSET_MASK
    }

    pub fn ttl(&self) -> u8 {
        self.ttl
    }

    pub fn protocol(&self) -> u8 {
        self.protocol
    }

    pub fn checksum(&self) -> u16 {
        u16::from_be(self.sum)
    }

    pub fn src(&self) -> Ipv4Address {
        Ipv4Address(self.src)
    }

    pub fn dst(&self) -> Ipv4Address {
        Ipv4Address(self.dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> [u8; 24] {
        let mut data = [0u8; 24];
        data[0] = 0x45; // version 4, IHL 5
        data[1] = 0x10; // tos
        data[2..4].copy_from_slice(&24u16.to_be_bytes()); // total length
        data[4..6].copy_from_slice(&0x1234u16.to_be_bytes()); // id
        data[6..8].copy_from_slice(&0x4000u16.to_be_bytes()); // DF set
        data[8] = 64; // ttl
        data[9] = IP_PROTOCOL_UDP;
        data[10..12].copy_from_slice(&0xbeefu16.to_be_bytes()); // checksum
        data[12..16].copy_from_slice(&[192, 0, 2, 1]); // src
        data[16..20].copy_from_slice(&[192, 0, 2, 100]); // dst
        data[20..24].copy_from_slice(&[0x11, 0x22, 0x33, 0x44]); // payload
        data
    }

    #[test]
    fn test_ipv4_field_decoding() {
        let data = sample_header();
        let header = Ipv4Header::from_bytes(&data).expect("Should parse ipv4");
        assert_eq!(header.version(), 4);
        assert_eq!(header.ihl(), 5);
        assert_eq!(header.header_len(), 20);
        assert_eq!(header.tos(), 0x10);
        assert_eq!(header.total_len(), 24);
        assert_eq!(header.id(), 0x1234);
        assert_eq!(header.fragment_field(), 0x4000);
        assert_eq!(header.flags(), 0x2); // DF
        assert_eq!(header.fragment_offset(), 0);
        assert_eq!(header.ttl(), 64);
        assert_eq!(header.protocol(), IP_PROTOCOL_UDP);
        assert_eq!(header.checksum(), 0xbeef);
        assert_eq!(header.src().to_string(), "192.0.2.1");
        assert_eq!(header.dst().to_string(), "192.0.2.100");
    }

    #[test]
    fn test_ipv4_with_options() {
        let mut data = [0u8; 28];
        data[0] = 0x47; // version 4, IHL 7 (28 bytes)
        let header = Ipv4Header::from_bytes(&data).expect("Should parse ipv4");
        assert_eq!(header.header_len(), 28);
    }

    #[test]
    fn test_ipv4_too_short_for_view() {
        let data = [0u8; 19];
        assert!(Ipv4Header::from_bytes(&data).is_none());
    }

    #[test]
    fn test_fragment_subfields() {
        let mut data = sample_header();
        data[6..8].copy_from_slice(&(IP_FLAG_MORE_FRAGMENTS | 0x0abc).to_be_bytes());
        let header = Ipv4Header::from_bytes(&data).expect("Should parse ipv4");
        assert_eq!(header.flags(), 0x1); // MF
        assert_eq!(header.fragment_offset(), 0x0abc);
    }
}
