//! Wire formats for the capture path: address codecs and fixed-layout
//! header views over raw frame buffers. No I/O happens in this crate.

pub mod addr;
pub mod ethernet;
pub mod ipv4;

pub use addr::{AddrParseError, Ipv4Address, MacAddr};
pub use ethernet::{build_frame, parse_eth, EthHeader};
pub use ipv4::Ipv4Header;
