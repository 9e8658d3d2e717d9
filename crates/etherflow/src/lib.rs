//! Link-layer capture path and IPv4 admission filter of a minimal
//! user-space network stack.
//!
//! A [`device::NetDevice`] turns one host interface into a pollable,
//! promiscuous capture/transmit endpoint; a [`registry::NetStack`] owns the
//! devices and dispatches received frames to protocol handlers by Ethernet
//! type code; [`ip::ip_input`] is the handler for IPv4, rejecting malformed
//! or unsupported datagrams before any higher layer sees them.
//!
//! The capture model is single-threaded cooperative polling: the caller
//! runs a loop over [`registry::NetStack::poll_once`], which never blocks.

pub mod device;
pub mod error;
pub mod ip;
pub mod registry;

pub use error::StackError;
