//! Thin OS layer for the capture path. Everything here is a direct wrapper
//! over a Linux syscall; errors are `io::Error::last_os_error()` passed up
//! untouched for the device layer to classify.

#[cfg(target_os = "linux")]
pub mod sys;
