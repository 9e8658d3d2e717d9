use std::io;
use std::mem;
use std::os::unix::io::RawFd;

use libc::{c_void, sockaddr, sockaddr_ll, socklen_t};

use crate::sys::utils::ifreq_for;

fn htons(v: u16) -> u16 {
    v.to_be()
}

/// Raw packet socket bound to "all protocols": every frame the interface
/// sees is delivered whole, link-layer header included.
pub fn open_packet_socket() -> io::Result<RawFd> {
    let proto = htons(libc::ETH_P_ALL as u16) as libc::c_int;
    let fd = unsafe { libc::socket(libc::AF_PACKET, libc::SOCK_RAW, proto) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(fd)
}

/// OS index of the named interface, via SIOCGIFINDEX on the packet socket.
pub fn interface_index(fd: RawFd, name: &str) -> io::Result<libc::c_int> {
    let mut ifr = ifreq_for(name)?;
    let ret = unsafe { libc::ioctl(fd, libc::SIOCGIFINDEX, &mut ifr) };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(unsafe { ifr.ifr_ifru.ifru_ifindex })
}

/// Binds the packet socket to one interface so it only captures there.
pub fn bind_interface(fd: RawFd, ifindex: libc::c_int) -> io::Result<()> {
    let mut sll: sockaddr_ll = unsafe { mem::zeroed() };
    sll.sll_family = libc::AF_PACKET as libc::c_ushort;
    sll.sll_protocol = htons(libc::ETH_P_ALL as u16);
    sll.sll_ifindex = ifindex;

    let ret = unsafe {
        libc::bind(
            fd,
            &sll as *const sockaddr_ll as *const sockaddr,
            mem::size_of::<sockaddr_ll>() as socklen_t,
        )
    };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Read-modify-write of the interface flags to set IFF_PROMISC, so frames
/// not addressed to the local hardware address are delivered too.
pub fn enable_promiscuous(fd: RawFd, name: &str) -> io::Result<()> {
    let mut ifr = ifreq_for(name)?;
    let ret = unsafe { libc::ioctl(fd, libc::SIOCGIFFLAGS, &mut ifr) };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    unsafe {
        ifr.ifr_ifru.ifru_flags |= libc::IFF_PROMISC as libc::c_short;
    }
    let ret = unsafe { libc::ioctl(fd, libc::SIOCSIFFLAGS, &mut ifr) };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Queries the interface's hardware address over a short-lived AF_INET
/// control socket, separate from the capture endpoint. The control socket
/// is closed on every path.
pub fn hardware_address(name: &str) -> io::Result<[u8; 6]> {
    let mut ifr = ifreq_for(name)?;

    let soc = unsafe { libc::socket(libc::AF_INET, libc::SOCK_DGRAM, 0) };
    if soc < 0 {
        return Err(io::Error::last_os_error());
    }
    unsafe {
        ifr.ifr_ifru.ifru_addr.sa_family = libc::AF_INET as libc::sa_family_t;
    }
    let ret = unsafe { libc::ioctl(soc, libc::SIOCGIFHWADDR, &mut ifr) };
    if ret < 0 {
        let err = io::Error::last_os_error();
        unsafe { libc::close(soc) };
        return Err(err);
    }
    let mut addr = [0u8; 6];
    let sa_data = unsafe { ifr.ifr_ifru.ifru_hwaddr.sa_data };
    for (dst, src) in addr.iter_mut().zip(sa_data.iter()) {
        *dst = *src as u8;
    }
    unsafe { libc::close(soc) };
    Ok(addr)
}

/// Zero-timeout POLLIN readiness check. `Ok(true)` means a subsequent read
/// will not block.
pub fn poll_in(fd: RawFd) -> io::Result<bool> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let ret = unsafe { libc::poll(&mut pfd, 1, 0) };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(ret > 0 && (pfd.revents & libc::POLLIN) != 0)
}

pub fn recv_frame(fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
    let n = unsafe { libc::read(fd, buf.as_mut_ptr() as *mut c_void, buf.len()) };
    if n < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(n as usize)
}

/// Single atomic write of a whole frame. May report a short count; the
/// caller decides what that means.
pub fn send_frame(fd: RawFd, frame: &[u8]) -> io::Result<usize> {
    let n = unsafe { libc::write(fd, frame.as_ptr() as *const c_void, frame.len()) };
    if n < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(n as usize)
}

pub fn close_socket(fd: RawFd) {
    unsafe { libc::close(fd) };
}
