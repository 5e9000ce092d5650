//! The readiness wait at the centre of both engines.
//!
//! Each loop tick makes exactly one `poll(2)` call covering the socket
//! (read side always, write side on request) and an optional extra
//! descriptor — the reflector watches its stdin this way. A timeout or an
//! interrupting signal reports as idle, so the caller re-checks its flags
//! and re-arms without treating either as an error.

use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

use log::*;

use crate::Error;


/// What one wait said about the descriptors it watched.
#[derive(PartialEq, Debug, Copy, Clone, Default)]
pub struct Readiness {

    /// The socket has at least one datagram to read.
    pub readable: bool,

    /// The socket can take another datagram.
    pub writable: bool,

    /// The extra descriptor is readable.
    pub aux_readable: bool,
}

impl Readiness {

    /// Whether the wait ended with nothing ready: a timeout or EINTR.
    pub fn idle(self) -> bool {
        ! (self.readable || self.writable || self.aux_readable)
    }
}


/// Waits up to `timeout` for the socket to become readable (and writable,
/// when asked), and for the optional extra descriptor to become readable.
pub fn wait(socket: RawFd, want_write: bool, aux: Option<RawFd>, timeout: Duration) -> Result<Readiness, Error> {
    let mut events = libc::POLLIN;
    if want_write {
        events |= libc::POLLOUT;
    }

    let mut fds = [
        libc::pollfd { fd: socket,              events,               revents: 0 },
        libc::pollfd { fd: aux.unwrap_or(-1),   events: libc::POLLIN, revents: 0 },
    ];
    let nfds: libc::nfds_t = if aux.is_some() { 2 } else { 1 };

    let millis = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);
    let r = unsafe { libc::poll(fds.as_mut_ptr(), nfds, millis) };

    if r == -1 {
        let inner = io::Error::last_os_error();
        if inner.kind() == io::ErrorKind::Interrupted {
            trace!("poll interrupted by a signal");
            return Ok(Readiness::default());
        }

        return Err(Error::Poll(inner));
    }

    if fds[0].revents & (libc::POLLERR | libc::POLLNVAL) != 0 {
        return Err(Error::Poll(io::Error::new(io::ErrorKind::Other, "socket error while polling")));
    }

    Ok(Readiness {
        readable:      fds[0].revents & libc::POLLIN  != 0,
        writable:      fds[0].revents & libc::POLLOUT != 0,
        aux_readable:  aux.is_some() && fds[1].revents & libc::POLLIN != 0,
    })
}
