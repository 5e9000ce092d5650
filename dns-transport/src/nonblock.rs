//! Nonblocking file-descriptor plumbing shared by the engines.

use std::io;
use std::os::unix::io::RawFd;


/// The descriptor the reflector watches for its stop character.
pub const STDIN: RawFd = libc::STDIN_FILENO;


/// Switches a descriptor into nonblocking mode, leaving its other flags
/// alone.
pub fn set_nonblocking(fd: RawFd) -> io::Result<()> {
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags == -1 {
        return Err(io::Error::last_os_error());
    }

    let r = unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) };
    if r == -1 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

/// Reads from a raw descriptor, mapping "would block" to `None`.
/// A `Some(0)` is end-of-file.
pub fn read(fd: RawFd, buf: &mut [u8]) -> io::Result<Option<usize>> {
    let r = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };

    // a negative count is the error return
    match usize::try_from(r) {
        Ok(count) => {
            Ok(Some(count))
        }
        Err(_) => {
            let inner = io::Error::last_os_error();
            if inner.kind() == io::ErrorKind::WouldBlock {
                return Ok(None);
            }

            Err(inner)
        }
    }
}

/// Maps the result of a nonblocking socket call: would-block becomes a
/// quiet `None`, success and real errors pass through.
pub fn ready<T>(result: io::Result<T>) -> io::Result<Option<T>> {
    match result {
        Ok(value) => {
            Ok(Some(value))
        }
        Err(inner) if inner.kind() == io::ErrorKind::WouldBlock => {
            Ok(None)
        }
        Err(inner) => {
            Err(inner)
        }
    }
}
