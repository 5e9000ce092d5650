//! The monotonic clock every timestamp comes from.
//!
//! Timestamps are nanosecond counts from the raw monotonic clock where the
//! platform has one, so they survive NTP slews; wall time is never used.
//! They only ever meet other timestamps from the same run, so the epoch is
//! whatever the kernel says it is.

use std::io;

use crate::Error;


cfg_if::cfg_if! {
    if #[cfg(any(target_os = "linux", target_os = "android", target_os = "macos"))] {
        const CLOCK_SOURCE: libc::clockid_t = libc::CLOCK_MONOTONIC_RAW;
    }
    else {
        const CLOCK_SOURCE: libc::clockid_t = libc::CLOCK_MONOTONIC;
    }
}

/// Nanoseconds in a second.
pub const NANOSECONDS: u64 = 1_000_000_000;


/// Reads the clock, folding seconds and nanoseconds into one number.
#[allow(clippy::cast_sign_loss)]  // a monotonic reading is never negative
pub fn monotonic() -> Result<u64, Error> {
    let mut now = libc::timespec { tv_sec: 0, tv_nsec: 0 };

    let r = unsafe { libc::clock_gettime(CLOCK_SOURCE, &mut now) };
    if r == -1 {
        return Err(Error::Clock(io::Error::last_os_error()));
    }

    // tv_sec and tv_nsec widths vary by platform, hence the casts
    Ok((now.tv_sec as u64) * NANOSECONDS + (now.tv_nsec as u64))
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn never_runs_backwards() {
        let first = monotonic().unwrap();
        let second = monotonic().unwrap();

        assert!(second >= first);
    }

    #[test]
    fn is_not_at_the_epoch() {
        // a freshly booted machine still has a nonzero monotonic clock
        assert!(monotonic().unwrap() > 0);
    }
}
