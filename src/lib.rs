//! whippet, a DNS latency measurement toolkit.
//!
//! Two programs share this library: `probe`, which injects a controlled
//! stream of timed `A` queries at a name server, and `reflector`, a
//! deliberately stubbed responder that answers every one of them with the
//! same canned record. Both emit a JSON artifact of nanosecond timestamps
//! for offline analysis.

#![warn(deprecated_in_future)]
#![warn(future_incompatible)]
#![warn(missing_docs)]
#![warn(nonstandard_style)]
#![warn(rust_2018_compatibility)]
#![warn(rust_2018_idioms)]
#![warn(trivial_casts, trivial_numeric_casts)]
#![warn(unused)]

#![deny(unsafe_code)]


pub mod domains;
pub mod logger;
pub mod probe;
pub mod reflector;
pub mod report;


/// The exit codes the binaries end with.
pub mod exits {

    /// Exit code for when everything turns out OK.
    pub const SUCCESS: i32 = 0;

    /// Exit code for invalid arguments or any fatal runtime error.
    pub const FAILURE: i32 = 1;
}
