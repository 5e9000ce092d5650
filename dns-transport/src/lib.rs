//! The nonblocking I/O core shared by the probe and the reflector: one
//! readiness wait per loop tick, would-block mapped to a quiet `None`, a
//! monotonic clock for timestamps, and the spool queue that buffers
//! outbound responses while the socket is busy.

#![warn(deprecated_in_future)]
#![warn(future_incompatible)]
#![warn(missing_copy_implementations)]
#![warn(missing_docs)]
#![warn(nonstandard_style)]
#![warn(rust_2018_compatibility)]
#![warn(rust_2018_idioms)]
#![warn(single_use_lifetimes)]
#![warn(trivial_casts, trivial_numeric_casts)]
#![warn(unused)]

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::wildcard_imports)]

#![deny(clippy::cast_possible_truncation)]
#![deny(clippy::cast_lossless)]
#![deny(clippy::cast_possible_wrap)]
#![deny(clippy::cast_sign_loss)]

// unlike the sibling crates, this one talks to poll(2), fcntl(2),
// clock_gettime(2), and signal(2) directly, so unsafe stays enabled


pub mod clock;
pub mod nonblock;
pub mod poll;
pub mod queue;
pub mod signal;

mod error;
pub use self::error::Error;
