use std::fmt;
use std::io;


/// Something that can go wrong inside the I/O core. Engine-level failures
/// (a recv error, a full spool queue) carry their own types; these are the
/// conditions the core itself detects.
#[derive(Debug)]
pub enum Error {

    /// The readiness wait failed, or a watched descriptor turned invalid.
    Poll(io::Error),

    /// The monotonic clock could not be read.
    Clock(io::Error),

    /// A datagram went out shorter than it should have. UDP never splits
    /// sends, so this means the payload was quietly truncated.
    ShortSend {

        /// How many bytes should have gone out.
        expected: usize,

        /// How many actually did.
        sent: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Poll(inner) => {
                write!(f, "Error on waiting for readiness: {}", inner)
            }
            Self::Clock(inner) => {
                write!(f, "Error on getting timestamp: {}", inner)
            }
            Self::ShortSend { expected, sent } => {
                write!(f, "Expected to send {} bytes but actually sent {}", expected, sent)
            }
        }
    }
}
