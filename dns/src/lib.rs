#![warn(deprecated_in_future)]
#![warn(future_incompatible)]
#![warn(missing_copy_implementations)]
#![warn(missing_docs)]
#![warn(nonstandard_style)]
#![warn(rust_2018_compatibility)]
#![warn(rust_2018_idioms)]
#![warn(trivial_casts, trivial_numeric_casts)]
#![warn(unused)]

#![deny(unsafe_code)]


//! The DNS crate is the wire-format part of whippet. It covers exactly the
//! slice of the protocol the measurement pair needs: building query packets,
//! parsing the header fields used for correlation, synthesizing the
//! reflector's canned answers, and encoding domain names as labels.


mod wire;
pub use self::wire::{Header, WireError, FLAGS_QUERY};

mod message;
pub use self::message::{build_query, synthesize_response, Outcome};
pub use self::message::{ANSWER_RECORD, CLIENT_ID_LENGTH, OPT_TEMPLATE, QCLASS_IN, QTYPE_A};

mod names;
pub use self::names::{decode, encode, DomainSet, NameError, NameErrorKind};
