//! Command-line option parsing for the reflector.

use std::ffi::OsStr;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::PathBuf;

use crate::logger;


/// The command-line options used when running the reflector.
#[derive(PartialEq, Debug)]
pub struct Options {

    /// The IPv4 endpoint to listen on.
    pub address: SocketAddrV4,

    /// Where timestamp dumps go. Recording is off entirely when absent.
    pub output: Option<PathBuf>,
}

impl Options {

    /// Parses and interprets a set of options from the user's command-line
    /// arguments.
    #[allow(unused_results)]
    pub fn getopts<C>(args: C) -> OptionsResult
    where C: IntoIterator,
          C::Item: AsRef<OsStr>,
    {
        let mut opts = getopts::Options::new();

        opts.optopt  ("a", "address", "IPv4 address to listen on", "ADDR");
        opts.optopt  ("p", "port",    "Port", "PORT");
        opts.optopt  ("o", "output",  "Report send and receive timestamps to given file", "FILE");

        opts.optflagmulti ("v", "verbose", "Print more details");
        opts.optflag ("h", "help",    "Print list of command-line options");

        let matches = match opts.parse(args) {
            Ok(m)  => m,
            Err(e) => return OptionsResult::InvalidOptionsFormat(e),
        };

        match matches.opt_count("v") {
            0 => logger::configure(None),
            1 => logger::configure(Some("debug")),
            _ => logger::configure(Some("trace")),
        }

        if matches.opt_present("help") {
            OptionsResult::Help
        }
        else {
            match Self::deduce(&matches) {
                Ok(opts) => OptionsResult::Ok(opts),
                Err(e)   => OptionsResult::InvalidOptions(e),
            }
        }
    }

    fn deduce(matches: &getopts::Matches) -> Result<Self, OptionsError> {
        let address = match matches.opt_str("address") {
            Some(a)  => a.parse::<Ipv4Addr>().map_err(|_| OptionsError::InvalidAddress(a))?,
            None     => return Err(OptionsError::MissingAddress),
        };

        let port = match matches.opt_str("port") {
            Some(p)  => p.parse::<u16>().map_err(|_| OptionsError::InvalidPort(p))?,
            None     => 53,
        };

        let output = matches.opt_str("output").map(PathBuf::from);

        Ok(Self { address: SocketAddrV4::new(address, port), output })
    }
}


/// The result of the `Options::getopts` function.
#[derive(PartialEq, Debug)]
pub enum OptionsResult {

    /// The options were parsed successfully.
    Ok(Options),

    /// There was an error (from `getopts`) parsing the arguments.
    InvalidOptionsFormat(getopts::Fail),

    /// There was an error with the combination of options the user selected.
    InvalidOptions(OptionsError),

    /// One of the arguments was `--help`.
    Help,
}

/// Something wrong with the options the user has picked.
#[derive(PartialEq, Debug)]
pub enum OptionsError {

    /// No listen address was given.
    MissingAddress,

    /// The listen address did not parse as IPv4.
    InvalidAddress(String),

    /// The port did not fit sixteen bits.
    InvalidPort(String),
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAddress     => write!(f, "Missing address"),
            Self::InvalidAddress(a)  => write!(f, "Invalid address {:?}", a),
            Self::InvalidPort(p)     => write!(f, "Invalid port value {:?}", p),
        }
    }
}


/// The usage summary printed for `--help` or after an options error.
pub const USAGE: &str = "\
reflector - dummy DNS performance measurement server
            (only responds to A query with the same A record)

Usage: reflector <options>

Options:
    -a, --address  IPv4 address to listen on (required)
    -p, --port     port (default 53)
    -o, --output   report send and receive timestamps to given file
                   (limited to 10,000,000 items; send the process SIGUSR1
                   or SIGINFO to dump and reset)
    -v, --verbose  print more details
    -h, --help     this message
";


#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    impl OptionsResult {
        fn unwrap(self) -> Options {
            match self {
                Self::Ok(o)  => o,
                _            => panic!("{:?}", self),
            }
        }
    }

    #[test]
    fn help() {
        assert_eq!(Options::getopts([ "--help" ]), OptionsResult::Help);
    }

    #[test]
    fn missing_address() {
        let nothing: [&str; 0] = [];

        assert_eq!(Options::getopts(nothing),
                   OptionsResult::InvalidOptions(OptionsError::MissingAddress));
    }

    #[test]
    fn just_an_address() {
        let options = Options::getopts([ "-a", "0.0.0.0" ]).unwrap();

        assert_eq!(options.address, SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 53));
        assert_eq!(options.output, None);
    }

    #[test]
    fn address_port_and_output() {
        let options = Options::getopts([ "-a", "127.0.0.1", "-p", "5353", "-o", "stamps.json" ]).unwrap();

        assert_eq!(options.address, SocketAddrV4::new(Ipv4Addr::new(127, 0, 0, 1), 5353));
        assert_eq!(options.output, Some(PathBuf::from("stamps.json")));
    }

    #[test]
    fn invalid_address() {
        assert_eq!(Options::getopts([ "-a", "everywhere" ]),
                   OptionsResult::InvalidOptions(OptionsError::InvalidAddress("everywhere".into())));
    }

    #[test]
    fn invalid_port() {
        assert_eq!(Options::getopts([ "-a", "127.0.0.1", "-p", "sixty" ]),
                   OptionsResult::InvalidOptions(OptionsError::InvalidPort("sixty".into())));
    }
}
