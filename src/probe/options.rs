//! Command-line option parsing for the probe.

use std::ffi::OsStr;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::PathBuf;

use dns::{DomainSet, CLIENT_ID_LENGTH};

use crate::domains;
use crate::logger;


/// The command-line options used when running the probe.
#[derive(PartialEq, Debug)]
pub struct Options {

    /// Where the name server answers.
    pub server: SocketAddrV4,

    /// The client identifier carried in each query's OPT record.
    pub client: Option<[u8; CLIENT_ID_LENGTH]>,

    /// How many queries to send. Defaults to one per domain.
    pub queries: Option<usize>,

    /// The upper bound on the send rate in queries per second.
    /// Zero means no limit.
    pub limit: u64,

    /// The encoded domain set to cycle through.
    pub domains: DomainSet,

    /// Where the artifact goes; stdout when absent.
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

        opts.optopt  ("s", "server",  "Name server IPv4 address", "ADDR");
        opts.optopt  ("p", "port",    "Name server port", "PORT");
        opts.optopt  ("c", "client",  "Client id (16 bytes hex string)", "HEX");
        opts.optopt  ("n", "queries", "Number of queries", "COUNT");
        opts.optopt  ("l", "limit",   "Limit query rate to the number", "RATE");
        opts.optopt  ("d", "domains", "File with list of domains to query", "FILE");
        opts.optopt  ("o", "output",  "Write statistics to specified file", "FILE");

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
        let address = match matches.opt_str("server") {
            Some(s)  => s.parse::<Ipv4Addr>().map_err(|_| OptionsError::InvalidServer(s))?,
            None     => return Err(OptionsError::MissingServer),
        };

        let port = match matches.opt_str("port") {
            Some(p)  => p.parse::<u16>().map_err(|_| OptionsError::InvalidPort(p))?,
            None     => 53,
        };

        let client = match matches.opt_str("client") {
            Some(c)  => Some(parse_client_id(&c).ok_or(OptionsError::InvalidClient(c))?),
            None     => None,
        };

        let queries = match matches.opt_str("queries") {
            Some(n)  => Some(n.parse::<usize>().map_err(|_| OptionsError::InvalidQueryCount(n))?),
            None     => None,
        };

        let limit = match matches.opt_str("limit") {
            Some(l)  => l.parse::<u64>().map_err(|_| OptionsError::InvalidQueryLimit(l))?,
            None     => 0,
        };

        let domains = match matches.opt_str("domains") {
            Some(d)  => domains::load(d.as_ref())
                            .map_err(|e| OptionsError::BadDomains { path: d, reason: e.to_string() })?,
            None     => return Err(OptionsError::MissingDomains),
        };

        if domains.is_empty() {
            return Err(OptionsError::MissingDomains);
        }

        let output = matches.opt_str("output").map(PathBuf::from);

        Ok(Self { server: SocketAddrV4::new(address, port), client, queries, limit, domains, output })
    }
}


/// Decodes exactly thirty-two lowercase hex characters into id bytes.
fn parse_client_id(input: &str) -> Option<[u8; CLIENT_ID_LENGTH]> {
    let text = input.as_bytes();
    if text.len() != 2 * CLIENT_ID_LENGTH {
        return None;
    }

    if ! text.iter().all(|b| b.is_ascii_digit() || (b'a' ..= b'f').contains(b)) {
        return None;
    }

    let mut id = [0_u8; CLIENT_ID_LENGTH];
    for (index, pair) in input.as_bytes().chunks(2).enumerate() {
        let pair = std::str::from_utf8(pair).ok()?;
        id[index] = u8::from_str_radix(pair, 16).ok()?;
    }

    Some(id)
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

    /// No name server address was given.
    MissingServer,

    /// No domains file was given, or it held no names.
    MissingDomains,

    /// The server address did not parse as IPv4.
    InvalidServer(String),

    /// The port did not fit sixteen bits.
    InvalidPort(String),

    /// The client id was not thirty-two lowercase hex characters.
    InvalidClient(String),

    /// The query count did not parse.
    InvalidQueryCount(String),

    /// The rate limit did not parse.
    InvalidQueryLimit(String),

    /// The domains file could not be loaded.
    BadDomains {

        /// The path that was tried.
        path: String,

        /// Why it failed, already formatted.
        reason: String,
    },
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingServer            => write!(f, "Missing name server address"),
            Self::MissingDomains           => write!(f, "Missing domains to query"),
            Self::InvalidServer(s)         => write!(f, "Invalid name server address {:?}", s),
            Self::InvalidPort(p)           => write!(f, "Invalid port value {:?}", p),
            Self::InvalidClient(c)         => write!(f, "Invalid client id {:?}", c),
            Self::InvalidQueryCount(n)     => write!(f, "Invalid query number {:?}", n),
            Self::InvalidQueryLimit(l)     => write!(f, "Invalid query limit {:?}", l),
            Self::BadDomains { path, reason } => write!(f, "Failed to read domains from {:?}: {}", path, reason),
        }
    }
}


/// The usage summary printed for `--help` or after an options error.
pub const USAGE: &str = "\
probe - DNS performance measurement tool

Usage: probe <options>

Options:
    -s, --server   name server IPv4 address (required)
    -p, --port     name server port (default 53)
    -c, --client   client id (16 bytes hex string)
    -n, --queries  number of queries (default: length of domain set)
    -l, --limit    limit query rate to the number (default: no limit)
    -d, --domains  file with list of domains to query (ASCII lowercase, one per line)
    -v, --verbose  print more details
    -o, --output   write statistics to specified file (default stdout)
    -h, --help     this message
";


#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::PathBuf;

    fn domains_file(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("whippet-probe-options-{}-{}", std::process::id(), name));
        fs::write(&path, b"example.com\na.test\n").unwrap();
        path
    }

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
    fn fail() {
        assert_eq!(Options::getopts([ "--pear" ]),
                   OptionsResult::InvalidOptionsFormat(getopts::Fail::UnrecognizedOption("pear".into())));
    }

    #[test]
    fn missing_server() {
        assert_eq!(Options::getopts([ "-d", "wherever" ]),
                   OptionsResult::InvalidOptions(OptionsError::MissingServer));
    }

    #[test]
    fn missing_domains() {
        assert_eq!(Options::getopts([ "-s", "127.0.0.1" ]),
                   OptionsResult::InvalidOptions(OptionsError::MissingDomains));
    }

    #[test]
    fn the_whole_lot() {
        let path = domains_file("whole-lot");
        let options = Options::getopts([
            "-s", "127.0.0.1", "-p", "5353",
            "-c", "000102030405060708090a0b0c0d0e0f",
            "-n", "100", "-l", "50",
            "-d", path.to_str().unwrap(),
            "-o", "stats.json",
        ]).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(options.server, SocketAddrV4::new(Ipv4Addr::new(127, 0, 0, 1), 5353));
        assert_eq!(options.client, Some([ 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15 ]));
        assert_eq!(options.queries, Some(100));
        assert_eq!(options.limit, 50);
        assert_eq!(options.domains.len(), 2);
        assert_eq!(options.output, Some(PathBuf::from("stats.json")));
    }

    #[test]
    fn defaults() {
        let path = domains_file("defaults");
        let options = Options::getopts([ "-s", "10.0.0.1", "-d", path.to_str().unwrap() ]).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(options.server.port(), 53);
        assert_eq!(options.client, None);
        assert_eq!(options.queries, None);
        assert_eq!(options.limit, 0);
        assert_eq!(options.output, None);
    }

    #[test]
    fn invalid_server() {
        assert_eq!(Options::getopts([ "-s", "dns.example" ]),
                   OptionsResult::InvalidOptions(OptionsError::InvalidServer("dns.example".into())));
    }

    #[test]
    fn invalid_port() {
        assert_eq!(Options::getopts([ "-s", "127.0.0.1", "-p", "70000" ]),
                   OptionsResult::InvalidOptions(OptionsError::InvalidPort("70000".into())));
    }

    #[test]
    fn client_id_must_be_the_right_length() {
        assert_eq!(Options::getopts([ "-s", "127.0.0.1", "-c", "0011" ]),
                   OptionsResult::InvalidOptions(OptionsError::InvalidClient("0011".into())));
    }

    #[test]
    fn client_id_must_be_lowercase_hex() {
        assert_eq!(Options::getopts([ "-s", "127.0.0.1", "-c", "000102030405060708090A0B0C0D0E0F" ]),
                   OptionsResult::InvalidOptions(OptionsError::InvalidClient("000102030405060708090A0B0C0D0E0F".into())));
    }

    #[test]
    fn invalid_query_count() {
        assert_eq!(Options::getopts([ "-s", "127.0.0.1", "-n", "many" ]),
                   OptionsResult::InvalidOptions(OptionsError::InvalidQueryCount("many".into())));
    }

    #[test]
    fn missing_domains_file() {
        let result = Options::getopts([ "-s", "127.0.0.1", "-d", "/does/not/exist/whippet" ]);

        assert!(matches!(result,
                OptionsResult::InvalidOptions(OptionsError::BadDomains { .. })));
    }
}
