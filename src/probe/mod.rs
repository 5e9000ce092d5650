//! The probe engine: paced transmission of a pre-built query batch,
//! reception overlapped with it on one nonblocking socket, and correlation
//! of every response back to the in-flight slot that caused it.

use std::fmt;
use std::fs::File;
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;
use std::time::Duration;

use log::*;

use dns::Header;
use dns_transport::clock::{self, NANOSECONDS};
use dns_transport::{nonblock, poll};

use crate::exits;
use crate::report;

mod batch;
pub use self::batch::QueryBatch;

mod options;
pub use self::options::{Options, OptionsError, OptionsResult, USAGE};


/// The size of the transaction id space. A batch larger than this reuses
/// ids, and responses are mapped back through equivalence classes.
pub const TXID_SPACE: usize = 65535;

/// How many idle seconds the drain phase tolerates before giving up on
/// the outstanding queries.
const RECV_TIMEOUT: u32 = 35;

/// The ingress datagram buffer size.
const RECEIVE_BUFFER_SIZE: usize = 65535;


/// One in-flight query slot.
#[derive(PartialEq, Debug, Copy, Clone, Default)]
pub struct Pair {

    /// When the query went out, captured right after the send call.
    pub sent: u64,

    /// How many responses were attributed to this slot.
    pub answer: u32,

    /// When the first counted response arrived. Zero until then.
    pub received: u64,
}


/// The probe: holds the options, runs the engine, writes the artifact.
pub struct Probe {
    options: Options,
}

impl Probe {

    /// Packages up the parsed options.
    pub fn init(options: Options) -> Self {
        Self { options }
    }

    /// Runs the measurement, translating any failure into an exit code.
    pub fn run(self) -> i32 {
        match self.execute() {
            Ok(()) => {
                exits::SUCCESS
            }
            Err(e) => {
                error!("{}", e);
                exits::FAILURE
            }
        }
    }

    fn execute(self) -> Result<(), RunError> {
        let Options { server, client, queries, limit, domains, output } = self.options;

        let count = queries.unwrap_or_else(|| domains.len());
        let interval = write_interval(limit);

        if log_enabled!(Level::Debug) {
            debug!("Domains ({}):", domains.len());
            for (index, name) in domains.iter().enumerate() {
                debug!("\t{}: {}", index + 1, dns::decode(name).unwrap_or_default());
            }
        }

        let batch = QueryBatch::build(&domains, count, client.as_ref()).map_err(RunError::Batch)?;

        let mut sends: Vec<u64> = Vec::with_capacity(count);
        let mut receives: Vec<u64> = Vec::with_capacity(count);
        let mut pairs: Vec<Pair> = vec![ Pair::default(); count ];

        info!("Starting...");
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).map_err(RunError::Socket)?;
        socket.set_nonblocking(true).map_err(RunError::Socket)?;

        let mut buffer = vec![ 0_u8; RECEIVE_BUFFER_SIZE ];
        let mut cursor = batch.cursor();
        let mut answered = 0_usize;
        let mut last_sent = 0_u64;

        while sends.len() < batch.count() {
            let ready = poll::wait(socket.as_raw_fd(), true, None, Duration::from_secs(1))?;

            if ready.readable {
                answered += drain_responses(&socket, &mut buffer, sends.len(), &mut pairs, &mut receives)?;
            }

            if ready.writable && pace_allows(interval, sends.len(), last_sent)? {
                let Some(query) = cursor.next() else { break };

                let sent_bytes = socket.send_to(query, server)
                                       .map_err(|e| RunError::Send { address: server, source: e })?;
                if sent_bytes != query.len() {
                    return Err(dns_transport::Error::ShortSend { expected: query.len(), sent: sent_bytes }.into());
                }

                let timestamp = clock::monotonic()?;
                pairs[sends.len()].sent = timestamp;
                sends.push(timestamp);

                if interval > 0 {
                    last_sent = timestamp;
                }

                debug!("Sent {} bytes.", sent_bytes);
            }
        }

        // Receive-only from here on: every quiet second costs one attempt,
        // every response buys them all back.
        let mut attempts = RECV_TIMEOUT;
        while answered < batch.count() && attempts > 0 {
            let ready = poll::wait(socket.as_raw_fd(), false, None, Duration::from_secs(1))?;

            if ready.readable {
                answered += drain_responses(&socket, &mut buffer, sends.len(), &mut pairs, &mut receives)?;
                attempts = RECV_TIMEOUT;
            }
            else {
                attempts -= 1;
            }
        }

        info!("Messages:\n\tSent....: {};\n\tReceived: {};\n\tLost....: {}.",
              sends.len(), answered, sends.len() - answered);

        match output {
            Some(path) => {
                let mut sink = File::create(&path)
                                    .map_err(|e| RunError::Output { path: path.clone(), source: e })?;
                report::probe_report(&mut sink, &sends, &receives, &pairs)
                       .map_err(|e| RunError::Output { path, source: e })?;
            }
            None => {
                let stdout = io::stdout();
                report::probe_report(&mut stdout.lock(), &sends, &receives, &pairs)
                       .map_err(RunError::Stdout)?;
            }
        }

        info!("Exiting...");
        Ok(())
    }
}


/// The nanoseconds that must pass between sends under a rate limit of
/// `limit` queries per second; zero when unlimited.
fn write_interval(limit: u64) -> u64 {
    match limit {
        0 => 0,
        l => (NANOSECONDS + l / 2) / l,
    }
}

/// Whether pacing permits another send yet. The first query always goes
/// out immediately.
fn pace_allows(interval: u64, sent_count: usize, last_sent: u64) -> Result<bool, RunError> {
    if interval == 0 || sent_count == 0 {
        return Ok(true);
    }

    let now = clock::monotonic()?;
    Ok(now - last_sent >= interval)
}

/// Receives until the socket would block, correlating each response.
/// Returns how many previously-open slots got their first answer.
fn drain_responses(socket: &UdpSocket, buffer: &mut [u8], sent_count: usize,
                   pairs: &mut [Pair], receives: &mut Vec<u64>) -> Result<usize, RunError> {
    let mut answered = 0;

    loop {
        let (length, peer) = match nonblock::ready(socket.recv_from(buffer)).map_err(RunError::Recv)? {
            Some(datagram)  => datagram,
            None            => break,
        };

        let received = clock::monotonic()?;
        debug!("Got {} bytes from {}.", length, peer);

        let header = Header::from_bytes(&buffer[..length]).map_err(RunError::Malformed)?;
        check_transaction_id(header.transaction_id, pairs.len())?;

        match correlate(pairs, sent_count, header.transaction_id, received) {
            Correlation::Answered(_) => {
                receives.push(received);
                answered += 1;

                debug!("Answer:\n\tID.........: {}\n\tFlags......: {:#06x}\n\tQueries....: {}\n\
                        \tAnswers....: {}\n\tAuthorities: {}\n\tAdditional.: {}",
                       header.transaction_id, header.flags, header.questions,
                       header.answers, header.authorities, header.additional);
            }
            Correlation::Duplicate(_) => {
                receives.push(received);
                debug!("Received duplicate answer for query with transaction id {}.", header.transaction_id);
            }
            Correlation::Unmatched => {
                debug!("Received answer with transaction id {} matching no outstanding query.",
                       header.transaction_id);
            }
        }
    }

    Ok(answered)
}


/// Rejects a transaction id the batch could never have assigned. A batch
/// that fits inside the id space — the boundary included, since a batch of
/// exactly 65535 queries still only hands out ids up to 65534 — uses ids
/// below its own size, so anything at or past it is a protocol violation
/// and fatal to the run. Larger batches alias, and every id is plausible.
fn check_transaction_id(transaction_id: u16, count: usize) -> Result<(), RunError> {
    if count <= TXID_SPACE && usize::from(transaction_id) >= count {
        return Err(RunError::UnknownTransaction { id: transaction_id, count });
    }

    Ok(())
}


/// Where a response landed.
#[derive(PartialEq, Debug, Copy, Clone)]
enum Correlation {

    /// The slot took its first answer.
    Answered(usize),

    /// Every candidate slot had already been answered; this one took the
    /// response as a duplicate, keeping its original timestamp.
    Duplicate(usize),

    /// No slot sent before this arrival could have produced it.
    Unmatched,
}

/// Finds the in-flight slot a response belongs to.
///
/// While the batch fits inside the id space, the transaction id simply is
/// the slot index. Past that, ids alias, and the id names the equivalence
/// class `{id, id + 65535, id + 2·65535, …}`: the classes are scanned in
/// ascending order for the first open slot whose query went out before the
/// response arrived. Only slots that have actually been sent are
/// considered.
fn correlate(pairs: &mut [Pair], sent_count: usize, transaction_id: u16, received: u64) -> Correlation {
    if pairs.len() <= TXID_SPACE {
        // Direct indexing; the id was validated against the batch size
        // upstream.
        let slot = usize::from(transaction_id);
        if slot >= sent_count || pairs[slot].sent >= received {
            return Correlation::Unmatched;
        }

        let pair = &mut pairs[slot];
        pair.answer += 1;

        if pair.answer == 1 {
            pair.received = received;
            Correlation::Answered(slot)
        }
        else {
            Correlation::Duplicate(slot)
        }
    }
    else {
        let mut slot = usize::from(transaction_id);
        let mut duplicate = None;

        while slot < sent_count {
            let pair = &mut pairs[slot];

            if pair.sent < received {
                if pair.answer == 0 {
                    pair.answer += 1;
                    pair.received = received;
                    return Correlation::Answered(slot);
                }

                if duplicate.is_none() {
                    duplicate = Some(slot);
                }
            }

            slot += TXID_SPACE;
        }

        match duplicate {
            Some(slot) => {
                pairs[slot].answer += 1;
                Correlation::Duplicate(slot)
            }
            None => Correlation::Unmatched,
        }
    }
}


/// A fatal condition that ends a probe run.
#[derive(Debug)]
enum RunError {
    Batch(io::Error),
    Socket(io::Error),
    Send { address: SocketAddrV4, source: io::Error },
    Recv(io::Error),
    Malformed(dns::WireError),
    UnknownTransaction { id: u16, count: usize },
    Output { path: PathBuf, source: io::Error },
    Stdout(io::Error),
    Transport(dns_transport::Error),
}

impl From<dns_transport::Error> for RunError {
    fn from(inner: dns_transport::Error) -> Self {
        Self::Transport(inner)
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Batch(inner) => {
                write!(f, "Can't build query batch: {}", inner)
            }
            Self::Socket(inner) => {
                write!(f, "Can't open UDP socket: {}", inner)
            }
            Self::Send { address, source } => {
                write!(f, "Error on sending to {}: {}", address, source)
            }
            Self::Recv(inner) => {
                write!(f, "Error on receiving: {}", inner)
            }
            Self::Malformed(inner) => {
                write!(f, "{}", inner)
            }
            Self::UnknownTransaction { id, count } => {
                write!(f, "Received message with transaction id {} while expected maximum is {}", id, count)
            }
            Self::Output { path, source } => {
                write!(f, "Can't write statistics to {:?}: {}", path, source)
            }
            Self::Stdout(inner) => {
                write!(f, "Can't write statistics: {}", inner)
            }
            Self::Transport(inner) => {
                inner.fmt(f)
            }
        }
    }
}
