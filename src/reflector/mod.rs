//! The reflector engine: a deliberately stubbed DNS responder.
//!
//! Every `A` query gets the same canned record back; everything else gets
//! a refusal. Responses are spooled through a bounded ring so a burst of
//! queries never blocks the receive side, and an operator can ask for a
//! timestamp dump with a signal or stop the whole thing by typing `s`.

use std::fmt;
use std::fs::File;
use std::io;
use std::net::{SocketAddr, SocketAddrV4, UdpSocket};
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;
use std::time::Duration;

use log::*;

use dns_transport::queue::SpoolQueue;
use dns_transport::{clock, nonblock, poll, signal};

use crate::exits;
use crate::report;

mod options;
pub use self::options::{Options, OptionsError, OptionsResult, USAGE};


/// The ingress datagram buffer size; also the upper bound on a spooled
/// response, which can only be sixteen bytes longer than its query.
const RECEIVE_BUFFER_SIZE: usize = 65535;

/// The spool queue's backing storage size.
const SEND_QUEUE_SIZE: usize = 100 * 1024 * 1024;

/// The most timestamps either direction records between dumps; events past
/// this are served but not timestamped.
const TIMESTAMPS_MAXLENGTH: usize = 10_000_000;

/// The stdin byte that asks for a clean shutdown.
const STOP_CHARACTER: u8 = b's';

const STDIN_BUFFER_SIZE: usize = 10240;


/// The reflector: holds the options and runs the serve loop.
pub struct Reflector {
    options: Options,
}

impl Reflector {

    /// Packages up the parsed options.
    pub fn init(options: Options) -> Self {
        Self { options }
    }

    /// Serves until the operator stops it, translating any failure into an
    /// exit code.
    pub fn run(self) -> i32 {
        match self.execute() {
            Ok(()) => {
                info!("Exiting...");
                exits::SUCCESS
            }
            Err(e) => {
                error!("{}", e);
                exits::FAILURE
            }
        }
    }

    fn execute(self) -> Result<(), RunError> {
        let Options { address, output } = self.options;

        info!("Starting...");

        nonblock::set_nonblocking(nonblock::STDIN).map_err(RunError::StdinSetup)?;
        debug!("Made stdin nonblocking.");

        let socket = UdpSocket::bind(address).map_err(|e| RunError::Bind { address, source: e })?;
        socket.set_nonblocking(true).map_err(|e| RunError::Bind { address, source: e })?;
        info!("Bound to {}.", address);

        let mut queue = SpoolQueue::new(SEND_QUEUE_SIZE);
        info!("Created message queue of {} bytes.", SEND_QUEUE_SIZE);

        let mut recorder = match output {
            Some(path) => {
                signal::install_dump_handler().map_err(RunError::Signal)?;
                Some(Recorder::new(path))
            }
            None => None,
        };

        info!("Serving...");
        serve(&socket, &mut queue, recorder.as_mut())
    }
}


fn serve(socket: &UdpSocket, queue: &mut SpoolQueue, mut recorder: Option<&mut Recorder>) -> Result<(), RunError> {
    let mut receive_buffer = vec![ 0_u8; RECEIVE_BUFFER_SIZE ];
    let mut answer_buffer = Vec::with_capacity(RECEIVE_BUFFER_SIZE + dns::ANSWER_RECORD.len());
    let mut stdin_buffer = [ 0_u8; STDIN_BUFFER_SIZE ];
    let mut received_since_report = 0_usize;

    loop {
        if signal::take_dump_request() {
            if let Some(recorder) = recorder.as_deref_mut() {
                recorder.dump()?;
            }
        }

        let ready = poll::wait(socket.as_raw_fd(), ! queue.is_empty(),
                               Some(nonblock::STDIN), Duration::from_secs(1))?;

        if ready.readable {
            receive_all(socket, &mut receive_buffer, &mut answer_buffer, queue,
                        &mut received_since_report, recorder.as_deref_mut())?;
        }

        if ready.aux_readable && stop_requested(&mut stdin_buffer)? {
            return Ok(());
        }

        if ready.writable {
            send_all(socket, queue, recorder.as_deref_mut())?;
        }

        if ready.idle() && received_since_report > 0 {
            info!("Got {} message(s).", received_since_report);
            received_since_report = 0;
        }
    }
}

/// Receives until the socket would block, spooling one synthesized
/// response per well-formed query. Queries too mangled to answer are
/// dropped with a log line; a spool with no room left is fatal, because
/// silently shedding responses would poison the measurement.
fn receive_all(socket: &UdpSocket, receive_buffer: &mut [u8], answer_buffer: &mut Vec<u8>,
               queue: &mut SpoolQueue, received: &mut usize,
               mut recorder: Option<&mut Recorder>) -> Result<(), RunError> {
    loop {
        let (length, peer) = match nonblock::ready(socket.recv_from(receive_buffer)).map_err(RunError::Recv)? {
            Some(datagram)  => datagram,
            None            => return Ok(()),
        };

        let SocketAddr::V4(peer) = peer else {
            warn!("Dropping datagram from non-IPv4 peer {}.", peer);
            continue;
        };

        match dns::synthesize_response(&receive_buffer[..length], answer_buffer) {
            Ok(outcome) => {
                trace!("{:?} {} bytes from {}.", outcome, length, peer);

                if queue.push(peer, answer_buffer).is_err() {
                    return Err(RunError::QueueFull { size: answer_buffer.len() });
                }
            }
            Err(e) => {
                error!("Dropping {}-byte datagram from {}: {}.", length, peer, e);
                continue;
            }
        }

        *received += 1;
        if let Some(recorder) = recorder.as_deref_mut() {
            recorder.record_receive()?;
        }
    }
}

/// Sends spooled responses until the queue runs dry or the socket would
/// block. Responses go out strictly in arrival order.
fn send_all(socket: &UdpSocket, queue: &mut SpoolQueue,
            mut recorder: Option<&mut Recorder>) -> Result<(), RunError> {
    while ! queue.is_empty() {
        let next_head = {
            let Some(entry) = queue.peek() else { break };

            let sent = match nonblock::ready(socket.send_to(entry.payload, entry.peer)).map_err(RunError::Send)? {
                Some(bytes)  => bytes,
                None         => break,
            };

            if sent != entry.payload.len() {
                return Err(dns_transport::Error::ShortSend { expected: entry.payload.len(), sent }.into());
            }

            entry.next_head
        };

        queue.commit(next_head);
        if let Some(recorder) = recorder.as_deref_mut() {
            recorder.record_send()?;
        }
    }

    Ok(())
}

/// Drains stdin. Returns whether the operator asked to stop — with the
/// stop character, or by closing the stream altogether.
fn stop_requested(buffer: &mut [u8]) -> Result<bool, RunError> {
    loop {
        match nonblock::read(nonblock::STDIN, buffer).map_err(RunError::StdinRead)? {
            None => {
                return Ok(false);
            }
            Some(0) => {
                info!("Stdin closed.");
                return Ok(true);
            }
            Some(length) => {
                if buffer[..length].contains(&STOP_CHARACTER) {
                    info!("Stop character received.");
                    return Ok(true);
                }
            }
        }
    }
}


/// The optional timestamp recorder: one growable series per direction,
/// dumped and reset on request.
struct Recorder {
    path: PathBuf,
    receives: Vec<u64>,
    sends: Vec<u64>,
}

impl Recorder {
    fn new(path: PathBuf) -> Self {
        info!("Recording up to {} timestamps each way.", TIMESTAMPS_MAXLENGTH);

        Self {
            path,
            receives: Vec::with_capacity(TIMESTAMPS_MAXLENGTH),
            sends: Vec::with_capacity(TIMESTAMPS_MAXLENGTH),
        }
    }

    fn record_receive(&mut self) -> Result<(), RunError> {
        if self.receives.len() < TIMESTAMPS_MAXLENGTH {
            self.receives.push(clock::monotonic()?);
        }
        Ok(())
    }

    fn record_send(&mut self) -> Result<(), RunError> {
        if self.sends.len() < TIMESTAMPS_MAXLENGTH {
            self.sends.push(clock::monotonic()?);
        }
        Ok(())
    }

    /// Writes the artifact, then starts both series afresh: each dump
    /// covers only the events since the one before it.
    fn dump(&mut self) -> Result<(), RunError> {
        let mut sink = File::create(&self.path)
                            .map_err(|e| RunError::Dump { path: self.path.clone(), source: e })?;
        report::timestamps_report(&mut sink, &self.receives, &self.sends)
               .map_err(|e| RunError::Dump { path: self.path.clone(), source: e })?;

        info!("Dumped {} receive events and {} send events.", self.receives.len(), self.sends.len());

        self.receives.clear();
        self.sends.clear();
        Ok(())
    }
}


/// A fatal condition that ends a reflector run.
#[derive(Debug)]
enum RunError {
    StdinSetup(io::Error),
    StdinRead(io::Error),
    Bind { address: SocketAddrV4, source: io::Error },
    Signal(io::Error),
    Recv(io::Error),
    Send(io::Error),
    QueueFull { size: usize },
    Dump { path: PathBuf, source: io::Error },
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
            Self::StdinSetup(inner) => {
                write!(f, "Can't make stdin nonblocking: {}", inner)
            }
            Self::StdinRead(inner) => {
                write!(f, "Error on reading stdin: {}", inner)
            }
            Self::Bind { address, source } => {
                write!(f, "Can't bind socket to {}: {}", address, source)
            }
            Self::Signal(inner) => {
                write!(f, "Can't install dump signal handler: {}", inner)
            }
            Self::Recv(inner) => {
                write!(f, "Error on receiving: {}", inner)
            }
            Self::Send(inner) => {
                write!(f, "Error on sending: {}", inner)
            }
            Self::QueueFull { size } => {
                write!(f, "Failed to queue {}-byte message to send", size)
            }
            Self::Dump { path, source } => {
                write!(f, "Can't dump timestamps to {:?}: {}", path, source)
            }
            Self::Transport(inner) => {
                inner.fmt(f)
            }
        }
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn dumping_resets_the_series() {
        let path = std::env::temp_dir()
                       .join(format!("whippet-reflector-dump-{}", std::process::id()));
        let mut recorder = Recorder {
            path: path.clone(),
            receives: vec![ 1, 2, 3 ],
            sends: vec![ 4 ],
        };

        recorder.dump().unwrap();
        let first = std::fs::read_to_string(&path).unwrap();

        recorder.sends.push(9);
        recorder.dump().unwrap();
        let second = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(first, "{\"receives\":\n\t[\n\t\t1,\n\t\t2,\n\t\t3\n\t],\n \"sends\":\n\t[\n\t\t4\n\t]\n}\n");
        assert_eq!(second, "{\"receives\":\n\t[],\n \"sends\":\n\t[\n\t\t9\n\t]\n}\n");
    }
}
