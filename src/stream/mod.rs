//! Line-oriented view over a live serial byte stream.
//!
//! A background reader thread pulls raw bytes from the source, reassembles
//! them into lines with a [`LineSplitter`] and forwards them over a channel.
//! The foreground side blocks on that channel with an explicit deadline,
//! which is the only suspension point in a boot test.
//!
//! Streams built with [`LineStream::from_fd`] poll their source and stop when
//! the stream is dropped, so the descriptor is closed by the time the run
//! returns. Plain readers are only released at end-of-stream.

pub mod ansi;
mod splitter;

pub use splitter::LineSplitter;

use crate::error::ReadError;
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use std::io::{self, Read, Write};
use std::os::fd::AsFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, trace};

/// Size of a single raw read from the source.
const READ_CHUNK: usize = 4096;

/// How often a polling reader checks whether it was asked to stop.
const POLL_INTERVAL_MS: u16 = 50;

enum StreamEvent {
    Line(String),
    Eof { partial: String },
}

/// Reader thread that can be told to let go of its source.
struct StoppableReader {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Blocking, line-delimited reader plus raw writer over one serial channel.
pub struct LineStream {
    rx: Receiver<StreamEvent>,
    writer: Option<Box<dyn Write + Send>>,
    reader: Option<StoppableReader>,
    /// Set once end-of-stream was observed; holds the unterminated tail.
    closed: Option<String>,
    echo: bool,
}

impl LineStream {
    /// Wrap a byte source that is only read from.
    pub fn new<R>(source: R, terminator: &str) -> Self
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let term = terminator.as_bytes().to_vec();
        std::thread::spawn(move || {
            Self::reader_thread(source, term, tx);
        });

        Self {
            rx,
            writer: None,
            reader: None,
            closed: None,
            echo: false,
        }
    }

    /// Wrap a descriptor-backed source (pty main, device node, socket) and
    /// its write side. The reader thread exits, closing `source`, when the
    /// stream is dropped.
    pub fn from_fd<S, W>(source: S, writer: W, terminator: &str) -> Self
    where
        S: Read + AsFd + Send + 'static,
        W: Write + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let term = terminator.as_bytes().to_vec();
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = std::thread::spawn(move || {
            Self::polling_reader_thread(source, term, tx, flag);
        });

        Self {
            rx,
            writer: Some(Box::new(writer)),
            reader: Some(StoppableReader { stop, handle }),
            closed: None,
            echo: false,
        }
    }

    /// Wrap a byte source together with the write side of the same channel.
    pub fn with_writer<R, W>(source: R, writer: W, terminator: &str) -> Self
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let mut stream = Self::new(source, terminator);
        stream.writer = Some(Box::new(writer));
        stream
    }

    /// Print every line to stdout as it is consumed.
    pub fn echo(mut self, enabled: bool) -> Self {
        self.echo = enabled;
        self
    }

    fn reader_thread<R: Read>(mut source: R, terminator: Vec<u8>, tx: Sender<StreamEvent>) {
        let mut splitter = LineSplitter::new(&terminator);
        let mut buf = [0u8; READ_CHUNK];

        while pump(&mut source, &mut buf, &mut splitter, &tx) {}

        let _ = tx.send(StreamEvent::Eof {
            partial: splitter.remainder(),
        });
    }

    fn polling_reader_thread<S: Read + AsFd>(
        mut source: S,
        terminator: Vec<u8>,
        tx: Sender<StreamEvent>,
        stop: Arc<AtomicBool>,
    ) {
        let mut splitter = LineSplitter::new(&terminator);
        let mut buf = [0u8; READ_CHUNK];

        while !stop.load(Ordering::Relaxed) {
            let ready = {
                let mut fds = [PollFd::new(source.as_fd(), PollFlags::POLLIN)];
                poll(&mut fds, PollTimeout::from(POLL_INTERVAL_MS))
            };
            match ready {
                Ok(0) | Err(Errno::EINTR) => continue,
                Ok(_) => {}
                Err(e) => {
                    debug!("stream poll failed: {e}");
                    break;
                }
            }
            if !pump(&mut source, &mut buf, &mut splitter, &tx) {
                break;
            }
        }

        let _ = tx.send(StreamEvent::Eof {
            partial: splitter.remainder(),
        });
    }

    /// Block until a complete line arrives or `deadline` passes.
    pub fn read_line_until(&mut self, deadline: Instant) -> Result<String, ReadError> {
        if let Some(partial) = &self.closed {
            return Err(ReadError::Closed {
                partial: partial.clone(),
            });
        }

        let wait = deadline.saturating_duration_since(Instant::now());
        match self.rx.recv_timeout(wait) {
            Ok(event) => self.accept(event),
            Err(RecvTimeoutError::Timeout) => Err(ReadError::TimedOut),
            Err(RecvTimeoutError::Disconnected) => self.accept(StreamEvent::Eof {
                partial: String::new(),
            }),
        }
    }

    /// Block until a complete line arrives, without a deadline.
    pub fn read_line(&mut self) -> Result<String, ReadError> {
        if let Some(partial) = &self.closed {
            return Err(ReadError::Closed {
                partial: partial.clone(),
            });
        }

        match self.rx.recv() {
            Ok(event) => self.accept(event),
            Err(_) => self.accept(StreamEvent::Eof {
                partial: String::new(),
            }),
        }
    }

    fn accept(&mut self, event: StreamEvent) -> Result<String, ReadError> {
        match event {
            StreamEvent::Line(line) => {
                trace!(line = %line.escape_debug(), "line");
                if self.echo {
                    println!("  {}", line);
                }
                Ok(line)
            }
            StreamEvent::Eof { partial } => {
                debug!(partial = %partial.escape_debug(), "stream closed");
                self.closed = Some(partial.clone());
                Err(ReadError::Closed { partial })
            }
        }
    }

    /// Write raw bytes to the paired channel.
    pub fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::BrokenPipe, "stream has no write side")
        })?;
        writer.write_all(bytes)?;
        writer.flush()
    }
}

impl Drop for LineStream {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.stop.store(true, Ordering::Relaxed);
            if reader.handle.join().is_err() {
                debug!("stream reader thread panicked");
            }
        }
    }
}

/// Read one chunk and forward every completed line. Returns `false` once the
/// source is exhausted or nobody is listening any more.
fn pump<R: Read>(
    source: &mut R,
    buf: &mut [u8],
    splitter: &mut LineSplitter,
    tx: &Sender<StreamEvent>,
) -> bool {
    match source.read(buf) {
        Ok(0) => false,
        Ok(n) => splitter
            .push(&buf[..n])
            .into_iter()
            .all(|line| tx.send(StreamEvent::Line(line)).is_ok()),
        Err(e) if e.kind() == io::ErrorKind::Interrupted => true,
        // A pty main returns EIO once every secondary handle is gone.
        Err(e) if e.raw_os_error() == Some(Errno::EIO as i32) => false,
        Err(e) => {
            debug!("stream read failed: {e}");
            false
        }
    }
}
