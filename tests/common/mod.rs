//! Shared fixtures: an in-process transport over a Unix socket pair.

#![allow(dead_code)]

use boot_tests::{
    BackgroundProcesses, Connection, Endpoint, LineCleanup, LineStream, OutputLog, Subtest,
    SubtestContext, SubtestError, Transport, TransportError,
};
use std::cell::RefCell;
use std::fs::File;
use std::io::Write;
use std::os::fd::OwnedFd;
use std::os::unix::net::UnixStream;
use std::rc::Rc;

/// Transport whose target side is a socket the test writes into.
pub struct SocketTransport {
    reader: Option<UnixStream>,
    prelude: Vec<Box<dyn Subtest>>,
    terminator: String,
    cleanup: Option<LineCleanup>,
    fail_setup: bool,
}

impl SocketTransport {
    pub fn new(reader: UnixStream) -> Self {
        Self {
            reader: Some(reader),
            prelude: Vec::new(),
            terminator: "\r\n".to_string(),
            cleanup: None,
            fail_setup: false,
        }
    }

    pub fn terminator(mut self, terminator: &str) -> Self {
        self.terminator = terminator.to_string();
        self
    }

    pub fn prelude(mut self, subtest: impl Subtest + 'static) -> Self {
        self.prelude.push(Box::new(subtest));
        self
    }

    pub fn cleanup(mut self, cleanup: LineCleanup) -> Self {
        self.cleanup = Some(cleanup);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_setup = true;
        self
    }
}

impl Transport for SocketTransport {
    fn describe(&self) -> String {
        "socket pair".to_string()
    }

    fn connect(
        &mut self,
        _processes: &mut BackgroundProcesses,
    ) -> Result<Connection, TransportError> {
        if self.fail_setup {
            return Err(TransportError::Pty(std::io::Error::other("no ptys left")));
        }
        let reader = self.reader.take().ok_or_else(|| {
            TransportError::Io(std::io::Error::other("transport already connected"))
        })?;
        let writer = reader.try_clone()?;
        let mut conn = Connection::new(LineStream::with_writer(reader, writer, &self.terminator));
        conn.prelude = std::mem::take(&mut self.prelude);
        Ok(conn)
    }

    fn finalize(&self, log: &mut OutputLog) {
        if let Some(cleanup) = &self.cleanup {
            log.collapse(cleanup);
        }
    }
}

/// A connected (target side, orchestrator side) socket pair.
pub fn socket_pair() -> (UnixStream, UnixStream) {
    UnixStream::pair().expect("socket pair")
}

pub fn send(target: &mut UnixStream, text: &str) {
    target.write_all(text.as_bytes()).expect("write to target side");
}

/// File endpoint for a spawned process writing into the target side.
pub fn endpoint_for(target: &UnixStream) -> Endpoint {
    let clone = target.try_clone().expect("clone socket");
    Endpoint::File(File::from(OwnedFd::from(clone)))
}

/// Subtest that records its invocation and then succeeds or fails.
pub struct Recording {
    pub name: String,
    pub calls: Rc<RefCell<Vec<String>>>,
    pub fail: bool,
}

impl Subtest for Recording {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, ctx: &mut SubtestContext<'_>) -> Result<(), SubtestError> {
        self.calls.borrow_mut().push(self.name.clone());
        ctx.log.push(format!("ran {}", self.name));
        if self.fail {
            return Err(SubtestError::Write {
                source: std::io::Error::other("forced failure"),
            });
        }
        Ok(())
    }
}

pub fn recording(name: &str, calls: &Rc<RefCell<Vec<String>>>, fail: bool) -> Recording {
    Recording {
        name: name.to_string(),
        calls: Rc::clone(calls),
        fail,
    }
}
