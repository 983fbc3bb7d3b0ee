//! Scriptable in-memory pipe backend for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use pipelink_transport::{PipeConnector, PipeMode, PipeStream, TransportError};

/// What a single `try_connect` call does.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Outcome {
    Connect,
    Busy,
    Refuse,
    InvalidHandle,
}

#[derive(Debug, Default)]
pub(crate) struct PipeState {
    /// Each entry is handed out by successive reads (split if the buffer is short).
    pub incoming: VecDeque<Vec<u8>>,
    pub written: Vec<u8>,
    pub write_calls: usize,
    pub modes: Vec<PipeMode>,
    pub fail_mode: bool,
    pub fail_write: bool,
    pub fail_read: bool,
    pub dropped: usize,
}

/// Shared view of the peer side of every stream a [`MockConnector`] opens.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockPipe(Arc<Mutex<PipeState>>);

impl MockPipe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_incoming(&self, bytes: &[u8]) {
        self.state().incoming.push_back(bytes.to_vec());
    }

    pub fn state(&self) -> MutexGuard<'_, PipeState> {
        self.0.lock().expect("mock pipe lock poisoned")
    }
}

#[derive(Debug)]
pub(crate) struct MockConnector {
    script: RefCell<VecDeque<Outcome>>,
    then: Outcome,
    wait_result: bool,
    attempts: Cell<u32>,
    waits: Cell<u32>,
    pipe: MockPipe,
}

impl MockConnector {
    /// Every attempt connects.
    pub fn available(pipe: &MockPipe) -> Self {
        Self::scripted(Vec::new(), Outcome::Connect, pipe)
    }

    /// Every attempt is refused.
    pub fn never_available() -> Self {
        Self::scripted(Vec::new(), Outcome::Refuse, &MockPipe::new())
    }

    /// Play `script` in order, then repeat `then`.
    pub fn scripted(script: Vec<Outcome>, then: Outcome, pipe: &MockPipe) -> Self {
        Self {
            script: RefCell::new(script.into()),
            then,
            wait_result: true,
            attempts: Cell::new(0),
            waits: Cell::new(0),
            pipe: pipe.clone(),
        }
    }

    pub fn with_wait_result(mut self, available: bool) -> Self {
        self.wait_result = available;
        self
    }

    /// Number of `try_connect` calls so far.
    pub fn attempts(&self) -> u32 {
        self.attempts.get()
    }

    /// Number of `wait_available` calls so far.
    pub fn waits(&self) -> u32 {
        self.waits.get()
    }
}

impl PipeConnector for MockConnector {
    type Stream = MockStream;

    fn try_connect(&self, address: &str) -> pipelink_transport::Result<MockStream> {
        self.attempts.set(self.attempts.get() + 1);
        let outcome = self.script.borrow_mut().pop_front().unwrap_or(self.then);
        match outcome {
            Outcome::Connect => Ok(MockStream {
                pipe: self.pipe.clone(),
            }),
            Outcome::Busy => Err(TransportError::Busy {
                address: address.to_string(),
            }),
            Outcome::Refuse => Err(TransportError::Connect {
                address: address.to_string(),
                source: std::io::Error::from_raw_os_error(2),
            }),
            Outcome::InvalidHandle => Err(TransportError::InvalidHandle {
                address: address.to_string(),
            }),
        }
    }

    fn wait_available(&self, _address: &str, _timeout: Duration) -> std::io::Result<bool> {
        self.waits.set(self.waits.get() + 1);
        Ok(self.wait_result)
    }

    fn transport_name(&self) -> &'static str {
        "mock"
    }
}

#[derive(Debug)]
pub(crate) struct MockStream {
    pipe: MockPipe,
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut state = self.pipe.state();
        if state.fail_read {
            return Err(std::io::Error::from(ErrorKind::BrokenPipe));
        }
        let Some(mut chunk) = state.incoming.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            state.incoming.push_front(chunk.split_off(n));
        }
        Ok(n)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut state = self.pipe.state();
        state.write_calls += 1;
        if state.fail_write {
            return Err(std::io::Error::from_raw_os_error(232));
        }
        state.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl PipeStream for MockStream {
    fn set_read_mode(&mut self, mode: PipeMode) -> std::io::Result<()> {
        let mut state = self.pipe.state();
        state.modes.push(mode);
        if state.fail_mode {
            return Err(std::io::Error::from_raw_os_error(1));
        }
        Ok(())
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        if let Ok(mut state) = self.pipe.0.lock() {
            state.dropped += 1;
        }
    }
}
