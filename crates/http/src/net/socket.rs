//! Non-blocking unix stream socket with an owned read buffer and a pending-write queue.

use std::io;
use std::io::{Read, Write};
use std::net::Shutdown;
use std::os::fd::OwnedFd;
use std::os::unix::net::UnixStream as StdUnixStream;

use bytes::{Buf, BytesMut};
use mio::event::Source;
use mio::net::UnixStream;
use mio::{Interest, Registry, Token};
use socket2::{Domain, SockAddr, Socket as RawSocket, Type};
use tracing::trace;

use crate::buffer::{BufferConfig, ByteBuffer};
use crate::net::TransportError;

/// Result of draining a socket into its buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Bytes appended to the buffer by this drain.
    pub bytes: usize,
    /// The peer closed its writing side.
    pub eof: bool,
    /// The drain stopped because the buffer reached its maximum capacity. More data may be
    /// waiting in the kernel; consume from the buffer and drain again.
    pub saturated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// Every queued byte has been handed to the kernel.
    Complete,
    /// Bytes remain queued until the socket becomes writable again.
    Pending,
}

/// A connected unix stream socket in non-blocking mode.
#[derive(Debug)]
pub struct Socket {
    stream: UnixStream,
    buffer: ByteBuffer,
    pending: BytesMut,
    closed: bool,
}

impl Socket {
    /// Connects to the listener at `path` and switches the socket to non-blocking mode.
    pub fn connect(path: &str, config: &BufferConfig) -> Result<Self, TransportError> {
        let socket = RawSocket::new(Domain::UNIX, Type::STREAM, None).map_err(|e| TransportError::connect(path, e))?;
        let address = SockAddr::unix(path).map_err(|e| TransportError::connect(path, e))?;
        socket.connect(&address).map_err(|e| TransportError::connect(path, e))?;
        socket.set_nonblocking(true).map_err(|e| TransportError::connect(path, e))?;

        let stream = StdUnixStream::from(OwnedFd::from(socket));
        Ok(Self::from_stream(UnixStream::from_std(stream), config))
    }

    /// Wraps an already non-blocking stream.
    pub fn from_stream(stream: UnixStream, config: &BufferConfig) -> Self {
        Self { stream, buffer: config.build(), pending: BytesMut::new(), closed: false }
    }

    pub fn buffer(&self) -> &ByteBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut ByteBuffer {
        &mut self.buffer
    }

    /// Reads until the kernel has no more data, the peer closed, or the buffer is full.
    ///
    /// Would-block ends the drain normally and interrupted reads are retried.
    pub fn drain_read(&mut self) -> Result<ReadOutcome, TransportError> {
        let mut outcome = ReadOutcome::default();
        loop {
            if self.buffer.try_reserve().is_err() {
                outcome.saturated = true;
                return Ok(outcome);
            }

            match self.stream.read(self.buffer.writable_region()) {
                Ok(0) => {
                    outcome.eof = true;
                    return Ok(outcome);
                }
                Ok(n) => {
                    self.buffer.commit(n)?;
                    outcome.bytes += n;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(outcome),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(TransportError::Read { source: e }),
            }
        }
    }

    /// Writes as much of `bytes` as the kernel accepts and queues the rest.
    pub fn best_effort_write(&mut self, bytes: &[u8]) -> Result<WriteStatus, TransportError> {
        self.pending.extend_from_slice(bytes);
        self.flush()
    }

    /// Continues writing queued bytes.
    pub fn flush(&mut self) -> Result<WriteStatus, TransportError> {
        while !self.pending.is_empty() {
            match self.stream.write(&self.pending) {
                Ok(0) => return Err(TransportError::Write { source: io::ErrorKind::WriteZero.into() }),
                Ok(n) => {
                    trace!(written = n, remaining = self.pending.len() - n, "wrote to socket");
                    self.pending.advance(n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(WriteStatus::Pending),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(TransportError::Write { source: e }),
            }
        }
        Ok(WriteStatus::Complete)
    }

    pub fn has_pending_writes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Shuts down both directions. Calling it again has no effect.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            trace!(cause = %e, "socket shutdown failed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Source for Socket {
    fn register(&mut self, registry: &Registry, token: Token, interests: Interest) -> io::Result<()> {
        self.stream.register(registry, token, interests)
    }

    fn reregister(&mut self, registry: &Registry, token: Token, interests: Interest) -> io::Result<()> {
        self.stream.reregister(registry, token, interests)
    }

    fn deregister(&mut self, registry: &Registry) -> io::Result<()> {
        self.stream.deregister(registry)
    }
}
