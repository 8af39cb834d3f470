//! Cross-thread wake-up channel for the reactor.
//!
//! A connected socket pair: the sending half can be cloned and used from any thread, the
//! receiving half is registered in the reactor's poll set like any other socket. Each
//! command is a single byte.

use std::io;
use std::io::Write;
use std::sync::Arc;

use mio::event::Source;
use mio::net::UnixStream;
use mio::{Interest, Registry, Token};
use tracing::warn;

use crate::buffer::BufferConfig;
use crate::net::{Socket, TransportError};

const CONTROL_BUFFER: BufferConfig = BufferConfig { capacity: 64, max_capacity: 64 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Shutdown,
}

impl ControlCommand {
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Shutdown => b'q',
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'q' => Some(Self::Shutdown),
            _ => None,
        }
    }
}

/// Creates a connected sender and receiver.
pub fn channel() -> Result<(ControlSender, ControlReceiver), TransportError> {
    let (sender, receiver) = UnixStream::pair().map_err(|source| TransportError::Channel { source })?;
    Ok((ControlSender { stream: Arc::new(sender) }, ControlReceiver { socket: Socket::from_stream(receiver, &CONTROL_BUFFER) }))
}

/// Sending half of the control channel.
#[derive(Debug, Clone)]
pub struct ControlSender {
    stream: Arc<UnixStream>,
}

impl ControlSender {
    /// Writes one command.
    ///
    /// A full channel already holds an unread wake-up, so a would-block write is not an error.
    pub fn send(&self, command: ControlCommand) -> Result<(), TransportError> {
        loop {
            match (&*self.stream).write(&[command.as_byte()]) {
                Ok(_) => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(TransportError::Write { source: e }),
            }
        }
    }
}

/// Receiving half of the control channel, registered with the reactor.
#[derive(Debug)]
pub struct ControlReceiver {
    socket: Socket,
}

impl ControlReceiver {
    /// Drains and decodes every pending command.
    ///
    /// Once all senders are gone the channel reports [`ControlCommand::Shutdown`].
    pub fn recv(&mut self) -> Result<Vec<ControlCommand>, TransportError> {
        let mut commands = Vec::new();
        loop {
            let outcome = self.socket.drain_read()?;
            let buffer = self.socket.buffer_mut();
            let unread = buffer.len();
            for byte in buffer.read(unread) {
                match ControlCommand::from_byte(*byte) {
                    Some(command) => commands.push(command),
                    None => warn!(byte = *byte, "ignoring unknown control command"),
                }
            }

            if outcome.eof {
                commands.push(ControlCommand::Shutdown);
            }
            if !outcome.saturated {
                return Ok(commands);
            }
        }
    }
}

impl Source for ControlReceiver {
    fn register(&mut self, registry: &Registry, token: Token, interests: Interest) -> io::Result<()> {
        self.socket.register(registry, token, interests)
    }

    fn reregister(&mut self, registry: &Registry, token: Token, interests: Interest) -> io::Result<()> {
        self.socket.reregister(registry, token, interests)
    }

    fn deregister(&mut self, registry: &Registry) -> io::Result<()> {
        self.socket.deregister(registry)
    }
}
