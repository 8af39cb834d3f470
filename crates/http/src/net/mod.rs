//! Unix domain socket transport.
//!
//! - [`Socket`]: a connected non-blocking stream that owns a [`ByteBuffer`](crate::buffer::ByteBuffer)
//!   for reads and a queue for writes the kernel did not accept yet
//! - [`Listener`]: binds a socket path and accepts connections
//! - [`control`]: the channel used to wake the reactor from other threads
//!
//! Sockets, the listener and the control receiver implement [`mio::event::Source`] so they
//! can be registered with a [`mio::Poll`].

pub mod control;
mod error;
mod listener;
mod socket;

pub use error::TransportError;
pub use listener::Listener;
pub use socket::ReadOutcome;
pub use socket::Socket;
pub use socket::WriteStatus;
