use std::fs;
use std::io;
use std::os::fd::OwnedFd;
use std::os::unix::fs::FileTypeExt;
use std::os::unix::net::{UnixListener as StdUnixListener, UnixStream as StdUnixStream};
use std::path::Path;

use mio::event::Source;
use mio::net::UnixListener;
use mio::{Interest, Registry, Token};
use socket2::{Domain, SockAddr, Socket as RawSocket, Type};
use tracing::{trace, warn};

use crate::buffer::BufferConfig;
use crate::net::{Socket, TransportError};

/// A non-blocking unix stream listener bound to a filesystem path.
///
/// The socket file is removed when the listener is dropped.
#[derive(Debug)]
pub struct Listener {
    inner: UnixListener,
    path: String,
    buffer_config: BufferConfig,
}

impl Listener {
    /// Binds and listens at `path`.
    ///
    /// An existing socket file is reused only if nothing is listening on it anymore; a live
    /// listener gives [`TransportError::InUse`] and a non-socket file gives
    /// [`TransportError::NotSocket`]. Accepted sockets get buffers sized by `buffer_config`.
    pub fn bind(path: &str, backlog: i32, buffer_config: BufferConfig) -> Result<Self, TransportError> {
        remove_stale_socket(Path::new(path))?;

        let socket = RawSocket::new(Domain::UNIX, Type::STREAM, None).map_err(|e| TransportError::bind(path, e))?;
        let address = SockAddr::unix(path).map_err(|e| TransportError::bind(path, e))?;
        socket.bind(&address).map_err(|e| TransportError::bind(path, e))?;
        socket.listen(backlog).map_err(|e| TransportError::bind(path, e))?;
        socket.set_nonblocking(true).map_err(|e| TransportError::bind(path, e))?;

        let listener = StdUnixListener::from(OwnedFd::from(socket));
        Ok(Self { inner: UnixListener::from_std(listener), path: path.to_owned(), buffer_config })
    }

    /// Accepts one pending connection, `None` when there is none.
    pub fn accept(&self) -> Result<Option<Socket>, TransportError> {
        loop {
            match self.inner.accept() {
                Ok((stream, _addr)) => return Ok(Some(Socket::from_stream(stream, &self.buffer_config))),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(TransportError::Accept { source: e }),
            }
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Source for Listener {
    fn register(&mut self, registry: &Registry, token: Token, interests: Interest) -> io::Result<()> {
        self.inner.register(registry, token, interests)
    }

    fn reregister(&mut self, registry: &Registry, token: Token, interests: Interest) -> io::Result<()> {
        self.inner.reregister(registry, token, interests)
    }

    fn deregister(&mut self, registry: &Registry) -> io::Result<()> {
        self.inner.deregister(registry)
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => trace!(path = %self.path, "removed unix socket file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(cause = %e, path = %self.path, "failed to remove unix socket file"),
        }
    }
}

fn remove_stale_socket(path: &Path) -> Result<(), TransportError> {
    let display = || path.display().to_string();

    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(source) => return Err(TransportError::UnixMetadata { path: display(), source }),
    };

    if !metadata.file_type().is_socket() {
        return Err(TransportError::NotSocket { path: display() });
    }

    match StdUnixStream::connect(path) {
        Ok(_stream) => Err(TransportError::InUse { path: display() }),
        Err(e) if matches!(e.kind(), io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound) => {
            trace!(path = %path.display(), "removing stale unix socket file");
            fs::remove_file(path).map_err(|source| TransportError::UnixCleanup { path: display(), source })
        }
        Err(source) => Err(TransportError::Connect { path: display(), source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn socket_path(dir: &tempfile::TempDir) -> String {
        dir.path().join("test.sock").to_string_lossy().into_owned()
    }

    #[test]
    fn accept_none_when_idle() {
        let dir = tempfile::tempdir().unwrap();
        let listener = Listener::bind(&socket_path(&dir), 16, BufferConfig::default()).unwrap();

        assert!(listener.accept().unwrap().is_none());
    }

    #[test]
    fn connect_and_accept() {
        let dir = tempfile::tempdir().unwrap();
        let path = socket_path(&dir);
        let listener = Listener::bind(&path, 16, BufferConfig::default()).unwrap();

        let mut client = Socket::connect(&path, &BufferConfig::default()).unwrap();
        client.best_effort_write(b"ping").unwrap();

        let mut accepted = listener.accept().unwrap().unwrap();
        let outcome = accepted.drain_read().unwrap();
        assert_eq!(outcome.bytes, 4);
        assert_eq!(accepted.buffer().unread(), b"ping");
    }

    #[test]
    fn live_socket_in_use() {
        let dir = tempfile::tempdir().unwrap();
        let path = socket_path(&dir);
        let _listener = Listener::bind(&path, 16, BufferConfig::default()).unwrap();

        assert!(matches!(Listener::bind(&path, 16, BufferConfig::default()), Err(TransportError::InUse { .. })));
    }

    #[test]
    fn stale_socket_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = socket_path(&dir);
        drop(StdUnixListener::bind(&path).unwrap());
        assert!(Path::new(&path).exists());

        let listener = Listener::bind(&path, 16, BufferConfig::default()).unwrap();
        assert_eq!(listener.path(), path);
    }

    #[test]
    fn regular_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = socket_path(&dir);
        fs::write(&path, b"not a socket").unwrap();

        assert!(matches!(Listener::bind(&path, 16, BufferConfig::default()), Err(TransportError::NotSocket { .. })));
    }

    #[test]
    fn socket_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = socket_path(&dir);

        drop(Listener::bind(&path, 16, BufferConfig::default()).unwrap());
        assert!(!Path::new(&path).exists());
    }
}
