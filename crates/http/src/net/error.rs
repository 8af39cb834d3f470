use std::io;

use thiserror::Error;

use crate::buffer::BufferError;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to bind unix listener at {path}: {source}")]
    Bind {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to connect to unix socket {path}: {source}")]
    Connect {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("existing unix socket {path} is already in use")]
    InUse { path: String },

    #[error("unix socket path {path} is not a socket")]
    NotSocket { path: String },

    #[error("failed to read metadata for unix socket {path}: {source}")]
    UnixMetadata {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove stale unix socket {path}: {source}")]
    UnixCleanup {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to create control channel: {source}")]
    Channel {
        #[source]
        source: io::Error,
    },

    #[error("failed to accept connection: {source}")]
    Accept {
        #[source]
        source: io::Error,
    },

    #[error("failed to read from socket: {source}")]
    Read {
        #[source]
        source: io::Error,
    },

    #[error("failed to write to socket: {source}")]
    Write {
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

impl TransportError {
    pub(crate) fn bind(path: &str, source: io::Error) -> Self {
        Self::Bind { path: path.to_owned(), source }
    }

    pub(crate) fn connect(path: &str, source: io::Error) -> Self {
        Self::Connect { path: path.to_owned(), source }
    }
}
