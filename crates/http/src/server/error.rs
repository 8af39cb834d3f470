use std::io;

use thiserror::Error;

use crate::net::TransportError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("transport error: {source}")]
    Transport {
        #[from]
        source: TransportError,
    },

    #[error("failed to poll for readiness: {source}")]
    Poll {
        #[source]
        source: io::Error,
    },

    #[error("failed to register with the poller: {source}")]
    Register {
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn reactor thread: {source}")]
    Spawn {
        #[source]
        source: io::Error,
    },

    #[error("reactor thread panicked")]
    ThreadPanic,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServerBuildError {
    #[error("socket path is not set")]
    MissingPath,
}
