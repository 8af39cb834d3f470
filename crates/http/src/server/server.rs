use std::thread;
use std::thread::JoinHandle;

use tracing::{debug, error};

use crate::buffer::BufferConfig;
use crate::codec::DecoderLimits;
use crate::handler::{Handler, RouteTable};
use crate::net::Listener;
use crate::net::control::{self, ControlCommand, ControlSender};
use crate::server::reactor::Reactor;
use crate::server::{ServerBuildError, ServerError};

/// Default listen backlog.
pub const DEFAULT_BACKLOG: i32 = 16;

/// Default number of readiness events handled per wake.
pub const DEFAULT_EVENTS_CAPACITY: usize = 256;

const REACTOR_THREAD_NAME: &str = "ulocal-reactor";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub backlog: i32,
    pub buffer: BufferConfig,
    pub limits: DecoderLimits,
    pub events_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            backlog: DEFAULT_BACKLOG,
            buffer: BufferConfig::default(),
            limits: DecoderLimits::default(),
            events_capacity: DEFAULT_EVENTS_CAPACITY,
        }
    }
}

#[derive(Debug, Default)]
pub struct ServerBuilder {
    path: Option<String>,
    routes: RouteTable,
    config: ServerConfig,
}

impl ServerBuilder {
    fn new() -> Self {
        Default::default()
    }

    /// Filesystem path of the listening socket.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Registers `handler` for an exact `path` and the given methods.
    pub fn route<H>(mut self, path: impl Into<String>, methods: &[&str], handler: H) -> Self
    where
        H: Handler + 'static,
    {
        self.routes.add_route(path, methods, handler);
        self
    }

    /// Replaces all routes registered so far.
    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn backlog(mut self, backlog: i32) -> Self {
        self.config.backlog = backlog;
        self
    }

    pub fn buffer(mut self, buffer: BufferConfig) -> Self {
        self.config.buffer = buffer;
        self
    }

    pub fn limits(mut self, limits: DecoderLimits) -> Self {
        self.config.limits = limits;
        self
    }

    pub fn events_capacity(mut self, events_capacity: usize) -> Self {
        self.config.events_capacity = events_capacity;
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let path = self.path.ok_or(ServerBuildError::MissingPath)?;
        Ok(Server { path, routes: self.routes, config: self.config })
    }
}

/// A configured server that has not started yet.
#[derive(Debug)]
pub struct Server {
    path: String,
    routes: RouteTable,
    config: ServerConfig,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn add_route<H>(&mut self, path: impl Into<String>, methods: &[&str], handler: H)
    where
        H: Handler + 'static,
    {
        self.routes.add_route(path, methods, handler);
    }

    /// Binds the socket on the calling thread and starts the reactor on a new thread.
    ///
    /// Binding errors are returned here rather than from the reactor thread. The route table
    /// moves into the reactor, so no route can be added once serving has started.
    pub fn serve(self) -> Result<ServerHandle, ServerError> {
        let listener = Listener::bind(&self.path, self.config.backlog, self.config.buffer)?;
        let (sender, receiver) = control::channel()?;
        let reactor = Reactor::new(listener, receiver, self.routes, self.config)?;

        let thread = thread::Builder::new()
            .name(REACTOR_THREAD_NAME.to_owned())
            .spawn(move || {
                let result = reactor.run();
                if let Err(e) = &result {
                    error!(cause = %e, "reactor failed");
                }
                result
            })
            .map_err(|source| ServerError::Spawn { source })?;

        Ok(ServerHandle { control: sender, thread: Some(thread), path: self.path })
    }
}

/// Handle to a running server.
///
/// Dropping the handle asks the reactor to stop without waiting for it.
#[derive(Debug)]
pub struct ServerHandle {
    control: ControlSender,
    thread: Option<JoinHandle<Result<(), ServerError>>>,
    path: String,
}

impl ServerHandle {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Asks the reactor to stop. It finishes the current wake, closes every connection and
    /// removes the socket file.
    pub fn terminate(&self) -> Result<(), ServerError> {
        self.control.send(ControlCommand::Shutdown)?;
        Ok(())
    }

    /// A sender other threads can use to stop the server.
    pub fn shutdown_trigger(&self) -> ControlSender {
        self.control.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Waits for the reactor thread and returns its result.
    pub fn wait_until_done(mut self) -> Result<(), ServerError> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };

        match thread.join() {
            Ok(result) => result,
            Err(_) => Err(ServerError::ThreadPanic),
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if self.thread.is_some()
            && let Err(e) = self.control.send(ControlCommand::Shutdown)
        {
            debug!(cause = %e, "failed to signal reactor shutdown");
        }
    }
}
