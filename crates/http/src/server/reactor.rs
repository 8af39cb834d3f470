//! The single-threaded readiness loop.
//!
//! Every wake handles, in order: the control channel, the listener, then each ready
//! connection (read and dispatch, flush queued writes, hang-up). Connections closed during
//! the wake are deregistered at its end.

use std::collections::HashMap;
use std::io;

use mio::event::Event;
use mio::{Events, Interest, Poll, Token};
use tracing::{debug, info, trace, warn};

use crate::connection::Connection;
use crate::handler::RouteTable;
use crate::net::control::{ControlCommand, ControlReceiver};
use crate::net::{Listener, WriteStatus};
use crate::server::dispatch::{dispatch, error_response, finalize_response};
use crate::server::{ServerConfig, ServerError};

const LISTENER: Token = Token(0);
const CONTROL: Token = Token(1);
const FIRST_CONNECTION: usize = 2;

/// Readiness of one registered source, copied out of a poll event.
#[derive(Debug, Clone, Copy)]
struct Readiness {
    readable: bool,
    writable: bool,
    read_closed: bool,
    write_closed: bool,
    error: bool,
}

impl From<&Event> for Readiness {
    fn from(event: &Event) -> Self {
        Self {
            readable: event.is_readable(),
            writable: event.is_writable(),
            read_closed: event.is_read_closed(),
            write_closed: event.is_write_closed(),
            error: event.is_error(),
        }
    }
}

pub(crate) struct Reactor {
    poll: Poll,
    listener: Listener,
    control: ControlReceiver,
    connections: HashMap<Token, Connection>,
    next_token: usize,
    routes: RouteTable,
    config: ServerConfig,
}

impl Reactor {
    pub(crate) fn new(
        mut listener: Listener,
        mut control: ControlReceiver,
        routes: RouteTable,
        config: ServerConfig,
    ) -> Result<Self, ServerError> {
        let poll = Poll::new().map_err(|source| ServerError::Poll { source })?;
        poll.registry().register(&mut listener, LISTENER, Interest::READABLE).map_err(|source| ServerError::Register { source })?;
        poll.registry().register(&mut control, CONTROL, Interest::READABLE).map_err(|source| ServerError::Register { source })?;

        Ok(Self { poll, listener, control, connections: HashMap::new(), next_token: FIRST_CONNECTION, routes, config })
    }

    /// Runs until a shutdown command arrives.
    pub(crate) fn run(mut self) -> Result<(), ServerError> {
        info!(path = self.listener.path(), routes = self.routes.len(), "reactor started");

        let mut events = Events::with_capacity(self.config.events_capacity);
        let mut running = true;
        while running {
            match self.poll.poll(&mut events, None) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => return Err(ServerError::Poll { source }),
            }

            for event in &events {
                match event.token() {
                    CONTROL => running &= !self.handle_control()?,
                    LISTENER => self.accept_all(),
                    token => self.handle_connection(token, Readiness::from(event)),
                }
            }

            self.remove_closed();
        }

        self.close_all();
        info!(path = self.listener.path(), "reactor stopped");
        Ok(())
    }

    /// Returns `true` when the reactor should stop.
    fn handle_control(&mut self) -> Result<bool, ServerError> {
        let commands = self.control.recv()?;
        Ok(commands.contains(&ControlCommand::Shutdown))
    }

    fn accept_all(&mut self) {
        loop {
            let socket = match self.listener.accept() {
                Ok(Some(socket)) => socket,
                Ok(None) => return,
                Err(e) => {
                    // the edge that reported the backlog is spent; without re-arming, queued
                    // connections wait until another client connects
                    warn!(cause = %e, "failed to accept connection");
                    self.rearm_listener();
                    return;
                }
            };

            let token = Token(self.next_token);
            self.next_token += 1;

            let mut connection = Connection::new(socket, self.config.limits);
            if let Err(e) = self.poll.registry().register(connection.socket_mut(), token, Interest::READABLE) {
                warn!(cause = %e, "failed to register connection");
                connection.close();
                continue;
            }

            debug!(token = token.0, "accepted connection");
            self.connections.insert(token, connection);
        }
    }

    /// Registers the listener again so pending connections are reported on the next poll.
    fn rearm_listener(&mut self) {
        if let Err(e) = self.poll.registry().reregister(&mut self.listener, LISTENER, Interest::READABLE) {
            warn!(cause = %e, "failed to re-arm listener");
        }
    }

    fn handle_connection(&mut self, token: Token, readiness: Readiness) {
        let Some(connection) = self.connections.get_mut(&token) else {
            return;
        };

        if readiness.readable && !connection.has_responded() {
            let response = match connection.poll_request() {
                Ok(Some(request)) => Some(dispatch(&self.routes, &request)),
                Ok(None) => None,
                Err(e) => Some(error_response(&e)),
            };

            if let Some(mut response) = response {
                finalize_response(&mut response);
                if connection.send_response(&response) == WriteStatus::Pending {
                    trace!(token = token.0, "response queued, waiting for write readiness");
                    let interest = Interest::READABLE | Interest::WRITABLE;
                    if let Err(e) = self.poll.registry().reregister(connection.socket_mut(), token, interest) {
                        warn!(cause = %e, "failed to watch connection for writes");
                        connection.close();
                    }
                }
            } else if connection.is_peer_closed() {
                trace!(token = token.0, "peer closed before sending a complete request");
                connection.close();
            }
        }

        if readiness.writable && connection.has_pending_writes() {
            connection.flush();
        }

        let hang_up = readiness.error || readiness.write_closed || (readiness.read_closed && !connection.has_pending_writes());
        if hang_up && !connection.is_closed() {
            trace!(token = token.0, "peer hung up");
            connection.close();
        }
    }

    fn remove_closed(&mut self) {
        let closed: Vec<Token> = self.connections.iter().filter(|(_, connection)| connection.is_closed()).map(|(token, _)| *token).collect();

        for token in closed {
            if let Some(mut connection) = self.connections.remove(&token) {
                if let Err(e) = self.poll.registry().deregister(connection.socket_mut()) {
                    trace!(cause = %e, "failed to deregister connection");
                }
                debug!(token = token.0, "closed connection");
            }
        }
    }

    fn close_all(&mut self) {
        for connection in self.connections.values_mut() {
            connection.close();
        }
        self.remove_closed();
    }
}
