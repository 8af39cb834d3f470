//! Synchronous one-shot client.
//!
//! Every call connects, writes one request, waits for one complete response and drops the
//! connection. Waiting uses the same readiness machinery as the server, on a single socket
//! and without a timeout.

use std::io;

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Method};
use mio::{Events, Interest, Poll, Token};
use thiserror::Error;
use tokio_util::codec::Encoder;
use tracing::trace;

use crate::buffer::{BufferConfig, BufferError};
use crate::codec::{Decoder, DecoderLimits, RequestEncoder, ResponseDecoder};
use crate::net::{Socket, TransportError, WriteStatus};
use crate::protocol::{HttpMessage, ParseError, Request, Response, SendError};

const SOCKET: Token = Token(0);
const EVENTS_CAPACITY: usize = 16;

#[derive(Error, Debug)]
pub enum RequestError {
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

    #[error("invalid response: {source}")]
    Parse {
        #[from]
        source: ParseError,
    },

    #[error("failed to encode request: {source}")]
    Encode {
        #[from]
        source: SendError,
    },

    #[error("server closed connection unexpectedly")]
    ServerClosed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientConfig {
    pub buffer: BufferConfig,
    pub limits: DecoderLimits,
}

#[derive(Debug, Clone)]
pub struct Client {
    path: String,
    config: ClientConfig,
}

impl Client {
    pub fn new(path: impl Into<String>) -> Self {
        Self::with_config(path, ClientConfig::default())
    }

    pub fn with_config(path: impl Into<String>, config: ClientConfig) -> Self {
        Self { path: path.into(), config }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn get(&self, resource: &str) -> Result<Response, RequestError> {
        self.send(Request::new(Method::GET, resource)?)
    }

    pub fn post(&self, resource: &str, body: impl Into<Bytes>) -> Result<Response, RequestError> {
        self.send(Request::new(Method::POST, resource)?.with_body(body))
    }

    /// Builds a request from its parts and sends it. Query arguments in `resource` are parsed.
    pub fn send_request(&self, method: Method, resource: &str, body: impl Into<Bytes>, headers: HeaderMap) -> Result<Response, RequestError> {
        let mut request = Request::new(method, resource)?.with_body(body);
        *request.headers_mut() = headers;
        self.send(request)
    }

    /// Sends `request` and blocks until the complete response has arrived.
    ///
    /// `Content-Length` is added when the body is not empty and the header is missing.
    pub fn send(&self, mut request: Request) -> Result<Response, RequestError> {
        request.calculate_content_length();

        let mut dst = BytesMut::new();
        RequestEncoder::new().encode(&request, &mut dst)?;

        let mut socket = Socket::connect(&self.path, &self.config.buffer)?;
        let mut poll = Poll::new().map_err(|source| RequestError::Poll { source })?;

        let mut write_status = socket.best_effort_write(&dst)?;
        let interest = match write_status {
            WriteStatus::Complete => Interest::READABLE,
            WriteStatus::Pending => Interest::READABLE | Interest::WRITABLE,
        };
        poll.registry().register(&mut socket, SOCKET, interest).map_err(|source| RequestError::Poll { source })?;
        trace!(path = %self.path, method = %request.method(), resource = request.resource(), "sent request");

        let mut decoder = ResponseDecoder::with_limits(self.config.limits);
        let mut events = Events::with_capacity(EVENTS_CAPACITY);
        loop {
            match poll.poll(&mut events, None) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => return Err(RequestError::Poll { source }),
            }

            for event in &events {
                let hang_up = event.is_write_closed() || event.is_error();
                if event.is_readable() || event.is_read_closed() || hang_up {
                    if let Some(response) = read_response(&mut socket, &mut decoder)? {
                        return Ok(response);
                    }
                    if hang_up {
                        return Err(RequestError::ServerClosed);
                    }
                }

                if event.is_writable() && write_status == WriteStatus::Pending {
                    write_status = socket.flush()?;
                    if write_status == WriteStatus::Complete {
                        poll.registry().reregister(&mut socket, SOCKET, Interest::READABLE).map_err(|source| RequestError::Poll { source })?;
                    }
                }
            }
        }
    }
}

/// Drains the socket into the decoder. End of stream before a complete response is an error.
fn read_response(socket: &mut Socket, decoder: &mut ResponseDecoder) -> Result<Option<Response>, RequestError> {
    loop {
        let outcome = socket.drain_read()?;
        let unread_before = socket.buffer().len();
        if let Some(response) = decoder.decode(socket.buffer_mut())? {
            return Ok(Some(response));
        }

        if outcome.eof {
            return Err(RequestError::ServerClosed);
        }
        if !outcome.saturated {
            return Ok(None);
        }
        if outcome.bytes == 0 && socket.buffer().len() == unread_before {
            let max_capacity = socket.buffer().max_capacity();
            return Err(TransportError::from(BufferError::CapacityExceeded { max_capacity }).into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::Listener;
    use http::StatusCode;
    use std::io::{Read, Write};
    use std::os::unix::net::UnixListener;
    use std::thread;

    fn socket_path(dir: &tempfile::TempDir) -> String {
        dir.path().join("client.sock").to_string_lossy().into_owned()
    }

    /// Accepts one connection, reads the request head and writes `reply` in two pieces.
    fn scripted_server(path: &str, reply: &'static [u8], close_early: bool) -> thread::JoinHandle<Vec<u8>> {
        let listener = UnixListener::bind(path).unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut received = vec![0; 1024];
            let n = stream.read(&mut received).unwrap();
            received.truncate(n);

            if !close_early {
                let (head, tail) = reply.split_at(reply.len() / 2);
                stream.write_all(head).unwrap();
                thread::sleep(std::time::Duration::from_millis(20));
                stream.write_all(tail).unwrap();
            }
            received
        })
    }

    #[test]
    fn response_in_pieces() {
        let dir = tempfile::tempdir().unwrap();
        let path = socket_path(&dir);
        let server = scripted_server(&path, b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello", false);

        let response = Client::new(path.as_str()).post("/echo?x=a b", "ping").unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), "hello");

        let received = server.join().unwrap();
        assert_eq!(received, b"POST /echo?x=a%20b HTTP/1.1\r\ncontent-length: 4\r\n\r\nping");
    }

    #[test]
    fn server_closed_without_response() {
        let dir = tempfile::tempdir().unwrap();
        let path = socket_path(&dir);
        let server = scripted_server(&path, b"", true);

        let result = Client::new(path.as_str()).get("/");
        assert!(matches!(result, Err(RequestError::ServerClosed)));
        server.join().unwrap();
    }

    #[test]
    fn connect_failure() {
        let dir = tempfile::tempdir().unwrap();
        let result = Client::new(socket_path(&dir)).get("/");

        assert!(matches!(result, Err(RequestError::Transport { source: TransportError::Connect { .. } })));
    }

    #[test]
    fn invalid_resource_rejected_before_connecting() {
        let dir = tempfile::tempdir().unwrap();
        let _listener = Listener::bind(&socket_path(&dir), 1, BufferConfig::default()).unwrap();

        let result = Client::new(socket_path(&dir)).get("/?a=%zz");
        assert!(matches!(result, Err(RequestError::Parse { .. })));
    }
}
