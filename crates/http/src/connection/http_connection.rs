use bytes::BytesMut;
use thiserror::Error;
use tokio_util::codec::Encoder;
use tracing::{trace, warn};

use crate::buffer::BufferError;
use crate::codec::{Decoder, DecoderLimits, RequestDecoder, ResponseEncoder};
use crate::net::{Socket, TransportError, WriteStatus};
use crate::protocol::{ParseError, Request, Response};

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("transport error: {source}")]
    Transport {
        #[from]
        source: TransportError,
    },

    #[error("request error: {source}")]
    Parse {
        #[from]
        source: ParseError,
    },
}

/// A server side connection: one socket and the decoder reading requests from it.
///
/// Each connection answers exactly one request and is closed once the response has been
/// written.
#[derive(Debug)]
pub struct Connection {
    socket: Socket,
    decoder: RequestDecoder,
    peer_closed: bool,
    responded: bool,
}

impl Connection {
    pub fn new(socket: Socket, limits: DecoderLimits) -> Self {
        Self { socket, decoder: RequestDecoder::with_limits(limits), peer_closed: false, responded: false }
    }

    pub fn socket(&self) -> &Socket {
        &self.socket
    }

    pub fn socket_mut(&mut self) -> &mut Socket {
        &mut self.socket
    }

    /// Reads everything available and tries to decode a request.
    ///
    /// While the socket buffer is saturated, decoding and draining alternate: the decoder
    /// moves bytes into its own field accumulators, which frees the buffer for the next drain.
    pub fn poll_request(&mut self) -> Result<Option<Request>, ConnectionError> {
        loop {
            let outcome = self.socket.drain_read()?;
            trace!(bytes = outcome.bytes, eof = outcome.eof, saturated = outcome.saturated, "drained connection");
            if outcome.eof {
                self.peer_closed = true;
            }

            let unread_before = self.socket.buffer().len();
            if let Some(request) = self.decoder.decode(self.socket.buffer_mut())? {
                return Ok(Some(request));
            }

            if !outcome.saturated {
                return Ok(None);
            }

            if outcome.bytes == 0 && self.socket.buffer().len() == unread_before {
                let max_capacity = self.socket.buffer().max_capacity();
                return Err(TransportError::from(BufferError::CapacityExceeded { max_capacity }).into());
            }
        }
    }

    /// Encodes `response` and starts writing it.
    ///
    /// Write failures are logged and close the connection; the caller only sees whether
    /// bytes remain queued.
    pub fn send_response(&mut self, response: &Response) -> WriteStatus {
        self.responded = true;

        let mut dst = BytesMut::new();
        if let Err(e) = ResponseEncoder::new().encode(response, &mut dst) {
            warn!(cause = %e, "failed to encode response");
            self.socket.close();
            return WriteStatus::Complete;
        }

        let result = self.socket.best_effort_write(&dst);
        self.finish_write(result)
    }

    /// Continues writing a queued response.
    pub fn flush(&mut self) -> WriteStatus {
        let result = self.socket.flush();
        self.finish_write(result)
    }

    fn finish_write(&mut self, result: Result<WriteStatus, TransportError>) -> WriteStatus {
        match result {
            Ok(WriteStatus::Pending) => WriteStatus::Pending,
            Ok(WriteStatus::Complete) => {
                self.socket.close();
                WriteStatus::Complete
            }
            Err(e) => {
                warn!(cause = %e, "failed to write response, closing connection");
                self.socket.close();
                WriteStatus::Complete
            }
        }
    }

    /// The peer shut down its writing side.
    pub fn is_peer_closed(&self) -> bool {
        self.peer_closed
    }

    pub fn has_responded(&self) -> bool {
        self.responded
    }

    pub fn has_pending_writes(&self) -> bool {
        self.socket.has_pending_writes()
    }

    pub fn close(&mut self) {
        self.socket.close();
    }

    pub fn is_closed(&self) -> bool {
        self.socket.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferConfig;
    use crate::protocol::HttpMessage;
    use http::{Method, StatusCode};
    use mio::net::UnixStream;

    fn connection(config: &BufferConfig, limits: DecoderLimits) -> (Connection, Socket) {
        let (server, client) = UnixStream::pair().unwrap();
        (Connection::new(Socket::from_stream(server, config), limits), Socket::from_stream(client, config))
    }

    #[test]
    fn request_across_reads() {
        let (mut connection, mut client) = connection(&BufferConfig::default(), DecoderLimits::default());

        client.best_effort_write(b"GET /a HTTP/1.1\r\nHo").unwrap();
        assert!(connection.poll_request().unwrap().is_none());

        client.best_effort_write(b"st: x\r\n\r\n").unwrap();
        let request = connection.poll_request().unwrap().unwrap();
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.resource(), "/a");
        assert!(!connection.is_peer_closed());
    }

    #[test]
    fn body_larger_than_buffer() {
        let (mut connection, mut client) = connection(&BufferConfig::new(16, 32), DecoderLimits::default());
        let body = "b".repeat(1000);

        client.best_effort_write(format!("POST /big HTTP/1.1\r\nContent-Length: 1000\r\n\r\n{body}").as_bytes()).unwrap();

        let request = connection.poll_request().unwrap().unwrap();
        assert_eq!(request.body().len(), 1000);
    }

    #[test]
    fn parse_error_surfaces() {
        let (mut connection, mut client) = connection(&BufferConfig::default(), DecoderLimits::default());

        client.best_effort_write(b"GET / HTTP/3\r\n\r\n").unwrap();
        assert!(matches!(connection.poll_request(), Err(ConnectionError::Parse { .. })));
    }

    #[test]
    fn response_closes_connection() {
        let (mut connection, mut client) = connection(&BufferConfig::default(), DecoderLimits::default());

        let status = connection.send_response(&Response::new(StatusCode::NO_CONTENT));
        assert_eq!(status, WriteStatus::Complete);
        assert!(connection.is_closed());
        assert!(connection.has_responded());

        let outcome = client.drain_read().unwrap();
        assert!(outcome.eof);
        assert_eq!(client.buffer().unread(), b"HTTP/1.1 204 No Content\r\n\r\n");
    }

    #[test]
    fn peer_hang_up_detected() {
        let (mut connection, mut client) = connection(&BufferConfig::default(), DecoderLimits::default());
        client.close();

        assert!(connection.poll_request().unwrap().is_none());
        assert!(connection.is_peer_closed());
    }
}
