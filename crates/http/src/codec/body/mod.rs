//! Body decoding. Bodies are delimited by `Content-Length` only; chunked transfer encoding
//! is not supported.

mod length_decoder;

pub use length_decoder::LengthDecoder;
