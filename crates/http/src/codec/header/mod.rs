//! Header block processing shared by requests and responses
//!
//! - [`HeaderDecoder`]: resumable `Name: value` line decoder ending at a blank line
//!   - Enforces the per-field and header count limits
//!   - Keeps the first value of a repeated header
//!
//! - [`HeaderEncoder`]: writes the header lines and the terminating blank line

mod header_decoder;
mod header_encoder;

pub use header_decoder::HeaderDecoder;
pub use header_encoder::FastWrite;
pub use header_encoder::HeaderEncoder;
