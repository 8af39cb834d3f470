//! Utility macros shared by the codec and buffer implementations.

/// Returns early with an error if a condition is not met.
///
/// This is similar to the `assert!` macro, but returns an error instead of panicking.
/// The decoders use it for limit checks where exceeding a bound turns into a
/// [`ParseError`](crate::protocol::ParseError) rather than a crash.
///
/// # Example
///
/// ```ignore
/// ensure!(header_count < limits.max_headers, ParseError::too_many_headers(limits.max_headers));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
