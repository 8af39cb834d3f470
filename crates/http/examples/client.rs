//! Sends one request and prints the response.
//!
//! ```text
//! client SOCKET_PATH METHOD RESOURCE [HEADER_NAME HEADER_VALUE]... [CONTENT]
//! ```

use std::error::Error;
use std::process::ExitCode;

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use tracing::{Level, error};
use tracing_subscriber::FmtSubscriber;
use ulocal_http::client::Client;
use ulocal_http::protocol::HttpMessage;

const USAGE: &str = "client SOCKET_PATH METHOD RESOURCE [HEADER_NAME HEADER_VALUE]... [CONTENT]";

fn main() -> ExitCode {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::WARN).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install subscriber: {e}");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 {
        println!("{USAGE}");
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(cause = %e, "request failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), Box<dyn Error>> {
    let (path, method, resource, rest) = (&args[0], &args[1], &args[2], &args[3..]);

    let mut pairs = rest.chunks_exact(2);
    let mut headers = HeaderMap::new();
    for pair in pairs.by_ref() {
        let name = HeaderName::from_bytes(pair[0].as_bytes())?;
        let value = HeaderValue::from_str(&pair[1])?;
        headers.entry(name).or_insert(value);
    }
    let content = pairs.remainder().first().cloned().unwrap_or_default();

    let method = Method::from_bytes(method.as_bytes())?;
    let response = Client::new(path.as_str()).send_request(method, resource, content, headers)?;

    println!("HTTP/1.1 {} {}", response.status().as_str(), response.reason());
    for (name, value) in response.headers() {
        println!("{name}: {}", String::from_utf8_lossy(value.as_bytes()));
    }
    println!();
    println!("{}", String::from_utf8_lossy(response.body()));
    Ok(())
}
