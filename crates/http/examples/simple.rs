//! Serves `/` on `simple.sock` (or the path given as first argument) until Enter is pressed.

use std::error::Error;
use std::io;

use http::StatusCode;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;
use ulocal_http::handler::{HandlerError, make_handler};
use ulocal_http::protocol::{HttpMessage, Request, Response};
use ulocal_http::server::Server;

fn show_request(request: &Request) -> Result<Response, HandlerError> {
    info!(
        method = %request.method(),
        resource = request.resource(),
        content = %String::from_utf8_lossy(request.body()),
        "receiving request"
    );
    Ok(Response::new(StatusCode::OK))
}

fn main() -> Result<(), Box<dyn Error>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let path = std::env::args().nth(1).unwrap_or_else(|| "simple.sock".to_owned());
    let handle = Server::builder().path(path.as_str()).route("/", &["GET", "POST"], make_handler(show_request)).build()?.serve()?;
    info!(path = %path, "listening, press Enter to stop");

    io::stdin().read_line(&mut String::new())?;

    handle.terminate()?;
    handle.wait_until_done()?;
    Ok(())
}
