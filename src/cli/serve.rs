//! `modelurl serve`: the example site over HTTP.
//!
//! Every request is dispatched in-process through the site's middleware
//! chain, so macros in HTML responses come out as object URLs.

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use anyhow::Result;
use tiny_http::{Header, Method, Request, Server, StatusCode};

use modelurl::config::cfg;
use modelurl::demo::DemoSite;
use modelurl::site::{Dispatcher, Response};
use modelurl::{debug, log};

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Worker threads answering requests.
const WORKERS: usize = 4;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start
///
/// Before a server is registered the process exits right away; afterwards
/// the request loop is unblocked and drains.
pub fn setup_shutdown_handler() -> Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        if let Some(server) = SERVER.get() {
            log!("serve"; "shutting down...");
            server.unblock();
        } else {
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Check if shutdown has been requested
fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// Bind, register for shutdown and run the request loop until Ctrl+C.
pub fn run_serve(site: Arc<DemoSite>, interface: Option<IpAddr>, port: Option<u16>) -> Result<()> {
    let config = cfg();
    let (server, addr) = bind_with_retry(
        interface.unwrap_or(config.serve.interface),
        port.unwrap_or(config.serve.port),
    )?;
    let server = Arc::new(server);
    let _ = SERVER.set(Arc::clone(&server));

    log!("serve"; "http://{}", addr);
    run_request_loop(&server, site)
}

/// Bind to the specified interface and port, with automatic port retry.
fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }
    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

fn run_request_loop(server: &Server, site: Arc<DemoSite>) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(WORKERS)
        .build()?;

    for request in server.incoming_requests() {
        let site = Arc::clone(&site);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, site.as_ref()) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, site: &DemoSite) -> Result<()> {
    if is_shutdown() {
        let response = tiny_http::Response::empty(StatusCode(503));
        request.respond(response)?;
        return Ok(());
    }

    let url = request.url().to_string();
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url.as_str(), None),
    };
    let response = site.dispatch(path, query);
    debug!("serve"; "{} {} -> {}", request.method(), url, response.status);

    let head = request.method() == &Method::Head;
    request.respond(to_http(response, head))?;
    Ok(())
}

fn to_http(response: Response, head: bool) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let body = if head { Vec::new() } else { response.body.into_bytes() };
    let mut http =
        tiny_http::Response::from_data(body).with_status_code(StatusCode(response.status));
    for (name, value) in &response.headers {
        match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => http.add_header(header),
            Err(()) => debug!("serve"; "dropped invalid header {name}"),
        }
    }
    http
}
