//! Static server for the current release.
//!
//! Every request is answered with `200 OK`: a path that names no file gets
//! the root `index.html`, so client-side navigation and stale links keep
//! working. Resolution rules live in [`crate::resolve`].
//!
//! # Architecture
//!
//! ```text
//!              ┌──────────────────────────┐
//!              │  Arc<tiny_http::Server>  │
//!              └────────────┬─────────────┘
//!          ┌────────────────┼────────────────┐
//!          ▼                ▼                ▼
//!     worker 0         worker 1   ...   worker N-1
//!          │
//!          ├── pin: canonicalize `_site` → .releases/<id>
//!          ├── lookup(): exact → .html → index.html → fallback
//!          └── respond 200 + Content-Type
//! ```
//!
//! Workers share nothing mutable. A release swap during a request is
//! invisible to it because the release directory is pinned up front.

use crate::{
    config::SiteConfig,
    log,
    resolve::{Page, Resolution, lookup, normalize_request_path},
};
use anyhow::{Context, Result, anyhow};
use std::{
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
    sync::Arc,
    thread,
};
use tiny_http::{Header, Request, Response, Server};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Serve the current release until Ctrl+C.
pub fn serve_site(config: Arc<SiteConfig>) -> Result<()> {
    let interface: IpAddr = config.serve.interface.parse()?;
    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);
    let workers = config.serve.workers.max(1);

    // Each unblock() releases one waiting worker
    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        for _ in 0..workers {
            server_for_signal.unblock();
        }
    })
    .context("Failed to set Ctrl+C handler")?;

    if !config.build.output.exists() {
        log!("warn"; "{} does not exist yet, run `quire build` first", config.build.output.display());
    }
    log!("serve"; "http://{addr} ({workers} workers)");

    let handles: Vec<_> = (0..workers)
        .map(|id| {
            let server = Arc::clone(&server);
            let config = Arc::clone(&config);
            thread::Builder::new()
                .name(format!("quire-serve-{id}"))
                .spawn(move || worker_loop(&server, &config))
                .context("Failed to spawn server worker")
        })
        .collect::<Result<_>>()?;

    for handle in handles {
        handle
            .join()
            .map_err(|_| anyhow!("server worker panicked"))?;
    }

    Ok(())
}

/// Pull requests off the shared server until it is unblocked.
fn worker_loop(server: &Server, config: &SiteConfig) {
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, config) {
            log!("serve"; "request error: {e}");
        }
    }
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                let bound = server.server_addr().to_ip().unwrap_or(addr);
                return Ok((server, bound));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// ============================================================================
// Request Handling
// ============================================================================

/// The release directory the output pointer names right now.
///
/// Falls back to the pointer path itself when it cannot be resolved, which
/// makes every lookup a fallback served from the embedded page.
fn pin_release(output: &Path) -> PathBuf {
    output.canonicalize().unwrap_or_else(|_| output.to_path_buf())
}

/// Resolve a raw request URL against the current release.
fn answer(output: &Path, url: &str) -> (String, Resolution, Page) {
    let root = pin_release(output);
    let path = normalize_request_path(url);
    let (resolution, page) = lookup(&root, &path);
    (path, resolution, page)
}

/// Handle a single HTTP request.
fn handle_request(request: Request, config: &SiteConfig) -> Result<()> {
    let (path, resolution, page) = answer(&config.build.output, request.url());

    if resolution.is_fallback() {
        log!("serve"; "fallback: /{path}");
    } else if config.serve.log_requests {
        log!("serve"; "{} /{path} ({})", request.method(), resolution.rule());
    }

    let header = Header::from_bytes("Content-Type", page.content_type)
        .map_err(|()| anyhow!("invalid content type `{}`", page.content_type))?;
    let response = Response::from_data(page.body).with_header(header);

    request.respond(response)?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
