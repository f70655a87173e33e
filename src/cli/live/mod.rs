//! `mdlive live`: serve one document and reload the browser on every save.
//!
//! ```text
//! tiny_http (rayon pool) ──reads──► Session ◄──refresh── FsActor ──Reload──► WsActor ──► browsers
//! ```

mod lifecycle;
mod path;
mod response;

pub use response::{Reply, route};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam::channel;
use tiny_http::{Request, Server};
use tokio::sync::mpsc;

use super::args::LiveArgs;
use crate::actor::messages::WsMsg;
use crate::markdown::Processor;
use crate::reload::server::{DEFAULT_WS_PORT, start_ws_server};
use crate::reload::Session;
use crate::{debug, log, logger};

/// Channel buffer size
const CHANNEL_BUFFER: usize = 32;

/// Request handler threads
const HTTP_THREADS: usize = 4;

pub fn run(args: &LiveArgs) -> Result<()> {
    let source = validate_source(&args.file)?;
    let root = std::env::current_dir().context("failed to read the working directory")?;

    let (ws_tx, ws_rx) = mpsc::channel::<WsMsg>(CHANNEL_BUFFER);
    let ws_port = start_ws_server(DEFAULT_WS_PORT, ws_tx.clone())?;
    debug!("live"; "push channel on ws://127.0.0.1:{}", ws_port);

    let session = Arc::new(Session::new(source, Processor::default(), ws_port));
    // A failed first render leaves the loading page up until the next save.
    if let Err(e) = session.refresh() {
        logger::status_error(&format!("failed: {}", session.display_name()), &format!("{e:#}"));
    }

    let (server, addr) = lifecycle::bind_with_retry(args.interface, args.port)?;
    let server = Arc::new(server);
    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    crate::core::register_server(Arc::clone(&server), shutdown_tx);
    log!("live"; "serving {} at http://{}", session.display_name(), addr);

    let actors = lifecycle::spawn_actors(Arc::clone(&session), ws_tx, ws_rx, shutdown_rx);
    run_request_loop(&server, &session, &root)?;
    lifecycle::wait_for_shutdown(actors);
    Ok(())
}

/// The live source must be an existing Markdown file.
fn validate_source(path: &Path) -> Result<PathBuf> {
    if !path.is_file() {
        anyhow::bail!("{} is not a file", path.display());
    }
    if !path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("md")) {
        log!("live"; "{} does not have a .md extension, rendering anyway", path.display());
    }
    Ok(path.to_path_buf())
}

fn run_request_loop(server: &Server, session: &Arc<Session>, root: &Path) -> Result<()> {
    // Requests are answered concurrently so a slow static read never
    // holds up the document.
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(HTTP_THREADS)
        .build()
        .context("failed to create thread pool")?;
    let root = Arc::new(root.to_path_buf());

    for request in server.incoming_requests() {
        let session = Arc::clone(session);
        let root = Arc::clone(&root);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &session, &root) {
                debug!("live"; "request error: {e}");
            }
        });
    }
    Ok(())
}

fn handle_request(request: Request, session: &Session, root: &Path) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::send(request, Reply::unavailable());
    }
    let reply = route(request.method(), request.url(), session, root);
    debug!("live"; "{} {} -> {}", request.method(), request.url(), reply.status);
    response::send(request, reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_source() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("doc.md");
        std::fs::write(&file, "# A").unwrap();

        assert_eq!(validate_source(&file).unwrap(), file);
        assert!(validate_source(dir.path()).is_err());
        assert!(validate_source(&dir.path().join("missing.md")).is_err());
    }
}
