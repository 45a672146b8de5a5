//! # Lifecycle (C7)
//!
//! Bind, accept, and shut down the medium simulator. Each accepted
//! connection runs in its own task, tracked in the registry so shutdown can
//! reach it; an interrupt signal sets a cooperative stop flag so the accept
//! loop exits on its next 1 s poll, after which every registered write half
//! is shut down and every tracked session task is aborted (a write-only
//! shutdown can't unblock a session's read loop on its own) before the
//! process exits.
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpSocket};

use crate::error::SimError;
use crate::registry::Registry;
use crate::session;

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Binds a TCP listener on `addr` with `SO_REUSEADDR` set.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, SimError> {
    let socket = if addr.is_ipv4() { TcpSocket::new_v4() } else { TcpSocket::new_v6() }
        .map_err(|source| SimError::Bind { addr: addr.to_string(), source })?;
    socket
        .set_reuseaddr(true)
        .map_err(|source| SimError::Bind { addr: addr.to_string(), source })?;
    socket
        .bind(addr)
        .map_err(|source| SimError::Bind { addr: addr.to_string(), source })?;
    socket
        .listen(1024)
        .map_err(|source| SimError::Bind { addr: addr.to_string(), source })
}

/// Runs the accept loop against `listener` until `shutdown` resolves, then
/// closes every registered client transport.
pub async fn serve<F>(listener: TcpListener, shutdown: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    let registry = Arc::new(Registry::new());
    let stop = Arc::new(AtomicBool::new(false));

    {
        let stop = stop.clone();
        tokio::spawn(async move {
            shutdown.await;
            // idempotent: a second signal after the flag is already set is a no-op.
            if !stop.swap(true, Ordering::SeqCst) {
                log::info!("shutdown requested, draining accept loop");
            }
        });
    }

    while !stop.load(Ordering::SeqCst) {
        match tokio::time::timeout(ACCEPT_POLL_INTERVAL, listener.accept()).await {
            Ok(Ok((stream, peer))) => {
                log::info!("accepted connection from {peer}");
                let session_registry = registry.clone();
                let handle = tokio::spawn(async move {
                    session::run(stream, session_registry).await;
                });
                registry.track_session(handle);
            }
            Ok(Err(e)) => {
                log::warn!("accept error: {e}");
            }
            Err(_elapsed) => {
                // 1 s poll timeout; loop back around and re-check the stop flag.
            }
        }
    }

    log::info!("shutting down: closing all client transports");
    registry.close_all().await;
}

/// Binds `addr` and serves until a process interrupt signal requests
/// shutdown.
pub async fn run(addr: SocketAddr) -> Result<(), SimError> {
    let listener = bind(addr).await?;
    log::info!("listening on {addr}");
    serve(listener, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await;
    Ok(())
}
