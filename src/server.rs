//! Listener lifecycle: serve on a background task, race it against a shutdown
//! signal, then drain within a deadline or force the connections closed.

use std::future::Future;
use std::io;
use std::time::Duration;

use axum::Router;
use hyper::server::conn::http1;
use hyper_util::{rt::TokioIo, service::TowerToHyperService};
use thiserror::Error;
use tokio::{
    net::TcpListener,
    sync::watch,
    task::{JoinError, JoinSet},
};
use tracing::{debug, info, warn};

type Connections = JoinSet<Result<(), hyper::Error>>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("listening and serving: {0}")]
    Serve(#[from] io::Error),
    #[error("could not stop server gracefully: {0}")]
    ForceClose(#[source] JoinError),
}

/// Serves `app` on `listener` until `signal` resolves or the listener fails.
///
/// A listener failure is returned with no drain; open connections are
/// aborted. Once `signal` resolves the listener is closed and every
/// connection is asked to finish its in-flight request. Connections still
/// open after `shutdown_timeout` are aborted, which drops their sockets and
/// the handlers running on them.
pub async fn run<F>(
    listener: TcpListener,
    app: Router,
    shutdown_timeout: Duration,
    signal: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()>,
{
    let (stop_tx, stop_rx) = watch::channel(false);
    let mut connections = Connections::new();
    tokio::pin!(signal);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(err) if is_connection_error(&err) => {
                        debug!(error = %err, "Accept failed for one connection");
                        continue;
                    }
                    Err(err) => {
                        connections.shutdown().await;
                        return Err(ServerError::Serve(err));
                    }
                };
                debug!(%peer, "Accepted connection");

                let service = TowerToHyperService::new(app.clone());
                let mut stop_rx = stop_rx.clone();
                connections.spawn(async move {
                    let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
                    tokio::pin!(conn);

                    tokio::select! {
                        served = conn.as_mut() => served,
                        // A dropped sender also means stop.
                        _ = stop_rx.changed() => {
                            conn.as_mut().graceful_shutdown();
                            conn.await
                        }
                    }
                });
            }
            Some(joined) = connections.join_next(), if !connections.is_empty() => {
                log_closed(joined);
            }
            () = &mut signal => break,
        }
    }

    info!("Start shutdown");
    drop(listener);
    // Receivers are only dropped with their connections; nobody left to tell.
    let _ = stop_tx.send(true);

    if tokio::time::timeout(shutdown_timeout, drain(&mut connections))
        .await
        .is_ok()
    {
        return Ok(());
    }

    warn!(
        timeout_ms = shutdown_timeout.as_millis(),
        remaining = connections.len(),
        "Graceful shutdown did not complete in time, forcing close"
    );
    connections.abort_all();

    let mut failure = None;
    while let Some(joined) = connections.join_next().await {
        match joined {
            Err(err) if err.is_cancelled() => {}
            Err(err) => failure = Some(err),
            Ok(served) => log_closed(Ok(served)),
        }
    }

    match failure {
        Some(err) => Err(ServerError::ForceClose(err)),
        None => Ok(()),
    }
}

async fn drain(connections: &mut Connections) {
    while let Some(joined) = connections.join_next().await {
        log_closed(joined);
    }
}

fn log_closed(joined: Result<Result<(), hyper::Error>, JoinError>) {
    match joined {
        Ok(Ok(())) => {}
        Ok(Err(err)) => debug!(error = %err, "Connection closed with error"),
        Err(err) => warn!(error = %err, "Connection task failed"),
    }
}

/// Errors that concern a single incoming connection, not the listener.
fn is_connection_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C"),
        () = terminate => info!("Received SIGTERM"),
    }
}
