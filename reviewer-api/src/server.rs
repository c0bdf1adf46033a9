//! HTTP server run loop with graceful shutdown

use std::future::Future;
use std::io;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::error::ApiError;

/// Serve `app` on `listener` until `shutdown` resolves.
///
/// After the signal, in-flight requests get `grace` to finish. Handlers still
/// running then are dropped and their clients get `UNAVAILABLE`.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F, grace: Duration) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "HTTP server listening");
    }

    let signalled = CancellationToken::new();
    let grace_elapsed = CancellationToken::new();

    let app = app.layer(middleware::from_fn_with_state(
        grace_elapsed.clone(),
        cancel_after_grace,
    ));

    let draining = signalled.clone();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown.await;
        tracing::info!("Shutdown signal received, draining connections");
        draining.cancel();
    });

    let mut task = tokio::spawn(async move { server.await });

    let deadline = async move {
        signalled.cancelled().await;
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        joined = &mut task => match joined {
            Ok(result) => {
                tracing::info!("HTTP server stopped");
                result
            }
            Err(e) => Err(io::Error::other(e)),
        },
        _ = deadline => {
            tracing::warn!(grace = ?grace, "Grace period elapsed, cancelling in-flight requests");
            grace_elapsed.cancel();
            task.abort();
            Ok(())
        }
    }
}

/// Drop the handler future once the grace period is over
async fn cancel_after_grace(
    State(grace_elapsed): State<CancellationToken>,
    req: Request,
    next: Next,
) -> Response {
    tokio::select! {
        resp = next.run(req) => resp,
        _ = grace_elapsed.cancelled() => ApiError::Unavailable.into_response(),
    }
}
