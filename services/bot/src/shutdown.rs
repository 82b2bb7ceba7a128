//! services/bot/src/shutdown.rs
//!
//! Turns SIGINT and SIGTERM into a cancellation shared by the dispatcher and the relay.

use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Registers the signal handlers and returns a future that resolves with the
/// name of the first signal received.
///
/// Must be called inside a Tokio runtime.
pub fn shutdown_signal() -> std::io::Result<impl Future<Output = &'static str>> {
    #[cfg(unix)]
    let mut terminate =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    Ok(async move {
        #[cfg(unix)]
        let terminate = async move {
            terminate.recv().await;
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            Ok(()) = tokio::signal::ctrl_c() => "SIGINT",
            () = terminate => "SIGTERM",
        }
    })
}

/// Cancels `token` when the process receives SIGINT or SIGTERM.
pub fn cancel_on_signal(token: CancellationToken) -> std::io::Result<()> {
    let signal = shutdown_signal()?;
    tokio::spawn(async move {
        let name = signal.await;
        info!("Received {}, shutting down", name);
        token.cancel();
    });
    Ok(())
}
