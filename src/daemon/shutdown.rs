use std::sync::Arc;

use anyhow::Result;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::utils::clock::Clock;

use super::sink::EvidenceSink;

/// Waits for a termination request and cancels the daemon's modules.
#[cfg(unix)]
pub async fn detect_shutdown(cancellation: CancellationToken) {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => select! {
            _ = tokio::signal::ctrl_c() => (),
            _ = terminate.recv() => (),
        },
        Err(e) => {
            error!("Couldn't listen for SIGTERM, falling back to ctrl-c only: {e}");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
    info!("Shutdown requested");
    cancellation.cancel();
}

#[cfg(not(unix))]
pub async fn detect_shutdown(cancellation: CancellationToken) {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown requested");
    cancellation.cancel();
}

/// Watches the out-of-band activity signal (SIGHUP) other processes send to
/// the pid from the pid record. The reaction is exactly one sink write;
/// anything richer happens in the tracker loop at the next boundary.
#[cfg(unix)]
pub async fn watch_activity_signal(
    sink: Arc<EvidenceSink>,
    clock: Box<dyn Clock>,
    shutdown: CancellationToken,
) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    loop {
        select! {
            _ = shutdown.cancelled() => return Ok(()),
            received = hangup.recv() => {
                if received.is_none() {
                    return Ok(());
                }
                let at = clock.time();
                debug!("Registering activity at {at}");
                sink.record(at);
            }
        }
    }
}

/// Platforms without SIGHUP only get in-process evidence.
#[cfg(not(unix))]
pub async fn watch_activity_signal(
    _sink: Arc<EvidenceSink>,
    _clock: Box<dyn Clock>,
    shutdown: CancellationToken,
) -> Result<()> {
    shutdown.cancelled().await;
    Ok(())
}
