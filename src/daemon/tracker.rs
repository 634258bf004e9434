use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::{DateTime, Local};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::utils::{clock::Clock, window::Window};

use super::{sink::EvidenceSink, storage::ActivityLog};

/// The window loop. Sleeps until the current five-minute window closes,
/// classifies it against the evidence sink, and persists active windows.
pub struct TrackerModule<L> {
    log: L,
    sink: Arc<EvidenceSink>,
    shutdown: CancellationToken,
    clock: Box<dyn Clock>,
}

impl<L: ActivityLog> TrackerModule<L> {
    pub fn new(
        log: L,
        sink: Arc<EvidenceSink>,
        shutdown: CancellationToken,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            log,
            sink,
            shutdown,
            clock,
        }
    }

    /// A window is active only when evidence falls strictly after its start.
    /// Evidence from before the window opened must not re-trigger a window
    /// that already closed.
    fn is_active(evidence: Option<DateTime<Local>>, window: &Window) -> bool {
        evidence.is_some_and(|at| at > window.start())
    }

    /// Executes the tracker event loop.
    ///
    /// Each iteration re-derives the current window from the clock. If the
    /// process oversleeps past several boundaries (system suspend, heavy
    /// load), the skipped windows are not back-filled.
    pub async fn run(self) -> Result<()> {
        loop {
            let now = self.clock.time();
            let current = Window::containing(now);
            let until_close = current.next().time_until(now);

            if until_close > chrono::Duration::zero() {
                let sleep_for = until_close.to_std().unwrap_or(Duration::ZERO);
                debug!(
                    "Window {} open, sleeping {:?} until it closes",
                    current.label(),
                    sleep_for
                );
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("Tracker stopping");
                        return Ok(());
                    }
                    _ = self.clock.sleep(sleep_for) => ()
                }
            }

            if Self::is_active(self.sink.peek(), &current) {
                info!("Window {} was active", current.label());
                if let Err(e) = self.log.append(current).await {
                    // A failed write must not stop tracking of later windows.
                    error!("Couldn't record window {}: {e:?}", current.label());
                }
            } else {
                debug!("Window {} was inactive", current.label());
            }
        }
    }
}
