use std::{process::Stdio, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::{
    io::{AsyncBufReadExt, BufReader, Lines},
    process::{Child, ChildStdout, Command},
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::utils::clock::Clock;

use super::sink::EvidenceSink;

/// Contract raw input-event streams must implement. Every event counts as
/// evidence that the user is present, regardless of what the event was.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait InputEvents: Send {
    /// Waits for the next event. `Ok(false)` means the stream ended and has
    /// to be reopened.
    async fn next_event(&mut self) -> Result<bool>;
}

/// Reads the X11 input bus through `xinput test-xi2 --root`. Every line the
/// subprocess prints is an input event.
pub struct XinputEvents {
    // Held so the subprocess is killed when the stream is dropped.
    _child: Child,
    lines: Lines<BufReader<ChildStdout>>,
}

impl XinputEvents {
    pub fn spawn() -> Result<Self> {
        let mut child = Command::new("xinput")
            .args(["test-xi2", "--root"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .context("couldn't spawn xinput")?;
        let stdout = child
            .stdout
            .take()
            .context("xinput stdout wasn't captured")?;

        Ok(Self {
            _child: child,
            lines: BufReader::new(stdout).lines(),
        })
    }
}

#[async_trait]
impl InputEvents for XinputEvents {
    async fn next_event(&mut self) -> Result<bool> {
        Ok(self.lines.next_line().await?.is_some())
    }
}

/// Background task that drains an input-event stream into the
/// [EvidenceSink] for the lifetime of the daemon.
///
/// An unavailable stream must not take the daemon down: the signal-based
/// evidence path keeps working, so open failures and broken streams are
/// logged and retried after a delay.
pub struct InputListenerModule<F> {
    open_stream: F,
    sink: Arc<EvidenceSink>,
    shutdown: CancellationToken,
    retry_delay: Duration,
    clock: Box<dyn Clock>,
}

impl<F> InputListenerModule<F>
where
    F: FnMut() -> Result<Box<dyn InputEvents>>,
{
    pub fn new(
        open_stream: F,
        sink: Arc<EvidenceSink>,
        shutdown: CancellationToken,
        retry_delay: Duration,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            open_stream,
            sink,
            shutdown,
            retry_delay,
            clock,
        }
    }

    /// Executes the listener event loop until shutdown.
    pub async fn run(mut self) -> Result<()> {
        loop {
            let mut stream = match (self.open_stream)() {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("Couldn't open the input event stream: {e:?}");
                    if self.pause().await {
                        continue;
                    }
                    return Ok(());
                }
            };
            info!("Input event stream opened");

            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => return Ok(()),
                    event = stream.next_event() => match event {
                        Ok(true) => self.sink.record(self.clock.time()),
                        Ok(false) => {
                            warn!("Input event stream ended");
                            break;
                        }
                        Err(e) => {
                            warn!("Error reading input events: {e:?}");
                            break;
                        }
                    }
                }
            }

            if !self.pause().await {
                return Ok(());
            }
        }
    }

    /// Waits out the retry delay. Returns false when shutdown was requested
    /// in the meantime.
    async fn pause(&self) -> bool {
        tokio::select! {
            _ = self.shutdown.cancelled() => false,
            _ = self.clock.sleep(self.retry_delay) => true,
        }
    }
}
