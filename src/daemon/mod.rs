use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Result;
use listener::{InputEvents, InputListenerModule, XinputEvents};
use pidfile::PidFile;
use sink::EvidenceSink;
use storage::DayLogStorage;
use tokio_util::sync::CancellationToken;
use tracker::TrackerModule;
use tracing::error;

use crate::utils::clock::{Clock, DefaultClock};

pub mod listener;
pub mod pidfile;
pub mod shutdown;
pub mod sink;
pub mod storage;
pub mod tracker;

const LISTENER_RETRY_DELAY: Duration = Duration::from_secs(5);

pub fn pid_file_path(dir: &Path) -> PathBuf {
    dir.join("afkwatch.pid")
}

pub fn day_log_dir(dir: &Path) -> PathBuf {
    dir.join("days")
}

/// Represents the starting point for the daemon. The pid record is held for
/// the whole run; its guard removes it on every exit path, including errors.
pub async fn start_daemon(dir: PathBuf) -> Result<()> {
    let _pid_file = PidFile::acquire(pid_file_path(&dir))?;

    let sink = Arc::new(EvidenceSink::new());
    let storage = DayLogStorage::new(day_log_dir(&dir))?;
    let shutdown_token = CancellationToken::new();

    let listener = create_listener(Arc::clone(&sink), &shutdown_token, DefaultClock);
    let tracker = TrackerModule::new(
        storage,
        Arc::clone(&sink),
        shutdown_token.clone(),
        Box::new(DefaultClock),
    );

    let (_, signal_result, listener_result, tracker_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        shutdown::watch_activity_signal(
            Arc::clone(&sink),
            Box::new(DefaultClock),
            shutdown_token.clone()
        ),
        listener.run(),
        tracker.run(),
    );

    if let Err(e) = signal_result {
        error!("Activity signal watcher got an error {e:?}");
    }
    if let Err(e) = listener_result {
        error!("Input listener got an error {e:?}");
    }
    if let Err(e) = tracker_result {
        error!("Tracker got an error {e:?}");
    }

    Ok(())
}

fn create_listener(
    sink: Arc<EvidenceSink>,
    shutdown_token: &CancellationToken,
    clock: impl Clock,
) -> InputListenerModule<impl FnMut() -> Result<Box<dyn InputEvents>>> {
    InputListenerModule::new(
        || Ok(Box::new(XinputEvents::spawn()?) as Box<dyn InputEvents>),
        sink,
        shutdown_token.clone(),
        LISTENER_RETRY_DELAY,
        Box::new(clock),
    )
}
