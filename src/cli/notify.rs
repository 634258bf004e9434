use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Result;
use sysinfo::{Pid, Signal, System};
use tracing::{debug, info, warn};

use crate::daemon::{
    listener::{InputEvents, XinputEvents},
    pidfile::PidFile,
};

const NOTIFY_INTERVAL: Duration = Duration::from_secs(1);

/// Best-effort delivery of the activity signal to the daemon named by the
/// pid record. A stale pid gets one re-read-and-retry, after which the
/// notification is dropped. Returns the pid that worked so callers in a loop
/// can skip the record read next time.
pub fn notify_daemon(pid: Option<Pid>, pid_path: &Path) -> Option<Pid> {
    let pid = pid.or_else(|| read_pid(pid_path));
    match pid {
        Some(pid) if send_activity_signal(pid) => Some(pid),
        _ => match read_pid(pid_path) {
            Some(fresh) if send_activity_signal(fresh) => Some(fresh),
            _ => {
                debug!("No running daemon to notify");
                None
            }
        },
    }
}

fn read_pid(pid_path: &Path) -> Option<Pid> {
    PidFile::read(pid_path).map(Pid::from_u32)
}

fn send_activity_signal(pid: Pid) -> bool {
    let system = System::new_all();
    match system.process(pid) {
        Some(process) => process.kill_with(Signal::Hangup).unwrap_or(false),
        None => false,
    }
}

/// Out-of-process evidence source: watches the pointer event stream and
/// forwards activity to the daemon, at most once a second.
pub async fn run_mouse(pid_path: PathBuf) -> Result<()> {
    let mut events = XinputEvents::spawn()?;
    let mut pid = read_pid(&pid_path);
    let mut last_notified: Option<tokio::time::Instant> = None;

    while events.next_event().await? {
        if last_notified.is_some_and(|at| at.elapsed() < NOTIFY_INTERVAL) {
            continue;
        }
        info!("Pointer activity");
        pid = notify_daemon(pid, &pid_path);
        last_notified = Some(tokio::time::Instant::now());
    }

    warn!("Pointer event stream ended");
    Ok(())
}
