//! Per-day activity logs. Each calendar date gets one append-only text file
//! named `YYYY-MM-DD`, holding the `HH:MM` labels of the windows that were
//! active, one per line in chronological order.

use std::{
    future::Future,
    io::{ErrorKind, SeekFrom},
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::NaiveDate;
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncSeekExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, warn};

use crate::utils::{
    time::date_to_log_name,
    window::{Window, WINDOW_MINUTES},
};

/// Interface for abstracting storage of per-day activity logs.
pub trait ActivityLog {
    /// Records `window` as active in its day log. Repeated calls for the
    /// same window, including across process restarts, leave exactly one
    /// line behind.
    fn append(&self, window: Window) -> impl Future<Output = Result<()>> + Send;

    /// Minutes of recorded activity for `date`. A missing or unreadable day
    /// log means no recorded activity, not an error.
    fn count_active_minutes(&self, date: NaiveDate) -> impl Future<Output = u32> + Send;
}

/// The filesystem realization of [ActivityLog].
pub struct DayLogStorage {
    log_dir: PathBuf,
}

impl DayLogStorage {
    pub fn new(log_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&log_dir)?;

        Ok(Self { log_dir })
    }

    fn log_path(&self, date: NaiveDate) -> PathBuf {
        self.log_dir.join(date_to_log_name(date))
    }

    async fn append_inner(path: &Path, label: &str) -> Result<()> {
        let mut file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .await?;

        // The lock covers the read-check-append sequence so a concurrent
        // reader never sees a torn line.
        file.lock_exclusive()?;
        let result = Self::append_with_file(&mut file, label).await;
        file.unlock_async().await?;
        result
    }

    async fn append_with_file(file: &mut File, label: &str) -> Result<()> {
        if last_non_empty_line(file).await?.as_deref() == Some(label) {
            debug!("Window {label} is already recorded");
            return Ok(());
        }

        file.seek(SeekFrom::End(0)).await?;
        file.write_all(format!("{label}\n").as_bytes()).await?;
        file.flush().await?;
        // One whole line per write plus a data sync, so a crash can't leave
        // a partial label behind.
        file.sync_data().await?;
        Ok(())
    }

    async fn count_lines(path: &Path) -> Result<u32, std::io::Error> {
        let file = match File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };
        file.lock_shared()?;
        let mut lines = BufReader::new(file).lines();
        let mut count = 0;
        while let Some(line) = lines.next_line().await? {
            if !line.trim().is_empty() {
                count += 1;
            }
        }
        lines.into_inner().into_inner().unlock_async().await?;
        Ok(count)
    }
}

async fn last_non_empty_line(file: &mut File) -> Result<Option<String>, std::io::Error> {
    file.seek(SeekFrom::Start(0)).await?;
    let mut lines = BufReader::new(&mut *file).lines();
    let mut last = None;
    // A read error propagates rather than passing for "no last line": a
    // misread here would break the idempotence check and duplicate a label.
    while let Some(line) = lines.next_line().await? {
        if !line.trim().is_empty() {
            last = Some(line);
        }
    }
    Ok(last)
}

impl ActivityLog for DayLogStorage {
    async fn append(&self, window: Window) -> Result<()> {
        let path = self.log_path(window.start().date_naive());
        Self::append_inner(&path, &window.label()).await
    }

    async fn count_active_minutes(&self, date: NaiveDate) -> u32 {
        let path = self.log_path(date);
        match Self::count_lines(&path).await {
            Ok(count) => count * WINDOW_MINUTES,
            Err(e) => {
                warn!("Couldn't read day log {path:?}: {e}");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Local, NaiveDate, TimeZone};
    use tempfile::tempdir;

    use crate::utils::window::Window;

    use super::{ActivityLog, DayLogStorage};

    fn test_window() -> Window {
        Window::containing(Local.with_ymd_and_hms(2024, 3, 4, 10, 3, 27).unwrap())
    }

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    async fn read_log(storage: &DayLogStorage, date: NaiveDate) -> Vec<String> {
        match tokio::fs::read_to_string(storage.log_path(date)).await {
            Ok(content) => content.lines().map(str::to_owned).collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => vec![],
            Err(e) => panic!("couldn't read log: {e}"),
        }
    }

    #[tokio::test]
    async fn append_is_idempotent() -> Result<()> {
        let dir = tempdir()?;
        let storage = DayLogStorage::new(dir.path().to_owned())?;
        let window = test_window();

        storage.append(window).await?;
        storage.append(window).await?;

        assert_eq!(read_log(&storage, test_date()).await, vec!["10:00"]);
        Ok(())
    }

    #[tokio::test]
    async fn append_is_idempotent_across_restarts() -> Result<()> {
        let dir = tempdir()?;
        let window = test_window();

        {
            let storage = DayLogStorage::new(dir.path().to_owned())?;
            storage.append(window).await?;
        }
        let storage = DayLogStorage::new(dir.path().to_owned())?;
        storage.append(window).await?;

        assert_eq!(read_log(&storage, test_date()).await, vec!["10:00"]);
        Ok(())
    }

    #[tokio::test]
    async fn consecutive_windows_append_in_order() -> Result<()> {
        let dir = tempdir()?;
        let storage = DayLogStorage::new(dir.path().to_owned())?;
        let window = test_window();

        storage.append(window).await?;
        storage.append(window.next()).await?;
        storage.append(window.next()).await?;

        assert_eq!(read_log(&storage, test_date()).await, vec!["10:00", "10:05"]);
        Ok(())
    }

    #[tokio::test]
    async fn count_is_zero_without_a_log() -> Result<()> {
        let dir = tempdir()?;
        let storage = DayLogStorage::new(dir.path().to_owned())?;

        assert_eq!(storage.count_active_minutes(test_date()).await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn count_is_five_minutes_per_line() -> Result<()> {
        let dir = tempdir()?;
        let storage = DayLogStorage::new(dir.path().to_owned())?;

        tokio::fs::write(storage.log_path(test_date()), "10:00\n10:05\n10:10\n").await?;

        assert_eq!(storage.count_active_minutes(test_date()).await, 15);
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_day_log_counts_as_zero() -> Result<()> {
        let dir = tempdir()?;
        let storage = DayLogStorage::new(dir.path().to_owned())?;
        // A directory squatting on the log path makes every read fail.
        tokio::fs::create_dir(storage.log_path(test_date())).await?;

        assert_eq!(storage.count_active_minutes(test_date()).await, 0);
        assert!(storage.append(test_window()).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn windows_on_different_dates_use_different_logs() -> Result<()> {
        let dir = tempdir()?;
        let storage = DayLogStorage::new(dir.path().to_owned())?;
        let late = Window::containing(Local.with_ymd_and_hms(2024, 3, 4, 23, 57, 0).unwrap());

        storage.append(late).await?;
        storage.append(late.next()).await?;

        assert_eq!(read_log(&storage, test_date()).await, vec!["23:55"]);
        let next_day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(read_log(&storage, next_day).await, vec!["00:00"]);
        Ok(())
    }
}
