use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

/// Single-instance lock for the daemon. The file holds the decimal pid of
/// the running process so that external notifiers can address it.
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Creates the pid record exclusively. An existing record means another
    /// daemon holds the lock; a stale record has to be removed by hand.
    pub fn acquire(path: PathBuf) -> Result<Self> {
        let mut file = match fs::File::options().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                bail!("Pid file {path:?} already exists. Maybe the daemon is already running?")
            }
            Err(e) => {
                return Err(e).with_context(|| format!("couldn't create pid file {path:?}"))
            }
        };
        write!(file, "{}", std::process::id())?;
        info!("Acquired pid file {path:?}");
        Ok(Self { path })
    }

    /// Reads the pid of the running daemon. `None` when no record exists or
    /// its content isn't a pid.
    pub fn read(path: &Path) -> Option<u32> {
        let content = fs::read_to_string(path).ok()?;
        content.trim().parse().ok()
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                warn!("Couldn't remove pid file {:?}: {e}", self.path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use super::PidFile;

    #[test]
    fn acquire_writes_own_pid() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("afkwatch.pid");

        let _guard = PidFile::acquire(path.clone())?;

        assert_eq!(PidFile::read(&path), Some(std::process::id()));
        Ok(())
    }

    #[test]
    fn second_acquire_fails_fast() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("afkwatch.pid");

        let _guard = PidFile::acquire(path.clone())?;

        assert!(PidFile::acquire(path).is_err());
        Ok(())
    }

    #[test]
    fn drop_removes_the_record() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("afkwatch.pid");

        let guard = PidFile::acquire(path.clone())?;
        assert!(path.exists());

        drop(guard);
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn read_handles_missing_and_garbage_records() -> Result<()> {
        let dir = tempdir()?;
        let missing = dir.path().join("missing.pid");
        assert_eq!(PidFile::read(&missing), None);

        let garbage = dir.path().join("garbage.pid");
        std::fs::write(&garbage, "not a pid")?;
        assert_eq!(PidFile::read(&garbage), None);

        let padded = dir.path().join("padded.pid");
        std::fs::write(&padded, "4242\n")?;
        assert_eq!(PidFile::read(&padded), Some(4242));
        Ok(())
    }
}
