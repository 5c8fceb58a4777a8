use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// How long a writer waits for the store lock before giving up. The original
/// service blocked indefinitely; a bounded wait turns a wedged peer into a
/// reportable error instead of a stalled request.
pub const WRITE_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub enum LockError {
    Timeout(PathBuf),
    Io(std::io::Error),
}

impl std::fmt::Display for LockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockError::Timeout(path) => {
                write!(f, "timed out waiting for store lock: {}", path.display())
            }
            LockError::Io(err) => write!(f, "store lock I/O error: {}", err),
        }
    }
}

impl std::error::Error for LockError {}

impl From<std::io::Error> for LockError {
    fn from(value: std::io::Error) -> Self {
        LockError::Io(value)
    }
}

/// Lockfile sitting next to the primary document. Mutating operations hold it
/// for their whole write; readers rely on atomic rename and never take it.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
    _file: File,
}

pub fn lock_path(primary: &Path) -> PathBuf {
    let mut name = primary
        .file_name()
        .map(|value| value.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    primary.with_file_name(name)
}

impl StoreLock {
    pub fn acquire(primary: &Path) -> Result<Self, LockError> {
        Self::acquire_with_timeout(primary, WRITE_LOCK_TIMEOUT)
    }

    pub fn acquire_with_timeout(primary: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = lock_path(primary);
        let start = Instant::now();
        loop {
            match try_acquire(&path)? {
                Some(guard) => return Ok(guard),
                None if start.elapsed() >= timeout => {
                    return Err(LockError::Timeout(path));
                }
                None => thread::sleep(Duration::from_millis(10)),
            }
        }
    }

    pub fn try_acquire(primary: &Path) -> Result<Option<Self>, LockError> {
        try_acquire(&lock_path(primary))
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn try_acquire(path: &Path) -> Result<Option<StoreLock>, LockError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => Ok(Some(StoreLock {
            path: path.to_path_buf(),
            _file: file,
        })),
        Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(None),
        Err(err) => Err(LockError::Io(err)),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use uuid::Uuid;

    use super::{lock_path, StoreLock};

    fn primary_path() -> PathBuf {
        std::env::temp_dir().join(format!("notekeep-lock-test-{}.json", Uuid::now_v7()))
    }

    #[test]
    fn lock_path_sits_next_to_the_primary() {
        let primary = PathBuf::from("/srv/notemod/data.json");
        assert_eq!(
            lock_path(&primary),
            PathBuf::from("/srv/notemod/data.json.lock")
        );
    }

    #[test]
    fn try_acquire_is_non_blocking() {
        let primary = primary_path();
        let first = StoreLock::try_acquire(&primary)
            .expect("initial lock should not fail")
            .expect("initial lock should succeed");
        let second = StoreLock::try_acquire(&primary).expect("second lock call should not fail");
        assert!(second.is_none());
        drop(first);
        let _ = std::fs::remove_file(lock_path(&primary));
    }

    #[test]
    fn acquire_times_out_when_held() {
        let primary = primary_path();
        let first = StoreLock::try_acquire(&primary)
            .expect("initial lock should not fail")
            .expect("initial lock should succeed");
        let err = StoreLock::acquire_with_timeout(&primary, Duration::from_millis(20))
            .expect_err("lock should time out when already held");
        assert!(err.to_string().contains("timed out waiting"));
        drop(first);
        let _ = std::fs::remove_file(lock_path(&primary));
    }

    #[test]
    fn dropping_the_guard_releases_the_lock() {
        let primary = primary_path();
        {
            let _guard = StoreLock::acquire(&primary).expect("lock should acquire");
            assert!(lock_path(&primary).exists());
        }
        assert!(!lock_path(&primary).exists());
        let reacquired = StoreLock::try_acquire(&primary)
            .expect("reacquire should not fail")
            .is_some();
        assert!(reacquired);
        let _ = std::fs::remove_file(lock_path(&primary));
    }
}
