use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::document;
use crate::locks::{LockError, StoreLock};
use crate::store::{short_token, write_atomic};

/// One backup file as discovered on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub path: PathBuf,
    pub file: String,
    pub modified: SystemTime,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneOutcome {
    pub deleted: usize,
    pub failed: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreOutcome {
    pub restored_from: String,
    /// Snapshot of the primary taken before the swap. Kept on disk even if
    /// the swap itself fails, so the pre-restore state is always recoverable.
    pub pre_restore_backup: PathBuf,
}

#[derive(Debug)]
pub enum BackupError {
    PrimaryUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    Io(std::io::Error),
}

impl fmt::Display for BackupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupError::PrimaryUnreadable { path, source } => {
                write!(f, "backup failed: cannot read {}: {}", path.display(), source)
            }
            BackupError::WriteFailed { path, source } => {
                write!(f, "backup failed: cannot write {}: {}", path.display(), source)
            }
            BackupError::Io(err) => write!(f, "backup I/O error: {}", err),
        }
    }
}

impl Error for BackupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BackupError::PrimaryUnreadable { source, .. } => Some(source),
            BackupError::WriteFailed { source, .. } => Some(source),
            BackupError::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for BackupError {
    fn from(value: std::io::Error) -> Self {
        BackupError::Io(value)
    }
}

#[derive(Debug)]
pub enum RestoreError {
    /// The requested name is not in the current backup listing. Names are
    /// resolved only against that listing, never as raw paths.
    UnknownBackup(String),
    /// The selected backup does not hold a valid JSON document.
    CorruptBackup {
        path: PathBuf,
        source: serde_json::Error,
    },
    BackupUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The mandatory pre-restore snapshot could not be taken; the primary
    /// was left untouched.
    PreRestoreSnapshot(BackupError),
    /// The final swap failed; the rename-based write leaves the primary
    /// intact and the pre-restore snapshot stays on disk.
    Swap {
        path: PathBuf,
        source: std::io::Error,
    },
    Lock(LockError),
    List(BackupError),
}

impl fmt::Display for RestoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestoreError::UnknownBackup(name) => {
                write!(f, "restore failed: unknown backup '{}'", name)
            }
            RestoreError::CorruptBackup { path, source } => {
                write!(
                    f,
                    "restore failed: backup {} is not a valid document: {}",
                    path.display(),
                    source
                )
            }
            RestoreError::BackupUnreadable { path, source } => {
                write!(
                    f,
                    "restore failed: cannot read backup {}: {}",
                    path.display(),
                    source
                )
            }
            RestoreError::PreRestoreSnapshot(err) => {
                write!(f, "restore failed: pre-restore snapshot failed: {}", err)
            }
            RestoreError::Swap { path, source } => {
                write!(
                    f,
                    "restore failed: cannot replace {}: {}",
                    path.display(),
                    source
                )
            }
            RestoreError::Lock(err) => write!(f, "restore failed: {}", err),
            RestoreError::List(err) => write!(f, "restore failed: {}", err),
        }
    }
}

impl Error for RestoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RestoreError::UnknownBackup(_) => None,
            RestoreError::CorruptBackup { source, .. } => Some(source),
            RestoreError::BackupUnreadable { source, .. } => Some(source),
            RestoreError::PreRestoreSnapshot(err) => Some(err),
            RestoreError::Swap { source, .. } => Some(source),
            RestoreError::Lock(err) => Some(err),
            RestoreError::List(err) => Some(err),
        }
    }
}

impl From<LockError> for RestoreError {
    fn from(value: LockError) -> Self {
        RestoreError::Lock(value)
    }
}

fn backup_path(primary: &Path, suffix: &str, stamp: &str) -> PathBuf {
    PathBuf::from(format!("{}{}{}", primary.display(), suffix, stamp))
}

/// Copies the primary to `<primary><suffix><stamp>` via a temp file and
/// rename, so a crash mid-copy never leaves a half-written backup at the
/// final name. A sub-second stamp collision gets a short random suffix.
pub fn snapshot(primary: &Path, suffix: &str, stamp: &str) -> Result<PathBuf, BackupError> {
    let bytes = std::fs::read(primary).map_err(|source| BackupError::PrimaryUnreadable {
        path: primary.to_path_buf(),
        source,
    })?;

    let mut target = backup_path(primary, suffix, stamp);
    if target.exists() {
        target = backup_path(primary, suffix, &format!("{stamp}-{}", short_token()));
    }

    write_atomic(&target, &bytes).map_err(|source| BackupError::WriteFailed {
        path: target.clone(),
        source,
    })?;
    Ok(target)
}

/// Backups of the primary, most recent first by modification time. This
/// ordering drives both retention and restore-candidate display.
pub fn list(primary: &Path, suffix: &str) -> Result<Vec<BackupInfo>, BackupError> {
    let dir = primary.parent().filter(|p| !p.as_os_str().is_empty());
    let dir = dir.unwrap_or_else(|| Path::new("."));
    let prefix = match primary.file_name().and_then(|name| name.to_str()) {
        Some(name) => format!("{name}{suffix}"),
        None => return Ok(Vec::new()),
    };

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(BackupError::Io(err)),
    };

    let mut backups = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|value| value.to_str()) else {
            continue;
        };
        // An in-flight atomic write shares the backup prefix until its
        // rename lands; such temps are never candidates for retention or
        // restore.
        if !name.starts_with(&prefix) || name.contains(".tmp-") {
            continue;
        }
        let metadata = entry.metadata()?;
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        backups.push(BackupInfo {
            path: path.clone(),
            file: name.to_string(),
            modified,
            size: metadata.len(),
        });
    }

    backups.sort_by(|a, b| b.modified.cmp(&a.modified).then(b.file.cmp(&a.file)));
    Ok(backups)
}

/// Keeps the `keep` most recent backups and deletes the rest; `keep == 0`
/// deletes all. Individual deletion failures are collected, not fatal.
pub fn prune(primary: &Path, suffix: &str, keep: usize) -> Result<PruneOutcome, BackupError> {
    let backups = list(primary, suffix)?;
    let mut outcome = PruneOutcome {
        deleted: 0,
        failed: Vec::new(),
    };
    for info in backups.into_iter().skip(keep) {
        match std::fs::remove_file(&info.path) {
            Ok(()) => outcome.deleted += 1,
            Err(_) => outcome.failed.push(info.path),
        }
    }
    Ok(outcome)
}

/// Atomic restore. Strict sequence: resolve the name against the current
/// listing, validate the backup's bytes, take a mandatory snapshot of the
/// current primary, then swap via temp-file-and-rename under the store lock.
pub fn restore(
    primary: &Path,
    suffix: &str,
    name: &str,
    stamp: &str,
) -> Result<RestoreOutcome, RestoreError> {
    let candidates = list(primary, suffix).map_err(RestoreError::List)?;
    let selected = candidates
        .iter()
        .find(|info| info.file == name)
        .ok_or_else(|| RestoreError::UnknownBackup(name.to_string()))?;

    let bytes = std::fs::read(&selected.path).map_err(|source| RestoreError::BackupUnreadable {
        path: selected.path.clone(),
        source,
    })?;
    document::decode_strict(&bytes).map_err(|source| RestoreError::CorruptBackup {
        path: selected.path.clone(),
        source,
    })?;

    let _guard = StoreLock::acquire(primary)?;
    let pre_restore =
        snapshot(primary, suffix, stamp).map_err(RestoreError::PreRestoreSnapshot)?;

    write_atomic(primary, &bytes).map_err(|source| RestoreError::Swap {
        path: primary.to_path_buf(),
        source,
    })?;

    Ok(RestoreOutcome {
        restored_from: selected.file.clone(),
        pre_restore_backup: pre_restore,
    })
}
