use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::document::{self, Document, FieldEncodings};
use crate::locks::{LockError, StoreLock};

#[derive(Debug)]
pub enum StoreError {
    /// Primary file missing, unreadable, or unwritable.
    Unavailable { path: PathBuf, source: std::io::Error },
    /// Primary bytes are not valid JSON; only raised on strict loads.
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    Encode(serde_json::Error),
    Lock(LockError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable { path, source } => {
                write!(f, "store unavailable at {}: {}", path.display(), source)
            }
            StoreError::Corrupt { path, source } => {
                write!(f, "store corrupt at {}: {}", path.display(), source)
            }
            StoreError::Encode(err) => write!(f, "document encode error: {}", err),
            StoreError::Lock(err) => write!(f, "{}", err),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Unavailable { source, .. } => Some(source),
            StoreError::Corrupt { source, .. } => Some(source),
            StoreError::Encode(err) => Some(err),
            StoreError::Lock(err) => Some(err),
        }
    }
}

impl From<LockError> for StoreError {
    fn from(value: LockError) -> Self {
        StoreError::Lock(value)
    }
}

/// Handle on the primary document file. Stateless between calls: every
/// request re-reads the file, so there is no cache to invalidate.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and leniently decodes the whole document. Readers intentionally
    /// take no [`StoreLock`]: the rename-based writer guarantees the bytes
    /// read are a complete document, never a half-write, and a shared lock
    /// here would serialize readers against writers for no added safety.
    pub fn load(&self) -> Result<(Document, FieldEncodings), StoreError> {
        let raw = self.read_bytes()?;
        Ok(document::decode(&raw))
    }

    /// Like [`load`](Self::load) but surfaces outer-JSON corruption; used by
    /// maintenance operations that must not treat garbage as an empty store.
    pub fn load_strict(&self) -> Result<(Document, FieldEncodings), StoreError> {
        let raw = self.read_bytes()?;
        document::decode_strict(&raw).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Serializes and atomically replaces the primary file, holding the store
    /// lock for the whole write so concurrent writers serialize.
    pub fn write(&self, doc: &Document, encodings: FieldEncodings) -> Result<(), StoreError> {
        let bytes = document::encode(doc, encodings).map_err(StoreError::Encode)?;
        let _guard = StoreLock::acquire(&self.path)?;
        write_atomic(&self.path, &bytes).map_err(|source| StoreError::Unavailable {
            path: self.path.clone(),
            source,
        })
    }

    fn read_bytes(&self) -> Result<Vec<u8>, StoreError> {
        std::fs::read(&self.path).map_err(|source| StoreError::Unavailable {
            path: self.path.clone(),
            source,
        })
    }
}

/// Temp-file-write-then-rename; a crash mid-write never leaves a partial
/// document at the final path.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp_name = path
        .file_name()
        .map(|value| value.to_os_string())
        .unwrap_or_default();
    tmp_name.push(format!(".tmp-{}", short_token()));
    let tmp = path.with_file_name(tmp_name);

    std::fs::write(&tmp, bytes)?;
    match std::fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(err) => {
            let _ = std::fs::remove_file(&tmp);
            Err(err)
        }
    }
}

/// Short random token for temp names and filename collision disambiguation.
pub fn short_token() -> String {
    let id = Uuid::now_v7().simple().to_string();
    id[id.len() - 8..].to_string()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use uuid::Uuid;

    use super::{write_atomic, DocumentStore, StoreError};
    use crate::document::{Category, FieldEncoding};

    fn workspace() -> PathBuf {
        let root = std::env::temp_dir().join(format!("notekeep-store-test-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&root).expect("workspace should be creatable");
        root
    }

    #[test]
    fn load_fails_when_primary_is_missing() {
        let store = DocumentStore::new(workspace().join("missing.json"));
        let err = store.load().expect_err("missing primary should fail");
        assert!(matches!(err, StoreError::Unavailable { .. }));
    }

    #[test]
    fn load_is_lenient_but_strict_load_surfaces_corruption() {
        let root = workspace();
        let path = root.join("data.json");
        std::fs::write(&path, b"{definitely broken").expect("fixture should write");

        let store = DocumentStore::new(&path);
        let (doc, _) = store.load().expect("lenient load should succeed");
        assert!(doc.notes.is_empty());

        let err = store
            .load_strict()
            .expect_err("strict load should surface corruption");
        assert!(matches!(err, StoreError::Corrupt { .. }));

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn write_round_trips_through_load() {
        let root = workspace();
        let path = root.join("data.json");
        std::fs::write(&path, br#"{"categories":"[]","notes":"[]","theme":"dark"}"#)
            .expect("fixture should write");

        let store = DocumentStore::new(&path);
        let (mut doc, encodings) = store.load().expect("load should succeed");
        assert_eq!(encodings.categories, FieldEncoding::StringEncoded);

        doc.categories.push(Category {
            id: 123,
            name: "INBOX".to_string(),
            color: "3478bd".to_string(),
            extra: serde_json::Map::new(),
        });
        store.write(&doc, encodings).expect("write should succeed");

        let (reloaded, reloaded_encodings) = store.load().expect("reload should succeed");
        assert_eq!(reloaded, doc);
        assert_eq!(reloaded_encodings, encodings);
        assert_eq!(
            reloaded.extra.get("theme"),
            Some(&serde_json::json!("dark"))
        );

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn atomic_write_leaves_no_temp_files_behind() {
        let root = workspace();
        let path = root.join("data.json");
        write_atomic(&path, b"{}").expect("atomic write should succeed");
        assert_eq!(std::fs::read(&path).expect("file should read"), b"{}");

        let leftovers: Vec<_> = std::fs::read_dir(&root)
            .expect("dir should list")
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .contains(".tmp-")
            })
            .collect();
        assert!(leftovers.is_empty());

        let _ = std::fs::remove_dir_all(root);
    }
}
