use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use time::{OffsetDateTime, UtcOffset};

use crate::backups::{self, BackupError, RestoreError};
use crate::categories;
use crate::clock;
use crate::document::Note;
use crate::notes::{self, NewNote};
use crate::settings::{self, Settings, SettingsError, SettingsPatch};
use crate::store::{DocumentStore, StoreError};
use crate::sweeper::{self, Matcher, PurgeMode};
use crate::text;

/// The default category for notes added without one.
const INBOX: &str = "INBOX";

/// Category whose notes never surface through `latest`.
const LOG_CATEGORY: &str = "Logs";

/// Character budget for `--summary` previews.
const PREVIEW_CHARS: usize = 80;

pub struct App {
    config_path: PathBuf,
    settings: Settings,
}

/// Dry-run flavor for the destructive operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DryRun {
    /// Report the names of what would be removed.
    List,
    /// Report only how many would be removed.
    Count,
}

impl DryRun {
    fn label(self) -> &'static str {
        match self {
            DryRun::List => "list",
            DryRun::Count => "count",
        }
    }

    fn purge_mode(run: Option<DryRun>) -> PurgeMode {
        match run {
            None => PurgeMode::Execute,
            Some(DryRun::List) => PurgeMode::DryRunList,
            Some(DryRun::Count) => PurgeMode::DryRunCount,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategorySummary {
    pub id: i64,
    pub name: String,
    pub note_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AddNoteReport {
    pub category: CategorySummary,
    pub note: Note,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategoryListReport {
    pub count: usize,
    pub categories: Vec<CategorySummary>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NoteListItem {
    #[serde(flatten)]
    pub note: Note,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NoteListReport {
    pub count: usize,
    pub notes: Vec<NoteListItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LatestNoteReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<Note>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GetNoteReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<Note>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CleanupReport {
    pub category: String,
    /// Notes the category currently holds; what a destructive run deletes.
    pub matched: usize,
    pub deleted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BackupCreatedReport {
    pub file: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BackupEntry {
    pub file: String,
    /// Modification time rendered in the configured UTC offset.
    pub modified: String,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BackupListReport {
    pub count: usize,
    pub backups: Vec<BackupEntry>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PruneReport {
    pub keep: usize,
    pub deleted: usize,
    pub failed: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored_from: String,
    pub pre_restore_backup: PathBuf,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PurgeReport {
    pub target: &'static str,
    pub mode: &'static str,
    pub matched: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
    pub deleted: usize,
    pub failed: Vec<PathBuf>,
}

impl App {
    pub fn open(config_path: &Path) -> Result<Self, AppError> {
        let settings = settings::load(config_path)?;
        Ok(Self {
            config_path: config_path.to_path_buf(),
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn primary(&self) -> Result<&Path, AppError> {
        self.settings
            .data_path
            .as_deref()
            .ok_or(AppError::NotConfigured)
    }

    fn store(&self) -> Result<DocumentStore, AppError> {
        Ok(DocumentStore::new(self.primary()?))
    }

    fn offset(&self) -> Result<UtcOffset, AppError> {
        self.settings.offset().map_err(AppError::Settings)
    }

    pub fn add_note(
        &self,
        text: &str,
        title: Option<&str>,
        category: Option<&str>,
    ) -> Result<AddNoteReport, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "note text cannot be empty".to_string(),
            ));
        }

        let store = self.store()?;
        let (mut doc, encodings) = store.load()?;

        let now = clock::now_utc();
        let offset = self.offset()?;
        let category_name = non_empty(category).unwrap_or(INBOX);
        let resolved = categories::resolve_or_create(
            &mut doc,
            category_name,
            &self.settings.default_color,
            clock::now_ms(),
        );

        let title = non_empty(title)
            .map(str::to_string)
            .unwrap_or_else(|| clock::title_stamp(now, offset));
        let note = notes::insert(
            &mut doc,
            NewNote {
                id_ms: clock::now_ms(),
                title,
                content: text::sanitize_content(text),
                color: self.settings.default_color.clone(),
                category_id: resolved.id,
                timestamp: clock::note_timestamp(now),
            },
        );

        store.write(&doc, encodings)?;
        Ok(AddNoteReport {
            category: CategorySummary {
                id: resolved.id,
                name: resolved.name,
                note_count: notes::count_in_category(&doc, resolved.id),
            },
            note,
        })
    }

    pub fn list_categories(&self) -> Result<CategoryListReport, AppError> {
        let (doc, _) = self.store()?.load()?;
        let categories: Vec<CategorySummary> = doc
            .categories
            .iter()
            .map(|category| CategorySummary {
                id: category.id,
                name: category.name.clone(),
                note_count: notes::count_in_category(&doc, category.id),
            })
            .collect();
        Ok(CategoryListReport {
            count: categories.len(),
            categories,
        })
    }

    pub fn list_notes(
        &self,
        category: Option<&str>,
        limit: Option<usize>,
        summary: bool,
    ) -> Result<NoteListReport, AppError> {
        let (doc, _) = self.store()?.load()?;

        let category_id = match non_empty(category) {
            None => None,
            Some(name) => match categories::lookup_id(&doc, name) {
                Some(id) => Some(id),
                None => return Ok(category_not_found_listing(name)),
            },
        };

        let mut matched = notes::filter_by_category(&doc, category_id);
        notes::sort_by_recency(&mut matched);
        if let Some(limit) = limit {
            matched.truncate(limit);
        }

        let notes: Vec<NoteListItem> = matched
            .into_iter()
            .map(|note| {
                let preview = summary.then(|| text::preview(&note.content, PREVIEW_CHARS));
                NoteListItem { note, preview }
            })
            .collect();
        Ok(NoteListReport {
            count: notes.len(),
            notes,
            message: None,
        })
    }

    pub fn latest_note(&self, category: Option<&str>) -> Result<LatestNoteReport, AppError> {
        let (doc, _) = self.store()?.load()?;

        let category_id = match non_empty(category) {
            None => None,
            Some(name) if name.eq_ignore_ascii_case(LOG_CATEGORY) => {
                return Ok(LatestNoteReport {
                    note: None,
                    message: Some(format!(
                        "notes in the '{}' category are excluded from latest",
                        LOG_CATEGORY
                    )),
                });
            }
            Some(name) => match categories::lookup_id(&doc, name) {
                Some(id) => Some(id),
                None => {
                    return Ok(LatestNoteReport {
                        note: None,
                        message: Some(format!("category '{}' not found", name)),
                    });
                }
            },
        };

        let excluded = categories::lookup_id(&doc, LOG_CATEGORY);
        match notes::latest(&doc, category_id, excluded) {
            Some(note) => Ok(LatestNoteReport {
                note: Some(note.clone()),
                message: None,
            }),
            None => Ok(LatestNoteReport {
                note: None,
                message: Some("no notes found".to_string()),
            }),
        }
    }

    pub fn get_note(&self, category: &str, title: &str) -> Result<GetNoteReport, AppError> {
        let (doc, _) = self.store()?.load()?;

        let Some(category_id) = categories::lookup_id(&doc, category) else {
            return Ok(GetNoteReport {
                note: None,
                message: Some(format!("category '{}' not found", category)),
            });
        };
        match notes::find_by_title_in_category(&doc, category_id, title) {
            Some(note) => Ok(GetNoteReport {
                note: Some(note.clone()),
                message: None,
            }),
            None => Ok(GetNoteReport {
                note: None,
                message: Some(format!(
                    "note '{}' not found in category '{}'",
                    title, category
                )),
            }),
        }
    }

    /// Bulk delete of every note in a category. Destructive runs demand an
    /// explicit confirmation and, when backups are enabled, a snapshot that
    /// must succeed before anything is removed.
    pub fn cleanup(
        &self,
        category: &str,
        dry_run: Option<DryRun>,
        confirm: bool,
    ) -> Result<CleanupReport, AppError> {
        let store = self.store()?;
        let (mut doc, encodings) = store.load_strict()?;

        let Some(category_id) = categories::lookup_id(&doc, category) else {
            return Ok(CleanupReport {
                category: category.to_string(),
                matched: 0,
                deleted: 0,
                dry_run: dry_run.map(DryRun::label),
                titles: None,
                backup: None,
                message: Some(format!(
                    "category '{}' not found; nothing to delete",
                    category
                )),
            });
        };

        let matched = notes::count_in_category(&doc, category_id);
        match dry_run {
            Some(run) => {
                let titles = match run {
                    DryRun::Count => None,
                    DryRun::List => Some(
                        doc.notes
                            .iter()
                            .filter(|note| note.categories.contains(&category_id))
                            .map(|note| note.title.clone())
                            .collect(),
                    ),
                };
                Ok(CleanupReport {
                    category: category.to_string(),
                    matched,
                    deleted: 0,
                    dry_run: Some(run.label()),
                    titles,
                    backup: None,
                    message: None,
                })
            }
            None => {
                if !confirm {
                    return Err(AppError::InvalidArgument(
                        "cleanup deletes every note in the category; pass --confirm to proceed"
                            .to_string(),
                    ));
                }

                let backup = if self.settings.backup_enabled {
                    let stamp = clock::backup_stamp(clock::now_utc(), self.offset()?);
                    let path = backups::snapshot(
                        self.primary()?,
                        &self.settings.backup_suffix,
                        &stamp,
                    )?;
                    Some(file_name(&path))
                } else {
                    None
                };

                let deleted = notes::delete_by_category(&mut doc, category_id);
                store.write(&doc, encodings)?;
                Ok(CleanupReport {
                    category: category.to_string(),
                    matched,
                    deleted,
                    dry_run: None,
                    titles: None,
                    backup,
                    message: None,
                })
            }
        }
    }

    pub fn backup_create(&self) -> Result<BackupCreatedReport, AppError> {
        let primary = self.primary()?;
        let stamp = clock::backup_stamp(clock::now_utc(), self.offset()?);
        let path = backups::snapshot(primary, &self.settings.backup_suffix, &stamp)?;
        Ok(BackupCreatedReport {
            file: file_name(&path),
            path,
        })
    }

    pub fn backup_list(&self) -> Result<BackupListReport, AppError> {
        let primary = self.primary()?;
        let offset = self.offset()?;
        let listed = backups::list(primary, &self.settings.backup_suffix)?;

        let backups: Vec<BackupEntry> = listed
            .into_iter()
            .map(|info| BackupEntry {
                file: info.file,
                modified: clock::title_stamp(OffsetDateTime::from(info.modified), offset),
                size: info.size,
            })
            .collect();
        Ok(BackupListReport {
            count: backups.len(),
            backups,
        })
    }

    pub fn backup_prune(&self, keep: Option<u32>) -> Result<PruneReport, AppError> {
        let primary = self.primary()?;
        let keep = keep.unwrap_or(self.settings.backup_keep) as usize;
        let outcome = backups::prune(primary, &self.settings.backup_suffix, keep)?;
        Ok(PruneReport {
            keep,
            deleted: outcome.deleted,
            failed: outcome.failed,
        })
    }

    pub fn backup_restore(&self, name: &str) -> Result<RestoreReport, AppError> {
        let primary = self.primary()?;
        let stamp = clock::backup_stamp(clock::now_utc(), self.offset()?);
        let outcome = backups::restore(primary, &self.settings.backup_suffix, name, &stamp)?;
        Ok(RestoreReport {
            restored_from: outcome.restored_from,
            pre_restore_backup: outcome.pre_restore_backup,
        })
    }

    pub fn purge_backups(
        &self,
        dry_run: Option<DryRun>,
        confirm: bool,
    ) -> Result<PurgeReport, AppError> {
        let primary = self.primary()?;
        let matcher = Matcher::backups(primary, &self.settings.backup_suffix).ok_or_else(|| {
            AppError::InvalidArgument("data_path does not name a file".to_string())
        })?;
        self.purge("backups", &parent_dir(primary), matcher, dry_run, confirm)
    }

    pub fn purge_logs(
        &self,
        dry_run: Option<DryRun>,
        confirm: bool,
    ) -> Result<PurgeReport, AppError> {
        let primary = self.primary()?;
        let dir = self
            .settings
            .log_dir
            .clone()
            .unwrap_or_else(|| parent_dir(primary));
        self.purge("logs", &dir, Matcher::logs(), dry_run, confirm)
    }

    fn purge(
        &self,
        target: &'static str,
        dir: &Path,
        matcher: Matcher,
        dry_run: Option<DryRun>,
        confirm: bool,
    ) -> Result<PurgeReport, AppError> {
        if dry_run.is_none() && !confirm {
            return Err(AppError::InvalidArgument(format!(
                "purge deletes matching {} files; pass --confirm to proceed",
                target
            )));
        }

        let mode = DryRun::purge_mode(dry_run);
        let outcome = sweeper::purge(dir, &matcher, Some(self.primary()?), mode)
            .map_err(AppError::Sweep)?;
        Ok(PurgeReport {
            target,
            mode: match mode {
                PurgeMode::Execute => "execute",
                PurgeMode::DryRunList => "list",
                PurgeMode::DryRunCount => "count",
            },
            matched: outcome.matched,
            files: outcome.files,
            deleted: outcome.deleted,
            failed: outcome.failed,
        })
    }

    pub fn config_show(&self) -> &Settings {
        &self.settings
    }

    pub fn config_set(&mut self, patch: SettingsPatch) -> Result<&Settings, AppError> {
        if let Some(raw) = patch.utc_offset.as_deref() {
            if clock::parse_offset(raw).is_none() {
                return Err(AppError::Settings(SettingsError::InvalidOffset(
                    raw.to_string(),
                )));
            }
        }
        self.settings.apply(patch);
        settings::save(&self.config_path, &self.settings)?;
        Ok(&self.settings)
    }
}

fn category_not_found_listing(name: &str) -> NoteListReport {
    NoteListReport {
        count: 0,
        notes: Vec::new(),
        message: Some(format!("category '{}' not found", name)),
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn parent_dir(primary: &Path) -> PathBuf {
    match primary.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[derive(Debug)]
pub enum AppError {
    /// No `data_path` configured; every document operation needs one.
    NotConfigured,
    Settings(SettingsError),
    Store(StoreError),
    Backup(BackupError),
    Restore(RestoreError),
    Sweep(std::io::Error),
    InvalidArgument(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotConfigured => write!(
                f,
                "no data_path configured; run 'config set --data-path <file>' first"
            ),
            AppError::Settings(err) => write!(f, "{}", err),
            AppError::Store(err) => write!(f, "{}", err),
            AppError::Backup(err) => write!(f, "backup error: {}", err),
            AppError::Restore(err) => write!(f, "restore error: {}", err),
            AppError::Sweep(err) => write!(f, "purge error: {}", err),
            AppError::InvalidArgument(message) => write!(f, "{}", message),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::NotConfigured => None,
            AppError::Settings(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Backup(err) => Some(err),
            AppError::Restore(err) => Some(err),
            AppError::Sweep(err) => Some(err),
            AppError::InvalidArgument(_) => None,
        }
    }
}

impl From<SettingsError> for AppError {
    fn from(value: SettingsError) -> Self {
        AppError::Settings(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        AppError::Store(value)
    }
}

impl From<BackupError> for AppError {
    fn from(value: BackupError) -> Self {
        AppError::Backup(value)
    }
}

impl From<RestoreError> for AppError {
    fn from(value: RestoreError) -> Self {
        AppError::Restore(value)
    }
}
