use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::UtcOffset;

use crate::clock;
use crate::store::write_atomic;

fn default_color() -> String {
    "3478bd".to_string()
}

fn default_suffix() -> String {
    ".bak-".to_string()
}

fn default_keep() -> u32 {
    20
}

fn default_enabled() -> bool {
    true
}

fn default_offset() -> String {
    "+00:00".to_string()
}

/// Operator configuration, stored as one TOML file read and written
/// wholesale. Replaces the original's in-place regex edits of config source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Absolute path to the primary document. Every operation that touches
    /// notes requires it; missing means the install is not configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_path: Option<PathBuf>,
    #[serde(default = "default_color")]
    pub default_color: String,
    #[serde(default = "default_suffix")]
    pub backup_suffix: String,
    #[serde(default = "default_keep")]
    pub backup_keep: u32,
    #[serde(default = "default_enabled")]
    pub backup_enabled: bool,
    /// UTC offset for backup stamps and default note titles, e.g. `+13:00`.
    #[serde(default = "default_offset")]
    pub utc_offset: String,
    /// Directory swept by the log purge; defaults to the primary's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: None,
            default_color: default_color(),
            backup_suffix: default_suffix(),
            backup_keep: default_keep(),
            backup_enabled: default_enabled(),
            utc_offset: default_offset(),
            log_dir: None,
        }
    }
}

/// Partial update from `config set`. `None` means "leave alone"; the CLI
/// filters empty strings out before building a patch, so an empty input can
/// never blank an existing value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub data_path: Option<PathBuf>,
    pub default_color: Option<String>,
    pub backup_suffix: Option<String>,
    pub backup_keep: Option<u32>,
    pub backup_enabled: Option<bool>,
    pub utc_offset: Option<String>,
    pub log_dir: Option<PathBuf>,
}

impl Settings {
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(value) = patch.data_path {
            self.data_path = Some(value);
        }
        if let Some(value) = patch.default_color {
            self.default_color = value;
        }
        if let Some(value) = patch.backup_suffix {
            self.backup_suffix = value;
        }
        if let Some(value) = patch.backup_keep {
            self.backup_keep = value;
        }
        if let Some(value) = patch.backup_enabled {
            self.backup_enabled = value;
        }
        if let Some(value) = patch.utc_offset {
            self.utc_offset = value;
        }
        if let Some(value) = patch.log_dir {
            self.log_dir = Some(value);
        }
    }

    pub fn offset(&self) -> Result<UtcOffset, SettingsError> {
        clock::parse_offset(&self.utc_offset)
            .ok_or_else(|| SettingsError::InvalidOffset(self.utc_offset.clone()))
    }
}

#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
    InvalidOffset(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(err) => write!(f, "settings I/O error: {}", err),
            SettingsError::Parse(err) => write!(f, "invalid settings TOML: {}", err),
            SettingsError::Serialize(err) => write!(f, "settings serialize error: {}", err),
            SettingsError::InvalidOffset(raw) => {
                write!(f, "invalid utc_offset '{}'; expected e.g. +13:00", raw)
            }
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SettingsError::Io(err) => Some(err),
            SettingsError::Parse(err) => Some(err),
            SettingsError::Serialize(err) => Some(err),
            SettingsError::InvalidOffset(_) => None,
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(value: std::io::Error) -> Self {
        SettingsError::Io(value)
    }
}

/// Missing file loads as defaults; a config is born on first `config set`.
pub fn load(path: &Path) -> Result<Settings, SettingsError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Settings::default());
        }
        Err(err) => return Err(SettingsError::Io(err)),
    };
    toml::from_str(&raw).map_err(SettingsError::Parse)
}

pub fn save(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    let raw = toml::to_string_pretty(settings).map_err(SettingsError::Serialize)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_atomic(path, raw.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use uuid::Uuid;

    use super::{load, save, Settings, SettingsPatch};

    fn config_path() -> PathBuf {
        std::env::temp_dir().join(format!(
            "notekeep-settings-test-{}/notekeep.toml",
            Uuid::now_v7()
        ))
    }

    #[test]
    fn missing_file_loads_defaults() {
        let settings = load(&config_path()).expect("missing settings should load defaults");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.default_color, "3478bd");
        assert_eq!(settings.backup_suffix, ".bak-");
        assert_eq!(settings.backup_keep, 20);
        assert!(settings.backup_enabled);
        assert!(settings.data_path.is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let path = config_path();
        let mut settings = Settings::default();
        settings.data_path = Some(PathBuf::from("/srv/notemod/data.json"));
        settings.utc_offset = "+13:00".to_string();

        save(&path, &settings).expect("settings should save");
        let loaded = load(&path).expect("settings should load");
        assert_eq!(loaded, settings);

        let _ = std::fs::remove_dir_all(path.parent().expect("config should have a parent"));
    }

    #[test]
    fn patch_only_overwrites_supplied_keys() {
        let mut settings = Settings::default();
        settings.data_path = Some(PathBuf::from("/srv/data.json"));
        settings.backup_keep = 7;

        settings.apply(SettingsPatch {
            default_color: Some("ff0000".to_string()),
            ..SettingsPatch::default()
        });

        assert_eq!(settings.default_color, "ff0000");
        assert_eq!(settings.data_path, Some(PathBuf::from("/srv/data.json")));
        assert_eq!(settings.backup_keep, 7);
    }

    #[test]
    fn offset_parses_or_reports_the_bad_value() {
        let mut settings = Settings::default();
        settings.offset().expect("default offset should parse");

        settings.utc_offset = "sideways".to_string();
        let err = settings
            .offset()
            .expect_err("bad offset should be rejected");
        assert!(err.to_string().contains("sideways"));
    }
}
