use std::path::{Path, PathBuf};

/// What a purge run actually does with its matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeMode {
    /// Delete every match, collecting per-file failures.
    Execute,
    /// Report the matched filenames without deleting.
    DryRunList,
    /// Report only the match count; skips collecting names, which matters
    /// for very large directories.
    DryRunCount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeOutcome {
    pub mode: PurgeMode,
    pub matched: usize,
    /// Present only for [`PurgeMode::DryRunList`].
    pub files: Option<Vec<String>>,
    pub deleted: usize,
    pub failed: Vec<PathBuf>,
}

/// Filename predicate for a sweep. Matching is by filename only; the live
/// primary document is excluded separately by resolved path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Backup files: `<primary filename><suffix>` prefix.
    Prefix(String),
    /// Stale log files by extension.
    Extension(String),
}

impl Matcher {
    pub fn backups(primary: &Path, suffix: &str) -> Option<Self> {
        primary
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| Matcher::Prefix(format!("{name}{suffix}")))
    }

    pub fn logs() -> Self {
        Matcher::Extension(".log".to_string())
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            Matcher::Prefix(prefix) => name.starts_with(prefix.as_str()),
            Matcher::Extension(ext) => name.ends_with(ext.as_str()),
        }
    }
}

/// Files in `dir` matching the predicate, in directory order. `protected`
/// (the live primary) is compared by canonicalized path so a pattern can
/// never sweep up the document it is meant to protect.
pub fn find_matching(
    dir: &Path,
    matcher: &Matcher,
    protected: Option<&Path>,
) -> std::io::Result<Vec<PathBuf>> {
    let protected = protected.and_then(|path| path.canonicalize().ok());

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|value| value.to_str()) else {
            continue;
        };
        if !matcher.matches(name) {
            continue;
        }
        if let Some(protected) = protected.as_ref() {
            if path
                .canonicalize()
                .is_ok_and(|resolved| &resolved == protected)
            {
                continue;
            }
        }
        found.push(path);
    }
    Ok(found)
}

pub fn purge(
    dir: &Path,
    matcher: &Matcher,
    protected: Option<&Path>,
    mode: PurgeMode,
) -> std::io::Result<PurgeOutcome> {
    let matched = find_matching(dir, matcher, protected)?;

    let mut outcome = PurgeOutcome {
        mode,
        matched: matched.len(),
        files: None,
        deleted: 0,
        failed: Vec::new(),
    };

    match mode {
        PurgeMode::DryRunCount => {}
        PurgeMode::DryRunList => {
            outcome.files = Some(
                matched
                    .iter()
                    .filter_map(|path| path.file_name())
                    .map(|name| name.to_string_lossy().into_owned())
                    .collect(),
            );
        }
        PurgeMode::Execute => {
            for path in matched {
                match std::fs::remove_file(&path) {
                    Ok(()) => outcome.deleted += 1,
                    Err(_) => outcome.failed.push(path),
                }
            }
        }
    }
    Ok(outcome)
}
