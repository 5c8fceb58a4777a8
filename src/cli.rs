use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::app::DryRun;

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

#[derive(Debug, Parser)]
#[command(name = "notekeep")]
#[command(bin_name = "notekeep")]
#[command(version)]
#[command(about = "A JSON note-document store with backup and restore")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'c',
        long,
        env = "NOTEKEEP_CONFIG",
        default_value = "notekeep.toml",
        help = "Path to the settings file."
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Add a note to a category, creating the category on demand.")]
    Add(AddArgs),
    #[command(about = "List all categories with their note counts.")]
    Categories,
    #[command(about = "List notes, most recently updated first.")]
    Notes(NotesArgs),
    #[command(about = "Show the most recent note outside the Logs category.")]
    Latest(LatestArgs),
    #[command(about = "Show one note by category and exact title.")]
    Get(GetArgs),
    #[command(about = "Delete every note in a category, snapshotting first.")]
    Cleanup(CleanupArgs),
    #[command(about = "Create, list, prune, or restore document backups.")]
    Backup(BackupArgs),
    #[command(about = "Sweep stale backup or log files from disk.")]
    Purge(PurgeArgs),
    #[command(about = "Show or change settings.")]
    Config(ConfigArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DryRunArg {
    /// Name what would be removed.
    List,
    /// Count what would be removed.
    Count,
}

impl From<DryRunArg> for DryRun {
    fn from(value: DryRunArg) -> Self {
        match value {
            DryRunArg::List => DryRun::List,
            DryRunArg::Count => DryRun::Count,
        }
    }
}

#[derive(Debug, Args)]
#[command(about = "Add a note.")]
pub struct AddArgs {
    #[arg(help = "Note text; escaped and newline-converted before storing.")]
    pub text: String,

    #[arg(short = 't', long, help = "Note title (defaults to a local timestamp).")]
    pub title: Option<String>,

    #[arg(
        short = 'g',
        long,
        help = "Category name, matched case-insensitively (defaults to INBOX)."
    )]
    pub category: Option<String>,
}

#[derive(Debug, Args)]
#[command(about = "List notes.")]
pub struct NotesArgs {
    #[arg(short = 'g', long, help = "Only notes in this category.")]
    pub category: Option<String>,

    #[arg(short = 'n', long, help = "Keep only the most recent N notes.")]
    pub limit: Option<usize>,

    #[arg(long, help = "Attach a short tag-stripped preview to each note.")]
    pub summary: bool,
}

#[derive(Debug, Args)]
#[command(about = "Show the most recent note.")]
pub struct LatestArgs {
    #[arg(short = 'g', long, help = "Only notes in this category.")]
    pub category: Option<String>,

    #[arg(long, help = "Print the note content as plain text instead of JSON.")]
    pub plain: bool,
}

#[derive(Debug, Args)]
#[command(about = "Show one note.")]
pub struct GetArgs {
    #[arg(help = "Category name, matched case-insensitively.")]
    pub category: String,

    #[arg(help = "Exact note title; the first match in document order wins.")]
    pub title: String,

    #[arg(long, help = "Print the note content as plain text instead of JSON.")]
    pub plain: bool,
}

#[derive(Debug, Args)]
#[command(about = "Delete every note in a category.")]
pub struct CleanupArgs {
    #[arg(help = "Category name, matched case-insensitively.")]
    pub category: String,

    #[arg(long, value_enum, help = "Report what would be deleted without deleting.")]
    pub dry_run: Option<DryRunArg>,

    #[arg(long, help = "Required for the destructive run.")]
    pub confirm: bool,
}

#[derive(Debug, Args)]
#[command(about = "Backup operations.")]
pub struct BackupArgs {
    #[command(subcommand)]
    pub command: BackupSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum BackupSubcommands {
    #[command(about = "Snapshot the primary document.")]
    Create,
    #[command(about = "List backups, newest first.")]
    List,
    #[command(about = "Delete all but the newest backups.")]
    Prune(PruneArgs),
    #[command(about = "Replace the primary document with a named backup.")]
    Restore(RestoreArgs),
}

#[derive(Debug, Args)]
#[command(about = "Delete all but the newest backups.")]
pub struct PruneArgs {
    #[arg(short = 'k', long, help = "How many to keep (defaults to backup_keep).")]
    pub keep: Option<u32>,
}

#[derive(Debug, Args)]
#[command(about = "Restore from a backup.")]
pub struct RestoreArgs {
    #[arg(help = "Backup filename as shown by 'backup list'; never a path.")]
    pub name: String,
}

#[derive(Debug, Args)]
#[command(about = "Sweep stale files.")]
pub struct PurgeArgs {
    #[command(subcommand)]
    pub command: PurgeSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum PurgeSubcommands {
    #[command(about = "Delete backup files next to the primary document.")]
    Backups(PurgeModeArgs),
    #[command(about = "Delete .log files from the log directory.")]
    Logs(PurgeModeArgs),
}

#[derive(Debug, Args)]
pub struct PurgeModeArgs {
    #[arg(long, value_enum, help = "Report what would be deleted without deleting.")]
    pub dry_run: Option<DryRunArg>,

    #[arg(long, help = "Required for the destructive run.")]
    pub confirm: bool,
}

#[derive(Debug, Args)]
#[command(about = "Settings.")]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum ConfigSubcommands {
    #[command(about = "Print the current settings.")]
    Show,
    #[command(about = "Change settings; only the keys given are touched.")]
    Set(ConfigSetArgs),
}

#[derive(Debug, Args)]
#[command(about = "Change settings.")]
pub struct ConfigSetArgs {
    #[arg(long, help = "Absolute path to the primary JSON document.")]
    pub data_path: Option<PathBuf>,

    #[arg(long, help = "Hex color for new categories and notes.")]
    pub default_color: Option<String>,

    #[arg(long, help = "Filename suffix separating primary name and stamp.")]
    pub backup_suffix: Option<String>,

    #[arg(long, help = "Default retention for 'backup prune'.")]
    pub backup_keep: Option<u32>,

    #[arg(long, help = "Snapshot before destructive cleanup (true/false).")]
    pub backup_enabled: Option<bool>,

    #[arg(long, help = "UTC offset for stamps, e.g. +13:00.")]
    pub utc_offset: Option<String>,

    #[arg(long, help = "Directory swept by 'purge logs'.")]
    pub log_dir: Option<PathBuf>,
}
