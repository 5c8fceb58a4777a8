mod app;
mod backups;
mod categories;
mod cli;
mod clock;
mod document;
mod locks;
mod notes;
mod settings;
mod store;
mod sweeper;
mod text;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("json serialization should work")
    );
}

fn run() -> Result<(), app::AppError> {
    use clap::Parser;
    use cli::{BackupSubcommands, Commands, ConfigSubcommands, PurgeSubcommands};
    use settings::SettingsPatch;

    let cli = cli::Cli::parse();
    let mut app = app::App::open(&cli.config)?;

    match cli.command {
        Commands::Add(args) => {
            let report =
                app.add_note(&args.text, args.title.as_deref(), args.category.as_deref())?;
            print_json(&report);
        }
        Commands::Categories => {
            print_json(&app.list_categories()?);
        }
        Commands::Notes(args) => {
            let report = app.list_notes(args.category.as_deref(), args.limit, args.summary)?;
            print_json(&report);
        }
        Commands::Latest(args) => {
            let report = app.latest_note(args.category.as_deref())?;
            if args.plain {
                print_plain(report.note.as_ref().map(|note| note.content.as_str()), report.message);
            } else {
                print_json(&report);
            }
        }
        Commands::Get(args) => {
            let report = app.get_note(&args.category, &args.title)?;
            if args.plain {
                print_plain(report.note.as_ref().map(|note| note.content.as_str()), report.message);
            } else {
                print_json(&report);
            }
        }
        Commands::Cleanup(args) => {
            let report = app.cleanup(
                &args.category,
                args.dry_run.map(Into::into),
                args.confirm,
            )?;
            print_json(&report);
        }
        Commands::Backup(args) => match args.command {
            BackupSubcommands::Create => print_json(&app.backup_create()?),
            BackupSubcommands::List => print_json(&app.backup_list()?),
            BackupSubcommands::Prune(args) => print_json(&app.backup_prune(args.keep)?),
            BackupSubcommands::Restore(args) => print_json(&app.backup_restore(&args.name)?),
        },
        Commands::Purge(args) => match args.command {
            PurgeSubcommands::Backups(mode) => {
                print_json(&app.purge_backups(mode.dry_run.map(Into::into), mode.confirm)?)
            }
            PurgeSubcommands::Logs(mode) => {
                print_json(&app.purge_logs(mode.dry_run.map(Into::into), mode.confirm)?)
            }
        },
        Commands::Config(args) => match args.command {
            ConfigSubcommands::Show => print_json(app.config_show()),
            ConfigSubcommands::Set(args) => {
                let patch = SettingsPatch {
                    data_path: args.data_path.filter(|p| !p.as_os_str().is_empty()),
                    default_color: non_empty(args.default_color),
                    backup_suffix: non_empty(args.backup_suffix),
                    backup_keep: args.backup_keep,
                    backup_enabled: args.backup_enabled,
                    utc_offset: non_empty(args.utc_offset),
                    log_dir: args.log_dir.filter(|p| !p.as_os_str().is_empty()),
                };
                print_json(app.config_set(patch)?);
            }
        },
    }
    Ok(())
}

/// Empty CLI input never overwrites a stored setting.
fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|value| !value.trim().is_empty())
}

fn print_plain(content: Option<&str>, message: Option<String>) {
    match content {
        Some(content) => println!("{}", text::to_plain_text(content)),
        None => println!("{}", message.unwrap_or_default()),
    }
}
