//! Pocket application binary - composition root.
//!
//! 1. Parse the command line and install the tracing subscriber
//! 2. Load configuration from TOML, then apply its log level
//! 3. Open the SQLite record store and build the repository for the
//!    selected entity
//! 4. Run one command, printing a message that names the attempted action
//!    if it fails

mod cli;
mod output;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use pocket_core::config::PocketConfig;
use pocket_core::types::{DeletionPolicy, EntityKind, NewRecord, RecordPatch};
use pocket_core::validation::parse_amount;
use pocket_core::{PocketError, Result};
use pocket_storage::{
    completion_stats, group_by_month, monthly_series, summarize, Database, RecordRepository,
    Visibility,
};
use pocket_sync::{CancelToken, HttpCollaborator, SyncEngine};

use cli::{CliArgs, Command};

/// Exit status when the store cannot be opened at all.
const EXIT_STORAGE_UNAVAILABLE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    let reload_handle = init_tracing(args.log_level.as_deref());

    let config_file = args.resolve_config_path();
    let mut config = PocketConfig::load_or_default(&config_file);

    // Neither RUST_LOG nor --log-level was given: the config file decides.
    if let Some(handle) = reload_handle {
        let level = args.resolve_log_level(&config.general.log_level);
        if let Err(e) = handle.reload(EnvFilter::new(&level)) {
            warn!(level = %level, error = %e, "Failed to apply configured log level");
        }
    }

    if let Some(dir) = args.resolve_data_dir() {
        config.general.data_dir = dir;
    }

    let entity = args.resolve_entity(config.sync.entity);
    let result = match &args.command {
        Command::Init { force } => init_config(&config, &config_file, *force),
        _ => run(&args, &config, entity).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Failed to {}: {}", args.command.action(entity), e);
            if e.is_recoverable() {
                ExitCode::FAILURE
            } else {
                error!(error = %e, "Record store unavailable");
                ExitCode::from(EXIT_STORAGE_UNAVAILABLE)
            }
        }
    }
}

/// Install the subscriber. Returns a reload handle when the filter may still
/// be replaced by the configured level, i.e. when neither `RUST_LOG` nor
/// `--log-level` fixed it.
fn init_tracing(cli_level: Option<&str>) -> Option<reload::Handle<EnvFilter, Registry>> {
    let (initial, fixed) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => match cli_level {
            Some(level) => (EnvFilter::new(level), true),
            None => (EnvFilter::new("info"), false),
        },
    };

    let (filter, handle) = reload::Layer::new(initial);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    (!fixed).then_some(handle)
}

/// Write the effective configuration to `path`.
fn init_config(config: &PocketConfig, path: &std::path::Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(PocketError::Config(format!(
            "{} already exists, pass --force to overwrite",
            path.display()
        )));
    }
    config.save(path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

async fn run(args: &CliArgs, config: &PocketConfig, entity: EntityKind) -> Result<()> {
    let db_path = config.database_path();
    let db = Database::open(
        &db_path,
        Duration::from_millis(config.storage.busy_timeout_ms),
    )?;
    let repo = RecordRepository::new(Arc::new(db), entity);

    match &args.command {
        Command::Add {
            title,
            amount,
            type_tag,
            done,
        } => {
            let fields = NewRecord {
                title: title.clone(),
                amount: amount.as_deref().map(parse_amount).transpose()?,
                type_tag: *type_tag,
                completed: *done,
            };
            let record = repo.add(&fields)?;
            emit(args, &record, || {
                format!("Added {}", output::record_line(entity, &record))
            })
        }

        Command::List(view) => {
            let records = match view.visibility() {
                Visibility::Active => repo.list(false)?,
                Visibility::Deleted => repo.list_deleted()?,
                Visibility::All => repo.list(true)?,
            };
            emit(args, &records, || output::records_text(entity, &records))
        }

        Command::Search { keyword, view } => {
            let records = match view.visibility() {
                Visibility::Active => repo.search(keyword, false)?,
                Visibility::Deleted => repo.search_deleted(keyword)?,
                Visibility::All => repo.search(keyword, true)?,
            };
            emit(args, &records, || output::records_text(entity, &records))
        }

        Command::Update {
            id,
            title,
            amount,
            type_tag,
            completed,
        } => {
            let patch = RecordPatch {
                title: title.clone(),
                amount: amount.as_deref().map(parse_amount).transpose()?,
                type_tag: *type_tag,
                completed: *completed,
            };
            require_found(entity, *id, repo.update(*id, &patch)?)?;
            println!("Updated {} record {}.", entity, id);
            Ok(())
        }

        Command::Toggle { id } => {
            let completed = repo.toggle_completed(*id)?;
            let state = if completed { "completed" } else { "pending" };
            println!("{} record {} is now {}.", entity, id, state);
            Ok(())
        }

        Command::Done { id, undo } => {
            repo.set_completed(*id, !*undo)?;
            let state = if *undo { "pending" } else { "completed" };
            println!("{} record {} is now {}.", entity, id, state);
            Ok(())
        }

        Command::Delete { id } => {
            match entity.deletion_policy() {
                DeletionPolicy::Soft => {
                    require_found(entity, *id, repo.soft_delete(*id)?)?;
                    println!("Moved {} record {} to the trash.", entity, id);
                }
                DeletionPolicy::Hard => {
                    require_found(entity, *id, repo.hard_delete(*id)?)?;
                    println!("Deleted {} record {}.", entity, id);
                }
            }
            Ok(())
        }

        Command::Restore { id } => {
            require_found(entity, *id, repo.restore(*id)?)?;
            println!("Restored {} record {}.", entity, id);
            Ok(())
        }

        Command::Summary => {
            let summary = summarize(&repo.list(false)?);
            emit(args, &summary, || output::summary_text(&summary))
        }

        Command::Monthly { months } => {
            let totals = group_by_month(&repo.list(false)?);
            let series = monthly_series(&totals, *months);
            emit(args, &series, || output::monthly_text(&series))
        }

        Command::Stats => {
            let stats = completion_stats(&repo.list(false)?);
            emit(args, &stats, || output::stats_text(&stats))
        }

        // Handled in main without opening the store.
        Command::Init { .. } => Ok(()),

        Command::Sync { .. } => {
            let endpoint = args.resolve_endpoint(&config.sync.endpoint);
            let remote = HttpCollaborator::new(&endpoint)?;
            let engine = SyncEngine::new(repo, remote);

            let cancel = CancelToken::new();
            let interrupt = {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        warn!("Interrupt received, cancelling sync");
                        cancel.cancel();
                    }
                })
            };

            info!(entity = %entity, endpoint = %endpoint, "Starting sync");
            let result = engine.full_replace(&cancel).await;
            interrupt.abort();

            let report = result?;
            emit(args, &report, || output::sync_text(entity, &report))
        }
    }
}

/// Print `value` as JSON when `--json` is set, otherwise the text form.
fn emit<T, F>(args: &CliArgs, value: &T, text: F) -> Result<()>
where
    T: serde::Serialize + ?Sized,
    F: FnOnce() -> String,
{
    if args.json {
        println!("{}", output::to_json(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}

fn require_found(entity: EntityKind, id: i64, found: bool) -> Result<()> {
    if found {
        Ok(())
    } else {
        Err(PocketError::NotFound { entity, id })
    }
}
