//! CLI argument definitions for the Pocket binary.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use pocket_core::types::{EntityKind, TypeTag};
use pocket_storage::Visibility;

/// Pocket - tasks, expenses and todos kept in a local database, with
/// optional backup to a remote REST collection.
#[derive(Parser, Debug)]
#[command(name = "pocket", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the database file.
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Which records to work on: tasks, transactions or todos.
    #[arg(short = 'e', long = "entity", global = true)]
    pub entity: Option<EntityKind>,

    /// Print results as JSON.
    #[arg(long = "json", global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a record.
    Add {
        title: String,
        /// Amount, e.g. `1500` or `1,500`. Required for transactions.
        #[arg(short = 'a', long = "amount")]
        amount: Option<String>,
        /// income or expense. Required for transactions.
        #[arg(short = 't', long = "type")]
        type_tag: Option<TypeTag>,
        /// Create the record already completed.
        #[arg(long = "done")]
        done: bool,
    },
    /// List records, newest first.
    List(ViewArgs),
    /// List records whose title contains a keyword.
    Search {
        keyword: String,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Change some fields of a record.
    Update {
        id: i64,
        #[arg(long = "title")]
        title: Option<String>,
        #[arg(short = 'a', long = "amount")]
        amount: Option<String>,
        #[arg(short = 't', long = "type")]
        type_tag: Option<TypeTag>,
        #[arg(long = "completed")]
        completed: Option<bool>,
    },
    /// Flip the completed flag.
    Toggle { id: i64 },
    /// Mark a record completed.
    Done {
        id: i64,
        /// Mark it pending instead.
        #[arg(long = "undo")]
        undo: bool,
    },
    /// Remove a record: to the trash for transactions and todos, for good
    /// for tasks.
    Delete { id: i64 },
    /// Bring a record back from the trash.
    Restore { id: i64 },
    /// Income, expense and balance over active records.
    Summary,
    /// Income and expense per month, oldest first.
    Monthly {
        /// How many recent months to show.
        #[arg(short = 'm', long = "months", default_value_t = 6)]
        months: usize,
    },
    /// Completed and pending counters.
    Stats,
    /// Write the effective configuration to the config file path.
    Init {
        /// Overwrite an existing file.
        #[arg(long = "force")]
        force: bool,
    },
    /// Replace the remote collection with the local records.
    Sync {
        /// Remote collection URL.
        #[arg(long = "endpoint")]
        endpoint: Option<String>,
    },
}

/// Trash filter shared by `list` and `search`.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct ViewArgs {
    /// Only records in the trash.
    #[arg(long = "deleted", conflicts_with = "all")]
    pub deleted: bool,

    /// Active and trashed records together.
    #[arg(long = "all")]
    pub all: bool,
}

impl ViewArgs {
    pub fn visibility(&self) -> Visibility {
        if self.deleted {
            Visibility::Deleted
        } else if self.all {
            Visibility::All
        } else {
            Visibility::Active
        }
    }
}

impl Command {
    /// What the command attempts, used in failure messages.
    pub fn action(&self, entity: EntityKind) -> String {
        match self {
            Command::Add { .. } => format!("add to {}", entity),
            Command::List(_) => format!("list {}", entity),
            Command::Search { keyword, .. } => format!("search {} for '{}'", entity, keyword),
            Command::Update { id, .. } => format!("update {} record {}", entity, id),
            Command::Toggle { id } => format!("toggle {} record {}", entity, id),
            Command::Done { id, undo: false } => format!("complete {} record {}", entity, id),
            Command::Done { id, undo: true } => format!("reopen {} record {}", entity, id),
            Command::Delete { id } => format!("delete {} record {}", entity, id),
            Command::Restore { id } => format!("restore {} record {}", entity, id),
            Command::Summary => format!("summarize {}", entity),
            Command::Monthly { .. } => format!("compute monthly totals for {}", entity),
            Command::Stats => format!("count {}", entity),
            Command::Init { .. } => "write configuration".to_string(),
            Command::Sync { .. } => format!("sync {}", entity),
        }
    }
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > POCKET_CONFIG env var > ~/.pocket/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("POCKET_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the data directory.
    ///
    /// Priority: --data-dir flag > POCKET_DATA_DIR env var.
    /// Returns `None` if neither is set (use config value).
    pub fn resolve_data_dir(&self) -> Option<String> {
        if let Some(ref p) = self.data_dir {
            return Some(p.to_string_lossy().to_string());
        }
        std::env::var("POCKET_DATA_DIR").ok().filter(|v| !v.is_empty())
    }

    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Priority: --entity flag > config file value.
    pub fn resolve_entity(&self, config_entity: EntityKind) -> EntityKind {
        self.entity.unwrap_or(config_entity)
    }

    /// Resolve the sync endpoint.
    ///
    /// Priority: --endpoint flag > POCKET_SYNC_ENDPOINT env var > config file
    /// value. May be empty, which the sync layer rejects.
    pub fn resolve_endpoint(&self, config_endpoint: &str) -> String {
        if let Command::Sync {
            endpoint: Some(ref e),
        } = self.command
        {
            return e.clone();
        }
        if let Ok(e) = std::env::var("POCKET_SYNC_ENDPOINT") {
            if !e.trim().is_empty() {
                return e;
            }
        }
        config_endpoint.to_string()
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".pocket").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".pocket").join("config.toml");
    }
    PathBuf::from("config.toml")
}
