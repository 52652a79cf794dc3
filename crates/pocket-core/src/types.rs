use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PocketError, Result};

// =============================================================================
// Enums
// =============================================================================

/// The kind of record a repository manages. Each kind owns one table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Task manager entries.
    #[serde(rename = "tasks")]
    Task,
    /// Expense tracker entries.
    #[serde(rename = "transactions")]
    Transaction,
    /// Todo notes.
    #[serde(rename = "todos")]
    Todo,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Task, EntityKind::Transaction, EntityKind::Todo];

    /// Table backing this entity.
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Task => "tasks",
            EntityKind::Transaction => "transactions",
            EntityKind::Todo => "todos",
        }
    }

    /// How records of this kind are removed.
    pub fn deletion_policy(&self) -> DeletionPolicy {
        match self {
            EntityKind::Task => DeletionPolicy::Hard,
            EntityKind::Transaction | EntityKind::Todo => DeletionPolicy::Soft,
        }
    }

    /// Whether `amount` and `type` are mandatory on creation.
    pub fn requires_amount(&self) -> bool {
        matches!(self, EntityKind::Transaction)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

impl FromStr for EntityKind {
    type Err = PocketError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "task" | "tasks" => Ok(EntityKind::Task),
            "transaction" | "transactions" | "expense" | "expenses" => {
                Ok(EntityKind::Transaction)
            }
            "todo" | "todos" => Ok(EntityKind::Todo),
            other => Err(PocketError::Validation(format!(
                "unknown entity '{}', expected tasks, transactions or todos",
                other
            ))),
        }
    }
}

/// Deletion semantics of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionPolicy {
    /// Rows are flagged `isDeleted` and can be restored.
    Soft,
    /// Rows are physically removed.
    Hard,
}

/// Direction of money flow for a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    Income,
    Expense,
}

impl TypeTag {
    /// Value stored in the `type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Income => "income",
            TypeTag::Expense => "expense",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Income => f.write_str("Income"),
            TypeTag::Expense => f.write_str("Expense"),
        }
    }
}

impl FromStr for TypeTag {
    type Err = PocketError;

    /// Accepts the stored form, the display form and the Vietnamese labels
    /// ("Thu"/"Chi") used by older exports.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" | "thu" => Ok(TypeTag::Income),
            "expense" | "chi" => Ok(TypeTag::Expense),
            other => Err(PocketError::Validation(format!(
                "unknown type '{}', expected income or expense",
                other
            ))),
        }
    }
}

// =============================================================================
// Records
// =============================================================================

/// Remote synchronization status of a record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub synced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
}

/// A persisted record. The optional fields are populated only for the
/// entities that model them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<TypeTag>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub soft_deleted: bool,
    pub sync_state: SyncState,
}

impl Record {
    /// `YYYY-MM` bucket of the creation time.
    pub fn month(&self) -> String {
        self.created_at.format("%Y-%m").to_string()
    }
}

/// Caller-supplied fields for a new record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub title: String,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub type_tag: Option<TypeTag>,
    #[serde(default)]
    pub completed: bool,
}

impl NewRecord {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn transaction(title: impl Into<String>, amount: f64, type_tag: TypeTag) -> Self {
        Self {
            title: title.into(),
            amount: Some(amount),
            type_tag: Some(type_tag),
            completed: false,
        }
    }
}

/// A partial update. `None` leaves the column untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub type_tag: Option<TypeTag>,
    #[serde(default)]
    pub completed: Option<bool>,
}

impl RecordPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.amount.is_none()
            && self.type_tag.is_none()
            && self.completed.is_none()
    }
}

// =============================================================================
// Timestamps
// =============================================================================

/// Format a timestamp the way it is persisted: RFC 3339, UTC, millisecond
/// precision. Fixed width, so lexical order matches chronological order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a persisted timestamp. Accepts any RFC 3339 offset and normalizes
/// to UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PocketError::Serialization(format!("invalid timestamp '{}': {}", s, e)))
}
