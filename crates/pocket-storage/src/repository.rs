//! Entity Repository: typed CRUD over the record store.
//!
//! One `RecordRepository` serves one entity table. Rows come back from the
//! store as plain column maps and are turned into `Record`s by
//! `row_to_record`, which is the only place that knows which columns are
//! required and how optional ones default.

use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use rusqlite::types::Value;
use rusqlite::Connection;
use tracing::{debug, info, warn};

use pocket_core::error::{PocketError, Result};
use pocket_core::types::{
    format_timestamp, parse_timestamp, DeletionPolicy, EntityKind, NewRecord, Record,
    RecordPatch, SyncState, TypeTag,
};
use pocket_core::validation;

use crate::db::{execute_on, query_on, Database, Row};
use crate::update::UpdateBuilder;

const COLUMNS: &str =
    "id, title, amount, type, completed, createdAt, updatedAt, isDeleted, synced, cloudId";

/// Which side of the trash a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Records not soft-deleted.
    Active,
    /// Soft-deleted records only.
    Deleted,
    All,
}

impl Visibility {
    fn from_include_deleted(include_deleted: bool) -> Self {
        if include_deleted {
            Visibility::All
        } else {
            Visibility::Active
        }
    }

    fn where_clause(&self) -> &'static str {
        match self {
            Visibility::Active => "WHERE isDeleted = 0",
            Visibility::Deleted => "WHERE isDeleted = 1",
            Visibility::All => "",
        }
    }
}

/// Repository for one entity kind.
#[derive(Debug, Clone)]
pub struct RecordRepository {
    db: Arc<Database>,
    kind: EntityKind,
}

impl RecordRepository {
    pub fn new(db: Arc<Database>, kind: EntityKind) -> Self {
        Self { db, kind }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Insert a new record and return it with its assigned id.
    pub fn add(&self, fields: &NewRecord) -> Result<Record> {
        validation::validate_new(self.kind, fields)?;

        let now = now_millis();
        let stamp = format_timestamp(&now);
        let title = fields.title.trim().to_string();

        let sql = format!(
            "INSERT INTO {} (title, amount, type, completed, createdAt, updatedAt, isDeleted, synced)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5, 0, 0)",
            self.kind.table()
        );
        let params = [
            Value::Text(title.clone()),
            fields.amount.map(Value::Real).unwrap_or(Value::Null),
            fields
                .type_tag
                .map(|t| Value::Text(t.as_str().to_string()))
                .unwrap_or(Value::Null),
            Value::Integer(fields.completed as i64),
            Value::Text(stamp),
        ];

        let execution = self.db.execute(&sql, &params)?;
        let id = execution.last_insert_id.ok_or_else(|| {
            PocketError::Query(format!("insert into {} returned no row id", self.kind))
        })?;

        info!(entity = %self.kind, id, "Record added");

        Ok(Record {
            id,
            title,
            amount: fields.amount,
            type_tag: fields.type_tag,
            completed: fields.completed,
            created_at: now,
            updated_at: now,
            soft_deleted: false,
            sync_state: SyncState::default(),
        })
    }

    /// Fetch one record by id, deleted or not.
    pub fn get(&self, id: i64) -> Result<Option<Record>> {
        let sql = format!("SELECT {} FROM {} WHERE id = ?1", COLUMNS, self.kind.table());
        let rows = self.db.query(&sql, &[Value::Integer(id)])?;
        rows.first().map(row_to_record).transpose()
    }

    /// Records ordered newest first. Soft-deleted ones only when asked.
    pub fn list(&self, include_deleted: bool) -> Result<Vec<Record>> {
        self.list_visible(Visibility::from_include_deleted(include_deleted))
    }

    /// The trash view.
    pub fn list_deleted(&self) -> Result<Vec<Record>> {
        self.list_visible(Visibility::Deleted)
    }

    /// Case-insensitive substring match on the title, with the same ordering
    /// and deletion filter as [`RecordRepository::list`].
    pub fn search(&self, keyword: &str, include_deleted: bool) -> Result<Vec<Record>> {
        self.search_visible(keyword, Visibility::from_include_deleted(include_deleted))
    }

    /// Search within the trash view.
    pub fn search_deleted(&self, keyword: &str) -> Result<Vec<Record>> {
        self.search_visible(keyword, Visibility::Deleted)
    }

    /// Non-deleted records not yet confirmed by the remote.
    pub fn list_unsynced(&self) -> Result<Vec<Record>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE isDeleted = 0 AND synced = 0 ORDER BY createdAt DESC, id DESC",
            COLUMNS,
            self.kind.table()
        );
        self.db.query(&sql, &[])?.iter().map(row_to_record).collect()
    }

    pub fn count(&self, include_deleted: bool) -> Result<u64> {
        let sql = format!(
            "SELECT COUNT(*) AS n FROM {} {}",
            self.kind.table(),
            Visibility::from_include_deleted(include_deleted).where_clause()
        );
        let rows = self.db.query(&sql, &[])?;
        match rows.first().and_then(|r| r.get("n")) {
            Some(Value::Integer(n)) => Ok(*n as u64),
            _ => Ok(0),
        }
    }

    /// Apply the supplied fields and refresh `updatedAt`.
    ///
    /// Returns `Ok(false)` when no record has this id.
    pub fn update(&self, id: i64, patch: &RecordPatch) -> Result<bool> {
        validation::validate_patch(patch)?;
        let table = self.kind.table();

        let updated = self.db.with_conn(|conn| {
            let Some(previous) = read_updated_at(conn, table, id)? else {
                return Ok(false);
            };
            let builder = UpdateBuilder::from_patch(table, patch);
            apply_touching(conn, builder, id, previous)
        })?;

        if updated {
            debug!(entity = %self.kind, id, "Record updated");
        }
        Ok(updated)
    }

    /// Flip the completion flag and return its new value.
    pub fn toggle_completed(&self, id: i64) -> Result<bool> {
        let table = self.kind.table();
        let kind = self.kind;

        self.db.with_conn(|conn| {
            let sql = format!("SELECT completed, updatedAt FROM {} WHERE id = ?1", table);
            let rows = query_on(conn, &sql, &[Value::Integer(id)])?;
            let row = rows
                .first()
                .ok_or(PocketError::NotFound { entity: kind, id })?;

            let current = flag(row, "completed");
            let previous = required_timestamp(row, "updatedAt")?;
            let builder =
                UpdateBuilder::new(table).set("completed", Value::Integer((!current) as i64));
            apply_touching(conn, builder, id, previous)?;
            Ok(!current)
        })
    }

    /// Set the completion flag to an explicit value.
    pub fn set_completed(&self, id: i64, value: bool) -> Result<()> {
        let table = self.kind.table();
        let kind = self.kind;

        self.db.with_conn(|conn| {
            let previous =
                read_updated_at(conn, table, id)?.ok_or(PocketError::NotFound { entity: kind, id })?;
            let builder = UpdateBuilder::new(table).set("completed", Value::Integer(value as i64));
            apply_touching(conn, builder, id, previous)?;
            Ok(())
        })
    }

    /// Move a record to the trash. No other column changes.
    pub fn soft_delete(&self, id: i64) -> Result<bool> {
        self.require_policy(DeletionPolicy::Soft, "soft delete")?;
        let changed = self.set_deleted_flag(id, true)?;
        if changed {
            info!(entity = %self.kind, id, "Record moved to trash");
        }
        Ok(changed)
    }

    /// Bring a record back from the trash. No other column changes.
    pub fn restore(&self, id: i64) -> Result<bool> {
        self.require_policy(DeletionPolicy::Soft, "restore")?;
        let changed = self.set_deleted_flag(id, false)?;
        if changed {
            info!(entity = %self.kind, id, "Record restored");
        }
        Ok(changed)
    }

    /// Physically remove a record. Irreversible.
    pub fn hard_delete(&self, id: i64) -> Result<bool> {
        self.require_policy(DeletionPolicy::Hard, "hard delete")?;
        let sql = format!("DELETE FROM {} WHERE id = ?1", self.kind.table());
        let execution = self.db.execute(&sql, &[Value::Integer(id)])?;
        if execution.affected > 0 {
            info!(entity = %self.kind, id, "Record deleted");
        }
        Ok(execution.affected > 0)
    }

    /// Record that the remote collaborator has persisted this record.
    pub fn mark_synced(&self, id: i64, remote_id: &str) -> Result<bool> {
        if remote_id.trim().is_empty() {
            return Err(PocketError::Validation(
                "remote id must not be empty".to_string(),
            ));
        }
        let sql = format!(
            "UPDATE {} SET synced = 1, cloudId = ?1 WHERE id = ?2",
            self.kind.table()
        );
        let execution = self.db.execute(
            &sql,
            &[Value::Text(remote_id.to_string()), Value::Integer(id)],
        )?;
        Ok(execution.affected > 0)
    }

    fn list_visible(&self, visibility: Visibility) -> Result<Vec<Record>> {
        let sql = format!(
            "SELECT {} FROM {} {} ORDER BY createdAt DESC, id DESC",
            COLUMNS,
            self.kind.table(),
            visibility.where_clause()
        );
        self.db.query(&sql, &[])?.iter().map(row_to_record).collect()
    }

    // SQLite's LIKE only folds ASCII, so the match runs here to cover
    // accented titles as well.
    fn search_visible(&self, keyword: &str, visibility: Visibility) -> Result<Vec<Record>> {
        let records = self.list_visible(visibility)?;
        if keyword.trim().is_empty() {
            return Ok(records);
        }
        // Inner and edge whitespace is part of the term.
        let needle = keyword.to_lowercase();
        Ok(records
            .into_iter()
            .filter(|r| r.title.to_lowercase().contains(&needle))
            .collect())
    }

    fn set_deleted_flag(&self, id: i64, deleted: bool) -> Result<bool> {
        let sql = format!("UPDATE {} SET isDeleted = ?1 WHERE id = ?2", self.kind.table());
        let execution = self
            .db
            .execute(&sql, &[Value::Integer(deleted as i64), Value::Integer(id)])?;
        Ok(execution.affected > 0)
    }

    fn require_policy(&self, policy: DeletionPolicy, action: &str) -> Result<()> {
        if self.kind.deletion_policy() != policy {
            return Err(PocketError::Validation(format!(
                "{} does not support {}",
                self.kind, action
            )));
        }
        Ok(())
    }
}

/// Current time truncated to what the store persists.
fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// `updatedAt` of a row, or `None` if the id is unknown.
fn read_updated_at(conn: &Connection, table: &str, id: i64) -> Result<Option<DateTime<Utc>>> {
    let sql = format!("SELECT updatedAt FROM {} WHERE id = ?1", table);
    let rows = query_on(conn, &sql, &[Value::Integer(id)])?;
    rows.first()
        .map(|row| required_timestamp(row, "updatedAt"))
        .transpose()
}

/// Execute `builder` with `updatedAt` set strictly after `previous`.
fn apply_touching(
    conn: &Connection,
    builder: UpdateBuilder,
    id: i64,
    previous: DateTime<Utc>,
) -> Result<bool> {
    let now = now_millis();
    let next = if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    };

    let builder = builder.set("updatedAt", Value::Text(format_timestamp(&next)));
    match builder.build(id) {
        Some((sql, params)) => Ok(execute_on(conn, &sql, &params)?.affected > 0),
        None => Ok(false),
    }
}

/// Map a result row to a `Record`.
///
/// Required: `id`, `title`, `createdAt`. `updatedAt` defaults to
/// `createdAt`; flags default to false; an unreadable `amount` or `type`
/// maps to `None`.
pub fn row_to_record(row: &Row) -> Result<Record> {
    let id = match row.get("id") {
        Some(Value::Integer(id)) => *id,
        other => {
            return Err(PocketError::Serialization(format!(
                "row has no integer id: {:?}",
                other
            )))
        }
    };

    let title = match row.get("title") {
        Some(Value::Text(t)) => t.clone(),
        other => {
            return Err(PocketError::Serialization(format!(
                "row {} has no title: {:?}",
                id, other
            )))
        }
    };

    let created_at = required_timestamp(row, "createdAt")?;
    let updated_at = match row.get("updatedAt") {
        Some(Value::Text(s)) => parse_timestamp(s)?,
        _ => created_at,
    };

    let amount = match row.get("amount") {
        Some(Value::Real(v)) => Some(*v),
        Some(Value::Integer(v)) => Some(*v as f64),
        Some(Value::Text(s)) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    };

    let type_tag = match row.get("type") {
        Some(Value::Text(s)) => match s.parse::<TypeTag>() {
            Ok(tag) => Some(tag),
            Err(_) => {
                warn!(id, value = %s, "Ignoring unrecognized type tag");
                None
            }
        },
        _ => None,
    };

    let remote_id = match row.get("cloudId") {
        Some(Value::Text(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    };

    Ok(Record {
        id,
        title,
        amount,
        type_tag,
        completed: flag(row, "completed"),
        created_at,
        updated_at,
        soft_deleted: flag(row, "isDeleted"),
        sync_state: SyncState {
            synced: flag(row, "synced"),
            remote_id,
        },
    })
}

fn flag(row: &Row, column: &str) -> bool {
    matches!(row.get(column), Some(Value::Integer(v)) if *v != 0)
}

fn required_timestamp(row: &Row, column: &str) -> Result<DateTime<Utc>> {
    match row.get(column) {
        Some(Value::Text(s)) => parse_timestamp(s),
        other => Err(PocketError::Serialization(format!(
            "row has no {}: {:?}",
            column, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_db() -> Arc<Database> {
        Arc::new(Database::in_memory().unwrap())
    }

    fn repo(kind: EntityKind) -> RecordRepository {
        RecordRepository::new(make_db(), kind)
    }

    fn expense(title: &str, amount: f64) -> NewRecord {
        NewRecord::transaction(title, amount, TypeTag::Expense)
    }

    // ========================================================================
    // add / list
    // ========================================================================

    #[test]
    fn test_add_then_list_contains_record_once() {
        let repo = repo(EntityKind::Todo);
        let created = repo.add(&NewRecord::titled("Water plants")).unwrap();

        let listed = repo.list(false).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
        assert_eq!(listed[0], created);
    }

    #[test]
    fn test_add_sets_defaults() {
        let repo = repo(EntityKind::Transaction);
        let created = repo.add(&expense("Lunch", 12.5)).unwrap();

        assert!(created.id > 0);
        assert_eq!(created.title, "Lunch");
        assert_eq!(created.amount, Some(12.5));
        assert_eq!(created.type_tag, Some(TypeTag::Expense));
        assert!(!created.soft_deleted);
        assert!(!created.completed);
        assert!(!created.sync_state.synced);
        assert_eq!(created.sync_state.remote_id, None);
        assert_eq!(created.created_at, created.updated_at);
    }

    #[test]
    fn test_add_trims_title() {
        let repo = repo(EntityKind::Task);
        let created = repo.add(&NewRecord::titled("  Call mom  ")).unwrap();
        assert_eq!(created.title, "Call mom");
        assert_eq!(repo.get(created.id).unwrap().unwrap().title, "Call mom");
    }

    #[test]
    fn test_add_rejects_empty_title() {
        let repo = repo(EntityKind::Task);
        let err = repo.add(&NewRecord::titled("")).unwrap_err();
        assert!(matches!(err, PocketError::Validation(_)));
        assert_eq!(repo.count(true).unwrap(), 0);
    }

    #[test]
    fn test_add_transaction_requires_amount() {
        let repo = repo(EntityKind::Transaction);
        let err = repo.add(&NewRecord::titled("Mystery")).unwrap_err();
        assert!(matches!(err, PocketError::Validation(_)));
    }

    #[test]
    fn test_list_orders_newest_first_with_id_tiebreak() {
        let repo = repo(EntityKind::Todo);
        let a = repo.add(&NewRecord::titled("first")).unwrap();
        let b = repo.add(&NewRecord::titled("second")).unwrap();
        let c = repo.add(&NewRecord::titled("third")).unwrap();

        let ids: Vec<i64> = repo.list(false).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);
    }

    #[test]
    fn test_identical_created_at_falls_back_to_id_descending() {
        let db = make_db();
        for title in ["one", "two", "three"] {
            db.execute(
                "INSERT INTO todos (title, createdAt, updatedAt) VALUES (?1, ?2, ?2)",
                &[
                    Value::Text(title.into()),
                    Value::Text("2024-05-01T10:00:00.000Z".into()),
                ],
            )
            .unwrap();
        }
        let repo = RecordRepository::new(db, EntityKind::Todo);
        let titles: Vec<String> = repo.list(false).unwrap().into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["three", "two", "one"]);
    }

    #[test]
    fn test_get_unknown_id_is_none() {
        let repo = repo(EntityKind::Task);
        assert!(repo.get(404).unwrap().is_none());
    }

    // ========================================================================
    // search
    // ========================================================================

    #[test]
    fn test_search_is_case_insensitive() {
        let repo = repo(EntityKind::Transaction);
        repo.add(&expense("ABC market", 30.0)).unwrap();
        repo.add(&expense("Bus ticket", 2.0)).unwrap();

        let found = repo.search("abc", false).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "ABC market");
    }

    #[test]
    fn test_search_folds_non_ascii() {
        let repo = repo(EntityKind::Todo);
        repo.add(&NewRecord::titled("Ăn sáng")).unwrap();
        assert_eq!(repo.search("ăn", false).unwrap().len(), 1);
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let repo = repo(EntityKind::Todo);
        repo.add(&NewRecord::titled("50% off")).unwrap();
        repo.add(&NewRecord::titled("full price")).unwrap();
        let found = repo.search("%", false).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "50% off");
    }

    #[test]
    fn test_search_respects_deletion_filter() {
        let repo = repo(EntityKind::Transaction);
        let gone = repo.add(&expense("Coffee beans", 9.0)).unwrap();
        repo.add(&expense("Coffee cup", 4.0)).unwrap();
        repo.soft_delete(gone.id).unwrap();

        assert_eq!(repo.search("coffee", false).unwrap().len(), 1);
        assert_eq!(repo.search("coffee", true).unwrap().len(), 2);

        let trashed = repo.search_deleted("COFFEE").unwrap();
        assert_eq!(trashed.len(), 1);
        assert_eq!(trashed[0].id, gone.id);
    }

    #[test]
    fn test_search_keeps_spaces_in_keyword() {
        let repo = repo(EntityKind::Transaction);
        repo.add(&expense("supermarket", 12.0)).unwrap();
        repo.add(&expense("Night market", 8.0)).unwrap();

        let found = repo.search(" market", false).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Night market");
    }

    #[test]
    fn test_search_empty_keyword_matches_list() {
        let repo = repo(EntityKind::Todo);
        repo.add(&NewRecord::titled("a")).unwrap();
        repo.add(&NewRecord::titled("b")).unwrap();
        assert_eq!(repo.search("  ", false).unwrap(), repo.list(false).unwrap());
    }

    // ========================================================================
    // update
    // ========================================================================

    #[test]
    fn test_update_title_refreshes_updated_at_only() {
        let repo = repo(EntityKind::Transaction);
        let original = repo.add(&expense("Taxi", 15.0)).unwrap();

        assert!(repo.update(original.id, &RecordPatch::title("X")).unwrap());

        let after = repo.get(original.id).unwrap().unwrap();
        assert_eq!(after.title, "X");
        assert!(after.updated_at > original.updated_at);
        assert_eq!(after.id, original.id);
        assert_eq!(after.created_at, original.created_at);
        assert_eq!(after.amount, original.amount);
        assert_eq!(after.type_tag, original.type_tag);
        assert_eq!(after.soft_deleted, original.soft_deleted);
        assert_eq!(after.sync_state, original.sync_state);
    }

    #[test]
    fn test_consecutive_updates_strictly_increase_updated_at() {
        let repo = repo(EntityKind::Task);
        let record = repo.add(&NewRecord::titled("Draft")).unwrap();

        let mut last = record.updated_at;
        for i in 0..5 {
            repo.update(record.id, &RecordPatch::title(format!("Draft {}", i)))
                .unwrap();
            let now = repo.get(record.id).unwrap().unwrap().updated_at;
            assert!(now > last);
            last = now;
        }
    }

    #[test]
    fn test_update_multiple_fields() {
        let repo = repo(EntityKind::Transaction);
        let record = repo.add(&expense("Gift", 20.0)).unwrap();

        let patch = RecordPatch {
            title: None,
            amount: Some(25.0),
            type_tag: Some(TypeTag::Income),
            completed: None,
        };
        assert!(repo.update(record.id, &patch).unwrap());

        let after = repo.get(record.id).unwrap().unwrap();
        assert_eq!(after.title, "Gift");
        assert_eq!(after.amount, Some(25.0));
        assert_eq!(after.type_tag, Some(TypeTag::Income));
    }

    #[test]
    fn test_update_unknown_id_returns_false() {
        let repo = repo(EntityKind::Todo);
        assert!(!repo.update(999, &RecordPatch::title("nope")).unwrap());
    }

    #[test]
    fn test_update_rejects_blank_title() {
        let repo = repo(EntityKind::Todo);
        let record = repo.add(&NewRecord::titled("keep")).unwrap();
        let err = repo.update(record.id, &RecordPatch::title(" ")).unwrap_err();
        assert!(matches!(err, PocketError::Validation(_)));
        assert_eq!(repo.get(record.id).unwrap().unwrap().title, "keep");
    }

    #[test]
    fn test_update_does_not_touch_sync_state() {
        let repo = repo(EntityKind::Task);
        let record = repo.add(&NewRecord::titled("Sync me")).unwrap();
        repo.mark_synced(record.id, "remote-1").unwrap();
        repo.update(record.id, &RecordPatch::title("Renamed")).unwrap();

        let after = repo.get(record.id).unwrap().unwrap();
        assert!(after.sync_state.synced);
        assert_eq!(after.sync_state.remote_id.as_deref(), Some("remote-1"));
    }

    // ========================================================================
    // completion
    // ========================================================================

    #[test]
    fn test_toggle_completed_flips() {
        let repo = repo(EntityKind::Todo);
        let record = repo.add(&NewRecord::titled("Read")).unwrap();

        assert!(repo.toggle_completed(record.id).unwrap());
        assert!(repo.get(record.id).unwrap().unwrap().completed);

        assert!(!repo.toggle_completed(record.id).unwrap());
        assert!(!repo.get(record.id).unwrap().unwrap().completed);
    }

    #[test]
    fn test_set_completed() {
        let repo = repo(EntityKind::Task);
        let record = repo.add(&NewRecord::titled("Ship")).unwrap();

        repo.set_completed(record.id, true).unwrap();
        repo.set_completed(record.id, true).unwrap();
        let after = repo.get(record.id).unwrap().unwrap();
        assert!(after.completed);
        assert!(after.updated_at > record.updated_at);
    }

    #[test]
    fn test_completion_on_unknown_id_is_not_found() {
        let repo = repo(EntityKind::Todo);
        assert!(matches!(
            repo.toggle_completed(5).unwrap_err(),
            PocketError::NotFound { id: 5, .. }
        ));
        assert!(matches!(
            repo.set_completed(5, true).unwrap_err(),
            PocketError::NotFound { id: 5, .. }
        ));
    }

    // ========================================================================
    // deletion
    // ========================================================================

    #[test]
    fn test_soft_delete_and_restore_round_trip() {
        let repo = repo(EntityKind::Transaction);
        let record = repo.add(&expense("Books", 40.0)).unwrap();

        assert!(repo.soft_delete(record.id).unwrap());
        assert!(repo.list(false).unwrap().is_empty());

        let all = repo.list(true).unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].soft_deleted);
        assert_eq!(repo.list_deleted().unwrap().len(), 1);

        assert!(repo.restore(record.id).unwrap());
        let restored = repo.list(false).unwrap();
        assert_eq!(restored, vec![record]);
        assert!(repo.list_deleted().unwrap().is_empty());
    }

    #[test]
    fn test_soft_delete_unknown_id_returns_false() {
        let repo = repo(EntityKind::Todo);
        assert!(!repo.soft_delete(77).unwrap());
        assert!(!repo.restore(77).unwrap());
    }

    #[test]
    fn test_hard_delete_removes_row() {
        let repo = repo(EntityKind::Task);
        let record = repo.add(&NewRecord::titled("Temp")).unwrap();

        assert!(repo.hard_delete(record.id).unwrap());
        assert!(repo.get(record.id).unwrap().is_none());
        assert!(!repo.hard_delete(record.id).unwrap());
    }

    #[test]
    fn test_deletion_policy_is_enforced() {
        let tasks = repo(EntityKind::Task);
        let task = tasks.add(&NewRecord::titled("t")).unwrap();
        assert!(matches!(
            tasks.soft_delete(task.id).unwrap_err(),
            PocketError::Validation(_)
        ));
        assert!(matches!(
            tasks.restore(task.id).unwrap_err(),
            PocketError::Validation(_)
        ));

        let todos = repo(EntityKind::Todo);
        let todo = todos.add(&NewRecord::titled("t")).unwrap();
        assert!(matches!(
            todos.hard_delete(todo.id).unwrap_err(),
            PocketError::Validation(_)
        ));
        assert!(todos.get(todo.id).unwrap().is_some());
    }

    #[test]
    fn test_count() {
        let repo = repo(EntityKind::Todo);
        let a = repo.add(&NewRecord::titled("a")).unwrap();
        repo.add(&NewRecord::titled("b")).unwrap();
        repo.soft_delete(a.id).unwrap();

        assert_eq!(repo.count(false).unwrap(), 1);
        assert_eq!(repo.count(true).unwrap(), 2);
    }

    // ========================================================================
    // sync state
    // ========================================================================

    #[test]
    fn test_mark_synced() {
        let repo = repo(EntityKind::Transaction);
        let a = repo.add(&expense("a", 1.0)).unwrap();
        let b = repo.add(&expense("b", 2.0)).unwrap();

        assert_eq!(repo.list_unsynced().unwrap().len(), 2);
        assert!(repo.mark_synced(a.id, "17").unwrap());

        let unsynced = repo.list_unsynced().unwrap();
        assert_eq!(unsynced.len(), 1);
        assert_eq!(unsynced[0].id, b.id);

        let synced = repo.get(a.id).unwrap().unwrap();
        assert!(synced.sync_state.synced);
        assert_eq!(synced.sync_state.remote_id.as_deref(), Some("17"));
        assert_eq!(synced.updated_at, a.updated_at);
    }

    #[test]
    fn test_mark_synced_unknown_id_and_blank_remote() {
        let repo = repo(EntityKind::Task);
        assert!(!repo.mark_synced(3, "r").unwrap());
        assert!(matches!(
            repo.mark_synced(3, "").unwrap_err(),
            PocketError::Validation(_)
        ));
    }

    #[test]
    fn test_entities_are_isolated() {
        let db = make_db();
        let tasks = RecordRepository::new(Arc::clone(&db), EntityKind::Task);
        let todos = RecordRepository::new(db, EntityKind::Todo);

        tasks.add(&NewRecord::titled("only a task")).unwrap();
        assert_eq!(tasks.count(true).unwrap(), 1);
        assert_eq!(todos.count(true).unwrap(), 0);
    }

    // ========================================================================
    // row mapping
    // ========================================================================

    #[test]
    fn test_row_mapping_defaults_optional_columns() {
        let row: Row = vec![
            ("id".to_string(), Value::Integer(9)),
            ("title".to_string(), Value::Text("Legacy".into())),
            (
                "createdAt".to_string(),
                Value::Text("2023-02-03T04:05:06.000Z".into()),
            ),
            ("amount".to_string(), Value::Text("not a number".into())),
            ("type".to_string(), Value::Text("Chi".into())),
        ]
        .into_iter()
        .collect();

        let record = row_to_record(&row).unwrap();
        assert_eq!(record.id, 9);
        assert_eq!(record.amount, None);
        assert_eq!(record.type_tag, Some(TypeTag::Expense));
        assert_eq!(record.updated_at, record.created_at);
        assert!(!record.completed);
        assert!(!record.soft_deleted);
        assert_eq!(record.sync_state, SyncState::default());
    }

    #[test]
    fn test_row_mapping_requires_id_and_title() {
        let row: Row = vec![("title".to_string(), Value::Text("x".into()))]
            .into_iter()
            .collect();
        assert!(matches!(
            row_to_record(&row).unwrap_err(),
            PocketError::Serialization(_)
        ));

        let row: Row = vec![("id".to_string(), Value::Integer(1))]
            .into_iter()
            .collect();
        assert!(row_to_record(&row).is_err());
    }
}
