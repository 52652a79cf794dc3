//! Plain-text and JSON rendering of command results.

use chrono::Local;
use serde::Serialize;

use pocket_core::types::{EntityKind, Record};
use pocket_core::Result;
use pocket_storage::{CompletionStats, MonthSeries, Summary};
use pocket_sync::SyncReport;

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// One line per record. Transactions show direction and amount, the other
/// kinds show a completion box.
pub fn record_line(kind: EntityKind, record: &Record) -> String {
    let when = record
        .created_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M");

    let mut line = if kind.requires_amount() {
        let tag = record
            .type_tag
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "#{:<5} {}  {:<7} {:>12.2}  {}",
            record.id,
            when,
            tag,
            record.amount.unwrap_or(0.0),
            record.title
        )
    } else {
        let mark = if record.completed { "x" } else { " " };
        format!("#{:<5} {}  [{}] {}", record.id, when, mark, record.title)
    };

    if record.soft_deleted {
        line.push_str("  (trash)");
    }
    line
}

pub fn records_text(kind: EntityKind, records: &[Record]) -> String {
    if records.is_empty() {
        return format!("No {} found.", kind);
    }
    records
        .iter()
        .map(|r| record_line(kind, r))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn summary_text(summary: &Summary) -> String {
    format!(
        "Income:  {:>12.2}\nExpense: {:>12.2}\nBalance: {:>12.2}",
        summary.income_total, summary.expense_total, summary.balance
    )
}

pub fn monthly_text(series: &[MonthSeries]) -> String {
    if series.is_empty() {
        return "No monthly data.".to_string();
    }
    let mut lines = vec![format!("{:<8} {:>12} {:>12}", "Month", "Income", "Expense")];
    for month in series {
        lines.push(format!(
            "{:<8} {:>12.2} {:>12.2}",
            month.month, month.income, month.expense
        ));
    }
    lines.join("\n")
}

pub fn stats_text(stats: &CompletionStats) -> String {
    format!(
        "Total: {}  Completed: {}  Pending: {}",
        stats.total, stats.completed, stats.pending
    )
}

pub fn sync_text(kind: EntityKind, report: &SyncReport) -> String {
    format!(
        "Synced {}: removed {} remote, uploaded {} local.",
        kind, report.deleted, report.uploaded
    )
}
