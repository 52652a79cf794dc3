//! In-memory reductions over repository results for the statistics views.
//!
//! Nothing here touches the store and nothing here fails. A record whose
//! `amount` is missing or not finite contributes zero.

use std::collections::BTreeMap;

use serde::Serialize;

use pocket_core::types::{Record, TypeTag};

/// Totals over a set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub income_total: f64,
    pub expense_total: f64,
    pub balance: f64,
}

/// Sum of one type tag within one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    /// `YYYY-MM`.
    pub month: String,
    pub type_tag: TypeTag,
    pub total: f64,
}

/// Income and expense of one month, zero-filled, ready for charting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthSeries {
    pub month: String,
    pub income: f64,
    pub expense: f64,
}

/// Completion counters for task and todo lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompletionStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

fn contribution(record: &Record) -> f64 {
    record.amount.filter(|a| a.is_finite()).unwrap_or(0.0)
}

/// Income total, expense total and their difference.
pub fn summarize(records: &[Record]) -> Summary {
    let mut summary = Summary::default();
    for record in records {
        match record.type_tag {
            Some(TypeTag::Income) => summary.income_total += contribution(record),
            Some(TypeTag::Expense) => summary.expense_total += contribution(record),
            None => {}
        }
    }
    summary.balance = summary.income_total - summary.expense_total;
    summary
}

/// Sum amounts per `YYYY-MM` of `createdAt` and per type tag.
///
/// Months come newest first; within a month Income precedes Expense. A
/// month with no records of a tag has no entry for it.
pub fn group_by_month(records: &[Record]) -> Vec<MonthlyTotal> {
    let mut buckets: BTreeMap<(String, TypeTag), f64> = BTreeMap::new();
    for record in records {
        if let Some(tag) = record.type_tag {
            *buckets.entry((record.month(), tag)).or_insert(0.0) += contribution(record);
        }
    }

    let mut totals: Vec<MonthlyTotal> = buckets
        .into_iter()
        .map(|((month, type_tag), total)| MonthlyTotal {
            month,
            type_tag,
            total,
        })
        .collect();

    // BTreeMap yields months ascending; flip months but keep tag order.
    totals.sort_by(|a, b| b.month.cmp(&a.month).then(a.type_tag.cmp(&b.type_tag)));
    totals
}

/// The `limit` most recent months from `group_by_month` output, oldest
/// first, with absent tags filled in as zero.
pub fn monthly_series(totals: &[MonthlyTotal], limit: usize) -> Vec<MonthSeries> {
    let mut months: Vec<&str> = Vec::new();
    for total in totals {
        if !months.contains(&total.month.as_str()) {
            months.push(&total.month);
        }
    }
    months.sort_unstable_by(|a, b| b.cmp(a));
    months.truncate(limit);
    months.reverse();

    months
        .into_iter()
        .map(|month| {
            let pick = |tag: TypeTag| {
                totals
                    .iter()
                    .find(|t| t.month == month && t.type_tag == tag)
                    .map(|t| t.total)
                    .unwrap_or(0.0)
            };
            MonthSeries {
                month: month.to_string(),
                income: pick(TypeTag::Income),
                expense: pick(TypeTag::Expense),
            }
        })
        .collect()
}

pub fn completion_stats(records: &[Record]) -> CompletionStats {
    let completed = records.iter().filter(|r| r.completed).count();
    CompletionStats {
        total: records.len(),
        completed,
        pending: records.len() - completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pocket_core::types::SyncState;

    fn record(amount: Option<f64>, tag: Option<TypeTag>, y: i32, m: u32) -> Record {
        let ts = Utc.with_ymd_and_hms(y, m, 15, 12, 0, 0).unwrap();
        Record {
            id: 0,
            title: "t".to_string(),
            amount,
            type_tag: tag,
            completed: false,
            created_at: ts,
            updated_at: ts,
            soft_deleted: false,
            sync_state: SyncState::default(),
        }
    }

    #[test]
    fn test_summarize_empty_is_zero() {
        assert_eq!(
            summarize(&[]),
            Summary {
                income_total: 0.0,
                expense_total: 0.0,
                balance: 0.0
            }
        );
    }

    #[test]
    fn test_summarize_income_and_expense() {
        let records = vec![
            record(Some(100.0), Some(TypeTag::Income), 2024, 1),
            record(Some(40.0), Some(TypeTag::Expense), 2024, 1),
        ];
        assert_eq!(
            summarize(&records),
            Summary {
                income_total: 100.0,
                expense_total: 40.0,
                balance: 60.0
            }
        );
    }

    #[test]
    fn test_summarize_ignores_missing_and_non_finite_amounts() {
        let records = vec![
            record(None, Some(TypeTag::Income), 2024, 1),
            record(Some(f64::NAN), Some(TypeTag::Expense), 2024, 1),
            record(Some(10.0), None, 2024, 1),
            record(Some(5.0), Some(TypeTag::Expense), 2024, 1),
        ];
        let summary = summarize(&records);
        assert_eq!(summary.income_total, 0.0);
        assert_eq!(summary.expense_total, 5.0);
        assert_eq!(summary.balance, -5.0);
    }

    #[test]
    fn test_group_by_month_orders_newest_first() {
        let records = vec![
            record(Some(10.0), Some(TypeTag::Expense), 2023, 12),
            record(Some(200.0), Some(TypeTag::Income), 2024, 2),
            record(Some(5.0), Some(TypeTag::Expense), 2024, 2),
            record(Some(7.0), Some(TypeTag::Expense), 2024, 2),
            record(Some(50.0), Some(TypeTag::Income), 2024, 1),
        ];

        let totals = group_by_month(&records);
        let flat: Vec<(&str, TypeTag, f64)> = totals
            .iter()
            .map(|t| (t.month.as_str(), t.type_tag, t.total))
            .collect();

        assert_eq!(
            flat,
            vec![
                ("2024-02", TypeTag::Income, 200.0),
                ("2024-02", TypeTag::Expense, 12.0),
                ("2024-01", TypeTag::Income, 50.0),
                ("2023-12", TypeTag::Expense, 10.0),
            ]
        );
    }

    #[test]
    fn test_group_by_month_empty() {
        assert!(group_by_month(&[]).is_empty());
    }

    #[test]
    fn test_monthly_series_zero_fills_and_limits() {
        let records = vec![
            record(Some(1.0), Some(TypeTag::Expense), 2024, 1),
            record(Some(2.0), Some(TypeTag::Income), 2024, 2),
            record(Some(3.0), Some(TypeTag::Expense), 2024, 3),
        ];
        let series = monthly_series(&group_by_month(&records), 2);
        assert_eq!(
            series,
            vec![
                MonthSeries {
                    month: "2024-02".to_string(),
                    income: 2.0,
                    expense: 0.0
                },
                MonthSeries {
                    month: "2024-03".to_string(),
                    income: 0.0,
                    expense: 3.0
                },
            ]
        );
    }

    #[test]
    fn test_completion_stats() {
        let mut done = record(None, None, 2024, 1);
        done.completed = true;
        let open = record(None, None, 2024, 1);

        let stats = completion_stats(&[done, open.clone(), open]);
        assert_eq!(
            stats,
            CompletionStats {
                total: 3,
                completed: 1,
                pending: 2
            }
        );
    }
}
