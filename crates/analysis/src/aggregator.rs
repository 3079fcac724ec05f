//! Buckets transactions by period and totals them for the dashboard.
//!
//! Bucket order is part of the contract: buckets appear in the order their
//! keys were first seen in the input. For every period except `Yearly` only
//! the first [`MAX_BUCKETS`] keys are kept and that window is returned
//! reversed. `Yearly` returns every bucket in first-seen order.

use crate::models::{Bucket, Period, ReportTransaction, Summary};
use crate::service::AnalysisError;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashMap;
use transactions::models::TransactionType;

pub const MAX_BUCKETS: usize = 10;

/// Parses a stored transaction date. Accepts RFC 3339 instants, naive
/// date-times (taken as UTC) and bare `YYYY-MM-DD` dates (UTC midnight).
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Week of the year, counting weeks that start on Sunday. The partial week
/// holding January 1st is week 1.
pub fn week_of_year(date: DateTime<Utc>) -> u32 {
    let day_of_year = date.ordinal0();
    let weekday = date.weekday().num_days_from_sunday();
    let jan1_weekday = (weekday + 7 - day_of_year % 7) % 7;
    (day_of_year + jan1_weekday + 1).div_ceil(7)
}

pub fn bucket_key(date: DateTime<Utc>, period: Period) -> String {
    match period {
        Period::Daily => date.format("%Y-%m-%d").to_string(),
        Period::Weekly => format!("Week {}, {}", week_of_year(date), date.year()),
        Period::Monthly => format!("{} {}", date.format("%b"), date.year()),
        Period::Yearly => date.year().to_string(),
    }
}

fn window(buckets: Vec<Bucket>, period: Period) -> Vec<Bucket> {
    match period {
        Period::Yearly => buckets,
        _ => {
            let mut kept: Vec<Bucket> = buckets.into_iter().take(MAX_BUCKETS).collect();
            kept.reverse();
            kept
        }
    }
}

/// Fails on the first transaction whose date cannot be parsed; nothing is
/// skipped.
pub fn aggregate(
    transactions: &[ReportTransaction],
    period: Period,
) -> Result<Summary, AnalysisError> {
    let mut summary = Summary::default();
    let mut buckets: Vec<Bucket> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for tx in transactions {
        let date = parse_date(&tx.date).ok_or_else(|| AnalysisError::InvalidDate {
            id: tx.id.clone(),
            date: tx.date.clone(),
        })?;

        let position = *positions
            .entry(bucket_key(date, period))
            .or_insert_with_key(|key| {
                buckets.push(Bucket {
                    key: key.clone(),
                    income: 0.0,
                    expenses: 0.0,
                });
                buckets.len() - 1
            });
        let bucket = &mut buckets[position];

        match tx.kind {
            TransactionType::Income => {
                bucket.income += tx.amount;
                summary.total_income += tx.amount;
            }
            TransactionType::Expense => {
                bucket.expenses += tx.amount;
                summary.total_expenses += tx.amount;
                summary.category_totals.record(tx.category, tx.amount);
            }
        }
    }

    summary.buckets = window(buckets, period);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryTotals;
    use transactions::models::Category;

    fn tx(
        date: &str,
        kind: TransactionType,
        amount: f64,
        category: Option<Category>,
    ) -> ReportTransaction {
        ReportTransaction {
            id: format!("{}-{}", date, amount),
            date: date.to_string(),
            description: "test".to_string(),
            amount,
            kind,
            category,
        }
    }

    fn income(date: &str, amount: f64) -> ReportTransaction {
        tx(date, TransactionType::Income, amount, Some(Category::Salary))
    }

    fn expense(date: &str, amount: f64, category: Option<Category>) -> ReportTransaction {
        tx(date, TransactionType::Expense, amount, category)
    }

    fn keys(summary: &Summary) -> Vec<&str> {
        summary.buckets.iter().map(|b| b.key.as_str()).collect()
    }

    fn utc(raw: &str) -> DateTime<Utc> {
        parse_date(raw).unwrap()
    }

    fn mixed() -> Vec<ReportTransaction> {
        vec![
            income("2024-01-05T09:00:00.000Z", 1000.0),
            expense("2024-01-06T12:30:00.000Z", 12.25, Some(Category::Food)),
            expense("2024-02-10T08:00:00.000Z", 300.0, Some(Category::Taxes)),
            expense("2024-02-11T08:00:00.000Z", 0.1, Some(Category::Transport)),
            expense("2024-02-11T18:00:00.000Z", 0.2, None),
            income("2023-12-31T23:59:59.999Z", 250.5),
            expense("2022-07-04T00:00:00Z", 40.0, Some(Category::Investment)),
            expense("2024-03-01", 7.0, Some(Category::Others)),
        ]
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(utc("2024-03-15").format("%Y-%m-%d %H:%M").to_string(), "2024-03-15 00:00");
        assert_eq!(utc("2024-03-15T10:20:30").format("%H:%M:%S").to_string(), "10:20:30");
        assert_eq!(utc("2024-03-15T10:20:30.123Z").format("%H:%M:%S").to_string(), "10:20:30");
        assert_eq!(utc("2024-03-15T23:30:00-05:00").format("%Y-%m-%d").to_string(), "2024-03-16");
        assert!(parse_date("").is_none());
        assert!(parse_date("yesterday").is_none());
        assert!(parse_date("2024-02-30").is_none());
    }

    #[test]
    fn test_bucket_keys() {
        let date = utc("2024-03-15T12:00:00.000Z");
        assert_eq!(bucket_key(date, Period::Daily), "2024-03-15");
        assert_eq!(bucket_key(date, Period::Monthly), "Mar 2024");
        assert_eq!(bucket_key(date, Period::Yearly), "2024");
        assert_eq!(bucket_key(date, Period::Weekly), "Week 11, 2024");
    }

    #[test]
    fn test_week_numbers_start_on_sunday() {
        // 2024-01-01 is a Monday.
        assert_eq!(week_of_year(utc("2024-01-01")), 1);
        assert_eq!(week_of_year(utc("2024-01-06")), 1);
        assert_eq!(week_of_year(utc("2024-01-07")), 2);
        assert_eq!(week_of_year(utc("2024-12-31")), 53);
        // 2023-01-01 is a Sunday.
        assert_eq!(week_of_year(utc("2023-01-01")), 1);
        assert_eq!(week_of_year(utc("2023-01-07")), 1);
        assert_eq!(week_of_year(utc("2023-01-08")), 2);
        // Time of day does not move a date into the next week.
        assert_eq!(week_of_year(utc("2023-01-07T23:59:59Z")), 1);
    }

    #[test]
    fn test_empty_input() {
        for period in Period::ALL {
            let summary = aggregate(&[], period).unwrap();
            assert!(summary.buckets.is_empty());
            assert_eq!(summary.total_income, 0.0);
            assert_eq!(summary.total_expenses, 0.0);
            assert_eq!(summary.category_totals, CategoryTotals::default());
        }
    }

    #[test]
    fn test_single_daily_expense() {
        let input = [expense("2024-03-15", 42.50, Some(Category::Food))];
        let summary = aggregate(&input, Period::Daily).unwrap();

        assert_eq!(
            summary.buckets,
            vec![Bucket {
                key: "2024-03-15".into(),
                income: 0.0,
                expenses: 42.5,
            }]
        );
        assert_eq!(summary.total_expenses, 42.5);
        assert_eq!(summary.total_income, 0.0);
        assert_eq!(summary.category_totals.food, 42.5);
    }

    #[test]
    fn test_monthly_same_month() {
        let input = [
            income("2024-05-02T10:00:00.000Z", 1000.0),
            expense("2024-05-20T10:00:00.000Z", 200.0, Some(Category::Transport)),
        ];
        let summary = aggregate(&input, Period::Monthly).unwrap();

        assert_eq!(
            summary.buckets,
            vec![Bucket {
                key: "May 2024".into(),
                income: 1000.0,
                expenses: 200.0,
            }]
        );
        assert_eq!(summary.total_income, 1000.0);
        assert_eq!(summary.total_expenses, 200.0);
        assert_eq!(summary.category_totals.transport, 200.0);
        assert_eq!(summary.balance(), 800.0);
    }

    #[test]
    fn test_yearly_keeps_insertion_order() {
        let input = [
            income("2023-06-01", 1.0),
            income("2022-06-01", 2.0),
            income("2024-06-01", 3.0),
        ];
        let summary = aggregate(&input, Period::Yearly).unwrap();
        assert_eq!(keys(&summary), vec!["2023", "2022", "2024"]);
        assert_eq!(summary.buckets[1].income, 2.0);
    }

    #[test]
    fn test_yearly_is_not_capped() {
        let input: Vec<_> = (2000..2015).map(|y| income(&format!("{}-01-01", y), 1.0)).collect();
        let summary = aggregate(&input, Period::Yearly).unwrap();
        assert_eq!(summary.buckets.len(), 15);
        assert_eq!(summary.buckets[0].key, "2000");
        assert_eq!(summary.buckets[14].key, "2014");
    }

    #[test]
    fn test_daily_window_keeps_first_ten_reversed() {
        let input: Vec<_> = (1..=15)
            .map(|d| income(&format!("2024-04-{:02}", d), d as f64))
            .collect();
        let summary = aggregate(&input, Period::Daily).unwrap();

        assert_eq!(summary.buckets.len(), MAX_BUCKETS);
        let expected: Vec<String> = (1..=10).rev().map(|d| format!("2024-04-{:02}", d)).collect();
        assert_eq!(keys(&summary), expected.iter().map(String::as_str).collect::<Vec<_>>());
        // Totals still cover every transaction, not just the window.
        assert_eq!(summary.total_income, (1..=15).sum::<i32>() as f64);
    }

    #[test]
    fn test_window_under_cap_is_reversed() {
        let input = [
            income("2024-01-15", 1.0),
            income("2024-03-15", 1.0),
            income("2024-01-20", 1.0),
            income("2024-02-15", 1.0),
        ];
        let summary = aggregate(&input, Period::Monthly).unwrap();
        assert_eq!(keys(&summary), vec!["Feb 2024", "Mar 2024", "Jan 2024"]);
        assert_eq!(summary.buckets[2].income, 2.0);
    }

    #[test]
    fn test_weekly_grouping() {
        let input = [
            expense("2024-01-01", 1.0, None),
            expense("2024-01-06T23:00:00Z", 2.0, None),
            expense("2024-01-07", 4.0, None),
        ];
        let summary = aggregate(&input, Period::Weekly).unwrap();
        assert_eq!(
            summary.buckets,
            vec![
                Bucket {
                    key: "Week 2, 2024".into(),
                    income: 0.0,
                    expenses: 4.0,
                },
                Bucket {
                    key: "Week 1, 2024".into(),
                    income: 0.0,
                    expenses: 3.0,
                },
            ]
        );
    }

    #[test]
    fn test_totals_do_not_depend_on_period() {
        let input = mixed();
        let expected_income: f64 = input
            .iter()
            .filter(|t| t.kind == TransactionType::Income)
            .map(|t| t.amount)
            .sum();
        let expected_expenses: f64 = input
            .iter()
            .filter(|t| t.kind == TransactionType::Expense)
            .map(|t| t.amount)
            .sum();

        for period in Period::ALL {
            let summary = aggregate(&input, period).unwrap();
            assert_eq!(summary.total_income, expected_income, "{period}");
            assert_eq!(summary.total_expenses, expected_expenses, "{period}");
        }
    }

    #[test]
    fn test_breakdown_is_bounded_by_expenses() {
        let summary = aggregate(&mixed(), Period::Monthly).unwrap();
        assert!(summary.category_totals.sum() <= summary.total_expenses);
        assert!(summary.category_totals.sum() < summary.total_expenses);

        let only_breakdown = [
            expense("2024-01-01", 1.0, Some(Category::Food)),
            expense("2024-01-02", 2.0, Some(Category::Taxes)),
            income("2024-01-03", 50.0),
        ];
        let summary = aggregate(&only_breakdown, Period::Daily).unwrap();
        assert_eq!(summary.category_totals.sum(), summary.total_expenses);
    }

    #[test]
    fn test_income_never_counts_toward_breakdown() {
        let input = [tx("2024-01-01", TransactionType::Income, 9.0, Some(Category::Food))];
        let summary = aggregate(&input, Period::Daily).unwrap();
        assert_eq!(summary.category_totals, CategoryTotals::default());
        assert_eq!(summary.total_income, 9.0);
    }

    #[test]
    fn test_deterministic() {
        let input = mixed();
        for period in Period::ALL {
            assert_eq!(aggregate(&input, period).unwrap(), aggregate(&input, period).unwrap());
        }
    }

    #[test]
    fn test_invalid_date_fails_whole_batch() {
        let mut input = mixed();
        input.insert(3, ReportTransaction {
            id: "bad".into(),
            ..income("31/12/2024", 5.0)
        });

        for period in Period::ALL {
            let err = aggregate(&input, period).unwrap_err();
            assert!(matches!(
                &err,
                AnalysisError::InvalidDate { id, date } if id == "bad" && date == "31/12/2024"
            ));
        }
    }
}
