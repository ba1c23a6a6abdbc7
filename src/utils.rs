// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{Error, Result as CoreResult};
use crate::models::{BudgetStatus, DateFormat, Period, Transaction};
use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Days, NaiveDate};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

const UA: &str = concat!("fintrack/", env!("CARGO_PKG_VERSION"));

pub fn http_client(timeout: Duration) -> CoreResult<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(UA)
        .build()?;
    Ok(c)
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: Serialize>(json_flag: bool, jsonl_flag: bool, v: &T) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

// Currency

pub fn currency_symbol(code: &str) -> &'static str {
    match code.trim().to_ascii_uppercase().as_str() {
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" => "¥",
        "CNY" => "¥",
        "INR" => "₹",
        "KRW" => "₩",
        "RUB" => "₽",
        "TRY" => "₺",
        "BRL" => "R$",
        "CAD" => "C$",
        "AUD" => "A$",
        _ => "$",
    }
}

/// Symbol-prefixed absolute amount with two decimals and comma grouping,
/// e.g. `1234.5` in USD is `"$1,234.50"`. The sign is never rendered.
pub fn format_currency(amount: Decimal, code: &str) -> String {
    let rounded = amount
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let formatted = format!("{rounded:.2}");
    let (int_part, dec_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    format!(
        "{}{}.{}",
        currency_symbol(code),
        group_thousands(int_part),
        dec_part
    )
}

fn group_thousands(digits: &str) -> String {
    digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",")
}

// Dates

pub const DEFAULT_DATE_PATTERN: &str = "%b %d, %Y";

/// Formats `date` with the named format; unknown names fall back to
/// [`DEFAULT_DATE_PATTERN`].
pub fn format_date(date: NaiveDate, format_name: &str) -> String {
    let pattern = format_name
        .parse::<DateFormat>()
        .map(|f| f.pattern())
        .unwrap_or(DEFAULT_DATE_PATTERN);
    date.format(pattern).to_string()
}

/// Calendar date from `YYYY-MM-DD` or an RFC3339 timestamp (its date part).
pub fn parse_date_value(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| dt.date_naive())
    })
}

/// Like [`format_date`] but takes `YYYY-MM-DD` or an RFC3339 timestamp.
pub fn format_date_str(value: &str, format_name: &str) -> CoreResult<String> {
    let date = parse_date_value(value)
        .ok_or_else(|| Error::InvalidArgument(format!("unparseable date '{}'", value.trim())))?;
    Ok(format_date(date, format_name))
}

/// Calendar window of `period` containing `day`: the day itself, its
/// Monday-to-Sunday week, or its month, quarter or year.
pub fn period_window(period: Period, day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = match period {
        Period::Daily => day,
        Period::Weekly => day
            .checked_sub_days(Days::new(u64::from(day.weekday().num_days_from_monday())))
            .unwrap_or(day),
        Period::Monthly => day.with_day(1).unwrap_or(day),
        Period::Quarterly => {
            let first_month = (day.month0() / 3) * 3 + 1;
            NaiveDate::from_ymd_opt(day.year(), first_month, 1).unwrap_or(day)
        }
        Period::Yearly => NaiveDate::from_ymd_opt(day.year(), 1, 1).unwrap_or(day),
    };
    let end = period
        .advance(start)
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX);
    (start, end)
}

// Percentages and budget progress

/// `value / total * 100` rounded to one decimal; `0` when `total` is zero.
pub fn calculate_percentage(value: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        return Decimal::ZERO;
    }
    value
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|v| v.checked_div(total))
        .map(|p| p.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
        .unwrap_or(Decimal::ZERO)
}

/// `min(100, spent / amount * 100)`, clamped to `[0, 100]`.
pub fn calculate_budget_progress(spent: Decimal, amount: Decimal) -> Decimal {
    if amount <= Decimal::ZERO {
        return if spent > Decimal::ZERO {
            Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
    }
    spent
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|v| v.checked_div(amount))
        .unwrap_or(Decimal::ONE_HUNDRED)
        .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}

const EXCEEDED_AT: Decimal = Decimal::ONE_HUNDRED;
const WARNING_AT: Decimal = Decimal::from_parts(90, 0, 0, false, 0);
const CAUTION_AT: Decimal = Decimal::from_parts(75, 0, 0, false, 0);

/// Fixed thresholds, independent of a budget's own alert threshold.
pub fn budget_status(progress: Decimal) -> BudgetStatus {
    if progress >= EXCEEDED_AT {
        BudgetStatus::Exceeded
    } else if progress >= WARNING_AT {
        BudgetStatus::Warning
    } else if progress >= CAUTION_AT {
        BudgetStatus::Caution
    } else {
        BudgetStatus::Safe
    }
}

// Grouping

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionGroup {
    pub key: String,
    pub total: Decimal,
    pub count: usize,
    pub transactions: Vec<Transaction>,
}

pub fn group_by_category(transactions: &[Transaction]) -> Vec<TransactionGroup> {
    group_by(transactions, |t| t.category.clone())
}

/// Buckets keyed by `YYYY-MM-DD`.
pub fn group_by_date(transactions: &[Transaction]) -> Vec<TransactionGroup> {
    group_by(transactions, |t| t.date.to_string())
}

// Buckets come out in first-seen order of the input.
fn group_by(
    transactions: &[Transaction],
    key_of: impl Fn(&Transaction) -> String,
) -> Vec<TransactionGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<TransactionGroup> = Vec::new();
    for t in transactions {
        let key = key_of(t);
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(TransactionGroup {
                key,
                total: Decimal::ZERO,
                count: 0,
                transactions: Vec::new(),
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.total += t.amount;
        group.count += 1;
        group.transactions.push(t.clone());
    }
    groups
}

// Validation

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordStrength {
    pub min_length: bool,
    pub has_upper: bool,
    pub has_lower: bool,
    pub has_digit: bool,
    pub has_special: bool,
    /// Number of the five checks above that pass.
    pub strength: u8,
}

impl PasswordStrength {
    pub fn is_valid(&self) -> bool {
        self.strength == 5
    }
}

pub fn validate_password(password: &str) -> PasswordStrength {
    let min_length = password.chars().count() >= MIN_PASSWORD_LEN;
    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace());
    let strength = [min_length, has_upper, has_lower, has_digit, has_special]
        .into_iter()
        .filter(|ok| *ok)
        .count() as u8;
    PasswordStrength {
        min_length,
        has_upper,
        has_lower,
        has_digit,
        has_special,
        strength,
    }
}

/// Truncates to at most `max` characters, counting the trailing `…`.
pub fn truncate_text(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if s.chars().count() <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max - 1).collect();
    format!("{head}…")
}
