// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{Error, Result};
use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(Error::InvalidArgument(format!(
                "transaction type '{}' (expected income|expense)",
                other
            ))),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recurrence of a transaction and length of a budget window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    /// First day after a window of this length that starts on `start`.
    /// `None` when the calendar overflows.
    pub fn advance(&self, start: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Daily => start.checked_add_days(Days::new(1)),
            Self::Weekly => start.checked_add_days(Days::new(7)),
            Self::Monthly => start.checked_add_months(Months::new(1)),
            Self::Quarterly => start.checked_add_months(Months::new(3)),
            Self::Yearly => start.checked_add_months(Months::new(12)),
        }
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" => Ok(Self::Yearly),
            other => Err(Error::InvalidArgument(format!(
                "period '{}' (expected daily|weekly|monthly|quarterly|yearly)",
                other
            ))),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_period: Option<Period>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

// Remote records sometimes carry a full timestamp where a date is expected.
fn lenient_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    crate::utils::parse_date_value(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!(
            "invalid date '{}', expected YYYY-MM-DD or RFC3339",
            raw
        ))
    })
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }
}

/// Input for `add_transaction`. Identity and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurring_period: Option<Period>,
}

impl NewTransaction {
    pub fn new(kind: TransactionType, amount: Decimal, category: &str, date: NaiveDate) -> Self {
        Self {
            kind,
            amount,
            category: category.to_string(),
            description: None,
            date,
            is_recurring: false,
            recurring_period: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn recurring(mut self, period: Period) -> Self {
        self.is_recurring = true;
        self.recurring_period = Some(period);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate_amount(self.amount)?;
        validate_category(&self.category)
    }

    pub(crate) fn into_transaction(self, id: String, now: DateTime<Utc>) -> Transaction {
        Transaction {
            id,
            kind: self.kind,
            amount: self.amount,
            category: self.category.trim().to_string(),
            description: normalize_text(self.description),
            date: self.date,
            is_recurring: self.is_recurring,
            recurring_period: if self.is_recurring {
                self.recurring_period
            } else {
                None
            },
            created_at: now,
            updated_at: None,
        }
    }
}

/// Typed partial update for a transaction. Absent fields are left untouched;
/// an empty `description` clears it and `is_recurring: false` drops the period.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransactionPatch {
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub is_recurring: Option<bool>,
    pub recurring_period: Option<Period>,
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }
        if let Some(ref category) = self.category {
            validate_category(category)?;
        }
        Ok(())
    }

    pub(crate) fn apply_to(&self, tx: &mut Transaction, now: DateTime<Utc>) {
        if let Some(kind) = self.kind {
            tx.kind = kind;
        }
        if let Some(amount) = self.amount {
            tx.amount = amount;
        }
        if let Some(ref category) = self.category {
            tx.category = category.trim().to_string();
        }
        if let Some(ref description) = self.description {
            tx.description = normalize_text(Some(description.clone()));
        }
        if let Some(date) = self.date {
            tx.date = date;
        }
        if let Some(period) = self.recurring_period {
            tx.is_recurring = true;
            tx.recurring_period = Some(period);
        }
        if let Some(recurring) = self.is_recurring {
            tx.is_recurring = recurring;
            if !recurring {
                tx.recurring_period = None;
            }
        }
        tx.updated_at = Some(now);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: String,
    pub category: String,
    pub amount: Decimal,
    pub period: Period,
    #[serde(deserialize_with = "lenient_date")]
    pub start_date: NaiveDate,
    #[serde(default = "default_enable_alerts")]
    pub enable_alerts: bool,
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: u8,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Budget {
    /// Last day (inclusive) the budget covers: `start_date + period - 1 day`.
    /// Saturates at `NaiveDate::MAX` when the calendar overflows.
    pub fn end_date(&self) -> NaiveDate {
        self.period
            .advance(self.start_date)
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        self.end_date() >= day
    }
}

pub const DEFAULT_ALERT_THRESHOLD: u8 = 80;

fn default_enable_alerts() -> bool {
    true
}

fn default_alert_threshold() -> u8 {
    DEFAULT_ALERT_THRESHOLD
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewBudget {
    pub category: String,
    pub amount: Decimal,
    pub period: Period,
    pub start_date: NaiveDate,
    #[serde(default = "default_enable_alerts")]
    pub enable_alerts: bool,
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: u8,
}

impl NewBudget {
    pub fn new(category: &str, amount: Decimal, period: Period, start_date: NaiveDate) -> Self {
        Self {
            category: category.to_string(),
            amount,
            period,
            start_date,
            enable_alerts: true,
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
        }
    }

    pub fn with_alerts(mut self, enabled: bool, threshold: u8) -> Self {
        self.enable_alerts = enabled;
        self.alert_threshold = threshold;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate_amount(self.amount)?;
        validate_category(&self.category)?;
        validate_threshold(self.alert_threshold)
    }

    pub(crate) fn into_budget(self, id: String, now: DateTime<Utc>) -> Budget {
        Budget {
            id,
            category: self.category.trim().to_string(),
            amount: self.amount,
            period: self.period,
            start_date: self.start_date,
            enable_alerts: self.enable_alerts,
            alert_threshold: self.alert_threshold,
            created_at: now,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BudgetPatch {
    pub category: Option<String>,
    pub amount: Option<Decimal>,
    pub period: Option<Period>,
    pub start_date: Option<NaiveDate>,
    pub enable_alerts: Option<bool>,
    pub alert_threshold: Option<u8>,
}

impl BudgetPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }
        if let Some(ref category) = self.category {
            validate_category(category)?;
        }
        if let Some(threshold) = self.alert_threshold {
            validate_threshold(threshold)?;
        }
        Ok(())
    }

    pub(crate) fn apply_to(&self, budget: &mut Budget, now: DateTime<Utc>) {
        if let Some(ref category) = self.category {
            budget.category = category.trim().to_string();
        }
        if let Some(amount) = self.amount {
            budget.amount = amount;
        }
        if let Some(period) = self.period {
            budget.period = period;
        }
        if let Some(start) = self.start_date {
            budget.start_date = start;
        }
        if let Some(enabled) = self.enable_alerts {
            budget.enable_alerts = enabled;
        }
        if let Some(threshold) = self.alert_threshold {
            budget.alert_threshold = threshold;
        }
        budget.updated_at = Some(now);
    }
}

/// Coarse classification of budget progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Safe,
    Caution,
    Warning,
    Exceeded,
}

impl BudgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Caution => "caution",
            Self::Warning => "warning",
            Self::Exceeded => "exceeded",
        }
    }
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived view of a budget against current spending. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetProgress {
    pub budget: Budget,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub progress: Decimal,
    pub status: BudgetStatus,
    pub alert_triggered: bool,
}

pub(crate) fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::Validation(format!(
            "amount must be greater than zero, got {}",
            amount
        )));
    }
    Ok(())
}

pub(crate) fn validate_category(category: &str) -> Result<()> {
    if category.trim().is_empty() {
        return Err(Error::Validation("category is required".into()));
    }
    Ok(())
}

fn validate_threshold(threshold: u8) -> Result<()> {
    if !(1..=100).contains(&threshold) {
        return Err(Error::Validation(format!(
            "alert threshold must be between 1 and 100, got {}",
            threshold
        )));
    }
    Ok(())
}

fn normalize_text(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, Self::Dark)
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(Error::InvalidArgument(format!(
                "theme '{}' (expected light|dark)",
                other
            ))),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named date formats a user can pick. Serialized by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFormat {
    #[default]
    #[serde(rename = "MM/DD/YYYY")]
    MonthDayYear,
    #[serde(rename = "DD/MM/YYYY")]
    DayMonthYear,
    #[serde(rename = "YYYY-MM-DD")]
    Iso,
    #[serde(rename = "MMM DD, YYYY")]
    Long,
}

impl DateFormat {
    pub const ALL: [DateFormat; 4] = [
        Self::MonthDayYear,
        Self::DayMonthYear,
        Self::Iso,
        Self::Long,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::MonthDayYear => "MM/DD/YYYY",
            Self::DayMonthYear => "DD/MM/YYYY",
            Self::Iso => "YYYY-MM-DD",
            Self::Long => "MMM DD, YYYY",
        }
    }

    /// chrono `strftime` pattern.
    pub fn pattern(&self) -> &'static str {
        match self {
            Self::MonthDayYear => "%m/%d/%Y",
            Self::DayMonthYear => "%d/%m/%Y",
            Self::Iso => "%Y-%m-%d",
            Self::Long => "%b %d, %Y",
        }
    }
}

impl FromStr for DateFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "date format '{}' (expected one of MM/DD/YYYY, DD/MM/YYYY, YYYY-MM-DD, MMM DD, YYYY)",
                    wanted
                ))
            })
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub budget_alerts: bool,
    pub monthly_reports: bool,
    pub bill_reminders: bool,
    pub unusual_spending: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            budget_alerts: true,
            monthly_reports: true,
            bill_reminders: true,
            unusual_spending: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NotificationsPatch {
    pub budget_alerts: Option<bool>,
    pub monthly_reports: Option<bool>,
    pub bill_reminders: Option<bool>,
    pub unusual_spending: Option<bool>,
}

impl NotificationsPatch {
    pub(crate) fn apply_to(&self, n: &mut NotificationSettings) {
        if let Some(v) = self.budget_alerts {
            n.budget_alerts = v;
        }
        if let Some(v) = self.monthly_reports {
            n.monthly_reports = v;
        }
        if let Some(v) = self.bill_reminders {
            n.bill_reminders = v;
        }
        if let Some(v) = self.unusual_spending {
            n.unusual_spending = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub theme: Theme,
    pub currency: String,
    pub language: String,
    pub date_format: DateFormat,
    pub notifications: NotificationSettings,
}

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_LANGUAGE: &str = "en";

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            currency: DEFAULT_CURRENCY.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            date_format: DateFormat::default(),
            notifications: NotificationSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(Error::InvalidArgument(format!(
                "role '{}' (expected user|admin)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Authenticated session; persisted as three separate keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub token: String,
    pub role: Role,
}
