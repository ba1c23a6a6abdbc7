// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::{MemoryStorage, Storage};
use crate::models::BudgetProgress;
use crate::store::{BudgetStore, SessionStore, SettingsStore, ThemeSink, TransactionStore};
use std::rc::Rc;

/// Owns every store. Built once and handed to the UI layer; tests build a
/// fresh one per case over [`MemoryStorage`].
pub struct AppContext {
    pub transactions: TransactionStore,
    pub budgets: BudgetStore,
    pub settings: SettingsStore,
    pub session: SessionStore,
}

impl AppContext {
    pub fn open(storage: Rc<dyn Storage>, theme_sink: Option<Rc<dyn ThemeSink>>) -> Self {
        Self {
            transactions: TransactionStore::open(storage.clone()),
            budgets: BudgetStore::open(storage.clone()),
            settings: SettingsStore::open(storage.clone(), theme_sink),
            session: SessionStore::open(storage),
        }
    }

    pub fn in_memory() -> Self {
        Self::open(Rc::new(MemoryStorage::new()), None)
    }

    pub fn budget_progress(&self) -> Vec<BudgetProgress> {
        self.budgets.progress_all(&self.transactions)
    }

    /// Triggered alerts, or none when the user turned budget alerts off.
    pub fn budget_alerts(&self) -> Vec<BudgetProgress> {
        if !self.settings.settings().notifications.budget_alerts {
            return Vec::new();
        }
        self.budgets.alerts(&self.transactions)
    }

    /// Formats an amount in the configured currency.
    pub fn money(&self, amount: rust_decimal::Decimal) -> String {
        crate::utils::format_currency(amount, &self.settings.settings().currency)
    }

    /// Formats a date in the configured format.
    pub fn date(&self, date: chrono::NaiveDate) -> String {
        crate::utils::format_date(date, self.settings.settings().date_format.name())
    }
}
