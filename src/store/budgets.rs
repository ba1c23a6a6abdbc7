// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{FetchGuard, FetchTicket, Listener, ListenerId, Persisted, PersistentStore};
use super::transactions::TransactionStore;
use crate::db::Storage;
use crate::error::{Error, Result};
use crate::models::{Budget, BudgetPatch, BudgetProgress, NewBudget, Period};
use crate::utils::{budget_status, calculate_budget_progress};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Budget definitions in insertion order. Persisted as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BudgetState {
    pub budgets: Vec<Budget>,
}

impl Persisted for BudgetState {
    const KEY: &'static str = "budgets";

    fn restore(raw: serde_json::Value) -> Option<Self> {
        let serde_json::Value::Array(items) = raw else {
            return None;
        };
        let total = items.len();
        let budgets: Vec<Budget> = items
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect();
        if budgets.len() != total {
            tracing::warn!(
                skipped = total - budgets.len(),
                "dropped malformed stored budgets"
            );
        }
        Some(Self { budgets })
    }
}

pub struct BudgetStore {
    store: PersistentStore<BudgetState>,
    fetches: FetchGuard,
}

impl BudgetStore {
    pub fn open(storage: Rc<dyn Storage>) -> Self {
        Self {
            store: PersistentStore::open(storage),
            fetches: FetchGuard::default(),
        }
    }

    pub fn get_state(&self) -> BudgetState {
        self.store.get_state()
    }

    pub fn subscribe(&mut self, listener: Listener<BudgetState>) -> ListenerId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.store.unsubscribe(id)
    }

    pub fn budgets(&self) -> &[Budget] {
        &self.store.state().budgets
    }

    pub fn get(&self, id: &str) -> Option<&Budget> {
        self.budgets().iter().find(|b| b.id == id)
    }

    pub fn add_budget(&mut self, input: NewBudget) -> Result<Budget> {
        input.validate()?;
        self.ensure_unique(input.category.trim(), input.period, None)?;
        let budget = input.into_budget(super::new_id(), Utc::now());
        tracing::debug!(id = %budget.id, category = %budget.category, period = %budget.period, "add budget");
        let added = budget.clone();
        self.store.set_state(|s| s.budgets.push(budget))?;
        Ok(added)
    }

    pub fn update_budget(&mut self, id: &str, patch: BudgetPatch) -> Result<Budget> {
        let pos = super::position_of(self.budgets(), id, "budget", |b| b.id.as_str())?;
        patch.validate()?;
        let mut updated = self.budgets()[pos].clone();
        patch.apply_to(&mut updated, Utc::now());
        self.ensure_unique(&updated.category, updated.period, Some(id))?;
        tracing::debug!(id, "update budget");
        let out = updated.clone();
        self.store.set_state(|s| s.budgets[pos] = updated)?;
        Ok(out)
    }

    pub fn delete_budget(&mut self, id: &str) -> Result<Budget> {
        let pos = super::position_of(self.budgets(), id, "budget", |b| b.id.as_str())?;
        tracing::debug!(id, "delete budget");
        let removed = self.budgets()[pos].clone();
        self.store.set_state(|s| {
            s.budgets.remove(pos);
        })?;
        Ok(removed)
    }

    pub fn set_budgets(&mut self, budgets: Vec<Budget>) -> Result<()> {
        tracing::debug!(count = budgets.len(), "replace budgets");
        self.store.replace(BudgetState { budgets })
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.fetches.issue()
    }

    pub fn apply_fetched(&mut self, ticket: FetchTicket, budgets: Vec<Budget>) -> Result<bool> {
        if !self.fetches.is_current(ticket) {
            tracing::warn!(?ticket, "discarding superseded budget fetch");
            return Ok(false);
        }
        self.set_budgets(budgets)?;
        Ok(true)
    }

    /// First budget for `category` in insertion order.
    pub fn get_budget_by_category(&self, category: &str) -> Option<&Budget> {
        self.budgets().iter().find(|b| b.category == category)
    }

    pub fn get_active_budgets(&self) -> Vec<&Budget> {
        self.active_budgets_on(Utc::now().date_naive())
    }

    /// Budgets whose derived end date is on or after `day`.
    pub fn active_budgets_on(&self, day: NaiveDate) -> Vec<&Budget> {
        self.budgets()
            .iter()
            .filter(|b| b.is_active_on(day))
            .collect()
    }

    pub fn progress(&self, budget: &Budget, transactions: &TransactionStore) -> BudgetProgress {
        let spent = transactions.spent_in_category(&budget.category);
        let progress = calculate_budget_progress(spent, budget.amount);
        BudgetProgress {
            budget: budget.clone(),
            spent,
            remaining: (budget.amount - spent).max(Decimal::ZERO),
            progress,
            status: budget_status(progress),
            alert_triggered: budget.enable_alerts
                && progress >= Decimal::from(budget.alert_threshold),
        }
    }

    pub fn progress_all(&self, transactions: &TransactionStore) -> Vec<BudgetProgress> {
        self.budgets()
            .iter()
            .map(|b| self.progress(b, transactions))
            .collect()
    }

    /// Budgets with alerts enabled whose progress reached their own threshold.
    pub fn alerts(&self, transactions: &TransactionStore) -> Vec<BudgetProgress> {
        self.progress_all(transactions)
            .into_iter()
            .filter(|p| p.alert_triggered)
            .collect()
    }

    fn ensure_unique(&self, category: &str, period: Period, skip_id: Option<&str>) -> Result<()> {
        let clash = self
            .budgets()
            .iter()
            .filter(|b| Some(b.id.as_str()) != skip_id)
            .any(|b| b.category == category && b.period == period);
        if clash {
            return Err(Error::Validation(format!(
                "a {} budget for '{}' already exists",
                period, category
            )));
        }
        Ok(())
    }
}
