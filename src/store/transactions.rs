// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{FetchGuard, FetchTicket, Listener, ListenerId, Persisted, PersistentStore};
use crate::db::Storage;
use crate::error::Result;
use crate::models::{NewTransaction, Transaction, TransactionPatch, TransactionType};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::rc::Rc;

/// All transactions plus their income/expense partitions.
///
/// `incomes` and `expenses` are always exactly `transactions` split by type,
/// in the same order. Only `transactions` is persisted; the partitions are
/// re-derived on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Transaction>", into = "Vec<Transaction>")]
pub struct TransactionState {
    transactions: Vec<Transaction>,
    incomes: Vec<Transaction>,
    expenses: Vec<Transaction>,
}

impl TransactionState {
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn incomes(&self) -> &[Transaction] {
        &self.incomes
    }

    pub fn expenses(&self) -> &[Transaction] {
        &self.expenses
    }

    fn insert_front(&mut self, tx: Transaction) {
        match tx.kind {
            TransactionType::Income => self.incomes.insert(0, tx.clone()),
            TransactionType::Expense => self.expenses.insert(0, tx.clone()),
        }
        self.transactions.insert(0, tx);
    }

    fn repartition(&mut self) {
        let (incomes, expenses) = self
            .transactions
            .iter()
            .cloned()
            .partition(|t| t.kind == TransactionType::Income);
        self.incomes = incomes;
        self.expenses = expenses;
    }
}

impl From<Vec<Transaction>> for TransactionState {
    fn from(transactions: Vec<Transaction>) -> Self {
        let mut state = Self {
            transactions,
            ..Self::default()
        };
        state.repartition();
        state
    }
}

impl From<TransactionState> for Vec<Transaction> {
    fn from(state: TransactionState) -> Self {
        state.transactions
    }
}

impl Persisted for TransactionState {
    const KEY: &'static str = "transactions";

    fn restore(raw: serde_json::Value) -> Option<Self> {
        let serde_json::Value::Array(items) = raw else {
            return None;
        };
        let total = items.len();
        let list: Vec<Transaction> = items
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect();
        if list.len() != total {
            tracing::warn!(
                skipped = total - list.len(),
                "dropped malformed stored transactions"
            );
        }
        Some(list.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    pub month: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

pub struct TransactionStore {
    store: PersistentStore<TransactionState>,
    fetches: FetchGuard,
}

impl TransactionStore {
    pub fn open(storage: Rc<dyn Storage>) -> Self {
        let store: PersistentStore<TransactionState> = PersistentStore::open(storage);
        tracing::debug!(
            count = store.state().transactions.len(),
            "loaded transactions"
        );
        Self {
            store,
            fetches: FetchGuard::default(),
        }
    }

    pub fn get_state(&self) -> TransactionState {
        self.store.get_state()
    }

    pub fn subscribe(&mut self, listener: Listener<TransactionState>) -> ListenerId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.store.unsubscribe(id)
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.store.state().transactions()
    }

    pub fn incomes(&self) -> &[Transaction] {
        self.store.state().incomes()
    }

    pub fn expenses(&self) -> &[Transaction] {
        self.store.state().expenses()
    }

    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.transactions().iter().find(|t| t.id == id)
    }

    pub fn add_transaction(&mut self, input: NewTransaction) -> Result<Transaction> {
        input.validate()?;
        let tx = input.into_transaction(super::new_id(), Utc::now());
        tracing::debug!(id = %tx.id, kind = %tx.kind, amount = %tx.amount, "add transaction");
        let added = tx.clone();
        self.store.set_state(|s| s.insert_front(tx))?;
        Ok(added)
    }

    /// Merges `patch` into the transaction with `id`. An unknown id is
    /// `NotFound` and leaves state, storage and subscribers untouched.
    pub fn update_transaction(&mut self, id: &str, patch: TransactionPatch) -> Result<Transaction> {
        let pos = super::position_of(self.transactions(), id, "transaction", |t| t.id.as_str())?;
        patch.validate()?;
        let mut updated = self.transactions()[pos].clone();
        patch.apply_to(&mut updated, Utc::now());
        tracing::debug!(id, "update transaction");
        let out = updated.clone();
        self.store.set_state(|s| {
            s.transactions[pos] = updated;
            s.repartition();
        })?;
        Ok(out)
    }

    pub fn delete_transaction(&mut self, id: &str) -> Result<Transaction> {
        let pos = super::position_of(self.transactions(), id, "transaction", |t| t.id.as_str())?;
        let removed = self.transactions()[pos].clone();
        tracing::debug!(id, "delete transaction");
        self.store.set_state(|s| {
            s.transactions.remove(pos);
            s.incomes.retain(|t| t.id != removed.id);
            s.expenses.retain(|t| t.id != removed.id);
        })?;
        Ok(removed)
    }

    /// Bulk replace, e.g. after loading from the remote API.
    pub fn set_transactions(&mut self, list: Vec<Transaction>) -> Result<()> {
        tracing::debug!(count = list.len(), "replace transactions");
        self.store.replace(TransactionState::from(list))
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.fetches.issue()
    }

    /// Applies a fetched list if `ticket` is still the latest one issued.
    /// Returns `false` (and changes nothing) for a superseded ticket.
    pub fn apply_fetched(&mut self, ticket: FetchTicket, list: Vec<Transaction>) -> Result<bool> {
        if !self.fetches.is_current(ticket) {
            tracing::warn!(?ticket, "discarding superseded transaction fetch");
            return Ok(false);
        }
        self.set_transactions(list)?;
        Ok(true)
    }

    pub fn total_income(&self) -> Decimal {
        self.incomes().iter().map(|t| t.amount).sum()
    }

    pub fn total_expense(&self) -> Decimal {
        self.expenses().iter().map(|t| t.amount).sum()
    }

    pub fn balance(&self) -> Decimal {
        self.total_income() - self.total_expense()
    }

    /// Transactions dated within `[start, end]`, both ends inclusive.
    pub fn filter_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = &Transaction> + '_ {
        self.transactions()
            .iter()
            .filter(move |t| t.date >= start && t.date <= end)
    }

    pub fn filter_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a Transaction> + 'a {
        self.transactions()
            .iter()
            .filter(move |t| t.category == category)
    }

    pub fn spent_in_category(&self, category: &str) -> Decimal {
        self.expenses()
            .iter()
            .filter(|t| t.category == category)
            .map(|t| t.amount)
            .sum()
    }

    /// Most recent by date, newest first.
    pub fn recent(&self, limit: usize) -> Vec<&Transaction> {
        let mut out: Vec<&Transaction> = self.transactions().iter().collect();
        out.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        out.truncate(limit);
        out
    }

    /// Income, expense and net per `YYYY-MM`, newest month first.
    pub fn monthly_summary(&self) -> Vec<MonthlySummary> {
        let mut map: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
        for t in self.transactions() {
            let entry = map
                .entry(t.date.format("%Y-%m").to_string())
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            match t.kind {
                TransactionType::Income => entry.0 += t.amount,
                TransactionType::Expense => entry.1 += t.amount,
            }
        }
        map.into_iter()
            .rev()
            .map(|(month, (income, expense))| MonthlySummary {
                month,
                income,
                expense,
                net: income - expense,
            })
            .collect()
    }
}
