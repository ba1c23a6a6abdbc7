// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Observable, persisted state containers.
//!
//! [`PersistentStore`] is the primitive every domain store wraps: it loads its
//! document from [`Storage`] once at construction, and every mutation
//! persists the whole state and then notifies every subscriber before
//! returning. Only the owning store's actions get `&mut` access, so consumers
//! only ever see read-only snapshots.

pub mod budgets;
pub mod fetch;
pub mod session;
pub mod settings;
pub mod transactions;

use crate::db::Storage;
use crate::error::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::rc::Rc;

pub use budgets::BudgetStore;
pub use fetch::{FetchGuard, FetchTicket};
pub use session::SessionStore;
pub use settings::{DarkModeFlag, SettingsStore, ThemeSink};
pub use transactions::TransactionStore;

/// Callback invoked with the new state after every mutation.
pub type Listener<S> = Rc<dyn Fn(&S)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A state document that lives under a fixed storage key.
pub trait Persisted: Clone + Default + Serialize + DeserializeOwned {
    const KEY: &'static str;

    /// Rebuild state from a parsed stored document. `None` means the document
    /// is unusable and the default state is used instead.
    fn restore(raw: serde_json::Value) -> Option<Self> {
        serde_json::from_value(raw).ok()
    }
}

pub struct PersistentStore<S: Persisted> {
    state: S,
    storage: Rc<dyn Storage>,
    listeners: Vec<(ListenerId, Listener<S>)>,
    next_listener: u64,
}

impl<S: Persisted> PersistentStore<S> {
    pub fn open(storage: Rc<dyn Storage>) -> Self {
        let state = load_state::<S>(storage.as_ref());
        Self {
            state,
            storage,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Cloned snapshot of the current state.
    pub fn get_state(&self) -> S {
        self.state.clone()
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// Registers `listener`. Subscribing the same `Rc` twice returns the
    /// existing id and does not add a second delivery.
    pub fn subscribe(&mut self, listener: Listener<S>) -> ListenerId {
        if let Some((id, _)) = self
            .listeners
            .iter()
            .find(|(_, l)| std::ptr::addr_eq(Rc::as_ptr(l), Rc::as_ptr(&listener)))
        {
            return *id;
        }
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.push((id, listener));
        id
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Applies `apply` to the state, persists, then notifies subscribers.
    ///
    /// A failed write does not roll back the in-memory change: subscribers are
    /// still notified and the write error is returned.
    pub fn set_state<F>(&mut self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut S),
    {
        apply(&mut self.state);
        let saved = self.persist();
        if let Err(ref err) = saved {
            tracing::warn!(key = S::KEY, error = %err, "failed to persist state");
        }
        self.notify();
        saved
    }

    pub fn replace(&mut self, state: S) -> Result<()> {
        self.set_state(|s| *s = state)
    }

    fn persist(&self) -> Result<()> {
        let doc = serde_json::to_string(&self.state)?;
        self.storage.save(S::KEY, &doc)
    }

    fn notify(&self) {
        for (_, listener) in &self.listeners {
            listener(&self.state);
        }
    }
}

fn load_state<S: Persisted>(storage: &dyn Storage) -> S {
    let raw = match storage.load(S::KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return S::default(),
        Err(err) => {
            tracing::warn!(key = S::KEY, error = %err, "storage read failed; using defaults");
            return S::default();
        }
    };
    let restored = serde_json::from_str::<serde_json::Value>(&raw)
        .ok()
        .and_then(S::restore);
    match restored {
        Some(state) => state,
        None => {
            tracing::warn!(key = S::KEY, "discarding malformed stored state");
            S::default()
        }
    }
}

/// Position of the record with `id`, or `NotFound`.
pub(crate) fn position_of<T>(
    items: &[T],
    id: &str,
    kind: &'static str,
    id_of: impl Fn(&T) -> &str,
) -> Result<usize> {
    items
        .iter()
        .position(|item| id_of(item) == id)
        .ok_or_else(|| Error::not_found(kind, id))
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
