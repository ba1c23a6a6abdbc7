// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Thin blocking client for the remote REST API.
//!
//! Results are meant to re-enter the stores through `apply_fetched`, so a
//! response to a superseded request is dropped there. Nothing is retried.

use crate::error::{Error, Result};
use crate::models::{Budget, Transaction};
use crate::store::SessionStore;
use crate::utils::http_client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::cell::Cell;
use std::time::Duration;

/// Tracks whether the rate-limit notice is already on screen, so repeated
/// `429`s do not stack duplicate notices. Reset after a successful call.
#[derive(Debug, Default)]
pub struct RateLimitNotice {
    shown: Cell<bool>,
}

impl RateLimitNotice {
    /// `true` only the first time since the last reset.
    pub fn should_show(&self) -> bool {
        !self.shown.replace(true)
    }

    pub fn reset(&self) {
        self.shown.set(false);
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Payload<T> {
    fn into_inner(self) -> T {
        match self {
            Payload::Wrapped { data } => data,
            Payload::Bare(v) => v,
        }
    }
}

pub struct RemoteClient {
    base_url: String,
    http: reqwest::blocking::Client,
    notice: RateLimitNotice,
}

impl RemoteClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: http_client(timeout)?,
            notice: RateLimitNotice::default(),
        })
    }

    pub fn notice(&self) -> &RateLimitNotice {
        &self.notice
    }

    pub fn fetch_transactions(&self, session: &mut SessionStore) -> Result<Vec<Transaction>> {
        self.get("/transactions", session)
    }

    pub fn fetch_budgets(&self, session: &mut SessionStore) -> Result<Vec<Budget>> {
        self.get("/budgets", session)
    }

    fn get<T: DeserializeOwned>(&self, path: &str, session: &mut SessionStore) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.get(&url);
        if let Some(token) = session.token() {
            req = req.bearer_auth(token);
        }
        tracing::debug!(%url, "GET");
        let resp = req.send()?;
        check_status(resp.status(), session)?;
        self.notice.reset();
        let payload: Payload<T> = resp.json()?;
        Ok(payload.into_inner())
    }
}

/// Maps an HTTP status onto the error taxonomy. `401` tears the session down.
pub fn check_status(status: StatusCode, session: &mut SessionStore) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }
    match status {
        StatusCode::UNAUTHORIZED => {
            tracing::warn!("remote API rejected credentials; clearing session");
            session.logout()?;
            Err(Error::Auth("session expired, please sign in again".into()))
        }
        StatusCode::TOO_MANY_REQUESTS => Err(Error::RateLimited),
        other => Err(Error::Network(format!("remote API returned {}", other))),
    }
}
