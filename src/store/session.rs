// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::Storage;
use crate::error::{Error, Result};
use crate::models::{Role, Session, User};
use std::rc::Rc;

const USER_KEY: &str = "user";
const TOKEN_KEY: &str = "token";
const ROLE_KEY: &str = "role";

/// Auth session, persisted as three separate keys (`user`, `token`, `role`)
/// rather than one document. A missing or unreadable key means signed out.
pub struct SessionStore {
    storage: Rc<dyn Storage>,
    current: Option<Session>,
}

impl SessionStore {
    pub fn open(storage: Rc<dyn Storage>) -> Self {
        let current = match load_session(storage.as_ref()) {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unreadable session");
                None
            }
        };
        Self { storage, current }
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.token.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|s| s.role == Role::Admin)
    }

    pub fn login(&mut self, session: Session) -> Result<()> {
        if session.token.trim().is_empty() {
            return Err(Error::Validation("token is required".into()));
        }
        let user = serde_json::to_string(&session.user)?;
        self.storage.save(USER_KEY, &user)?;
        self.storage.save(TOKEN_KEY, &session.token)?;
        self.storage.save(ROLE_KEY, session.role.as_str())?;
        tracing::info!(user = %session.user.email, role = session.role.as_str(), "signed in");
        self.current = Some(session);
        Ok(())
    }

    /// Clears the in-memory session first so a failed delete still signs out.
    pub fn logout(&mut self) -> Result<()> {
        if self.current.take().is_some() {
            tracing::info!("signed out");
        }
        self.storage.remove(USER_KEY)?;
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(ROLE_KEY)?;
        Ok(())
    }
}

fn load_session(storage: &dyn Storage) -> Result<Option<Session>> {
    let (Some(user), Some(token), Some(role)) = (
        storage.load(USER_KEY)?,
        storage.load(TOKEN_KEY)?,
        storage.load(ROLE_KEY)?,
    ) else {
        return Ok(None);
    };
    let Ok(user) = serde_json::from_str::<User>(&user) else {
        return Ok(None);
    };
    let Ok(role) = role.parse::<Role>() else {
        return Ok(None);
    };
    if token.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(Session { user, token, role }))
}
