// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{Listener, ListenerId, Persisted, PersistentStore};
use crate::db::Storage;
use crate::error::{Error, Result};
use crate::models::{DateFormat, NotificationSettings, NotificationsPatch, Settings, Theme};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::cell::Cell;
use std::rc::Rc;

impl Persisted for Settings {
    const KEY: &'static str = "settings";

    /// Restores each field on its own so one bad value does not reset the
    /// rest. A legacy `darkMode` flag is honoured when `theme` is absent.
    fn restore(raw: Value) -> Option<Self> {
        let Value::Object(map) = raw else {
            return None;
        };
        let defaults = Settings::default();
        let theme = field::<Theme>(&map, "theme")
            .or_else(|| {
                field::<bool>(&map, "darkMode").map(|dark| {
                    if dark {
                        Theme::Dark
                    } else {
                        Theme::Light
                    }
                })
            })
            .unwrap_or(defaults.theme);
        let currency = field::<String>(&map, "currency")
            .and_then(|c| normalize_currency(&c).ok())
            .unwrap_or(defaults.currency);
        let language = field::<String>(&map, "language")
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or(defaults.language);
        let date_format = field::<DateFormat>(&map, "dateFormat").unwrap_or(defaults.date_format);
        let notifications = field::<NotificationSettings>(&map, "notifications")
            .unwrap_or(defaults.notifications);
        Some(Settings {
            theme,
            currency,
            language,
            date_format,
            notifications,
        })
    }
}

fn field<T: DeserializeOwned>(map: &Map<String, Value>, key: &str) -> Option<T> {
    map.get(key)
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
}

fn normalize_currency(code: &str) -> Result<String> {
    let code = code.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Error::InvalidArgument(format!(
            "currency '{}' (expected a 3-letter ISO-4217 code)",
            code
        )));
    }
    Ok(code.to_ascii_uppercase())
}

/// Receives the effective theme whenever it is loaded or changed. This is the
/// hook the presentation layer uses to flip its global dark-mode switch.
pub trait ThemeSink {
    fn apply_theme(&self, theme: Theme);
}

/// Shared dark-mode flag the presentation layer can read.
#[derive(Debug, Clone, Default)]
pub struct DarkModeFlag(Rc<Cell<bool>>);

impl DarkModeFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dark(&self) -> bool {
        self.0.get()
    }
}

impl ThemeSink for DarkModeFlag {
    fn apply_theme(&self, theme: Theme) {
        self.0.set(theme.is_dark());
    }
}

pub struct SettingsStore {
    store: PersistentStore<Settings>,
    theme_sink: Option<Rc<dyn ThemeSink>>,
}

impl SettingsStore {
    pub fn open(storage: Rc<dyn Storage>, theme_sink: Option<Rc<dyn ThemeSink>>) -> Self {
        let store = PersistentStore::<Settings>::open(storage);
        if let Some(ref sink) = theme_sink {
            sink.apply_theme(store.state().theme);
        }
        Self { store, theme_sink }
    }

    pub fn settings(&self) -> &Settings {
        self.store.state()
    }

    pub fn get_state(&self) -> Settings {
        self.store.get_state()
    }

    pub fn subscribe(&mut self, listener: Listener<Settings>) -> ListenerId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.store.unsubscribe(id)
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<()> {
        tracing::debug!(%theme, "set theme");
        let saved = self.store.set_state(|s| s.theme = theme);
        self.apply_theme();
        saved
    }

    pub fn set_currency(&mut self, code: &str) -> Result<()> {
        let code = normalize_currency(code)?;
        tracing::debug!(currency = %code, "set currency");
        self.store.set_state(|s| s.currency = code)
    }

    pub fn set_language(&mut self, language: &str) -> Result<()> {
        let language = language.trim();
        if language.is_empty() {
            return Err(Error::InvalidArgument("language must not be empty".into()));
        }
        let language = language.to_string();
        self.store.set_state(|s| s.language = language)
    }

    pub fn set_date_format(&mut self, format: DateFormat) -> Result<()> {
        self.store.set_state(|s| s.date_format = format)
    }

    pub fn update_notifications(&mut self, patch: NotificationsPatch) -> Result<()> {
        self.store
            .set_state(|s| patch.apply_to(&mut s.notifications))
    }

    pub fn reset_settings(&mut self) -> Result<()> {
        tracing::debug!("reset settings");
        let saved = self.store.replace(Settings::default());
        self.apply_theme();
        saved
    }

    fn apply_theme(&self) {
        if let Some(ref sink) = self.theme_sink {
            sink.apply_theme(self.store.state().theme);
        }
    }
}
