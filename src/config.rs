//! Persisted panel settings: small scalar values on the config class.
//!
//! No merge logic, no cross-key invariants; last write wins. Alongside the
//! raw [`ConfigStore::set`]/[`ConfigStore::get`] pair there are typed helpers
//! for the known keys so callers do not repeat the parse/clamp dance.

use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

use crate::model::Theme;
use crate::store::Storage;

pub const FONT_SIZE_KEY: &str = "font-size";
pub const THEME_KEY: &str = "theme";
pub const PREVIEW_MODE_KEY: &str = "preview-mode";

pub const MIN_FONT_SIZE: u32 = 4;
pub const MAX_FONT_SIZE: u32 = 100;
pub const DEFAULT_FONT_SIZE: u32 = 12;

pub struct ConfigStore {
    storage: Storage,
}

impl ConfigStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Store one setting. Returns whether the write was persisted.
    pub async fn set(&self, key: &str, value: impl Into<Value>) -> bool {
        match self
            .storage
            .config()
            .set(HashMap::from([(key.to_string(), value.into())]))
            .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(key, %err, "config write failed");
                false
            }
        }
    }

    /// Fetch one setting, or the caller's default when the key is absent.
    pub async fn get(&self, key: &str, default: Value) -> Value {
        self.storage
            .config()
            .get(&[key])
            .await
            .remove(key)
            .unwrap_or(default)
    }

    /// Editor font size, clamped to the supported range. Older builds
    /// persisted it as a stringified integer, so both shapes parse.
    pub async fn font_size(&self) -> u32 {
        let raw = self
            .get(FONT_SIZE_KEY, Value::String(DEFAULT_FONT_SIZE.to_string()))
            .await;
        let parsed = match &raw {
            Value::String(s) => s.parse::<u32>().ok(),
            Value::Number(n) => n.as_u64().map(|n| n as u32),
            _ => None,
        };
        parsed
            .map(|size| size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE))
            .unwrap_or(DEFAULT_FONT_SIZE)
    }

    pub async fn set_font_size(&self, size: u32) -> bool {
        let size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        self.set(FONT_SIZE_KEY, size.to_string()).await
    }

    pub async fn theme(&self) -> Theme {
        match self.get(THEME_KEY, Value::Null).await {
            Value::String(s) => Theme::parse(&s),
            _ => Theme::default(),
        }
    }

    /// Flip the persisted theme and return the new value. Re-reads before
    /// flipping so two panels sharing the store stay consistent.
    pub async fn toggle_theme(&self) -> Theme {
        let next = self.theme().await.toggled();
        self.set(THEME_KEY, next.as_str()).await;
        next
    }

    pub async fn preview_mode(&self) -> bool {
        matches!(
            self.get(PREVIEW_MODE_KEY, Value::Bool(false)).await,
            Value::Bool(true)
        )
    }

    pub async fn set_preview_mode(&self, on: bool) -> bool {
        self.set(PREVIEW_MODE_KEY, on).await
    }
}
