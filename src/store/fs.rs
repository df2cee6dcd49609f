use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::StorageBackend;
use crate::error::Result;

/// File-backed storage: one namespaced JSON object per backend instance.
///
/// This is the persistent fallback for hosts without an extension storage
/// capability, and doubles as the large local-only class in native contexts.
/// The namespace keeps unrelated data in the same directory from colliding.
///
/// All keys live in a single `<namespace>.json` map, rewritten atomically
/// (tmp file, then rename) on every mutation. Values here are small, so the
/// whole-file rewrite stays cheap.
pub struct FsBackend {
    path: PathBuf,
}

impl FsBackend {
    pub fn new(dir: &Path, namespace: &str) -> Self {
        Self {
            path: dir.join(format!("{}.json", namespace)),
        }
    }

    /// A missing or unreadable file degrades to an empty map; corruption in
    /// the backing file must not take the panel down with it.
    fn load(&self) -> HashMap<String, Value> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "storage file unreadable");
                return HashMap::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "storage file malformed");
                HashMap::new()
            }
        }
    }

    fn persist(&self, entries: &HashMap<String, Value>) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let raw = serde_json::to_string(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FsBackend {
    async fn get(&self, keys: &[&str]) -> HashMap<String, Value> {
        let entries = self.load();
        keys.iter()
            .filter_map(|k| entries.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect()
    }

    async fn set(&self, items: HashMap<String, Value>) -> Result<()> {
        let mut entries = self.load();
        entries.extend(items);
        self.persist(&entries)
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut entries = self.load();
        let mut changed = false;
        for key in keys {
            changed |= entries.remove(*key).is_some();
        }
        if changed {
            self.persist(&entries)?;
        }
        Ok(())
    }
}
