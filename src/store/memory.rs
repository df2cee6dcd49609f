use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use super::StorageBackend;
use crate::error::{Result, StoreError};

#[derive(Clone, Copy)]
struct Quota {
    total: usize,
    per_entry: usize,
}

/// In-memory storage backend.
///
/// Serves two roles: the test substitute for every other backend, and the
/// emulation of the quota-limited synchronized area (via [`with_quota`]).
/// Writes can be forced to fail with [`set_fail_writes`] to exercise the
/// quota/failure paths without filling real capacity.
///
/// [`with_quota`]: MemBackend::with_quota
/// [`set_fail_writes`]: MemBackend::set_fail_writes
#[derive(Default)]
pub struct MemBackend {
    entries: Mutex<HashMap<String, Value>>,
    quota: Option<Quota>,
    fail_writes: AtomicBool,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enforce a byte budget the way the synchronized extension store does:
    /// usage is the sum of key length plus serialized value length, checked
    /// before any entry is applied.
    pub fn with_quota(total: usize, per_entry: usize) -> Self {
        Self {
            quota: Some(Quota { total, per_entry }),
            ..Self::default()
        }
    }

    /// Make every subsequent `set` fail until switched back off.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    fn entry_size(key: &str, value: &Value) -> usize {
        key.len() + value.to_string().len()
    }
}

#[async_trait]
impl StorageBackend for MemBackend {
    async fn get(&self, keys: &[&str]) -> HashMap<String, Value> {
        let entries = self.entries.lock().await;
        keys.iter()
            .filter_map(|k| entries.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect()
    }

    async fn set(&self, items: HashMap<String, Value>) -> Result<()> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(StoreError::Store("simulated write failure".to_string()));
        }

        let mut entries = self.entries.lock().await;

        if let Some(quota) = self.quota {
            for (key, value) in &items {
                let size = Self::entry_size(key, value);
                if size > quota.per_entry {
                    return Err(StoreError::EntryTooLarge {
                        size,
                        limit: quota.per_entry,
                    });
                }
            }

            // Check the prospective total before touching anything, so a
            // rejected write leaves the stored state untouched.
            let mut next: HashMap<&str, usize> = entries
                .iter()
                .map(|(k, v)| (k.as_str(), Self::entry_size(k, v)))
                .collect();
            for (key, value) in &items {
                next.insert(key.as_str(), Self::entry_size(key, value));
            }
            let used: usize = next.values().sum();
            if used > quota.total {
                return Err(StoreError::QuotaExceeded {
                    used,
                    limit: quota.total,
                });
            }
        }

        entries.extend(items);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut entries = self.entries.lock().await;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn get_omits_absent_keys() {
        let backend = MemBackend::new();
        backend
            .set(HashMap::from([("a".to_string(), json!(1))]))
            .await
            .unwrap();

        let found = backend.get(&["a", "missing"]).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found["a"], json!(1));
    }

    #[tokio::test]
    async fn remove_is_a_noop_for_absent_keys() {
        let backend = MemBackend::new();
        backend.remove(&["nothing"]).await.unwrap();
    }

    #[tokio::test]
    async fn quota_rejects_without_partial_apply() {
        let backend = MemBackend::with_quota(32, 32);
        backend
            .set(HashMap::from([("k".to_string(), json!("0123456789"))]))
            .await
            .unwrap();

        // 13 bytes stored ("k" + "\"0123456789\""); this entry would blow the total.
        let err = backend
            .set(HashMap::from([("big".to_string(), json!("0123456789012345"))]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { .. }));

        let found = backend.get(&["k", "big"]).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found["k"], json!("0123456789"));
    }

    #[tokio::test]
    async fn per_entry_cap_is_enforced() {
        let backend = MemBackend::with_quota(1024, 8);
        let err = backend
            .set(HashMap::from([("key".to_string(), json!("too large"))]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::EntryTooLarge { .. }));
    }

    #[tokio::test]
    async fn overwriting_an_entry_reclaims_its_budget() {
        let backend = MemBackend::with_quota(20, 20);
        backend
            .set(HashMap::from([("k".to_string(), json!("0123456789"))]))
            .await
            .unwrap();
        // Replacing the value is charged against the new size, not stacked
        // on top of the old one.
        backend
            .set(HashMap::from([("k".to_string(), json!("abcdefghij"))]))
            .await
            .unwrap();
        assert_eq!(backend.get(&["k"]).await["k"], json!("abcdefghij"));
    }

    #[tokio::test]
    async fn forced_failure_reports_err_and_stores_nothing() {
        let backend = MemBackend::new();
        backend.set_fail_writes(true);
        let err = backend
            .set(HashMap::from([("a".to_string(), json!(1))]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Store(_)));
        assert!(backend.get(&["a"]).await.is_empty());

        backend.set_fail_writes(false);
        backend
            .set(HashMap::from([("a".to_string(), json!(1))]))
            .await
            .unwrap();
    }
}
