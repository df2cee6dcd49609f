//! # Storage Layer
//!
//! The [`StorageBackend`] trait is the raw key-value boundary: it handles the
//! "how" of storage (quota-limited synchronized area, large local area, plain
//! file, memory), while the repository and config layers handle the "what".
//!
//! Two rules shape the contract:
//!
//! - `get` is infallible. A backend that cannot read degrades to "key absent"
//!   (logging the cause) instead of failing the caller, because a broken read
//!   must never make the panel unusable.
//! - `set` never panics and never fails out-of-band: quota and I/O problems
//!   come back as an `Err` value for the caller to translate into UI state.
//!
//! Which *class* of backend a value goes to (small synchronized config vs.
//! larger content) is always the caller's choice, made through [`Storage`].
//! Backends are injected at startup; there is no module-level singleton, so
//! tests substitute [`memory::MemBackend`] freely.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

pub mod fs;
pub mod memory;

pub use fs::FsBackend;
pub use memory::MemBackend;

/// Total capacity of the synchronized storage class, in bytes.
pub const SYNC_QUOTA_BYTES: usize = 102_400;

/// Per-entry cap of the synchronized storage class, in bytes.
pub const SYNC_QUOTA_BYTES_PER_ITEM: usize = 8_192;

/// Abstract interface for raw key-value I/O.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Fetch the requested keys. Absent keys are omitted from the result.
    async fn get(&self, keys: &[&str]) -> HashMap<String, Value>;

    /// Store every entry, or nothing. Quota and I/O failures are returned,
    /// never panicked.
    async fn set(&self, items: HashMap<String, Value>) -> Result<()>;

    /// Remove the given keys. Removing an absent key is a no-op.
    async fn remove(&self, keys: &[&str]) -> Result<()>;
}

/// The two storage classes the rest of the crate writes through.
///
/// `config` is the small synchronized, quota-limited class (scalar settings);
/// `content` is the larger class holding the notes collection and other
/// document payloads. Cloning is cheap; both handles are shared.
#[derive(Clone)]
pub struct Storage {
    config: Arc<dyn StorageBackend>,
    content: Arc<dyn StorageBackend>,
}

impl Storage {
    pub fn new(config: Arc<dyn StorageBackend>, content: Arc<dyn StorageBackend>) -> Self {
        Self { config, content }
    }

    /// Both classes in unbounded memory. For tests and bare (non-extension)
    /// contexts that do not need persistence.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemBackend::new()), Arc::new(MemBackend::new()))
    }

    /// Memory-backed storage that enforces the synchronized store's quota on
    /// both classes, mirroring the deployment where config and content share
    /// one quota-limited synchronized area.
    pub fn quota_limited() -> Self {
        let area: Arc<dyn StorageBackend> = Arc::new(MemBackend::with_quota(
            SYNC_QUOTA_BYTES,
            SYNC_QUOTA_BYTES_PER_ITEM,
        ));
        Self::new(Arc::clone(&area), area)
    }

    /// File-backed storage under `dir`: config and content each live in one
    /// namespaced JSON file. The fallback for contexts without an extension
    /// storage capability, and the large local-only class in native hosts.
    pub fn on_disk(dir: &Path) -> Self {
        Self::new(
            Arc::new(FsBackend::new(dir, "config")),
            Arc::new(FsBackend::new(dir, "content")),
        )
    }

    pub fn config(&self) -> &Arc<dyn StorageBackend> {
        &self.config
    }

    pub fn content(&self) -> &Arc<dyn StorageBackend> {
        &self.content
    }
}
