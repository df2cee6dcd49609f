use std::collections::HashMap;
use tracing::{debug, warn};

use crate::store::{Storage, StorageBackend};

/// Storage class a legacy key's value is declared to move into.
enum LegacyKind {
    // No config-class legacy key remains in the table today; entries added
    // later declare their class here.
    #[allow(dead_code)]
    Config,
    Content,
}

struct LegacyKey {
    old: &'static str,
    new: &'static str,
    kind: LegacyKind,
}

/// Keys from the retired flat store, with their new names and classes.
const LEGACY_KEYS: &[LegacyKey] = &[LegacyKey {
    old: "markdown-editor-content",
    new: "editor-content",
    kind: LegacyKind::Content,
}];

/// One-shot, best-effort move of legacy flat keys into class-separated
/// storage. Runs at startup before any other storage read.
///
/// The legacy store is being retired regardless of outcome, so the old key
/// is removed after the destination write is attempted, not conditioned on
/// its success. Running again once a key is absent is a no-op.
pub async fn migrate_legacy(legacy: &dyn StorageBackend, storage: &Storage) {
    for entry in LEGACY_KEYS {
        let mut found = legacy.get(&[entry.old]).await;
        let Some(value) = found.remove(entry.old) else {
            continue;
        };

        let dest = match entry.kind {
            LegacyKind::Config => storage.config(),
            LegacyKind::Content => storage.content(),
        };
        if let Err(err) = dest.set(HashMap::from([(entry.new.to_string(), value)])).await {
            warn!(key = entry.old, %err, "legacy key migration write failed");
        } else {
            debug!(key = entry.old, new = entry.new, "migrated legacy key");
        }

        if let Err(err) = legacy.remove(&[entry.old]).await {
            warn!(key = entry.old, %err, "legacy key removal failed");
        }
    }
}
