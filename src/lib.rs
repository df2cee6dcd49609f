//! # sidenote
//!
//! The persistence and synchronization core of a side-panel markdown notes
//! tool. This crate knows nothing about rendering or editing; it owns the
//! notes collection, the persisted settings, and the reactive state a panel
//! UI binds to.
//!
//! ## Layers
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Session Layer (session.rs)                              │
//! │  - notes / current_note / storage_error view state       │
//! │  - debounced autosave, legacy-document upgrade           │
//! └──────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │  Repository & Config (repo.rs, config.rs, migrate.rs)    │
//! │  - whole-collection CRUD under the single `notes` key    │
//! │  - scalar settings, legacy-key migration                 │
//! └──────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                  │
//! │  - StorageBackend trait, config/content classes          │
//! │  - MemBackend (quota emulation), FsBackend (fallback)    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure discipline
//!
//! Writes can fail (the synchronized storage class is quota-limited) and
//! that is a normal outcome, not an error path: every mutation either
//! commits the fully rewritten collection or changes nothing, callers get
//! `false`/`None`, and the session surfaces a dismissible `storage_error`
//! flag while the last known-good state stays visible.
//!
//! Backends are constructed at startup and injected — see
//! [`Storage::new`] — so every layer runs against [`store::MemBackend`]
//! in tests.

pub mod config;
pub mod error;
pub mod migrate;
pub mod model;
pub mod repo;
pub mod session;
pub mod store;

pub use config::ConfigStore;
pub use error::{Result, StoreError};
pub use model::{Note, Theme};
pub use repo::NoteRepository;
pub use session::{Debouncer, NoteSession};
pub use store::{Storage, StorageBackend};
