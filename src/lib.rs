//! blobdrive - hierarchical content drive over flat object storage
//!
//! Presents a filesystem-shaped API (list, get, create, save, rename, copy,
//! delete) on top of a bucket+key blob store that has no native directories,
//! no multi-key transactions and only paginated prefix listing.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                   Drive                     │
//! │  list, get, new_untitled, save, rename,     │
//! │  copy, delete  → Entry + change events      │
//! └─────────────────────────────────────────────┘
//!        │               │              │
//!        ▼               ▼              ▼
//! ┌────────────┐  ┌─────────────┐  ┌──────────┐
//! │  PathKey   │  │  FileType   │  │  naming  │
//! │  model     │  │  registry   │  │ resolver │
//! └────────────┘  └─────────────┘  └──────────┘
//!        │
//!        ▼
//! ┌─────────────────────────────────────────────┐
//! │         ObjectStore (consumed trait)        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The store is the sole source of truth: entries are rebuilt from it on
//! every call and nothing is cached. Directory-scoped mutations are
//! sequences of independent requests with no rollback; their failure mode
//! is partial progress, reported step by step.

pub mod drive;
pub mod filetype;
pub mod model;
pub mod naming;
pub mod path;
pub mod store;

pub use drive::{
    ChangeEvent, ChangeKind, Checkpoint, Drive, DriveError, SavePayload, StepKind, StepRecord,
};
pub use filetype::{ContentFormat, FileType, FileTypeRegistry, FileTypeSpec};
pub use model::{Entry, EntryContent};
pub use path::PathKey;
pub use store::{
    ListPage, MemoryStore, ObjectBody, ObjectRecord, ObjectStore, StoreConfig, StoreError,
};
