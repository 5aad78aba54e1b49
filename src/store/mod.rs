//! Object store abstraction
//!
//! The drive consumes a flat bucket+key blob store through the `ObjectStore`
//! trait. The store has no native directory concept, no multi-key
//! transactions, and only paginated listing by prefix; everything
//! hierarchical is emulated a layer above.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              ObjectStore Trait              │
//! │   list, get, put, delete, copy, head, ...   │
//! └─────────────────────────────────────────────┘
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//!   ┌─────────────┐         ┌─────────────┐
//!   │ S3-style    │         │ MemoryStore │
//!   │ transport   │         │ (tests)     │
//!   └─────────────┘         └─────────────┘
//! ```
//!
//! Real transports (AWS S3, MinIO, any S3-compatible service) live outside
//! this crate; only the in-memory store used by the test suite ships here.

pub mod memory;
pub mod types;

pub use memory::MemoryStore;
pub use types::*;

use async_trait::async_trait;

/// Contract for a flat bucket+key object store.
///
/// All operations address a single object or prefix; none of them is
/// transactional. Implementations are expected to surface transport errors
/// as-is — retry policy, if any, belongs to the transport layer.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List objects under `prefix`, one page at a time.
    ///
    /// `continuation` carries the opaque token from the previous page's
    /// `next_token`; `None` starts from the beginning.
    async fn list(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<&str>,
    ) -> Result<ListPage, StoreError>;

    /// Read one object in full.
    async fn get(&self, bucket: &str, key: &str) -> Result<ObjectBody, StoreError>;

    /// Write one object, overwriting unconditionally.
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), StoreError>;

    /// Delete one object. Deleting an absent key succeeds (S3 semantics).
    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StoreError>;

    /// Server-side copy within one bucket.
    async fn copy(&self, bucket: &str, source_key: &str, dest_key: &str)
        -> Result<(), StoreError>;

    /// Server-side copy across buckets.
    async fn copy_to_bucket(
        &self,
        source_bucket: &str,
        source_key: &str,
        dest_bucket: &str,
        dest_key: &str,
    ) -> Result<(), StoreError>;

    /// Existence probe. Absence is the `Ok(false)` return, never an error.
    async fn head(&self, bucket: &str, key: &str) -> Result<bool, StoreError>;

    /// Region the bucket lives in.
    async fn bucket_region(&self, bucket: &str) -> Result<String, StoreError>;
}
