//! Shared types for the object store layer
//!
//! Configuration, record/page shapes and the error type consumed by every
//! `ObjectStore` implementation and by the drive that orchestrates over them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bucket-scoped store configuration.
///
/// Credentials are produced by an external factory (keychain, instance
/// profile, environment) and only carried here; this crate never acquires
/// them itself.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Bucket name
    pub bucket: String,
    /// Region hint (e.g., us-east-1)
    pub region: String,
    /// Custom endpoint URL (None for the provider default)
    pub endpoint: Option<String>,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key (SecretString for memory zeroization)
    pub secret_access_key: secrecy::SecretString,
}

impl StoreConfig {
    /// Minimal config for a named bucket; used when the transport client is
    /// already authenticated out-of-band.
    pub fn for_bucket(bucket: &str, region: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            region: region.to_string(),
            endpoint: None,
            access_key_id: String::new(),
            secret_access_key: secrecy::SecretString::from(String::new()),
        }
    }
}

/// One object as reported by a listing call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Flat object key, `/`-delimited
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time (the store tracks no separate creation time)
    pub last_modified: Option<DateTime<Utc>>,
}

/// One page of a prefix listing.
///
/// `truncated` plus `next_token` drive the continuation loop; a caller must
/// keep requesting pages until `truncated` is false.
#[derive(Debug, Clone)]
pub struct ListPage {
    pub entries: Vec<ObjectRecord>,
    pub truncated: bool,
    pub next_token: Option<String>,
}

/// Payload and metadata of a single object read.
#[derive(Debug, Clone)]
pub struct ObjectBody {
    pub bytes: Vec<u8>,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Object store error type.
///
/// Transport and service failures propagate unrecovered; this layer performs
/// no retries and no backoff.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Service error: {0}")]
    Service(String),
}

impl StoreError {
    /// True when the error means plain absence of a key, the branch that
    /// collision probes treat as normal control flow.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
