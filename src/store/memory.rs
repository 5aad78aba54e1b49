//! In-memory object store
//!
//! Deterministic `ObjectStore` used by the test suite. Keys are held in a
//! `BTreeMap` so listings come back in lexicographic order, pages are cut at
//! a configurable size to exercise continuation-token loops, and individual
//! mutations can be made to fail on demand so tests can observe how far a
//! multi-step drive operation got before breaking.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ListPage, ObjectBody, ObjectRecord, ObjectStore, StoreError};

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    last_modified: DateTime<Utc>,
}

/// Per-operation fault injection: `Some(n)` lets `n` more calls succeed,
/// then every further call fails with a service error.
#[derive(Debug, Default)]
struct Faults {
    deletes_before_failure: Option<usize>,
    copies_before_failure: Option<usize>,
}

/// In-memory bucket+key store with configurable page size.
pub struct MemoryStore {
    buckets: Mutex<BTreeMap<String, BTreeMap<String, StoredObject>>>,
    page_size: usize,
    region: String,
    faults: Mutex<Faults>,
}

impl MemoryStore {
    /// Store that returns everything in a single page.
    pub fn new() -> Self {
        Self::with_page_size(1000)
    }

    /// Store that cuts listings into pages of at most `page_size` records.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            buckets: Mutex::new(BTreeMap::new()),
            page_size: page_size.max(1),
            region: "mem-east-1".to_string(),
            faults: Mutex::new(Faults::default()),
        }
    }

    /// Allow `n` more deletes, then fail each one after that.
    pub fn fail_deletes_after(&self, n: usize) {
        self.faults.lock().unwrap().deletes_before_failure = Some(n);
    }

    /// Allow `n` more copies, then fail each one after that.
    pub fn fail_copies_after(&self, n: usize) {
        self.faults.lock().unwrap().copies_before_failure = Some(n);
    }

    /// Snapshot of all keys in a bucket, in listing order.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .lock()
            .unwrap()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn consume_budget(budget: &mut Option<usize>, what: &str) -> Result<(), StoreError> {
        if let Some(remaining) = budget {
            if *remaining == 0 {
                return Err(StoreError::Service(format!("injected {what} failure")));
            }
            *remaining -= 1;
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<&str>,
    ) -> Result<ListPage, StoreError> {
        let buckets = self.buckets.lock().unwrap();
        let objects = buckets.get(bucket).cloned().unwrap_or_default();

        let mut matching = objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .filter(|(key, _)| continuation.map_or(true, |token| key.as_str() > token))
            .peekable();

        let mut entries = Vec::new();
        for _ in 0..self.page_size {
            match matching.next() {
                Some((key, object)) => entries.push(ObjectRecord {
                    key: key.clone(),
                    size: object.bytes.len() as u64,
                    last_modified: Some(object.last_modified),
                }),
                None => break,
            }
        }

        let truncated = matching.peek().is_some();
        let next_token = if truncated {
            entries.last().map(|record| record.key.clone())
        } else {
            None
        };

        Ok(ListPage {
            entries,
            truncated,
            next_token,
        })
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<ObjectBody, StoreError> {
        let buckets = self.buckets.lock().unwrap();
        let object = buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        Ok(ObjectBody {
            bytes: object.bytes.clone(),
            size: object.bytes.len() as u64,
            last_modified: Some(object.last_modified),
        })
    }

    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), StoreError> {
        let mut buckets = self.buckets.lock().unwrap();
        buckets.entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                bytes: body,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        Self::consume_budget(
            &mut self.faults.lock().unwrap().deletes_before_failure,
            "delete",
        )?;

        let mut buckets = self.buckets.lock().unwrap();
        if let Some(objects) = buckets.get_mut(bucket) {
            objects.remove(key);
        }
        // Deleting an absent key is a success, matching S3.
        Ok(())
    }

    async fn copy(
        &self,
        bucket: &str,
        source_key: &str,
        dest_key: &str,
    ) -> Result<(), StoreError> {
        self.copy_to_bucket(bucket, source_key, bucket, dest_key)
            .await
    }

    async fn copy_to_bucket(
        &self,
        source_bucket: &str,
        source_key: &str,
        dest_bucket: &str,
        dest_key: &str,
    ) -> Result<(), StoreError> {
        Self::consume_budget(
            &mut self.faults.lock().unwrap().copies_before_failure,
            "copy",
        )?;

        let mut buckets = self.buckets.lock().unwrap();
        let object = buckets
            .get(source_bucket)
            .and_then(|objects| objects.get(source_key))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(source_key.to_string()))?;

        buckets
            .entry(dest_bucket.to_string())
            .or_default()
            .insert(dest_key.to_string(), object);
        Ok(())
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<bool, StoreError> {
        let buckets = self.buckets.lock().unwrap();
        Ok(buckets
            .get(bucket)
            .map(|objects| objects.contains_key(key))
            .unwrap_or(false))
    }

    async fn bucket_region(&self, _bucket: &str) -> Result<String, StoreError> {
        Ok(self.region.clone())
    }
}
