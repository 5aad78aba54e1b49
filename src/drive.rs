//! Drive: the hierarchical filesystem emulation over the flat store
//!
//! Every operation goes straight to the object store; there is no cache and
//! no background work. Directory-scoped operations (delete, rename, copy)
//! are sequences of independent store requests with no rollback: a failure
//! partway through leaves the store with a mix of old and new keys, and the
//! error reports exactly which steps completed so the caller can see how far
//! the sequence got.

use std::collections::BTreeMap;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::filetype::{ContentFormat, FileTypeRegistry};
use crate::model::{Entry, EntryContent};
use crate::naming;
use crate::path::PathKey;
use crate::store::{ObjectRecord, ObjectStore, StoreConfig, StoreError};

/// Capacity of the change-event channel; slow subscribers lose old events
/// rather than blocking mutations.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Mutation kinds announced to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Saved,
    Deleted,
    Renamed,
    Copied,
}

/// Change notification emitted after every successful mutation.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// Logical path the mutation produced (or removed)
    pub path: String,
    /// Previous path, for renames and copies
    pub old_path: Option<String>,
}

/// One sub-step of a multi-request directory operation.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub kind: StepKind,
    /// Object key the step addressed
    pub key: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum StepKind {
    DeleteObject,
    CopyObject { dest: String },
}

/// Drive error type.
#[derive(Error, Debug)]
pub enum DriveError {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Transport/service failure, propagated unrecovered.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A directory-scoped sequence broke partway. `completed` lists the
    /// store requests that already succeeded; none of them is undone.
    #[error("directory operation stopped at '{}' after {} completed steps", failed.key, completed.len())]
    Partial {
        completed: Vec<StepRecord>,
        failed: StepRecord,
        #[source]
        source: StoreError,
    },

    /// A constructed entry failed content-model validation. This is a
    /// programming defect, not a recoverable condition.
    #[error("content model violation: {0}")]
    ModelViolation(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("base64 decode error: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Payload accepted by [`Drive::save`].
#[derive(Debug, Clone)]
pub enum SavePayload {
    /// Structured content; written pretty-printed
    Json(serde_json::Value),
    /// UTF-8 text, written verbatim
    Text(String),
    /// Base64-encoded data; decoded to raw bytes for binary-classified
    /// types, otherwise written verbatim
    Base64(String),
}

/// Hierarchical content drive over one bucket.
///
/// Holds the consumed store client, the bucket configuration and the file
/// type registry. All methods await store calls sequentially; concurrent
/// invocations over overlapping prefixes are not synchronized.
pub struct Drive {
    store: Arc<dyn ObjectStore>,
    config: StoreConfig,
    registry: FileTypeRegistry,
    events: broadcast::Sender<ChangeEvent>,
}

impl Drive {
    pub fn new(store: Arc<dyn ObjectStore>, config: StoreConfig, registry: FileTypeRegistry) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            config,
            registry,
            events,
        }
    }

    /// Subscribe to change notifications. Any number of subscribers may
    /// listen; mutations never block on them.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    /// Human-readable description of the backing bucket.
    pub async fn store_info(&self) -> Result<String, DriveError> {
        let region = self.store.bucket_region(self.bucket()).await?;
        Ok(format!("{} ({})", self.config.bucket, region))
    }

    // ─── Listing and reading ────────────────────────────────────────────

    /// Full one-level listing of a directory (empty path = store root).
    pub async fn list(&self, path: &str) -> Result<Entry, DriveError> {
        let dir = PathKey::parse(path);
        if !dir.is_dir() {
            return Err(DriveError::InvalidPath(format!(
                "'{path}' does not name a directory"
            )));
        }
        let children = self.list_dir_entries(&dir).await?;
        Self::validated(self.directory_entry(&dir, children))
    }

    /// Read the entry at `path`: the root listing for an empty path, a
    /// subdirectory listing for an extension-less final segment, otherwise a
    /// single-object read classified through the registry.
    pub async fn get(&self, path: &str) -> Result<Entry, DriveError> {
        let target = PathKey::parse(path);
        if target.is_dir() {
            let children = self.list_dir_entries(&target).await?;
            return Self::validated(self.directory_entry(&target, children));
        }

        let body = self
            .store
            .get(self.bucket(), &target.key())
            .await
            .map_err(|err| match err {
                StoreError::NotFound(_) => DriveError::NotFound(target.path()),
                other => other.into(),
            })?;

        let file_type = self.registry.classify(target.extension());
        let (content, format) = if file_type.format == ContentFormat::Base64 {
            (EntryContent::Data(BASE64.encode(&body.bytes)), ContentFormat::Base64)
        } else {
            (
                EntryContent::Data(String::from_utf8_lossy(&body.bytes).into_owned()),
                file_type.format,
            )
        };

        Self::validated(Entry {
            name: target.name().to_string(),
            path: target.path(),
            last_modified: body.last_modified,
            created: None,
            content: Some(content),
            format,
            mimetype: file_type.mimetype,
            size: body.size,
            writable: true,
            kind: file_type.logical_type,
        })
    }

    /// True when `path` resolves to a live object or a non-empty prefix.
    pub async fn exists(&self, path: &str) -> Result<bool, DriveError> {
        let target = PathKey::parse(path);
        if target.is_root() {
            return Ok(true);
        }
        if target.is_dir() {
            let page = self.store.list(self.bucket(), &target.dir_key(), None).await?;
            return Ok(!page.entries.is_empty());
        }
        Ok(self.store.head(self.bucket(), &target.key()).await?)
    }

    // ─── Creation and saving ────────────────────────────────────────────

    /// Create a fresh untitled file or directory in `parent_path`.
    ///
    /// With no `kind` supplied this is a warn-only no-op: nothing is written
    /// and `Ok(None)` comes back.
    pub async fn new_untitled(
        &self,
        parent_path: &str,
        kind: Option<&str>,
        extension: Option<&str>,
    ) -> Result<Option<Entry>, DriveError> {
        let Some(kind) = kind else {
            warn!(parent = parent_path, "newUntitled called without a content type; nothing created");
            return Ok(None);
        };

        let parent = PathKey::parse(parent_path);
        if !parent.is_dir() {
            return Err(DriveError::InvalidPath(format!(
                "'{parent_path}' does not name a directory"
            )));
        }

        let siblings = self.sibling_names(self.bucket(), &parent).await?;
        let is_dir = kind == "directory";
        let name = naming::untitled_name(&siblings, extension, is_dir);
        let target = parent.join(&name);
        let object_key = if is_dir { target.dir_key() } else { target.key() };

        self.store.put(self.bucket(), &object_key, Vec::new()).await?;
        info!(path = %target, "created untitled entry");

        let entry = if is_dir {
            Entry::directory(target.name(), &target.path())
        } else {
            let file_type = self.registry.classify(target.extension());
            Entry {
                name: target.name().to_string(),
                path: target.path(),
                last_modified: Some(Utc::now()),
                created: None,
                content: None,
                format: file_type.format,
                mimetype: file_type.mimetype,
                size: 0,
                writable: true,
                kind: file_type.logical_type,
            }
        };

        let entry = Self::validated(entry)?;
        self.emit(ChangeKind::Created, &target, None);
        Ok(Some(entry))
    }

    /// Write `payload` to `path`, overwriting unconditionally.
    pub async fn save(&self, path: &str, payload: SavePayload) -> Result<Entry, DriveError> {
        let target = PathKey::parse(path);
        if target.is_dir() {
            return Err(DriveError::InvalidPath(format!(
                "cannot save file content to directory path '{path}'"
            )));
        }

        let file_type = self.registry.classify(target.extension());
        let (bytes, format) = match payload {
            SavePayload::Json(value) => (
                serde_json::to_string_pretty(&value)?.into_bytes(),
                ContentFormat::Json,
            ),
            SavePayload::Text(text) => (text.into_bytes(), ContentFormat::Text),
            SavePayload::Base64(encoded) => {
                if file_type.format == ContentFormat::Base64 {
                    (BASE64.decode(encoded.trim())?, ContentFormat::Base64)
                } else {
                    // Not binary-classified: the payload goes out verbatim.
                    (encoded.into_bytes(), ContentFormat::Base64)
                }
            }
        };

        let size = bytes.len() as u64;
        self.store.put(self.bucket(), &target.key(), bytes).await?;
        info!(path = %target, size, "saved entry");

        let entry = Entry {
            name: target.name().to_string(),
            path: target.path(),
            last_modified: Some(Utc::now()),
            created: None,
            content: None,
            format,
            mimetype: file_type.mimetype,
            size,
            writable: true,
            kind: file_type.logical_type,
        };

        let entry = Self::validated(entry)?;
        self.emit(ChangeKind::Saved, &target, None);
        Ok(entry)
    }

    // ─── Deletion ───────────────────────────────────────────────────────

    /// Delete a file, or a directory with everything under its prefix.
    ///
    /// Directory deletion is one delete request per observed key, issued
    /// sequentially; no check runs afterwards that zero keys remain.
    pub async fn delete(&self, path: &str) -> Result<(), DriveError> {
        let target = PathKey::parse(path);
        if target.is_root() {
            return Err(DriveError::InvalidPath(
                "refusing to delete the store root".to_string(),
            ));
        }

        let records = self.list_all_keys(self.bucket(), &target.key()).await?;
        if records.is_empty() {
            return Err(DriveError::NotFound(target.path()));
        }
        let is_dir = records.len() > 1 || records[0].key.ends_with('/');

        if is_dir {
            let mut completed = Vec::new();
            let marker = target.dir_key();
            self.step_delete(&marker, &mut completed).await?;

            let children = self.list_all_keys(self.bucket(), &marker).await?;
            for child in &children {
                self.step_delete(&child.key, &mut completed).await?;
            }
            info!(path = %target, deleted = completed.len(), "deleted directory");
        } else {
            self.store.delete(self.bucket(), &target.key()).await?;
            info!(path = %target, "deleted file");
        }

        self.emit(ChangeKind::Deleted, &target, None);
        Ok(())
    }

    // ─── Rename ─────────────────────────────────────────────────────────

    /// Move `old_path` to `new_path`, disambiguating the target name when it
    /// is already taken.
    ///
    /// For directories the children are copied under the new prefix but not
    /// individually deleted from the old one; only the top-level source key
    /// goes away. That asymmetry is observed source behavior and is kept for
    /// compatibility (see DESIGN.md).
    pub async fn rename(&self, old_path: &str, new_path: &str) -> Result<Entry, DriveError> {
        let old = PathKey::parse(old_path);
        let mut new = PathKey::parse(new_path);

        let records = self.list_all_keys(self.bucket(), &old.key()).await?;
        if records.is_empty() {
            return Err(DriveError::NotFound(old.path()));
        }
        let is_dir = records.len() > 1 || records[0].key.ends_with('/');
        let old_key = if is_dir { old.dir_key() } else { old.key() };

        // A purely inferred directory has no marker object to read.
        let bytes = match self.store.get(self.bucket(), &old_key).await {
            Ok(body) => body.bytes,
            Err(err) if err.is_not_found() && is_dir => Vec::new(),
            Err(err) => return Err(err.into()),
        };

        self.store.delete(self.bucket(), &old_key).await?;

        // Probe the destination; a miss is the expected no-collision branch.
        let probe_key = if is_dir { new.dir_key() } else { new.key() };
        if self.store.head(self.bucket(), &probe_key).await? {
            let siblings = self.sibling_names(self.bucket(), &new.parent()).await?;
            let resolved = naming::resolve(new.name(), &siblings, is_dir);
            debug!(target = %new, resolved = resolved.as_str(), "rename target taken, resolved");
            new = new.parent().join(&resolved);
        }

        let new_key = if is_dir { new.dir_key() } else { new.key() };
        let size = bytes.len() as u64;
        self.store.put(self.bucket(), &new_key, bytes).await?;

        if is_dir {
            let old_prefix = old.dir_key();
            let new_prefix = new.dir_key();
            let mut completed = Vec::new();
            let children = self.list_all_keys(self.bucket(), &old_prefix).await?;
            for child in &children {
                let rest = &child.key[old_prefix.len()..];
                let dest = format!("{new_prefix}{rest}");
                self.step_copy(&child.key, self.bucket(), &dest, &mut completed)
                    .await?;
            }
        }

        info!(from = %old, to = %new, "renamed entry");

        let entry = if is_dir {
            Entry::directory(new.name(), &new.path())
        } else {
            let file_type = self.registry.classify(new.extension());
            Entry {
                name: new.name().to_string(),
                path: new.path(),
                last_modified: Some(Utc::now()),
                created: None,
                content: None,
                format: file_type.format,
                mimetype: file_type.mimetype,
                size,
                writable: true,
                kind: file_type.logical_type,
            }
        };

        let entry = Self::validated(entry)?;
        self.emit(ChangeKind::Renamed, &new, Some(old.path()));
        Ok(entry)
    }

    // ─── Copy ───────────────────────────────────────────────────────────

    /// Copy `source_path` into `dest_dir` under a `-Copy`-suffixed name.
    /// The source is left untouched.
    pub async fn copy(&self, source_path: &str, dest_dir: &str) -> Result<Entry, DriveError> {
        self.copy_inner(source_path, dest_dir, None).await
    }

    /// Same as [`Drive::copy`] but the destination lives in another bucket;
    /// no local change notification is emitted.
    pub async fn copy_to_bucket(
        &self,
        source_path: &str,
        dest_dir: &str,
        dest_bucket: &str,
    ) -> Result<Entry, DriveError> {
        self.copy_inner(source_path, dest_dir, Some(dest_bucket)).await
    }

    async fn copy_inner(
        &self,
        source_path: &str,
        dest_dir: &str,
        dest_bucket: Option<&str>,
    ) -> Result<Entry, DriveError> {
        let source = PathKey::parse(source_path);
        let dest_parent = PathKey::parse(dest_dir);
        if !dest_parent.is_dir() {
            return Err(DriveError::InvalidPath(format!(
                "copy destination '{dest_dir}' does not name a directory"
            )));
        }
        let dest_bucket_name = dest_bucket.unwrap_or(self.bucket()).to_string();

        let records = self.list_all_keys(self.bucket(), &source.key()).await?;
        if records.is_empty() {
            return Err(DriveError::NotFound(source.path()));
        }
        let is_dir = records.len() > 1 || records[0].key.ends_with('/');

        let siblings = self.sibling_names(&dest_bucket_name, &dest_parent).await?;
        let name = naming::copy_name(source.name(), &siblings, is_dir);
        let dest = dest_parent.join(&name);

        let (source_key, dest_key) = if is_dir {
            (source.dir_key(), dest.dir_key())
        } else {
            (source.key(), dest.key())
        };

        let mut completed = Vec::new();
        match self.issue_copy(&source_key, &dest_bucket_name, &dest_key).await {
            Ok(()) => completed.push(StepRecord {
                kind: StepKind::CopyObject {
                    dest: dest_key.clone(),
                },
                key: source_key.clone(),
            }),
            // A purely inferred directory has no marker object to copy; the
            // destination stays marker-less too, as in rename.
            Err(err) if err.is_not_found() && is_dir => {
                debug!(source = source_key.as_str(), "source directory has no marker object; skipping top-level copy");
            }
            Err(source) => {
                return Err(DriveError::Partial {
                    completed,
                    failed: StepRecord {
                        kind: StepKind::CopyObject {
                            dest: dest_key.clone(),
                        },
                        key: source_key.clone(),
                    },
                    source,
                })
            }
        }

        if is_dir {
            let source_prefix = source.dir_key();
            let dest_prefix = dest.dir_key();
            let children = self.list_all_keys(self.bucket(), &source_prefix).await?;
            for child in &children {
                let rest = &child.key[source_prefix.len()..];
                let child_dest = format!("{dest_prefix}{rest}");
                self.step_copy(&child.key, &dest_bucket_name, &child_dest, &mut completed)
                    .await?;
            }
        }

        info!(from = %source, to = %dest, bucket = dest_bucket_name.as_str(), "copied entry");

        // Re-read the new top-level object for metadata.
        let entry = if is_dir {
            let mut entry = Entry::directory(dest.name(), &dest.path());
            // A marker-less destination has nothing to re-read.
            entry.last_modified = match self.store.get(&dest_bucket_name, &dest_key).await {
                Ok(body) => body.last_modified,
                Err(err) if err.is_not_found() => None,
                Err(err) => return Err(err.into()),
            };
            entry
        } else {
            let body = self.store.get(&dest_bucket_name, &dest_key).await?;
            let file_type = self.registry.classify(dest.extension());
            let (content, format) = if file_type.format == ContentFormat::Base64 {
                (EntryContent::Data(BASE64.encode(&body.bytes)), ContentFormat::Base64)
            } else {
                (
                    EntryContent::Data(String::from_utf8_lossy(&body.bytes).into_owned()),
                    file_type.format,
                )
            };
            Entry {
                name: dest.name().to_string(),
                path: dest.path(),
                last_modified: body.last_modified,
                created: None,
                content: Some(content),
                format,
                mimetype: file_type.mimetype,
                size: body.size,
                writable: true,
                kind: file_type.logical_type,
            }
        };

        let entry = Self::validated(entry)?;
        if dest_bucket.is_none() {
            self.emit(ChangeKind::Copied, &dest, Some(source.path()));
        }
        Ok(entry)
    }

    // ─── Checkpoints (no-op stubs) ──────────────────────────────────────
    //
    // The store keeps no object versions at this layer; the checkpoint API
    // exists for interface parity and does nothing, as in the source.

    pub async fn create_checkpoint(&self, path: &str) -> Result<Checkpoint, DriveError> {
        debug!(path, "checkpoints are stubbed; returning placeholder");
        Ok(Checkpoint {
            id: "checkpoint".to_string(),
            last_modified: None,
        })
    }

    pub async fn list_checkpoints(&self, path: &str) -> Result<Vec<Checkpoint>, DriveError> {
        debug!(path, "checkpoints are stubbed; none to list");
        Ok(Vec::new())
    }

    pub async fn restore_checkpoint(&self, path: &str, checkpoint_id: &str) -> Result<(), DriveError> {
        debug!(path, checkpoint_id, "checkpoints are stubbed; restore is a no-op");
        Ok(())
    }

    pub async fn delete_checkpoint(&self, path: &str, checkpoint_id: &str) -> Result<(), DriveError> {
        debug!(path, checkpoint_id, "checkpoints are stubbed; delete is a no-op");
        Ok(())
    }

    // ─── Internals ──────────────────────────────────────────────────────

    fn bucket(&self) -> &str {
        &self.config.bucket
    }

    fn emit(&self, kind: ChangeKind, path: &PathKey, old_path: Option<String>) {
        // No subscribers is fine; the send result is deliberately ignored.
        let _ = self.events.send(ChangeEvent {
            kind,
            path: path.path(),
            old_path,
        });
    }

    fn validated(entry: Entry) -> Result<Entry, DriveError> {
        entry.validate().map_err(DriveError::ModelViolation)?;
        Ok(entry)
    }

    /// Drain every page of a prefix listing. A partial page is never
    /// returned to callers.
    async fn list_all_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectRecord>, DriveError> {
        let mut records = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = self.store.list(bucket, prefix, token.as_deref()).await?;
            records.extend(page.entries);
            match (page.truncated, page.next_token) {
                (true, Some(next)) => token = Some(next),
                _ => break,
            }
        }
        Ok(records)
    }

    async fn list_dir_entries(&self, dir: &PathKey) -> Result<Vec<Entry>, DriveError> {
        let records = self.list_all_keys(self.bucket(), &dir.dir_key()).await?;
        Ok(self.listing_children(dir, &records))
    }

    /// Collapse a prefix listing into immediate children: keys with a
    /// further `/` group into one inferred directory per first segment,
    /// extension-less keys present as directories, everything else as files.
    fn listing_children(&self, dir: &PathKey, records: &[ObjectRecord]) -> Vec<Entry> {
        let prefix = dir.dir_key();
        let mut children: BTreeMap<String, Entry> = BTreeMap::new();

        for record in records {
            if record.key == prefix {
                // The directory's own marker object.
                continue;
            }
            let rest = &record.key[prefix.len()..];
            let (child_name, deeper) = match rest.find('/') {
                Some(idx) => (&rest[..idx], rest.len() > idx + 1),
                None => (rest, false),
            };
            if child_name.is_empty() {
                continue;
            }

            let child = dir.join(child_name);
            if deeper || rest.ends_with('/') || child.is_dir() {
                children
                    .entry(child_name.to_string())
                    .or_insert_with(|| Entry::directory(child_name, &child.path()));
            } else {
                let file_type = self.registry.classify(child.extension());
                children.insert(
                    child_name.to_string(),
                    Entry {
                        name: child_name.to_string(),
                        path: child.path(),
                        last_modified: record.last_modified,
                        created: None,
                        content: None,
                        format: file_type.format,
                        mimetype: file_type.mimetype,
                        size: record.size,
                        writable: true,
                        kind: file_type.logical_type,
                    },
                );
            }
        }

        children.into_values().collect()
    }

    fn directory_entry(&self, dir: &PathKey, children: Vec<Entry>) -> Entry {
        let mut entry = Entry::directory(dir.name(), &dir.path());
        entry.content = Some(EntryContent::Listing(children));
        entry
    }

    async fn sibling_names(&self, bucket: &str, dir: &PathKey) -> Result<Vec<String>, DriveError> {
        let records = self.list_all_keys(bucket, &dir.dir_key()).await?;
        Ok(self
            .listing_children(dir, &records)
            .into_iter()
            .map(|entry| entry.name)
            .collect())
    }

    async fn step_delete(&self, key: &str, completed: &mut Vec<StepRecord>) -> Result<(), DriveError> {
        let record = StepRecord {
            kind: StepKind::DeleteObject,
            key: key.to_string(),
        };
        match self.store.delete(self.bucket(), key).await {
            Ok(()) => {
                completed.push(record);
                Ok(())
            }
            Err(source) => Err(DriveError::Partial {
                completed: std::mem::take(completed),
                failed: record,
                source,
            }),
        }
    }

    async fn issue_copy(
        &self,
        source_key: &str,
        dest_bucket: &str,
        dest_key: &str,
    ) -> Result<(), StoreError> {
        if self.bucket() == dest_bucket {
            self.store.copy(self.bucket(), source_key, dest_key).await
        } else {
            self.store
                .copy_to_bucket(self.bucket(), source_key, dest_bucket, dest_key)
                .await
        }
    }

    async fn step_copy(
        &self,
        source_key: &str,
        dest_bucket: &str,
        dest_key: &str,
        completed: &mut Vec<StepRecord>,
    ) -> Result<(), DriveError> {
        let record = StepRecord {
            kind: StepKind::CopyObject {
                dest: dest_key.to_string(),
            },
            key: source_key.to_string(),
        };
        match self.issue_copy(source_key, dest_bucket, dest_key).await {
            Ok(()) => {
                completed.push(record);
                Ok(())
            }
            Err(source) => Err(DriveError::Partial {
                completed: std::mem::take(completed),
                failed: record,
                source,
            }),
        }
    }
}

/// Checkpoint handle. The store keeps no versions at this layer, so these
/// are placeholders only.
#[derive(Debug, Clone, Serialize)]
pub struct Checkpoint {
    pub id: String,
    pub last_modified: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filetype::FileTypeSpec;
    use crate::store::MemoryStore;

    fn catalog() -> Vec<FileTypeSpec> {
        vec![
            FileTypeSpec {
                extensions: vec![".json".to_string()],
                logical_type: "json".to_string(),
                mime_types: vec!["application/json".to_string()],
                content_format: ContentFormat::Json,
            },
            FileTypeSpec {
                extensions: vec![".ipynb".to_string()],
                logical_type: "notebook".to_string(),
                mime_types: vec!["application/x-ipynb+json".to_string()],
                content_format: ContentFormat::Json,
            },
            FileTypeSpec {
                extensions: vec![".png".to_string()],
                logical_type: "image".to_string(),
                mime_types: vec!["image/png".to_string()],
                content_format: ContentFormat::Base64,
            },
        ]
    }

    fn drive_over(store: Arc<MemoryStore>) -> Drive {
        Drive::new(
            store,
            StoreConfig::for_bucket("bucket", "mem-east-1"),
            FileTypeRegistry::new(&catalog()),
        )
    }

    fn data(entry: &Entry) -> &str {
        match entry.content.as_ref() {
            Some(EntryContent::Data(text)) => text,
            other => panic!("expected data content, got {other:?}"),
        }
    }

    fn listing(entry: &Entry) -> &[Entry] {
        match entry.content.as_ref() {
            Some(EntryContent::Listing(children)) => children,
            other => panic!("expected listing content, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_save_then_get_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let drive = drive_over(store);

        let saved = drive
            .save("notes/hello.txt", SavePayload::Text("hello".to_string()))
            .await
            .unwrap();
        assert_eq!(saved.size, 5);

        let fetched = drive.get("notes/hello.txt").await.unwrap();
        assert_eq!(data(&fetched), "hello");
        assert_eq!(fetched.size, 5);
        assert_eq!(fetched.format, ContentFormat::Text);
    }

    #[tokio::test]
    async fn test_save_json_pretty_prints() {
        let store = Arc::new(MemoryStore::new());
        let drive = drive_over(store.clone());

        drive
            .save(
                "config/app.json",
                SavePayload::Json(serde_json::json!({"debug": true, "level": 3})),
            )
            .await
            .unwrap();

        let body = store.get("bucket", "config/app.json").await.unwrap();
        let text = String::from_utf8(body.bytes).unwrap();
        assert!(text.contains('\n'), "expected pretty-printed JSON: {text}");
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&text).unwrap()["level"],
            3
        );
    }

    #[tokio::test]
    async fn test_save_base64_decodes_for_binary_types() {
        let store = Arc::new(MemoryStore::new());
        let drive = drive_over(store.clone());

        let raw: Vec<u8> = vec![0x89, 0x50, 0x4e, 0x47, 0x00, 0xff];
        drive
            .save("img/pic.png", SavePayload::Base64(BASE64.encode(&raw)))
            .await
            .unwrap();

        let body = store.get("bucket", "img/pic.png").await.unwrap();
        assert_eq!(body.bytes, raw);

        let fetched = drive.get("img/pic.png").await.unwrap();
        assert_eq!(fetched.format, ContentFormat::Base64);
        assert_eq!(data(&fetched), &BASE64.encode(&raw));
    }

    #[tokio::test]
    async fn test_notebook_read_forces_text_format() {
        let store = Arc::new(MemoryStore::new());
        store
            .put("bucket", "work/analysis.ipynb", b"{\"cells\": []}".to_vec())
            .await
            .unwrap();
        let drive = drive_over(store);

        let fetched = drive.get("work/analysis.ipynb").await.unwrap();
        assert_eq!(fetched.kind, "notebook");
        assert_eq!(fetched.format, ContentFormat::Text);
        assert_eq!(data(&fetched), "{\"cells\": []}");
    }

    #[tokio::test]
    async fn test_get_missing_file_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let drive = drive_over(store);
        assert!(matches!(
            drive.get("nope.txt").await,
            Err(DriveError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_root_listing_infers_directory_from_nested_key() {
        let store = Arc::new(MemoryStore::new());
        store.put("bucket", "a/b.txt", vec![1, 2]).await.unwrap();
        store.put("bucket", "top.txt", vec![3]).await.unwrap();
        let drive = drive_over(store);

        let root = drive.get("").await.unwrap();
        let children = listing(&root);
        assert_eq!(children.len(), 2);

        let inferred = children.iter().find(|child| child.name == "a").unwrap();
        assert!(inferred.is_dir());
        let file = children.iter().find(|child| child.name == "top.txt").unwrap();
        assert_eq!(file.kind, "file");
        assert_eq!(file.size, 1);
    }

    #[tokio::test]
    async fn test_listing_drains_every_page() {
        let store = Arc::new(MemoryStore::with_page_size(2));
        for name in ["a.txt", "b.txt", "c.txt", "d.txt", "e.txt"] {
            store.put("bucket", name, vec![0]).await.unwrap();
        }
        let drive = drive_over(store);

        let root = drive.list("").await.unwrap();
        assert_eq!(listing(&root).len(), 5);
    }

    #[tokio::test]
    async fn test_nested_listing_skips_marker_and_deeper_levels() {
        let store = Arc::new(MemoryStore::new());
        store.put("bucket", "dir/", Vec::new()).await.unwrap();
        store.put("bucket", "dir/x.txt", vec![1]).await.unwrap();
        store.put("bucket", "dir/sub/", Vec::new()).await.unwrap();
        store.put("bucket", "dir/sub/deep.txt", vec![2]).await.unwrap();
        let drive = drive_over(store);

        let entry = drive.get("dir").await.unwrap();
        let children = listing(&entry);
        let names: Vec<&str> = children.iter().map(|child| child.name.as_str()).collect();
        assert_eq!(names, vec!["sub", "x.txt"]);
        assert!(children[0].is_dir());
    }

    #[tokio::test]
    async fn test_untitled_collision_sequence() {
        let store = Arc::new(MemoryStore::new());
        let drive = drive_over(store);

        let first = drive.new_untitled("", Some("file"), None).await.unwrap().unwrap();
        assert_eq!(first.name, "untitled.txt");

        let second = drive.new_untitled("", Some("file"), None).await.unwrap().unwrap();
        assert_eq!(second.name, "untitled1.txt");
    }

    #[tokio::test]
    async fn test_untitled_directory_writes_marker() {
        let store = Arc::new(MemoryStore::new());
        let drive = drive_over(store.clone());

        let entry = drive
            .new_untitled("", Some("directory"), None)
            .await
            .unwrap()
            .unwrap();
        assert!(entry.is_dir());
        assert_eq!(entry.name, "Untitled Folder");
        assert!(store.keys("bucket").contains(&"Untitled Folder/".to_string()));
    }

    #[tokio::test]
    async fn test_untitled_without_type_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let drive = drive_over(store.clone());

        let result = drive.new_untitled("", None, None).await.unwrap();
        assert!(result.is_none());
        assert!(store.keys("bucket").is_empty());
    }

    #[tokio::test]
    async fn test_recursive_delete_clears_prefix() {
        let store = Arc::new(MemoryStore::new());
        store.put("bucket", "dir/", Vec::new()).await.unwrap();
        store.put("bucket", "dir/x.txt", vec![1]).await.unwrap();
        store.put("bucket", "dir/y.txt", vec![2]).await.unwrap();
        store.put("bucket", "other.txt", vec![3]).await.unwrap();
        let drive = drive_over(store.clone());

        drive.delete("dir").await.unwrap();

        let remaining = store.keys("bucket");
        assert!(remaining.iter().all(|key| !key.starts_with("dir/")));
        assert!(remaining.contains(&"other.txt".to_string()));
    }

    #[tokio::test]
    async fn test_partial_delete_reports_progress_without_rollback() {
        let store = Arc::new(MemoryStore::new());
        store.put("bucket", "dir/", Vec::new()).await.unwrap();
        store.put("bucket", "dir/a.txt", vec![1]).await.unwrap();
        store.put("bucket", "dir/b.txt", vec![2]).await.unwrap();
        store.put("bucket", "dir/c.txt", vec![3]).await.unwrap();
        // Marker plus first child succeed, second child fails.
        store.fail_deletes_after(2);
        let drive = drive_over(store.clone());

        let err = drive.delete("dir").await.unwrap_err();
        match err {
            DriveError::Partial { completed, failed, .. } => {
                assert_eq!(completed.len(), 2);
                assert_eq!(completed[0].key, "dir/");
                assert_eq!(completed[1].key, "dir/a.txt");
                assert_eq!(failed.key, "dir/b.txt");
            }
            other => panic!("expected Partial, got {other:?}"),
        }

        // No rollback: the completed deletes stay deleted.
        let remaining = store.keys("bucket");
        assert!(!remaining.contains(&"dir/a.txt".to_string()));
        assert!(remaining.contains(&"dir/b.txt".to_string()));
        assert!(remaining.contains(&"dir/c.txt".to_string()));
    }

    #[tokio::test]
    async fn test_partial_rename_copy_failure_reports_progress_without_rollback() {
        let store = Arc::new(MemoryStore::new());
        store.put("bucket", "old/", Vec::new()).await.unwrap();
        store.put("bucket", "old/a.txt", vec![1]).await.unwrap();
        store.put("bucket", "old/b.txt", vec![2]).await.unwrap();
        // First child copy succeeds, second fails.
        store.fail_copies_after(1);
        let drive = drive_over(store.clone());

        let err = drive.rename("old", "new").await.unwrap_err();
        match err {
            DriveError::Partial { completed, failed, .. } => {
                assert_eq!(completed.len(), 1);
                assert_eq!(completed[0].key, "old/a.txt");
                assert_eq!(failed.key, "old/b.txt");
            }
            other => panic!("expected Partial, got {other:?}"),
        }

        // No rollback: the marker already moved and the finished child copy
        // stays where it landed.
        let keys = store.keys("bucket");
        assert!(keys.contains(&"new/".to_string()));
        assert!(keys.contains(&"new/a.txt".to_string()));
        assert!(!keys.contains(&"new/b.txt".to_string()));
        assert!(!keys.contains(&"old/".to_string()));
        assert!(keys.contains(&"old/b.txt".to_string()));
    }

    #[tokio::test]
    async fn test_rename_file() {
        let store = Arc::new(MemoryStore::new());
        store.put("bucket", "a.txt", b"payload".to_vec()).await.unwrap();
        let drive = drive_over(store.clone());

        let entry = drive.rename("a.txt", "c.txt").await.unwrap();
        assert_eq!(entry.name, "c.txt");

        let keys = store.keys("bucket");
        assert!(!keys.contains(&"a.txt".to_string()));
        let body = store.get("bucket", "c.txt").await.unwrap();
        assert_eq!(body.bytes, b"payload");
    }

    #[tokio::test]
    async fn test_rename_collision_picks_numeric_suffix() {
        let store = Arc::new(MemoryStore::new());
        store.put("bucket", "a.txt", b"from-a".to_vec()).await.unwrap();
        store.put("bucket", "b.txt", b"from-b".to_vec()).await.unwrap();
        let drive = drive_over(store.clone());

        let entry = drive.rename("a.txt", "b.txt").await.unwrap();
        assert_eq!(entry.name, "b1.txt");

        let keys = store.keys("bucket");
        assert!(!keys.contains(&"a.txt".to_string()));
        assert_eq!(store.get("bucket", "b.txt").await.unwrap().bytes, b"from-b");
        assert_eq!(store.get("bucket", "b1.txt").await.unwrap().bytes, b"from-a");
    }

    // Pins the source asymmetry: directory children are copied to the new
    // prefix but only the top-level marker is deleted from the old one.
    #[tokio::test]
    async fn test_rename_directory_leaves_children_under_old_prefix() {
        let store = Arc::new(MemoryStore::new());
        store.put("bucket", "old/", Vec::new()).await.unwrap();
        store.put("bucket", "old/x.txt", vec![1]).await.unwrap();
        let drive = drive_over(store.clone());

        let entry = drive.rename("old", "new").await.unwrap();
        assert!(entry.is_dir());
        assert_eq!(entry.path, "new");

        let keys = store.keys("bucket");
        assert!(keys.contains(&"new/".to_string()));
        assert!(keys.contains(&"new/x.txt".to_string()));
        assert!(!keys.contains(&"old/".to_string()));
        assert!(keys.contains(&"old/x.txt".to_string()));
    }

    #[tokio::test]
    async fn test_copy_is_non_destructive() {
        let store = Arc::new(MemoryStore::new());
        store.put("bucket", "a.txt", b"hello".to_vec()).await.unwrap();
        store.put("bucket", "dir/", Vec::new()).await.unwrap();
        let drive = drive_over(store.clone());

        let entry = drive.copy("a.txt", "dir").await.unwrap();
        assert_eq!(entry.name, "a-Copy.txt");
        assert_eq!(entry.path, "dir/a-Copy.txt");
        assert_eq!(data(&entry), "hello");

        assert_eq!(store.get("bucket", "a.txt").await.unwrap().bytes, b"hello");
        assert_eq!(
            store.get("bucket", "dir/a-Copy.txt").await.unwrap().bytes,
            b"hello"
        );
    }

    #[tokio::test]
    async fn test_copy_directory_copies_children() {
        let store = Arc::new(MemoryStore::new());
        store.put("bucket", "photos/", Vec::new()).await.unwrap();
        store.put("bucket", "photos/x.png", vec![9]).await.unwrap();
        let drive = drive_over(store.clone());

        let entry = drive.copy("photos", "").await.unwrap();
        assert_eq!(entry.name, "photos-Copy");

        let keys = store.keys("bucket");
        assert!(keys.contains(&"photos-Copy/".to_string()));
        assert!(keys.contains(&"photos-Copy/x.png".to_string()));
        assert!(keys.contains(&"photos/x.png".to_string()));
    }

    #[tokio::test]
    async fn test_copy_inferred_directory_without_marker() {
        let store = Arc::new(MemoryStore::new());
        store.put("bucket", "logs/jan.txt", vec![1]).await.unwrap();
        store.put("bucket", "logs/feb.txt", vec![2]).await.unwrap();
        let drive = drive_over(store.clone());

        let entry = drive.copy("logs", "").await.unwrap();
        assert_eq!(entry.name, "logs-Copy");
        assert!(entry.is_dir());

        // Children are copied; the destination stays marker-less like the
        // source.
        let keys = store.keys("bucket");
        assert!(keys.contains(&"logs-Copy/jan.txt".to_string()));
        assert!(keys.contains(&"logs-Copy/feb.txt".to_string()));
        assert!(!keys.contains(&"logs-Copy/".to_string()));
    }

    #[tokio::test]
    async fn test_partial_copy_failure_reports_progress_without_rollback() {
        let store = Arc::new(MemoryStore::new());
        store.put("bucket", "photos/", Vec::new()).await.unwrap();
        store.put("bucket", "photos/x.png", vec![9]).await.unwrap();
        // Top-level marker copy succeeds, the child copy fails.
        store.fail_copies_after(1);
        let drive = drive_over(store.clone());

        let err = drive.copy("photos", "").await.unwrap_err();
        match err {
            DriveError::Partial { completed, failed, .. } => {
                assert_eq!(completed.len(), 1);
                assert_eq!(completed[0].key, "photos/");
                assert_eq!(failed.key, "photos/");
            }
            other => panic!("expected Partial, got {other:?}"),
        }

        // No rollback: the copied marker stays, the source is untouched.
        let keys = store.keys("bucket");
        assert!(keys.contains(&"photos-Copy/".to_string()));
        assert!(keys.contains(&"photos/x.png".to_string()));
    }

    #[tokio::test]
    async fn test_copy_to_other_bucket_emits_no_event() {
        let store = Arc::new(MemoryStore::new());
        store.put("bucket", "a.txt", b"hello".to_vec()).await.unwrap();
        let drive = drive_over(store.clone());
        let mut events = drive.subscribe();

        let entry = drive.copy_to_bucket("a.txt", "", "other").await.unwrap();
        assert_eq!(entry.name, "a-Copy.txt");
        assert_eq!(
            store.get("other", "a-Copy.txt").await.unwrap().bytes,
            b"hello"
        );
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_mutations_emit_change_events() {
        let store = Arc::new(MemoryStore::new());
        let drive = drive_over(store);
        let mut events = drive.subscribe();

        drive
            .save("a.txt", SavePayload::Text("x".to_string()))
            .await
            .unwrap();
        let saved = events.try_recv().unwrap();
        assert_eq!(saved.kind, ChangeKind::Saved);
        assert_eq!(saved.path, "a.txt");

        drive.delete("a.txt").await.unwrap();
        let deleted = events.try_recv().unwrap();
        assert_eq!(deleted.kind, ChangeKind::Deleted);
        assert_eq!(deleted.path, "a.txt");
    }

    #[tokio::test]
    async fn test_no_event_when_entry_fails_validation() {
        let store = Arc::new(MemoryStore::new());
        // A catalog entry with an empty MIME type yields entries that fail
        // content-model validation.
        let registry = FileTypeRegistry::new(&[FileTypeSpec {
            extensions: vec![".bad".to_string()],
            logical_type: "file".to_string(),
            mime_types: vec![String::new()],
            content_format: ContentFormat::Text,
        }]);
        let drive = Drive::new(
            store,
            StoreConfig::for_bucket("bucket", "mem-east-1"),
            registry,
        );
        let mut events = drive.subscribe();

        let err = drive
            .save("x.bad", SavePayload::Text("data".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, DriveError::ModelViolation(_)));
        // A failed mutation must not be announced to subscribers.
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_exists() {
        let store = Arc::new(MemoryStore::new());
        store.put("bucket", "dir/x.txt", vec![1]).await.unwrap();
        let drive = drive_over(store);

        assert!(drive.exists("").await.unwrap());
        assert!(drive.exists("dir").await.unwrap());
        assert!(drive.exists("dir/x.txt").await.unwrap());
        assert!(!drive.exists("dir/y.txt").await.unwrap());
        assert!(!drive.exists("elsewhere").await.unwrap());
    }

    #[tokio::test]
    async fn test_checkpoints_are_stubs() {
        let store = Arc::new(MemoryStore::new());
        let drive = drive_over(store);

        let checkpoint = drive.create_checkpoint("a.txt").await.unwrap();
        assert_eq!(checkpoint.id, "checkpoint");
        assert!(drive.list_checkpoints("a.txt").await.unwrap().is_empty());
        drive.restore_checkpoint("a.txt", "checkpoint").await.unwrap();
        drive.delete_checkpoint("a.txt", "checkpoint").await.unwrap();
    }

    #[tokio::test]
    async fn test_store_info_reports_region() {
        let store = Arc::new(MemoryStore::new());
        let drive = drive_over(store);
        assert_eq!(drive.store_info().await.unwrap(), "bucket (mem-east-1)");
    }
}
