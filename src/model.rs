//! Content model
//!
//! `Entry` is the unified file/directory record returned by every drive
//! operation. Entries are built fresh per call and validated before they are
//! handed back; a malformed entry is a programming defect and fails loudly
//! rather than being coerced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filetype::ContentFormat;

/// Payload of an entry: a directory listing or serialized file data.
///
/// Whether `Data` holds plain text, pretty-printed JSON or a base64 string
/// is carried by the entry's `format` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryContent {
    Listing(Vec<Entry>),
    Data(String),
}

/// Unified file/directory content record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Last path segment; empty for the root
    pub name: String,
    /// Full logical path, no trailing slash; empty for the root
    pub path: String,
    /// Last modification time as reported by the store
    pub last_modified: Option<DateTime<Utc>>,
    /// Creation time; usually unknown (the store tracks only modification)
    pub created: Option<DateTime<Utc>>,
    /// Payload; `None` for metadata-only results
    pub content: Option<EntryContent>,
    /// Content format of the payload
    pub format: ContentFormat,
    /// Primary MIME type
    pub mimetype: String,
    /// Size in bytes (0 for directories)
    pub size: u64,
    /// Always true; the store is not access-controlled at this layer
    pub writable: bool,
    /// Logical type ("file", "directory", or a registry type)
    #[serde(rename = "type")]
    pub kind: String,
}

impl Entry {
    /// Metadata-only directory entry.
    pub fn directory(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            last_modified: None,
            created: None,
            content: None,
            format: ContentFormat::Json,
            mimetype: "text/directory".to_string(),
            size: 0,
            writable: true,
            kind: "directory".to_string(),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == "directory"
    }

    /// Check the entry against the content-model shape. Returns the first
    /// violation found; callers turn this into a loud failure.
    pub fn validate(&self) -> Result<(), String> {
        if !self.writable {
            return Err(format!("entry '{}' is marked non-writable", self.path));
        }
        if self.mimetype.is_empty() {
            return Err(format!("entry '{}' has an empty mimetype", self.path));
        }

        let last_segment = self.path.rsplit('/').next().unwrap_or("");
        if last_segment != self.name {
            return Err(format!(
                "entry name '{}' does not match path '{}'",
                self.name, self.path
            ));
        }

        if self.is_dir() {
            if self.format != ContentFormat::Json {
                return Err(format!(
                    "directory '{}' has format {}, expected json",
                    self.path,
                    self.format.as_str()
                ));
            }
            if matches!(self.content, Some(EntryContent::Data(_))) {
                return Err(format!("directory '{}' carries raw data content", self.path));
            }
        } else if matches!(self.content, Some(EntryContent::Listing(_))) {
            return Err(format!("file '{}' carries a listing as content", self.path));
        }

        Ok(())
    }
}
