//! File type registry
//!
//! Maps file extensions to a logical type, a primary MIME type and a content
//! format. The catalog is supplied once by the embedding application (e.g.
//! from its document-type registry); unknown extensions fall back to plain
//! text, with `mime_guess` consulted for the MIME type before giving up.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Wire/content format of an entry's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    /// Structured content: directory listings and JSON documents
    Json,
    /// UTF-8 text
    Text,
    /// Binary payload, base64-encoded in transit
    Base64,
}

impl ContentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentFormat::Json => "json",
            ContentFormat::Text => "text",
            ContentFormat::Base64 => "base64",
        }
    }
}

/// One catalog entry supplied at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTypeSpec {
    /// Extensions this entry covers, with or without the leading dot
    pub extensions: Vec<String>,
    /// Logical type name (e.g. "file", "notebook", "pdf")
    pub logical_type: String,
    /// MIME types, most specific first
    pub mime_types: Vec<String>,
    /// Content format for payloads of this type
    pub content_format: ContentFormat,
}

/// Classification result for one extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileType {
    pub logical_type: String,
    pub mimetype: String,
    pub format: ContentFormat,
}

/// Extension → file type lookup, populated once.
#[derive(Debug, Clone)]
pub struct FileTypeRegistry {
    by_extension: HashMap<String, FileType>,
}

impl FileTypeRegistry {
    /// Build a registry from the supplied catalog. The directory type is
    /// seeded explicitly and not part of the catalog.
    pub fn new(specs: &[FileTypeSpec]) -> Self {
        let mut by_extension = HashMap::new();
        for spec in specs {
            let mimetype = spec
                .mime_types
                .first()
                .cloned()
                .unwrap_or_else(|| "text/plain".to_string());
            for extension in &spec.extensions {
                let normalized = extension.trim_start_matches('.').to_ascii_lowercase();
                if normalized.is_empty() {
                    continue;
                }
                by_extension.insert(
                    normalized,
                    FileType {
                        logical_type: spec.logical_type.clone(),
                        mimetype: mimetype.clone(),
                        format: spec.content_format,
                    },
                );
            }
        }
        Self { by_extension }
    }

    /// The seeded directory type.
    pub fn directory() -> FileType {
        FileType {
            logical_type: "directory".to_string(),
            mimetype: "text/directory".to_string(),
            format: ContentFormat::Json,
        }
    }

    /// Classify an extension. `None` (no extension) is a directory; unknown
    /// extensions fall back to `(file, text/plain, text)`.
    ///
    /// Notebook-like structured documents are forced to format `text` even
    /// when the catalog registered them as `json`: their payload travels as
    /// serialized text and is parsed by the consumer, not by this layer.
    pub fn classify(&self, extension: Option<&str>) -> FileType {
        let Some(extension) = extension else {
            return Self::directory();
        };

        let normalized = extension.trim_start_matches('.').to_ascii_lowercase();
        if let Some(file_type) = self.by_extension.get(&normalized) {
            let mut file_type = file_type.clone();
            if file_type.logical_type == "notebook" && file_type.format == ContentFormat::Json {
                file_type.format = ContentFormat::Text;
            }
            return file_type;
        }

        let mimetype = mime_guess::from_ext(&normalized)
            .first()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| "text/plain".to_string());

        FileType {
            logical_type: "file".to_string(),
            mimetype,
            format: ContentFormat::Text,
        }
    }
}
