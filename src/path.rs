//! Path/key model
//!
//! The store is flat; hierarchy is a convention layered on top of keys.
//! `PathKey` centralizes that convention so directory-ness, parents and
//! marker keys are derived in exactly one place instead of by string
//! splitting at every call site:
//!
//! - `/` delimits path segments inside a key.
//! - A path ending in `/`, or whose final segment carries no `.`-qualified
//!   suffix, names a directory.
//! - A directory's marker object (when one exists) is the key with a
//!   trailing `/` and a zero-size body.

use std::fmt;

/// A logical path resolved against the flat key space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathKey {
    segments: Vec<String>,
    dir: bool,
}

impl PathKey {
    /// The store root (empty path).
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
            dir: true,
        }
    }

    /// Parse a logical path. Leading/trailing slashes and empty segments are
    /// collapsed; a trailing slash or an extension-less final segment marks a
    /// directory.
    pub fn parse(path: &str) -> Self {
        let trailing_slash = path.ends_with('/');
        let segments: Vec<String> = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        if segments.is_empty() {
            return Self::root();
        }

        let dir = trailing_slash || !segments[segments.len() - 1].contains('.');
        Self { segments, dir }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_dir(&self) -> bool {
        self.dir
    }

    /// Last path segment; empty for the root.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// Parent directory; the root is its own parent.
    pub fn parent(&self) -> PathKey {
        if self.segments.len() <= 1 {
            return Self::root();
        }
        Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
            dir: true,
        }
    }

    /// Append a child name. The child's own shape (trailing slash, missing
    /// extension) decides whether the result is a directory.
    pub fn join(&self, child: &str) -> PathKey {
        let mut joined = self.segments.clone();
        let child_key = PathKey::parse(child);
        joined.extend(child_key.segments.iter().cloned());
        Self {
            segments: joined,
            dir: child_key.dir,
        }
    }

    /// The object key for this path (no trailing slash). Empty for the root.
    pub fn key(&self) -> String {
        self.segments.join("/")
    }

    /// The directory marker/prefix key: object key plus trailing `/`.
    /// The root's prefix is the empty string.
    pub fn dir_key(&self) -> String {
        if self.is_root() {
            String::new()
        } else {
            format!("{}/", self.key())
        }
    }

    /// The logical path, without a trailing slash.
    pub fn path(&self) -> String {
        self.key()
    }

    /// Extension of the final segment: the text after the *last* `.`.
    /// Multi-dot names keep last-segment semantics (`archive.tar.gz` -> `gz`),
    /// a documented edge case carried over from the key convention.
    pub fn extension(&self) -> Option<&str> {
        if self.dir {
            return None;
        }
        let name = self.name();
        name.rfind('.').map(|idx| &name[idx + 1..])
    }

    /// Final segment with the extension stripped.
    pub fn stem(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(idx) if !self.dir => &name[..idx],
            _ => name,
        }
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.key())
    }
}
