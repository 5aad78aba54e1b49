//! Naming collision resolver
//!
//! Pure name arithmetic: given a desired name and the names of the existing
//! siblings, produce the name to actually write. Used by untitled creation,
//! rename-target disambiguation and copy-target generation.

/// Default stem for new untitled files.
pub const UNTITLED_FILE: &str = "untitled";

/// Default extension for new untitled files.
pub const UNTITLED_EXTENSION: &str = "txt";

/// Default name for new untitled directories.
pub const UNTITLED_DIRECTORY: &str = "Untitled Folder";

/// Suffix convention for copy targets (`name-Copy`, `name-Copy1`, ...).
pub const COPY_SUFFIX: &str = "-Copy";

/// Split a name into stem and `.ext` tail on the last dot.
fn split_name(name: &str, is_dir: bool) -> (&str, &str) {
    if is_dir {
        return (name, "");
    }
    match name.rfind('.') {
        Some(idx) => (&name[..idx], &name[idx..]),
        None => (name, ""),
    }
}

/// Resolve `desired` against the sibling names of its target directory.
///
/// The stem of `desired` is checked against each sibling by prefix equality
/// (case-sensitive). Zero matches keep the stem unchanged; otherwise the
/// match count is appended as a numeric suffix and the extension (or
/// directory shape) is re-attached.
///
/// Known fragility, preserved deliberately: the counter pass does not loop
/// to guarantee uniqueness. When numeric variants exist sparsely (`name`,
/// `name2` but no `name1`) the counted suffix can land on a taken name.
/// Upgrading to gapless uniqueness would change generated names and is out
/// of scope.
pub fn resolve(desired: &str, siblings: &[String], is_dir: bool) -> String {
    let desired = desired.trim_end_matches('/');
    let (stem, ext) = split_name(desired, is_dir);

    let count = siblings
        .iter()
        .filter(|sibling| sibling.trim_end_matches('/').starts_with(stem))
        .count();

    if count == 0 {
        format!("{stem}{ext}")
    } else {
        format!("{stem}{count}{ext}")
    }
}

/// Name for a fresh untitled file or directory in a directory whose children
/// carry `siblings` as names.
pub fn untitled_name(siblings: &[String], extension: Option<&str>, is_dir: bool) -> String {
    if is_dir {
        return resolve(UNTITLED_DIRECTORY, siblings, true);
    }
    let ext = extension
        .map(|e| e.trim_start_matches('.'))
        .filter(|e| !e.is_empty())
        .unwrap_or(UNTITLED_EXTENSION);
    resolve(&format!("{UNTITLED_FILE}.{ext}"), siblings, false)
}

/// Name for a copy of `source_name` placed among `siblings`.
pub fn copy_name(source_name: &str, siblings: &[String], is_dir: bool) -> String {
    let source_name = source_name.trim_end_matches('/');
    let (stem, ext) = split_name(source_name, is_dir);
    resolve(&format!("{stem}{COPY_SUFFIX}{ext}"), siblings, is_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_untitled_sequence() {
        assert_eq!(untitled_name(&[], None, false), "untitled.txt");
        assert_eq!(
            untitled_name(&names(&["untitled.txt"]), None, false),
            "untitled1.txt"
        );
        assert_eq!(
            untitled_name(&names(&["untitled.txt", "untitled1.txt"]), None, false),
            "untitled2.txt"
        );
    }

    #[test]
    fn test_untitled_directory() {
        assert_eq!(untitled_name(&[], None, true), "Untitled Folder");
        assert_eq!(
            untitled_name(&names(&["Untitled Folder"]), None, true),
            "Untitled Folder1"
        );
    }

    #[test]
    fn test_untitled_custom_extension() {
        assert_eq!(untitled_name(&[], Some(".md"), false), "untitled.md");
    }

    #[test]
    fn test_resolve_no_collision_keeps_name() {
        assert_eq!(
            resolve("b.txt", &names(&["a.txt", "c.txt"]), false),
            "b.txt"
        );
    }

    #[test]
    fn test_resolve_appends_match_count() {
        assert_eq!(resolve("b.txt", &names(&["b.txt"]), false), "b1.txt");
        assert_eq!(
            resolve("b.txt", &names(&["b.txt", "b1.txt"]), false),
            "b2.txt"
        );
    }

    #[test]
    fn test_copy_names() {
        assert_eq!(copy_name("a.txt", &[], false), "a-Copy.txt");
        assert_eq!(
            copy_name("a.txt", &names(&["a-Copy.txt"]), false),
            "a-Copy1.txt"
        );
        assert_eq!(copy_name("photos", &[], true), "photos-Copy");
    }

    // Pins the documented sparse-sequence fragility: the count lands on a
    // name that is already taken.
    #[test]
    fn test_sparse_suffixes_can_still_collide() {
        let resolved = resolve("b.txt", &names(&["b.txt", "b2.txt"]), false);
        assert_eq!(resolved, "b2.txt");
    }
}
