//! Context path codec and tree predicates.
//!
//! Contexts form a tree addressed by dotted paths. The internal form carries
//! a single leading dot on every non-root path (`.work.job`) and is the empty
//! string for the root; the user-facing form has no leading dot. All subtree
//! matching goes through [`is_within`], which tests prefixes at dot
//! boundaries so `.work2` is never mistaken for a descendant of `.work`.

use crate::{Error, Result};

/// Separator between context names in a path.
pub const SEPARATOR: char = '.';

/// Convert a user-facing context path to the internal dotted form.
pub fn encode(user: &str) -> String {
    if user.is_empty() || user.starts_with(SEPARATOR) {
        user.to_string()
    } else {
        format!("{SEPARATOR}{user}")
    }
}

/// Convert an internal path back to the user-facing form. The root stays
/// empty.
pub fn decode(internal: &str) -> &str {
    internal.strip_prefix(SEPARATOR).unwrap_or(internal)
}

/// Replace the final name of `path` with `new_leaf`, keeping every ancestor
/// segment.
///
/// Rejects an empty leaf, a leaf containing the separator, and the root
/// (which has no name to replace).
pub fn rename(path: &str, new_leaf: &str) -> Result<String> {
    if path.is_empty() {
        return Err(Error::RenameRoot);
    }
    if new_leaf.is_empty() {
        return Err(Error::EmptyContextName);
    }
    if new_leaf.contains(SEPARATOR) {
        return Err(Error::IllegalContextName {
            name: new_leaf.to_string(),
        });
    }
    let parent = parent(path).unwrap_or("");
    Ok(format!("{parent}{SEPARATOR}{new_leaf}"))
}

/// True when `path` lies in the subtree rooted at `ancestor` (inclusive).
pub fn is_within(path: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() || path == ancestor {
        return true;
    }
    match path.strip_prefix(ancestor) {
        Some(rest) => rest.starts_with(SEPARATOR),
        None => false,
    }
}

/// Number of names on the path; the root has depth 0.
pub fn depth(path: &str) -> usize {
    path.matches(SEPARATOR).count()
}

/// The path one name shorter, or `None` for the root. The parent of a
/// depth-1 context is the root (empty) path.
pub fn parent(path: &str) -> Option<&str> {
    if path.is_empty() {
        None
    } else {
        path.rfind(SEPARATOR).map(|at| &path[..at])
    }
}

/// The final name of the path; empty for the root.
pub fn name(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(at) => &path[at + SEPARATOR.len_utf8()..],
        None => path,
    }
}

/// The names along an internal path, in order; empty for the root.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR).skip(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_prefixes_a_single_dot() {
        assert_eq!(encode("work"), ".work");
        assert_eq!(encode("work.job"), ".work.job");
        assert_eq!(encode(".already"), ".already");
        assert_eq!(encode(""), "");
    }

    #[test]
    fn decode_inverts_encode() {
        for user in ["", "work", "work.job", "a.b.c.d"] {
            assert_eq!(decode(&encode(user)), user);
        }
    }

    #[test]
    fn rename_replaces_only_the_leaf() {
        assert_eq!(rename(".work.job", "play").unwrap(), ".work.play");
        assert_eq!(rename(".work", "home").unwrap(), ".home");
        assert_eq!(
            rename(".a.b.c", "z").unwrap(),
            ".a.b.z",
            "ancestors must be preserved verbatim"
        );
    }

    #[test]
    fn rename_rejects_bad_input() {
        assert!(matches!(rename("", "x"), Err(Error::RenameRoot)));
        assert!(matches!(rename(".work", ""), Err(Error::EmptyContextName)));
        assert!(matches!(
            rename(".work", "a.b"),
            Err(Error::IllegalContextName { .. })
        ));
    }

    #[test]
    fn is_within_respects_dot_boundaries() {
        assert!(is_within(".work.job", ".work"));
        assert!(is_within(".work", ".work"));
        assert!(is_within(".work", ""));
        assert!(!is_within(".work2", ".work"));
        assert!(!is_within(".wo", ".work"));
        assert!(!is_within(".play", ".work"));
    }

    #[test]
    fn depth_counts_names() {
        assert_eq!(depth(""), 0);
        assert_eq!(depth(".work"), 1);
        assert_eq!(depth(".work.job.sub"), 3);
    }

    #[test]
    fn parent_and_name() {
        assert_eq!(parent(""), None);
        assert_eq!(parent(".work"), Some(""));
        assert_eq!(parent(".work.job"), Some(".work"));
        assert_eq!(name(".work.job"), "job");
        assert_eq!(name(""), "");
    }

    #[test]
    fn segments_walk_the_path() {
        assert_eq!(segments(".a.b.c").collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(segments("").count(), 0);
    }
}
