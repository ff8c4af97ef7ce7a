//! Target-scoped path rewriting.
//!
//! A target is either the repository root (`/`) or a sub-directory such as
//! `/packages/api`. Generators produce root-relative logical paths and call
//! [`prefixed_path`] exactly once per path; applying it twice double-prefixes.

use crate::types::{DeleteEntry, FileWrite, Target};

/// Translate a root-relative logical path into the path written for `target`.
///
/// `/` leaves the path untouched. Any other target has one leading `/`
/// stripped and exactly one trailing `/` before being prepended.
pub fn prefixed_path(logical: &str, target: &Target) -> String {
    if target.is_root() {
        return logical.to_string();
    }
    let trimmed = target.path.strip_prefix('/').unwrap_or(&target.path);
    let trimmed = trimmed.trim_end_matches('/');
    if trimmed.is_empty() {
        return logical.to_string();
    }
    format!("{trimmed}/{logical}")
}

impl Target {
    /// Method form of [`prefixed_path`].
    pub fn prefix(&self, logical: &str) -> String {
        prefixed_path(logical, self)
    }

    pub fn prefix_write(&self, mut write: FileWrite) -> FileWrite {
        write.path = self.prefix(&write.path);
        write
    }

    pub fn prefix_delete(&self, mut entry: DeleteEntry) -> DeleteEntry {
        entry.path = self.prefix(&entry.path);
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/", "CLAUDE.md", "CLAUDE.md")]
    #[case("/packages/api", "CLAUDE.md", "packages/api/CLAUDE.md")]
    #[case("/packages/api/", ".cursor/rules/x.mdc", "packages/api/.cursor/rules/x.mdc")]
    #[case("packages/web", "AGENTS.md", "packages/web/AGENTS.md")]
    #[case("/apps//", "a.md", "apps/a.md")]
    fn prefixes_paths(#[case] target: &str, #[case] logical: &str, #[case] expected: &str) {
        assert_eq!(prefixed_path(logical, &Target::new(target)), expected);
    }

    #[test]
    fn degenerate_target_behaves_like_root() {
        assert_eq!(prefixed_path("a.md", &Target::new("")), "a.md");
        assert_eq!(prefixed_path("a.md", &Target::new("//")), "a.md");
    }

    #[test]
    fn prefixing_is_not_idempotent() {
        let t = Target::new("/pkg");
        let once = t.prefix("a.md");
        assert_eq!(t.prefix(&once), "pkg/pkg/a.md");
    }

    #[test]
    fn prefixes_delete_entries_and_writes() {
        let t = Target::new("/pkg");
        assert_eq!(t.prefix_delete(DeleteEntry::directory("rules/")).path, "pkg/rules/");
        assert_eq!(t.prefix_write(FileWrite::full("a.md", "x")).path, "pkg/a.md");
    }
}
