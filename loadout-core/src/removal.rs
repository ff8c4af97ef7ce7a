//! Removal differ: which files and container folders to delete when artifacts
//! leave the desired state.
//!
//! A generator describes its on-disk layout once as a [`RemovalLayout`]:
//!
//! - [`ItemRule`]s derive the per-item path from a slug
//!   (`{prefix}{slug}{suffix}`), mirroring how the create path was derived.
//! - [`ContainerRule`]s name a folder (or index file) and the categories that
//!   put content in it. A container is deleted only when something of those
//!   categories was removed in this call and none of them has items left
//!   installed.
//!
//! [`compute_removals`] is pure and performs no filesystem access.

use std::collections::HashSet;

use crate::types::{ArtifactSets, Category, DeleteEntry, DeleteKind, Slug};

/// Per-item path rule for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRule {
    pub category: Category,
    pub prefix: String,
    pub suffix: String,
    pub kind: DeleteKind,
}

impl ItemRule {
    /// One file per item: `{prefix}{slug}{suffix}`.
    pub fn file(category: Category, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self { category, prefix: prefix.into(), suffix: suffix.into(), kind: DeleteKind::File }
    }

    /// One directory per item: `{prefix}{slug}`.
    pub fn directory(category: Category, prefix: impl Into<String>) -> Self {
        Self {
            category,
            prefix: prefix.into(),
            suffix: String::new(),
            kind: DeleteKind::Directory,
        }
    }

    pub fn path_for(&self, slug: &Slug) -> String {
        format!("{}{}{}", self.prefix, slug, self.suffix)
    }
}

/// A folder or index file whose content comes from one or more categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRule {
    pub path: String,
    pub kind: DeleteKind,
    pub shared_by: Vec<Category>,
}

impl ContainerRule {
    pub fn folder(path: impl Into<String>, shared_by: &[Category]) -> Self {
        Self { path: path.into(), kind: DeleteKind::Directory, shared_by: shared_by.to_vec() }
    }

    /// A generated index file that only lists items of `category`.
    pub fn index_file(path: impl Into<String>, category: Category) -> Self {
        Self { path: path.into(), kind: DeleteKind::File, shared_by: vec![category] }
    }

    /// Whether this container may go, given what was removed and what remains.
    pub fn is_vacated(&self, removed: &ArtifactSets, installed: &ArtifactSets) -> bool {
        let removed_something = self.shared_by.iter().any(|c| !removed.items(*c).is_empty());
        let still_has_content = self.shared_by.iter().any(|c| !installed.items(*c).is_empty());
        removed_something && !still_has_content
    }

    fn entry(&self) -> DeleteEntry {
        DeleteEntry { path: self.path.clone(), kind: self.kind }
    }
}

/// Declarative description of where a generator puts per-item files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalLayout {
    pub items: Vec<ItemRule>,
    pub containers: Vec<ContainerRule>,
}

impl RemovalLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item(mut self, rule: ItemRule) -> Self {
        self.items.push(rule);
        self
    }

    pub fn container(mut self, rule: ContainerRule) -> Self {
        self.containers.push(rule);
        self
    }
}

/// Compute the deletes implied by removing `removed` while `installed` stays.
///
/// - Nothing removed in any category → no deletes, whatever `installed` holds.
/// - Each removed item whose slug is not still installed gets its per-item
///   delete from every matching [`ItemRule`].
/// - Each [`ContainerRule`] is checked once, after the per-item deletes, with
///   [`ContainerRule::is_vacated`].
///
/// Output is de-duplicated by path; callers should compare as a set.
pub fn compute_removals(
    layout: &RemovalLayout,
    removed: &ArtifactSets,
    installed: &ArtifactSets,
) -> Vec<DeleteEntry> {
    if removed.is_empty() {
        return Vec::new();
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    let mut push = |entry: DeleteEntry| {
        if seen.insert(entry.path.clone()) {
            out.push(entry);
        }
    };

    for rule in &layout.items {
        for item in removed.items(rule.category) {
            if installed.contains(rule.category, &item.slug) {
                continue;
            }
            push(DeleteEntry { path: rule.path_for(&item.slug), kind: rule.kind });
        }
    }

    for container in &layout.containers {
        if container.is_vacated(removed, installed) {
            push(container.entry());
        }
    }

    tracing::debug!(
        removed_recipes = removed.recipes.len(),
        removed_standards = removed.standards.len(),
        removed_skills = removed.skills.len(),
        deletes = out.len(),
        "computed removals"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemRef;
    use std::collections::BTreeSet;

    fn recipes_only() -> RemovalLayout {
        RemovalLayout::new()
            .item(ItemRule::file(Category::Recipe, "recipes/", ".md"))
            .container(ContainerRule::folder("recipes/", &[Category::Recipe]))
    }

    fn shared_rules() -> RemovalLayout {
        RemovalLayout::new()
            .item(ItemRule::file(Category::Recipe, "rules/recipe-", ".md"))
            .item(ItemRule::file(Category::Standard, "rules/standard-", ".md"))
            .container(ContainerRule::folder("rules/", &[Category::Recipe, Category::Standard]))
    }

    fn sets(recipes: &[&str], standards: &[&str], skills: &[&str]) -> ArtifactSets {
        let refs = |xs: &[&str]| xs.iter().map(|s| ItemRef::from(*s)).collect::<Vec<_>>();
        ArtifactSets { recipes: refs(recipes), standards: refs(standards), skills: refs(skills) }
    }

    fn as_set(entries: Vec<DeleteEntry>) -> BTreeSet<(String, bool)> {
        entries
            .into_iter()
            .map(|e| (e.path, e.kind == DeleteKind::Directory))
            .collect()
    }

    #[test]
    fn last_item_removed_deletes_file_and_folder() {
        let out = compute_removals(&recipes_only(), &sets(&["a"], &[], &[]), &sets(&[], &[], &[]));
        assert_eq!(
            as_set(out),
            BTreeSet::from([("recipes/a.md".to_string(), false), ("recipes/".to_string(), true)])
        );
    }

    #[test]
    fn siblings_still_installed_keep_folder() {
        let out = compute_removals(&recipes_only(), &sets(&["a"], &[], &[]), &sets(&["b"], &[], &[]));
        assert_eq!(out, vec![DeleteEntry::file("recipes/a.md")]);
    }

    #[test]
    fn nothing_removed_is_a_no_op() {
        let empty = sets(&[], &[], &[]);
        assert!(compute_removals(&recipes_only(), &empty, &empty).is_empty());
        assert!(compute_removals(&recipes_only(), &empty, &sets(&["x"], &[], &[])).is_empty());
    }

    #[test]
    fn shared_folder_blocked_by_installed_sibling_category() {
        let out = compute_removals(&shared_rules(), &sets(&["a"], &[], &[]), &sets(&[], &["s"], &[]));
        assert_eq!(out, vec![DeleteEntry::file("rules/recipe-a.md")]);
    }

    #[test]
    fn shared_folder_deleted_when_every_category_is_empty() {
        let out = compute_removals(&shared_rules(), &sets(&["a"], &["s"], &[]), &sets(&[], &[], &[]));
        assert_eq!(
            as_set(out),
            BTreeSet::from([
                ("rules/recipe-a.md".to_string(), false),
                ("rules/standard-s.md".to_string(), false),
                ("rules/".to_string(), true),
            ])
        );
    }

    #[test]
    fn slug_still_installed_is_not_deleted() {
        let out = compute_removals(&recipes_only(), &sets(&["a", "b"], &[], &[]), &sets(&["a"], &[], &[]));
        assert_eq!(out, vec![DeleteEntry::file("recipes/b.md")]);
    }

    #[test]
    fn directory_items_and_index_files() {
        let layout = RemovalLayout::new()
            .item(ItemRule::directory(Category::Skill, ".agent/skills/"))
            .container(ContainerRule::index_file(".agent/skills-index.md", Category::Skill));
        let out = compute_removals(&layout, &sets(&[], &[], &["lint"]), &sets(&[], &[], &[]));
        assert_eq!(
            as_set(out),
            BTreeSet::from([
                (".agent/skills/lint".to_string(), true),
                (".agent/skills-index.md".to_string(), false),
            ])
        );
    }

    #[test]
    fn duplicate_paths_are_emitted_once() {
        let layout = recipes_only().container(ContainerRule::folder("recipes/", &[Category::Recipe]));
        let out = compute_removals(&layout, &sets(&["a", "a"], &[], &[]), &sets(&[], &[], &[]));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn same_input_same_output() {
        let removed = sets(&["a", "b"], &["s"], &[]);
        let installed = sets(&[], &["t"], &[]);
        let first = as_set(compute_removals(&shared_rules(), &removed, &installed));
        let second = as_set(compute_removals(&shared_rules(), &removed, &installed));
        assert_eq!(first, second);
    }
}
