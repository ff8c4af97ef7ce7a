//! Domain types shared by every generator, the aggregator, and the applier.
//!
//! Paths inside a [`ChangeSet`] are repository-relative strings with `/`
//! separators; they are opaque to the core and never touch the filesystem.
//! The serde shape uses camelCase keys so a change-set can be handed to any
//! external file-writing collaborator as JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Stable identifier of an artifact; file paths are derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(pub String);

impl Slug {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Slug {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Slug {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Change-set model
// ---------------------------------------------------------------------------

/// A named block inside a shared file. `key` is unique within one file only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedSection {
    pub key: String,
    /// Empty content clears the block without deleting the file.
    pub content: String,
}

impl NamedSection {
    pub fn new(key: impl Into<String>, content: impl Into<String>) -> Self {
        Self { key: key.into(), content: content.into() }
    }

    /// A section that retires the block identified by `key`.
    pub fn cleared(key: impl Into<String>) -> Self {
        Self::new(key, String::new())
    }
}

/// One create-or-update instruction.
///
/// When `sections` is present the write is a patch against a shared file and
/// `content` is ignored by the applier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileWrite {
    pub path: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<NamedSection>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_base64: bool,
}

impl FileWrite {
    /// Whole-file write owned by a single generator.
    pub fn full(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self { path: path.into(), content: content.into(), ..Self::default() }
    }

    /// Patch against a shared file.
    pub fn sections(path: impl Into<String>, sections: Vec<NamedSection>) -> Self {
        Self { path: path.into(), sections: Some(sections), ..Self::default() }
    }

    /// Binary payload carried as base64 text.
    pub fn base64(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self { path: path.into(), content: content.into(), is_base64: true, ..Self::default() }
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Kind of a delete instruction. Absent in JSON means [`DeleteKind::File`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteKind {
    #[default]
    File,
    /// Remove the path and everything under it.
    Directory,
}

/// One delete instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeleteEntry {
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: DeleteKind,
}

impl DeleteEntry {
    pub fn file(path: impl Into<String>) -> Self {
        Self { path: path.into(), kind: DeleteKind::File }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self { path: path.into(), kind: DeleteKind::Directory }
    }
}

/// The create/update/delete instruction set of one deployment operation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    #[serde(default)]
    pub create_or_update: Vec<FileWrite>,
    #[serde(default)]
    pub delete: Vec<DeleteEntry>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.create_or_update.is_empty() && self.delete.is_empty()
    }

    pub fn write(&mut self, write: FileWrite) -> &mut Self {
        self.create_or_update.push(write);
        self
    }

    pub fn remove(&mut self, entry: DeleteEntry) -> &mut Self {
        self.delete.push(entry);
        self
    }

    /// The write targeting `path`, if any (last one wins, as in a merge).
    pub fn write_at(&self, path: &str) -> Option<&FileWrite> {
        self.create_or_update.iter().rev().find(|w| w.path == path)
    }
}

// ---------------------------------------------------------------------------
// Deployment target
// ---------------------------------------------------------------------------

/// A deployment scope: the repository root (`/`) or a sub-directory of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target {
    pub path: String,
}

impl Target {
    pub fn root() -> Self {
        Self { path: "/".to_string() }
    }

    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn is_root(&self) -> bool {
        self.path == "/"
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.path.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// Artifact category. Each category owns its own file family per agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Recipe,
    Standard,
    Skill,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[Category::Recipe, Category::Standard, Category::Skill]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Recipe => write!(f, "recipe"),
            Category::Standard => write!(f, "standard"),
            Category::Skill => write!(f, "skill"),
        }
    }
}

/// A step-by-step procedure, deployed as a command/prompt file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub slug: Slug,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub content: String,
}

/// A coding standard: a summary plus a list of rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standard {
    pub slug: Slug,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub rules: Vec<String>,
}

/// A file attached to a skill, relative to the skill folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillFile {
    pub path: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_base64: bool,
}

/// An agent skill: a `SKILL.md` prompt plus optional attachments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub slug: Slug,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<SkillFile>,
}

/// Full artifact content, as consumed by the generators.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArtifactBundle {
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    #[serde(default)]
    pub standards: Vec<Standard>,
    #[serde(default)]
    pub skills: Vec<Skill>,
}

impl ArtifactBundle {
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty() && self.standards.is_empty() && self.skills.is_empty()
    }

    /// Slug-level view used by the removal differ and the state store.
    pub fn artifact_sets(&self) -> ArtifactSets {
        ArtifactSets {
            recipes: self.recipes.iter().map(|r| ItemRef::new(r.slug.clone(), &r.name)).collect(),
            standards: self.standards.iter().map(|s| ItemRef::new(s.slug.clone(), &s.name)).collect(),
            skills: self.skills.iter().map(|s| ItemRef::new(s.slug.clone(), &s.name)).collect(),
        }
    }
}

/// Minimal identity of a deployed artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemRef {
    pub slug: Slug,
    #[serde(default)]
    pub name: String,
}

impl ItemRef {
    pub fn new(slug: impl Into<Slug>, name: impl Into<String>) -> Self {
        Self { slug: slug.into(), name: name.into() }
    }
}

impl From<&str> for ItemRef {
    fn from(slug: &str) -> Self {
        Self::new(slug, slug)
    }
}

/// Per-category item lists, as passed to the removal differ.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArtifactSets {
    #[serde(default)]
    pub recipes: Vec<ItemRef>,
    #[serde(default)]
    pub standards: Vec<ItemRef>,
    #[serde(default)]
    pub skills: Vec<ItemRef>,
}

impl ArtifactSets {
    pub fn items(&self, category: Category) -> &[ItemRef] {
        match category {
            Category::Recipe => &self.recipes,
            Category::Standard => &self.standards,
            Category::Skill => &self.skills,
        }
    }

    pub fn items_mut(&mut self, category: Category) -> &mut Vec<ItemRef> {
        match category {
            Category::Recipe => &mut self.recipes,
            Category::Standard => &mut self.standards,
            Category::Skill => &mut self.skills,
        }
    }

    pub fn is_empty(&self) -> bool {
        Category::all().iter().all(|c| self.items(*c).is_empty())
    }

    pub fn contains(&self, category: Category, slug: &Slug) -> bool {
        self.items(category).iter().any(|i| &i.slug == slug)
    }

    /// Items of `self` whose slug is absent from `other`, per category.
    pub fn difference(&self, other: &ArtifactSets) -> ArtifactSets {
        let mut out = ArtifactSets::default();
        for category in Category::all() {
            *out.items_mut(*category) = self
                .items(*category)
                .iter()
                .filter(|i| !other.contains(*category, &i.slug))
                .cloned()
                .collect();
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// All supported AI coding agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Loadout,
    Claude,
    Cursor,
    Copilot,
    Continue,
    Junie,
    AgentsMd,
}

impl AgentKind {
    /// All agent variants in a stable order.
    pub fn all() -> &'static [AgentKind] {
        &[
            AgentKind::Loadout,
            AgentKind::Claude,
            AgentKind::Cursor,
            AgentKind::Copilot,
            AgentKind::Continue,
            AgentKind::Junie,
            AgentKind::AgentsMd,
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            AgentKind::Loadout => "loadout",
            AgentKind::Claude => "claude",
            AgentKind::Cursor => "cursor",
            AgentKind::Copilot => "copilot",
            AgentKind::Continue => "continue",
            AgentKind::Junie => "junie",
            AgentKind::AgentsMd => "agents_md",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase().replace('-', "_");
        AgentKind::all()
            .iter()
            .copied()
            .find(|a| a.id() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = AgentKind::all().iter().map(|a| a.id()).collect();
                format!("unknown agent '{s}'; expected one of: {}", known.join(", "))
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
