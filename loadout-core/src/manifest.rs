//! Per-repository `loadout.yaml` manifest.
//!
//! # Layout
//!
//! ```text
//! <repo>/
//!   loadout.yaml     (agents, targets, and artifact content)
//! ```
//!
//! ```yaml
//! name: my-service
//! agents: [claude, cursor]
//! targets: ["/", "/packages/api"]
//! recipes:
//!   - slug: add-endpoint
//!     name: Add an endpoint
//!     content: |
//!       1. ...
//! standards: []
//! skills: []
//! ```
//!
//! Every function takes the repository root explicitly.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};
use crate::types::{AgentKind, ArtifactBundle, ArtifactSets, Category, Slug, Target};

/// File name of the manifest at the repository root.
pub const MANIFEST_FILE: &str = "loadout.yaml";

/// Desired deployment state of one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    #[serde(default)]
    pub agents: Vec<AgentKind>,
    #[serde(default = "default_targets")]
    pub targets: Vec<Target>,
    #[serde(flatten)]
    pub artifacts: ArtifactBundle,
}

fn default_targets() -> Vec<Target> {
    vec![Target::root()]
}

impl Manifest {
    pub fn new(name: impl Into<String>, agents: Vec<AgentKind>) -> Self {
        Self {
            name: name.into(),
            agents,
            targets: default_targets(),
            artifacts: ArtifactBundle::default(),
        }
    }

    /// Reject slugs that cannot safely become file names, and duplicates.
    pub fn validate(&self) -> Result<(), CoreError> {
        let sets = self.artifacts.artifact_sets();
        for category in Category::all() {
            let mut seen = HashSet::new();
            for item in sets.items(*category) {
                if !is_valid_slug(item.slug.as_str()) {
                    return Err(CoreError::InvalidSlug {
                        category: category.to_string(),
                        slug: item.slug.0.clone(),
                    });
                }
                if !seen.insert(item.slug.clone()) {
                    return Err(CoreError::DuplicateSlug {
                        category: category.to_string(),
                        slug: item.slug.0.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Drop every artifact whose slug is listed, in any category.
    ///
    /// Returns what was actually dropped.
    pub fn remove_artifacts(&mut self, slugs: &[Slug]) -> ArtifactSets {
        let before = self.artifacts.artifact_sets();
        let wanted = |slug: &Slug| slugs.contains(slug);
        self.artifacts.recipes.retain(|r| !wanted(&r.slug));
        self.artifacts.standards.retain(|s| !wanted(&s.slug));
        self.artifacts.skills.retain(|s| !wanted(&s.slug));
        before.difference(&self.artifacts.artifact_sets())
    }
}

/// `^[a-z0-9][a-z0-9-]*[a-z0-9]$` or a single `[a-z0-9]`.
pub fn is_valid_slug(slug: &str) -> bool {
    slug_re().is_match(slug)
}

fn slug_re() -> &'static Regex {
    static SLUG_RE: OnceLock<Regex> = OnceLock::new();
    SLUG_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<root>/loadout.yaml`.
pub fn manifest_path_at(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE)
}

/// Repository name derived from the root directory name.
pub fn repo_name(root: &Path) -> String {
    root.file_name()
        .unwrap_or(root.as_os_str())
        .to_string_lossy()
        .into_owned()
}

// ---------------------------------------------------------------------------
// Load / save / init
// ---------------------------------------------------------------------------

/// Load and validate `<root>/loadout.yaml`.
///
/// Returns `CoreError::ManifestNotFound` if absent,
/// `CoreError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(root: &Path) -> Result<Manifest, CoreError> {
    let path = manifest_path_at(root);
    if !path.exists() {
        return Err(CoreError::ManifestNotFound { path });
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    let manifest: Manifest =
        serde_yaml::from_str(&contents).map_err(|e| CoreError::Parse { path, source: e })?;
    manifest.validate()?;
    Ok(manifest)
}

/// Atomically save the manifest: serialize → `.yaml.tmp` sibling → `rename`.
pub fn save_at(root: &Path, manifest: &Manifest) -> Result<(), CoreError> {
    let path = manifest_path_at(root);
    let tmp = path.with_extension("yaml.tmp");
    let yaml = serde_yaml::to_string(manifest)?;
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(&path, e));
    }
    Ok(())
}

/// Scaffold `<root>/loadout.yaml` for `agents`.
///
/// Idempotent: if the manifest already exists, loads and returns it unchanged.
pub fn init_at(root: &Path, agents: Vec<AgentKind>) -> Result<Manifest, CoreError> {
    if manifest_path_at(root).exists() {
        return load_at(root);
    }
    std::fs::create_dir_all(root).map_err(|e| io_err(root, e))?;
    let manifest = Manifest::new(repo_name(root), agents);
    save_at(root, &manifest)?;
    tracing::info!(path = %manifest_path_at(root).display(), "scaffolded manifest");
    Ok(manifest)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
