//! Loadout core library: change-set model and the pure merge engine.
//!
//! - [`types`]: change-sets, artifacts, targets, agents
//! - [`target`]: target-scoped path prefixing
//! - [`sections`]: idempotent marker-delimited sections in shared files
//! - [`merge`]: last-write-wins aggregation of many change-sets
//! - [`removal`]: safe per-item and container deletes
//! - [`manifest`]: `loadout.yaml` load / save / init
//! - [`error`]: [`CoreError`]

pub mod error;
pub mod manifest;
pub mod merge;
pub mod removal;
pub mod sections;
pub mod target;
pub mod types;

pub use error::CoreError;
pub use merge::merge;
pub use removal::{compute_removals, ContainerRule, ItemRule, RemovalLayout};
pub use sections::{merge_sections, replace_section};
pub use target::prefixed_path;
pub use types::{
    AgentKind, ArtifactBundle, ArtifactSets, Category, ChangeSet, DeleteEntry, DeleteKind,
    FileWrite, ItemRef, NamedSection, Recipe, Skill, SkillFile, Slug, Standard, Target,
};
