//! Install / remove pipeline shared by every CLI command.
//!
//! One run:
//!
//! 1. Load `loadout.yaml` and the previous [`DeploymentState`].
//! 2. Render a removal change-set for whatever left the desired state
//!    (artifacts, agents or targets), and a deploy change-set for the rest.
//! 3. Merge them, removal first, so deploy writes win.
//! 4. Apply to the checkout and record the new state.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;

use loadout_core::{
    manifest::{self, Manifest},
    merge, AgentKind, ArtifactBundle, ArtifactSets, Category, ChangeSet, DeleteEntry,
    DeleteKind, Slug, Target,
};
use loadout_renderer::Renderer;

use crate::error::SyncError;
use crate::state::{self, DeploymentState};
use crate::writer::{apply_change_set, WriteResult};

/// Knobs shared by install and remove.
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    pub dry_run: bool,
    /// Directory whose `.tera` files override the embedded templates.
    pub template_dir: Option<PathBuf>,
}

/// What a pipeline run did.
#[derive(Debug)]
pub struct InstallReport {
    pub repo_name: String,
    pub change_set: ChangeSet,
    pub results: Vec<WriteResult>,
    /// Artifacts that left the checkout in this run.
    pub removed: ArtifactSets,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Run every agent for every target and merge (targets outer, agents inner).
pub fn aggregate_deployments(
    renderer: &Renderer,
    bundle: &ArtifactBundle,
    targets: &[Target],
    agents: &[AgentKind],
) -> Result<ChangeSet, SyncError> {
    let mut change_sets = Vec::with_capacity(targets.len() * agents.len());
    for target in targets {
        for agent in agents {
            change_sets.push(renderer.deploy_artifacts(*agent, bundle, target)?);
        }
    }
    let merged = merge(change_sets);
    tracing::info!(
        targets = targets.len(),
        agents = agents.len(),
        writes = merged.create_or_update.len(),
        "aggregated deployments"
    );
    Ok(merged)
}

/// Removal counterpart of [`aggregate_deployments`].
pub fn aggregate_removals(
    renderer: &Renderer,
    removed: &ArtifactSets,
    installed: &ArtifactSets,
    targets: &[Target],
    agents: &[AgentKind],
) -> ChangeSet {
    let mut change_sets = Vec::with_capacity(targets.len() * agents.len());
    for target in targets {
        for agent in agents {
            change_sets.push(renderer.removal(*agent, removed, installed, target));
        }
    }
    let merged = merge(change_sets);
    tracing::info!(
        targets = targets.len(),
        agents = agents.len(),
        deletes = merged.delete.len(),
        "aggregated removals"
    );
    merged
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

fn union(a: &ArtifactSets, b: &ArtifactSets) -> ArtifactSets {
    let mut out = a.clone();
    for category in Category::all() {
        for item in b.items(*category) {
            if !out.contains(*category, &item.slug) {
                out.items_mut(*category).push(item.clone());
            }
        }
    }
    out
}

/// Removal change-set for the step from `previous` to `manifest`.
///
/// Agent/target pairs that are still configured lose only the removed
/// artifacts; pairs that left the manifest lose everything they had.
fn plan_removals(
    renderer: &Renderer,
    manifest: &Manifest,
    previous: &DeploymentState,
    removed: &ArtifactSets,
) -> ChangeSet {
    let installed = manifest.artifacts.artifact_sets();
    let kept_agents: Vec<AgentKind> =
        previous.agents.iter().copied().filter(|a| manifest.agents.contains(a)).collect();
    let dropped_agents: Vec<AgentKind> =
        previous.agents.iter().copied().filter(|a| !manifest.agents.contains(a)).collect();
    let kept_targets: Vec<Target> =
        previous.targets.iter().filter(|t| manifest.targets.contains(t)).cloned().collect();
    let dropped_targets: Vec<Target> =
        previous.targets.iter().filter(|t| !manifest.targets.contains(t)).cloned().collect();

    let everything = union(&previous.installed, removed);
    let nothing = ArtifactSets::default();
    merge([
        aggregate_removals(renderer, removed, &installed, &kept_targets, &kept_agents),
        aggregate_removals(renderer, &everything, &nothing, &kept_targets, &dropped_agents),
        aggregate_removals(renderer, &everything, &nothing, &dropped_targets, &previous.agents),
    ])
}

/// Drop deletes that would remove a file the same run writes.
fn drop_deletes_under_writes(mut change_set: ChangeSet) -> ChangeSet {
    let written: HashSet<&str> = change_set.create_or_update.iter().map(|w| w.path.as_str()).collect();
    let before = change_set.delete.len();
    let keep: Vec<DeleteEntry> = change_set
        .delete
        .iter()
        .filter(|d| match d.kind {
            DeleteKind::File => !written.contains(d.path.as_str()),
            DeleteKind::Directory => {
                let dir = format!("{}/", d.path.trim_end_matches('/'));
                !written.iter().any(|w| w.starts_with(&dir))
            }
        })
        .cloned()
        .collect();
    if keep.len() != before {
        tracing::debug!(dropped = before - keep.len(), "kept deletes out of freshly written paths");
    }
    change_set.delete = keep;
    change_set
}

/// The full change-set an install of `manifest` would apply.
pub fn plan(
    renderer: &Renderer,
    manifest: &Manifest,
    previous: &DeploymentState,
    extra_removed: &ArtifactSets,
) -> Result<(ChangeSet, ArtifactSets), SyncError> {
    let current = manifest.artifacts.artifact_sets();
    let removed = union(&previous.installed.difference(&current), &extra_removed.difference(&current));

    let mut change_set = plan_removals(renderer, manifest, previous, &removed);
    change_set.absorb(aggregate_deployments(
        renderer,
        &manifest.artifacts,
        &manifest.targets,
        &manifest.agents,
    )?);
    Ok((drop_deletes_under_writes(change_set), removed))
}

// ---------------------------------------------------------------------------
// Install / remove
// ---------------------------------------------------------------------------

fn run(
    home: &Path,
    root: &Path,
    manifest: &Manifest,
    extra_removed: &ArtifactSets,
    opts: &InstallOptions,
) -> Result<InstallReport, SyncError> {
    let started_at = Utc::now();
    let renderer = Renderer::with_template_dir(opts.template_dir.as_deref())?;
    let previous = state::load_at(home, root)?.unwrap_or_else(DeploymentState::empty);

    let (change_set, removed) = plan(&renderer, manifest, &previous, extra_removed)?;
    let report = apply_change_set(root, &change_set, opts.dry_run)?;

    // Dry runs leave the recorded state alone.
    if !opts.dry_run {
        let next = DeploymentState {
            deployed_at: started_at,
            agents: manifest.agents.clone(),
            targets: manifest.targets.clone(),
            installed: manifest.artifacts.artifact_sets(),
            files: report.digests,
        };
        state::save_at(home, root, &next)?;
    }

    tracing::info!(
        repo = %manifest.name,
        changed = report.results.iter().filter(|r| r.is_change()).count(),
        dry_run = opts.dry_run,
        "install finished"
    );
    Ok(InstallReport {
        repo_name: manifest.name.clone(),
        change_set,
        results: report.results,
        removed,
    })
}

/// Deploy the manifest at `root`, removing whatever left it since last time.
pub fn install_at(home: &Path, root: &Path, opts: &InstallOptions) -> Result<InstallReport, SyncError> {
    let manifest = manifest::load_at(root)?;
    run(home, root, &manifest, &ArtifactSets::default(), opts)
}

/// Drop `slugs` from the manifest at `root` and from the checkout.
///
/// A slug matches in every category. Unknown slugs are ignored.
pub fn remove_at(
    home: &Path,
    root: &Path,
    slugs: &[Slug],
    opts: &InstallOptions,
) -> Result<InstallReport, SyncError> {
    let mut manifest = manifest::load_at(root)?;
    let dropped = manifest.remove_artifacts(slugs);
    if dropped.is_empty() {
        tracing::warn!(?slugs, "no matching artifacts in manifest");
    }
    if !opts.dry_run {
        manifest::save_at(root, &manifest)?;
    }
    run(home, root, &manifest, &dropped, opts)
}

/// The change-set `install_at` would apply, without touching anything.
pub fn render_at(home: &Path, root: &Path, template_dir: Option<&Path>) -> Result<ChangeSet, SyncError> {
    let manifest = manifest::load_at(root)?;
    let renderer = Renderer::with_template_dir(template_dir)?;
    let previous = state::load_at(home, root)?.unwrap_or_else(DeploymentState::empty);
    let (change_set, _) = plan(&renderer, &manifest, &previous, &ArtifactSets::default())?;
    Ok(change_set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadout_core::{FileWrite, ItemRef, Recipe};

    fn recipe(slug: &str) -> Recipe {
        Recipe {
            slug: Slug::from(slug),
            name: slug.to_string(),
            summary: None,
            content: format!("steps for {slug}"),
        }
    }

    fn manifest(agents: Vec<AgentKind>, recipes: &[&str]) -> Manifest {
        let mut m = Manifest::new("demo", agents);
        m.artifacts.recipes = recipes.iter().map(|s| recipe(s)).collect();
        m
    }

    fn previous(agents: Vec<AgentKind>, recipes: &[&str]) -> DeploymentState {
        let mut state = DeploymentState::empty();
        state.agents = agents;
        state.targets = vec![Target::root()];
        state.installed.recipes = recipes.iter().map(|s| ItemRef::from(*s)).collect();
        state
    }

    #[test]
    fn aggregate_deployments_covers_every_target() {
        let renderer = Renderer::new().unwrap();
        let m = manifest(vec![AgentKind::Claude], &["a"]);
        let cs = aggregate_deployments(
            &renderer,
            &m.artifacts,
            &[Target::root(), Target::new("/svc")],
            &m.agents,
        )
        .unwrap();
        let paths: Vec<&str> = cs.create_or_update.iter().map(|w| w.path.as_str()).collect();
        assert_eq!(paths, vec![".claude/commands/loadout/a.md", "svc/.claude/commands/loadout/a.md"]);
    }

    #[test]
    fn plan_removes_artifacts_missing_from_manifest() {
        let renderer = Renderer::new().unwrap();
        let m = manifest(vec![AgentKind::Claude], &["a"]);
        let prev = previous(vec![AgentKind::Claude], &["a", "b"]);
        let (cs, removed) = plan(&renderer, &m, &prev, &ArtifactSets::default()).unwrap();
        assert_eq!(removed.recipes, vec![ItemRef::from("b")]);
        assert_eq!(cs.delete, vec![DeleteEntry::file(".claude/commands/loadout/b.md")]);
        assert!(cs.write_at(".claude/commands/loadout/a.md").is_some());
    }

    #[test]
    fn plan_cleans_up_after_dropped_agent() {
        let renderer = Renderer::new().unwrap();
        let m = manifest(vec![AgentKind::Claude], &["a"]);
        let prev = previous(vec![AgentKind::Claude, AgentKind::Cursor], &["a"]);
        let (cs, _) = plan(&renderer, &m, &prev, &ArtifactSets::default()).unwrap();
        assert!(cs.delete.contains(&DeleteEntry::file(".cursor/commands/loadout/a.md")));
        assert!(cs.delete.contains(&DeleteEntry::directory(".cursor/commands/loadout/")));
        assert!(!cs.delete.iter().any(|d| d.path.starts_with(".claude")));
    }

    #[test]
    fn deploy_writes_win_over_removal_section_clears() {
        let renderer = Renderer::new().unwrap();
        let m = manifest(vec![AgentKind::AgentsMd], &["a"]);
        let prev = previous(vec![AgentKind::AgentsMd], &["b"]);
        let (cs, _) = plan(&renderer, &m, &prev, &ArtifactSets::default()).unwrap();
        let write = cs.write_at("AGENTS.md").expect("AGENTS.md");
        let sections = write.sections.as_ref().unwrap();
        assert!(sections[0].content.contains("**a**"));
    }

    #[test]
    fn deletes_under_fresh_writes_are_dropped() {
        let cs = ChangeSet {
            create_or_update: vec![FileWrite::full("dir/a.md", "x")],
            delete: vec![DeleteEntry::directory("dir/"), DeleteEntry::file("dir/a.md"), DeleteEntry::file("b.md")],
        };
        assert_eq!(drop_deletes_under_writes(cs).delete, vec![DeleteEntry::file("b.md")]);
    }
}
