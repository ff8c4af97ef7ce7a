//! Tera rendering engine and the per-agent [`Renderer`].
//!
//! A [`Renderer`] turns artifacts into a [`ChangeSet`] for one agent and one
//! target. It never reads the checkout: shared files are described as section
//! patches and applied later.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tera::{Tera, Value};

use loadout_core::{
    compute_removals, AgentKind, ArtifactBundle, ArtifactSets, Category, ChangeSet, FileWrite,
    NamedSection, Recipe, Skill, Standard, Target,
};

use crate::context::{Listed, TemplateContext};
use crate::error::{io_err, RenderError};
use crate::layout::{layout, AgentLayout, IndexFile, Placement};

/// Template used for every agent's `SKILL.md`.
pub const SKILL_TEMPLATE: &str = "shared/skill.md.tera";

// ---------------------------------------------------------------------------
// Embedded templates, baked in with include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[
    ("shared/_standard_body.tera", include_str!("templates/shared/_standard_body.tera")),
    ("shared/skill.md.tera", include_str!("templates/shared/skill.md.tera")),
    ("shared/recipes_section.md.tera", include_str!("templates/shared/recipes_section.md.tera")),
    (
        "shared/standards_section.md.tera",
        include_str!("templates/shared/standards_section.md.tera"),
    ),
    ("loadout/command.md.tera", include_str!("templates/loadout/command.md.tera")),
    ("loadout/standard.md.tera", include_str!("templates/loadout/standard.md.tera")),
    (
        "loadout/commands_index.md.tera",
        include_str!("templates/loadout/commands_index.md.tera"),
    ),
    (
        "loadout/standards_index.md.tera",
        include_str!("templates/loadout/standards_index.md.tera"),
    ),
    ("claude/command.md.tera", include_str!("templates/claude/command.md.tera")),
    ("claude/rule.md.tera", include_str!("templates/claude/rule.md.tera")),
    ("cursor/command.md.tera", include_str!("templates/cursor/command.md.tera")),
    ("cursor/rule.mdc.tera", include_str!("templates/cursor/rule.mdc.tera")),
    ("copilot/prompt.md.tera", include_str!("templates/copilot/prompt.md.tera")),
    ("copilot/instructions.md.tera", include_str!("templates/copilot/instructions.md.tera")),
    ("continue/prompt.md.tera", include_str!("templates/continue/prompt.md.tera")),
    ("continue/rule.md.tera", include_str!("templates/continue/rule.md.tera")),
];

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}

fn collect_template_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), RenderError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let meta = entry.metadata().map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            collect_template_files(&path, out)?;
        } else if meta.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn load_user_templates(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut files = Vec::new();
    collect_template_files(dir, &mut files)?;
    let mut templates = Vec::new();
    for path in files {
        if path.extension().and_then(|s| s.to_str()) != Some("tera") {
            continue;
        }
        let rel = path.strip_prefix(dir).unwrap_or(path.as_path());
        let name = normalize_template_name(rel);
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        tracing::debug!(template = %name, "user template override");
        templates.push((name, contents));
    }
    Ok(templates)
}

/// `yaml_quote` filter: single-quoted YAML scalar on one line.
fn yaml_quote(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    let flat = raw.replace("\r\n", " ").replace(['\n', '\r'], " ");
    Ok(Value::String(format!("'{}'", flat.replace('\'', "''"))))
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut templates: HashMap<String, String> = HashMap::new();
    for (name, content) in TPLS {
        templates.insert(normalize_template_name(Path::new(name)), (*content).to_string());
    }
    if let Some(dir) = user_template_dir {
        for (name, content) in load_user_templates(dir)? {
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    tera.register_filter("yaml_quote", yaml_quote);
    let items: Vec<(String, String)> = templates.into_iter().collect();
    tera.add_raw_templates(items)?;
    Ok(tera)
}

/// LF line endings and exactly one trailing newline.
fn normalize_output(rendered: &str) -> String {
    let lf = rendered.replace("\r\n", "\n").replace('\r', "\n");
    format!("{}\n", lf.trim_end())
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera-based engine for rendering templates with optional user overrides.
///
/// `user_template_dir` may contain `.tera` files that override embedded
/// defaults by relative path, e.g. `claude/command.md.tera`.
/// Template names are normalised to lowercase and relative paths.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Construct a new [`TemplateEngine`], loading embedded templates plus any
    /// overrides found in `user_template_dir`.
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, RenderError> {
        let tera = build_tera(user_template_dir)?;
        Ok(TemplateEngine { tera })
    }

    /// Render a whole file: LF endings, one trailing newline.
    pub fn render(&self, name: &str, ctx: &TemplateContext) -> Result<String, RenderError> {
        let rendered = self.tera.render(name, &ctx.to_tera_context()?)?;
        Ok(normalize_output(&rendered))
    }

    /// Render a section body: LF endings, no surrounding blank lines.
    pub fn render_section(&self, name: &str, ctx: &TemplateContext) -> Result<String, RenderError> {
        Ok(self.render(name, ctx)?.trim().to_string())
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }
}

// ---------------------------------------------------------------------------
// Output accumulator
// ---------------------------------------------------------------------------

/// Writes for one agent run. Sections aimed at the same shared file are
/// folded into a single patch so they survive a path-keyed merge.
#[derive(Default)]
struct Output {
    change_set: ChangeSet,
    sections: Vec<(&'static str, NamedSection)>,
}

impl Output {
    fn section(&mut self, file: &'static str, section: NamedSection) {
        self.sections.push((file, section));
    }

    fn finish(self, target: &Target) -> ChangeSet {
        let Output { mut change_set, sections } = self;

        let mut files: Vec<&'static str> = Vec::new();
        for (file, _) in &sections {
            if !files.contains(file) {
                files.push(*file);
            }
        }
        for file in files {
            let patch: Vec<NamedSection> = sections
                .iter()
                .filter(|(f, _)| *f == file)
                .map(|(_, s)| s.clone())
                .collect();
            change_set.write(FileWrite::sections(file, patch));
        }

        ChangeSet {
            create_or_update: change_set
                .create_or_update
                .into_iter()
                .map(|w| target.prefix_write(w))
                .collect(),
            delete: change_set.delete.into_iter().map(|d| target.prefix_delete(d)).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Per-agent generator producing change-sets.
///
/// Create once with [`Renderer::new`] and reuse; every method is pure with
/// respect to the checkout.
pub struct Renderer {
    engine: TemplateEngine,
}

impl Renderer {
    /// Construct a new [`Renderer`] with embedded templates.
    pub fn new() -> Result<Self, RenderError> {
        Self::with_template_dir(None)
    }

    /// Construct a [`Renderer`] whose templates may be overridden from `dir`.
    pub fn with_template_dir(dir: Option<&Path>) -> Result<Self, RenderError> {
        Ok(Renderer { engine: TemplateEngine::new(dir)? })
    }

    pub fn engine(&self) -> &TemplateEngine {
        &self.engine
    }

    pub fn deploy_recipes(
        &self,
        agent: AgentKind,
        recipes: &[Recipe],
        target: &Target,
    ) -> Result<ChangeSet, RenderError> {
        let l = layout(agent);
        let mut out = Output::default();
        self.render_listed(l.recipes, l.recipes_index, recipes, &mut out)?;
        Ok(out.finish(target))
    }

    pub fn deploy_standards(
        &self,
        agent: AgentKind,
        standards: &[Standard],
        target: &Target,
    ) -> Result<ChangeSet, RenderError> {
        let l = layout(agent);
        let mut out = Output::default();
        self.render_listed(l.standards, l.standards_index, standards, &mut out)?;
        Ok(out.finish(target))
    }

    pub fn deploy_skills(
        &self,
        agent: AgentKind,
        skills: &[Skill],
        target: &Target,
    ) -> Result<ChangeSet, RenderError> {
        let mut out = Output::default();
        self.render_skills(layout(agent), skills, &mut out)?;
        Ok(out.finish(target))
    }

    /// Everything `agent` writes for `bundle` under `target`.
    ///
    /// Shared-file agents always carry both sections, empty ones included, so
    /// a category that dropped to zero items is cleared.
    pub fn deploy_artifacts(
        &self,
        agent: AgentKind,
        bundle: &ArtifactBundle,
        target: &Target,
    ) -> Result<ChangeSet, RenderError> {
        let l = layout(agent);
        let mut out = Output::default();
        self.render_listed(l.recipes, l.recipes_index, &bundle.recipes, &mut out)?;
        self.render_listed(l.standards, l.standards_index, &bundle.standards, &mut out)?;
        self.render_skills(l, &bundle.skills, &mut out)?;
        let change_set = out.finish(target);
        tracing::debug!(
            agent = %agent,
            target = %target,
            writes = change_set.create_or_update.len(),
            "rendered artifacts"
        );
        Ok(change_set)
    }

    /// Deletes and section clears implied by removing `removed` from `agent`
    /// while `installed` stays deployed.
    pub fn removal(
        &self,
        agent: AgentKind,
        removed: &ArtifactSets,
        installed: &ArtifactSets,
        target: &Target,
    ) -> ChangeSet {
        let l = layout(agent);
        let mut out = Output::default();
        out.change_set.delete = compute_removals(&l.removal_layout(), removed, installed);
        for category in [Category::Recipe, Category::Standard] {
            if let Some(Placement::Section { file, key, .. }) = l.placement(category) {
                if !removed.items(category).is_empty() && installed.items(category).is_empty() {
                    out.section(file, NamedSection::cleared(key));
                }
            }
        }
        let change_set = out.finish(target);
        tracing::debug!(
            agent = %agent,
            target = %target,
            writes = change_set.create_or_update.len(),
            deletes = change_set.delete.len(),
            "rendered removals"
        );
        change_set
    }

    fn render_listed<T: Listed>(
        &self,
        placement: Option<Placement>,
        index: Option<IndexFile>,
        items: &[T],
        out: &mut Output,
    ) -> Result<(), RenderError> {
        match placement {
            Some(Placement::PerItem { prefix, suffix, template }) => {
                for item in items {
                    let content = self.engine.render(template, &item.item_context())?;
                    let path = format!("{prefix}{}{suffix}", item.slug());
                    out.change_set.write(FileWrite::full(path, content));
                }
            }
            Some(Placement::Section { file, key, template }) => {
                let body = if items.is_empty() {
                    String::new()
                } else {
                    self.engine.render_section(template, &T::list_context(items))?
                };
                out.section(file, NamedSection::new(key, body));
            }
            None => {}
        }
        if let Some(index) = index.filter(|_| !items.is_empty()) {
            let content = self.engine.render(index.template, &T::list_context(items))?;
            out.change_set.write(FileWrite::full(index.path, content));
        }
        Ok(())
    }

    fn render_skills(
        &self,
        layout: &AgentLayout,
        skills: &[Skill],
        out: &mut Output,
    ) -> Result<(), RenderError> {
        let Some(folder) = layout.skills_folder else {
            return Ok(());
        };
        for skill in skills {
            let base = format!("{folder}/{}", skill.slug);
            let content = self.engine.render(SKILL_TEMPLATE, &TemplateContext::for_skill(skill))?;
            out.change_set.write(FileWrite::full(format!("{base}/SKILL.md"), content));
            for file in &skill.files {
                // SKILL.md is always generated from the prompt.
                if file.path.eq_ignore_ascii_case("SKILL.md") {
                    continue;
                }
                let path = format!("{base}/{}", file.path.trim_start_matches('/'));
                out.change_set.write(if file.is_base64 {
                    FileWrite::base64(path, file.content.as_str())
                } else {
                    FileWrite::full(path, file.content.as_str())
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use loadout_core::{ItemRef, SkillFile, Slug};

    fn recipe(slug: &str) -> Recipe {
        Recipe {
            slug: Slug::from(slug),
            name: format!("Recipe {slug}"),
            summary: Some(format!("Summary of {slug}")),
            content: "1. Do the thing\r\n2. Check it".to_string(),
        }
    }

    fn standard(slug: &str) -> Standard {
        Standard {
            slug: Slug::from(slug),
            name: format!("Standard {slug}"),
            summary: None,
            description: Some("Why it matters".to_string()),
            rules: vec!["First rule".to_string(), "Second rule".to_string()],
        }
    }

    fn bundle() -> ArtifactBundle {
        ArtifactBundle {
            recipes: vec![recipe("add-endpoint")],
            standards: vec![standard("errors")],
            skills: vec![Skill {
                slug: Slug::from("release"),
                name: "Release".to_string(),
                description: "Cut a release".to_string(),
                prompt: "Follow the checklist.".to_string(),
                files: vec![
                    SkillFile {
                        path: "logo.png".to_string(),
                        content: "iVBORw0=".to_string(),
                        is_base64: true,
                    },
                    SkillFile {
                        path: "skill.md".to_string(),
                        content: "ignored".to_string(),
                        is_base64: false,
                    },
                ],
            }],
        }
    }

    #[test]
    fn renderer_new_succeeds() {
        Renderer::new().expect("Renderer::new should succeed with embedded templates");
    }

    #[test]
    fn every_layout_template_is_registered() {
        let renderer = Renderer::new().unwrap();
        for agent in AgentKind::all() {
            for name in layout(*agent).template_names() {
                assert!(renderer.engine().has_template(name), "{agent}: missing {name}");
            }
        }
    }

    #[test]
    fn all_agents_render_without_error() {
        let renderer = Renderer::new().unwrap();
        for agent in AgentKind::all() {
            let cs = renderer
                .deploy_artifacts(*agent, &bundle(), &Target::root())
                .unwrap_or_else(|e| panic!("render failed for {agent}: {e}"));
            assert!(!cs.create_or_update.is_empty(), "{agent} produced nothing");
            assert!(cs.delete.is_empty());
        }
    }

    #[test]
    fn no_crlf_in_any_rendered_output() {
        let renderer = Renderer::new().unwrap();
        for agent in AgentKind::all() {
            let cs = renderer.deploy_artifacts(*agent, &bundle(), &Target::root()).unwrap();
            for write in &cs.create_or_update {
                assert!(!write.content.contains('\r'), "{agent} {} contains CR", write.path);
                for section in write.sections.iter().flatten() {
                    assert!(!section.content.contains('\r'), "{agent} section contains CR");
                }
            }
        }
    }

    #[test]
    fn claude_paths_are_correct() {
        let renderer = Renderer::new().unwrap();
        let cs = renderer.deploy_artifacts(AgentKind::Claude, &bundle(), &Target::root()).unwrap();
        let paths: Vec<&str> = cs.create_or_update.iter().map(|w| w.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                ".claude/commands/loadout/add-endpoint.md",
                ".claude/rules/loadout/standard-errors.md",
                ".claude/skills/release/SKILL.md",
                ".claude/skills/release/logo.png",
            ]
        );
    }

    #[test]
    fn skill_attachment_keeps_base64_flag() {
        let renderer = Renderer::new().unwrap();
        let cs = renderer.deploy_skills(AgentKind::Copilot, &bundle().skills, &Target::root()).unwrap();
        let logo = cs.write_at(".github/skills/release/logo.png").expect("attachment");
        assert!(logo.is_base64);
        assert_eq!(logo.content, "iVBORw0=");
        let skill_md = cs.write_at(".github/skills/release/SKILL.md").expect("SKILL.md");
        assert!(skill_md.content.contains("name: 'Release'"));
        assert!(!skill_md.content.contains("ignored"));
    }

    #[test]
    fn agents_without_skill_folder_skip_skills() {
        let renderer = Renderer::new().unwrap();
        for agent in [AgentKind::Loadout, AgentKind::Continue, AgentKind::Junie] {
            let cs = renderer.deploy_skills(agent, &bundle().skills, &Target::root()).unwrap();
            assert!(cs.is_empty(), "{agent} rendered skills");
        }
    }

    #[test]
    fn shared_file_agents_emit_one_patch_with_both_sections() {
        let renderer = Renderer::new().unwrap();
        let cs = renderer.deploy_artifacts(AgentKind::AgentsMd, &bundle(), &Target::root()).unwrap();
        assert_eq!(cs.create_or_update.len(), 1);
        let write = &cs.create_or_update[0];
        assert_eq!(write.path, "AGENTS.md");
        let sections = write.sections.as_ref().expect("section patch");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].key, "loadout recipes");
        assert!(sections[0].content.contains("**Recipe add-endpoint**: Summary of add-endpoint"));
        assert_eq!(sections[1].key, "loadout standards");
        assert!(sections[1].content.contains("- First rule"));
    }

    #[test]
    fn empty_category_clears_its_section() {
        let renderer = Renderer::new().unwrap();
        let only_standards = ArtifactBundle { standards: vec![standard("errors")], ..Default::default() };
        let cs = renderer.deploy_artifacts(AgentKind::Junie, &only_standards, &Target::root()).unwrap();
        let sections = cs.create_or_update[0].sections.clone().unwrap();
        assert_eq!(sections[0], NamedSection::cleared("loadout recipes"));
        assert!(!sections[1].content.is_empty());
    }

    #[test]
    fn loadout_index_only_when_category_has_items() {
        let renderer = Renderer::new().unwrap();
        let cs = renderer.deploy_recipes(AgentKind::Loadout, &[], &Target::root()).unwrap();
        assert!(cs.is_empty());

        let cs = renderer.deploy_recipes(AgentKind::Loadout, &[recipe("a")], &Target::root()).unwrap();
        let index = cs.write_at(".loadout/commands-index.md").expect("index");
        assert!(index.content.contains("[Recipe a](commands/a.md): Summary of a"));
    }

    #[test]
    fn outputs_are_prefixed_for_target() {
        let renderer = Renderer::new().unwrap();
        let target = Target::new("/packages/api");
        let cs = renderer.deploy_artifacts(AgentKind::Cursor, &bundle(), &target).unwrap();
        assert!(cs.create_or_update.iter().all(|w| w.path.starts_with("packages/api/.cursor/")));
    }

    #[test]
    fn frontmatter_quotes_are_escaped() {
        let renderer = Renderer::new().unwrap();
        let mut r = recipe("quote");
        r.summary = Some("Don't panic".to_string());
        let cs = renderer.deploy_recipes(AgentKind::Continue, &[r], &Target::root()).unwrap();
        let content = &cs.create_or_update[0].content;
        assert!(content.contains("description: 'Don''t panic'"), "got:\n{content}");
        assert!(content.contains("invokable: true"));
    }

    #[test]
    fn cursor_rule_contains_frontmatter() {
        let renderer = Renderer::new().unwrap();
        let cs = renderer.deploy_standards(AgentKind::Cursor, &[standard("s")], &Target::root()).unwrap();
        let content = &cs.create_or_update[0].content;
        assert!(content.starts_with("---\nalwaysApply: true\n---\n# Standard s"), "got:\n{content}");
        assert!(content.ends_with("- Second rule\n"));
    }

    #[test]
    fn removal_clears_sections_only_when_category_is_gone() {
        let renderer = Renderer::new().unwrap();
        let removed = ArtifactSets { standards: vec![ItemRef::from("errors")], ..Default::default() };

        let cs = renderer.removal(AgentKind::AgentsMd, &removed, &ArtifactSets::default(), &Target::root());
        assert_eq!(
            cs.create_or_update,
            vec![FileWrite::sections("AGENTS.md", vec![NamedSection::cleared("loadout standards")])]
        );

        let installed = ArtifactSets { standards: vec![ItemRef::from("other")], ..Default::default() };
        let cs = renderer.removal(AgentKind::AgentsMd, &removed, &installed, &Target::root());
        assert!(cs.is_empty());
    }

    #[test]
    fn removal_paths_are_prefixed() {
        let renderer = Renderer::new().unwrap();
        let removed = ArtifactSets { recipes: vec![ItemRef::from("a")], ..Default::default() };
        let cs = renderer.removal(
            AgentKind::Claude,
            &removed,
            &ArtifactSets::default(),
            &Target::new("/svc"),
        );
        assert!(cs.delete.iter().any(|d| d.path == "svc/.claude/commands/loadout/a.md"));
        assert!(cs.delete.iter().all(|d| d.path.starts_with("svc/")));
    }
}
