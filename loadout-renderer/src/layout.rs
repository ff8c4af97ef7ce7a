//! Per-agent on-disk layout.
//!
//! | Agent       | Recipes                                   | Standards                                             | Skills                   |
//! |-------------|-------------------------------------------|-------------------------------------------------------|--------------------------|
//! | `loadout`   | `.loadout/commands/{slug}.md` + index     | `.loadout/standards/{slug}.md` + index                | -                        |
//! | `claude`    | `.claude/commands/loadout/{slug}.md`      | `.claude/rules/loadout/standard-{slug}.md`            | `.claude/skills/{slug}/` |
//! | `cursor`    | `.cursor/commands/loadout/{slug}.md`      | `.cursor/rules/loadout/standard-{slug}.mdc`           | `.cursor/skills/{slug}/` |
//! | `copilot`   | `.github/prompts/{slug}.prompt.md`        | `.github/instructions/loadout-{slug}.instructions.md` | `.github/skills/{slug}/` |
//! | `continue`  | `.continue/prompts/{slug}.md`             | `.continue/rules/loadout/standard-{slug}.md`          | -                        |
//! | `junie`     | `.junie/guidelines.md` section            | `.junie/guidelines.md` section                        | -                        |
//! | `agents_md` | `AGENTS.md` section                       | `AGENTS.md` section                                   | -                        |
//!
//! Paths are root-relative; the renderer prefixes them for the target.

use loadout_core::{AgentKind, Category, ContainerRule, ItemRule, RemovalLayout};

/// Section key holding the recipe list in shared files.
pub const RECIPES_SECTION: &str = "loadout recipes";
/// Section key holding the standards in shared files.
pub const STANDARDS_SECTION: &str = "loadout standards";

/// Where the items of one category go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// One file per item at `{prefix}{slug}{suffix}`.
    PerItem { prefix: &'static str, suffix: &'static str, template: &'static str },
    /// One section listing every item, inside a shared file.
    Section { file: &'static str, key: &'static str, template: &'static str },
}

/// A generated file listing every item of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexFile {
    pub path: &'static str,
    pub template: &'static str,
}

/// Static description of everything one agent writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentLayout {
    pub recipes: Option<Placement>,
    pub standards: Option<Placement>,
    /// Skills land in `{folder}/{slug}/`.
    pub skills_folder: Option<&'static str>,
    pub recipes_index: Option<IndexFile>,
    pub standards_index: Option<IndexFile>,
    /// Folders owned by loadout, and the categories that fill them.
    pub containers: &'static [(&'static str, &'static [Category])],
}

const RECIPES_AND_STANDARDS: &[Category] = &[Category::Recipe, Category::Standard];

const LOADOUT: AgentLayout = AgentLayout {
    recipes: Some(Placement::PerItem {
        prefix: ".loadout/commands/",
        suffix: ".md",
        template: "loadout/command.md.tera",
    }),
    standards: Some(Placement::PerItem {
        prefix: ".loadout/standards/",
        suffix: ".md",
        template: "loadout/standard.md.tera",
    }),
    skills_folder: None,
    recipes_index: Some(IndexFile {
        path: ".loadout/commands-index.md",
        template: "loadout/commands_index.md.tera",
    }),
    standards_index: Some(IndexFile {
        path: ".loadout/standards-index.md",
        template: "loadout/standards_index.md.tera",
    }),
    containers: &[
        (".loadout/commands/", RECIPES_AND_STANDARDS),
        (".loadout/standards/", RECIPES_AND_STANDARDS),
    ],
};

const CLAUDE: AgentLayout = AgentLayout {
    recipes: Some(Placement::PerItem {
        prefix: ".claude/commands/loadout/",
        suffix: ".md",
        template: "claude/command.md.tera",
    }),
    standards: Some(Placement::PerItem {
        prefix: ".claude/rules/loadout/standard-",
        suffix: ".md",
        template: "claude/rule.md.tera",
    }),
    skills_folder: Some(".claude/skills"),
    recipes_index: None,
    standards_index: None,
    containers: &[
        (".claude/commands/loadout/", &[Category::Recipe]),
        (".claude/rules/loadout/", &[Category::Standard]),
    ],
};

const CURSOR: AgentLayout = AgentLayout {
    recipes: Some(Placement::PerItem {
        prefix: ".cursor/commands/loadout/",
        suffix: ".md",
        template: "cursor/command.md.tera",
    }),
    standards: Some(Placement::PerItem {
        prefix: ".cursor/rules/loadout/standard-",
        suffix: ".mdc",
        template: "cursor/rule.mdc.tera",
    }),
    skills_folder: Some(".cursor/skills"),
    recipes_index: None,
    standards_index: None,
    containers: &[
        (".cursor/commands/loadout/", &[Category::Recipe]),
        (".cursor/rules/loadout/", &[Category::Standard]),
    ],
};

// `.github/` belongs to the repository; only per-item files are removed.
const COPILOT: AgentLayout = AgentLayout {
    recipes: Some(Placement::PerItem {
        prefix: ".github/prompts/",
        suffix: ".prompt.md",
        template: "copilot/prompt.md.tera",
    }),
    standards: Some(Placement::PerItem {
        prefix: ".github/instructions/loadout-",
        suffix: ".instructions.md",
        template: "copilot/instructions.md.tera",
    }),
    skills_folder: Some(".github/skills"),
    recipes_index: None,
    standards_index: None,
    containers: &[],
};

const CONTINUE: AgentLayout = AgentLayout {
    recipes: Some(Placement::PerItem {
        prefix: ".continue/prompts/",
        suffix: ".md",
        template: "continue/prompt.md.tera",
    }),
    standards: Some(Placement::PerItem {
        prefix: ".continue/rules/loadout/standard-",
        suffix: ".md",
        template: "continue/rule.md.tera",
    }),
    skills_folder: None,
    recipes_index: None,
    standards_index: None,
    containers: &[
        (".continue/prompts/", &[Category::Recipe]),
        (".continue/rules/loadout/", RECIPES_AND_STANDARDS),
    ],
};

const fn single_file(file: &'static str) -> AgentLayout {
    AgentLayout {
        recipes: Some(Placement::Section {
            file,
            key: RECIPES_SECTION,
            template: "shared/recipes_section.md.tera",
        }),
        standards: Some(Placement::Section {
            file,
            key: STANDARDS_SECTION,
            template: "shared/standards_section.md.tera",
        }),
        skills_folder: None,
        recipes_index: None,
        standards_index: None,
        containers: &[],
    }
}

const JUNIE: AgentLayout = single_file(".junie/guidelines.md");
const AGENTS_MD: AgentLayout = single_file("AGENTS.md");

/// Layout for `agent`.
pub fn layout(agent: AgentKind) -> &'static AgentLayout {
    match agent {
        AgentKind::Loadout => &LOADOUT,
        AgentKind::Claude => &CLAUDE,
        AgentKind::Cursor => &CURSOR,
        AgentKind::Copilot => &COPILOT,
        AgentKind::Continue => &CONTINUE,
        AgentKind::Junie => &JUNIE,
        AgentKind::AgentsMd => &AGENTS_MD,
    }
}

impl AgentLayout {
    pub fn placement(&self, category: Category) -> Option<Placement> {
        match category {
            Category::Recipe => self.recipes,
            Category::Standard => self.standards,
            Category::Skill => None,
        }
    }

    pub fn index(&self, category: Category) -> Option<IndexFile> {
        match category {
            Category::Recipe => self.recipes_index,
            Category::Standard => self.standards_index,
            Category::Skill => None,
        }
    }

    /// Per-item and container delete rules for the removal differ.
    ///
    /// Section placements are not part of it: shared files are cleared, never
    /// deleted, by the renderer.
    pub fn removal_layout(&self) -> RemovalLayout {
        let mut out = RemovalLayout::new();
        for category in [Category::Recipe, Category::Standard] {
            if let Some(Placement::PerItem { prefix, suffix, .. }) = self.placement(category) {
                out = out.item(ItemRule::file(category, prefix, suffix));
            }
            if let Some(index) = self.index(category) {
                out = out.container(ContainerRule::index_file(index.path, category));
            }
        }
        if let Some(folder) = self.skills_folder {
            out = out.item(ItemRule::directory(Category::Skill, format!("{folder}/")));
        }
        for (path, shared_by) in self.containers {
            out = out.container(ContainerRule::folder(*path, shared_by));
        }
        out
    }

    /// Template names this layout renders.
    pub fn template_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        for placement in [self.recipes, self.standards].into_iter().flatten() {
            names.push(match placement {
                Placement::PerItem { template, .. } | Placement::Section { template, .. } => template,
            });
        }
        for index in [self.recipes_index, self.standards_index].into_iter().flatten() {
            names.push(index.template);
        }
        if self.skills_folder.is_some() {
            names.push(crate::engine::SKILL_TEMPLATE);
        }
        names
    }
}
