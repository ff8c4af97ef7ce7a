//! Template context: serializable rendering payload built from artifacts.
//!
//! Every template sees the same top-level shape; only the fields relevant to
//! the template being rendered are populated:
//!
//! - `recipe`, `standard`, `skill` for per-item files
//! - `recipes`, `standards` for index files and shared-file sections

use serde::{Deserialize, Serialize};

use loadout_core::{Recipe, Skill, Slug, Standard};

use crate::error::RenderError;

/// Rendering payload handed to tera.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateContext {
    pub recipe: Option<RecipeCtx>,
    pub standard: Option<StandardCtx>,
    pub skill: Option<SkillCtx>,
    pub recipes: Vec<RecipeCtx>,
    pub standards: Vec<StandardCtx>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCtx {
    pub slug: String,
    pub name: String,
    /// Trimmed summary, empty when absent.
    pub summary: String,
    /// Summary, falling back to the name. Used for frontmatter.
    pub description: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardCtx {
    pub slug: String,
    pub name: String,
    pub summary: String,
    /// Description, falling back to the summary.
    pub description: String,
    pub rules: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillCtx {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub prompt: String,
}

fn trimmed(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

impl From<&Recipe> for RecipeCtx {
    fn from(recipe: &Recipe) -> Self {
        let summary = trimmed(recipe.summary.as_deref());
        let description = if summary.is_empty() { recipe.name.clone() } else { summary.clone() };
        RecipeCtx {
            slug: recipe.slug.0.clone(),
            name: recipe.name.clone(),
            summary,
            description,
            content: recipe.content.clone(),
        }
    }
}

impl From<&Standard> for StandardCtx {
    fn from(standard: &Standard) -> Self {
        let summary = trimmed(standard.summary.as_deref());
        let description = match trimmed(standard.description.as_deref()) {
            d if d.is_empty() => summary.clone(),
            d => d,
        };
        StandardCtx {
            slug: standard.slug.0.clone(),
            name: standard.name.clone(),
            summary,
            description,
            rules: standard.rules.iter().map(|r| r.trim().to_string()).collect(),
        }
    }
}

impl From<&Skill> for SkillCtx {
    fn from(skill: &Skill) -> Self {
        SkillCtx {
            slug: skill.slug.0.clone(),
            name: skill.name.clone(),
            description: skill.description.trim().to_string(),
            prompt: skill.prompt.clone(),
        }
    }
}

impl TemplateContext {
    pub fn for_recipe(recipe: &Recipe) -> Self {
        TemplateContext { recipe: Some(recipe.into()), ..Default::default() }
    }

    pub fn for_standard(standard: &Standard) -> Self {
        TemplateContext { standard: Some(standard.into()), ..Default::default() }
    }

    pub fn for_skill(skill: &Skill) -> Self {
        TemplateContext { skill: Some(skill.into()), ..Default::default() }
    }

    pub fn for_recipes(recipes: &[Recipe]) -> Self {
        TemplateContext { recipes: recipes.iter().map(RecipeCtx::from).collect(), ..Default::default() }
    }

    pub fn for_standards(standards: &[Standard]) -> Self {
        TemplateContext {
            standards: standards.iter().map(StandardCtx::from).collect(),
            ..Default::default()
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

/// An artifact rendered both as its own file and as an entry of a list.
pub trait Listed: Sized {
    fn slug(&self) -> &Slug;
    fn item_context(&self) -> TemplateContext;
    fn list_context(items: &[Self]) -> TemplateContext;
}

impl Listed for Recipe {
    fn slug(&self) -> &Slug {
        &self.slug
    }

    fn item_context(&self) -> TemplateContext {
        TemplateContext::for_recipe(self)
    }

    fn list_context(items: &[Self]) -> TemplateContext {
        TemplateContext::for_recipes(items)
    }
}

impl Listed for Standard {
    fn slug(&self) -> &Slug {
        &self.slug
    }

    fn item_context(&self) -> TemplateContext {
        TemplateContext::for_standard(self)
    }

    fn list_context(items: &[Self]) -> TemplateContext {
        TemplateContext::for_standards(items)
    }
}
