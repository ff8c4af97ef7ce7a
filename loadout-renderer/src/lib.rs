//! # loadout-renderer
//!
//! Tera-based generators that turn recipes, standards and skills into
//! per-agent [`ChangeSet`](loadout_core::ChangeSet)s.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use loadout_core::{merge, AgentKind, ArtifactBundle, Target};
//! use loadout_renderer::Renderer;
//!
//! fn render_all(bundle: &ArtifactBundle) -> Result<(), loadout_renderer::RenderError> {
//!     let renderer = Renderer::new()?;
//!     let mut change_sets = Vec::new();
//!     for agent in AgentKind::all() {
//!         change_sets.push(renderer.deploy_artifacts(*agent, bundle, &Target::root())?);
//!     }
//!     for write in merge(change_sets).create_or_update {
//!         println!("{}", write.path);
//!     }
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod layout;

pub use context::TemplateContext;
pub use engine::{Renderer, TemplateEngine};
pub use error::RenderError;
pub use layout::{layout, AgentLayout, Placement, RECIPES_SECTION, STANDARDS_SECTION};
