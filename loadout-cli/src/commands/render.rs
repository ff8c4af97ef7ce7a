//! `loadout render`: print the change-set an install would apply.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use loadout_sync::render_at;

/// Arguments for `loadout render`.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Repository root (defaults to the current directory).
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Directory of `.tera` files overriding the built-in templates.
    #[arg(long, value_name = "DIR")]
    pub templates: Option<PathBuf>,
}

impl RenderArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
        let change_set = render_at(&home, &self.path, self.templates.as_deref())
            .with_context(|| format!("render failed for '{}'", self.path.display()))?;
        println!(
            "{}",
            serde_json::to_string_pretty(&change_set).context("failed to serialize change-set")?
        );
        Ok(())
    }
}
