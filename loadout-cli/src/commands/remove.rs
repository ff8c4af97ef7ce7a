//! `loadout remove <slug>...`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use loadout_core::Slug;
use loadout_sync::{remove_at, InstallOptions};

use super::install::print_report;

/// Arguments for `loadout remove`.
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Slugs to drop; each matches recipes, standards and skills alike.
    #[arg(required = true, value_name = "SLUG")]
    pub slugs: Vec<String>,

    /// Repository root (defaults to the current directory).
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// Show what would change without touching any file.
    #[arg(long)]
    pub dry_run: bool,
}

impl RemoveArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
        let slugs: Vec<Slug> = self.slugs.into_iter().map(Slug::from).collect();
        let opts = InstallOptions {
            dry_run: self.dry_run,
            ..Default::default()
        };
        let report = remove_at(&home, &self.path, &slugs, &opts)
            .with_context(|| format!("remove failed for '{}'", self.path.display()))?;

        if report.removed.is_empty() {
            let names: Vec<&str> = slugs.iter().map(|s| s.as_str()).collect();
            println!("No artifact matches {}", names.join(", "));
        }
        print_report(&report, "updated", self.dry_run);
        Ok(())
    }
}
