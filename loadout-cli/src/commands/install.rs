//! `loadout install`: render and write agent files for a repository.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use loadout_sync::{install_at, InstallOptions, InstallReport, WriteResult};

/// Arguments for `loadout install`.
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Repository root (defaults to the current directory).
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Show what would change without touching any file.
    #[arg(long)]
    pub dry_run: bool,

    /// Directory of `.tera` files overriding the built-in templates.
    #[arg(long, value_name = "DIR")]
    pub templates: Option<PathBuf>,
}

impl InstallArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
        let opts = InstallOptions {
            dry_run: self.dry_run,
            template_dir: self.templates,
        };
        let report = install_at(&home, &self.path, &opts)
            .with_context(|| format!("install failed for '{}'", self.path.display()))?;
        print_report(&report, "installed", self.dry_run);
        Ok(())
    }
}

pub(crate) fn print_report(report: &InstallReport, verb: &str, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let name = &report.repo_name;
    let count = |f: fn(&WriteResult) -> bool| report.results.iter().filter(|r| f(r)).count();
    let written = count(|r| matches!(r, WriteResult::Written { .. } | WriteResult::WouldWrite { .. }));
    let deleted = count(|r| matches!(r, WriteResult::Deleted { .. } | WriteResult::WouldDelete { .. }));
    let unchanged = count(|r| matches!(r, WriteResult::Unchanged { .. }));

    if written == 0 && deleted == 0 {
        println!("{prefix}✓ '{name}': nothing to do ({unchanged} unchanged)");
        return;
    }

    println!("{prefix}✓ '{name}' {verb} ({written} written, {deleted} deleted, {unchanged} unchanged)");
    for r in &report.results {
        match r {
            WriteResult::Written { path } => println!("  ✎  {}", path.display()),
            WriteResult::WouldWrite { path } => println!("  ~  {}", path.display()),
            WriteResult::Deleted { path } => println!("  ✗  {}", path.display()),
            WriteResult::WouldDelete { path } => println!("  -  {}", path.display()),
            WriteResult::Unchanged { .. } => {}
        }
    }
}
