//! `loadout init [path] [--agent <id>...]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use loadout_core::{manifest, AgentKind};

/// Scaffold a `loadout.yaml` in a repository.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Repository root (defaults to the current directory).
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Agent to deploy to; repeat for several (claude, cursor, copilot,
    /// continue, junie, agents_md, loadout).
    #[arg(long = "agent", short = 'a', value_name = "AGENT")]
    pub agents: Vec<AgentKind>,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let root = self
            .path
            .canonicalize()
            .with_context(|| format!("cannot resolve path '{}'", self.path.display()))?;
        let existed = manifest::manifest_path_at(&root).exists();

        let m = manifest::init_at(&root, self.agents)
            .with_context(|| format!("failed to init '{}'", root.display()))?;

        if existed {
            println!("✓ '{}' already has {}", m.name, manifest::MANIFEST_FILE);
            return Ok(());
        }
        let agents: Vec<&str> = m.agents.iter().map(|a| a.id()).collect();
        println!("✓ Created {} for '{}'", manifest::MANIFEST_FILE, m.name);
        if agents.is_empty() {
            println!("  No agents yet: add some under `agents:` before installing.");
        } else {
            println!("  Agents: {}", agents.join(", "));
        }
        Ok(())
    }
}
