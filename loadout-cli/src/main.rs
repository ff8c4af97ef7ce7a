//! Loadout: deploy recipes, standards and skills to AI coding agents.
//!
//! # Usage
//!
//! ```text
//! loadout init [path] [--agent <id>...]
//! loadout render [path] [--templates <dir>]
//! loadout install [path] [--dry-run] [--templates <dir>]
//! loadout remove <slug>... [--path <p>] [--dry-run]
//! loadout status [path] [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    init::InitArgs, install::InstallArgs, remove::RemoveArgs, render::RenderArgs,
    status::StatusArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "loadout",
    version,
    about = "Deploy shared recipes, standards and skills to AI coding agents",
    long_about = None,
)]
struct Cli {
    /// Log progress to stderr (`-vv` for per-agent detail).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scaffold a `loadout.yaml` in a repository.
    Init(InitArgs),

    /// Print the change-set an install would apply, as JSON.
    Render(RenderArgs),

    /// Write agent files for every configured agent and target.
    Install(InstallArgs),

    /// Drop artifacts from the manifest and from the checkout.
    Remove(RemoveArgs),

    /// Show whether the checkout still matches its last install.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!(command = ?cli.command, "parsed command line");
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Render(args) => args.run(),
        Commands::Install(args) => args.run(),
        Commands::Remove(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}
