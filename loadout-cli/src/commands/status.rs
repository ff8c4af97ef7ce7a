//! `loadout status`: does the checkout still match its last install?

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use loadout_core::manifest;
use loadout_sync::{
    state::{self, check_at, format_datetime_age},
    DeploymentStatus,
};

/// Arguments for `loadout status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Repository root (defaults to the current directory).
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
        let report = build_report(&home, &self.path)?;
        if self.json {
            print_json(report)?;
            return Ok(());
        }
        print_table(report);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct StatusReport {
    repo: String,
    agents: Vec<String>,
    targets: Vec<String>,
    status: DeploymentStatus,
    last_install_at: Option<String>,
    last_install_age: String,
    tracked_files: usize,
}

#[derive(Serialize)]
struct StatusReportJson {
    repo: String,
    status: String,
    detail: String,
    files: Vec<String>,
    agents: Vec<String>,
    targets: Vec<String>,
    last_install_age: String,
    last_install_at: Option<String>,
    tracked_files: usize,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "repo")]
    repo: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "detail")]
    detail: String,
    #[tabled(rename = "last install")]
    last_install: String,
    #[tabled(rename = "files")]
    files: usize,
}

fn build_report(home: &Path, root: &Path) -> Result<StatusReport> {
    let m = manifest::load_at(root)
        .with_context(|| format!("failed to load manifest in '{}'", root.display()))?;
    let status = check_at(home, root)
        .with_context(|| format!("status check failed for '{}'", m.name))?;
    let previous = state::load_at(home, root)
        .with_context(|| format!("failed to load deployment state for '{}'", m.name))?;

    let (last_install_at, last_install_age, tracked_files) = match &previous {
        Some(s) => (Some(s.deployed_at.to_rfc3339()), format_datetime_age(s.deployed_at), s.files.len()),
        None => (None, "never".to_string(), 0),
    };
    Ok(StatusReport {
        repo: m.name,
        agents: m.agents.iter().map(|a| a.id().to_string()).collect(),
        targets: m.targets.iter().map(|t| t.path.clone()).collect(),
        status,
        last_install_at,
        last_install_age,
        tracked_files,
    })
}

fn print_json(report: StatusReport) -> Result<()> {
    let payload = StatusReportJson {
        status: status_key(&report.status).to_string(),
        detail: status_detail(&report.status),
        files: status_files(&report.status)
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
        repo: report.repo,
        agents: report.agents,
        targets: report.targets,
        last_install_age: report.last_install_age,
        last_install_at: report.last_install_at,
        tracked_files: report.tracked_files,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(report: StatusReport) {
    println!(
        "Loadout v{} | {} | agents: {} | targets: {}",
        env!("CARGO_PKG_VERSION"),
        report.repo.bold(),
        if report.agents.is_empty() { "none".to_string() } else { report.agents.join(", ") },
        report.targets.join(", "),
    );

    let separator = "■".repeat(67).bright_black().to_string();
    println!("{separator}");
    println!(
        "Indicators: {} CURRENT  {} STALE  {} MODIFIED  {} MISSING  {} NEVER DEPLOYED",
        status_indicator(&DeploymentStatus::Current),
        status_indicator(&DeploymentStatus::Stale { reason: String::new() }),
        status_indicator(&DeploymentStatus::Modified { files: Vec::new() }),
        status_indicator(&DeploymentStatus::Missing { files: Vec::new() }),
        status_indicator(&DeploymentStatus::NeverDeployed),
    );
    println!("{separator}");

    let row = StatusTableRow {
        repo: format!("{} {}", status_indicator(&report.status), report.repo),
        status: status_label(&report.status).to_string(),
        detail: status_detail(&report.status),
        last_install: report.last_install_age,
        files: report.tracked_files,
    };
    let mut table = Table::new([row]);
    table.with(Style::rounded());
    println!("{table}");

    match report.status {
        DeploymentStatus::Current => {}
        DeploymentStatus::Modified { .. } => {
            println!("Run 'loadout install' to restore the deployed files.")
        }
        _ => println!("Run 'loadout install' to bring the checkout up to date."),
    }
}

fn status_key(status: &DeploymentStatus) -> &'static str {
    match status {
        DeploymentStatus::NeverDeployed => "never_deployed",
        DeploymentStatus::Current => "current",
        DeploymentStatus::Stale { .. } => "stale",
        DeploymentStatus::Modified { .. } => "modified",
        DeploymentStatus::Missing { .. } => "missing",
    }
}

fn status_label(status: &DeploymentStatus) -> &'static str {
    match status {
        DeploymentStatus::NeverDeployed => "NEVER DEPLOYED",
        DeploymentStatus::Current => "CURRENT",
        DeploymentStatus::Stale { .. } => "STALE",
        DeploymentStatus::Modified { .. } => "MODIFIED",
        DeploymentStatus::Missing { .. } => "MISSING",
    }
}

fn status_indicator(status: &DeploymentStatus) -> String {
    match status {
        DeploymentStatus::NeverDeployed => "■".bright_black().bold().to_string(),
        DeploymentStatus::Current => "■".green().bold().to_string(),
        DeploymentStatus::Stale { .. } => "■".yellow().bold().to_string(),
        DeploymentStatus::Modified { .. } => "■".red().bold().to_string(),
        DeploymentStatus::Missing { .. } => "■".magenta().bold().to_string(),
    }
}

fn status_files(status: &DeploymentStatus) -> &[PathBuf] {
    match status {
        DeploymentStatus::Modified { files } | DeploymentStatus::Missing { files } => files.as_slice(),
        _ => &[],
    }
}

fn status_detail(status: &DeploymentStatus) -> String {
    match status {
        DeploymentStatus::NeverDeployed => "not installed yet".to_string(),
        DeploymentStatus::Current => "up to date".to_string(),
        DeploymentStatus::Stale { reason } => reason.clone(),
        DeploymentStatus::Modified { files } => format!("{} edited", summarize_files(files)),
        DeploymentStatus::Missing { files } => format!("{} missing", summarize_files(files)),
    }
}

fn summarize_files(files: &[PathBuf]) -> String {
    if files.is_empty() {
        return "unknown file".to_string();
    }

    let mut names: Vec<String> = files
        .iter()
        .take(2)
        .map(|path| path.display().to_string())
        .collect();
    if files.len() > names.len() {
        names.push(format!("+{} more", files.len() - names.len()));
    }
    names.join(", ")
}
