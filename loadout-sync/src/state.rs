//! Deployment state: what the last install put in a checkout.
//!
//! Persists a [`DeploymentState`] JSON document at
//! `<home>/.loadout/state/<checkout_key>.json`, where the key is derived from
//! the canonical checkout root. Two checkouts never share a record, whatever
//! their manifest `name`.
//! Writes use the same atomic `.tmp` + rename pattern as the manifest.
//!
//! Status precedence:
//! 1. `NeverDeployed` (no state file)
//! 2. `Missing` (a deployed file is gone)
//! 3. `Stale` (manifest changed after `deployed_at`)
//! 4. `Modified` (a deployed file no longer matches its digest)
//! 5. `Current`

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loadout_core::{manifest, AgentKind, ArtifactSets, Target};

use crate::error::{io_err, SyncError};
use crate::writer::{resolve, sha256_hex};

/// On-disk deployment record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentState {
    pub deployed_at: DateTime<Utc>,
    #[serde(default)]
    pub agents: Vec<AgentKind>,
    #[serde(default)]
    pub targets: Vec<Target>,
    #[serde(default)]
    pub installed: ArtifactSets,
    /// Checkout-relative path → SHA-256 hex digest.
    #[serde(default)]
    pub files: BTreeMap<String, String>,
}

impl DeploymentState {
    /// The record of a checkout nothing was deployed to yet.
    pub fn empty() -> Self {
        DeploymentState {
            deployed_at: Utc::now(),
            agents: Vec::new(),
            targets: Vec::new(),
            installed: ArtifactSets::default(),
            files: BTreeMap::new(),
        }
    }
}

/// Deployment status of one checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentStatus {
    NeverDeployed,
    Current,
    Stale { reason: String },
    Modified { files: Vec<PathBuf> },
    Missing { files: Vec<PathBuf> },
}

/// Stable identifier of the checkout at `root`: SHA-256 of its canonical path.
pub fn checkout_key(root: &Path) -> Result<String, SyncError> {
    let canonical = root.canonicalize().map_err(|e| io_err(root, e))?;
    Ok(sha256_hex(canonical.to_string_lossy().as_bytes()))
}

/// Path to the state JSON of the checkout at `root`, under `home`.
///
/// `~/.loadout/state/<checkout_key>.json`
pub fn state_path_at(home: &Path, root: &Path) -> Result<PathBuf, SyncError> {
    let key = checkout_key(root)?;
    Ok(home.join(".loadout").join("state").join(format!("{key}.json")))
}

/// Load the state of the checkout at `root`, or `None` if never deployed.
pub fn load_at(home: &Path, root: &Path) -> Result<Option<DeploymentState>, SyncError> {
    let path = state_path_at(home, root)?;
    let contents = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_err(&path, e)),
    };
    Ok(Some(serde_json::from_str(&contents)?))
}

/// Save the state of the checkout at `root` atomically.
///
/// Writes to `<path>.tmp` then renames to `<path>`.
pub fn save_at(home: &Path, root: &Path, state: &DeploymentState) -> Result<(), SyncError> {
    let path = state_path_at(home, root)?;
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid state path")));
    };

    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Compare the recorded state of the checkout at `root` against disk.
pub fn check_at(home: &Path, root: &Path) -> Result<DeploymentStatus, SyncError> {
    manifest::load_at(root)?;
    let Some(state) = load_at(home, root)? else {
        return Ok(DeploymentStatus::NeverDeployed);
    };

    let mut missing = Vec::new();
    let mut modified = Vec::new();
    for (rel, expected) in &state.files {
        let path = resolve(root, rel)?;
        match std::fs::read(&path) {
            Ok(bytes) if &sha256_hex(&bytes) != expected => modified.push(PathBuf::from(rel)),
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => missing.push(PathBuf::from(rel)),
            Err(e) => return Err(io_err(&path, e)),
        }
    }

    if !missing.is_empty() {
        return Ok(DeploymentStatus::Missing { files: missing });
    }

    let manifest_path = manifest::manifest_path_at(root);
    let manifest_mtime = std::fs::metadata(&manifest_path)
        .and_then(|meta| meta.modified())
        .map_err(|e| io_err(&manifest_path, e))?;
    if unix_duration(manifest_mtime) > datetime_to_unix_duration(state.deployed_at) {
        return Ok(DeploymentStatus::Stale {
            reason: format!(
                "manifest changed {} ago, after the last install",
                format_system_time_age(manifest_mtime)
            ),
        });
    }

    if !modified.is_empty() {
        return Ok(DeploymentStatus::Modified { files: modified });
    }
    Ok(DeploymentStatus::Current)
}

/// Format age from a filesystem timestamp.
pub fn format_system_time_age(timestamp: SystemTime) -> String {
    let age = SystemTime::now().duration_since(timestamp).unwrap_or_default();
    format_seconds(age.as_secs())
}

/// Format age from a chrono timestamp (state `deployed_at`).
pub fn format_datetime_age(timestamp: DateTime<Utc>) -> String {
    let age = Utc::now().signed_duration_since(timestamp).num_seconds().max(0) as u64;
    format_seconds(age)
}

fn unix_duration(timestamp: SystemTime) -> Duration {
    timestamp.duration_since(UNIX_EPOCH).unwrap_or_default()
}

fn datetime_to_unix_duration(timestamp: DateTime<Utc>) -> Duration {
    let secs = timestamp.timestamp().max(0) as u64;
    Duration::new(secs, timestamp.timestamp_subsec_nanos())
}

fn format_seconds(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}
