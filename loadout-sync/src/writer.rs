//! Change-set applier for a local checkout.
//!
//! ## `apply_change_set` protocol
//!
//! 1. Resolve every path against the checkout root; reject absolute paths
//!    and `..` components before touching anything.
//! 2. Compute the desired bytes of each write: plain text, decoded base64, or
//!    the current file with its sections patched in.
//! 3. SHA-256 the desired bytes and compare with the file on disk → skip if
//!    identical.
//! 4. Write to `<path>.loadout.tmp`, then rename to the final path.
//! 5. Apply deletes after every write.
//!
//! A shared file that is not valid UTF-8 cannot be section-patched; the whole
//! change-set is refused before anything is written.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use base64::Engine as _;
use sha2::{Digest, Sha256};

use loadout_core::{
    sections::{is_effectively_empty, merge_sections, section_keys},
    ChangeSet, DeleteEntry, DeleteKind, FileWrite, NamedSection,
};

use crate::error::{io_err, SyncError};

// ---------------------------------------------------------------------------
// Write result
// ---------------------------------------------------------------------------

/// Outcome of one create/update/delete instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written (content changed or did not previously exist).
    Written { path: PathBuf },
    /// File was skipped; desired content matches the file on disk.
    Unchanged { path: PathBuf },
    /// `--dry-run` mode: the file *would* have been written.
    WouldWrite { path: PathBuf },
    /// File or directory was removed.
    Deleted { path: PathBuf },
    /// `--dry-run` mode: the path *would* have been removed.
    WouldDelete { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path }
            | WriteResult::Unchanged { path }
            | WriteResult::WouldWrite { path }
            | WriteResult::Deleted { path }
            | WriteResult::WouldDelete { path } => path,
        }
    }

    /// Whether the checkout changed (or would change).
    pub fn is_change(&self) -> bool {
        !matches!(self, WriteResult::Unchanged { .. })
    }
}

/// Everything one `apply_change_set` call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub results: Vec<WriteResult>,
    /// SHA-256 of every file the change-set leaves in place, keyed by its
    /// checkout-relative path.
    pub digests: BTreeMap<String, String>,
}

impl ApplyReport {
    pub fn changed(&self) -> usize {
        self.results.iter().filter(|r| r.is_change()).count()
    }
}

// ---------------------------------------------------------------------------
// Path safety
// ---------------------------------------------------------------------------

/// Join `rel` onto `root`, refusing anything that could leave `root`.
pub fn resolve(root: &Path, rel: &str) -> Result<PathBuf, SyncError> {
    let unsafe_path = || SyncError::UnsafePath { path: rel.to_string() };
    let path = Path::new(rel);
    if rel.trim().is_empty() || rel.starts_with('/') || rel.starts_with('\\') {
        return Err(unsafe_path());
    }
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(unsafe_path());
            }
        }
    }
    Ok(root.join(path))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

// ---------------------------------------------------------------------------
// Desired content
// ---------------------------------------------------------------------------

enum Desired {
    Bytes(Vec<u8>),
    /// A section patch left nothing but empty markers.
    Empty,
}

fn read_existing(path: &Path) -> Result<Option<Vec<u8>>, SyncError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_err(path, e)),
    }
}

/// Patch `current` with `sections`. Clearing a section the file never had
/// is a no-op, so user files do not collect empty marker pairs.
fn patch_sections(current: &str, sections: &[NamedSection]) -> String {
    let present = section_keys(current);
    let effective: Vec<NamedSection> = sections
        .iter()
        .filter(|s| !s.content.is_empty() || present.contains(&s.key))
        .cloned()
        .collect();
    if effective.is_empty() {
        return current.to_string();
    }
    merge_sections(current, &effective)
}

fn desired_content(write: &FileWrite, existing: Option<&[u8]>) -> Result<Desired, SyncError> {
    if let Some(sections) = &write.sections {
        let current = match existing {
            Some(bytes) => std::str::from_utf8(bytes)
                .map_err(|source| SyncError::InvalidUtf8 { path: write.path.clone(), source })?,
            None => "",
        };
        let patched = patch_sections(current, sections);
        if is_effectively_empty(&patched) {
            return Ok(Desired::Empty);
        }
        return Ok(Desired::Bytes(patched.into_bytes()));
    }
    if write.is_base64 {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(write.content.trim())
            .map_err(|source| SyncError::Base64 { path: write.path.clone(), source })?;
        return Ok(Desired::Bytes(bytes));
    }
    Ok(Desired::Bytes(write.content.clone().into_bytes()))
}

// ---------------------------------------------------------------------------
// atomic_write
// ---------------------------------------------------------------------------

/// Atomically write `bytes` to `path` unless the file already holds them.
pub(crate) fn atomic_write(
    path: &Path,
    bytes: &[u8],
    existing: Option<&[u8]>,
    dry_run: bool,
) -> Result<WriteResult, SyncError> {
    let tmp = PathBuf::from(format!("{}.loadout.tmp", path.display()));
    atomic_write_with_tmp(path, bytes, existing, dry_run, &tmp)
}

fn atomic_write_with_tmp(
    path: &Path,
    bytes: &[u8],
    existing: Option<&[u8]>,
    dry_run: bool,
    tmp: &Path,
) -> Result<WriteResult, SyncError> {
    if existing.map(sha256_hex) == Some(sha256_hex(bytes)) {
        tracing::debug!("unchanged: {}", path.display());
        return Ok(WriteResult::Unchanged { path: path.to_path_buf() });
    }

    if dry_run {
        tracing::info!("[dry-run] would write: {}", path.display());
        return Ok(WriteResult::WouldWrite { path: path.to_path_buf() });
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    if let Some(tmp_parent) = tmp.parent() {
        std::fs::create_dir_all(tmp_parent).map_err(|e| io_err(tmp_parent, e))?;
    }
    std::fs::write(tmp, bytes).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::info!("wrote: {}", path.display());
    Ok(WriteResult::Written { path: path.to_path_buf() })
}

fn delete_path(path: &Path, kind: DeleteKind, dry_run: bool) -> Result<Option<WriteResult>, SyncError> {
    let Ok(meta) = std::fs::symlink_metadata(path) else {
        return Ok(None);
    };
    if dry_run {
        tracing::info!("[dry-run] would delete: {}", path.display());
        return Ok(Some(WriteResult::WouldDelete { path: path.to_path_buf() }));
    }
    match kind {
        DeleteKind::Directory if meta.is_dir() => {
            std::fs::remove_dir_all(path).map_err(|e| io_err(path, e))?;
        }
        DeleteKind::File if meta.is_dir() => {
            tracing::warn!("not deleting directory {} (file delete requested)", path.display());
            return Ok(None);
        }
        _ => std::fs::remove_file(path).map_err(|e| io_err(path, e))?,
    }
    tracing::info!("deleted: {}", path.display());
    Ok(Some(WriteResult::Deleted { path: path.to_path_buf() }))
}

// ---------------------------------------------------------------------------
// apply_change_set
// ---------------------------------------------------------------------------

fn overlaps(entry: &DeleteEntry, write_path: &str) -> bool {
    match entry.kind {
        DeleteKind::File => entry.path == write_path,
        DeleteKind::Directory => {
            let dir = entry.path.trim_end_matches('/');
            write_path == dir || write_path.starts_with(&format!("{dir}/"))
        }
    }
}

/// Apply `change_set` to the checkout at `root`.
///
/// Writes are applied before deletes. Nothing is touched when any path is
/// unsafe.
pub fn apply_change_set(
    root: &Path,
    change_set: &ChangeSet,
    dry_run: bool,
) -> Result<ApplyReport, SyncError> {
    let writes = change_set
        .create_or_update
        .iter()
        .map(|w| Ok((w, resolve(root, &w.path)?)))
        .collect::<Result<Vec<_>, SyncError>>()?;
    let deletes = change_set
        .delete
        .iter()
        .map(|d| Ok((d, resolve(root, &d.path)?)))
        .collect::<Result<Vec<_>, SyncError>>()?;

    for (entry, _) in &deletes {
        for (write, _) in &writes {
            if overlaps(entry, &write.path) {
                tracing::warn!(
                    "{} is both written and deleted; the delete runs last",
                    write.path
                );
            }
        }
    }

    // Every write is computed before the first one lands.
    let planned = writes
        .into_iter()
        .map(|(write, path)| {
            let existing = read_existing(&path)?;
            let desired = desired_content(write, existing.as_deref())?;
            Ok((write, path, existing, desired))
        })
        .collect::<Result<Vec<_>, SyncError>>()?;

    let mut report = ApplyReport::default();
    for (write, path, existing, desired) in planned {
        match desired {
            Desired::Bytes(bytes) => {
                let result = atomic_write(&path, &bytes, existing.as_deref(), dry_run)?;
                report.digests.insert(write.path.clone(), sha256_hex(&bytes));
                report.results.push(result);
            }
            Desired::Empty if existing.is_some() => {
                if let Some(result) = delete_path(&path, DeleteKind::File, dry_run)? {
                    report.results.push(result);
                }
            }
            Desired::Empty => {}
        }
    }

    for (entry, path) in deletes {
        if let Some(result) = delete_path(&path, entry.kind, dry_run)? {
            report.digests.retain(|p, _| !overlaps(entry, p));
            report.results.push(result);
        }
    }

    tracing::info!(
        writes = change_set.create_or_update.len(),
        deletes = change_set.delete.len(),
        changed = report.changed(),
        dry_run,
        "applied change-set"
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
