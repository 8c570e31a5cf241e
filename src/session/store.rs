//! Disk persistence for interactively approved prefixes.
//!
//! Goal: let a single local user build a trusted command set over time,
//! across restarts, without that file ever being consulted by a served
//! deployment. Loading is gated on [`ExecutionMode::Interactive`]; saving
//! merges with what is already on disk rather than overwriting it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::ExecutionMode;

/// On-disk schema: a flat list of approved prefix strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ApprovedPrefixesFile {
    approved_prefixes: Vec<String>,
}

/// Default location: `~/.cmdgate/approved_prefixes.json`.
pub fn default_store_path() -> PathBuf {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".cmdgate").join("approved_prefixes.json")
}

/// Store of prefixes approved in an interactive local session.
#[derive(Debug, Clone)]
pub struct ApprovedPrefixStore {
    mode: ExecutionMode,
    path: PathBuf,
}

impl ApprovedPrefixStore {
    pub fn new(mode: ExecutionMode, path: Option<PathBuf>) -> Self {
        Self {
            mode,
            path: path.unwrap_or_else(default_store_path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the approved prefixes.
    ///
    /// Returns an empty list without touching the filesystem in
    /// [`ExecutionMode::Served`], and for a missing file in interactive
    /// mode (a fresh user simply has no approvals yet). A corrupt file is
    /// reported as an empty list with a warning rather than an error, so a
    /// damaged store can never block the session.
    pub fn load(&self) -> Vec<String> {
        if self.mode != ExecutionMode::Interactive {
            return Vec::new();
        }
        if !self.path.exists() {
            return Vec::new();
        }
        match read_file(&self.path) {
            Ok(file) => file.approved_prefixes,
            Err(e) => {
                warn!("failed to load approved prefixes from {}: {e:#}", self.path.display());
                Vec::new()
            }
        }
    }

    /// Persist newly approved prefixes, merged with the existing on-disk
    /// set, sorted, and written atomically.
    ///
    /// Saving is only reached from the interactive approval flow, so it is
    /// not gated on mode the way loading is.
    pub fn save(&self, prefixes: &[String]) -> Result<()> {
        let mut merged = match read_file(&self.path) {
            Ok(file) => file.approved_prefixes,
            Err(_) => Vec::new(),
        };
        for prefix in prefixes {
            if !merged.iter().any(|existing| existing == prefix) {
                merged.push(prefix.clone());
            }
        }
        merged.sort();

        let file = ApprovedPrefixesFile {
            approved_prefixes: merged,
        };
        let data = serde_json::to_vec_pretty(&file).context("failed to serialize approved prefixes")?;
        write_atomic(&self.path, &data)
    }
}

fn read_file(path: &Path) -> Result<ApprovedPrefixesFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file: ApprovedPrefixesFile = serde_json::from_str(&raw)
        .with_context(|| format!("invalid approved-prefix JSON at {}", path.display()))?;
    Ok(file)
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create store directory: {}", parent.display()))?;
    }
    Ok(())
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    ensure_parent_dir(path)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data).with_context(|| format!("failed to write temp file: {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("failed to replace {} with {}", path.display(), tmp.display()))?;
    Ok(())
}
