//! One-time rename of legacy `month-week` files
//!
//! Older runs named season files `{mode}-{YYYY}-{MM}-w{N}.json` (or
//! `...-week{N}.json`). The week number says nothing reliable about the
//! season, so each file's window is re-derived from its content and the file
//! is renamed to the windowed scheme. Files that cannot be placed are left
//! where they are and reported.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{ArtifactStore, StoreError, StoreResult};
use crate::payload::RawModePayload;
use crate::season::{resolve_season_window, windowed_file_name};
use crate::Mode;

/// Why a legacy file was left in place
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum SkipReason {
    /// File could not be read as an artifact
    Unreadable(String),
    /// Content has no complete season window
    WindowUndecidable,
    /// A file with the canonical name already exists
    TargetExists(PathBuf),
}

/// A legacy file that was not renamed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    /// Legacy file
    pub path: PathBuf,
    /// Why it was skipped
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// A legacy file that was (or would be) renamed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamedFile {
    /// Legacy file
    pub from: PathBuf,
    /// Canonical name
    pub to: PathBuf,
}

/// Result of a migration pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Whether files were only planned, not renamed
    pub dry_run: bool,
    /// Renamed files
    pub renamed: Vec<RenamedFile>,
    /// Files left in place
    pub skipped: Vec<SkippedFile>,
}

impl MigrationReport {
    /// Whether no legacy file was found
    pub fn is_empty(&self) -> bool {
        self.renamed.is_empty() && self.skipped.is_empty()
    }
}

/// Whether a file name follows the legacy `month-week` scheme for `mode`
pub fn is_legacy_file_name(mode: Mode, file_name: &str) -> bool {
    let Some(rest) = file_name
        .strip_suffix(".json")
        .and_then(|stem| stem.strip_prefix(mode.file_stem()))
        .and_then(|rest| rest.strip_prefix('-'))
    else {
        return false;
    };

    let mut parts = rest.splitn(3, '-');
    let (Some(year), Some(month), Some(week)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    let digits = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_digit());
    let week_number = week
        .strip_prefix("week")
        .or_else(|| week.strip_prefix('w'))
        .unwrap_or_default();

    digits(year, 4)
        && digits(month, 2)
        && !week_number.is_empty()
        && week_number.bytes().all(|b| b.is_ascii_digit())
}

/// Rename every legacy file of `modes` to the windowed scheme
///
/// With `dry_run`, the report lists the planned renames and nothing is
/// touched.
pub fn migrate_legacy_files(
    store: &ArtifactStore,
    modes: &[Mode],
    dry_run: bool,
) -> StoreResult<MigrationReport> {
    let mut report = MigrationReport {
        dry_run,
        ..Default::default()
    };

    for &mode in modes {
        for path in legacy_files(store, mode)? {
            migrate_file(store, mode, path, dry_run, &mut report)?;
        }
    }

    info!(
        renamed = report.renamed.len(),
        skipped = report.skipped.len(),
        dry_run,
        "Legacy migration finished"
    );
    Ok(report)
}

fn legacy_files(store: &ArtifactStore, mode: Mode) -> StoreResult<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = store
        .list_files(mode)?
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| is_legacy_file_name(mode, name))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn migrate_file(
    store: &ArtifactStore,
    mode: Mode,
    path: PathBuf,
    dry_run: bool,
    report: &mut MigrationReport,
) -> StoreResult<()> {
    // only the data object matters; legacy files may predate the metadata block
    let payload = match store
        .read_value(&path)
        .map_err(|e| e.to_string())
        .and_then(|value| RawModePayload::from_response(mode, value).map_err(|e| e.to_string()))
    {
        Ok(payload) => payload,
        Err(reason) => {
            warn!(
                path = %path.display(),
                error = %reason,
                "Legacy file unreadable, leaving it in place"
            );
            report.skipped.push(SkippedFile {
                path,
                reason: SkipReason::Unreadable(reason),
            });
            return Ok(());
        }
    };

    let window = resolve_season_window(&payload);
    if !window.is_complete() {
        warn!(path = %path.display(), "Season window undecidable, leaving file in place");
        report.skipped.push(SkippedFile {
            path,
            reason: SkipReason::WindowUndecidable,
        });
        return Ok(());
    }

    let target = store.artifact_path(mode, &windowed_file_name(mode, &window));
    let planned = report.renamed.iter().any(|r| r.to == target);
    if target.exists() || planned {
        warn!(
            path = %path.display(),
            target = %target.display(),
            "Target exists, leaving file in place"
        );
        report.skipped.push(SkippedFile {
            path,
            reason: SkipReason::TargetExists(target),
        });
        return Ok(());
    }

    if !dry_run {
        rename(&path, &target)?;
    }
    info!(from = %path.display(), to = %target.display(), dry_run, "Legacy file renamed");
    report.renamed.push(RenamedFile { from: path, to: target });
    Ok(())
}

fn rename(from: &Path, to: &Path) -> StoreResult<()> {
    std::fs::rename(from, to).map_err(|e| StoreError::io(from, e))
}
