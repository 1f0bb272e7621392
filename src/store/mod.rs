//! File-system artifact store
//!
//! Layout under the data root:
//!
//! ```text
//! {root}/
//!   deadly-assault/deadly-assault-42.json
//!   shiyu-defense/shiyu-defense-61001.json
//!   void-front/void-front-3.json
//!   latest/deadly_assault_{uid}_latest.json
//!   .run.lock
//! ```
//!
//! Season files are only rewritten when their content changes; the latest
//! mirror is rewritten on every successful fetch.

use serde::Serialize;
use serde_json::Value;
use std::cmp::Reverse;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::canonical::content_digest;
use crate::change::{detect, ChangeStatus};
use crate::season::{parse_windowed_file_name, simple_file_name, windowed_file_name, SeasonWindow};
use crate::Mode;

pub mod artifact;
pub mod lock;
pub mod migrate;

pub use artifact::{format_export_date, Metadata, StoredArtifact};
pub use lock::RunLock;
pub use migrate::{
    is_legacy_file_name, migrate_legacy_files, MigrationReport, RenamedFile, SkipReason,
    SkippedFile,
};

/// Directory holding the per-player latest mirrors
pub const LATEST_DIR: &str = "latest";

/// Maximum artifact size accepted on read (50 MiB)
pub const MAX_ARTIFACT_SIZE: u64 = 50 * 1024 * 1024;

/// Artifact store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// File system error
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// File exists but is not a valid artifact
    #[error("corrupt artifact {path}: {reason}")]
    Corrupt {
        /// Artifact path
        path: PathBuf,
        /// Parse failure
        reason: String,
    },

    /// File exceeds [`MAX_ARTIFACT_SIZE`]
    #[error("artifact {path} is too large: {size} bytes (max {max})")]
    TooLarge {
        /// Artifact path
        path: PathBuf,
        /// Actual size
        size: u64,
        /// Limit
        max: u64,
    },

    /// Artifact could not be serialized
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Another run holds the data root
    #[error("another run holds the lock at {0}")]
    Locked(PathBuf),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Naming scheme for season files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileNaming {
    /// `{mode}-{seasonId}.json`
    #[default]
    SeasonId,
    /// `{mode}-{start}-{end}.json`
    Window,
}

impl FileNaming {
    /// File name for a season under this scheme
    pub fn file_name(&self, mode: Mode, season_id: Option<&str>, window: &SeasonWindow) -> String {
        match self {
            FileNaming::SeasonId => simple_file_name(mode, season_id),
            FileNaming::Window => windowed_file_name(mode, window),
        }
    }
}

impl fmt::Display for FileNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileNaming::SeasonId => f.write_str("season-id"),
            FileNaming::Window => f.write_str("window"),
        }
    }
}

impl FromStr for FileNaming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "season-id" | "season_id" | "id" => Ok(FileNaming::SeasonId),
            "window" | "windowed" => Ok(FileNaming::Window),
            _ => Err(format!("unknown file naming '{s}' (expected season-id or window)")),
        }
    }
}

/// Outcome of persisting a season artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistStatus {
    /// File was written
    Written {
        /// Written file
        path: PathBuf,
        /// Content digest of the written artifact
        digest: String,
    },
    /// Stored content was identical; nothing written
    Unchanged {
        /// Existing file
        path: PathBuf,
    },
}

impl PersistStatus {
    /// Path of the season file
    pub fn path(&self) -> &Path {
        match self {
            PersistStatus::Written { path, .. } | PersistStatus::Unchanged { path } => path,
        }
    }

    /// Whether a write happened
    pub fn is_written(&self) -> bool {
        matches!(self, PersistStatus::Written { .. })
    }
}

/// File-system backed artifact store
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Store rooted at `root`; directories are created on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Data root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding a mode's season files
    pub fn mode_dir(&self, mode: Mode) -> PathBuf {
        self.root.join(mode.file_stem())
    }

    /// Path of a season file
    pub fn artifact_path(&self, mode: Mode, file_name: &str) -> PathBuf {
        self.mode_dir(mode).join(file_name)
    }

    /// Path of a player's latest mirror for a mode
    pub fn latest_mirror_path(&self, mode: Mode, uid: &str) -> PathBuf {
        self.root
            .join(LATEST_DIR)
            .join(format!("{}_{}_latest.json", mode.type_name(), uid))
    }

    /// Read and parse a JSON file, bounded by [`MAX_ARTIFACT_SIZE`]
    pub fn read_value(&self, path: &Path) -> StoreResult<Value> {
        let metadata = std::fs::metadata(path).map_err(|e| StoreError::io(path, e))?;
        if metadata.len() > MAX_ARTIFACT_SIZE {
            return Err(StoreError::TooLarge {
                path: path.to_path_buf(),
                size: metadata.len(),
                max: MAX_ARTIFACT_SIZE,
            });
        }

        let contents = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Read one artifact
    pub fn read_artifact(&self, path: &Path) -> StoreResult<StoredArtifact> {
        let value = self.read_value(path)?;
        serde_json::from_value(value).map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Season files of a mode, ordered by file name alone
    ///
    /// Windowed names sort by end date then start date, newest first, and
    /// come before every other name. Simple names with a numeric season id
    /// follow, highest id first, and the rest come last in reverse
    /// lexicographic order. A missing mode directory yields an empty list.
    ///
    /// Only the name is looked at; [`read_entries`](Self::read_entries)
    /// orders by the window stored in each file.
    pub fn list_files(&self, mode: Mode) -> StoreResult<Vec<PathBuf>> {
        let dir = self.mode_dir(mode);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&dir, e)),
        };

        let mut windowed: Vec<(SeasonWindow, String)> = Vec::new();
        let mut others: Vec<String> = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&dir, e))?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !name.ends_with(".json") {
                continue;
            }

            match parse_windowed_file_name(&name) {
                Some((parsed_mode, window)) if parsed_mode == mode => windowed.push((window, name)),
                _ => others.push(name),
            }
        }

        windowed.sort_by_key(|(window, name)| {
            (Reverse(window.end.clone()), Reverse(window.start.clone()), Reverse(name.clone()))
        });
        others.sort_by_key(|name| Reverse(simple_name_key(mode, name)));

        Ok(windowed
            .into_iter()
            .map(|(_, name)| name)
            .chain(others)
            .map(|name| dir.join(name))
            .collect())
    }

    /// Every readable artifact of a mode with its path, newest season first
    ///
    /// Artifacts sort by the season window derived from their content (end,
    /// then start, newest first), whatever naming scheme their files use.
    /// Artifacts without a window follow in [`list_files`](Self::list_files)
    /// order. Unreadable files are skipped with a warning.
    pub fn read_entries(&self, mode: Mode) -> StoreResult<Vec<(PathBuf, StoredArtifact)>> {
        let mut entries = Vec::new();
        for path in self.list_files(mode)? {
            match self.read_artifact(&path) {
                Ok(artifact) => entries.push((artifact.season_window(), path, artifact)),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable artifact"),
            }
        }

        // stable: ties keep the file name order
        entries.sort_by(|(a, ..), (b, ..)| (&b.end, &b.start).cmp(&(&a.end, &a.start)));

        Ok(entries
            .into_iter()
            .map(|(_, path, artifact)| (path, artifact))
            .collect())
    }

    /// Every readable artifact of a mode, newest season first
    pub fn read_all(&self, mode: Mode) -> StoreResult<Vec<StoredArtifact>> {
        Ok(self
            .read_entries(mode)?
            .into_iter()
            .map(|(_, artifact)| artifact)
            .collect())
    }

    /// Newest readable artifact of a mode, with its path
    pub fn read_latest_entry(
        &self,
        mode: Mode,
    ) -> StoreResult<Option<(PathBuf, StoredArtifact)>> {
        Ok(self.read_entries(mode)?.into_iter().next())
    }

    /// Newest readable artifact of a mode
    pub fn read_latest(&self, mode: Mode) -> StoreResult<Option<StoredArtifact>> {
        Ok(self.read_latest_entry(mode)?.map(|(_, artifact)| artifact))
    }

    /// A player's latest mirror for a mode, if present
    pub fn read_latest_mirror(&self, mode: Mode, uid: &str) -> StoreResult<Option<StoredArtifact>> {
        let path = self.latest_mirror_path(mode, uid);
        if !path.exists() {
            return Ok(None);
        }
        self.read_artifact(&path).map(Some)
    }

    /// Write a season file unconditionally
    pub fn write(
        &self,
        mode: Mode,
        artifact: &StoredArtifact,
        file_name: &str,
    ) -> StoreResult<PersistStatus> {
        let path = self.artifact_path(mode, file_name);
        let digest = self.write_atomic(&path, &artifact.to_value())?;
        Ok(PersistStatus::Written { path, digest })
    }

    /// Write a season file only if its content differs from the stored one
    ///
    /// A stored file that cannot be read or parsed counts as changed and is
    /// replaced.
    pub fn write_if_changed(
        &self,
        mode: Mode,
        artifact: &StoredArtifact,
        file_name: &str,
    ) -> StoreResult<PersistStatus> {
        let path = self.artifact_path(mode, file_name);
        let candidate = artifact.to_value();

        let existing = if path.exists() {
            match self.read_value(&path) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Existing artifact unreadable, replacing it"
                    );
                    None
                }
            }
        } else {
            None
        };

        match detect(existing.as_ref(), &candidate) {
            ChangeStatus::Unchanged => {
                info!(mode = %mode, path = %path.display(), "Artifact unchanged, skipping write");
                Ok(PersistStatus::Unchanged { path })
            }
            status => {
                debug!(mode = %mode, ?status, "Artifact needs write");
                let digest = self.write_atomic(&path, &candidate)?;
                Ok(PersistStatus::Written { path, digest })
            }
        }
    }

    /// Overwrite the latest mirror of the artifact's player
    pub fn write_latest_mirror(
        &self,
        mode: Mode,
        artifact: &StoredArtifact,
    ) -> StoreResult<PathBuf> {
        let path = self.latest_mirror_path(mode, &artifact.metadata.uid);
        self.write_atomic(&path, &artifact.to_value())?;
        Ok(path)
    }

    /// Pretty-print `value` to `path` through a temp file and rename
    ///
    /// Returns the content digest of the written value.
    fn write_atomic(&self, path: &Path, value: &Value) -> StoreResult<String> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;

        let mut json = serde_json::to_string_pretty(value)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        json.push('\n');

        let mut temp_file =
            tempfile::NamedTempFile::new_in(parent).map_err(|e| StoreError::io(parent, e))?;
        temp_file
            .write_all(json.as_bytes())
            .map_err(|e| StoreError::io(temp_file.path(), e))?;
        temp_file.flush().map_err(|e| StoreError::io(path, e))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| StoreError::io(path, e))?;
        temp_file
            .persist(path)
            .map_err(|e| StoreError::io(path, e.error))?;

        if let Ok(dir) = std::fs::File::open(parent) {
            let _ = dir.sync_all();
        }

        let digest = content_digest(value);
        info!(path = %path.display(), bytes = json.len(), digest = %digest, "Artifact written");
        Ok(digest)
    }
}

/// Sort key of a non-windowed file name: numeric season id, then the name
fn simple_name_key(mode: Mode, name: &str) -> (Option<u64>, String) {
    let id = name
        .strip_prefix(mode.file_stem())
        .and_then(|rest| rest.strip_prefix('-'))
        .and_then(|rest| rest.strip_suffix(".json"))
        .and_then(|id| id.parse::<u64>().ok());
    (id, name.to_string())
}
