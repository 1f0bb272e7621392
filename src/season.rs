//! Season identification and artifact file names
//!
//! Each payload yields a season identifier and a start/end window. Both are
//! used for file naming and for deciding which stored artifact a fresh
//! payload is compared against.
//!
//! File name forms:
//! - simple: `{mode}-{seasonId|unknown-id}.json`
//! - windowed: `{mode}-{start|unknown-start}-{end|unknown-end}.json`

use crate::payload::{RawModePayload, ShiyuData};
use crate::time_codec;
use crate::Mode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Placeholder for an underivable season identifier
pub const UNKNOWN_ID: &str = "unknown-id";
/// Placeholder for an underivable window start
pub const UNKNOWN_START: &str = "unknown-start";
/// Placeholder for an underivable window end
pub const UNKNOWN_END: &str = "unknown-end";

const JSON_EXTENSION: &str = ".json";

/// Start/end dates (`YYYY-MM-DD`) of a season
///
/// When both legs are present, `start <= end` holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonWindow {
    /// First day of the season
    pub start: Option<String>,
    /// Last day of the season
    pub end: Option<String>,
}

impl SeasonWindow {
    /// Build a window from two optional legs
    ///
    /// An inverted window (start after end) is undecidable: both legs are
    /// dropped rather than guessing which one is wrong.
    pub fn new(start: Option<String>, end: Option<String>) -> Self {
        if let (Some(s), Some(e)) = (&start, &end) {
            // canonical dates compare correctly as strings
            if s > e {
                warn!(start = %s, end = %e, "Season window is inverted, treating as unknown");
                return Self::default();
            }
        }
        Self { start, end }
    }

    /// Whether both legs are known
    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Whether neither leg is known
    pub fn is_unknown(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Resolve the season identifier of a payload
///
/// - Deadly Assault: `data.zone_id`
/// - Shiyu Defense: the v2 sub-object's `zone_id` for v2 payloads, else `data.schedule_id`
/// - Void Front: `data.void_front_battle_abstract_info_brief.void_front_id`
pub fn resolve_season_id(payload: &RawModePayload) -> Option<String> {
    match payload {
        RawModePayload::DeadlyAssault(env) => id_value(env.data.get("zone_id")),
        RawModePayload::ShiyuDefense(env) => match &env.data {
            ShiyuData::V2 { info, .. } => id_value(info.zone_id.as_ref()),
            ShiyuData::V1(data) => id_value(data.get("schedule_id")),
        },
        RawModePayload::VoidFront(env) => id_value(
            env.data
                .get("void_front_battle_abstract_info_brief")
                .and_then(|brief| brief.get("void_front_id")),
        ),
    }
}

/// Resolve the season window of a payload
///
/// Void Front has no season window; its window is always unknown.
pub fn resolve_season_window(payload: &RawModePayload) -> SeasonWindow {
    match payload {
        RawModePayload::DeadlyAssault(env) => SeasonWindow::new(
            time_codec::to_canonical_date(env.data.get("start_time")),
            time_codec::to_canonical_date(env.data.get("end_time")),
        ),
        RawModePayload::ShiyuDefense(env) => match &env.data {
            ShiyuData::V2 { data, info } => SeasonWindow::new(
                time_codec::to_canonical_date(info.hadal_begin_time.as_ref())
                    .or_else(|| shiyu_leg(data, "hadal_begin_time", "begin_time")),
                time_codec::to_canonical_date(info.hadal_end_time.as_ref())
                    .or_else(|| shiyu_leg(data, "hadal_end_time", "end_time")),
            ),
            ShiyuData::V1(data) => SeasonWindow::new(
                shiyu_leg(data, "hadal_begin_time", "begin_time"),
                shiyu_leg(data, "hadal_end_time", "end_time"),
            ),
        },
        RawModePayload::VoidFront(_) => SeasonWindow::default(),
    }
}

/// One Shiyu window leg: the structured Hadal timestamp, else the
/// epoch-or-date string
///
/// Each leg falls back on its own, so a payload with only one structured
/// timestamp still yields both dates.
fn shiyu_leg(data: &Map<String, Value>, structured: &str, plain: &str) -> Option<String> {
    time_codec::to_canonical_date(data.get(structured))
        .or_else(|| time_codec::to_canonical_date(data.get(plain)))
}

/// Render an identifier value (number or non-empty string)
fn id_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Build the simple per-season file name
pub fn simple_file_name(mode: Mode, season_id: Option<&str>) -> String {
    let id = season_id
        .map(sanitize_component)
        .unwrap_or_else(|| UNKNOWN_ID.to_string());
    format!("{}-{}{}", mode.file_stem(), id, JSON_EXTENSION)
}

/// Build the windowed file name used by the historical archive
pub fn windowed_file_name(mode: Mode, window: &SeasonWindow) -> String {
    format!(
        "{}-{}-{}{}",
        mode.file_stem(),
        window.start.as_deref().unwrap_or(UNKNOWN_START),
        window.end.as_deref().unwrap_or(UNKNOWN_END),
        JSON_EXTENSION
    )
}

/// Recover the mode and window from a windowed file name
///
/// Returns `None` for names that are not in the windowed form, including
/// simple per-season names.
pub fn parse_windowed_file_name(file_name: &str) -> Option<(Mode, SeasonWindow)> {
    let stem = file_name.strip_suffix(JSON_EXTENSION)?;

    Mode::ALL.into_iter().find_map(|mode| {
        let rest = stem
            .strip_prefix(mode.file_stem())?
            .strip_prefix('-')?;

        let (start, rest) = match rest.strip_prefix(UNKNOWN_START) {
            Some(rest) => (None, rest),
            None => {
                let (date, rest) = (rest.get(..10)?, rest.get(10..)?);
                time_codec::parse_canonical_date(date)?;
                (Some(date.to_string()), rest)
            }
        };

        let end = match rest.strip_prefix('-')? {
            UNKNOWN_END => None,
            date => {
                time_codec::parse_canonical_date(date)?;
                Some(date.to_string())
            }
        };

        Some((mode, SeasonWindow { start, end }))
    })
}

/// Make an identifier safe to embed in a file name
///
/// Path separators and `..` are replaced so an identifier can never escape
/// the mode directory.
fn sanitize_component(id: &str) -> String {
    id.replace("..", "__").replace(['/', '\\', ':'], "_")
}
