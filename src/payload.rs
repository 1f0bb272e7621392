//! Raw per-mode API payloads
//!
//! A response body is classified exactly once, when it enters the pipeline.
//! The Shiyu Defense endpoint answers with either the legacy floor-detail
//! schema or the v2 "Hadal" schema; the decision is recorded in
//! [`ShiyuData`] and every later stage matches on it instead of probing the
//! JSON again.

use crate::Mode;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Version tag marking a Shiyu payload that carries the v2 sub-object
pub const HADAL_V2_TAG: &str = "v2";

/// Field holding the Shiyu schema version tag
pub const HADAL_VERSION_FIELD: &str = "hadal_ver";

/// Field holding the Shiyu v2 sub-object
pub const HADAL_V2_FIELD: &str = "hadal_info_v2";

/// Errors raised while classifying a response body
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// Body is not a JSON object
    #[error("response body is not a JSON object")]
    NotAnObject,

    /// Body has no `data` object
    #[error("response has no data object")]
    MissingData,
}

/// Common response envelope: `{retcode, message, data}`
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    /// API result code (0 on success)
    pub retcode: i64,
    /// API message
    pub message: String,
    /// Mode-specific payload
    pub data: T,
}

/// Raw payload for one mode, classified at ingestion
#[derive(Debug, Clone, PartialEq)]
pub enum RawModePayload {
    /// Deadly Assault response
    DeadlyAssault(Envelope<Map<String, Value>>),
    /// Shiyu Defense response (legacy or v2)
    ShiyuDefense(Envelope<ShiyuData>),
    /// Void Front response
    VoidFront(Envelope<Map<String, Value>>),
}

/// Shiyu Defense payload, split by wire schema
#[derive(Debug, Clone, PartialEq)]
pub enum ShiyuData {
    /// Legacy floor-detail schema, stored as received
    V1(Map<String, Value>),
    /// v2 schema: the full data object plus its parsed v2 sub-object
    V2 {
        /// The complete `data` object, v2 sub-object included
        data: Map<String, Value>,
        /// Parsed `hadal_info_v2`
        info: HadalInfoV2,
    },
}

impl ShiyuData {
    /// Classify a Shiyu `data` object
    ///
    /// The payload is v2 only if the version tag equals [`HADAL_V2_TAG`]
    /// and the v2 sub-object is present; anything else is legacy.
    pub fn classify(data: Map<String, Value>) -> Self {
        let tagged_v2 = data
            .get(HADAL_VERSION_FIELD)
            .and_then(Value::as_str)
            .is_some_and(|v| v == HADAL_V2_TAG);

        let sub_object = match data.get(HADAL_V2_FIELD) {
            Some(Value::Object(info)) if tagged_v2 => Some(info.clone()),
            _ => None,
        };

        match sub_object {
            Some(info) => ShiyuData::V2 {
                info: serde_json::from_value(Value::Object(info)).unwrap_or_default(),
                data,
            },
            None => ShiyuData::V1(data),
        }
    }

    /// The complete `data` object regardless of schema
    pub fn data(&self) -> &Map<String, Value> {
        match self {
            ShiyuData::V1(data) => data,
            ShiyuData::V2 { data, .. } => data,
        }
    }

    /// Whether this payload uses the v2 schema
    pub fn is_v2(&self) -> bool {
        matches!(self, ShiyuData::V2 { .. })
    }
}

/// Shiyu v2 sub-object
///
/// Every field is optional and leniently decoded: a field with an
/// unexpected type decodes to its default instead of failing the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HadalInfoV2 {
    /// Season identifier of the v2 schedule
    #[serde(default)]
    pub zone_id: Option<Value>,
    /// Structured season start
    #[serde(default)]
    pub hadal_begin_time: Option<Value>,
    /// Structured season end
    #[serde(default)]
    pub hadal_end_time: Option<Value>,
    /// Season summary
    #[serde(default, deserialize_with = "lenient")]
    pub brief: Option<HadalBrief>,
    /// Fourth layer group
    #[serde(default, deserialize_with = "lenient")]
    pub fourth_layer_detail: Option<LayerGroup>,
    /// Fifth layer group (the API spells it `fitfh_layer_detail`)
    #[serde(default, alias = "fitfh_layer_detail", deserialize_with = "lenient")]
    pub fifth_layer_detail: Option<LayerGroup>,
}

/// v2 season summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HadalBrief {
    /// Overall rating (`S`, `A`, ...)
    #[serde(default)]
    pub rating: Option<Value>,
    /// Fastest clear time in seconds
    #[serde(default)]
    pub battle_time: Option<Value>,
    /// Total score
    #[serde(default)]
    pub score: Option<Value>,
}

/// One v2 layer group with its per-team challenge entries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerGroup {
    /// Rating shared by every entry of the group
    #[serde(default)]
    pub rating: Option<Value>,
    /// Buff shared by every entry of the group
    #[serde(default)]
    pub buffer: Option<Value>,
    /// Structured time of the group's challenge
    #[serde(default)]
    pub challenge_time: Option<Value>,
    /// Per-team entries; the count varies between seasons
    #[serde(default, deserialize_with = "lenient")]
    pub layer_challenge_info_list: Vec<LayerChallenge>,
}

/// One team's run inside a v2 layer group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerChallenge {
    /// Layer identifier
    #[serde(default)]
    pub layer_id: Option<Value>,
    /// Agents used
    #[serde(default, deserialize_with = "lenient")]
    pub avatar_list: Vec<Value>,
    /// Bangboo used
    #[serde(default)]
    pub buddy: Option<Value>,
    /// Clear time in seconds
    #[serde(default)]
    pub battle_time: Option<Value>,
}

/// Decode a field, falling back to its default on a type mismatch
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

impl RawModePayload {
    /// Classify a full response body (`{retcode, message, data}`) for a mode
    pub fn from_response(mode: Mode, body: Value) -> Result<Self, PayloadError> {
        let Value::Object(mut body) = body else {
            return Err(PayloadError::NotAnObject);
        };

        let retcode = body.get("retcode").and_then(Value::as_i64).unwrap_or(0);
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match body.remove("data") {
            Some(Value::Object(data)) => Ok(Self::from_parts(mode, retcode, message, data)),
            _ => Err(PayloadError::MissingData),
        }
    }

    /// Build a payload from an already-split envelope
    pub fn from_parts(mode: Mode, retcode: i64, message: String, data: Map<String, Value>) -> Self {
        match mode {
            Mode::DeadlyAssault => RawModePayload::DeadlyAssault(Envelope {
                retcode,
                message,
                data,
            }),
            Mode::ShiyuDefense => RawModePayload::ShiyuDefense(Envelope {
                retcode,
                message,
                data: ShiyuData::classify(data),
            }),
            Mode::VoidFront => RawModePayload::VoidFront(Envelope {
                retcode,
                message,
                data,
            }),
        }
    }

    /// Mode this payload belongs to
    pub fn mode(&self) -> Mode {
        match self {
            RawModePayload::DeadlyAssault(_) => Mode::DeadlyAssault,
            RawModePayload::ShiyuDefense(_) => Mode::ShiyuDefense,
            RawModePayload::VoidFront(_) => Mode::VoidFront,
        }
    }

    /// The `data` object as received
    pub fn data(&self) -> &Map<String, Value> {
        match self {
            RawModePayload::DeadlyAssault(env) | RawModePayload::VoidFront(env) => &env.data,
            RawModePayload::ShiyuDefense(env) => env.data.data(),
        }
    }
}
