//! Schema normalization into the canonical per-mode record
//!
//! Only Shiyu Defense has two wire schemas. Legacy payloads pass through
//! unchanged; v2 payloads are mapped onto the legacy floor-detail shape
//! that downstream consumers read:
//!
//! | v2 source | legacy field |
//! |---|---|
//! | each `fourth_layer_detail` entry | `all_floor_detail[]` with `layer_index = 6` |
//! | each `fifth_layer_detail` entry | `all_floor_detail[]` with `layer_index = 7` |
//! | (constant) | `max_layer = 7` |
//! | `brief.battle_time` | `fast_layer_time` |
//! | `brief.rating` | `rating_list = [{times: 1, rating}]` |
//! | `hadal_begin_time` / `hadal_end_time` | copied unchanged |
//!
//! Missing groups contribute no floor records; normalization never fails.

use crate::payload::{HadalInfoV2, LayerGroup, RawModePayload, ShiyuData};
use crate::Mode;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::debug;

/// Legacy layer index assigned to fourth-layer entries
pub const FOURTH_LAYER_INDEX: u8 = 6;

/// Legacy layer index assigned to fifth-layer entries
pub const FIFTH_LAYER_INDEX: u8 = 7;

/// Deepest legacy layer reported for any v2 payload
pub const V2_MAX_LAYER: u8 = 7;

/// Normalized in-memory record for one mode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalModeRecord {
    /// Mode this record belongs to
    pub mode: Mode,
    /// API result code
    pub retcode: i64,
    /// API message
    pub message: String,
    /// Normalized data object
    pub data: Map<String, Value>,
}

/// Normalize a raw payload into its canonical record
pub fn normalize(payload: RawModePayload) -> CanonicalModeRecord {
    let mode = payload.mode();
    match payload {
        RawModePayload::DeadlyAssault(env) | RawModePayload::VoidFront(env) => CanonicalModeRecord {
            mode,
            retcode: env.retcode,
            message: env.message,
            data: env.data,
        },
        RawModePayload::ShiyuDefense(env) => {
            let data = match env.data {
                ShiyuData::V1(data) => data,
                ShiyuData::V2 { data, info } => legacy_from_v2(data, &info),
            };
            CanonicalModeRecord {
                mode,
                retcode: env.retcode,
                message: env.message,
                data,
            }
        }
    }
}

/// Overlay the synthesized legacy fields onto a v2 data object
fn legacy_from_v2(mut data: Map<String, Value>, info: &HadalInfoV2) -> Map<String, Value> {
    let mut floors = Vec::new();
    if let Some(group) = &info.fourth_layer_detail {
        floors.extend(floor_details(group, FOURTH_LAYER_INDEX));
    }
    if let Some(group) = &info.fifth_layer_detail {
        floors.extend(floor_details(group, FIFTH_LAYER_INDEX));
    }

    debug!(floors = floors.len(), "Synthesized legacy floor details from v2 payload");

    let brief = info.brief.clone().unwrap_or_default();
    let rating_list = match brief.rating {
        Some(rating) => vec![json!({"times": 1, "rating": rating})],
        None => Vec::new(),
    };

    data.insert("all_floor_detail".to_string(), Value::Array(floors));
    data.insert("max_layer".to_string(), json!(V2_MAX_LAYER));
    data.insert(
        "fast_layer_time".to_string(),
        brief.battle_time.unwrap_or_else(|| json!(0)),
    );
    data.insert("rating_list".to_string(), Value::Array(rating_list));
    data.insert(
        "hadal_begin_time".to_string(),
        info.hadal_begin_time.clone().unwrap_or(Value::Null),
    );
    data.insert(
        "hadal_end_time".to_string(),
        info.hadal_end_time.clone().unwrap_or(Value::Null),
    );
    data
}

/// One legacy floor record per team entry of a group
fn floor_details(group: &LayerGroup, layer_index: u8) -> Vec<Value> {
    let buffs = match &group.buffer {
        Some(Value::Array(buffs)) => buffs.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(buff) => vec![buff.clone()],
    };

    group
        .layer_challenge_info_list
        .iter()
        .map(|entry| {
            json!({
                "layer_index": layer_index,
                "rating": group.rating.clone().unwrap_or(Value::Null),
                "layer_id": entry.layer_id.clone().unwrap_or(Value::Null),
                "buffs": buffs.clone(),
                "node_1": {
                    "avatars": entry.avatar_list.clone(),
                    "buddy": entry.buddy.clone().unwrap_or_else(placeholder_buddy),
                    "element_type_list": [],
                    "monster_info": {"level": 0, "list": []},
                    "battle_time": entry.battle_time.clone().unwrap_or_else(|| json!(0)),
                },
                "node_2": empty_node(),
                "zone_name": "",
                "floor_challenge_time": group.challenge_time.clone().unwrap_or(Value::Null),
            })
        })
        .collect()
}

/// Neutral second half: v2 data only ever fills `node_1`
fn empty_node() -> Value {
    json!({
        "avatars": [],
        "buddy": placeholder_buddy(),
        "element_type_list": [],
        "monster_info": {"level": 0, "list": []},
        "battle_time": 0,
    })
}

fn placeholder_buddy() -> Value {
    json!({"id": 0, "rarity": "", "level": 0, "bangboo_rectangle_url": ""})
}
