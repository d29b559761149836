use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Swap {
    Replace,
    Merge,
}

impl Default for Swap {
    fn default() -> Self {
        Self::Replace
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patch {
    pub target: String,
    #[serde(default)]
    pub swap: Swap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
}

impl Patch {
    pub fn payload(target: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            target: target.into(),
            swap: Swap::Replace,
            html: None,
            payload: Some(payload),
            trigger: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiUpdate {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    pub patches: Vec<Patch>,
}

impl UiUpdate {
    pub fn new(event: impl Into<String>, patches: Vec<Patch>) -> Self {
        Self {
            event: event.into(),
            payload: None,
            patches,
        }
    }
}

pub mod targets {
    pub const CITYMAP_GRID: &str = "citymap.grid";
    pub const CITYMAP_SIDEBAR: &str = "citymap.sidebar";
    pub const STATS_CHART: &str = "stats.chart";
}

// ---------------------------------------------------------------------------
// City catalog entries, as served by the game's asset catalog
// ---------------------------------------------------------------------------

/// A building type from the game's catalog.
///
/// Two shapes are in circulation: older entries carry `width`/`length` and a
/// `requirements` object, newer ones nest everything under
/// `components.AllAge`. Both deserialize into this struct; the engine decides
/// which one it is looking at.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCityEntity {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub is_multi_age: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<RawRequirements>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<RawComponents>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRequirements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_connection_level: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawComponents {
    #[serde(rename = "AllAge", default, skip_serializing_if = "Option::is_none")]
    pub all_age: Option<RawAllAgeComponents>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAllAgeComponents {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<RawPlacementComponent>,
    #[serde(
        rename = "streetConnectionRequirement",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub street_connection_requirement: Option<RawStreetRequirement>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPlacementComponent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<RawSize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSize {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawStreetRequirement {
    #[serde(rename = "requiredLevel", default, skip_serializing_if = "Option::is_none")]
    pub required_level: Option<i64>,
}

// ---------------------------------------------------------------------------
// City map entries (one per building a city owns)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCityMapEntity {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub cityentity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default)]
    pub state: RawEntityState,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEntityState {
    #[serde(rename = "__class__", default)]
    pub class: String,
    #[serde(rename = "pausedAt", default, skip_serializing_if = "Option::is_none")]
    pub paused_at: Option<serde_json::Value>,
    #[serde(rename = "pausedState", default, skip_serializing_if = "Option::is_none")]
    pub paused_state: Option<serde_json::Value>,
}

/// A purchased rectangle of the city map, in map units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockedArea {
    #[serde(default)]
    pub x: i64,
    #[serde(default)]
    pub y: i64,
    #[serde(default)]
    pub width: i64,
    #[serde(default)]
    pub length: i64,
}

/// Everything the city map panel sends to get a layout back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CityMapRequest {
    /// Catalog entries keyed by type id.
    #[serde(default)]
    pub entities: HashMap<String, RawCityEntity>,
    #[serde(default)]
    pub placements: Vec<RawCityMapEntity>,
    #[serde(default)]
    pub unlocked_areas: Vec<UnlockedArea>,
    pub current_era: u32,
    /// Zoom percentage; the stored preference is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    /// Set when the city belongs to someone else (neighbour, guild member).
    #[serde(default)]
    pub is_external: bool,
}

// ---------------------------------------------------------------------------
// Stats telemetry, as captured from game responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerRef {
    pub player_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar: String,
}

/// One row of the battleground leaderboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player: PlayerRef,
    #[serde(rename = "negotiationsWon", default, skip_serializing_if = "Option::is_none")]
    pub negotiations_won: Option<i64>,
    #[serde(rename = "battlesWon", default, skip_serializing_if = "Option::is_none")]
    pub battles_won: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<i64>,
}

/// A collected reward. Everything besides `id` and `amount` is kept verbatim
/// so the reward's display info can be cached.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectedReward {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArmyCount {
    #[serde(rename = "unitTypeId")]
    pub unit_type_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unattached: Option<i64>,
}

/// Resource id to amount, as held in a treasury.
pub type Resources = BTreeMap<String, i64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_entity_keeps_requirements() {
        let raw: RawCityEntity = serde_json::from_str(
            r#"{"id":"R_SS_BronzeAge_SportBonus","name":"Track","type":"decoration",
                "width":2,"length":3,"requirements":{"street_connection_level":1,"cost":{}}}"#,
        )
        .unwrap();
        assert_eq!(raw.kind, "decoration");
        assert_eq!(raw.width, Some(2));
        assert_eq!(
            raw.requirements.and_then(|r| r.street_connection_level),
            Some(1)
        );
        assert!(raw.components.is_none());
    }

    #[test]
    fn modern_entity_reads_nested_size() {
        let raw: RawCityEntity = serde_json::from_str(
            r#"{"id":"W_MultiAge_Castle","type":"main_building","components":{"AllAge":{
                "placement":{"size":{"x":4,"y":5}},
                "streetConnectionRequirement":{"requiredLevel":2}}}}"#,
        )
        .unwrap();
        let all_age = raw.components.unwrap().all_age.unwrap();
        let size = all_age.placement.unwrap().size.unwrap();
        assert_eq!((size.x, size.y), (Some(4), Some(5)));
        assert_eq!(
            all_age.street_connection_requirement.unwrap().required_level,
            Some(2)
        );
    }

    #[test]
    fn map_entity_state_markers() {
        let raw: RawCityMapEntity = serde_json::from_str(
            r#"{"id":7,"cityentity_id":"S_Street","x":3,
                "state":{"__class__":"IdleState","pausedAt":1600000000}}"#,
        )
        .unwrap();
        assert_eq!(raw.y, None);
        assert_eq!(raw.state.class, "IdleState");
        assert!(raw.state.paused_at.is_some());
        assert!(raw.state.paused_state.is_none());
    }

    #[test]
    fn reward_keeps_extra_fields() {
        let raw: CollectedReward = serde_json::from_str(
            r#"{"id":"premium_50","name":"50 Diamonds","amount":50,"type":"resource"}"#,
        )
        .unwrap();
        assert_eq!(raw.amount, Some(50));
        assert_eq!(raw.extra.get("name").and_then(|v| v.as_str()), Some("50 Diamonds"));
    }
}
