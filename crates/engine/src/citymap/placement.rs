//! Building placements: one per building a city owns.

use cityscope_protocol::{RawCityMapEntity, RawEntityState};
use serde::{Deserialize, Serialize};

const UNCONNECTED_STATE: &str = "UnconnectedState";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connected,
    Disconnected,
    /// Production is paused. Counts as disconnected whatever the state class says.
    Paused,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl From<&RawEntityState> for ConnectionState {
    fn from(state: &RawEntityState) -> Self {
        if state.paused_at.is_some() || state.paused_state.is_some() {
            ConnectionState::Paused
        } else if state.class == UNCONNECTED_STATE {
            ConnectionState::Disconnected
        } else {
            ConnectionState::Connected
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingPlacement {
    /// Stable per-instance identifier.
    pub id: i64,
    /// Type id into the catalog.
    pub entity_id: String,
    pub x: i64,
    pub y: i64,
    /// Upgrade tier, only meaningful for multi-age buildings.
    pub level: Option<u32>,
    pub connection: ConnectionState,
}

impl From<&RawCityMapEntity> for BuildingPlacement {
    fn from(raw: &RawCityMapEntity) -> Self {
        Self {
            id: raw.id,
            entity_id: raw.cityentity_id.clone(),
            x: raw.x.unwrap_or(0),
            y: raw.y.unwrap_or(0),
            level: raw.level,
            connection: ConnectionState::from(&raw.state),
        }
    }
}

/// Inclusive map range placements must fall in to be accounted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapBounds {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl MapBounds {
    pub const CANONICAL: MapBounds = MapBounds {
        min_x: 0,
        min_y: 0,
        max_x: 63,
        max_y: 63,
    };

    pub fn contains(&self, x: i64, y: i64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }
}

impl Default for MapBounds {
    fn default() -> Self {
        Self::CANONICAL
    }
}
