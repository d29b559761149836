//! Historical game telemetry: storage, retention and chart series.

pub mod annotations;
pub mod period;
pub mod resources;
pub mod series;
pub mod store;

pub use annotations::{detect_gvg_spending, GvgMarker};
pub use period::Period;
pub use series::{ChartType, RewardSlice, Series};
pub use store::{
    ArmySnapshot, CachedPlayer, GcReport, LeaderboardSnapshot, PlayerScore, RewardRow,
    TreasurySnapshot,
};

use crate::error::ParseError;
use serde::{Deserialize, Serialize};

/// Reward incidents worth keeping. Everything else is dropped at ingestion.
pub const TRACKABLE_REWARDS: [&str; 3] = [
    "battlegrounds_conquest",
    "guildExpedition",
    "spoilsOfWar",
];

/// A time-series table the stats panel can chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatsSource {
    GbgPlayers,
    Rewards,
    Units,
    UnitsDaily,
    TreasurePlayer,
    TreasurePlayerDaily,
    TreasureClan,
    TreasureClanDaily,
}

impl StatsSource {
    pub const ALL: [StatsSource; 8] = [
        StatsSource::GbgPlayers,
        StatsSource::Rewards,
        StatsSource::Units,
        StatsSource::UnitsDaily,
        StatsSource::TreasurePlayer,
        StatsSource::TreasurePlayerDaily,
        StatsSource::TreasureClan,
        StatsSource::TreasureClanDaily,
    ];

    /// Name the panel uses for the source.
    pub fn as_str(self) -> &'static str {
        match self {
            StatsSource::GbgPlayers => "gbgPlayers",
            StatsSource::Rewards => "rewards",
            StatsSource::Units => "units",
            StatsSource::UnitsDaily => "unitsDaily",
            StatsSource::TreasurePlayer => "treasurePlayer",
            StatsSource::TreasurePlayerDaily => "treasurePlayerDaily",
            StatsSource::TreasureClan => "treasureClan",
            StatsSource::TreasureClanDaily => "treasureClanDaily",
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            StatsSource::GbgPlayers => "gbg_players",
            StatsSource::Rewards => "rewards",
            StatsSource::Units => "units",
            StatsSource::UnitsDaily => "units_daily",
            StatsSource::TreasurePlayer => "treasure_player",
            StatsSource::TreasurePlayerDaily => "treasure_player_daily",
            StatsSource::TreasureClan => "treasure_clan",
            StatsSource::TreasureClanDaily => "treasure_clan_daily",
        }
    }

    pub fn is_treasure(self) -> bool {
        matches!(
            self,
            StatsSource::TreasurePlayer
                | StatsSource::TreasurePlayerDaily
                | StatsSource::TreasureClan
                | StatsSource::TreasureClanDaily
        )
    }

    pub fn is_clan(self) -> bool {
        matches!(self, StatsSource::TreasureClan | StatsSource::TreasureClanDaily)
    }

    pub fn is_units(self) -> bool {
        matches!(self, StatsSource::Units | StatsSource::UnitsDaily)
    }

    pub fn is_leaderboard(self) -> bool {
        matches!(self, StatsSource::GbgPlayers)
    }
}

impl std::str::FromStr for StatsSource {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatsSource::ALL
            .into_iter()
            .find(|src| src.as_str() == s)
            .ok_or_else(|| ParseError::UnknownSource(s.to_string()))
    }
}

impl std::fmt::Display for StatsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
