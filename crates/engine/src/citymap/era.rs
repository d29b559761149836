//! Era classification of placed buildings.

use super::catalog::BuildingDefinition;
use super::placement::BuildingPlacement;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Era names in index order, starting at `StoneAge` = 1.
pub const ERA_NAMES: [&str; 20] = [
    "StoneAge",
    "BronzeAge",
    "IronAge",
    "EarlyMiddleAge",
    "HighMiddleAge",
    "LateMiddleAge",
    "ColonialAge",
    "IndustrialAge",
    "ProgressiveEra",
    "ModernEra",
    "PostModernEra",
    "ContemporaryEra",
    "TomorrowEra",
    "FutureEra",
    "ArcticFuture",
    "OceanicFuture",
    "VirtualFuture",
    "SpaceAgeMars",
    "SpaceAgeAsteroidBelt",
    "SpaceAgeVenus",
];

/// Names that stand for "every era" and map to index 0.
pub const ALL_AGES_NAMES: [&str; 3] = ["AllAge", "NoAge", "MultiAge"];

/// Era name to era index.
#[derive(Debug, Clone)]
pub struct EraTable {
    indices: HashMap<String, u32>,
}

impl EraTable {
    pub fn standard() -> Self {
        let mut indices: HashMap<String, u32> = ALL_AGES_NAMES
            .iter()
            .map(|name| (name.to_string(), 0))
            .collect();
        for (i, name) in ERA_NAMES.iter().enumerate() {
            indices.insert(name.to_string(), i as u32 + 1);
        }
        Self { indices }
    }

    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.indices.get(name).copied()
    }
}

impl Default for EraTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn era_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"_([^_]+)_[^_]*$").expect("era token pattern"))
}

/// The era token of a type id: the segment between its last two underscores.
///
/// `R_SS_BronzeAge_SportBonus` yields `BronzeAge`.
pub fn extract_era_token(type_id: &str) -> Option<&str> {
    era_token_pattern()
        .captures(type_id)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Era of a placed building, or `None` when it cannot be told.
pub fn classify_era(
    placement: &BuildingPlacement,
    def: &BuildingDefinition,
    current_era: u32,
    eras: &EraTable,
) -> Option<u32> {
    if def.is_multi_age {
        if let Some(level) = placement.level {
            return level.checked_add(1);
        }
    }

    // Great buildings are not age-locked and follow the viewer.
    if def.is_great_building() {
        return Some(current_era);
    }

    let era = eras.index_of(extract_era_token(&def.id)?)?;
    if era == 0 {
        Some(current_era)
    } else {
        Some(era)
    }
}

pub fn is_old_building(era: Option<u32>, current_era: u32) -> bool {
    matches!(era, Some(e) if e < current_era)
}
