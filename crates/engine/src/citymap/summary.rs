//! Area statistics shown next to the map.

use super::grid::START_MAP_SIDE;
use super::layout::CityLayout;
use cityscope_protocol::UnlockedArea;
use serde::{Deserialize, Serialize};

/// Every expansion after the start map adds a 4×4 block.
pub const EXPANSION_AREA: i64 = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub kind: String,
    pub area: i64,
    /// Share of the occupied area, rounded to one decimal.
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaSummary {
    /// Unknown for other players' cities.
    pub total_area: Option<i64>,
    pub free_area: Option<i64>,
    pub occupied_area: i64,
    /// Largest category first.
    pub categories: Vec<CategoryShare>,
    pub street_efficiency_percent: Option<f64>,
}

impl AreaSummary {
    pub fn build(layout: &CityLayout, unlocked: &[UnlockedArea], is_external: bool) -> Self {
        let total_area = if is_external {
            None
        } else {
            let expansions = unlocked.len().saturating_sub(1) as i64;
            Some(
                expansions
                    .saturating_mul(EXPANSION_AREA)
                    .saturating_add(START_MAP_SIDE * START_MAP_SIDE),
            )
        };

        let mut categories: Vec<CategoryShare> = layout
            .category_areas
            .iter()
            .map(|(kind, &area)| CategoryShare {
                kind: kind.clone(),
                area,
                percent: share_percent(area, layout.occupied_area),
            })
            .collect();
        categories.sort_by(|a, b| b.area.cmp(&a.area).then_with(|| a.kind.cmp(&b.kind)));

        Self {
            total_area,
            free_area: total_area.map(|t| t.saturating_sub(layout.occupied_area)),
            occupied_area: layout.occupied_area,
            categories,
            street_efficiency_percent: layout
                .street_efficiency
                .map(|e| (e * 10000.0).round() / 100.0),
        }
    }
}

fn share_percent(area: i64, occupied: i64) -> f64 {
    if occupied == 0 {
        return 0.0;
    }
    (1000.0 * area as f64 / occupied as f64).round() / 10.0
}
