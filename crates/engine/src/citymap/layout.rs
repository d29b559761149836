//! Folds every placement of a city into screen rectangles and area totals.

use super::catalog::{Catalog, STREET};
use super::era::{classify_era, is_old_building, EraTable};
use super::placement::{BuildingPlacement, MapBounds};
use super::size::{resolve_size, BuildingSize};
use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Zoom level in percent. Map units are multiplied by `unit / 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScaleUnit(u32);

impl ScaleUnit {
    /// Zoom levels offered by the panel.
    pub const PRESETS: [u32; 7] = [60, 80, 100, 120, 140, 160, 180];

    pub fn new(percent: u32) -> Result<Self, ParseError> {
        if percent == 0 {
            return Err(ParseError::InvalidScale(percent.to_string()));
        }
        Ok(Self(percent))
    }

    /// Only the zoom levels the panel offers.
    pub fn preset(percent: u32) -> Result<Self, ParseError> {
        if !Self::PRESETS.contains(&percent) {
            return Err(ParseError::InvalidScale(percent.to_string()));
        }
        Ok(Self(percent))
    }

    pub fn percent(self) -> u32 {
        self.0
    }

    pub fn scale(self, map_units: i64) -> f64 {
        map_units as f64 * self.0 as f64 / 100.0
    }
}

impl Default for ScaleUnit {
    fn default() -> Self {
        Self(100)
    }
}

impl std::str::FromStr for ScaleUnit {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let percent: u32 = s
            .trim()
            .parse()
            .map_err(|_| ParseError::InvalidScale(s.to_string()))?;
        Self::new(percent)
    }
}

impl std::fmt::Display for ScaleUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Screen-space rectangle, in the panel's `em` units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn from_map(x: i64, y: i64, width: i64, height: i64, scale: ScaleUnit) -> Self {
        Self {
            left: scale.scale(x),
            top: scale.scale(y),
            width: scale.scale(width),
            height: scale.scale(height),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedBuilding {
    pub id: i64,
    pub entity_id: String,
    pub name: String,
    pub kind: String,
    pub rect: Rect,
    pub size: BuildingSize,
    pub era: Option<u32>,
    pub is_old: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    OutOfBounds,
    UnknownDefinition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPlacement {
    pub id: i64,
    pub entity_id: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityLayout {
    /// In input order.
    pub buildings: Vec<PlacedBuilding>,
    /// Sum of every building's footprint.
    pub occupied_area: i64,
    /// Footprint per category; street tiles land in `street`.
    pub category_areas: BTreeMap<String, i64>,
    /// Street area demanded by connected buildings.
    pub streets_required: f64,
    /// Area covered by street tiles.
    pub street_tiles: i64,
    /// `streets_required / street_tiles`; `None` until a street tile exists.
    pub street_efficiency: Option<f64>,
    pub skipped: Vec<SkippedPlacement>,
}

/// Inputs of one layout pass.
#[derive(Debug, Clone, Copy)]
pub struct LayoutInput<'a> {
    pub placements: &'a [BuildingPlacement],
    pub catalog: &'a Catalog,
    pub eras: &'a EraTable,
    pub current_era: u32,
    pub scale: ScaleUnit,
    pub bounds: MapBounds,
}

impl<'a> LayoutInput<'a> {
    pub fn new(
        placements: &'a [BuildingPlacement],
        catalog: &'a Catalog,
        eras: &'a EraTable,
        current_era: u32,
        scale: ScaleUnit,
    ) -> Self {
        Self {
            placements,
            catalog,
            eras,
            current_era,
            scale,
            bounds: MapBounds::CANONICAL,
        }
    }
}

pub fn accumulate_layout(input: &LayoutInput<'_>) -> CityLayout {
    let mut layout = CityLayout::default();

    for placement in input.placements {
        if !input.bounds.contains(placement.x, placement.y) {
            tracing::debug!(
                id = placement.id,
                x = placement.x,
                y = placement.y,
                "placement outside map bounds"
            );
            layout.skipped.push(skip(placement, SkipReason::OutOfBounds));
            continue;
        }

        let Some(def) = input.catalog.get(&placement.entity_id) else {
            tracing::debug!(
                id = placement.id,
                entity_id = %placement.entity_id,
                "no catalog entry for placement"
            );
            layout.skipped.push(skip(placement, SkipReason::UnknownDefinition));
            continue;
        };

        let size = resolve_size(placement, def);
        layout.occupied_area = layout.occupied_area.saturating_add(size.building_area);
        let category = layout.category_areas.entry(def.kind.clone()).or_insert(0);
        *category = category.saturating_add(size.building_area);
        layout.streets_required += size.street_area;

        let era = classify_era(placement, def, input.current_era, input.eras);
        layout.buildings.push(PlacedBuilding {
            id: placement.id,
            entity_id: placement.entity_id.clone(),
            name: def.name.clone(),
            kind: def.kind.clone(),
            rect: Rect::from_map(placement.x, placement.y, size.xsize, size.ysize, input.scale),
            size,
            era,
            is_old: is_old_building(era, input.current_era),
        });
    }

    layout.street_tiles = layout.category_areas.get(STREET).copied().unwrap_or(0);
    layout.street_efficiency = if layout.street_tiles > 0 {
        Some(layout.streets_required / layout.street_tiles as f64)
    } else {
        None
    };
    layout
}

fn skip(placement: &BuildingPlacement, reason: SkipReason) -> SkippedPlacement {
    SkippedPlacement {
        id: placement.id,
        entity_id: placement.entity_id.clone(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citymap::catalog::{BuildingDefinition, Footprint};
    use crate::citymap::placement::ConnectionState;
    use proptest::prelude::*;

    fn legacy(id: &str, kind: &str, w: i64, l: i64, street: i64) -> BuildingDefinition {
        BuildingDefinition {
            id: id.to_string(),
            name: id.to_string(),
            kind: kind.to_string(),
            is_multi_age: false,
            footprint: Footprint::Legacy {
                width: w,
                length: l,
                street_connection_level: street,
            },
        }
    }

    fn catalog() -> Catalog {
        [
            legacy("S_AllAge_Street", "street", 1, 1, 0),
            legacy("H_BronzeAge_Hut", "residential", 2, 2, 1),
            legacy("P_IronAge_Farm", "production", 3, 4, 1),
            legacy("G_GreatBuilding_Colosseum", "greatbuilding", 5, 5, 2),
        ]
        .into_iter()
        .collect()
    }

    fn at(id: i64, entity_id: &str, x: i64, y: i64) -> BuildingPlacement {
        BuildingPlacement {
            id,
            entity_id: entity_id.to_string(),
            x,
            y,
            level: None,
            connection: ConnectionState::Connected,
        }
    }

    fn run(placements: &[BuildingPlacement], scale: u32) -> CityLayout {
        let catalog = catalog();
        let eras = EraTable::standard();
        accumulate_layout(&LayoutInput::new(
            placements,
            &catalog,
            &eras,
            3,
            ScaleUnit::new(scale).unwrap(),
        ))
    }

    #[test]
    fn single_street_tile() {
        let layout = run(&[at(1, "S_AllAge_Street", 0, 0)], 100);
        assert_eq!(layout.occupied_area, 1);
        assert_eq!(layout.category_areas.get("street"), Some(&1));
        assert_eq!(layout.buildings[0].size.street_area, 0.0);
        // Nothing needs a street yet, but a tile exists: a defined zero.
        assert_eq!(layout.street_efficiency, Some(0.0));
    }

    #[test]
    fn efficiency_undefined_without_street_tiles() {
        let layout = run(&[at(1, "H_BronzeAge_Hut", 0, 0)], 100);
        assert_eq!(layout.streets_required, 1.0);
        assert_eq!(layout.street_tiles, 0);
        assert_eq!(layout.street_efficiency, None);
    }

    #[test]
    fn efficiency_is_demand_over_tiles() {
        let layout = run(
            &[
                at(1, "H_BronzeAge_Hut", 0, 0),
                at(2, "P_IronAge_Farm", 4, 0),
                at(3, "S_AllAge_Street", 0, 2),
                at(4, "S_AllAge_Street", 1, 2),
            ],
            100,
        );
        // hut: min(2,2)*1/2 = 1, farm: min(3,4)*1/2 = 1.5
        assert_eq!(layout.streets_required, 2.5);
        assert_eq!(layout.street_tiles, 2);
        assert_eq!(layout.street_efficiency, Some(1.25));
    }

    #[test]
    fn out_of_bounds_placement_is_excluded() {
        let layout = run(
            &[at(1, "H_BronzeAge_Hut", 0, 0), at(2, "H_BronzeAge_Hut", 70, 0)],
            100,
        );
        assert_eq!(layout.occupied_area, 4);
        assert_eq!(layout.buildings.len(), 1);
        assert_eq!(layout.skipped.len(), 1);
        assert_eq!(layout.skipped[0].id, 2);
        assert_eq!(layout.skipped[0].reason, SkipReason::OutOfBounds);
    }

    #[test]
    fn unknown_definition_does_not_stop_the_pass() {
        let layout = run(
            &[
                at(1, "Z_Gone_Building", 0, 0),
                at(2, "P_IronAge_Farm", 5, 5),
            ],
            100,
        );
        assert_eq!(layout.occupied_area, 12);
        assert_eq!(layout.skipped[0].reason, SkipReason::UnknownDefinition);
        assert_eq!(layout.buildings[0].id, 2);
    }

    #[test]
    fn input_order_is_preserved() {
        let layout = run(
            &[
                at(30, "P_IronAge_Farm", 40, 0),
                at(10, "H_BronzeAge_Hut", 1, 0),
                at(20, "S_AllAge_Street", 20, 0),
            ],
            100,
        );
        let ids: Vec<i64> = layout.buildings.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![30, 10, 20]);
    }

    #[test]
    fn eras_and_old_flags() {
        let layout = run(
            &[
                at(1, "H_BronzeAge_Hut", 0, 0),
                at(2, "G_GreatBuilding_Colosseum", 10, 10),
            ],
            100,
        );
        assert_eq!(layout.buildings[0].era, Some(2));
        assert!(layout.buildings[0].is_old);
        assert_eq!(layout.buildings[1].era, Some(3));
        assert!(!layout.buildings[1].is_old);
    }

    #[test]
    fn rect_scales_with_unit() {
        let layout = run(&[at(1, "P_IronAge_Farm", 10, 5)], 80);
        assert_eq!(
            layout.buildings[0].rect,
            Rect {
                left: 8.0,
                top: 4.0,
                width: 2.4,
                height: 3.2,
            }
        );
    }

    #[test]
    fn scale_unit_rejects_zero() {
        assert!(ScaleUnit::new(0).is_err());
        assert_eq!("140".parse::<ScaleUnit>().unwrap().percent(), 140);
        assert!("big".parse::<ScaleUnit>().is_err());
    }

    #[test]
    fn presets_are_the_panel_zoom_levels() {
        assert_eq!(ScaleUnit::preset(160).unwrap().percent(), 160);
        assert!(ScaleUnit::preset(150).is_err());
        assert!(ScaleUnit::preset(200).is_err());
        // Arbitrary scales stay valid for one-off layouts.
        assert_eq!(ScaleUnit::new(200).unwrap().percent(), 200);
    }

    #[test]
    fn huge_footprints_saturate_totals() {
        let catalog: Catalog = [
            legacy("H_BronzeAge_Hut", "residential", 1 << 62, 4, 1),
            legacy("P_IronAge_Farm", "residential", i64::MAX, 1, 0),
            legacy("S_AllAge_Street", "street", 1, 1, 0),
        ]
        .into_iter()
        .collect();
        let eras = EraTable::standard();
        let placements = [
            at(1, "H_BronzeAge_Hut", 0, 0),
            at(2, "P_IronAge_Farm", 0, 1),
            at(3, "S_AllAge_Street", 0, 2),
        ];
        let layout = accumulate_layout(&LayoutInput::new(
            &placements,
            &catalog,
            &eras,
            3,
            ScaleUnit::default(),
        ));
        assert_eq!(layout.buildings.len(), 3);
        assert_eq!(layout.buildings[0].size.building_area, i64::MAX);
        assert_eq!(layout.occupied_area, i64::MAX);
        assert_eq!(layout.category_areas.get("residential"), Some(&i64::MAX));
        assert_eq!(layout.street_tiles, 1);
    }

    fn placements_strategy() -> impl Strategy<Value = Vec<BuildingPlacement>> {
        let ids = prop::sample::select(vec![
            "S_AllAge_Street",
            "H_BronzeAge_Hut",
            "P_IronAge_Farm",
            "G_GreatBuilding_Colosseum",
            "Z_Gone_Building",
        ]);
        prop::collection::vec((ids, -5..70i64, -5..70i64, any::<bool>()), 0..40).prop_map(
            |rows| {
                rows.into_iter()
                    .enumerate()
                    .map(|(i, (entity_id, x, y, connected))| {
                        let mut p = at(i as i64, entity_id, x, y);
                        if !connected {
                            p.connection = ConnectionState::Disconnected;
                        }
                        p
                    })
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn category_areas_partition_occupied_area(placements in placements_strategy()) {
            let layout = run(&placements, 100);
            let sum: i64 = layout.category_areas.values().sum();
            prop_assert_eq!(sum, layout.occupied_area);
            prop_assert_eq!(layout.buildings.len() + layout.skipped.len(), placements.len());
        }

        #[test]
        fn doubling_unit_doubles_rects(placements in placements_strategy()) {
            let base = run(&placements, 100);
            let doubled = run(&placements, 200);
            prop_assert_eq!(base.buildings.len(), doubled.buildings.len());
            for (a, b) in base.buildings.iter().zip(doubled.buildings.iter()) {
                prop_assert_eq!(a.rect.left * 2.0, b.rect.left);
                prop_assert_eq!(a.rect.top * 2.0, b.rect.top);
                prop_assert_eq!(a.rect.width * 2.0, b.rect.width);
                prop_assert_eq!(a.rect.height * 2.0, b.rect.height);
            }
        }
    }
}
