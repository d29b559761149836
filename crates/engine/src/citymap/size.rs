use super::catalog::BuildingDefinition;
use super::placement::BuildingPlacement;
use serde::{Deserialize, Serialize};

/// Footprint and area accounting for one placed building.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildingSize {
    pub xsize: i64,
    pub ysize: i64,
    pub streets_required: i64,
    pub is_connected: bool,
    pub building_area: i64,
    /// Street area this building accounts for. Only half of the frontage is
    /// credited since neighbours share it.
    pub street_area: f64,
    pub total_area: f64,
}

impl BuildingSize {
    pub fn new(xsize: i64, ysize: i64, streets_required: i64, is_connected: bool) -> Self {
        let building_area = xsize.saturating_mul(ysize);
        let street_area = if is_connected {
            xsize.min(ysize) as f64 * streets_required as f64 / 2.0
        } else {
            0.0
        };
        Self {
            xsize,
            ysize,
            streets_required,
            is_connected,
            building_area,
            street_area,
            total_area: building_area as f64 + street_area,
        }
    }
}

pub fn resolve_size(placement: &BuildingPlacement, def: &BuildingDefinition) -> BuildingSize {
    let dims = def.dimensions();
    BuildingSize::new(
        dims.xsize,
        dims.ysize,
        dims.streets_required,
        placement.connection.is_connected(),
    )
}
