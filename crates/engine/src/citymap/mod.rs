//! City map: building footprints, eras and area accounting.
//!
//! ```text
//! RawCityEntity ──▶ Catalog (BuildingDefinition, Footprint)
//! RawCityMapEntity ──▶ BuildingPlacement (ConnectionState)
//!                        │
//!                        ▼
//!              accumulate_layout ──▶ CityLayout ──▶ AreaSummary
//!                (size + era per placement)
//! UnlockedArea ──▶ grid_tiles
//! ```

pub mod catalog;
pub mod era;
pub mod grid;
pub mod layout;
pub mod placement;
pub mod size;
pub mod summary;

pub use catalog::{BuildingDefinition, Catalog, Dimensions, Footprint};
pub use era::{classify_era, extract_era_token, is_old_building, EraTable};
pub use grid::{grid_tiles, GridTile};
pub use layout::{
    accumulate_layout, CityLayout, LayoutInput, PlacedBuilding, Rect, ScaleUnit, SkipReason,
    SkippedPlacement,
};
pub use placement::{BuildingPlacement, ConnectionState, MapBounds};
pub use size::{resolve_size, BuildingSize};
pub use summary::{AreaSummary, CategoryShare};

use cityscope_protocol::CityMapRequest;
use serde::{Deserialize, Serialize};

/// Everything the map panel draws for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityMapView {
    pub scale: ScaleUnit,
    pub layout: CityLayout,
    /// Empty for other players' cities.
    pub grid: Vec<GridTile>,
    pub summary: AreaSummary,
}

/// Runs a full map pass over a panel request.
pub fn build_city_map(req: &CityMapRequest, scale: ScaleUnit, eras: &EraTable) -> CityMapView {
    let catalog = Catalog::from_raw_map(&req.entities);
    let placements: Vec<BuildingPlacement> =
        req.placements.iter().map(BuildingPlacement::from).collect();

    let layout = accumulate_layout(&LayoutInput::new(
        &placements,
        &catalog,
        eras,
        req.current_era,
        scale,
    ));
    let grid = if req.is_external {
        Vec::new()
    } else {
        grid_tiles(&req.unlocked_areas, scale)
    };
    let summary = AreaSummary::build(&layout, &req.unlocked_areas, req.is_external);

    CityMapView {
        scale,
        layout,
        grid,
        summary,
    }
}
