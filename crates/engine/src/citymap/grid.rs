use super::layout::{Rect, ScaleUnit};
use cityscope_protocol::UnlockedArea;
use serde::{Deserialize, Serialize};

/// Side length of the start map every city begins with.
pub const START_MAP_SIDE: i64 = 16;

/// Background tile behind an unlocked area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridTile {
    pub rect: Rect,
    pub is_start_map: bool,
}

pub fn grid_tiles(areas: &[UnlockedArea], scale: ScaleUnit) -> Vec<GridTile> {
    areas
        .iter()
        .map(|a| GridTile {
            rect: Rect::from_map(a.x, a.y, a.width, a.length, scale),
            is_start_map: a.width == START_MAP_SIDE && a.length == START_MAP_SIDE,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_map_is_flagged() {
        let areas = [
            UnlockedArea {
                x: 20,
                y: 20,
                width: 16,
                length: 16,
            },
            UnlockedArea {
                x: 36,
                y: 20,
                width: 4,
                length: 4,
            },
        ];
        let tiles = grid_tiles(&areas, ScaleUnit::new(60).unwrap());
        assert_eq!(tiles.len(), 2);
        assert!(tiles[0].is_start_map);
        assert!(!tiles[1].is_start_map);
        assert_eq!(tiles[1].rect.left, 21.6);
        assert_eq!(tiles[1].rect.width, 2.4);
    }
}
