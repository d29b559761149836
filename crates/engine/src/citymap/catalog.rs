//! Building catalog: static descriptions of building types.

use cityscope_protocol::RawCityEntity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Category tag of street tiles.
pub const STREET: &str = "street";
/// Category tag of great buildings.
pub const GREAT_BUILDING: &str = "greatbuilding";

/// Footprint and street demand of a building type.
///
/// The catalog ships two shapes of entry; which one a definition uses is
/// decided once, at ingestion, and never checked again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "schema", rename_all = "lowercase")]
pub enum Footprint {
    Legacy {
        width: i64,
        length: i64,
        street_connection_level: i64,
    },
    Modern {
        size_x: i64,
        size_y: i64,
        required_level: i64,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub xsize: i64,
    pub ysize: i64,
    pub streets_required: i64,
}

impl Footprint {
    /// Width, length and street level for a building of category `kind`.
    pub fn resolve_dimensions(&self, kind: &str) -> Dimensions {
        match *self {
            Footprint::Legacy {
                width,
                length,
                street_connection_level,
            } => Dimensions {
                xsize: width,
                ysize: length,
                // A street tile never needs street access from itself.
                streets_required: if kind == STREET {
                    0
                } else {
                    street_connection_level
                },
            },
            Footprint::Modern {
                size_x,
                size_y,
                required_level,
            } => Dimensions {
                xsize: size_x,
                ysize: size_y,
                streets_required: required_level,
            },
        }
    }
}

impl From<&RawCityEntity> for Footprint {
    fn from(raw: &RawCityEntity) -> Self {
        if let Some(req) = &raw.requirements {
            return Footprint::Legacy {
                width: raw.width.unwrap_or(0),
                length: raw.length.unwrap_or(0),
                street_connection_level: req.street_connection_level.unwrap_or(0),
            };
        }

        let all_age = raw.components.as_ref().and_then(|c| c.all_age.as_ref());
        let size = all_age
            .and_then(|a| a.placement.as_ref())
            .and_then(|p| p.size.as_ref());
        Footprint::Modern {
            size_x: size.and_then(|s| s.x).unwrap_or(0),
            size_y: size.and_then(|s| s.y).unwrap_or(0),
            required_level: all_age
                .and_then(|a| a.street_connection_requirement.as_ref())
                .and_then(|r| r.required_level)
                .unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingDefinition {
    pub id: String,
    pub name: String,
    /// Category tag (`street`, `residential`, `greatbuilding`, ...).
    pub kind: String,
    pub is_multi_age: bool,
    pub footprint: Footprint,
}

impl BuildingDefinition {
    pub fn dimensions(&self) -> Dimensions {
        self.footprint.resolve_dimensions(&self.kind)
    }

    pub fn is_street(&self) -> bool {
        self.kind == STREET
    }

    pub fn is_great_building(&self) -> bool {
        self.kind == GREAT_BUILDING
    }
}

impl From<&RawCityEntity> for BuildingDefinition {
    fn from(raw: &RawCityEntity) -> Self {
        Self {
            id: raw.id.clone(),
            name: raw.name.clone(),
            kind: raw.kind.clone(),
            is_multi_age: raw.is_multi_age,
            footprint: Footprint::from(raw),
        }
    }
}

/// Type id to definition. Loaded once per session, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    definitions: HashMap<String, BuildingDefinition>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the catalog map as the game serves it. Entries without an
    /// `id` of their own take the key they were filed under.
    pub fn from_raw_map(raw: &HashMap<String, RawCityEntity>) -> Self {
        let mut catalog = Self::new();
        for (key, entity) in raw {
            let mut def = BuildingDefinition::from(entity);
            if def.id.is_empty() {
                def.id = key.clone();
            }
            catalog.definitions.insert(key.clone(), def);
        }
        catalog
    }

    pub fn insert(&mut self, def: BuildingDefinition) {
        self.definitions.insert(def.id.clone(), def);
    }

    pub fn get(&self, type_id: &str) -> Option<&BuildingDefinition> {
        self.definitions.get(type_id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl FromIterator<BuildingDefinition> for Catalog {
    fn from_iter<I: IntoIterator<Item = BuildingDefinition>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for def in iter {
            catalog.insert(def);
        }
        catalog
    }
}
