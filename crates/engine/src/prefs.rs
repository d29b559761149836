//! Map panel preferences, kept across sessions.

use crate::citymap::ScaleUnit;
use crate::error::ParseError;
use crate::Engine;
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};

const SCALE_KEY: &str = "citymap.scale";
const VIEW_KEY: &str = "citymap.view";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CityView {
    Normal,
    /// Cavalier perspective.
    #[default]
    Skew,
}

impl CityView {
    pub fn as_str(self) -> &'static str {
        match self {
            CityView::Normal => "normal",
            CityView::Skew => "skew",
        }
    }
}

impl std::str::FromStr for CityView {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(CityView::Normal),
            "skew" => Ok(CityView::Skew),
            other => Err(ParseError::UnknownView(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapPrefs {
    pub scale: ScaleUnit,
    pub view: CityView,
}

impl Engine {
    /// Stored preferences; anything missing or unreadable falls back to its default.
    pub fn load_map_prefs(&self) -> anyhow::Result<MapPrefs> {
        let conn = self.open()?;
        let get = |key: &str| -> anyhow::Result<Option<String>> {
            Ok(conn
                .query_row("SELECT value FROM prefs WHERE key = ?1", [key], |row| {
                    row.get(0)
                })
                .optional()?)
        };

        let scale = get(SCALE_KEY)?
            .and_then(|v| v.parse::<ScaleUnit>().ok())
            .unwrap_or_default();
        let view = get(VIEW_KEY)?
            .and_then(|v| v.parse::<CityView>().ok())
            .unwrap_or_default();
        Ok(MapPrefs { scale, view })
    }

    pub fn save_map_prefs(&self, prefs: &MapPrefs) -> anyhow::Result<()> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        let ts = crate::now_ms();
        for (key, value) in [
            (SCALE_KEY, prefs.scale.to_string()),
            (VIEW_KEY, prefs.view.as_str().to_string()),
        ] {
            tx.execute(
                "INSERT INTO prefs (key, value, updated_at_ms) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at_ms = excluded.updated_at_ms",
                (key, value, ts),
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}
