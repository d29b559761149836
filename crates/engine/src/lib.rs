use anyhow::Context;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod citymap;
pub mod error;
pub mod prefs;
pub mod stats;

pub use citymap::{build_city_map, CityMapView};
pub use error::ParseError;
pub use prefs::{CityView, MapPrefs};

pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .try_into()
        .unwrap_or(i64::MAX)
}

/// Handle on the local database. Connections are opened per call.
#[derive(Debug, Clone)]
pub struct Engine {
    db_path: PathBuf,
}

impl Engine {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn open(&self) -> anyhow::Result<Connection> {
        let path = self.db_path.clone();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create db dir: {}", dir.display()))?;
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("open sqlite db: {}", path.display()))?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        migrate(&conn)?;
        Ok(conn)
    }
}

fn migrate(conn: &Connection) -> anyhow::Result<()> {
    // `user_version` + IF NOT EXISTS. The data is a cache the user may wipe at
    // any time, so there is nothing to carry over between versions.
    let v: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if v < 1 {
        conn.execute_batch(
            r#"
CREATE TABLE IF NOT EXISTS prefs (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL,
  updated_at_ms INTEGER NOT NULL
);

-- Battleground leaderboard snapshots and the players seen in them.
CREATE TABLE IF NOT EXISTS gbg_players (
  date_ms INTEGER PRIMARY KEY,
  players_json TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS player_cache (
  id INTEGER PRIMARY KEY,
  name TEXT NOT NULL DEFAULT '',
  avatar TEXT NOT NULL DEFAULT '',
  date_ms INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_player_cache_date ON player_cache(date_ms);

CREATE TABLE IF NOT EXISTS rewards (
  seq INTEGER PRIMARY KEY AUTOINCREMENT,
  date_ms INTEGER NOT NULL,
  source TEXT NOT NULL,
  amount INTEGER NOT NULL DEFAULT 0,
  reward_id TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_rewards_date ON rewards(date_ms);

CREATE TABLE IF NOT EXISTS reward_types (
  id TEXT PRIMARY KEY,
  payload_json TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS units (
  date_ms INTEGER PRIMARY KEY,
  army_json TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS units_daily (
  date_ms INTEGER PRIMARY KEY,
  army_json TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS treasure_player (
  date_ms INTEGER PRIMARY KEY,
  resources_json TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS treasure_player_daily (
  date_ms INTEGER PRIMARY KEY,
  resources_json TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS treasure_clan (
  date_ms INTEGER NOT NULL,
  clan_id INTEGER NOT NULL,
  resources_json TEXT NOT NULL DEFAULT '{}',
  PRIMARY KEY (date_ms, clan_id)
);

CREATE TABLE IF NOT EXISTS treasure_clan_daily (
  date_ms INTEGER NOT NULL,
  clan_id INTEGER NOT NULL,
  resources_json TEXT NOT NULL DEFAULT '{}',
  PRIMARY KEY (date_ms, clan_id)
);
"#,
        )?;

        conn.pragma_update(None, "user_version", 1_i64)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests;
