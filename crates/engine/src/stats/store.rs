use super::period::{one_year_before, start_of_day, start_of_hour, DAY_MS};
use super::{StatsSource, TRACKABLE_REWARDS};
use crate::Engine;
use anyhow::Context;
use cityscope_protocol::{ArmyCount, CollectedReward, LeaderboardEntry, Resources};
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hourly tables keep 8 days.
pub const HOURLY_RETENTION_MS: i64 = 8 * DAY_MS;
/// Battleground logs keep 2 weeks.
pub const GBG_RETENTION_MS: i64 = 14 * DAY_MS;

const DAILY_TABLES: [&str; 4] = [
    "rewards",
    "units_daily",
    "treasure_player_daily",
    "treasure_clan_daily",
];
const HOURLY_TABLES: [&str; 3] = ["units", "treasure_player", "treasure_clan"];
const GBG_TABLES: [&str; 2] = ["gbg_players", "player_cache"];

/// Leaderboard standing of one player: negotiations, battles, rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub n: i64,
    pub b: i64,
    pub r: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardSnapshot {
    pub date_ms: i64,
    pub players: BTreeMap<i64, PlayerScore>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPlayer {
    pub id: i64,
    pub name: String,
    pub avatar: String,
    pub date_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRow {
    pub date_ms: i64,
    pub source: String,
    pub amount: i64,
    pub reward_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmySnapshot {
    pub date_ms: i64,
    /// Unit type id to head count.
    pub army: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasurySnapshot {
    pub date_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clan_id: Option<i64>,
    pub resources: Resources,
}

/// Rows removed per table by one garbage collection run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcReport {
    pub deleted: BTreeMap<String, usize>,
}

impl GcReport {
    pub fn total(&self) -> usize {
        self.deleted.values().sum()
    }
}

impl Engine {
    pub fn record_leaderboard(
        &self,
        entries: &[LeaderboardEntry],
        now_ms: i64,
    ) -> anyhow::Result<()> {
        let players: BTreeMap<i64, PlayerScore> = entries
            .iter()
            .map(|e| {
                (
                    e.player.player_id,
                    PlayerScore {
                        n: e.negotiations_won.unwrap_or(0),
                        b: e.battles_won.unwrap_or(0),
                        r: e.rank.unwrap_or(1),
                    },
                )
            })
            .collect();

        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO gbg_players (date_ms, players_json) VALUES (?1, ?2)",
            (now_ms, serde_json::to_string(&players)?),
        )?;
        for e in entries {
            tx.execute(
                "INSERT OR REPLACE INTO player_cache (id, name, avatar, date_ms) VALUES (?1, ?2, ?3, ?4)",
                (e.player.player_id, &e.player.name, &e.player.avatar, now_ms),
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Returns how many reward rows were written.
    pub fn record_rewards(
        &self,
        source: &str,
        rewards: &[CollectedReward],
        now_ms: i64,
    ) -> anyhow::Result<usize> {
        if !TRACKABLE_REWARDS.contains(&source) {
            tracing::debug!(source, "reward source not tracked");
            return Ok(0);
        }

        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        for reward in rewards {
            let known: Option<String> = tx
                .query_row(
                    "SELECT id FROM reward_types WHERE id = ?1",
                    [&reward.id],
                    |row| row.get(0),
                )
                .optional()?;
            if known.is_none() {
                let mut info = reward.extra.clone();
                info.remove("unit");
                info.remove("__class__");
                info.insert("id".to_string(), serde_json::Value::from(reward.id.clone()));
                if let Some(amount) = reward.amount {
                    info.insert("amount".to_string(), serde_json::Value::from(amount));
                }
                tx.execute(
                    "INSERT INTO reward_types (id, payload_json) VALUES (?1, ?2)",
                    (&reward.id, serde_json::Value::Object(info).to_string()),
                )?;
            }
            tx.execute(
                "INSERT INTO rewards (date_ms, source, amount, reward_id) VALUES (?1, ?2, ?3, ?4)",
                (now_ms, source, reward.amount.unwrap_or(0), &reward.id),
            )?;
        }
        tx.commit()?;
        Ok(rewards.len())
    }

    pub fn record_player_treasury(&self, resources: &Resources, now_ms: i64) -> anyhow::Result<()> {
        let json = serde_json::to_string(resources)?;
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        for (table, date_ms) in [
            ("treasure_player_daily", start_of_day(now_ms)),
            ("treasure_player", start_of_hour(now_ms)),
        ] {
            tx.execute(
                &format!("INSERT OR REPLACE INTO {table} (date_ms, resources_json) VALUES (?1, ?2)"),
                (date_ms, &json),
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn record_clan_treasury(
        &self,
        clan_id: i64,
        resources: &Resources,
        now_ms: i64,
    ) -> anyhow::Result<()> {
        let json = serde_json::to_string(resources)?;
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        for (table, date_ms) in [
            ("treasure_clan_daily", start_of_day(now_ms)),
            ("treasure_clan", start_of_hour(now_ms)),
        ] {
            tx.execute(
                &format!(
                    "INSERT OR REPLACE INTO {table} (date_ms, clan_id, resources_json) VALUES (?1, ?2, ?3)"
                ),
                (date_ms, clan_id, &json),
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn record_army(&self, counts: &[ArmyCount], now_ms: i64) -> anyhow::Result<()> {
        let mut army: BTreeMap<String, i64> = BTreeMap::new();
        for c in counts {
            let count = c.attached.unwrap_or(0).saturating_add(c.unattached.unwrap_or(0));
            let total = army.entry(c.unit_type_id.clone()).or_insert(0);
            *total = total.saturating_add(count);
        }
        let json = serde_json::to_string(&army)?;

        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        for (table, date_ms) in [
            ("units_daily", start_of_day(now_ms)),
            ("units", start_of_hour(now_ms)),
        ] {
            tx.execute(
                &format!("INSERT OR REPLACE INTO {table} (date_ms, army_json) VALUES (?1, ?2)"),
                (date_ms, &json),
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Drops rows past their table's retention window.
    pub fn collect_garbage(&self, now_ms: i64) -> anyhow::Result<GcReport> {
        let cutoffs = DAILY_TABLES
            .iter()
            .map(|t| (*t, one_year_before(now_ms)))
            .chain(HOURLY_TABLES.iter().map(|t| (*t, now_ms - HOURLY_RETENTION_MS)))
            .chain(GBG_TABLES.iter().map(|t| (*t, now_ms - GBG_RETENTION_MS)));

        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        let mut report = GcReport::default();
        for (table, cutoff) in cutoffs {
            let n = tx
                .execute(&format!("DELETE FROM {table} WHERE date_ms < ?1"), [cutoff])
                .with_context(|| format!("prune {table}"))?;
            report.deleted.insert(table.to_string(), n);
        }
        tx.commit()?;

        tracing::info!(deleted = report.total(), "stats garbage collected");
        Ok(report)
    }

    pub fn load_leaderboard(&self) -> anyhow::Result<Vec<LeaderboardSnapshot>> {
        let conn = self.open()?;
        let mut stmt =
            conn.prepare("SELECT date_ms, players_json FROM gbg_players ORDER BY date_ms")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (date_ms, json) = row?;
            out.push(LeaderboardSnapshot {
                date_ms,
                players: serde_json::from_str(&json)
                    .with_context(|| format!("decode leaderboard at {date_ms}"))?,
            });
        }
        Ok(out)
    }

    pub fn load_player_cache(&self) -> anyhow::Result<Vec<CachedPlayer>> {
        let conn = self.open()?;
        let mut stmt =
            conn.prepare("SELECT id, name, avatar, date_ms FROM player_cache ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(CachedPlayer {
                id: row.get(0)?,
                name: row.get(1)?,
                avatar: row.get(2)?,
                date_ms: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Reward rows strictly after `since_ms`.
    pub fn load_rewards_since(&self, since_ms: i64) -> anyhow::Result<Vec<RewardRow>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT date_ms, source, amount, reward_id FROM rewards WHERE date_ms > ?1 ORDER BY date_ms, seq",
        )?;
        let rows = stmt.query_map([since_ms], |row| {
            Ok(RewardRow {
                date_ms: row.get(0)?,
                source: row.get(1)?,
                amount: row.get(2)?,
                reward_id: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn load_reward_types(&self) -> anyhow::Result<BTreeMap<String, serde_json::Value>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare("SELECT id, payload_json FROM reward_types")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut out = BTreeMap::new();
        for row in rows {
            let (id, json) = row?;
            out.insert(id, serde_json::from_str(&json)?);
        }
        Ok(out)
    }

    pub fn load_army(&self, source: StatsSource) -> anyhow::Result<Vec<ArmySnapshot>> {
        anyhow::ensure!(source.is_units(), "{source} is not an army source");
        let conn = self.open()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT date_ms, army_json FROM {} ORDER BY date_ms",
            source.table()
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (date_ms, json) = row?;
            out.push(ArmySnapshot {
                date_ms,
                army: serde_json::from_str(&json)?,
            });
        }
        Ok(out)
    }

    /// Treasury snapshots in date order. Clan sources only return rows of `clan_id`.
    pub fn load_treasury(
        &self,
        source: StatsSource,
        clan_id: Option<i64>,
    ) -> anyhow::Result<Vec<TreasurySnapshot>> {
        anyhow::ensure!(source.is_treasure(), "{source} is not a treasury source");
        let conn = self.open()?;

        let decode = |date_ms: i64, clan: Option<i64>, json: String| -> anyhow::Result<_> {
            Ok(TreasurySnapshot {
                date_ms,
                clan_id: clan,
                resources: serde_json::from_str(&json)?,
            })
        };

        let mut out = Vec::new();
        if source.is_clan() {
            let Some(clan_id) = clan_id else {
                return Ok(out);
            };
            let mut stmt = conn.prepare(&format!(
                "SELECT date_ms, clan_id, resources_json FROM {} WHERE clan_id = ?1 ORDER BY date_ms",
                source.table()
            ))?;
            let rows = stmt.query_map([clan_id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, String>(2)?))
            })?;
            for row in rows {
                let (date_ms, clan, json) = row?;
                out.push(decode(date_ms, Some(clan), json)?);
            }
        } else {
            let mut stmt = conn.prepare(&format!(
                "SELECT date_ms, resources_json FROM {} ORDER BY date_ms",
                source.table()
            ))?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in rows {
                let (date_ms, json) = row?;
                out.push(decode(date_ms, None, json)?);
            }
        }
        Ok(out)
    }
}
