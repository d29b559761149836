use super::*;
use crate::citymap::ScaleUnit;
use crate::stats::period::{start_of_day, start_of_hour, to_ms, DAY_MS, HOUR_MS};
use crate::stats::StatsSource;
use cityscope_protocol::{ArmyCount, CollectedReward, LeaderboardEntry, PlayerRef, Resources};
use serde_json::json;
use time::macros::datetime;

fn temp_engine() -> Engine {
    let p = std::env::temp_dir().join(format!(
        "cityscope-engine-test-{}.db",
        time::OffsetDateTime::now_utc().unix_timestamp_nanos()
    ));
    let engine = Engine::new(p);
    let _ = engine.open().expect("open db");
    engine
}

fn now() -> i64 {
    to_ms(datetime!(2024-03-14 15:42 UTC))
}

fn resources(pairs: &[(&str, i64)]) -> Resources {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn reward(id: &str, amount: i64, extra: serde_json::Value) -> CollectedReward {
    CollectedReward {
        id: id.to_string(),
        amount: Some(amount),
        extra: extra.as_object().cloned().unwrap_or_default(),
    }
}

fn count_rows(engine: &Engine, table: &str) -> i64 {
    let conn = engine.open().unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn migrate_is_idempotent() {
    let engine = temp_engine();
    let conn = engine.open().unwrap();
    let v: i64 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap();
    assert_eq!(v, 1);
    drop(conn);
    engine.open().unwrap();
}

#[test]
fn map_prefs_default_then_round_trip() {
    let engine = temp_engine();
    let prefs = engine.load_map_prefs().unwrap();
    assert_eq!(prefs, MapPrefs::default());
    assert_eq!(prefs.view, CityView::Skew);
    assert_eq!(prefs.scale.percent(), 100);

    let wanted = MapPrefs {
        scale: ScaleUnit::new(140).unwrap(),
        view: CityView::Normal,
    };
    engine.save_map_prefs(&wanted).unwrap();
    engine.save_map_prefs(&wanted).unwrap();
    assert_eq!(engine.load_map_prefs().unwrap(), wanted);
    assert_eq!(count_rows(&engine, "prefs"), 2);
}

#[test]
fn unreadable_prefs_fall_back() {
    let engine = temp_engine();
    let conn = engine.open().unwrap();
    conn.execute(
        "INSERT INTO prefs (key, value, updated_at_ms) VALUES ('citymap.scale', 'huge', 0), ('citymap.view', 'iso', 0)",
        [],
    )
    .unwrap();
    assert_eq!(engine.load_map_prefs().unwrap(), MapPrefs::default());
}

#[test]
fn leaderboard_snapshots_and_player_cache() {
    let engine = temp_engine();
    let entry = |id, name: &str, n, b| LeaderboardEntry {
        player: PlayerRef {
            player_id: id,
            name: name.to_string(),
            avatar: "portrait_1".to_string(),
        },
        negotiations_won: n,
        battles_won: b,
        rank: None,
    };

    engine
        .record_leaderboard(&[entry(1, "Ann", Some(3), None)], now() - HOUR_MS)
        .unwrap();
    engine
        .record_leaderboard(
            &[entry(1, "Ann B.", Some(4), Some(2)), entry(2, "Bo", None, Some(9))],
            now(),
        )
        .unwrap();

    let snapshots = engine.load_leaderboard().unwrap();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0].players[&1].n, 3);
    assert_eq!(snapshots[0].players[&1].b, 0);
    assert_eq!(snapshots[0].players[&1].r, 1);
    assert_eq!(snapshots[1].players[&2].b, 9);

    let cache = engine.load_player_cache().unwrap();
    assert_eq!(cache.len(), 2);
    assert_eq!(cache[0].name, "Ann B.");
    assert_eq!(cache[0].date_ms, now());
}

#[test]
fn only_tracked_reward_sources_are_kept() {
    let engine = temp_engine();
    let dye = reward(
        "dye_10",
        10,
        json!({"name": "10 Dye", "type": "good", "subType": "dye", "__class__": "Reward", "unit": {"hp": 10}}),
    );

    assert_eq!(engine.record_rewards("greatBuilding", &[dye.clone()], now()).unwrap(), 0);
    assert_eq!(count_rows(&engine, "rewards"), 0);

    assert_eq!(
        engine
            .record_rewards("guildExpedition", &[dye.clone(), dye.clone()], now())
            .unwrap(),
        2
    );
    assert_eq!(count_rows(&engine, "rewards"), 2);

    let types = engine.load_reward_types().unwrap();
    assert_eq!(types.len(), 1);
    let info = &types["dye_10"];
    assert_eq!(info["name"], "10 Dye");
    assert_eq!(info["amount"], 10);
    assert!(info.get("unit").is_none());
    assert!(info.get("__class__").is_none());
}

#[test]
fn rewards_since_is_exclusive() {
    let engine = temp_engine();
    let spoils = reward("premium_5", 5, json!({}));
    engine
        .record_rewards("spoilsOfWar", &[spoils.clone()], now() - DAY_MS)
        .unwrap();
    engine.record_rewards("spoilsOfWar", &[spoils], now()).unwrap();

    assert_eq!(engine.load_rewards_since(now() - DAY_MS).unwrap().len(), 1);
    assert_eq!(engine.load_rewards_since(0).unwrap().len(), 2);
}

#[test]
fn treasury_upserts_per_bucket() {
    let engine = temp_engine();
    engine
        .record_player_treasury(&resources(&[("dye", 10)]), now())
        .unwrap();
    engine
        .record_player_treasury(&resources(&[("dye", 12)]), now() + 60_000)
        .unwrap();
    engine
        .record_player_treasury(&resources(&[("dye", 15)]), now() + HOUR_MS)
        .unwrap();

    let hourly = engine.load_treasury(StatsSource::TreasurePlayer, None).unwrap();
    assert_eq!(hourly.len(), 2);
    assert_eq!(hourly[0].date_ms, start_of_hour(now()));
    assert_eq!(hourly[0].resources["dye"], 12);
    assert_eq!(hourly[1].resources["dye"], 15);

    let daily = engine
        .load_treasury(StatsSource::TreasurePlayerDaily, None)
        .unwrap();
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].date_ms, start_of_day(now()));
    assert_eq!(daily[0].resources["dye"], 15);
}

#[test]
fn clan_treasury_filtered_by_clan() {
    let engine = temp_engine();
    engine
        .record_clan_treasury(7, &resources(&[("steel", 100)]), now())
        .unwrap();
    engine
        .record_clan_treasury(8, &resources(&[("steel", 900)]), now())
        .unwrap();

    let mine = engine.load_treasury(StatsSource::TreasureClan, Some(7)).unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].clan_id, Some(7));
    assert_eq!(mine[0].resources["steel"], 100);

    assert!(engine
        .load_treasury(StatsSource::TreasureClanDaily, None)
        .unwrap()
        .is_empty());
    assert!(engine.load_treasury(StatsSource::Units, None).is_err());
}

#[test]
fn army_counts_are_summed_per_unit() {
    let engine = temp_engine();
    let count = |id: &str, attached, unattached| ArmyCount {
        unit_type_id: id.to_string(),
        attached,
        unattached,
    };
    engine
        .record_army(
            &[
                count("rogue", Some(2), Some(5)),
                count("rogue", None, Some(1)),
                count("tank", Some(3), None),
            ],
            now(),
        )
        .unwrap();

    let army = engine.load_army(StatsSource::UnitsDaily).unwrap();
    assert_eq!(army.len(), 1);
    assert_eq!(army[0].army["rogue"], 8);
    assert_eq!(army[0].army["tank"], 3);
    assert_eq!(engine.load_army(StatsSource::Units).unwrap().len(), 1);
    assert!(engine.load_army(StatsSource::GbgPlayers).is_err());
}

#[test]
fn garbage_collection_honors_retention() {
    let engine = temp_engine();
    let old = now() - 9 * DAY_MS;
    let ancient = now() - 400 * DAY_MS;

    engine
        .record_player_treasury(&resources(&[("dye", 1)]), ancient)
        .unwrap();
    engine
        .record_player_treasury(&resources(&[("dye", 2)]), old)
        .unwrap();
    engine
        .record_player_treasury(&resources(&[("dye", 3)]), now())
        .unwrap();
    engine
        .record_leaderboard(&[LeaderboardEntry::default()], now() - 15 * DAY_MS)
        .unwrap();

    let report = engine.collect_garbage(now()).unwrap();
    assert_eq!(report.deleted["treasure_player"], 2);
    assert_eq!(report.deleted["treasure_player_daily"], 1);
    assert_eq!(report.deleted["gbg_players"], 1);
    assert_eq!(report.deleted["player_cache"], 1);
    assert_eq!(report.total(), 5);

    assert_eq!(
        engine
            .load_treasury(StatsSource::TreasurePlayerDaily, None)
            .unwrap()
            .len(),
        2
    );
    assert_eq!(engine.collect_garbage(now()).unwrap().total(), 0);
}
