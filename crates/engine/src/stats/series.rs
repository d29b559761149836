//! Turns stored snapshots into chart series.

use super::resources::{goods_of, selected_eras};
use super::store::{ArmySnapshot, CachedPlayer, LeaderboardSnapshot, RewardRow, TreasurySnapshot};
use super::StatsSource;
use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// `(timestamp_ms, value)`; `None` where the series has no sample.
pub type Point = (i64, Option<i64>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Player id, unit id, good id or era name.
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub era: Option<String>,
    pub data: Vec<Point>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    #[default]
    Streamgraph,
    /// Plotted as a line of differences between consecutive samples.
    Delta,
}

impl std::str::FromStr for ChartType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "line" => Ok(ChartType::Line),
            "streamgraph" => Ok(ChartType::Streamgraph),
            "delta" => Ok(ChartType::Delta),
            other => Err(ParseError::UnknownChartType(other.to_string())),
        }
    }
}

/// Battleground score per player: two points per negotiation, one per battle.
pub fn leaderboard_series(
    snapshots: &[LeaderboardSnapshot],
    players: &[CachedPlayer],
) -> Vec<Series> {
    let names: BTreeMap<i64, &str> = players.iter().map(|p| (p.id, p.name.as_str())).collect();
    let known: BTreeSet<i64> = snapshots
        .iter()
        .flat_map(|s| s.players.keys().copied())
        .collect();

    known
        .into_iter()
        .map(|id| Series {
            key: id.to_string(),
            name: names
                .get(&id)
                .map(|n| n.to_string())
                .unwrap_or_else(|| id.to_string()),
            era: None,
            data: snapshots
                .iter()
                .map(|s| {
                    let score = s
                        .players
                        .get(&id)
                        .map(|p| p.n.saturating_mul(2).saturating_add(p.b));
                    (s.date_ms, score)
                })
                .collect(),
        })
        .collect()
}

/// One series per unit type whose era is selected. `unit_eras` maps a unit
/// type id to the era it becomes available in; units it does not know are left out.
pub fn unit_series(
    snapshots: &[ArmySnapshot],
    eras: &[String],
    unit_eras: &BTreeMap<String, String>,
) -> Vec<Series> {
    let eras = selected_eras(eras);
    let unit_ids: BTreeSet<&str> = snapshots
        .iter()
        .flat_map(|s| s.army.keys().map(String::as_str))
        .collect();

    unit_ids
        .into_iter()
        .filter_map(|unit_id| {
            let era = unit_eras.get(unit_id)?;
            if !eras.contains(&era.as_str()) {
                return None;
            }
            Some(Series {
                key: unit_id.to_string(),
                name: unit_id.to_string(),
                era: Some(era.clone()),
                data: snapshots
                    .iter()
                    .map(|s| (s.date_ms, Some(s.army.get(unit_id).copied().unwrap_or(0))))
                    .collect(),
            })
        })
        .collect()
}

/// One series per good of every selected era.
pub fn treasure_series(snapshots: &[TreasurySnapshot], eras: &[String]) -> Vec<Series> {
    selected_eras(eras)
        .into_iter()
        .flat_map(|era| goods_of(era).iter().map(move |good| (era, *good)))
        .map(|(era, good)| Series {
            key: good.to_string(),
            name: good.to_string(),
            era: Some(era.to_string()),
            data: snapshots
                .iter()
                .map(|s| (s.date_ms, Some(s.resources.get(good).copied().unwrap_or(0))))
                .collect(),
        })
        .collect()
}

/// One series per selected era, summing that era's goods.
pub fn treasure_by_era_series(snapshots: &[TreasurySnapshot], eras: &[String]) -> Vec<Series> {
    selected_eras(eras)
        .into_iter()
        .map(|era| Series {
            key: era.to_string(),
            name: era.to_string(),
            era: Some(era.to_string()),
            data: snapshots
                .iter()
                .map(|s| {
                    let total = goods_of(era)
                        .iter()
                        .map(|g| s.resources.get(*g).copied().unwrap_or(0))
                        .fold(0i64, i64::saturating_add);
                    (s.date_ms, Some(total))
                })
                .collect(),
        })
        .collect()
}

/// Replaces every value with its change since the previous sample; the first
/// sample becomes 0. Drops are clamped to 0 unless `allow_negative`.
pub fn apply_delta(series: &mut [Series], allow_negative: bool) {
    for s in series {
        let values: Vec<i64> = s.data.iter().map(|(_, y)| y.unwrap_or(0)).collect();
        for (i, point) in s.data.iter_mut().enumerate() {
            let delta = if i == 0 { 0 } else { values[i].saturating_sub(values[i - 1]) };
            point.1 = Some(if allow_negative { delta } else { delta.max(0) });
        }
    }
}

/// Applies the chart type to freshly built series and returns the type to
/// draw them with.
pub fn shape_for_chart(
    series: &mut [Series],
    chart: ChartType,
    source: StatsSource,
) -> ChartType {
    match chart {
        ChartType::Delta => {
            // Leaderboard scores only ever grow within a season.
            apply_delta(series, !source.is_leaderboard());
            ChartType::Line
        }
        other => other,
    }
}

/// A slice of the reward pie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardSlice {
    pub reward_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon_class: String,
    /// Times the reward was collected.
    pub count: i64,
    pub total_amount: i64,
}

/// Collected rewards of one source grouped by reward, most frequent first.
/// `rows` are expected to be limited to the wanted period already.
pub fn reward_breakdown(
    rows: &[RewardRow],
    reward_types: &BTreeMap<String, serde_json::Value>,
    source: &str,
) -> Vec<RewardSlice> {
    let mut grouped: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.source == source) {
        let entry = grouped.entry(row.reward_id.as_str()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(row.amount);
    }

    let mut slices: Vec<RewardSlice> = grouped
        .into_iter()
        .map(|(id, (count, total_amount))| {
            let info = reward_types.get(id);
            let field = |key: &str| {
                info.and_then(|v| v.get(key))
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
            };
            let icon_class = match field("type") {
                "unit" => format!("units-icon {}", field("subType")),
                "good" => format!("goods-sprite {}", field("subType")),
                _ => String::new(),
            };
            let name = match field("name") {
                "" => id.to_string(),
                n => n.to_string(),
            };
            RewardSlice {
                reward_id: id.to_string(),
                name,
                icon_class,
                count,
                total_amount,
            }
        })
        .collect();
    slices.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.reward_id.cmp(&b.reward_id)));
    slices
}
