//! Guild vs Guild spending markers on the clan treasury chart.
//!
//! A siege costs the same amount of every good of one era, so a GvG round
//! shows up as several goods of an era dropping by nearly the same value
//! between two snapshots.

use super::resources::{goods_of, kilos, short_era_name, PLAYABLE_ERAS};
use super::store::TreasurySnapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Drops smaller than this are ordinary trading noise.
const BASE_LEVEL: i64 = -100;
/// Relative difference allowed between neighbouring goods.
const MAX_DEVIATION: f64 = 0.15;
/// Goods of one era that have to match.
const MIN_MATCHES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GvgMarker {
    pub date_ms: i64,
    /// Estimated goods spent per era. Medals are reported under `NoAge`.
    pub eras: BTreeMap<String, i64>,
}

impl GvgMarker {
    /// Chart label, one `ERA: amount` line per era.
    pub fn label(&self) -> String {
        let mut out = String::from("GvG");
        for (era, spent) in &self.eras {
            out.push('\n');
            out.push_str(&format!("{}: {}", short_era_name(era), kilos(*spent)));
        }
        out
    }
}

/// Scans consecutive clan treasury snapshots (oldest first, one clan) for
/// GvG spending.
pub fn detect_gvg_spending(snapshots: &[TreasurySnapshot]) -> Vec<GvgMarker> {
    snapshots
        .windows(2)
        .filter_map(|pair| {
            let (prev, cur) = (&pair[0], &pair[1]);
            let delta = |good: &str| {
                let before = prev.resources.get(good).copied().unwrap_or(0);
                cur.resources.get(good).map(|now| now.saturating_sub(before))
            };

            let mut eras = BTreeMap::new();
            for era in PLAYABLE_ERAS {
                if let Some(spent) = era_spending(goods_of(era), &delta) {
                    eras.insert(era.to_string(), spent);
                }
            }
            if let Some(medals) = delta("medals").filter(|d| *d < BASE_LEVEL) {
                eras.insert("NoAge".to_string(), medals);
            }

            (!eras.is_empty()).then(|| GvgMarker {
                date_ms: cur.date_ms,
                eras,
            })
        })
        .collect()
}

/// Lowest matching drop times the number of goods, when enough goods of the
/// era dropped by nearly the same amount. Each good is compared with the one
/// before it, the first with the last.
fn era_spending(goods: &[&str], delta: &impl Fn(&str) -> Option<i64>) -> Option<i64> {
    if goods.len() < 2 {
        return None;
    }
    let diffs: Vec<Option<i64>> = goods.iter().map(|g| delta(g)).collect();

    let mut matches = 0;
    let mut lowest = 0;
    for (i, a) in diffs.iter().enumerate() {
        let b = if i == 0 { diffs[diffs.len() - 1] } else { diffs[i - 1] };
        let (Some(a), Some(b)) = (*a, b) else {
            continue;
        };
        if a >= BASE_LEVEL {
            continue;
        }
        let deviation = ((a as f64 - b as f64) / a as f64).abs();
        if deviation < MAX_DEVIATION {
            matches += 1;
            lowest = lowest.min(a);
        }
    }

    (matches >= MIN_MATCHES).then(|| lowest.saturating_mul(goods.len() as i64))
}
