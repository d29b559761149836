//! Time bucketing. All calendar math is done in UTC.

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, Time, Weekday};

pub const HOUR_MS: i64 = 3_600_000;
pub const DAY_MS: i64 = 24 * HOUR_MS;

pub fn to_datetime(ms: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp_nanos(ms as i128 * 1_000_000)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

pub fn to_ms(dt: OffsetDateTime) -> i64 {
    (dt.unix_timestamp_nanos() / 1_000_000) as i64
}

pub fn start_of_day(ms: i64) -> i64 {
    to_ms(to_datetime(ms).replace_time(Time::MIDNIGHT))
}

pub fn start_of_hour(ms: i64) -> i64 {
    let dt = to_datetime(ms);
    let hour = Time::from_hms(dt.hour(), 0, 0).unwrap_or(Time::MIDNIGHT);
    to_ms(dt.replace_time(hour))
}

pub fn start_of_month(ms: i64) -> i64 {
    let dt = to_datetime(ms).replace_time(Time::MIDNIGHT);
    dt.replace_day(1).map(to_ms).unwrap_or_else(|_| to_ms(dt))
}

/// Same instant one calendar year earlier; Feb 29 falls back to 365 days.
pub fn one_year_before(ms: i64) -> i64 {
    let dt = to_datetime(ms);
    dt.replace_year(dt.year() - 1)
        .map(to_ms)
        .unwrap_or_else(|_| to_ms(dt - Duration::days(365)))
}

/// Window the reward chart covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Period {
    #[default]
    Today,
    SinceTuesday,
    #[serde(rename = "last7days")]
    Last7Days,
    ThisMonth,
    #[serde(rename = "last30days")]
    Last30Days,
    All,
}

impl Period {
    pub const ALL: [Period; 6] = [
        Period::Today,
        Period::SinceTuesday,
        Period::Last7Days,
        Period::ThisMonth,
        Period::Last30Days,
        Period::All,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::SinceTuesday => "sinceTuesday",
            Period::Last7Days => "last7days",
            Period::ThisMonth => "thisMonth",
            Period::Last30Days => "last30days",
            Period::All => "all",
        }
    }

    /// Exclusive lower bound, in ms, of the window ending at `now_ms`.
    pub fn start_ms(self, now_ms: i64) -> i64 {
        match self {
            Period::Today => start_of_day(now_ms),
            Period::SinceTuesday => {
                let today = start_of_day(now_ms);
                let weekday = to_datetime(now_ms).weekday();
                let back = (weekday.number_days_from_sunday() + 7
                    - Weekday::Tuesday.number_days_from_sunday())
                    % 7;
                today - back as i64 * DAY_MS
            }
            Period::Last7Days => now_ms - 7 * DAY_MS,
            Period::ThisMonth => start_of_month(now_ms),
            Period::Last30Days => now_ms - 30 * DAY_MS,
            Period::All => 0,
        }
    }
}

impl std::str::FromStr for Period {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ParseError::UnknownPeriod(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn ms(dt: OffsetDateTime) -> i64 {
        to_ms(dt)
    }

    #[test]
    fn day_and_hour_buckets() {
        let now = ms(datetime!(2024-03-14 15:42:07.250 UTC));
        assert_eq!(start_of_day(now), ms(datetime!(2024-03-14 0:00 UTC)));
        assert_eq!(start_of_hour(now), ms(datetime!(2024-03-14 15:00 UTC)));
        assert_eq!(start_of_month(now), ms(datetime!(2024-03-01 0:00 UTC)));
    }

    #[test]
    fn since_tuesday_is_most_recent_tuesday() {
        // 2024-03-14 is a Thursday.
        let thursday = ms(datetime!(2024-03-14 10:00 UTC));
        assert_eq!(
            Period::SinceTuesday.start_ms(thursday),
            ms(datetime!(2024-03-12 0:00 UTC))
        );
        let tuesday = ms(datetime!(2024-03-12 08:00 UTC));
        assert_eq!(
            Period::SinceTuesday.start_ms(tuesday),
            ms(datetime!(2024-03-12 0:00 UTC))
        );
        let monday = ms(datetime!(2024-03-11 23:00 UTC));
        assert_eq!(
            Period::SinceTuesday.start_ms(monday),
            ms(datetime!(2024-03-05 0:00 UTC))
        );
    }

    #[test]
    fn leap_day_year_back() {
        let leap = ms(datetime!(2024-02-29 12:00 UTC));
        assert_eq!(one_year_before(leap), ms(datetime!(2023-03-01 12:00 UTC)));
        let plain = ms(datetime!(2024-06-01 0:00 UTC));
        assert_eq!(one_year_before(plain), ms(datetime!(2023-06-01 0:00 UTC)));
    }

    #[test]
    fn periods_parse_from_panel_names() {
        assert_eq!("last7days".parse::<Period>().unwrap(), Period::Last7Days);
        assert_eq!("sinceTuesday".parse::<Period>().unwrap(), Period::SinceTuesday);
        assert!("yesterday".parse::<Period>().is_err());
        assert_eq!(Period::All.start_ms(123), 0);
    }
}
