//! Period resolution.
//!
//! Maps a cadence and a reference date to the inclusive calendar window
//! that counts as "the current period". Weeks run Monday through Sunday,
//! so a Sunday closes the week that began six days earlier.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use tally_core::Cadence;

/// Inclusive calendar window. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodWindow {
    /// First day of the period
    pub start: NaiveDate,
    /// Last day of the period
    pub end: NaiveDate,
}

impl PeriodWindow {
    /// Whether `date` falls inside the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days covered, counting both ends.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Resolve the period of `cadence` that contains `reference`.
pub fn resolve(cadence: Cadence, reference: NaiveDate) -> PeriodWindow {
    match cadence {
        Cadence::Daily => PeriodWindow {
            start: reference,
            end: reference,
        },
        Cadence::Weekly => {
            let offset = i64::from(reference.weekday().num_days_from_monday());
            let start = reference
                .checked_sub_signed(Duration::days(offset))
                .unwrap_or(NaiveDate::MIN);
            let end = start
                .checked_add_signed(Duration::days(6))
                .unwrap_or(NaiveDate::MAX);
            PeriodWindow { start, end }
        }
        Cadence::Monthly => {
            let start = reference.with_day(1).unwrap_or(reference);
            // Day before the first of next month.
            let end = start
                .checked_add_months(Months::new(1))
                .and_then(|next| next.pred_opt())
                .unwrap_or(NaiveDate::MAX);
            PeriodWindow { start, end }
        }
    }
}

/// Resolve using the local date fields of `reference` as-is.
pub fn resolve_at<Tz: TimeZone>(cadence: Cadence, reference: &DateTime<Tz>) -> PeriodWindow {
    resolve(cadence, reference.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Weekday};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_is_single_day() {
        let mut d = day(2023, 12, 25);
        for _ in 0..20 {
            let window = resolve(Cadence::Daily, d);
            assert_eq!((window.start, window.end), (d, d));
            assert_eq!(window.days(), 1);
            d = d.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_weekly_is_monday_to_sunday() {
        // Walk a full year to hit every weekday and the year boundary.
        let mut d = day(2023, 12, 1);
        for _ in 0..400 {
            let window = resolve(Cadence::Weekly, d);
            assert_eq!(window.start.weekday(), Weekday::Mon);
            assert_eq!(window.end.weekday(), Weekday::Sun);
            assert_eq!(window.days(), 7);
            assert!(window.contains(d));
            d = d.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_sunday_closes_previous_week() {
        let sunday = day(2024, 3, 10);
        assert_eq!(sunday.weekday(), Weekday::Sun);

        let window = resolve(Cadence::Weekly, sunday);
        assert_eq!(window.start, day(2024, 3, 4));
        assert_eq!(window.end, sunday);
        assert!(!window.contains(day(2024, 3, 3)));
    }

    #[test]
    fn test_monday_opens_new_week() {
        let window = resolve(Cadence::Weekly, day(2024, 3, 11));
        assert_eq!(window.start, day(2024, 3, 11));
        assert_eq!(window.end, day(2024, 3, 17));
    }

    #[test]
    fn test_week_spanning_year_end() {
        let window = resolve(Cadence::Weekly, day(2025, 1, 1));
        assert_eq!(window.start, day(2024, 12, 30));
        assert_eq!(window.end, day(2025, 1, 5));
    }

    #[test]
    fn test_monthly_february() {
        let leap = resolve(Cadence::Monthly, day(2024, 2, 15));
        assert_eq!((leap.start, leap.end), (day(2024, 2, 1), day(2024, 2, 29)));

        let common = resolve(Cadence::Monthly, day(2023, 2, 15));
        assert_eq!((common.start, common.end), (day(2023, 2, 1), day(2023, 2, 28)));

        let century = resolve(Cadence::Monthly, day(1900, 2, 10));
        assert_eq!(century.end, day(1900, 2, 28));
    }

    #[test]
    fn test_monthly_month_lengths() {
        let cases = [
            (day(2024, 1, 31), day(2024, 1, 31)),
            (day(2024, 4, 1), day(2024, 4, 30)),
            (day(2024, 12, 31), day(2024, 12, 31)),
            (day(2024, 11, 15), day(2024, 11, 30)),
        ];
        for (reference, expected_end) in cases {
            let window = resolve(Cadence::Monthly, reference);
            assert_eq!(window.start.day(), 1);
            assert_eq!(window.start.month(), reference.month());
            assert_eq!(window.end, expected_end);
            assert!(window.contains(reference));
        }
    }

    #[test]
    fn test_calendar_edges_saturate() {
        for cadence in Cadence::ALL {
            let last = resolve(cadence, NaiveDate::MAX);
            assert!(last.contains(NaiveDate::MAX));
            assert!(last.start <= last.end);

            let first = resolve(cadence, NaiveDate::MIN);
            assert!(first.contains(NaiveDate::MIN));
            assert!(first.start <= first.end);
        }
    }

    #[test]
    fn test_unknown_cadence_label_resolves_monthly() {
        let reference = day(2024, 3, 10);
        assert_eq!(
            resolve(Cadence::from("biweekly"), reference),
            resolve(Cadence::Monthly, reference)
        );
    }

    #[test]
    fn test_resolve_at_uses_local_date_fields() {
        // 23:30 on Sunday at UTC+9 is still Sunday locally.
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        let instant = tz.with_ymd_and_hms(2024, 3, 10, 23, 30, 0).unwrap();

        let window = resolve_at(Cadence::Weekly, &instant);
        assert_eq!(window.start, day(2024, 3, 4));
        assert_eq!(window.end, day(2024, 3, 10));
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let reference = day(2024, 7, 19);
        for cadence in Cadence::ALL {
            assert_eq!(resolve(cadence, reference), resolve(cadence, reference));
        }
    }
}
