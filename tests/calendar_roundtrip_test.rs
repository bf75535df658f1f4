use anbar_ledger::calendar::{
    is_jalali_leap_year, jalali_month_length, to_gregorian, to_jalali, JalaliDate,
};
use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

proptest! {
    /// Gregorian -> Jalali -> Gregorian is the identity across a
    /// multi-century window (1800-01-01 plus up to ~550 years).
    #[test]
    fn gregorian_round_trip(offset in 0i64..200_000) {
        let base = NaiveDate::from_ymd_opt(1800, 1, 1).unwrap();
        let date = base + Duration::days(offset);
        let jalali = to_jalali(date).unwrap();
        prop_assert_eq!(to_gregorian(jalali).unwrap(), date);
    }

    /// Jalali -> Gregorian -> Jalali is the identity for every date that
    /// exists in the Jalali calendar.
    #[test]
    fn jalali_round_trip(year in 1200i32..1600, month in 1u32..=12, day_seed in 0u32..31) {
        let day = 1 + day_seed % jalali_month_length(year, month);
        let jalali = JalaliDate { year, month, day };
        let gregorian = to_gregorian(jalali).unwrap();
        prop_assert_eq!(to_jalali(gregorian).unwrap(), jalali);
    }

    /// Consecutive Gregorian days map to consecutive Jalali days: the mapped
    /// day either advances within a month or rolls over to day 1.
    #[test]
    fn mapping_is_monotonic(offset in 0i64..60_000) {
        let base = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let today = base + Duration::days(offset);
        let tomorrow = today + Duration::days(1);
        let j_today = to_jalali(today).unwrap();
        let j_tomorrow = to_jalali(tomorrow).unwrap();
        if j_tomorrow.day != 1 {
            prop_assert_eq!(j_tomorrow.day, j_today.day + 1);
            prop_assert_eq!(j_tomorrow.month, j_today.month);
            prop_assert_eq!(j_tomorrow.year, j_today.year);
        } else {
            prop_assert!(j_today.day == jalali_month_length(j_today.year, j_today.month));
        }
    }
}

#[test]
fn leap_cycle_density() {
    // Jalali leap years occur 8 times per 33-year cycle.
    let leaps = (1375..1408).filter(|&y| is_jalali_leap_year(y)).count();
    assert_eq!(leaps, 8);
}
