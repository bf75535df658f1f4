//! Jalali <-> Gregorian calendar boundary.
//!
//! Everything persisted in this crate is Gregorian (`chrono::NaiveDate`);
//! everything shown to or typed by an operator is Jalali. This module is the
//! only place allowed to cross that boundary, and conversion is exact: for
//! any date in the supported era, `to_gregorian(to_jalali(d)) == d`.
//!
//! Conversion uses the break-year-table arithmetic of the Jalali civil
//! calendar mapped through Julian Day Numbers; the Gregorian leg is delegated
//! to `chrono` via its days-from-CE anchor.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// Jalali break years delimiting the 33-year leap sub-cycles. Valid input
/// years are `BREAKS[0] ..= BREAKS[last] - 1` (roughly 560..=3797 CE).
const BREAKS: [i32; 20] = [
    -61, 9, 38, 199, 426, 686, 756, 818, 1111, 1181, 1210, 1635, 2060, 2097, 2192, 2262, 2324,
    2394, 2456, 3178,
];

/// `num_days_from_ce` of a date plus this offset equals its Julian Day Number.
const JDN_OFFSET: i64 = 1_721_425;

/// Year bands for the loose-parse calendar guess. Inherited policy: years in
/// `[1300, 1500]` are read as Jalali, years above as Gregorian, anything below
/// is flagged as ambiguous rather than guessed.
const JALALI_BAND_MIN: i32 = 1300;
const JALALI_BAND_MAX: i32 = 1500;

/// A date in the Persian (Jalali) civil calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JalaliDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl fmt::Display for JalaliDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:02}/{:02}", self.year, self.month, self.day)
    }
}

/// Which calendar the loose parser decided an input string was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalendarKind {
    Jalali,
    Gregorian,
}

/// Result of [`parse_loose_date`]: the date normalized to Gregorian, plus the
/// calendar the input was judged to be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub date: NaiveDate,
    pub kind: CalendarKind,
}

struct JalCal {
    /// Years since the previous leap year (0 means `jy` itself is leap).
    leap: i32,
    /// Gregorian year containing the start of `jy`.
    gy: i32,
    /// Day of March on which `jy` begins.
    march: i32,
}

fn jal_cal(jy: i32) -> Result<JalCal, ServiceError> {
    if jy < BREAKS[0] || jy >= BREAKS[BREAKS.len() - 1] {
        return Err(ServiceError::UnparseableDate(format!(
            "Jalali year {jy} is outside the supported era"
        )));
    }
    let gy = jy + 621;

    let mut leap_j = -14i32;
    let mut jp = BREAKS[0];
    let mut jump = 0i32;
    for &jm in &BREAKS[1..] {
        jump = jm - jp;
        if jy < jm {
            break;
        }
        leap_j += jump / 33 * 8 + jump % 33 / 4;
        jp = jm;
    }
    let mut n = jy - jp;

    leap_j += n / 33 * 8 + (n % 33 + 3) / 4;
    if jump % 33 == 4 && jump - n == 4 {
        leap_j += 1;
    }

    let leap_g = gy / 4 - (gy / 100 + 1) * 3 / 4 - 150;
    let march = 20 + leap_j - leap_g;

    if jump - n < 6 {
        n = n - jump + (jump + 4) / 33 * 33;
    }
    let mut leap = ((n + 1) % 33 - 1) % 4;
    if leap == -1 {
        leap = 4;
    }

    Ok(JalCal { leap, gy, march })
}

fn to_jdn(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) + JDN_OFFSET
}

fn from_jdn(jdn: i64) -> Result<NaiveDate, ServiceError> {
    let days = i32::try_from(jdn - JDN_OFFSET)
        .map_err(|_| ServiceError::UnparseableDate(format!("day number {jdn} out of range")))?;
    NaiveDate::from_num_days_from_ce_opt(days)
        .ok_or_else(|| ServiceError::UnparseableDate(format!("day number {jdn} out of range")))
}

fn march_first_jdn(cal: &JalCal) -> Result<i64, ServiceError> {
    let first = NaiveDate::from_ymd_opt(cal.gy, 3, cal.march as u32).ok_or_else(|| {
        ServiceError::InternalError(format!(
            "computed invalid new-year anchor {}-03-{}",
            cal.gy, cal.march
        ))
    })?;
    Ok(to_jdn(first))
}

/// True when the given Jalali year has a 30-day Esfand.
pub fn is_jalali_leap_year(jy: i32) -> bool {
    jal_cal(jy).map(|c| c.leap == 0).unwrap_or(false)
}

/// Number of days in a Jalali month.
pub fn jalali_month_length(jy: i32, jm: u32) -> u32 {
    match jm {
        1..=6 => 31,
        7..=11 => 30,
        12 => {
            if is_jalali_leap_year(jy) {
                30
            } else {
                29
            }
        }
        _ => 0,
    }
}

/// Converts a Gregorian date to its Jalali equivalent.
///
/// Infallible for every date the rest of the crate can produce; the `Err`
/// branch only triggers outside the supported era (before 560 CE or after
/// 3797 CE).
pub fn to_jalali(date: NaiveDate) -> Result<JalaliDate, ServiceError> {
    let gy = date.year();
    let mut jy = gy - 621;
    let cal = jal_cal(jy)?;
    let jdn = to_jdn(date);
    let mut k = jdn - march_first_jdn(&cal)?;

    if k >= 0 {
        if k <= 185 {
            return Ok(JalaliDate {
                year: jy,
                month: (1 + k / 31) as u32,
                day: (k % 31 + 1) as u32,
            });
        }
        k -= 186;
    } else {
        jy -= 1;
        k += 179;
        if cal.leap == 1 {
            k += 1;
        }
    }

    Ok(JalaliDate {
        year: jy,
        month: (7 + k / 30) as u32,
        day: (k % 30 + 1) as u32,
    })
}

/// Converts a Jalali date to its Gregorian equivalent, rejecting dates that do
/// not exist (bad month, day past the month's end, Esfand 30 in a common
/// year).
pub fn to_gregorian(date: JalaliDate) -> Result<NaiveDate, ServiceError> {
    if date.month < 1 || date.month > 12 {
        return Err(ServiceError::UnparseableDate(format!(
            "Jalali month {} out of range",
            date.month
        )));
    }
    let month_len = jalali_month_length(date.year, date.month);
    if date.day < 1 || date.day > month_len {
        return Err(ServiceError::UnparseableDate(format!(
            "Jalali date {date} does not exist"
        )));
    }

    let cal = jal_cal(date.year)?;
    let m = i64::from(date.month);
    let jdn = march_first_jdn(&cal)? + (m - 1) * 31 - (m / 7) * (m - 7) + i64::from(date.day) - 1;
    from_jdn(jdn)
}

/// Zero-padded `YYYY/MM/DD` Jalali rendering of a stored (Gregorian) date.
pub fn format_jalali(date: NaiveDate) -> Result<String, ServiceError> {
    Ok(to_jalali(date)?.to_string())
}

/// Zero-padded `YYYY/MM/DD` Gregorian rendering.
pub fn format_gregorian(date: NaiveDate) -> String {
    format!("{:04}/{:02}/{:02}", date.year(), date.month(), date.day())
}

/// Parses a loosely formatted date string.
///
/// Accepts `/` or `-` separators and a 2-4 digit year written first or last.
/// The calendar is guessed from the year band: `[1300, 1500]` is Jalali,
/// above 1500 is Gregorian. Years below 1300 are ambiguous and reported as
/// [`ServiceError::AmbiguousDateYear`]; the parser never guesses for them.
/// Callers with optional date fields may substitute a default on failure;
/// mandatory dates (purchase/creation) must surface the error.
pub fn parse_loose_date(text: &str) -> Result<ParsedDate, ServiceError> {
    let trimmed = text.trim();
    let parts: Vec<&str> = trimmed.split(['/', '-']).collect();
    if parts.len() != 3 {
        return Err(ServiceError::UnparseableDate(format!(
            "expected three date components in {trimmed:?}"
        )));
    }

    let mut values = [0i64; 3];
    for (slot, part) in values.iter_mut().zip(&parts) {
        if part.is_empty() || part.len() > 4 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ServiceError::UnparseableDate(format!(
                "non-numeric date component {part:?} in {trimmed:?}"
            )));
        }
        *slot = part.parse::<i64>().map_err(|_| {
            ServiceError::UnparseableDate(format!("bad date component {part:?}"))
        })?;
    }

    // YYYY/MM/DD is the dominant form; DD/MM/YYYY is accepted when only the
    // trailing component can plausibly be a year.
    let year_last = parts[0].len() <= 2 && values[0] <= 31 && (parts[2].len() >= 3 || values[2] > 31);
    let (year, month, day) = if year_last {
        (values[2], values[1], values[0])
    } else {
        (values[0], values[1], values[2])
    };
    let year = year as i32;

    if (JALALI_BAND_MIN..=JALALI_BAND_MAX).contains(&year) {
        let jalali = JalaliDate {
            year,
            month: month as u32,
            day: day as u32,
        };
        Ok(ParsedDate {
            date: to_gregorian(jalali)?,
            kind: CalendarKind::Jalali,
        })
    } else if year > JALALI_BAND_MAX {
        let date = NaiveDate::from_ymd_opt(year, month as u32, day as u32).ok_or_else(|| {
            ServiceError::UnparseableDate(format!("Gregorian date {trimmed:?} does not exist"))
        })?;
        Ok(ParsedDate {
            date,
            kind: CalendarKind::Gregorian,
        })
    } else {
        Err(ServiceError::AmbiguousDateYear(year))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn g(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(g(2023, 8, 1), JalaliDate { year: 1402, month: 5, day: 10 })]
    #[case(g(2021, 3, 21), JalaliDate { year: 1400, month: 1, day: 1 })]
    #[case(g(1970, 1, 1), JalaliDate { year: 1348, month: 10, day: 11 })]
    #[case(g(2024, 3, 20), JalaliDate { year: 1403, month: 1, day: 1 })]
    #[case(g(2025, 3, 20), JalaliDate { year: 1403, month: 12, day: 30 })]
    fn known_pairs(#[case] gregorian: NaiveDate, #[case] jalali: JalaliDate) {
        assert_eq!(to_jalali(gregorian).unwrap(), jalali);
        assert_eq!(to_gregorian(jalali).unwrap(), gregorian);
    }

    #[test]
    fn leap_years() {
        assert!(is_jalali_leap_year(1399));
        assert!(!is_jalali_leap_year(1400));
        assert!(!is_jalali_leap_year(1402));
        assert!(is_jalali_leap_year(1403));
        assert_eq!(jalali_month_length(1403, 12), 30);
        assert_eq!(jalali_month_length(1402, 12), 29);
        assert_eq!(jalali_month_length(1402, 1), 31);
        assert_eq!(jalali_month_length(1402, 7), 30);
    }

    #[test]
    fn esfand_30_rejected_in_common_year() {
        let bad = JalaliDate {
            year: 1402,
            month: 12,
            day: 30,
        };
        assert_matches!(to_gregorian(bad), Err(ServiceError::UnparseableDate(_)));
    }

    #[test]
    fn parse_jalali_band() {
        let parsed = parse_loose_date("1402/05/10").unwrap();
        assert_eq!(parsed.kind, CalendarKind::Jalali);
        assert_eq!(parsed.date, g(2023, 8, 1));
    }

    #[test]
    fn parse_gregorian_band() {
        let parsed = parse_loose_date("2024-05-10").unwrap();
        assert_eq!(parsed.kind, CalendarKind::Gregorian);
        assert_eq!(parsed.date, g(2024, 5, 10));
    }

    #[test]
    fn parse_year_last() {
        let parsed = parse_loose_date("10/05/1402").unwrap();
        assert_eq!(parsed.kind, CalendarKind::Jalali);
        assert_eq!(parsed.date, g(2023, 8, 1));
    }

    #[test]
    fn parse_ambiguous_year_is_flagged() {
        assert_matches!(
            parse_loose_date("0099/01/01"),
            Err(ServiceError::AmbiguousDateYear(99))
        );
        assert_matches!(
            parse_loose_date("1299/12/29"),
            Err(ServiceError::AmbiguousDateYear(1299))
        );
    }

    #[rstest]
    #[case("")]
    #[case("1402/05")]
    #[case("1402/05/10/3")]
    #[case("1402/xx/10")]
    #[case("1402/13/01")]
    #[case("2023-02-30")]
    fn parse_garbage(#[case] input: &str) {
        assert_matches!(
            parse_loose_date(input),
            Err(ServiceError::UnparseableDate(_))
        );
    }

    #[test]
    fn formatting_is_zero_padded() {
        assert_eq!(format_gregorian(g(2024, 5, 9)), "2024/05/09");
        assert_eq!(format_jalali(g(2021, 3, 21)).unwrap(), "1400/01/01");
    }

    #[test]
    fn round_trip_century() {
        // Every day across a multi-century window survives the round trip.
        let mut day = g(1900, 1, 1);
        let end = g(2150, 1, 1);
        while day < end {
            let jalali = to_jalali(day).unwrap();
            assert_eq!(to_gregorian(jalali).unwrap(), day, "round trip for {day}");
            day = day.succ_opt().unwrap();
        }
    }
}
