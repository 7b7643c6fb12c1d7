//! Gate timestamp encoding.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use proptest::prelude::*;

use model_link::protocol::gate_time::GATE_TIME_FORMAT;
use model_link::protocol::GateTime;
use model_link::AppError;

#[test]
fn encodes_fixed_width_fields() {
    let gate = GateTime::from_ymd_hms(2024, 1, 2, 3, 4, 5).unwrap();
    assert_eq!(gate.encode(), "01:02:2024:03:04:05");
    assert_eq!(gate.to_string(), gate.encode());
}

#[test]
fn format_is_month_day_year_hour_minute_second() {
    assert_eq!(GATE_TIME_FORMAT, "%m:%d:%Y:%H:%M:%S");
}

#[test]
fn sub_second_precision_is_dropped() {
    let at = NaiveDate::from_ymd_opt(2024, 5, 6)
        .unwrap()
        .and_hms_milli_opt(7, 8, 9, 750)
        .unwrap();
    let gate = GateTime::new(at);
    assert_eq!(gate, GateTime::from_ymd_hms(2024, 5, 6, 7, 8, 9).unwrap());
}

#[test]
fn from_str_matches_parse() {
    let parsed: GateTime = "12:31:1999:23:59:59".parse().unwrap();
    assert_eq!(parsed, GateTime::from_ymd_hms(1999, 12, 31, 23, 59, 59).unwrap());
}

#[test]
fn leap_day_parses() {
    assert!(GateTime::parse("02:29:2024:00:00:00").is_ok());
    assert!(GateTime::parse("02:29:2023:00:00:00").is_err());
}

#[test]
fn rejects_other_separators() {
    assert!(GateTime::parse("01/02/2024 03:04:05").is_err());
    assert!(GateTime::parse("2024-01-02T03:04:05").is_err());
}

proptest! {
    // Days from CE 1000-01-01 through 9999-12-31, every second of the day.
    #[test]
    fn round_trips_every_calendar_second(days in 364_878i32..3_652_059, secs in 0u32..86_400) {
        let date = NaiveDate::from_num_days_from_ce_opt(days).unwrap();
        let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap();
        let gate = GateTime::new(NaiveDateTime::new(date, time));

        let decoded = GateTime::parse(&gate.encode()).unwrap();
        prop_assert_eq!(decoded, gate);
    }
}

#[test]
fn rejects_surrounding_whitespace() {
    for raw in [" 01:02:2024:03:04:05", "01:02:2024:03:04:05 ", "01: 02:2024:03:04:05"] {
        let result = GateTime::parse(raw);
        assert!(
            matches!(result, Err(AppError::TimestampFormat(_))),
            "{raw:?} gave {result:?}"
        );
    }
}

#[test]
fn rejects_signed_fields() {
    for raw in ["01:02:+2024:03:04:05", "01:02:-2024:03:04:05", "+1:02:2024:03:04:05"] {
        assert!(matches!(GateTime::parse(raw), Err(AppError::TimestampFormat(_))), "{raw:?}");
    }
}

#[test]
fn rejects_unpadded_and_overlong_fields() {
    for raw in [
        "1:2:2024:3:4:5",
        "01:02:24:03:04:05",
        "001:02:2024:03:04:05",
        "01:02:10000:03:04:05",
        "01:02:2024:03:04",
        "01:02:2024:03:04:05:06",
    ] {
        assert!(matches!(GateTime::parse(raw), Err(AppError::TimestampFormat(_))), "{raw:?}");
    }
}

#[test]
fn accepts_zero_padded_year_below_one_thousand() {
    let parsed = GateTime::parse("06:15:0999:12:00:00").unwrap();
    assert_eq!(parsed, GateTime::from_ymd_hms(999, 6, 15, 12, 0, 0).unwrap());
}
