use chrono::Weekday;

use crate::registration::schedule::{schedules_overlap, ScheduleParseError, ScheduleSlot};

#[test]
fn disjoint_weekdays_never_overlap() {
    assert!(!schedules_overlap("MW 10:00-11:30", "TF 09:00-12:00"));
}

#[test]
fn shared_weekday_with_intersecting_times_overlaps() {
    assert!(schedules_overlap("MW 10:00-11:30", "MWF 11:00-12:00"));
}

#[test]
fn back_to_back_meetings_do_not_overlap() {
    assert!(!schedules_overlap("MW 10:00-11:00", "MW 11:00-12:00"));
    assert!(!schedules_overlap("MW 11:00-12:00", "MW 10:00-11:00"));
    assert!(schedules_overlap("MW 10:00-11:01", "MW 11:00-12:00"));
}

#[test]
fn overlap_is_symmetric() {
    let descriptors = [
        "MW 10:00-11:30",
        "TF 09:00-12:00",
        "MWF 11:00-12:00",
        "R 08:00-09:15",
        "TR 09:00-10:00",
        "MTWRF 00:00-23:59",
        "MW 1030-1200",
        "",
        "MW",
        "XY 10:00-11:00",
    ];

    for first in descriptors {
        for second in descriptors {
            assert_eq!(
                schedules_overlap(first, second),
                schedules_overlap(second, first),
                "symmetry violated for '{first}' vs '{second}'"
            );
        }
    }
}

#[test]
fn malformed_descriptors_never_conflict() {
    let valid = "MTWRF 00:00-23:59";
    for malformed in [
        "",
        "   ",
        "MW",
        "MW 10:00",
        "MW 10:00-11:00-12:00",
        "MW ten-eleven",
        "MW 10:00-1x:00",
        "MW 10:00-25:00",
        "MW 10:60-11:00",
    ] {
        assert!(
            !schedules_overlap(valid, malformed),
            "'{malformed}' should be treated as no overlap"
        );
    }
}

#[test]
fn parse_reports_specific_errors() {
    assert_eq!(ScheduleSlot::parse("MW"), Err(ScheduleParseError::MissingFields));
    assert_eq!(
        ScheduleSlot::parse("MW 10:00"),
        Err(ScheduleParseError::MissingSeparator("10:00".to_string()))
    );
    assert_eq!(
        ScheduleSlot::parse("MW 10:00-noon"),
        Err(ScheduleParseError::InvalidTime("noon".to_string()))
    );
    assert_eq!(
        ScheduleSlot::parse("MW 23:00-24:01"),
        Err(ScheduleParseError::InvalidTime("24:01".to_string()))
    );
}

#[test]
fn unrecognised_day_letters_match_themselves() {
    assert!(schedules_overlap("TTh 10:00-11:00", "T 10:30-11:30"));
    assert!(schedules_overlap("TTh 10:00-11:00", "Th 10:30-11:30"));
    assert!(schedules_overlap("Q 10:00-11:00", "q 10:30-11:30"));
    assert!(!schedules_overlap("Q 10:00-11:00", "X 10:30-11:30"));
    assert!(!schedules_overlap("Q 10:00-11:00", "MTWRFSU 00:00-24:00"));

    let slot = ScheduleSlot::parse("MXh 10:00-11:00").expect("unknown letters still parse");
    assert_eq!(slot.weekdays().collect::<Vec<_>>(), vec![Weekday::Mon]);
    assert_eq!(slot.other_days().collect::<Vec<_>>(), vec!['H', 'X']);
}

#[test]
fn meetings_may_run_until_midnight() {
    assert!(schedules_overlap("MW 22:00-24:00", "MW 23:00-23:30"));
    assert!(!schedules_overlap("MW 22:00-24:00", "MW 20:00-22:00"));

    let late = ScheduleSlot::parse("F 23:15-24:00").expect("24:00 closes the day");
    assert_eq!(late.start_minute(), 23 * 60 + 15);
    assert_eq!(late.end_minute(), 1440);
}

#[test]
fn parse_reads_weekdays_and_minutes() {
    let slot: ScheduleSlot = "mwR 08:30-09:45 Room-204".parse().expect("valid descriptor");
    let days: Vec<Weekday> = slot.weekdays().collect();
    assert_eq!(days, vec![Weekday::Mon, Weekday::Wed, Weekday::Thu]);
    assert_eq!(slot.start_minute(), 8 * 60 + 30);
    assert_eq!(slot.end_minute(), 9 * 60 + 45);
}

#[test]
fn slots_compare_days_and_times_independently() {
    let morning = ScheduleSlot::parse("TR 09:00-10:00").expect("valid");
    let evening = ScheduleSlot::parse("TR 18:00-19:00").expect("valid");
    let monday = ScheduleSlot::parse("M 09:30-10:30").expect("valid");

    assert!(morning.shares_day_with(&evening));
    assert!(!morning.overlaps(&evening));
    assert!(!morning.shares_day_with(&monday));
    assert!(!morning.overlaps(&monday));
}
