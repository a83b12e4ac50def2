use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::models::{ShutdownTime, Weekdays};

/// When the OS task should fire so the countdown ends at the requested time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerPlan {
    pub time: ShutdownTime,
    pub weekdays: Weekdays,
    /// True when the lead pushed the trigger onto the previous day.
    pub previous_day: bool,
}

/// `time - lead`, wrapping past midnight.
///
/// The subtraction runs on a full date-time so the clock wraps on its own;
/// hour and minute are read back afterwards.
pub fn trigger_time(time: ShutdownTime, lead: Duration) -> (ShutdownTime, bool) {
    let Some(day) = NaiveDate::from_ymd_opt(2000, 1, 2) else {
        return (time, false);
    };
    let anchor = day.and_time(time.as_naive_time());
    let Some(fired) = anchor.checked_sub_signed(lead) else {
        return (time, false);
    };

    let shifted = ShutdownTime::new(fired.hour(), fired.minute()).unwrap_or(time);
    (shifted, fired.date() < anchor.date())
}

pub fn plan_trigger(weekdays: &Weekdays, time: ShutdownTime, lead: Duration) -> TriggerPlan {
    let (trigger, previous_day) = trigger_time(time, lead);
    let weekdays = if previous_day {
        weekdays.shifted_back()
    } else {
        weekdays.clone()
    };

    TriggerPlan {
        time: trigger,
        weekdays,
        previous_day,
    }
}

/// Next instant at or after `now` whose clock reads `time`.
pub fn next_occurrence(now: NaiveDateTime, time: ShutdownTime) -> NaiveDateTime {
    let today = now.date().and_time(time.as_naive_time());
    if today >= now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Seconds left until shutdown when the next occurrence already falls inside
/// the warning window on a selected weekday; `None` means schedule normally.
pub fn immediate_countdown(
    now: NaiveDateTime,
    weekdays: &Weekdays,
    time: ShutdownTime,
    window: Duration,
) -> Option<u64> {
    let now = now.with_nanosecond(0).unwrap_or(now);
    let target = next_occurrence(now, time);
    let remaining = target - now;

    let weekday = target.weekday().number_from_monday() as u8;
    if remaining <= window && weekdays.contains(weekday) {
        u64::try_from(remaining.num_seconds()).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(raw: &str) -> ShutdownTime {
        raw.parse().unwrap()
    }

    fn at(raw: &str) -> NaiveDateTime {
        // 2026-01-12 is a Monday
        NaiveDateTime::parse_from_str(&format!("2026-01-12 {raw}:00"), "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn all_days() -> Weekdays {
        Weekdays::new(1..=7).unwrap()
    }

    #[test]
    fn fifteen_minute_lead_wraps_midnight() {
        let lead = Duration::minutes(15);
        let cases = [
            ("23:00", "22:45", false),
            ("00:10", "23:55", true),
            ("14:30", "14:15", false),
            ("12:00", "11:45", false),
            ("00:00", "23:45", true),
            ("00:15", "00:00", false),
        ];
        for (requested, expected, wrapped) in cases {
            let (trigger, previous_day) = trigger_time(t(requested), lead);
            assert_eq!(trigger.to_string(), expected, "requested {requested}");
            assert_eq!(previous_day, wrapped, "requested {requested}");
        }
    }

    #[test]
    fn offset_is_modular_for_every_minute_of_the_day() {
        let lead = Duration::minutes(15);
        for total in 0..(24 * 60) {
            let time = ShutdownTime::new(total / 60, total % 60).unwrap();
            let expected = (total + 24 * 60 - 15) % (24 * 60);
            let (trigger, _) = trigger_time(time, lead);
            assert_eq!(trigger.hour() * 60 + trigger.minute(), expected);
        }
    }

    #[test]
    fn wrapped_plan_moves_weekdays_back() {
        let weekdays = Weekdays::new([1, 3]).unwrap();
        let plan = plan_trigger(&weekdays, t("00:10"), Duration::minutes(15));
        assert!(plan.previous_day);
        assert_eq!(plan.weekdays.day_tokens(), "WED SUN");

        let plan = plan_trigger(&weekdays, t("09:00"), Duration::minutes(15));
        assert!(!plan.previous_day);
        assert_eq!(plan.weekdays, weekdays);
    }

    #[test]
    fn immediate_decision_matches_warning_window() {
        let window = Duration::seconds(900);
        let cases = [
            ("01:43", "01:50", true),
            ("01:43", "01:58", true),
            ("01:43", "01:59", false),
            ("01:43", "02:00", false),
            ("23:50", "23:55", true),
            ("23:50", "00:04", true),
            ("23:50", "00:06", false),
        ];
        for (now, target, immediate) in cases {
            let decision = immediate_countdown(at(now), &all_days(), t(target), window);
            assert_eq!(decision.is_some(), immediate, "now {now}, target {target}");
        }
    }

    #[test]
    fn immediate_countdown_reports_seconds_left() {
        let window = Duration::seconds(900);
        assert_eq!(
            immediate_countdown(at("01:43"), &all_days(), t("01:50"), window),
            Some(7 * 60)
        );
        assert_eq!(
            immediate_countdown(at("23:50"), &all_days(), t("00:04"), window),
            Some(14 * 60)
        );
        assert_eq!(
            immediate_countdown(at("12:00"), &all_days(), t("12:00"), window),
            Some(0)
        );
    }

    #[test]
    fn immediate_requires_selected_weekday_of_the_occurrence() {
        let window = Duration::seconds(900);
        // Monday 23:50 -> 00:04 lands on Tuesday
        let monday_only = Weekdays::new([1]).unwrap();
        let tuesday_only = Weekdays::new([2]).unwrap();
        assert_eq!(immediate_countdown(at("23:50"), &monday_only, t("00:04"), window), None);
        assert!(immediate_countdown(at("23:50"), &tuesday_only, t("00:04"), window).is_some());
    }

    #[test]
    fn next_occurrence_rolls_to_tomorrow_once_passed() {
        assert_eq!(next_occurrence(at("10:00"), t("09:00")), at("09:00") + Duration::days(1));
        assert_eq!(next_occurrence(at("08:00"), t("09:00")), at("09:00"));
    }
}
