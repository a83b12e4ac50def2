use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// Task scheduler day tokens, indexed by ISO weekday - 1.
pub const DAY_TOKENS: [&str; 7] = ["MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN"];

/// Requested shutdown wall-clock time, always two-digit `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShutdownTime {
    hour: u32,
    minute: u32,
}

impl ShutdownTime {
    pub fn new(hour: u32, minute: u32) -> Result<Self, ScheduleError> {
        if hour > 23 {
            return Err(ScheduleError::Validation(format!(
                "hour must be between 00 and 23, got {hour}"
            )));
        }
        if minute > 59 {
            return Err(ScheduleError::Validation(format!(
                "minute must be between 00 and 59, got {minute}"
            )));
        }
        Ok(ShutdownTime { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn as_naive_time(&self) -> NaiveTime {
        // hour/minute are range-checked on construction
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl FromStr for ShutdownTime {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScheduleError::Validation(format!("time must be HH:MM, got '{s}'"));

        let bytes = s.as_bytes();
        let well_formed = bytes.len() == 5
            && bytes[2] == b':'
            && bytes[..2].iter().all(u8::is_ascii_digit)
            && bytes[3..].iter().all(u8::is_ascii_digit);
        if !well_formed {
            return Err(invalid());
        }

        let hour = s[..2].parse().map_err(|_| invalid())?;
        let minute = s[3..].parse().map_err(|_| invalid())?;
        ShutdownTime::new(hour, minute)
    }
}

impl TryFrom<String> for ShutdownTime {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ShutdownTime> for String {
    fn from(value: ShutdownTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ShutdownTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Either shape the `weekdays` key has had on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WeekdaysWire {
    Numbers(Vec<i64>),
    /// One checkbox per day, Monday first.
    Flags(Vec<bool>),
}

/// Non-empty set of ISO weekdays (1 = Monday ... 7 = Sunday).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WeekdaysWire", into = "Vec<u8>")]
pub struct Weekdays(BTreeSet<u8>);

impl Weekdays {
    /// Validates every value before building the set, naming the first bad one.
    pub fn new<I>(days: I) -> Result<Self, ScheduleError>
    where
        I: IntoIterator,
        I::Item: Into<i64>,
    {
        let mut set = BTreeSet::new();
        for day in days {
            let day = day.into();
            if !(1..=7).contains(&day) {
                return Err(ScheduleError::Validation(format!(
                    "weekday must be between 1 and 7, got {day}"
                )));
            }
            set.insert(day as u8);
        }
        if set.is_empty() {
            return Err(ScheduleError::Validation(
                "at least one weekday must be selected".to_string(),
            ));
        }
        Ok(Weekdays(set))
    }

    pub fn contains(&self, day: u8) -> bool {
        self.0.contains(&day)
    }

    /// Moves every day back by one, wrapping Monday to Sunday.
    pub fn shifted_back(&self) -> Weekdays {
        Weekdays(self.0.iter().map(|day| if *day == 1 { 7 } else { day - 1 }).collect())
    }

    /// `MON WED FRI` style list for the `/d` argument.
    pub fn day_tokens(&self) -> String {
        self.0
            .iter()
            .map(|day| DAY_TOKENS[usize::from(*day) - 1])
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl TryFrom<WeekdaysWire> for Weekdays {
    type Error = ScheduleError;

    fn try_from(wire: WeekdaysWire) -> Result<Self, Self::Error> {
        match wire {
            WeekdaysWire::Numbers(days) => Weekdays::new(days),
            WeekdaysWire::Flags(flags) => {
                if flags.len() > 7 {
                    return Err(ScheduleError::Validation(format!(
                        "expected at most 7 weekday flags, got {}",
                        flags.len()
                    )));
                }
                let days = flags
                    .iter()
                    .enumerate()
                    .filter(|(_, selected)| **selected)
                    .map(|(idx, _)| idx as i64 + 1);
                Weekdays::new(days)
            }
        }
    }
}

impl From<Weekdays> for Vec<u8> {
    fn from(value: Weekdays) -> Self {
        value.0.into_iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub weekdays: Weekdays,
    pub time: ShutdownTime,
    pub is_repeat: bool,
    #[serde(with = "iso_timestamp")]
    pub created_at: NaiveDateTime,
}

mod iso_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
