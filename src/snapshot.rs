use chrono::{DateTime, Datelike, NaiveDate, Offset, Timelike};
use chrono_tz::{OffsetComponents, Tz};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    pub fn from_latitude(latitude: f64) -> Self {
        if latitude < 0.0 {
            Hemisphere::South
        } else {
            Hemisphere::North
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
        }
    }

    fn opposite(self) -> Self {
        match self {
            Season::Spring => Season::Autumn,
            Season::Summer => Season::Winter,
            Season::Autumn => Season::Spring,
            Season::Winter => Season::Summer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayParity {
    Odd,
    Even,
}

impl DayParity {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayParity::Odd => "odd",
            DayParity::Even => "even",
        }
    }
}

/// All wall-clock and calendar values published on the short poll, captured
/// from one instant in the configured zone.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSnapshot {
    pub hour: u32,
    pub minute: u32,
    pub day: u32,
    pub month: u32,
    pub year: i32,
    pub weekday: chrono::Weekday,
    pub week_of_year: u32,
    pub day_of_year: u32,
    pub day_parity: DayParity,
    pub season: Season,
    pub leap_year: bool,
    pub minutes_into_year: u32,
    pub hours_into_year: u32,
    pub epoch_days: i64,
    pub utc_offset_hours: f64,
    pub dst_active: bool,
}

impl TimeSnapshot {
    pub fn capture(now: DateTime<Tz>, hemisphere: Hemisphere) -> Self {
        let date = now.date_naive();
        let parity = if now.day() % 2 == 0 { DayParity::Even } else { DayParity::Odd };
        Self {
            hour: now.hour(),
            minute: now.minute(),
            day: now.day(),
            month: now.month(),
            year: now.year(),
            weekday: now.weekday(),
            week_of_year: week_of_year(date),
            day_of_year: now.ordinal(),
            day_parity: parity,
            season: season_for(date, hemisphere),
            leap_year: date.leap_year(),
            minutes_into_year: now.ordinal0() * 1440 + now.hour() * 60 + now.minute(),
            hours_into_year: now.ordinal0() * 24 + now.hour(),
            epoch_days: now.timestamp().div_euclid(86_400),
            utc_offset_hours: f64::from(now.offset().fix().local_minus_utc()) / 3600.0,
            dst_active: !now.offset().dst_offset().is_zero(),
        }
    }
}

/// Week of the year with Sunday as the first day, one-based. Days before the
/// first Sunday of the year count as week 1, so the range is 1 to 54.
pub fn week_of_year(date: NaiveDate) -> u32 {
    (date.ordinal0() + 7 - date.weekday().num_days_from_sunday()) / 7 + 1
}

/// Meteorologically naive season from fixed month/day boundaries: spring
/// starts Mar 21, summer Jun 21, autumn Sep 23, winter Dec 23. Flipped on the
/// southern hemisphere.
pub fn season_for(date: NaiveDate, hemisphere: Hemisphere) -> Season {
    let md = date.month() * 100 + date.day();
    let northern = if md > 320 && md < 621 {
        Season::Spring
    } else if md > 620 && md < 923 {
        Season::Summer
    } else if md > 922 && md < 1223 {
        Season::Autumn
    } else {
        Season::Winter
    };
    match hemisphere {
        Hemisphere::North => northern,
        Hemisphere::South => northern.opposite(),
    }
}

pub fn weekday_name(weekday: chrono::Weekday) -> &'static str {
    match weekday {
        chrono::Weekday::Mon => "monday",
        chrono::Weekday::Tue => "tuesday",
        chrono::Weekday::Wed => "wednesday",
        chrono::Weekday::Thu => "thursday",
        chrono::Weekday::Fri => "friday",
        chrono::Weekday::Sat => "saturday",
        chrono::Weekday::Sun => "sunday",
    }
}
