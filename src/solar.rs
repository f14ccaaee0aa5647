use chrono::{DateTime, LocalResult, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use sun::SunPhase;

use crate::params::Location;

/// Sunrise and sunset for one local calendar date. A phase is `None` when it
/// does not occur on that date (polar day / polar night).
#[derive(Debug, Clone, PartialEq)]
pub struct SolarDay {
    pub date: NaiveDate,
    pub sunrise: Option<DateTime<Tz>>,
    pub sunset: Option<DateTime<Tz>>,
}

/// Horizontal sun coordinates, rounded to 0.1 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarPosition {
    pub azimuth: f64,   // compass degrees, north = 0, east = 90
    pub elevation: f64, // degrees above the horizon
}

// Degenerate phase results land decades away from the anchor day.
const PLAUSIBLE_WINDOW_MS: i64 = 36 * 3600 * 1000;

pub fn solar_day(date: NaiveDate, location: &Location, tz: Tz) -> SolarDay {
    let anchor_ms = local_noon_utc_ms(date, tz);
    SolarDay {
        date,
        sunrise: phase_time(anchor_ms, SunPhase::Sunrise, location, tz),
        sunset: phase_time(anchor_ms, SunPhase::Sunset, location, tz),
    }
}

pub fn solar_position(at: DateTime<Tz>, location: &Location) -> SolarPosition {
    let pos = sun::pos(at.timestamp_millis(), location.latitude, location.longitude);
    // The azimuth comes back in radians already referenced to north, eastward
    // positive, so it only needs normalizing into 0..360.
    SolarPosition {
        azimuth: round_tenth(pos.azimuth.to_degrees().rem_euclid(360.0)),
        elevation: round_tenth(pos.altitude.to_degrees()),
    }
}

fn phase_time(anchor_ms: i64, phase: SunPhase, location: &Location, tz: Tz) -> Option<DateTime<Tz>> {
    let event_time_ms = sun::time_at_phase(anchor_ms, phase, location.latitude, location.longitude, location.elevation);
    if (event_time_ms - anchor_ms).abs() > PLAUSIBLE_WINDOW_MS {
        return None;
    }
    Utc.timestamp_millis_opt(event_time_ms)
        .single()
        .map(|event_time| event_time.with_timezone(&tz))
}

/// UTC instant of local noon on `date`. Zone transitions happen around
/// midnight, so noon pins the calculation to the intended local day even on
/// transition dates.
fn local_noon_utc_ms(date: NaiveDate, tz: Tz) -> i64 {
    let noon = date.and_hms_opt(12, 0, 0).unwrap();
    match tz.from_local_datetime(&noon) {
        LocalResult::Single(at) => at.timestamp_millis(),
        LocalResult::Ambiguous(first, _) => first.timestamp_millis(),
        LocalResult::None => noon.and_utc().timestamp_millis(),
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn zone(name: &str) -> Tz {
        name.parse().unwrap()
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn vancouver_island() -> Location {
        Location {
            latitude: 48.5927,
            longitude: -123.4218,
            elevation: 0.0,
        }
    }

    fn assert_minutes_close(event: Option<DateTime<Tz>>, expected_minutes: i64, tolerance: i64) {
        let event = event.expect("expected the phase to occur");
        let actual = i64::from(event.hour() * 60 + event.minute());
        assert!(
            (actual - expected_minutes).abs() <= tolerance,
            "local time {:02}:{:02} not within {} min of {:02}:{:02}",
            event.hour(),
            event.minute(),
            tolerance,
            expected_minutes / 60,
            expected_minutes % 60
        );
    }

    #[test]
    fn summer_solstice_times() {
        let tz = zone("America/Vancouver");
        let day = solar_day(date(2024, 6, 20), &vancouver_island(), tz);
        // Published almanac values: 05:11 / 21:20 PDT.
        assert_minutes_close(day.sunrise, 5 * 60 + 11, 12);
        assert_minutes_close(day.sunset, 21 * 60 + 20, 12);
        assert_eq!(day.sunrise.unwrap().date_naive(), day.date);
        assert_eq!(day.sunset.unwrap().date_naive(), day.date);
    }

    #[test]
    fn winter_solstice_times() {
        let tz = zone("America/Vancouver");
        let day = solar_day(date(2024, 12, 21), &vancouver_island(), tz);
        // Published almanac values: 08:02 / 16:21 PST.
        assert_minutes_close(day.sunrise, 8 * 60 + 2, 12);
        assert_minutes_close(day.sunset, 16 * 60 + 21, 12);
    }

    #[test]
    fn dst_transition_day_reports_post_transition_clock() {
        // 2024-03-10: clocks jump 02:00 -> 03:00. Both phases must come back
        // in PDT, sunset shortly after 19:00 local.
        let tz = zone("America/Vancouver");
        let day = solar_day(date(2024, 3, 10), &vancouver_island(), tz);
        assert_minutes_close(day.sunrise, 7 * 60 + 39, 12);
        assert_minutes_close(day.sunset, 19 * 60 + 5, 12);

        use chrono::Offset;
        let sunset = day.sunset.unwrap();
        assert_eq!(sunset.offset().fix().local_minus_utc(), -7 * 3600);
    }

    #[test]
    fn equatorial_times_stay_near_six() {
        let tz = zone("America/Guayaquil");
        let quito = Location {
            latitude: -0.1807,
            longitude: -78.4678,
            elevation: 2850.0,
        };
        let day = solar_day(date(2024, 3, 21), &quito, tz);
        assert_minutes_close(day.sunrise, 6 * 60 + 17, 20);
        assert_minutes_close(day.sunset, 18 * 60 + 23, 20);
    }

    #[test]
    fn polar_day_and_night_have_no_events() {
        let tz = zone("Arctic/Longyearbyen");
        let svalbard = Location {
            latitude: 78.2232,
            longitude: 15.6267,
            elevation: 0.0,
        };

        let midsummer = solar_day(date(2024, 6, 20), &svalbard, tz);
        assert_eq!(midsummer.sunrise, None);
        assert_eq!(midsummer.sunset, None);

        let midwinter = solar_day(date(2024, 12, 21), &svalbard, tz);
        assert_eq!(midwinter.sunrise, None);
        assert_eq!(midwinter.sunset, None);
    }

    #[test]
    fn position_at_midday_and_midnight() {
        let tz = zone("America/Vancouver");
        let location = vancouver_island();

        let midday = tz.with_ymd_and_hms(2024, 6, 20, 13, 0, 0).unwrap();
        let pos = solar_position(midday, &location);
        assert!(pos.elevation > 55.0 && pos.elevation < 70.0, "elevation {}", pos.elevation);
        assert!(pos.azimuth > 150.0 && pos.azimuth < 210.0, "azimuth {}", pos.azimuth);

        let night = tz.with_ymd_and_hms(2024, 6, 20, 1, 30, 0).unwrap();
        let pos = solar_position(night, &location);
        assert!(pos.elevation < -10.0, "elevation {}", pos.elevation);
    }

    #[test]
    fn azimuth_runs_east_over_south_to_west() {
        // Compass bearings on the northern hemisphere: morning sun in the
        // east, evening sun in the west. A reversed reference direction would
        // miss these by about 180 degrees.
        let tz = zone("America/Vancouver");
        let location = vancouver_island();

        let morning = tz.with_ymd_and_hms(2024, 6, 20, 7, 0, 0).unwrap();
        let pos = solar_position(morning, &location);
        assert!(pos.azimuth > 45.0 && pos.azimuth < 135.0, "morning azimuth {}", pos.azimuth);

        let evening = tz.with_ymd_and_hms(2024, 6, 20, 19, 30, 0).unwrap();
        let pos = solar_position(evening, &location);
        assert!(pos.azimuth > 225.0 && pos.azimuth < 315.0, "evening azimuth {}", pos.azimuth);
    }
}
