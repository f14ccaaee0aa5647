use std::collections::BTreeMap;

use homie5::{
    device_description::{
        DeviceDescriptionBuilder, HomieDeviceDescription, HomieNodeDescription, HomiePropertyDescription,
        HomiePropertyFormat,
    },
    HomieDataType, HomieID,
};

use crate::loglevel::LogLevel;

pub const NODE_CLOCK: HomieID = HomieID::new_const("clock");
pub const NODE_CALENDAR: HomieID = HomieID::new_const("calendar");
pub const NODE_SUN_TODAY: HomieID = HomieID::new_const("sun-today");
pub const NODE_SUN_TOMORROW: HomieID = HomieID::new_const("sun-tomorrow");
pub const NODE_SUN_POSITION: HomieID = HomieID::new_const("sun-position");
pub const NODE_SERVICE: HomieID = HomieID::new_const("service");

pub const PROP_HOUR: HomieID = HomieID::new_const("hour");
pub const PROP_MINUTE: HomieID = HomieID::new_const("minute");
pub const PROP_UTC_OFFSET: HomieID = HomieID::new_const("utc-offset");
pub const PROP_DST: HomieID = HomieID::new_const("dst");

pub const PROP_DAY: HomieID = HomieID::new_const("day");
pub const PROP_MONTH: HomieID = HomieID::new_const("month");
pub const PROP_YEAR: HomieID = HomieID::new_const("year");
pub const PROP_WEEKDAY: HomieID = HomieID::new_const("weekday");
pub const PROP_WEEK: HomieID = HomieID::new_const("week");
pub const PROP_DAY_OF_YEAR: HomieID = HomieID::new_const("day-of-year");
pub const PROP_DAY_PARITY: HomieID = HomieID::new_const("day-parity");
pub const PROP_SEASON: HomieID = HomieID::new_const("season");
pub const PROP_LEAP_YEAR: HomieID = HomieID::new_const("leap-year");
pub const PROP_MINUTES_INTO_YEAR: HomieID = HomieID::new_const("minutes-into-year");
pub const PROP_HOURS_INTO_YEAR: HomieID = HomieID::new_const("hours-into-year");
pub const PROP_EPOCH_DAYS: HomieID = HomieID::new_const("epoch-days");

pub const PROP_SUNRISE_HOUR: HomieID = HomieID::new_const("sunrise-hour");
pub const PROP_SUNRISE_MINUTE: HomieID = HomieID::new_const("sunrise-minute");
pub const PROP_SUNSET_HOUR: HomieID = HomieID::new_const("sunset-hour");
pub const PROP_SUNSET_MINUTE: HomieID = HomieID::new_const("sunset-minute");

pub const PROP_AZIMUTH: HomieID = HomieID::new_const("azimuth");
pub const PROP_ELEVATION: HomieID = HomieID::new_const("elevation");

pub const PROP_LOG_LEVEL: HomieID = HomieID::new_const("log-level");
pub const PROP_REFRESH: HomieID = HomieID::new_const("refresh");

const WEEKDAY_FORMAT: &str = "monday,tuesday,wednesday,thursday,friday,saturday,sunday";
const SEASON_FORMAT: &str = "spring,summer,autumn,winter";
const DAY_PARITY_FORMAT: &str = "odd,even";
const REFRESH_FORMAT: &str = "refresh";

pub fn device_description(name: &str) -> HomieDeviceDescription {
    DeviceDescriptionBuilder::new()
        .name(name.to_string())
        .add_node(NODE_CLOCK, clock_node())
        .add_node(NODE_CALENDAR, calendar_node())
        .add_node(NODE_SUN_TODAY, sun_times_node("Sun today"))
        .add_node(NODE_SUN_TOMORROW, sun_times_node("Sun tomorrow"))
        .add_node(NODE_SUN_POSITION, sun_position_node())
        .add_node(NODE_SERVICE, service_node())
        .build()
}

fn clock_node() -> HomieNodeDescription {
    let mut properties = BTreeMap::new();
    properties.insert(PROP_HOUR, int_property("Hour", Some("0:23"), None));
    properties.insert(PROP_MINUTE, int_property("Minute", Some("0:59"), None));
    properties.insert(PROP_UTC_OFFSET, float_property("UTC offset", None, Some("h")));
    properties.insert(PROP_DST, bool_property("Daylight saving active"));
    HomieNodeDescription {
        name: Some("Clock".to_string()),
        r#type: None,
        properties,
    }
}

fn calendar_node() -> HomieNodeDescription {
    let mut properties = BTreeMap::new();
    properties.insert(PROP_DAY, int_property("Day of month", Some("1:31"), None));
    properties.insert(PROP_MONTH, int_property("Month", Some("1:12"), None));
    properties.insert(PROP_YEAR, int_property("Year", None, None));
    properties.insert(PROP_WEEKDAY, enum_property("Weekday", WEEKDAY_FORMAT));
    properties.insert(PROP_WEEK, int_property("Week of year", Some("1:54"), None));
    properties.insert(PROP_DAY_OF_YEAR, int_property("Day of year", Some("1:366"), None));
    properties.insert(PROP_DAY_PARITY, enum_property("Day parity", DAY_PARITY_FORMAT));
    properties.insert(PROP_SEASON, enum_property("Season", SEASON_FORMAT));
    properties.insert(PROP_LEAP_YEAR, bool_property("Leap year"));
    properties.insert(
        PROP_MINUTES_INTO_YEAR,
        int_property("Minutes into year", Some("0:527039"), None),
    );
    properties.insert(PROP_HOURS_INTO_YEAR, int_property("Hours into year", Some("0:8783"), None));
    properties.insert(PROP_EPOCH_DAYS, int_property("Days since epoch", None, None));
    HomieNodeDescription {
        name: Some("Calendar".to_string()),
        r#type: None,
        properties,
    }
}

fn sun_times_node(name: &str) -> HomieNodeDescription {
    let mut properties = BTreeMap::new();
    properties.insert(PROP_SUNRISE_HOUR, int_property("Sunrise hour", Some("0:23"), None));
    properties.insert(PROP_SUNRISE_MINUTE, int_property("Sunrise minute", Some("0:59"), None));
    properties.insert(PROP_SUNSET_HOUR, int_property("Sunset hour", Some("0:23"), None));
    properties.insert(PROP_SUNSET_MINUTE, int_property("Sunset minute", Some("0:59"), None));
    HomieNodeDescription {
        name: Some(name.to_string()),
        r#type: None,
        properties,
    }
}

fn sun_position_node() -> HomieNodeDescription {
    let mut properties = BTreeMap::new();
    properties.insert(PROP_AZIMUTH, float_property("Azimuth", Some("0:360"), Some("°")));
    properties.insert(PROP_ELEVATION, float_property("Elevation", Some("-90:90"), Some("°")));
    HomieNodeDescription {
        name: Some("Sun position".to_string()),
        r#type: None,
        properties,
    }
}

fn service_node() -> HomieNodeDescription {
    let mut properties = BTreeMap::new();
    let levels = LogLevel::enum_format();
    properties.insert(
        PROP_LOG_LEVEL,
        property("Log level", HomieDataType::Enum, Some(&levels), None, true, true),
    );
    properties.insert(
        PROP_REFRESH,
        property("Refresh", HomieDataType::Enum, Some(REFRESH_FORMAT), None, true, false),
    );
    HomieNodeDescription {
        name: Some("Service".to_string()),
        r#type: None,
        properties,
    }
}

fn int_property(name: &str, format: Option<&str>, unit: Option<&str>) -> HomiePropertyDescription {
    property(name, HomieDataType::Integer, format, unit, false, true)
}

fn float_property(name: &str, format: Option<&str>, unit: Option<&str>) -> HomiePropertyDescription {
    property(name, HomieDataType::Float, format, unit, false, true)
}

fn bool_property(name: &str) -> HomiePropertyDescription {
    property(name, HomieDataType::Boolean, None, None, false, true)
}

fn enum_property(name: &str, format: &str) -> HomiePropertyDescription {
    property(name, HomieDataType::Enum, Some(format), None, false, true)
}

fn property(
    name: &str,
    datatype: HomieDataType,
    format: Option<&str>,
    unit: Option<&str>,
    settable: bool,
    retained: bool,
) -> HomiePropertyDescription {
    let format = format
        .map(|format| HomiePropertyFormat::parse(format, &datatype).unwrap_or(HomiePropertyFormat::Empty))
        .unwrap_or(HomiePropertyFormat::Empty);
    HomiePropertyDescription {
        name: Some(name.to_string()),
        unit: unit.map(str::to_string),
        format,
        datatype,
        settable,
        retained,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homie5::{HomieDomain, PropertyRef};

    fn prop_ref(node: HomieID, prop: HomieID) -> PropertyRef {
        PropertyRef::new(HomieDomain::Default, HomieID::new_const("timedata"), node, prop)
    }

    #[test]
    fn description_covers_all_nodes() {
        let desc = device_description("Time Data");
        let json = serde_json::to_value(&desc).unwrap();

        for node in ["clock", "calendar", "sun-today", "sun-tomorrow", "sun-position", "service"] {
            assert!(
                json.pointer(&format!("/nodes/{}/properties", node)).is_some(),
                "missing node {}",
                node
            );
        }
        assert_eq!(
            json.pointer("/nodes/calendar/properties").unwrap().as_object().unwrap().len(),
            12
        );
        assert_eq!(
            json.pointer("/nodes/clock/properties").unwrap().as_object().unwrap().len(),
            4
        );
    }

    #[test]
    fn data_properties_are_read_only_and_retained() {
        let desc = device_description("Time Data");
        for (node, prop) in [
            (NODE_CLOCK, PROP_HOUR),
            (NODE_CALENDAR, PROP_SEASON),
            (NODE_SUN_TODAY, PROP_SUNRISE_HOUR),
            (NODE_SUN_POSITION, PROP_AZIMUTH),
        ] {
            let (settable, retained) = desc
                .with_property(&prop_ref(node.clone(), prop.clone()), |p| (p.settable, p.retained))
                .unwrap();
            assert!(!settable, "{} must not be settable", prop);
            assert!(retained, "{} must be retained", prop);
        }
    }

    #[test]
    fn service_properties_are_settable() {
        let desc = device_description("Time Data");
        let json = serde_json::to_value(&desc).unwrap();

        assert_eq!(
            json.pointer("/nodes/service/properties/log-level/settable"),
            Some(&serde_json::Value::Bool(true))
        );
        assert_eq!(
            json.pointer("/nodes/service/properties/log-level/format"),
            Some(&serde_json::Value::String("error,warn,info,debug,trace".to_string()))
        );
        // Command style property, not retained.
        assert_eq!(
            json.pointer("/nodes/service/properties/refresh/retained"),
            Some(&serde_json::Value::Bool(false))
        );
    }

    #[test]
    fn value_formats_parse_for_their_datatypes() {
        let desc = device_description("Time Data");
        let json = serde_json::to_value(&desc).unwrap();

        assert_eq!(
            json.pointer("/nodes/clock/properties/hour/datatype"),
            Some(&serde_json::Value::String("integer".to_string()))
        );
        assert_eq!(
            json.pointer("/nodes/clock/properties/hour/format"),
            Some(&serde_json::Value::String("0:23".to_string()))
        );
        assert_eq!(
            json.pointer("/nodes/sun-position/properties/elevation/format"),
            Some(&serde_json::Value::String("-90:90".to_string()))
        );
        assert_eq!(
            json.pointer("/nodes/calendar/properties/weekday/format"),
            Some(&serde_json::Value::String(WEEKDAY_FORMAT.to_string()))
        );
    }
}
