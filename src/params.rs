use std::{collections::HashMap, time::Duration};

use chrono_tz::Tz;
use config_watcher::ConfigItemHash;
use homie5::HomieID;
use serde::Deserialize;
use thiserror::Error;

use crate::snapshot::Hemisphere;

pub const DEFAULT_SHORT_POLL_SECS: u64 = 30;
pub const DEFAULT_LONG_POLL_SECS: u64 = 3600;

/// One runtime parameter document as supplied by the operator. Keys are case
/// sensitive; unknown keys reject the document so typos cannot silently turn
/// into defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceParams {
    #[serde(rename = "Latitude")]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    pub longitude: Option<f64>,
    #[serde(rename = "Timezone")]
    pub timezone: Option<String>,
    #[serde(rename = "Elevation", default)]
    pub elevation: Option<f64>,
    #[serde(rename = "Hemisphere", default)]
    pub hemisphere: Option<Hemisphere>,
    #[serde(rename = "ShortPoll", default)]
    pub short_poll: Option<u64>,
    #[serde(rename = "LongPoll", default)]
    pub long_poll: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
}

/// Validated form of [`DeviceParams`], everything the polling side needs.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    pub location: Location,
    pub tz: Tz,
    pub hemisphere: Hemisphere,
    pub short_poll: Duration,
    pub long_poll: Duration,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamsProblem {
    #[error("Latitude setting is required.")]
    MissingLatitude,
    #[error("Longitude setting is required.")]
    MissingLongitude,
    #[error("Timezone setting is required.")]
    MissingTimezone,
    #[error("Latitude {0} is out of range (-90 to 90).")]
    LatitudeOutOfRange(f64),
    #[error("Longitude {0} is out of range (-180 to 180).")]
    LongitudeOutOfRange(f64),
    #[error("Unknown timezone '{0}'. Zone names are case sensitive, e.g. 'America/Vancouver'.")]
    UnknownTimezone(String),
    #[error("ShortPoll of {0}s is not usable, at least 1 second is required.")]
    ShortPollOutOfRange(u64),
    #[error("LongPoll ({long_poll}s) must not be shorter than ShortPoll ({short_poll}s).")]
    LongPollTooShort { long_poll: u64, short_poll: u64 },
    #[error("More than one parameter document supplied ({0}). Remove the extras.")]
    DuplicateDocuments(String),
}

impl ParamsProblem {
    /// Stable alert id under which the problem is published on the device.
    pub fn alert_id(&self) -> HomieID {
        match self {
            ParamsProblem::MissingLatitude | ParamsProblem::LatitudeOutOfRange(_) => HomieID::new_const("latitude"),
            ParamsProblem::MissingLongitude | ParamsProblem::LongitudeOutOfRange(_) => HomieID::new_const("longitude"),
            ParamsProblem::MissingTimezone | ParamsProblem::UnknownTimezone(_) => HomieID::new_const("timezone"),
            ParamsProblem::ShortPollOutOfRange(_) | ParamsProblem::LongPollTooShort { .. } => {
                HomieID::new_const("polling")
            }
            ParamsProblem::DuplicateDocuments(_) => HomieID::new_const("params"),
        }
    }
}

impl DeviceParams {
    pub fn validate(&self) -> Result<DeviceConfig, Vec<ParamsProblem>> {
        let mut problems = Vec::new();

        let latitude = match self.latitude {
            Some(value) if (-90.0..=90.0).contains(&value) => Some(value),
            Some(value) => {
                problems.push(ParamsProblem::LatitudeOutOfRange(value));
                None
            }
            None => {
                problems.push(ParamsProblem::MissingLatitude);
                None
            }
        };

        let longitude = match self.longitude {
            Some(value) if (-180.0..=180.0).contains(&value) => Some(value),
            Some(value) => {
                problems.push(ParamsProblem::LongitudeOutOfRange(value));
                None
            }
            None => {
                problems.push(ParamsProblem::MissingLongitude);
                None
            }
        };

        let tz = match self.timezone.as_deref() {
            Some(name) => match name.parse::<Tz>() {
                Ok(tz) => Some(tz),
                Err(_) => {
                    problems.push(ParamsProblem::UnknownTimezone(name.to_string()));
                    None
                }
            },
            None => {
                problems.push(ParamsProblem::MissingTimezone);
                None
            }
        };

        let short_poll = self.short_poll.unwrap_or(DEFAULT_SHORT_POLL_SECS);
        let long_poll = self.long_poll.unwrap_or(DEFAULT_LONG_POLL_SECS);
        if short_poll == 0 {
            problems.push(ParamsProblem::ShortPollOutOfRange(short_poll));
        }
        if long_poll < short_poll {
            problems.push(ParamsProblem::LongPollTooShort { long_poll, short_poll });
        }

        match (latitude, longitude, tz) {
            (Some(latitude), Some(longitude), Some(tz)) if problems.is_empty() => Ok(DeviceConfig {
                location: Location {
                    latitude,
                    longitude,
                    elevation: self.elevation.unwrap_or(0.0),
                },
                tz,
                hemisphere: self.hemisphere.unwrap_or_else(|| Hemisphere::from_latitude(latitude)),
                short_poll: Duration::from_secs(short_poll),
                long_poll: Duration::from_secs(long_poll),
            }),
            _ => Err(problems),
        }
    }
}

/// Outcome of looking at all currently known parameter documents.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamsResolution {
    pub config: Option<DeviceConfig>,
    pub problems: Vec<ParamsProblem>,
}

/// Keeps the parameter documents delivered by the config watcher plus the
/// config currently applied to the pollers. Exactly one document is expected;
/// anything else resolves to problems instead of a config.
#[derive(Default)]
pub struct ParamsTracker {
    documents: HashMap<ConfigItemHash, DeviceParams>,
    files: HashMap<u64, String>,
    applied: Option<DeviceConfig>,
}

impl ParamsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_document_file(&mut self, hash: u64, filename: String) {
        self.files.insert(hash, filename);
    }

    pub fn remove_document_file(&mut self, hash: u64) {
        self.files.remove(&hash);
    }

    pub fn get_filename(&self, hash: ConfigItemHash) -> Option<&String> {
        self.files.get(&hash.filename_hash())
    }

    pub fn insert(&mut self, hash: ConfigItemHash, params: DeviceParams) {
        self.documents.insert(hash, params);
    }

    pub fn remove(&mut self, hash: ConfigItemHash) -> Option<DeviceParams> {
        self.documents.remove(&hash)
    }

    pub fn resolve(&self) -> ParamsResolution {
        if self.documents.len() > 1 {
            let names = self
                .documents
                .keys()
                .map(|hash| match self.get_filename(*hash) {
                    Some(name) => name.clone(),
                    None => hash.to_string(),
                })
                .collect();
            ParamsResolution {
                config: None,
                problems: vec![duplicate_documents_problem(names)],
            }
        } else if let Some(params) = self.documents.values().next() {
            match params.validate() {
                Ok(config) => ParamsResolution {
                    config: Some(config),
                    problems: Vec::new(),
                },
                Err(problems) => ParamsResolution { config: None, problems },
            }
        } else {
            ParamsResolution {
                config: None,
                problems: vec![
                    ParamsProblem::MissingLatitude,
                    ParamsProblem::MissingLongitude,
                    ParamsProblem::MissingTimezone,
                ],
            }
        }
    }

    /// Stores the newly resolved config, reporting whether it differs from
    /// the one applied before.
    pub fn set_applied(&mut self, config: Option<DeviceConfig>) -> bool {
        if self.applied == config {
            false
        } else {
            self.applied = config;
            true
        }
    }

    pub fn applied(&self) -> Option<&DeviceConfig> {
        self.applied.as_ref()
    }
}

fn duplicate_documents_problem(mut names: Vec<String>) -> ParamsProblem {
    names.sort();
    ParamsProblem::DuplicateDocuments(names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_params() -> DeviceParams {
        serde_yml::from_str(
            r#"
            Latitude: 48.5927
            Longitude: -123.4218
            Timezone: America/Vancouver
            "#,
        )
        .unwrap()
    }

    #[test]
    fn parses_a_complete_document() {
        let params: DeviceParams = serde_yml::from_str(
            r#"
            Latitude: -33.8688
            Longitude: 151.2093
            Timezone: Australia/Sydney
            Elevation: 58
            Hemisphere: south
            ShortPoll: 10
            LongPoll: 600
            "#,
        )
        .unwrap();

        let config = params.validate().unwrap();
        assert_eq!(config.location.latitude, -33.8688);
        assert_eq!(config.location.elevation, 58.0);
        assert_eq!(config.hemisphere, Hemisphere::South);
        assert_eq!(config.short_poll, Duration::from_secs(10));
        assert_eq!(config.long_poll, Duration::from_secs(600));
    }

    #[test]
    fn applies_defaults_for_optional_keys() {
        let config = full_params().validate().unwrap();
        assert_eq!(config.location.elevation, 0.0);
        assert_eq!(config.hemisphere, Hemisphere::North);
        assert_eq!(config.short_poll, Duration::from_secs(DEFAULT_SHORT_POLL_SECS));
        assert_eq!(config.long_poll, Duration::from_secs(DEFAULT_LONG_POLL_SECS));
    }

    #[test]
    fn hemisphere_follows_latitude_sign_unless_overridden() {
        let mut params = full_params();
        params.latitude = Some(-48.0);
        assert_eq!(params.validate().unwrap().hemisphere, Hemisphere::South);

        params.hemisphere = Some(Hemisphere::North);
        assert_eq!(params.validate().unwrap().hemisphere, Hemisphere::North);
    }

    #[test]
    fn rejects_unknown_keys() {
        let result: Result<DeviceParams, _> = serde_yml::from_str(
            r#"
            Latitude: 48.5927
            Longitude: -123.4218
            Timezone: America/Vancouver
            Lattitude: 48.5927
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn empty_document_reports_all_required_settings() {
        let params: DeviceParams = serde_yml::from_str("{}").unwrap();
        let problems = params.validate().unwrap_err();
        assert!(problems.contains(&ParamsProblem::MissingLatitude));
        assert!(problems.contains(&ParamsProblem::MissingLongitude));
        assert!(problems.contains(&ParamsProblem::MissingTimezone));
        assert_eq!(problems.len(), 3);
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let mut params = full_params();
        params.latitude = Some(91.0);
        params.longitude = Some(-200.0);
        let problems = params.validate().unwrap_err();
        assert!(problems.contains(&ParamsProblem::LatitudeOutOfRange(91.0)));
        assert!(problems.contains(&ParamsProblem::LongitudeOutOfRange(-200.0)));
    }

    #[test]
    fn zone_names_are_case_sensitive() {
        let mut params = full_params();
        params.timezone = Some("america/vancouver".to_string());
        let problems = params.validate().unwrap_err();
        assert_eq!(
            problems,
            vec![ParamsProblem::UnknownTimezone("america/vancouver".to_string())]
        );
    }

    #[test]
    fn rejects_unusable_poll_intervals() {
        let mut params = full_params();
        params.short_poll = Some(0);
        let problems = params.validate().unwrap_err();
        assert!(problems.contains(&ParamsProblem::ShortPollOutOfRange(0)));

        let mut params = full_params();
        params.short_poll = Some(120);
        params.long_poll = Some(60);
        let problems = params.validate().unwrap_err();
        assert!(problems.contains(&ParamsProblem::LongPollTooShort {
            long_poll: 60,
            short_poll: 120
        }));
    }

    #[test]
    fn duplicate_documents_list_is_deterministic() {
        let problem = duplicate_documents_problem(vec!["b.yaml".to_string(), "a.yaml".to_string()]);
        assert_eq!(
            problem.to_string(),
            "More than one parameter document supplied (a.yaml, b.yaml). Remove the extras."
        );
    }

    #[test]
    fn empty_tracker_resolves_to_required_settings() {
        let tracker = ParamsTracker::new();
        let resolution = tracker.resolve();
        assert_eq!(resolution.config, None);
        assert_eq!(resolution.problems.len(), 3);
    }

    #[test]
    fn applied_config_change_detection() {
        let mut tracker = ParamsTracker::new();
        let config = full_params().validate().unwrap();

        assert!(tracker.set_applied(Some(config.clone())));
        assert!(!tracker.set_applied(Some(config.clone())));
        assert!(tracker.set_applied(None));
        assert!(!tracker.set_applied(None));
        assert_eq!(tracker.applied(), None);
    }

    #[test]
    fn alert_ids_group_by_setting() {
        assert_eq!(
            ParamsProblem::MissingLatitude.alert_id(),
            ParamsProblem::LatitudeOutOfRange(99.0).alert_id()
        );
        assert_ne!(
            ParamsProblem::MissingLatitude.alert_id(),
            ParamsProblem::MissingTimezone.alert_id()
        );
    }
}
