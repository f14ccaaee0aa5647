use std::collections::HashMap;

use chrono::Timelike;
use color_eyre::eyre::{self, Result};
use hc_homie5::{homie_device, HomieDevice};
use homie5::{HomieValue, PropertyRef, ToTopic};
use tokio::sync::mpsc;

use crate::{
    app_state::AppEvent,
    loglevel::LogLevel,
    params::ParamsProblem,
    snapshot::{weekday_name, TimeSnapshot},
    solar::{SolarDay, SolarPosition},
};

use super::description::{
    device_description, NODE_CALENDAR, NODE_CLOCK, NODE_SERVICE, NODE_SUN_POSITION, PROP_AZIMUTH, PROP_DAY,
    PROP_DAY_OF_YEAR, PROP_DAY_PARITY, PROP_DST, PROP_ELEVATION, PROP_EPOCH_DAYS, PROP_HOUR, PROP_HOURS_INTO_YEAR,
    PROP_LEAP_YEAR, PROP_LOG_LEVEL, PROP_MINUTE, PROP_MINUTES_INTO_YEAR, PROP_MONTH, PROP_REFRESH, PROP_SEASON,
    PROP_SUNRISE_HOUR, PROP_SUNRISE_MINUTE, PROP_SUNSET_HOUR, PROP_SUNSET_MINUTE, PROP_UTC_OFFSET, PROP_WEEK,
    PROP_WEEKDAY, PROP_YEAR,
};

/// The one homie device this service exposes. All time and sun values are
/// published as retained property values on its nodes, configuration problems
/// surface as device alerts.
#[homie_device]
#[derive(Debug)]
pub struct TimeDataDevice {
    values: HashMap<(HomieID, HomieID), HomieValue>,
    alerts: HashMap<HomieID, String>,
    app_event_sender: mpsc::Sender<AppEvent>,
}

impl TimeDataDevice {
    pub fn new(
        device_id: HomieID,
        name: &str,
        homie_proto: Homie5DeviceProtocol,
        homie_client: &HomieMQTTClient,
        app_event_sender: mpsc::Sender<AppEvent>,
    ) -> Self {
        Self {
            device_ref: DeviceRef::new(homie_proto.homie_domain().clone(), device_id),
            status: HomieDeviceStatus::Init,
            device_desc: device_description(name),
            homie_proto,
            homie_client: homie_client.clone(),
            values: HashMap::new(),
            alerts: HashMap::new(),
            app_event_sender,
        }
    }

    pub async fn apply_snapshot(&mut self, snapshot: &TimeSnapshot) -> Result<()> {
        self.publish_if_changed(&NODE_CLOCK, &PROP_HOUR, HomieValue::Integer(snapshot.hour as i64))
            .await?;
        self.publish_if_changed(&NODE_CLOCK, &PROP_MINUTE, HomieValue::Integer(snapshot.minute as i64))
            .await?;
        self.publish_if_changed(&NODE_CLOCK, &PROP_UTC_OFFSET, HomieValue::Float(snapshot.utc_offset_hours))
            .await?;
        self.publish_if_changed(&NODE_CLOCK, &PROP_DST, HomieValue::Bool(snapshot.dst_active))
            .await?;

        self.publish_if_changed(&NODE_CALENDAR, &PROP_DAY, HomieValue::Integer(snapshot.day as i64))
            .await?;
        self.publish_if_changed(&NODE_CALENDAR, &PROP_MONTH, HomieValue::Integer(snapshot.month as i64))
            .await?;
        self.publish_if_changed(&NODE_CALENDAR, &PROP_YEAR, HomieValue::Integer(snapshot.year as i64))
            .await?;
        self.publish_if_changed(
            &NODE_CALENDAR,
            &PROP_WEEKDAY,
            HomieValue::Enum(weekday_name(snapshot.weekday).to_string()),
        )
        .await?;
        self.publish_if_changed(&NODE_CALENDAR, &PROP_WEEK, HomieValue::Integer(snapshot.week_of_year as i64))
            .await?;
        self.publish_if_changed(
            &NODE_CALENDAR,
            &PROP_DAY_OF_YEAR,
            HomieValue::Integer(snapshot.day_of_year as i64),
        )
        .await?;
        self.publish_if_changed(
            &NODE_CALENDAR,
            &PROP_DAY_PARITY,
            HomieValue::Enum(snapshot.day_parity.as_str().to_string()),
        )
        .await?;
        self.publish_if_changed(&NODE_CALENDAR, &PROP_SEASON, HomieValue::Enum(snapshot.season.as_str().to_string()))
            .await?;
        self.publish_if_changed(&NODE_CALENDAR, &PROP_LEAP_YEAR, HomieValue::Bool(snapshot.leap_year))
            .await?;
        self.publish_if_changed(
            &NODE_CALENDAR,
            &PROP_MINUTES_INTO_YEAR,
            HomieValue::Integer(snapshot.minutes_into_year as i64),
        )
        .await?;
        self.publish_if_changed(
            &NODE_CALENDAR,
            &PROP_HOURS_INTO_YEAR,
            HomieValue::Integer(snapshot.hours_into_year as i64),
        )
        .await?;
        self.publish_if_changed(&NODE_CALENDAR, &PROP_EPOCH_DAYS, HomieValue::Integer(snapshot.epoch_days))
            .await?;
        Ok(())
    }

    /// Sunrise and sunset for one day. A phase the sun never reaches on that
    /// day (polar night, midnight sun) is skipped and the previous retained
    /// value stays on the broker.
    pub async fn apply_solar_day(&mut self, node_id: &HomieID, day: &SolarDay) -> Result<()> {
        if let Some(sunrise) = day.sunrise {
            self.publish_if_changed(node_id, &PROP_SUNRISE_HOUR, HomieValue::Integer(sunrise.hour() as i64))
                .await?;
            self.publish_if_changed(node_id, &PROP_SUNRISE_MINUTE, HomieValue::Integer(sunrise.minute() as i64))
                .await?;
        } else {
            log::warn!("No sunrise on {}, keeping previous value", day.date);
        }
        if let Some(sunset) = day.sunset {
            self.publish_if_changed(node_id, &PROP_SUNSET_HOUR, HomieValue::Integer(sunset.hour() as i64))
                .await?;
            self.publish_if_changed(node_id, &PROP_SUNSET_MINUTE, HomieValue::Integer(sunset.minute() as i64))
                .await?;
        } else {
            log::warn!("No sunset on {}, keeping previous value", day.date);
        }
        Ok(())
    }

    pub async fn apply_sun_position(&mut self, position: &SolarPosition) -> Result<()> {
        self.publish_if_changed(&NODE_SUN_POSITION, &PROP_AZIMUTH, HomieValue::Float(position.azimuth))
            .await?;
        self.publish_if_changed(&NODE_SUN_POSITION, &PROP_ELEVATION, HomieValue::Float(position.elevation))
            .await?;
        Ok(())
    }

    pub async fn apply_log_level(&mut self, level: LogLevel) -> Result<()> {
        self.publish_if_changed(&NODE_SERVICE, &PROP_LOG_LEVEL, HomieValue::Enum(level.as_str().to_string()))
            .await?;
        Ok(())
    }

    /// Reconciles the published device alerts with the current set of
    /// configuration problems. Alerts for resolved problems are cleared,
    /// current problems are (re)published.
    pub async fn update_config_alerts(&mut self, problems: &[ParamsProblem]) -> Result<()> {
        let current: HashMap<HomieID, String> =
            problems.iter().map(|problem| (problem.alert_id(), problem.to_string())).collect();
        let stale: Vec<HomieID> = self.alerts.keys().filter(|id| !current.contains_key(id)).cloned().collect();
        for alert_id in stale {
            self.clear_alert(&alert_id).await?;
        }
        for (alert_id, message) in current {
            self.set_alert(alert_id, message).await?;
        }
        Ok(())
    }

    pub async fn set_alert(&mut self, alert_id: HomieID, value: String) -> Result<()> {
        self.homie_client
            .homie_publish(self.homie_proto.publish_alert(&alert_id, &value))
            .await?;
        self.alerts.insert(alert_id, value);
        Ok(())
    }

    pub async fn clear_alert(&mut self, alert_id: &HomieID) -> Result<()> {
        if self.alerts.remove(alert_id).is_some() {
            self.homie_client
                .homie_publish(self.homie_proto.publish_clear_alert(alert_id))
                .await?;
        }
        Ok(())
    }

    pub async fn disconnect_client(&self) -> Result<()> {
        self.homie_client.disconnect().await?;
        Ok(())
    }

    async fn publish_if_changed(&mut self, node_id: &HomieID, prop_id: &HomieID, value: HomieValue) -> Result<()> {
        if matches!(value, HomieValue::Empty) {
            return Ok(());
        }
        let key = (node_id.clone(), prop_id.clone());
        if self.values.get(&key) == Some(&value) {
            return Ok(());
        }
        log::debug!("{}/{} -- Property value: {}", node_id, prop_id, value);
        self.homie_client
            .homie_publish(self.homie_proto.publish_value(node_id, prop_id, &value, true))
            .await?;
        self.values.insert(key, value);
        Ok(())
    }
}

impl HomieDevice for TimeDataDevice {
    type ResultError = eyre::Error;

    async fn publish_property_values(&mut self) -> Result<(), Self::ResultError> {
        for ((node_id, prop_id), value) in self.values.iter() {
            self.homie_client
                .homie_publish(self.homie_proto.publish_value(node_id, prop_id, value, true))
                .await?;
        }
        Ok(())
    }

    async fn handle_set_command(&mut self, property: &PropertyRef, set_value: &str) -> Result<(), Self::ResultError> {
        let Some(Ok(value)) = self
            .device_desc
            .with_property(property, |prop_desc| HomieValue::parse(set_value, prop_desc))
        else {
            log::warn!("Ignoring invalid set command: {} = [{}]", property.to_topic().build(), set_value);
            return Ok(());
        };
        if property.prop_id() == &PROP_LOG_LEVEL {
            if let HomieValue::Enum(level) = value {
                let level = level.parse::<LogLevel>()?;
                self.app_event_sender.send(AppEvent::SetLogLevel(level)).await?;
            }
        } else if property.prop_id() == &PROP_REFRESH {
            self.app_event_sender.send(AppEvent::Refresh).await?;
        }
        Ok(())
    }
}
