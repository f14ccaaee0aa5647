use chrono::Utc;
use color_eyre::eyre::Result;
use hc_homie5_timedata::{
    app_state::AppState,
    device::{NODE_SUN_TODAY, NODE_SUN_TOMORROW},
    poll::PollEvent,
    snapshot::TimeSnapshot,
    solar::{solar_day, solar_position},
};

pub async fn handle_poll_event(event: PollEvent, state: &mut AppState) -> Result<bool> {
    match event {
        PollEvent::Short => {
            refresh_time_data(state).await?;
        }
        PollEvent::Long => {
            refresh_sun_data(state).await?;
        }
    }
    Ok(false)
}

/// Publishes the current clock, calendar and sun position values. Does
/// nothing while no valid parameters are applied.
pub async fn refresh_time_data(state: &mut AppState) -> Result<()> {
    let Some(config) = state.params.applied().cloned() else {
        log::debug!("Skipping time refresh, no valid parameters applied");
        return Ok(());
    };
    let now = Utc::now().with_timezone(&config.tz);
    let snapshot = TimeSnapshot::capture(now, config.hemisphere);
    state.device.apply_snapshot(&snapshot).await?;
    let position = solar_position(now, &config.location);
    state.device.apply_sun_position(&position).await?;
    Ok(())
}

/// Publishes sunrise/sunset for today and tomorrow. Does nothing while no
/// valid parameters are applied.
pub async fn refresh_sun_data(state: &mut AppState) -> Result<()> {
    let Some(config) = state.params.applied().cloned() else {
        log::debug!("Skipping sun refresh, no valid parameters applied");
        return Ok(());
    };
    let today = Utc::now().with_timezone(&config.tz).date_naive();
    let today_times = solar_day(today, &config.location, config.tz);
    state.device.apply_solar_day(&NODE_SUN_TODAY, &today_times).await?;
    if let Some(tomorrow) = today.succ_opt() {
        let tomorrow_times = solar_day(tomorrow, &config.location, config.tz);
        state.device.apply_solar_day(&NODE_SUN_TOMORROW, &tomorrow_times).await?;
    }
    Ok(())
}
