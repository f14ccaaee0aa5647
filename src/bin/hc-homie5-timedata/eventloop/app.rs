use std::time::Duration;

use color_eyre::eyre::Result;

use hc_homie5::HomieDevice;
use hc_homie5_timedata::app_state::{AppEvent, AppState};

use super::poll::{refresh_sun_data, refresh_time_data};

pub async fn handle_app_event(event: AppEvent, state: &mut AppState) -> Result<bool> {
    match event {
        AppEvent::SetLogLevel(level) => {
            log::info!("Changing log level to {}", level);
            state.log_handle.apply(level)?;
            if let Err(err) = state.value_store.set("log_level", &level).await {
                log::warn!("Could not persist log level: {:?}", err);
            }
            state.device.apply_log_level(level).await?;
        }
        AppEvent::Refresh => {
            refresh_time_data(state).await?;
            refresh_sun_data(state).await?;
            // a refresh always reports every value, even the unchanged ones
            state.device.publish_property_values().await?;
        }
        AppEvent::Exit => {
            // Stop configuration watcher
            state.params_watcher_handle.stop().await?;

            // send the disconnect signal for the device
            state.device.disconnect_device().await?;

            // wait a second to give mqtt the chance to publish the disconnect state properly
            // TODO: Find a solution that does not rely on some arbitrary number of seconds of wait
            // time
            tokio::time::sleep(Duration::from_secs(1)).await;
            // disconnect the client
            state.device.disconnect_client().await?;

            // exit
            state.should_exit = true;
        }
    }
    Ok(false)
}
