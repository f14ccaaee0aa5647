use color_eyre::eyre::Result;
use hc_homie5::{HomieClientEvent, HomieDevice};
use hc_homie5_timedata::{
    app_state::{AppState, ConnectionEvent, ConnectionState},
    loglevel::LogLevel,
    utils::log_homie_message,
};

pub async fn handle_device_client_event(event: HomieClientEvent, state: &mut AppState) -> Result<bool> {
    match event {
        HomieClientEvent::Connect => {
            log::debug!("Homie device: mqtt connected. Publishing");

            let con_event = state.device_client_state.change_state(ConnectionState::Connected);
            if let Some(ConnectionEvent::Connect) = con_event {
                // first connect, restore the persisted log level
                if let Some(level) = state.value_store.get::<LogLevel>("log_level").await {
                    log::debug!("Restoring persisted log level: {}", level);
                    state.log_handle.apply(level)?;
                    state.device.apply_log_level(level).await?;
                }
            }
            state.device.publish_device().await?;
            state.start_watchers().await;
        }
        HomieClientEvent::Disconnect => {
            log::debug!("Homie device: mqtt disconnected.");
            state.device_client_state.change_state(ConnectionState::Disconnected);
        }
        HomieClientEvent::HomieMessage(event) => {
            log::trace!("Homie device: {}", log_homie_message(&event));
            if let homie5::Homie5Message::PropertySet { property, set_value } = &event {
                state.device.handle_set_command(property, set_value).await?;
            }
        }
        HomieClientEvent::Stop => {
            log::debug!("Homie device client stopped");
        }
        HomieClientEvent::Error(err) => {
            log::error!("Homie device client error: {:?}", err);
        }
    }
    Ok(false)
}
