use color_eyre::eyre::Result;
use config_watcher::ConfigItemEvent;
use device_client::handle_device_client_event;
use hc_homie5::{define_event_multiplexer, HomieClientEvent};
use hc_homie5_timedata::{
    app_state::{AppEvent, AppState},
    params::DeviceParams,
    poll::PollEvent,
};
use params::handle_params_changes_event;
use poll::handle_poll_event;

mod app;
mod device_client;
mod params;
mod poll;

pub use app::*;

define_event_multiplexer! {
    #[derive(Debug)]
    pub enum Event {
        App(AppEvent) => app,
        DeviceClient(HomieClientEvent) => device_client,
        ParamsChanges(ConfigItemEvent<DeviceParams>) => params_changes,
        Poll(PollEvent) => poll,
    }
}

pub async fn run_event_loop(event_multiplexer: &mut EventMultiPlexer, state: &mut AppState) -> Result<()> {
    loop {
        // timeout is usually 60s, except if we want to exit, we set it to one second, so the
        // application exits as soon as all events are done processing
        let timeout = if state.should_exit { 1 } else { 60 };
        let exit = match event_multiplexer.next(timeout).await {
            Event::App(app_event) => handle_app_event(app_event, state).await?,
            Event::DeviceClient(homie_client_event) => handle_device_client_event(homie_client_event, state).await?,
            Event::ParamsChanges(config_item_event) => handle_params_changes_event(config_item_event, state).await?,
            Event::Poll(poll_event) => handle_poll_event(poll_event, state).await?,
            Event::Timeout => state.should_exit,
            Event::None => false,
        };

        if exit {
            break;
        }
    }
    log::debug!("Exiting application event loop");
    Ok(())
}
