use config_watcher::ConfigItemWatcherHandle;
use simple_kv_store::KeyValueStore;
use tokio::sync::mpsc::Sender;

use crate::{
    device::TimeDataDevice,
    loglevel::{LogLevel, LogLevelReloadHandle},
    params::ParamsTracker,
    poll::PollScheduler,
};

#[derive(Debug)]
pub enum AppEvent {
    SetLogLevel(LogLevel),
    Refresh,

    Exit,
}

pub struct AppState {
    pub device: TimeDataDevice,
    pub params: ParamsTracker,
    pub poller: PollScheduler,
    pub app_event_sender: Sender<AppEvent>,
    pub should_exit: bool,
    pub device_client_state: ConnectionState,
    pub value_store: KeyValueStore,
    pub log_handle: LogLevelReloadHandle,
    pub params_watcher_handle: ConfigItemWatcherHandle,
}

impl AppState {
    pub async fn start_watchers(&self) {
        if let ConnectionState::Connected = self.device_client_state {
            match self.params_watcher_handle.start().await {
                Ok(_) => {
                    log::debug!("Started parameter config watcher");
                }
                Err(e) => {
                    log::error!("Error starting parameter config watcher. {:?}", e);
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ConnectionState {
    Init,
    Connected,
    Disconnected,
}

#[derive(Clone, Copy, Debug)]
pub enum ConnectionEvent {
    Connect,
    Disconnect,
    Reconnect,
}

impl ConnectionState {
    pub fn change_state(&mut self, new_state: ConnectionState) -> Option<ConnectionEvent> {
        let event = match (&self, &new_state) {
            (ConnectionState::Init, ConnectionState::Connected) => Some(ConnectionEvent::Connect),
            (ConnectionState::Connected, ConnectionState::Disconnected) => Some(ConnectionEvent::Disconnect),
            (ConnectionState::Disconnected, ConnectionState::Connected) => Some(ConnectionEvent::Reconnect),
            _ => None,
        };

        *self = new_state;
        event
    }
}
