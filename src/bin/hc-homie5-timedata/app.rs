use std::{fs, time::Duration};

use color_eyre::eyre::Result;
use config_watcher::{backend, config_item_watcher::run_config_item_watcher, YamlTokenizer};
use hc_homie5::{run_homie_client, HomieClientHandle, MqttClientConfig};
use hc_homie5_timedata::{
    app_state::{AppEvent, AppState, ConnectionState},
    device::TimeDataDevice,
    loglevel::LogLevelReloadHandle,
    params::{DeviceParams, ParamsTracker},
    poll::{run_poll_task, PollHandle, PollIntervals},
    settings::{ConfigBackend, ValueStoreConfig, CHANNEL_CAPACITY, SETTINGS},
    utils::throttle_channel,
};
use homie5::Homie5DeviceProtocol;
use simple_kv_store::{InMemoryStore, KeyValueStore, KubernetesStore, SQLiteStore};
use tokio::sync::mpsc;

use crate::eventloop::EventMultiPlexer;

pub async fn initialize_app(
    log_handle: LogLevelReloadHandle,
) -> Result<(EventMultiPlexer, HomieClientHandle, PollHandle, AppState)> {
    let settings = &SETTINGS;

    let (app_event_sender, app_event_receiver) = mpsc::channel::<AppEvent>(CHANNEL_CAPACITY);

    // Setup homie device
    // =====================================================
    let (homie_proto, last_will) =
        Homie5DeviceProtocol::new(settings.homie.device_id.clone(), settings.homie.homie_domain.clone());

    let homie_client_options = MqttClientConfig::new(&settings.homie.hostname)
        .client_id(&settings.homie.client_id)
        .port(settings.homie.port)
        .username(&settings.homie.username)
        .password(&settings.homie.password)
        .last_will(Some(last_will));

    let (homie_device_client_handle, homie_client, homie_event_receiver) =
        run_homie_client(homie_client_options.to_mqtt_options(), homie_client_options.mqtt_channel_size)?;

    let device = TimeDataDevice::new(
        settings.homie.device_id.clone(),
        &settings.homie.device_name,
        homie_proto,
        &homie_client,
        app_event_sender.clone(),
    );

    // Setup poll timers
    // =====================================================
    let (poll_handle, poller, poll_receiver) = run_poll_task(PollIntervals::default(), CHANNEL_CAPACITY);

    // Setup configuration watcher
    // =====================================================
    let deserialize_params = |doc: &str| serde_yml::from_str(doc);

    let (params_watcher_handle, params_receiver) = run_config_item_watcher::<DeviceParams, _>(
        || match &settings.app.params_config {
            ConfigBackend::File { path } => {
                backend::run_config_file_watcher(fs::canonicalize(path).unwrap(), "*.yaml", Duration::from_millis(500))
            }
            ConfigBackend::Kubernetes { name, namespace } => {
                log::debug!("Using Kubernetes backend for parameters");
                backend::run_configmap_watcher(name.to_string(), namespace.to_string())
            }
            ConfigBackend::Mqtt { topic } => {
                let mco = MqttClientConfig::new(&settings.homie.hostname)
                    .client_id(format!("{}-cfg", &settings.homie.client_id))
                    .port(settings.homie.port)
                    .username(&settings.homie.username)
                    .password(&settings.homie.password);
                log::debug!("Using Mqtt backend for parameters");
                backend::run_mqtt_watcher(mco.to_mqtt_options(), topic, 1024)
            }
        },
        &YamlTokenizer,
        deserialize_params,
    )?;

    // Simple Value store
    // =====================================================
    let value_store = match &settings.app.value_store_config {
        ValueStoreConfig::InMemory => KeyValueStore::InMemory(InMemoryStore::new()),
        ValueStoreConfig::Kubernetes {
            name,
            namespace,
            ressource_type,
        } => KeyValueStore::Kubernetes(KubernetesStore::new(namespace, name, *ressource_type).await?),
        ValueStoreConfig::Sqlite { path } => KeyValueStore::SQLite(SQLiteStore::new(path).await),
    };

    // Setup EventMultiPlexer
    // =====================================================
    let event_multiplexer = EventMultiPlexer::new(
        app_event_receiver,
        homie_event_receiver,
        // throttle parameter document events to not overload the mqtt broker with republishes
        throttle_channel(params_receiver, Duration::from_millis(10)),
        poll_receiver,
    );

    Ok((
        event_multiplexer,
        homie_device_client_handle,
        poll_handle,
        AppState {
            device,
            params: ParamsTracker::new(),
            poller,
            app_event_sender,
            should_exit: false,
            device_client_state: ConnectionState::Init,
            value_store,
            log_handle,
            params_watcher_handle,
        },
    ))
}

pub async fn deinitialize_app(homie_device_client_handle: HomieClientHandle, poll_handle: PollHandle) -> Result<()> {
    poll_handle.stop().await;

    // once the mqtt connection is closed the device client task will exit.
    // this is to ensure we wait until this happens before discarding the device object
    homie_device_client_handle.stop().await?;
    log::debug!("Deinitialized app...");

    Ok(())
}
