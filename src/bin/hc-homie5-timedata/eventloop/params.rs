use color_eyre::eyre::Result;
use config_watcher::ConfigItemEvent;
use hc_homie5_timedata::{app_state::AppState, params::DeviceParams, poll::PollIntervals};

use super::poll::{refresh_sun_data, refresh_time_data};

pub async fn handle_params_changes_event(event: ConfigItemEvent<DeviceParams>, state: &mut AppState) -> Result<bool> {
    match event {
        ConfigItemEvent::NewDocument(id, filename) => {
            state.params.add_document_file(id, filename);
        }
        ConfigItemEvent::RemoveDocument(id) => {
            state.params.remove_document_file(id);
            // a document can disappear without ever having produced a valid
            // parameter item, re-resolve so missing settings surface again
            refresh_node_config(state).await?;
        }
        ConfigItemEvent::New(hash, params) => {
            let filename = state
                .params
                .get_filename(hash)
                .cloned()
                .unwrap_or("unknown-document".to_string());
            log::debug!("New parameter document: {} ({})", filename, hash);
            state.params.insert(hash, params);
            refresh_node_config(state).await?;
        }
        ConfigItemEvent::Removed(hash) => {
            log::debug!("Removed parameter document: {}", hash);
            state.params.remove(hash);
            refresh_node_config(state).await?;
        }
    }
    Ok(false)
}

/// Re-resolves the parameter documents into a device configuration, syncs the
/// alerts and on a change retunes the poll cadence and refreshes all values.
async fn refresh_node_config(state: &mut AppState) -> Result<()> {
    let resolution = state.params.resolve();
    for problem in &resolution.problems {
        log::warn!("Parameter problem: {}", problem);
    }
    state.device.update_config_alerts(&resolution.problems).await?;

    let intervals = resolution.config.as_ref().map(|config| PollIntervals {
        short: config.short_poll,
        long: config.long_poll,
    });
    if state.params.set_applied(resolution.config) {
        if let Some(intervals) = intervals {
            log::info!(
                "Applying new configuration, polling every {:?} (sun data every {:?})",
                intervals.short,
                intervals.long
            );
            state.poller.set_intervals(intervals).await?;
        }
        refresh_time_data(state).await?;
        refresh_sun_data(state).await?;
    }
    Ok(())
}
