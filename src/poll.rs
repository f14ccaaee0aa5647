use std::time::Duration;

use color_eyre::eyre::Result;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, Interval};

use crate::params::{DEFAULT_LONG_POLL_SECS, DEFAULT_SHORT_POLL_SECS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollEvent {
    /// Time/calendar refresh cadence.
    Short,
    /// Sunrise/sunset refresh cadence.
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub short: Duration,
    pub long: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            short: Duration::from_secs(DEFAULT_SHORT_POLL_SECS),
            long: Duration::from_secs(DEFAULT_LONG_POLL_SECS),
        }
    }
}

#[derive(Debug)]
pub struct PollHandle {
    stop_sender: watch::Sender<bool>, // Shutdown signal
    handle: tokio::task::JoinHandle<()>,
}

impl PollHandle {
    /// Stops the poll task.
    pub async fn stop(self) {
        let _ = self.stop_sender.send(true); // Send the shutdown signal
        let _ = self.handle.await; // Await the task's completion
    }
}

#[derive(Debug, Clone)]
pub struct PollScheduler {
    updates: mpsc::Sender<PollIntervals>, // Channel for runtime retuning
}

impl PollScheduler {
    pub async fn set_intervals(&self, intervals: PollIntervals) -> Result<()> {
        self.updates.send(intervals).await?;
        Ok(())
    }
}

/// Starts the poll task that emits the short and long poll events.
///
/// # Arguments
/// - `intervals`: Initial short/long cadence.
/// - `channel_size`: Size of the channel buffer for events.
///
/// # Returns
/// A tuple containing the `PollHandle` to stop the task, the `PollScheduler`
/// for runtime retuning and a receiver for poll events.
pub fn run_poll_task(
    intervals: PollIntervals,
    channel_size: usize,
) -> (PollHandle, PollScheduler, mpsc::Receiver<PollEvent>) {
    let (event_sender, event_receiver) = mpsc::channel(channel_size);
    let (updates_sender, mut updates_receiver) = mpsc::channel::<PollIntervals>(channel_size);
    let (stop_sender, mut stop_receiver) = watch::channel(false);

    let handle = tokio::spawn(async move {
        let mut current = intervals;
        let (mut short_timer, mut long_timer) = make_timers(current);

        loop {
            tokio::select! {
                // Handle interval updates
                Some(update) = updates_receiver.recv() => {
                    if update != current {
                        log::debug!("Retuning poll intervals: short {:?}, long {:?}", update.short, update.long);
                        current = update;
                        (short_timer, long_timer) = make_timers(current);
                    }
                }

                // Stop signal received
                _ = stop_receiver.changed() => {
                    if *stop_receiver.borrow() {
                        log::debug!("Stopping poll task...");
                        break;
                    }
                }

                _ = short_timer.tick() => {
                    if event_sender.send(PollEvent::Short).await.is_err() {
                        break;
                    }
                }

                _ = long_timer.tick() => {
                    if event_sender.send(PollEvent::Long).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    (
        PollHandle { stop_sender, handle },
        PollScheduler {
            updates: updates_sender,
        },
        event_receiver,
    )
}

// Fresh timers first fire one full period from now; the immediate refresh on
// a config change is driven by the event loop, not by the timers.
fn make_timers(intervals: PollIntervals) -> (Interval, Interval) {
    let now = Instant::now();
    (
        time::interval_at(now + intervals.short, intervals.short),
        time::interval_at(now + intervals.long, intervals.long),
    )
}
