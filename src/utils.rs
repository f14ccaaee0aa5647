use homie5::{Homie5Message, ToTopic};
use tokio::{
    sync::mpsc,
    time::{sleep_until, Duration, Instant},
};

/// Wraps a `tokio::mpsc::Receiver` and returns a new receiver that forwards
/// messages with at least `delay` time between them.
///
/// The function spawns a background task and automatically shuts down when the
/// original sender is dropped.
pub fn throttle_channel<T: Send + 'static>(mut input_rx: mpsc::Receiver<T>, delay: Duration) -> mpsc::Receiver<T> {
    let (throttled_tx, throttled_rx) = mpsc::channel(65535);

    tokio::spawn(async move {
        let mut next_allowed = Instant::now();

        while let Some(msg) = input_rx.recv().await {
            sleep_until(next_allowed).await;

            if throttled_tx.send(msg).await.is_err() {
                break; // Stop if the receiver is closed
            }

            next_allowed = Instant::now() + delay;
        }
    });

    throttled_rx
}

/// Render the homie messages a device session can see for trace logging.
pub fn log_homie_message(msg: &Homie5Message) -> String {
    match msg {
        Homie5Message::PropertySet { property, set_value } => {
            format!("[PropertySet]: Property: [{}], set_value: [{}]", property.to_topic().build(), set_value)
        }
        Homie5Message::PropertyValue { property, value } => {
            format!("[PropertyValue]: Property: [{}], value: [{}]", property.to_topic().build(), value)
        }
        Homie5Message::PropertyTarget { property, target } => {
            format!("[PropertyTarget]: Property: [{}], value: [{}]", property.to_topic().build(), target)
        }
        Homie5Message::Broadcast {
            homie_domain,
            subtopic,
            data,
        } => format!("[Broadcast]: homie domain: [{}], subtopic: [{}], data:[{}]", homie_domain, subtopic, data),
        msg => format!("{:?}", msg),
    }
}
