use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::model::Event;

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub for record changes, one channel per vehicle.
#[derive(Default)]
pub struct NotifyHub {
    channels: DashMap<String, broadcast::Sender<Event>>,
}

impl NotifyHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to changes on a vehicle. Creates the channel if needed.
    pub fn subscribe(&self, resource_id: &str) -> broadcast::Receiver<Event> {
        let sender = self
            .channels
            .entry(resource_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send a notification. No-op if nobody is listening.
    pub fn send(&self, resource_id: &str, event: &Event) {
        if let Some(sender) = self.channels.get(resource_id) {
            let _ = sender.send(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[tokio::test]
    async fn subscribe_and_receive() {
        let hub = NotifyHub::new();
        let mut rx = hub.subscribe("veh1");

        let event = Event::RecordDeleted {
            id: Ulid::new(),
            resource_id: "veh1".into(),
        };
        hub.send("veh1", &event);

        let received = rx.recv().await.unwrap();
        assert_eq!(received, event);
    }

    #[tokio::test]
    async fn other_vehicle_not_delivered() {
        let hub = NotifyHub::new();
        let mut rx = hub.subscribe("veh1");
        hub.send(
            "veh2",
            &Event::RecordDeleted {
                id: Ulid::new(),
                resource_id: "veh2".into(),
            },
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_without_subscribers_is_noop() {
        let hub = NotifyHub::new();
        // No subscriber — should not panic
        hub.send(
            "veh1",
            &Event::RecordDeleted {
                id: Ulid::new(),
                resource_id: "veh1".into(),
            },
        );
    }
}
