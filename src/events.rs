use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Domain events emitted by the lifecycle and catalog services.
///
/// Delivery is best-effort; a full channel or missing consumer never affects
/// the outcome of the request that produced the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ApplicationSubmitted(Uuid),
    ApplicationUpdated(Uuid),
    ApplicationCancelled(Uuid),
    ApplicationDeleted(Uuid),
    ApplicationStatusChanged {
        application_id: Uuid,
        old_status: String,
        new_status: String,
    },
    ItemCreated(Uuid),
    ItemUpdated(Uuid),
    ItemDeleted(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Consumes events from the channel and logs them. Runs until all senders
/// are dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    while let Some(event) = rx.recv().await {
        match &event {
            Event::ApplicationStatusChanged {
                application_id,
                old_status,
                new_status,
            } => info!(
                application_id = %application_id,
                old_status = %old_status,
                new_status = %new_status,
                "application status changed"
            ),
            other => info!(event = ?other, "domain event"),
        }
    }
    info!("event channel closed; event processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sender_delivers_events_to_processor() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        let id = Uuid::new_v4();
        sender.send(Event::ApplicationSubmitted(id)).await.unwrap();

        match rx.recv().await {
            Some(Event::ApplicationSubmitted(got)) => assert_eq!(got, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_fails_once_receiver_is_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        assert!(sender
            .send(Event::ItemDeleted(Uuid::new_v4()))
            .await
            .is_err());
    }
}
