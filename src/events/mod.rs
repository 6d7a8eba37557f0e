use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Sending half of the domain event channel, shared by every service.
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

    /// Sends an event, logging instead of failing when the receiver is gone.
    pub async fn publish(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "Dropping domain event");
        }
    }
}

/// Creates the bounded event channel.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Things that happened to clients, qualities and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    ClientCreated(i32),
    ClientUpdated(i32),
    ClientDeleted(i32),

    QualityCreated(i32),
    QualityUpdated(i32),
    QualityDeleted(i32),

    ReportCreated {
        report_id: i32,
        challan_no: i32,
        items: usize,
    },
    ReportUpdated {
        report_id: i32,
        items: usize,
    },
    ReportDeleted(i32),
    ReportExported {
        report_id: i32,
        format: String,
    },

    SeedApplied {
        clients: u64,
        qualities: u64,
    },
}

impl Event {
    /// Short stable name used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::ClientCreated(_) => "client_created",
            Event::ClientUpdated(_) => "client_updated",
            Event::ClientDeleted(_) => "client_deleted",
            Event::QualityCreated(_) => "quality_created",
            Event::QualityUpdated(_) => "quality_updated",
            Event::QualityDeleted(_) => "quality_deleted",
            Event::ReportCreated { .. } => "report_created",
            Event::ReportUpdated { .. } => "report_updated",
            Event::ReportDeleted(_) => "report_deleted",
            Event::ReportExported { .. } => "report_exported",
            Event::SeedApplied { .. } => "seed_applied",
        }
    }
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        let kind = event.kind();
        metrics::counter!("packing_events.processed", 1, "kind" => kind);

        match event {
            Event::ClientCreated(id) | Event::ClientUpdated(id) | Event::ClientDeleted(id) => {
                info!(event = kind, client_id = id, "Client event");
            }
            Event::QualityCreated(id) | Event::QualityUpdated(id) | Event::QualityDeleted(id) => {
                info!(event = kind, quality_id = id, "Quality event");
            }
            Event::ReportCreated {
                report_id,
                challan_no,
                items,
            } => {
                info!(event = kind, report_id, challan_no, items, "Report created");
            }
            Event::ReportUpdated { report_id, items } => {
                info!(event = kind, report_id, items, "Report updated");
            }
            Event::ReportDeleted(report_id) => {
                info!(event = kind, report_id, "Report deleted");
            }
            Event::ReportExported { report_id, format } => {
                info!(event = kind, report_id, format = %format, "Report exported");
            }
            Event::SeedApplied { clients, qualities } => {
                info!(event = kind, clients, qualities, "Seed data applied");
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_delivers_to_receiver() {
        let (sender, mut rx) = channel(4);
        sender.publish(Event::ClientCreated(7)).await;
        assert_eq!(rx.recv().await, Some(Event::ClientCreated(7)));
    }

    #[tokio::test]
    async fn publish_after_receiver_dropped_does_not_panic() {
        let (sender, rx) = channel(1);
        drop(rx);
        assert!(sender.send(Event::ReportDeleted(1)).await.is_err());
        sender.publish(Event::ReportDeleted(1)).await;
    }

    #[tokio::test]
    async fn process_events_stops_when_senders_drop() {
        let (sender, rx) = channel(8);
        let handle = tokio::spawn(process_events(rx));
        sender
            .publish(Event::ReportCreated {
                report_id: 1,
                challan_no: 101,
                items: 3,
            })
            .await;
        sender
            .publish(Event::SeedApplied {
                clients: 5,
                qualities: 4,
            })
            .await;
        drop(sender);
        handle.await.unwrap();
    }

    #[test]
    fn event_kinds_are_snake_case() {
        assert_eq!(Event::QualityDeleted(2).kind(), "quality_deleted");
        assert_eq!(
            Event::ReportExported {
                report_id: 1,
                format: "csv".into()
            }
            .kind(),
            "report_exported"
        );
    }
}
