//! Notification capability and per-alert dispatch
//!
//! The transport is an external collaborator: it accepts a rendered message
//! and a destination channel identifier. Dispatch isolates failures per
//! alert so one failed send never blocks the rest of the batch.

mod webhook;

pub use webhook::WebhookNotifier;

use async_trait::async_trait;
use thiserror::Error;

use crate::catalog::{AlertEvent, ChangeKind};

/// Errors surfaced by a notification transport
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transport rejected message: HTTP {status}")]
    Rejected { status: u16 },
}

/// A rendered alert ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub text: String,
    pub title: String,
    pub url: String,
}

/// Capability contract for the notification transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, channel_id: &str, message: &AlertMessage) -> Result<(), NotifyError>;
}

/// Renders the one-line message for an alert event.
pub fn alert_message(event: &AlertEvent) -> AlertMessage {
    let text = match event.kind {
        ChangeKind::Restock => format!("{} is back in stock!", event.item.name),
        ChangeKind::NewItem => format!("New listing: {}", event.item.name),
    };

    AlertMessage {
        text,
        title: event.item.name.clone(),
        url: event.item.url.clone(),
    }
}

/// Sends every alert to `channel_id`, one at a time, in order.
///
/// A failed send is logged and skipped; returns how many went through.
pub async fn dispatch_alerts(
    notifier: &dyn Notifier,
    channel_id: &str,
    alerts: &[AlertEvent],
) -> usize {
    let mut sent = 0;
    for event in alerts {
        let message = alert_message(event);
        match notifier.send(channel_id, &message).await {
            Ok(()) => {
                tracing::info!("Alert sent for: {}", event.item.name);
                sent += 1;
            }
            Err(e) => {
                tracing::error!("Error sending alert for {}: {}", event.item.name, e);
            }
        }
    }
    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogItem, ListingRecord};
    use chrono::Utc;
    use std::sync::Mutex;

    fn event(name: &str, kind: ChangeKind) -> AlertEvent {
        AlertEvent {
            item: CatalogItem::from_record(
                &ListingRecord {
                    name: name.to_string(),
                    price: 12.99,
                    in_stock: true,
                    url: format!("https://x/{}", name),
                },
                Utc::now(),
            ),
            kind,
        }
    }

    /// Transport that fails for configured names and records the rest.
    struct FlakyNotifier {
        fail_for: Vec<String>,
        delivered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for FlakyNotifier {
        async fn send(&self, _channel_id: &str, message: &AlertMessage) -> Result<(), NotifyError> {
            if self.fail_for.contains(&message.title) {
                return Err(NotifyError::Rejected { status: 500 });
            }
            self.delivered.lock().unwrap().push(message.title.clone());
            Ok(())
        }
    }

    #[test]
    fn test_alert_message_shapes() {
        let restock = alert_message(&event("Labubu A", ChangeKind::Restock));
        assert_eq!(restock.text, "Labubu A is back in stock!");
        assert_eq!(restock.title, "Labubu A");

        let fresh = alert_message(&event("Labubu B", ChangeKind::NewItem));
        assert_eq!(fresh.text, "New listing: Labubu B");
        assert_eq!(fresh.url, "https://x/Labubu B");
    }

    #[tokio::test]
    async fn test_failed_send_does_not_block_later_alerts() {
        let notifier = FlakyNotifier {
            fail_for: vec!["Labubu B".to_string()],
            delivered: Mutex::new(Vec::new()),
        };
        let alerts = vec![
            event("Labubu A", ChangeKind::NewItem),
            event("Labubu B", ChangeKind::Restock),
            event("Labubu C", ChangeKind::NewItem),
        ];

        let sent = dispatch_alerts(&notifier, "chan", &alerts).await;

        assert_eq!(sent, 2);
        assert_eq!(
            *notifier.delivered.lock().unwrap(),
            vec!["Labubu A".to_string(), "Labubu C".to_string()]
        );
    }
}
