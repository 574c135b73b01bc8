//! Relay of diagnostic events to the background as `LOG_EVENT`.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use allowguard_events::EventBus;

use crate::ports::BackgroundTransport;

/// Forward every event published on `events` to the background.
///
/// Delivery failures are dropped. The task ends when the bus is closed.
pub fn spawn_event_forwarder(
    events: &EventBus,
    transport: Arc<dyn BackgroundTransport>,
) -> JoinHandle<()> {
    let mut receiver = events.subscribe();
    tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            if let Err(e) = transport.send(event.to_message()).await {
                debug!(event_type = %event.event_type, error = %e, "dropped diagnostic event");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use allowguard_core::TransportError;
    use allowguard_core::message::{
        AckReply, BackgroundReply, BridgeToBackground, GuardEventType,
    };
    use allowguard_events::GuardEvent;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    struct ChannelTransport {
        tx: mpsc::UnboundedSender<BridgeToBackground>,
        fail: bool,
    }

    #[async_trait]
    impl BackgroundTransport for ChannelTransport {
        async fn send(
            &self,
            message: BridgeToBackground,
        ) -> Result<BackgroundReply, TransportError> {
            let _ = self.tx.send(message);
            if self.fail {
                Err(TransportError::Disconnected)
            } else {
                Ok(BackgroundReply::Ack(AckReply { success: true }))
            }
        }
    }

    #[tokio::test]
    async fn test_events_become_log_event_messages() {
        let bus = EventBus::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _task = spawn_event_forwarder(&bus, Arc::new(ChannelTransport { tx, fail: true }));

        bus.publish(GuardEvent::new(
            "bridge",
            GuardEventType::WarningDisplayed,
            serde_json::json!({ "txId": "tx_1_0" }),
        ));
        bus.publish(GuardEvent::new(
            "bridge",
            GuardEventType::UserDecision,
            serde_json::json!({ "txId": "tx_1_0" }),
        ));

        // a failed delivery does not stop the relay
        for expected in [GuardEventType::WarningDisplayed, GuardEventType::UserDecision] {
            match rx.recv().await.unwrap() {
                BridgeToBackground::LogEvent { event_type, details } => {
                    assert_eq!(event_type, expected);
                    assert_eq!(details["txId"], "tx_1_0");
                },
                other => panic!("expected LOG_EVENT, got {other:?}"),
            }
        }
    }
}
