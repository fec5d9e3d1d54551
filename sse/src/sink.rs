use crate::encoder::encode;
use crate::message::{Event, EventType};
use crate::scheduler::{EventSink, SinkClosed};
use async_trait::async_trait;
use bytes::Bytes;
use log::*;
use tokio::sync::mpsc::Sender;

/// Encodes events and hands the bytes to the task writing the response body.
///
/// The channel is bounded, so a slow client applies backpressure to its own
/// session only.
pub struct ChannelSink {
    sender: Sender<Bytes>,
}

impl ChannelSink {
    pub fn new(sender: Sender<Bytes>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn send(&mut self, event: Event) -> Result<(), SinkClosed> {
        let record = match encode(&event) {
            Ok(record) => record,
            Err(e) => {
                // Dropping one record keeps the stream well formed.
                error!("Failed to encode {} event: {e}", event.event_type());
                return Ok(());
            }
        };

        self.sender.send(record).await.map_err(|_| SinkClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_send_writes_encoded_record() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut sink = ChannelSink::new(tx);

        sink.send(Event::connected(51.5, -0.1)).await.unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            Bytes::from_static(b"data: {\"type\":\"connected\",\"lat\":51.5,\"lon\":-0.1}\n\n")
        );
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped_reports_closed() {
        let (tx, rx) = mpsc::channel(4);
        let mut sink = ChannelSink::new(tx);
        drop(rx);

        assert_eq!(sink.send(Event::Heartbeat).await, Err(SinkClosed));
    }
}
