use anyhow::Result;
use eventsource_client::{self as es, Client};
use futures_util::stream::StreamExt;
use log::*;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// A decoded `data:` record. The server sends unnamed events, so the kind
/// comes from the body's `type` field; campaign messages without one are
/// reported as `message`.
#[derive(Debug, Clone)]
pub struct Event {
    pub kind: String,
    pub data: Value,
    pub timestamp: Instant,
}

impl Event {
    pub fn from_data(data: Value) -> Self {
        let kind = data
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("message")
            .to_string();

        Self {
            kind,
            data,
            timestamp: Instant::now(),
        }
    }
}

pub struct Connection {
    pub label: String,
    event_rx: mpsc::UnboundedReceiver<Event>,
    _handle: tokio::task::JoinHandle<()>,
}

impl Connection {
    /// Opens `url` and forwards its data records. Reconnection is disabled so a
    /// server side close is observable through `wait_for_close`.
    pub async fn establish(url: &str, label: String) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let client = es::ClientBuilder::for_url(url)?
            .reconnect(es::ReconnectOptions::reconnect(false).build())
            .build();

        let task_label = label.clone();
        let handle = tokio::spawn(async move {
            let mut stream = client.stream();

            loop {
                match stream.next().await {
                    Some(Ok(es::SSE::Event(event))) => match serde_json::from_str(&event.data) {
                        Ok(data) => {
                            if tx.send(Event::from_data(data)).is_err() {
                                debug!("Event receiver dropped for {}", task_label);
                                break;
                            }
                        }
                        Err(e) => warn!("Non-JSON data record for {}: {}", task_label, e),
                    },
                    Some(Ok(es::SSE::Comment(comment))) => {
                        trace!("Comment for {}: {}", task_label, comment);
                    }
                    Some(Err(e)) => {
                        debug!("Stream for {} ended: {}", task_label, e);
                        break;
                    }
                    None => {
                        debug!("Stream ended for {}", task_label);
                        break;
                    }
                }
            }
        });

        Ok(Self {
            label,
            event_rx: rx,
            _handle: handle,
        })
    }

    /// Waits for the next record of any kind.
    pub async fn next_event(&mut self, timeout: Duration) -> Result<Event> {
        match tokio::time::timeout(timeout, self.event_rx.recv()).await {
            Ok(Some(event)) => Ok(event),
            Ok(None) => anyhow::bail!("Stream closed"),
            Err(_) => anyhow::bail!("Timeout waiting for the next event"),
        }
    }

    /// Waits for a record of `kind`, skipping any other kind.
    pub async fn wait_for_event(&mut self, kind: &str, timeout: Duration) -> Result<Event> {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                anyhow::bail!("Timeout waiting for event: {}", kind);
            }

            match tokio::time::timeout(remaining, self.event_rx.recv()).await {
                Ok(Some(event)) if event.kind == kind => {
                    return Ok(event);
                }
                Ok(Some(_)) => {
                    // Wrong event kind, keep waiting
                    continue;
                }
                Ok(None) => {
                    anyhow::bail!("Stream closed");
                }
                Err(_) => {
                    anyhow::bail!("Timeout waiting for event: {}", kind);
                }
            }
        }
    }

    /// Collects records until the server closes the stream. Returns `None` if
    /// it is still open after `timeout`.
    pub async fn wait_for_close(&mut self, timeout: Duration) -> Option<Vec<Event>> {
        let deadline = Instant::now() + timeout;
        let mut received = Vec::new();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, self.event_rx.recv()).await {
                Ok(Some(event)) => received.push(event),
                Ok(None) => return Some(received),
                Err(_) => return None,
            }
        }
    }
}
