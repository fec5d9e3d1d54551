//! Drives one session: handshake, then poll, emit, wait, until told to stop.

use crate::message::{Event, EventType};
use async_trait::async_trait;
use domain::{PollOutcome, PollSource};
use log::*;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// The receiving side of a session is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkClosed;

/// Where a session's events go. A send failure ends the session.
#[async_trait]
pub trait EventSink: Send {
    async fn send(&mut self, event: Event) -> Result<(), SinkClosed>;
}

/// Why a scheduler run returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    TransportClosed,
    Exhausted,
}

pub struct PollScheduler {
    interval: Duration,
}

impl PollScheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Sends `handshake`, then polls `source` every `interval` until `cancel`
    /// fires, the sink closes, or the source is exhausted.
    ///
    /// A failed poll is forwarded as an error event and never stops the run.
    /// Cancellation is observed while polling, while sending and while
    /// waiting, so a disconnect never waits out the rest of an interval.
    pub async fn run<S, K>(
        &self,
        handshake: Event,
        source: &mut S,
        sink: &mut K,
        cancel: &CancellationToken,
    ) -> StopReason
    where
        S: PollSource + ?Sized,
        K: EventSink + ?Sized,
    {
        if let Err(reason) = emit(sink, handshake, cancel).await {
            return reason;
        }

        loop {
            if cancel.is_cancelled() {
                return StopReason::Cancelled;
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return StopReason::Cancelled,
                outcome = source.poll() => outcome,
            };

            let event = match outcome {
                PollOutcome::Reading(reading) => Event::Reading(reading),
                PollOutcome::Failed(err) => {
                    warn!("Poll failed, reporting in-band: {err}");
                    Event::failure(&err)
                }
                PollOutcome::Message(body) => Event::Message(body),
                PollOutcome::Heartbeat => Event::Heartbeat,
                PollOutcome::Exhausted => {
                    debug!("Poll source exhausted");
                    return StopReason::Exhausted;
                }
            };

            if let Err(reason) = emit(sink, event, cancel).await {
                return reason;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return StopReason::Cancelled,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}

async fn emit<K>(sink: &mut K, event: Event, cancel: &CancellationToken) -> Result<(), StopReason>
where
    K: EventSink + ?Sized,
{
    let event_type = event.event_type();
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StopReason::Cancelled),
        sent = sink.send(event) => match sent {
            Ok(()) => {
                trace!("Sent {event_type} event");
                Ok(())
            }
            Err(SinkClosed) => {
                debug!("Sink closed while sending {event_type} event");
                Err(StopReason::TransportClosed)
            }
        },
    }
}
