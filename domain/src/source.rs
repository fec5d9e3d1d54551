use crate::error::Error;
use crate::reading::Reading;
use async_trait::async_trait;
use serde_json::Value;

/// Result of a single poll. Exactly one variant, never partially filled.
#[derive(Debug)]
pub enum PollOutcome {
    Reading(Reading),
    Failed(Error),
    /// A pre-computed message to forward as-is.
    Message(Value),
    /// Nothing new; keep the connection warm.
    Heartbeat,
    /// A finite source has nothing left to send.
    Exhausted,
}

/// A per-session data source driven by the poll scheduler.
///
/// Implementations must not panic on upstream faults; every failure is
/// returned as `PollOutcome::Failed`. Each call performs at most one
/// upstream request.
#[async_trait]
pub trait PollSource: Send {
    async fn poll(&mut self) -> PollOutcome;
}
