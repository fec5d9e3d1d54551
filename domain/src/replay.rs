//! Fixed message sequences ("campaigns") streamed through the same session
//! machinery as live weather polling.

use crate::error::{Error, InternalErrorKind};
use crate::source::{PollOutcome, PollSource};
use async_trait::async_trait;
use log::*;
use serde_json::{json, Value};
use service::config::{CampaignMode, Config};
use std::sync::Arc;

/// Replays a shared list of messages, one per poll.
///
/// Once the list is drained the source either reports `Exhausted`
/// (`CampaignMode::Finite`) or emits heartbeats forever
/// (`CampaignMode::Heartbeat`).
pub struct ReplaySource {
    messages: Arc<[Value]>,
    next: usize,
    mode: CampaignMode,
}

impl ReplaySource {
    pub fn new(messages: Arc<[Value]>, mode: CampaignMode) -> Self {
        Self {
            messages,
            next: 0,
            mode,
        }
    }
}

#[async_trait]
impl PollSource for ReplaySource {
    async fn poll(&mut self) -> PollOutcome {
        if let Some(message) = self.messages.get(self.next) {
            self.next += 1;
            return PollOutcome::Message(message.clone());
        }

        match self.mode {
            CampaignMode::Finite => PollOutcome::Exhausted,
            CampaignMode::Heartbeat => PollOutcome::Heartbeat,
        }
    }
}

/// Loads the campaign messages named by the configuration, or the built-in
/// sequence when no file is configured.
pub fn load_campaign(config: &Config) -> Result<Arc<[Value]>, Error> {
    let Some(path) = config.campaign_file() else {
        return Ok(default_campaign().into());
    };

    info!("Loading campaign messages from {}", path.display());
    let contents = std::fs::read_to_string(&path)?;
    let messages = parse_campaign(&contents)?;
    info!("Loaded {} campaign messages", messages.len());

    Ok(messages.into())
}

fn parse_campaign(contents: &str) -> Result<Vec<Value>, Error> {
    match serde_json::from_str::<Value>(contents)? {
        Value::Array(messages) => Ok(messages),
        _ => Err(Error::internal(InternalErrorKind::Config)),
    }
}

fn default_campaign() -> Vec<Value> {
    vec![
        json!({ "status": "started", "source": "campaign", "message": "Campaign started" }),
        json!({ "status": "in_progress", "source": "campaign", "message": "Reaching subscribers" }),
        json!({ "status": "completed", "source": "campaign", "message": "Campaign finished" }),
    ]
}
