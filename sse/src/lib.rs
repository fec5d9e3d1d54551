//! Event-stream sessions.
//!
//! This crate turns a `domain::PollSource` into a strictly ordered sequence of
//! wire records for a single client.
//!
//! # Architecture
//!
//! - **One task per session**: sessions share nothing and need no locking.
//!   The task running `PollScheduler::run` is the only writer for its client.
//! - **Handshake first**: every run starts with a `connected` event, then
//!   forwards one event per poll in poll order.
//! - **In-band errors**: a failed poll becomes an `error` event and polling
//!   continues. Only cancellation, a closed sink, or an exhausted source end
//!   a run.
//! - **Cancellable waits**: the wait between polls races a
//!   `CancellationToken`, so a disconnect is observed immediately.
//!
//! # Modules
//!
//! - `message`: the `Event` type and its JSON shape
//! - `encoder`: `Event` to `data: ...\n\n` / heartbeat comment bytes
//! - `scheduler`: `PollScheduler`, `EventSink`, `StopReason`
//! - `sink`: `ChannelSink`, the sink feeding an HTTP response body

pub mod encoder;
pub mod message;
pub mod scheduler;
pub mod sink;

pub use message::Event;
pub use scheduler::{EventSink, PollScheduler, SinkClosed, StopReason};
pub use sink::ChannelSink;
