//! Event-stream HTTP handlers for the web layer.
//!
//! Only the axum handlers live here. Event types, encoding and the poll
//! scheduler live in the `sse` crate.

pub mod handler;
