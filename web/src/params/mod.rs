//! Typed parameters for endpoint inputs.
//!
//! Stream endpoints must never reject a connection because of a bad query
//! string, so their parameters are captured as raw strings and normalized in
//! the domain layer rather than validated by the extractor.

pub(crate) mod stream;
