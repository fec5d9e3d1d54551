//! Clients for external providers. Each client turns transport and decoding
//! failures into `crate::error::Error` at its boundary and never panics on
//! upstream data.

pub mod open_meteo;
