//! Process-level infrastructure shared by every other crate: configuration
//! loading and logger setup.

pub mod config;
pub mod logging;
