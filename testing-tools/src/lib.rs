// Testing Tools Library
//
// This crate provides testing utilities and tools for the weather stream service.
// Currently includes:
// - stream-test-client: end-to-end event stream testing tool

pub mod output;
pub mod scenarios;
pub mod sse_client;
