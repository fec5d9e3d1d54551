//! Domain layer of the weather stream service: session parameters, the
//! readings produced by a poll, the sources the scheduler drives, and the
//! upstream gateway they call.
//!
//! Nothing here knows about the event-stream wire format or HTTP responses.

pub use reading::Reading;
pub use session::{SessionParameters, StreamDefaults};
pub use source::{PollOutcome, PollSource};

pub mod error;
pub mod gateway;
pub mod reading;
pub mod replay;
pub mod session;
pub mod source;
pub mod weather;
