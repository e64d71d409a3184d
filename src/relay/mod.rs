//! Chat relay core.
//!
//! - [`engine`]: Per-request orchestration and the forwarding task
//! - [`request`]: Inbound chat request
//! - [`error`]: Error taxonomy and HTTP mapping

pub mod engine;
pub mod error;
pub mod request;

pub use engine::{Relay, RelayEvent, RelayStream};
pub use error::RelayError;
pub use request::ChatRequest;
