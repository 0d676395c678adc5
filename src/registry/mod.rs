//! Per-channel session registry
//!
//! Turns source-protocol events into codec handlers and publishes the frames
//! they produce:
//!
//! ```text
//!   SourceEvent::NewSession ──► codec::lookup ──► CodecHandler::on_config
//!   SourceEvent::Data ──► CodecHandler::on_data ──► Transport::publish_*
//!   SourceEvent::CloseSession ──► handler dropped
//!   SourceEvent::Error / timeouts ──► RestartPolicy ──► restart delay
//! ```

pub mod codec;
pub mod restart;
pub mod store;

pub use codec::CodecEntry;
pub use restart::{Fault, RestartPolicy};
pub use store::{SessionLabels, SessionRegistry};
