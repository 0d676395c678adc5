//! Per-channel stream lifecycle
//!
//! A [`StreamController`] pairs one channel path with one source URL and
//! starts the upstream session only while somebody is watching.

pub mod controller;
pub mod status;

pub use controller::StreamController;
pub use status::StreamStatus;
