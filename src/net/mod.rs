//! Network layer.
//!
//! Only binding lives here; accepting and connection handling belong to axum.

pub mod listener;

pub use listener::{bind, ListenerError};
