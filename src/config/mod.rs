//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! trellis.toml            Config::new() builder
//!     → loader.rs (parse)      │
//!     → validation.rs ←────────┘ (bootstrap validates API-built configs too)
//!     → Config (immutable, shared via Arc)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{Config, DEFAULT_MAX_LOGGED_BODY};
pub use validation::{validate_config, ValidationError};
