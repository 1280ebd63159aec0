//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Config.cors   → cors.rs    → CorsLayer
//! Config.helmet → headers.rs → (HeaderName, HeaderValue) pairs
//!     → http::Host applies them as the outermost layers
//! ```

pub mod cors;
pub mod headers;

use thiserror::Error;

pub use cors::{cors_layer, CorsOptions, CorsSetting};
pub use headers::{HelmetSetting, SecurityHeaders};

/// Invalid CORS or security header settings.
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("invalid CORS origin `{0}`")]
    InvalidOrigin(String),

    #[error("invalid CORS method `{0}`")]
    InvalidMethod(String),

    #[error("invalid CORS header name `{0}`")]
    InvalidHeaderName(String),

    #[error("CORS credentials require an explicit origin list")]
    CredentialsWithWildcard,

    #[error("invalid value `{value}` for header `{header}`")]
    InvalidHeaderValue { header: String, value: String },
}
