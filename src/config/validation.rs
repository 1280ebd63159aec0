//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that controller patterns compile
//! - Check that CORS and security header settings build
//!
//! Returns every error found, not just the first.

use thiserror::Error;

use crate::config::schema::Config;
use crate::controllers::ControllerSource;
use crate::security::cors_layer;

/// A single semantic problem in a [`Config`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("host must not be empty")]
    EmptyHost,

    #[error("global_prefix `{0}` must start with `/`")]
    RelativePrefix(String),

    #[error("controller pattern #{0} is empty")]
    EmptyPattern(usize),

    #[error("controller pattern `{pattern}` is invalid: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("cors: {0}")]
    Cors(String),

    #[error("helmet: {0}")]
    Helmet(String),
}

/// Validate a configuration.
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }

    if !config.global_prefix.starts_with('/') {
        errors.push(ValidationError::RelativePrefix(config.global_prefix.clone()));
    }

    for (index, source) in config.controllers.iter().enumerate() {
        let ControllerSource::Pattern(pattern) = source else {
            continue;
        };
        if pattern.trim().is_empty() {
            errors.push(ValidationError::EmptyPattern(index));
        } else if let Err(e) = glob::Pattern::new(pattern) {
            errors.push(ValidationError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.msg.to_string(),
            });
        }
    }

    if let Some(options) = config.cors.options() {
        if let Err(e) = cors_layer(&options) {
            errors.push(ValidationError::Cors(e.to_string()));
        }
    }

    if let Some(headers) = config.helmet.options() {
        if let Err(e) = headers.to_header_pairs() {
            errors.push(ValidationError::Helmet(e.to_string()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{CorsOptions, CorsSetting};

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let config = Config {
            host: "  ".into(),
            global_prefix: "api".into(),
            cors: CorsSetting::Options(CorsOptions {
                allow_credentials: true,
                ..CorsOptions::default()
            }),
            ..Config::default()
        }
        .controller("")
        .controller("src/[*.rs");

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert_eq!(errors[0], ValidationError::EmptyHost);
        assert_eq!(errors[1], ValidationError::RelativePrefix("api".into()));
        assert_eq!(errors[2], ValidationError::EmptyPattern(0));
        assert!(matches!(errors[3], ValidationError::InvalidPattern { .. }));
        assert!(matches!(errors[4], ValidationError::Cors(_)));
    }
}
