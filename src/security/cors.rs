//! CORS setup.
//!
//! `cors = true` mirrors the common defaults (any origin, the usual REST
//! methods). A table of [`CorsOptions`] narrows them.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::security::SecurityError;

/// `cors` config entry: a toggle or detailed options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsSetting {
    Enabled(bool),
    Options(CorsOptions),
}

impl Default for CorsSetting {
    fn default() -> Self {
        CorsSetting::Enabled(false)
    }
}

impl CorsSetting {
    /// `None` when CORS is switched off.
    pub fn options(&self) -> Option<CorsOptions> {
        match self {
            CorsSetting::Enabled(false) => None,
            CorsSetting::Enabled(true) => Some(CorsOptions::default()),
            CorsSetting::Options(options) => Some(options.clone()),
        }
    }
}

/// Detailed CORS options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsOptions {
    /// Allowed origins; empty means any.
    pub allowed_origins: Vec<String>,

    /// Allowed methods.
    pub allowed_methods: Vec<String>,

    /// Allowed request headers; empty means any.
    pub allowed_headers: Vec<String>,

    /// Send `Access-Control-Allow-Credentials`. Requires explicit origins.
    pub allow_credentials: bool,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: Option<u64>,
}

impl Default for CorsOptions {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allowed_methods: ["GET", "HEAD", "PUT", "PATCH", "POST", "DELETE"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allowed_headers: Vec::new(),
            allow_credentials: false,
            max_age_secs: None,
        }
    }
}

/// Build the tower-http layer.
pub fn cors_layer(options: &CorsOptions) -> Result<CorsLayer, SecurityError> {
    let mut layer = CorsLayer::new();

    layer = if options.allowed_origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        let origins = options
            .allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|_| SecurityError::InvalidOrigin(origin.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        layer.allow_origin(AllowOrigin::list(origins))
    };

    let methods = options
        .allowed_methods
        .iter()
        .map(|method| {
            Method::from_bytes(method.to_uppercase().as_bytes())
                .map_err(|_| SecurityError::InvalidMethod(method.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    layer = layer.allow_methods(methods);

    layer = if options.allowed_headers.is_empty() {
        if options.allow_credentials {
            layer
        } else {
            layer.allow_headers(Any)
        }
    } else {
        let headers = options
            .allowed_headers
            .iter()
            .map(|name| {
                HeaderName::from_bytes(name.as_bytes())
                    .map_err(|_| SecurityError::InvalidHeaderName(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        layer.allow_headers(headers)
    };

    if options.allow_credentials {
        if options.allowed_origins.is_empty() {
            return Err(SecurityError::CredentialsWithWildcard);
        }
        layer = layer.allow_credentials(true);
    }

    if let Some(secs) = options.max_age_secs {
        layer = layer.max_age(Duration::from_secs(secs));
    }

    Ok(layer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_toggle() {
        assert!(CorsSetting::Enabled(false).options().is_none());
        let options = CorsSetting::Enabled(true).options().unwrap();
        assert!(options.allowed_origins.is_empty());
        assert!(options.allowed_methods.contains(&"PATCH".to_string()));
    }

    #[test]
    fn test_credentials_need_origins() {
        let options = CorsOptions {
            allow_credentials: true,
            ..CorsOptions::default()
        };
        assert!(matches!(
            cors_layer(&options),
            Err(SecurityError::CredentialsWithWildcard)
        ));

        let options = CorsOptions {
            allow_credentials: true,
            allowed_origins: vec!["https://app.example.com".into()],
            ..CorsOptions::default()
        };
        assert!(cors_layer(&options).is_ok());
    }

    #[test]
    fn test_invalid_method() {
        let options = CorsOptions {
            allowed_methods: vec!["GE T".into()],
            ..CorsOptions::default()
        };
        assert!(matches!(cors_layer(&options), Err(SecurityError::InvalidMethod(_))));
    }
}
