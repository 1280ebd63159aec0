//! Security response headers.
//!
//! # Responsibilities
//! - Describe the header set added when `helmet` is enabled
//! - Validate header values before they reach the middleware stack
//!
//! Headers are only added when the handler did not set them itself. An empty
//! value switches a header off.

use axum::http::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::security::SecurityError;

/// `helmet` config entry: a toggle or per-header values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum HelmetSetting {
    Enabled(bool),
    Options(SecurityHeaders),
}

impl Default for HelmetSetting {
    fn default() -> Self {
        HelmetSetting::Enabled(false)
    }
}

impl HelmetSetting {
    pub fn options(&self) -> Option<SecurityHeaders> {
        match self {
            HelmetSetting::Enabled(false) => None,
            HelmetSetting::Enabled(true) => Some(SecurityHeaders::default()),
            HelmetSetting::Options(headers) => Some(headers.clone()),
        }
    }
}

/// Header values. Defaults match the usual hardened baseline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityHeaders {
    pub content_security_policy: String,
    pub cross_origin_opener_policy: String,
    pub cross_origin_resource_policy: String,
    pub origin_agent_cluster: String,
    pub referrer_policy: String,
    pub strict_transport_security: String,
    pub x_content_type_options: String,
    pub x_dns_prefetch_control: String,
    pub x_download_options: String,
    pub x_frame_options: String,
    pub x_permitted_cross_domain_policies: String,
    pub x_xss_protection: String,
}

impl Default for SecurityHeaders {
    fn default() -> Self {
        Self {
            content_security_policy: [
                "default-src 'self'",
                "base-uri 'self'",
                "font-src 'self' https: data:",
                "form-action 'self'",
                "frame-ancestors 'self'",
                "img-src 'self' data:",
                "object-src 'none'",
                "script-src 'self'",
                "script-src-attr 'none'",
                "style-src 'self' https: 'unsafe-inline'",
                "upgrade-insecure-requests",
            ]
            .join(";"),
            cross_origin_opener_policy: "same-origin".into(),
            cross_origin_resource_policy: "same-origin".into(),
            origin_agent_cluster: "?1".into(),
            referrer_policy: "no-referrer".into(),
            strict_transport_security: "max-age=15552000; includeSubDomains".into(),
            x_content_type_options: "nosniff".into(),
            x_dns_prefetch_control: "off".into(),
            x_download_options: "noopen".into(),
            x_frame_options: "SAMEORIGIN".into(),
            x_permitted_cross_domain_policies: "none".into(),
            x_xss_protection: "0".into(),
        }
    }
}

impl SecurityHeaders {
    /// Validated `(name, value)` pairs, skipping disabled entries.
    pub fn to_header_pairs(&self) -> Result<Vec<(HeaderName, HeaderValue)>, SecurityError> {
        let entries = [
            ("content-security-policy", &self.content_security_policy),
            ("cross-origin-opener-policy", &self.cross_origin_opener_policy),
            ("cross-origin-resource-policy", &self.cross_origin_resource_policy),
            ("origin-agent-cluster", &self.origin_agent_cluster),
            ("referrer-policy", &self.referrer_policy),
            ("strict-transport-security", &self.strict_transport_security),
            ("x-content-type-options", &self.x_content_type_options),
            ("x-dns-prefetch-control", &self.x_dns_prefetch_control),
            ("x-download-options", &self.x_download_options),
            ("x-frame-options", &self.x_frame_options),
            ("x-permitted-cross-domain-policies", &self.x_permitted_cross_domain_policies),
            ("x-xss-protection", &self.x_xss_protection),
        ];

        entries
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| {
                let value = HeaderValue::from_str(value).map_err(|_| SecurityError::InvalidHeaderValue {
                    header: name.to_string(),
                    value: value.clone(),
                })?;
                Ok((HeaderName::from_static(name), value))
            })
            .collect()
    }
}
