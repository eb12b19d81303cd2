//! Credentials attached to outgoing requests.

use crate::types::{ApiKeyLocation, SecurityScheme};

/// Authentication configuration for A2A requests
#[derive(Clone)]
pub enum AuthConfig {
    /// Bearer token authentication
    Bearer(String),
    /// API key in header
    ApiKeyHeader { name: String, value: String },
    /// API key in query parameter
    ApiKeyQuery { name: String, value: String },
}

impl AuthConfig {
    /// Build credentials for the scheme an agent card declares
    ///
    /// Returns `None` for HTTP schemes other than bearer.
    pub fn from_scheme(scheme: &SecurityScheme, secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        match scheme {
            SecurityScheme::ApiKey {
                name,
                location: ApiKeyLocation::Header,
            } => Some(AuthConfig::ApiKeyHeader {
                name: name.clone(),
                value: secret,
            }),
            SecurityScheme::ApiKey {
                name,
                location: ApiKeyLocation::Query,
            } => Some(AuthConfig::ApiKeyQuery {
                name: name.clone(),
                value: secret,
            }),
            SecurityScheme::Http { scheme } if scheme.eq_ignore_ascii_case("bearer") => {
                Some(AuthConfig::Bearer(secret))
            }
            SecurityScheme::Http { .. } => None,
        }
    }

    /// Apply authentication to a request builder
    pub(crate) fn apply(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            AuthConfig::Bearer(token) => builder.bearer_auth(token),
            AuthConfig::ApiKeyHeader { name, value } => builder.header(name.as_str(), value),
            AuthConfig::ApiKeyQuery { name, value } => {
                builder.query(&[(name.as_str(), value.as_str())])
            }
        }
    }
}

// Secrets never reach logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthConfig::Bearer(_) => f.write_str("Bearer(***)"),
            AuthConfig::ApiKeyHeader { name, .. } => {
                f.debug_struct("ApiKeyHeader").field("name", name).finish()
            }
            AuthConfig::ApiKeyQuery { name, .. } => {
                f.debug_struct("ApiKeyQuery").field("name", name).finish()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_api_key_scheme() {
        let auth = AuthConfig::from_scheme(&SecurityScheme::api_key_header("X-API-Key"), "s3cret");
        assert!(matches!(
            auth,
            Some(AuthConfig::ApiKeyHeader { ref name, ref value }) if name == "X-API-Key" && value == "s3cret"
        ));
    }

    #[test]
    fn test_from_bearer_scheme() {
        let auth = AuthConfig::from_scheme(&SecurityScheme::bearer(), "tok");
        assert!(matches!(auth, Some(AuthConfig::Bearer(ref t)) if t == "tok"));

        let basic = SecurityScheme::Http {
            scheme: "basic".into(),
        };
        assert!(AuthConfig::from_scheme(&basic, "x").is_none());
    }

    #[test]
    fn test_debug_hides_secret() {
        let auth = AuthConfig::ApiKeyHeader {
            name: "X-API-Key".into(),
            value: "s3cret".into(),
        };
        let rendered = format!("{auth:?}");
        assert!(rendered.contains("X-API-Key"));
        assert!(!rendered.contains("s3cret"));
    }
}
