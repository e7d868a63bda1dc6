//! Caller identity from the authenticating proxy.
//!
//! The proxy in front of the service signs users in and forwards the user id
//! in `auth.identity_header`. The header is only honored when the connecting
//! peer is a trusted proxy (see `server.trusted_proxies`); without that
//! section every peer is trusted, which config validation restricts to
//! loopback binds.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use ipnet::IpNet;
use uuid::Uuid;

use crate::{
    AppState,
    config::{AuthConfig, TrustedProxiesConfig},
    routes::error::ApiError,
};

/// The authenticated caller. Extracting it rejects the request with 401 when
/// no valid identity is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: Uuid,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("Missing identity header")]
    Missing,
    #[error("Identity header is not a valid user id")]
    Invalid,
    #[error("Identity header from an untrusted source")]
    UntrustedSource,
}

impl FromRequestParts<AppState> for UserIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let connecting_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        resolve_identity(
            &parts.headers,
            connecting_ip,
            &state.config.auth,
            &state.config.server.trusted_proxies,
            &state.trusted_cidrs,
        )
        .map(|user_id| UserIdentity { user_id })
        .map_err(|e| {
            tracing::debug!(error = %e, ?connecting_ip, "Rejected request identity");
            ApiError::Unauthorized(e.to_string())
        })
    }
}

/// Read the user id from `headers`, checking the peer first.
pub fn resolve_identity(
    headers: &HeaderMap,
    connecting_ip: Option<IpAddr>,
    auth: &AuthConfig,
    trusted_proxies: &TrustedProxiesConfig,
    trusted_cidrs: &[IpNet],
) -> Result<Uuid, IdentityError> {
    if trusted_proxies.is_configured() {
        let trusted = match connecting_ip {
            Some(ip) => trusted_proxies.is_trusted_ip(ip, trusted_cidrs),
            None => trusted_proxies.dangerously_trust_all,
        };
        if !trusted {
            if headers.contains_key(auth.identity_header.as_str()) {
                tracing::warn!(
                    connecting_ip = ?connecting_ip,
                    identity_header = %auth.identity_header,
                    "Ignoring identity header from untrusted peer"
                );
            }
            return Err(IdentityError::UntrustedSource);
        }
    }

    let value = headers
        .get(auth.identity_header.as_str())
        .ok_or(IdentityError::Missing)?;
    let value = value.to_str().map_err(|_| IdentityError::Invalid)?;

    Uuid::parse_str(value.trim()).map_err(|_| IdentityError::Invalid)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    const USER: &str = "6f1c3d4e-8a2b-4c5d-9e0f-1a2b3c4d5e6f";

    fn headers(value: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(value) = value {
            map.insert("x-user-id", HeaderValue::from_str(value).unwrap());
        }
        map
    }

    fn proxies(cidrs: &[&str]) -> TrustedProxiesConfig {
        TrustedProxiesConfig {
            dangerously_trust_all: false,
            cidrs: cidrs.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_no_proxy_config_trusts_header() {
        let result = resolve_identity(
            &headers(Some(USER)),
            None,
            &AuthConfig::default(),
            &TrustedProxiesConfig::default(),
            &[],
        );
        assert_eq!(result, Ok(Uuid::parse_str(USER).unwrap()));
    }

    #[test]
    fn test_missing_and_invalid_header() {
        let auth = AuthConfig::default();
        let none = TrustedProxiesConfig::default();

        assert_eq!(
            resolve_identity(&headers(None), None, &auth, &none, &[]),
            Err(IdentityError::Missing)
        );
        assert_eq!(
            resolve_identity(&headers(Some("alice")), None, &auth, &none, &[]),
            Err(IdentityError::Invalid)
        );
    }

    #[test]
    fn test_trusted_proxy_cidr() {
        let config = proxies(&["10.0.0.0/8"]);
        let cidrs = config.parsed_cidrs();
        let auth = AuthConfig::default();

        let from_proxy = resolve_identity(
            &headers(Some(USER)),
            Some("10.1.2.3".parse().unwrap()),
            &auth,
            &config,
            &cidrs,
        );
        assert!(from_proxy.is_ok());

        let direct = resolve_identity(
            &headers(Some(USER)),
            Some("203.0.113.7".parse().unwrap()),
            &auth,
            &config,
            &cidrs,
        );
        assert_eq!(direct, Err(IdentityError::UntrustedSource));

        // No peer address and no trust-all: refuse.
        let unknown = resolve_identity(&headers(Some(USER)), None, &auth, &config, &cidrs);
        assert_eq!(unknown, Err(IdentityError::UntrustedSource));
    }

    #[test]
    fn test_custom_header_name() {
        let auth = AuthConfig {
            identity_header: "X-Authenticated-User".to_string(),
        };
        let mut map = HeaderMap::new();
        map.insert("x-authenticated-user", HeaderValue::from_static(USER));

        let result = resolve_identity(&map, None, &auth, &TrustedProxiesConfig::default(), &[]);
        assert!(result.is_ok());

        // The default header is not consulted.
        let result = resolve_identity(
            &headers(Some(USER)),
            None,
            &auth,
            &TrustedProxiesConfig::default(),
            &[],
        );
        assert_eq!(result, Err(IdentityError::Missing));
    }
}
