//! Actor role resolution from the `Authorization: Bearer` header.

use annonces_shared::Role;
use axum::http::HeaderMap;
use subtle::ConstantTimeEq;

use crate::config::ServerConfig;
use crate::error::ApiError;

/// Role of the caller.  No header means a guest; a token matching neither
/// configured secret means an unauthenticated caller.
pub fn resolve_role(headers: &HeaderMap, config: &ServerConfig) -> Role {
    let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) else {
        return Role::Guest;
    };
    let token = auth.strip_prefix("Bearer ").unwrap_or(auth).trim();

    if token_matches(token, config.admin_token.as_deref()) {
        Role::Admin
    } else if token_matches(token, config.analyst_token.as_deref()) {
        Role::Analyst
    } else {
        Role::Unauthenticated
    }
}

pub fn require_admin(headers: &HeaderMap, config: &ServerConfig) -> Result<Role, ApiError> {
    if config.admin_token.is_none() {
        return Err(ApiError::Forbidden(
            "Admin API is disabled (no ADMIN_TOKEN configured)".into(),
        ));
    }
    let role = resolve_role(headers, config);
    if !role.can_manage_listings() {
        return Err(ApiError::Forbidden("Invalid admin token".into()));
    }
    Ok(role)
}

pub fn require_analytics(headers: &HeaderMap, config: &ServerConfig) -> Result<Role, ApiError> {
    let role = resolve_role(headers, config);
    if !role.can_view_analytics() {
        return Err(ApiError::Forbidden("Analytics require an admin or analyst token".into()));
    }
    Ok(role)
}

/// Constant-time comparison against a configured token.
fn token_matches(token: &str, expected: Option<&str>) -> bool {
    let Some(expected) = expected else {
        return false;
    };
    let token_bytes = token.as_bytes();
    let expected_bytes = expected.as_bytes();
    token_bytes.len() == expected_bytes.len() && token_bytes.ct_eq(expected_bytes).unwrap_u8() == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config() -> ServerConfig {
        ServerConfig {
            admin_token: Some("admin-secret".into()),
            analyst_token: Some("analyst-secret".into()),
            ..Default::default()
        }
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn roles_from_tokens() {
        let config = config();
        assert_eq!(resolve_role(&HeaderMap::new(), &config), Role::Guest);
        assert_eq!(resolve_role(&bearer("admin-secret"), &config), Role::Admin);
        assert_eq!(resolve_role(&bearer("analyst-secret"), &config), Role::Analyst);
        assert_eq!(resolve_role(&bearer("admin-secreT"), &config), Role::Unauthenticated);
    }

    #[test]
    fn analyst_cannot_manage_listings() {
        let config = config();
        assert!(require_admin(&bearer("analyst-secret"), &config).is_err());
        assert!(require_analytics(&bearer("analyst-secret"), &config).is_ok());
        assert!(require_analytics(&HeaderMap::new(), &config).is_err());
    }

    #[test]
    fn admin_disabled_without_token() {
        let config = ServerConfig::default();
        assert!(matches!(
            require_admin(&bearer(""), &config),
            Err(ApiError::Forbidden(_))
        ));
    }
}
