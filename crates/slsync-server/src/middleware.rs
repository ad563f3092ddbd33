use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use slsync_core::{AppConfig, Environment};

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Shared-secret auth for the admin sync-trigger routes.
#[derive(Clone)]
pub struct AdminAuthState {
    token: Option<String>,
    pub enabled: bool,
}

impl AdminAuthState {
    /// Builds admin auth from the loaded config.
    ///
    /// In development a missing token disables auth for local iteration.
    /// In any other environment a missing token fails startup.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        match &config.admin_token {
            Some(token) if !token.trim().is_empty() => Ok(Self {
                token: Some(token.clone()),
                enabled: true,
            }),
            _ if matches!(config.env, Environment::Development) => {
                tracing::warn!(
                    "SLSYNC_ADMIN_TOKEN not set; admin routes are open in development"
                );
                Ok(Self {
                    token: None,
                    enabled: false,
                })
            }
            _ => anyhow::bail!("SLSYNC_ADMIN_TOKEN is required outside development"),
        }
    }

    fn allows(&self, presented: &str) -> bool {
        // Constant-time comparison; the token is a long-lived shared secret.
        self.token
            .as_ref()
            .is_some_and(|t| t.as_bytes().ct_eq(presented.as_bytes()).into())
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing the `x-admin-token` shared secret when enabled.
pub async fn require_admin_token(
    State(auth): State<AdminAuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    let presented = req
        .headers()
        .get("x-admin-token")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.trim().is_empty());

    match presented {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(MiddlewareErrorBody {
                error: MiddlewareError {
                    code: "unauthorized",
                    message: "missing or invalid admin token",
                },
            }),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    fn config(env: Environment, admin_token: Option<&str>) -> AppConfig {
        AppConfig {
            database_url: "postgres://example".to_string(),
            env,
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
            log_level: "info".to_string(),
            admin_token: admin_token.map(ToOwned::to_owned),
            db_max_connections: 5,
            db_min_connections: 0,
            db_acquire_timeout_secs: 5,
            selectline: slsync_core::SelectLineConfig {
                base_url: "https://erp.example.test".to_string(),
                username: "sync".to_string(),
                password: "secret".to_string(),
                app_key: String::new(),
                login_path: "api/Login".to_string(),
                groups_path: "api/ArticleGroups".to_string(),
                articles_path: "api/Articles".to_string(),
                auth_header: "Authorization".to_string(),
                auth_prefix: "LoginId ".to_string(),
                page_param: "page".to_string(),
                page_size_param: "items".to_string(),
                group_filter_param: "articleGroup".to_string(),
                page_size: 100,
                request_timeout_secs: 30,
                max_retries: 3,
                retry_backoff_ms: 1000,
            },
            enrich_max_age_days: 7,
        }
    }

    #[test]
    fn auth_disabled_without_token_in_development() {
        let state = AdminAuthState::from_config(&config(Environment::Development, None))
            .expect("dev should allow a missing token");
        assert!(!state.enabled);
    }

    #[test]
    fn auth_required_outside_development() {
        assert!(AdminAuthState::from_config(&config(Environment::Production, None)).is_err());
        assert!(AdminAuthState::from_config(&config(Environment::Production, Some("  "))).is_err());
    }

    #[test]
    fn auth_allows_exact_token_only() {
        let state = AdminAuthState::from_config(&config(Environment::Production, Some("s3cret")))
            .expect("token provided");
        assert!(state.enabled);
        assert!(state.allows("s3cret"));
        assert!(!state.allows("s3cret "));
        assert!(!state.allows("wrong"));
        assert!(!state.allows(""));
    }
}
