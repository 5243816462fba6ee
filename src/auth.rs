//! Dashboard authentication.
//!
//! Single-operator model: one email/password pair from configuration.
//! Login issues an opaque bearer token kept in an in-memory session set;
//! restarting the server logs the operator out, which is acceptable here.

use crate::security::constant_time_compare;
use crate::server::AppState;
use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

/// Active dashboard session tokens.
#[derive(Clone, Default)]
pub struct SessionStore {
    tokens: Arc<Mutex<HashSet<String>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh session token.
    pub fn issue(&self) -> String {
        let token = Uuid::new_v4().to_string();
        self.tokens.lock().unwrap().insert(token.clone());
        token
    }

    /// Check a presented token against the active sessions. The comparison
    /// is constant-time per stored token.
    pub fn is_valid(&self, token: &str) -> bool {
        self.tokens
            .lock()
            .unwrap()
            .iter()
            .any(|stored| constant_time_compare(stored, token))
    }

    /// Drop a session. Returns whether it existed.
    pub fn revoke(&self, token: &str) -> bool {
        self.tokens.lock().unwrap().remove(token)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Response {
    let email_ok = constant_time_compare(&request.email, &state.config.dashboard_email);
    let password_ok = constant_time_compare(&request.password, &state.config.dashboard_password);

    if email_ok && password_ok {
        info!("Dashboard login");
        let access_token = state.sessions.issue();
        Json(LoginResponse { access_token }).into_response()
    } else {
        warn!("Rejected dashboard login for {}", request.email);
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid credentials"})),
        )
            .into_response()
    }
}

/// `POST /api/auth/logout`
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match bearer_token(&headers) {
        Some(token) if state.sessions.revoke(token) => {
            Json(json!({"success": true})).into_response()
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Authentication required"})),
        )
            .into_response(),
    }
}

/// Whether the request carries a valid dashboard session.
pub fn authorize(headers: &HeaderMap, sessions: &SessionStore) -> bool {
    bearer_token(headers)
        .map(|token| sessions.is_valid(token))
        .unwrap_or(false)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_validate_token() {
        let sessions = SessionStore::new();
        let token = sessions.issue();
        assert!(sessions.is_valid(&token));
        assert!(!sessions.is_valid("not-a-token"));
    }

    #[test]
    fn test_tokens_are_unique() {
        let sessions = SessionStore::new();
        assert_ne!(sessions.issue(), sessions.issue());
    }

    #[test]
    fn test_revoke_token() {
        let sessions = SessionStore::new();
        let token = sessions.issue();
        assert!(sessions.revoke(&token));
        assert!(!sessions.is_valid(&token));
        assert!(!sessions.revoke(&token));
    }

    #[test]
    fn test_authorize_requires_bearer_scheme() {
        let sessions = SessionStore::new();
        let token = sessions.issue();

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
        assert!(authorize(&headers, &sessions));

        let mut bare = HeaderMap::new();
        bare.insert(AUTHORIZATION, token.parse().unwrap());
        assert!(!authorize(&bare, &sessions));

        assert!(!authorize(&HeaderMap::new(), &sessions));
    }
}
