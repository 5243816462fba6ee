//! Locale routing gate.
//!
//! Runs on every request and guarantees that every page URL carries a
//! supported locale prefix. API routes, the health endpoint, and static
//! files pass through untouched; everything else either already has a
//! locale segment or gets redirected to the negotiated one.

use crate::i18n::{negotiate, Locale, LocaleCatalog};
use axum::{
    extract::Request,
    http::header::ACCEPT_LANGUAGE,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

static EXCLUDED_PATHS: OnceLock<Regex> = OnceLock::new();

/// Paths the gate never touches: the API surface, the health endpoint,
/// static asset trees, and anything with a file extension.
fn excluded_paths() -> &'static Regex {
    EXCLUDED_PATHS.get_or_init(|| {
        Regex::new(r"^/api(/|$)|^/health$|/static/|\.").expect("exclusion pattern should compile")
    })
}

pub fn is_excluded_path(path: &str) -> bool {
    excluded_paths().is_match(path)
}

/// Redirect target for a path with no locale prefix, picked from the
/// request's Accept-Language header. Negotiation can only narrow to a
/// supported locale; with no usable header the default wins.
fn redirect_target(path: &str, accept_language: &str) -> String {
    let locale = negotiate(
        accept_language,
        &LocaleCatalog::get().locales(),
        Locale::default_locale(),
    );
    format!("/{locale}{path}")
}

/// The gate itself. Stateless across requests; the redirect is its only
/// observable effect.
pub async fn locale_redirect(request: Request, next: Next) -> Response {
    let path = request.uri().path();

    if is_excluded_path(path) {
        return next.run(request).await;
    }

    if LocaleCatalog::get().parse_path(path).locale.is_some() {
        return next.run(request).await;
    }

    let accept_language = request
        .headers()
        .get(ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let target = redirect_target(path, accept_language);
    debug!("redirecting {path} -> {target}");

    Redirect::temporary(&target).into_response()
}
