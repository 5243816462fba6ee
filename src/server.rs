//! Application state, router assembly, and the locale-scoped page
//! handlers.
//!
//! Page endpoints return the localized payloads an external rendering
//! layer consumes: resolved metadata, the translation bundles loaded for
//! the page, and (for CV pages) the CV document itself. The routing gate
//! guarantees these handlers only ever see locale-prefixed paths from
//! browsers; direct hits with an unsupported segment get a 404.

use crate::analytics;
use crate::auth::{self, SessionStore};
use crate::config::Config;
use crate::cv::{CvData, CvStore};
use crate::db::Database;
use crate::i18n::{I18nContext, Locale, TranslationLoader, TranslationMap};
use crate::routing;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub cv: Arc<CvStore>,
    pub loader: TranslationLoader,
    pub http: reqwest::Client,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config, db: Database, cv: CvStore) -> Self {
        Self {
            loader: TranslationLoader::new(&config.locales_dir),
            config: Arc::new(config),
            db,
            cv: Arc::new(cv),
            http: reqwest::Client::new(),
            sessions: SessionStore::new(),
        }
    }
}

/// Resolved document metadata for a page.
#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
}

/// Payload for the CV page and its print variant.
#[derive(Debug, Serialize)]
pub struct CvPage {
    pub locale: &'static str,
    pub meta: PageMeta,
    pub translations: HashMap<String, TranslationMap>,
    pub cv: CvData,
}

/// Payload for the dashboard page shell (stats come separately, after
/// login, from `/api/analytics/stats`).
#[derive(Debug, Serialize)]
pub struct DashboardPage {
    pub locale: &'static str,
    pub meta: PageMeta,
    pub translations: HashMap<String, TranslationMap>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/:lang", get(cv_page))
        // The root path redirects to "/{locale}/", so the trailing-slash
        // form must resolve to the same page.
        .route("/:lang/", get(cv_page))
        .route("/:lang/print", get(print_page))
        .route("/:lang/dashboard", get(dashboard_page))
        .route("/api/track", post(analytics::track_visit))
        .route("/api/qr-scan", post(analytics::track_qr_scan))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/analytics/stats", get(analytics::stats))
        .layer(middleware::from_fn(routing::locale_redirect))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Response {
    Json(json!({"status": "ok"})).into_response()
}

/// `GET /:lang` - the localized CV page.
async fn cv_page(State(state): State<AppState>, Path(lang): Path<String>) -> Response {
    let Some(locale) = Locale::from_code(&lang) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let i18n = I18nContext::new(locale, state.loader.clone()).await;
    let payload = CvPage {
        locale: locale.code(),
        meta: PageMeta {
            title: i18n.t("meta.title"),
            description: i18n.t("meta.description"),
        },
        translations: translation_bundle(&i18n),
        cv: (*state.cv.get(locale)).clone(),
    };

    Json(payload).into_response()
}

/// `GET /:lang/print` - the CV payload for the print/PDF export view.
async fn print_page(State(state): State<AppState>, Path(lang): Path<String>) -> Response {
    let Some(locale) = Locale::from_code(&lang) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let i18n = I18nContext::new(locale, state.loader.clone()).await;
    let payload = CvPage {
        locale: locale.code(),
        meta: PageMeta {
            title: i18n.t("print.title"),
            description: i18n.t("meta.description"),
        },
        translations: translation_bundle(&i18n),
        cv: (*state.cv.get(locale)).clone(),
    };

    Json(payload).into_response()
}

/// `GET /:lang/dashboard` - the dashboard shell; pulls in the lazily
/// loaded `dashboard` namespace on top of `common`.
async fn dashboard_page(State(state): State<AppState>, Path(lang): Path<String>) -> Response {
    let Some(locale) = Locale::from_code(&lang) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let i18n = I18nContext::new(locale, state.loader.clone()).await;
    i18n.load_namespaces(&["dashboard"]).await;

    let payload = DashboardPage {
        locale: locale.code(),
        meta: PageMeta {
            title: i18n.t_ns("dashboard", "title"),
            description: i18n.t_ns("dashboard", "description"),
        },
        translations: translation_bundle(&i18n),
    };

    Json(payload).into_response()
}

/// The context's loaded namespaces, detached from the cache for the
/// response body (mirrors how the layout seeds the client-side provider).
fn translation_bundle(i18n: &I18nContext) -> HashMap<String, TranslationMap> {
    i18n.translations()
        .into_iter()
        .map(|(namespace, map)| (namespace, (*map).clone()))
        .collect()
}
