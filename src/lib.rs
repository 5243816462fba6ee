//! Localized personal CV/portfolio site.
//!
//! An axum service that guarantees locale-prefixed page URLs (redirecting
//! from the Accept-Language header when the prefix is missing), serves
//! localized page payloads backed by namespaced JSON translations, records
//! visit/QR-scan analytics in SQLite, and exposes an authenticated stats
//! API for the operator dashboard.

pub mod analytics;
pub mod auth;
pub mod config;
pub mod cv;
pub mod db;
pub mod i18n;
pub mod retry;
pub mod routing;
pub mod security;
pub mod server;
