//! Internationalization (i18n) module.
//!
//! Everything locale-related lives here: the supported-locale catalog, URL
//! locale parsing, Accept-Language negotiation, and namespaced translation
//! loading with per-request caching.
//!
//! # Architecture
//!
//! - `catalog`: single source of truth for the supported locales + URL path
//!   parsing
//! - `locale`: validated `Locale` type constructed against the catalog
//! - `negotiator`: best-match locale selection from Accept-Language
//! - `loader`: translation resource loading (`{locale}/{namespace}.json`)
//! - `context`: per-request translation cache with `t()` lookup and lazy
//!   namespace loading
//!
//! # Example
//!
//! ```rust,ignore
//! use cv_site::i18n::{I18nContext, Locale, TranslationLoader};
//!
//! let locale = Locale::from_code("en").unwrap_or_else(Locale::default_locale);
//! let context = I18nContext::new(locale, TranslationLoader::new("locales")).await;
//! let title = context.t("meta.title");
//! ```

mod catalog;
mod context;
mod loader;
mod locale;
mod negotiator;

pub use catalog::{LocaleCatalog, LocaleConfig, LocalePath};
pub use context::{I18nContext, COMMON_NAMESPACE};
pub use loader::{I18nError, TranslationLoader, TranslationMap, TranslationValue};
pub use locale::Locale;
pub use negotiator::negotiate;
