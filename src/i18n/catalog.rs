//! Locale catalog: single source of truth for the supported locales.
//!
//! The catalog is a fixed, closed set; URLs, negotiation, and translation
//! loading all validate against it. It also owns the URL helper that splits
//! a request path into an optional locale prefix and the remaining path.

use crate::i18n::Locale;
use std::sync::OnceLock;

/// Configuration for one supported locale.
#[derive(Debug, Clone)]
pub struct LocaleConfig {
    /// ISO 639-1 language code (e.g., "es", "en")
    pub code: &'static str,

    /// English name of the language (e.g., "Spanish")
    pub name: &'static str,

    /// Native name of the language (e.g., "Español")
    pub native_name: &'static str,

    /// Whether this is the default locale (exactly one should be true)
    pub is_default: bool,
}

/// A request path split into its locale prefix and the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalePath {
    /// The locale named by the first path segment, if it is supported.
    pub locale: Option<Locale>,

    /// The path with the locale segment stripped (never empty; stripping
    /// the whole path yields "/"). Unchanged when no locale was found.
    pub remainder: String,
}

/// Catalog of all supported locales.
pub struct LocaleCatalog {
    locales: Vec<LocaleConfig>,
}

/// Global catalog instance (initialized lazily)
static CATALOG: OnceLock<LocaleCatalog> = OnceLock::new();

impl LocaleCatalog {
    /// Get the global locale catalog instance.
    pub fn get() -> &'static LocaleCatalog {
        CATALOG.get_or_init(|| LocaleCatalog {
            locales: default_locales(),
        })
    }

    /// Look up a locale configuration by its code.
    pub fn get_by_code(&self, code: &str) -> Option<&LocaleConfig> {
        self.locales.iter().find(|locale| locale.code == code)
    }

    /// Membership test against the supported set.
    pub fn is_supported(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }

    /// All supported locales, default first.
    pub fn locales(&self) -> Vec<Locale> {
        self.locales
            .iter()
            .filter_map(|config| Locale::from_code(config.code))
            .collect()
    }

    /// The default locale configuration.
    ///
    /// # Panics
    /// Panics if the catalog defines no default or more than one default;
    /// both indicate a configuration error.
    pub fn default_locale(&self) -> &LocaleConfig {
        let defaults: Vec<_> = self
            .locales
            .iter()
            .filter(|locale| locale.is_default)
            .collect();

        match defaults.len() {
            0 => panic!("no default locale in catalog"),
            1 => defaults[0],
            _ => panic!("multiple default locales in catalog"),
        }
    }

    /// Split a request path into its locale prefix and the remaining path.
    ///
    /// The first `/`-delimited segment is checked against the supported set.
    /// If it matches, the segment is stripped and what is left (at least
    /// "/") is the remainder; otherwise the path comes back unchanged with
    /// no locale. Unrecognized segments are not errors.
    pub fn parse_path(&self, path: &str) -> LocalePath {
        let Some(rest) = path.strip_prefix('/') else {
            return LocalePath {
                locale: None,
                remainder: path.to_string(),
            };
        };

        let (first, tail) = match rest.split_once('/') {
            Some((first, tail)) => (first, Some(tail)),
            None => (rest, None),
        };

        match Locale::from_code(first) {
            Some(locale) => {
                let remainder = match tail {
                    Some(tail) if !tail.is_empty() => format!("/{tail}"),
                    _ => "/".to_string(),
                };
                LocalePath {
                    locale: Some(locale),
                    remainder,
                }
            }
            None => LocalePath {
                locale: None,
                remainder: path.to_string(),
            },
        }
    }
}

/// The supported locales. Spanish is the site's default.
fn default_locales() -> Vec<LocaleConfig> {
    vec![
        LocaleConfig {
            code: "es",
            name: "Spanish",
            native_name: "Español",
            is_default: true,
        },
        LocaleConfig {
            code: "en",
            name: "English",
            native_name: "English",
            is_default: false,
        },
    ]
}
