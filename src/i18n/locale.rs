//! Locale type: validated language representation.
//!
//! A `Locale` can only be constructed for codes present in the catalog, so
//! every value floating through the application is known-supported.

use crate::i18n::{LocaleCatalog, LocaleConfig};
use std::fmt;

/// A validated locale.
///
/// Copyable handle onto the catalog entry for one supported language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Locale {
    /// ISO 639-1 language code (e.g., "es", "en")
    code: &'static str,
}

impl Locale {
    /// Spanish, the site's default language.
    pub const SPANISH: Locale = Locale { code: "es" };

    /// English.
    pub const ENGLISH: Locale = Locale { code: "en" };

    /// Create a Locale from a language code string.
    ///
    /// Returns `None` for anything outside the supported set. An unrecognized
    /// code is not an error condition anywhere in the application; callers
    /// treat it as "no locale present".
    pub fn from_code(code: &str) -> Option<Locale> {
        LocaleCatalog::get()
            .get_by_code(code)
            .map(|config| Locale { code: config.code })
    }

    /// Get the default locale (the one redirects fall back to).
    pub fn default_locale() -> Locale {
        let config = LocaleCatalog::get().default_locale();
        Locale { code: config.code }
    }

    /// Get the ISO 639-1 language code.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Get the full catalog entry for this locale.
    ///
    /// # Panics
    /// Panics if the code is not in the catalog, which cannot happen for a
    /// `Locale` constructed through `from_code` or the constants.
    pub fn config(&self) -> &'static LocaleConfig {
        LocaleCatalog::get()
            .get_by_code(self.code)
            .expect("locale code should always be in the catalog")
    }

    /// English name of the language (e.g., "Spanish").
    pub fn name(&self) -> &'static str {
        self.config().name
    }

    /// Native name of the language (e.g., "Español").
    pub fn native_name(&self) -> &'static str {
        self.config().native_name
    }

    /// Whether this is the default locale.
    pub fn is_default(&self) -> bool {
        self.config().is_default
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}
