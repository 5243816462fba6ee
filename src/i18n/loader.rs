//! Translation resources: the nested key→string map for one
//! (locale, namespace) pair, and the async loader that reads it from disk.

use crate::i18n::Locale;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving translation resources.
///
/// All of these are recovered close to where they occur: a missing or
/// broken resource degrades the page to raw translation keys, it never
/// fails a request.
#[derive(Debug, Error)]
pub enum I18nError {
    #[error("no translation resource for {locale}/{namespace}")]
    ResourceNotFound { locale: Locale, namespace: String },

    #[error("failed to read translation resource {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid translation resource {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A value inside a translation resource: either a leaf string or a nested
/// section. Anything else in the JSON (numbers, arrays, ...) fails to
/// deserialize, which keeps the resource format strict.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranslationValue {
    Text(String),
    Section(HashMap<String, TranslationValue>),
}

/// The translations for one (locale, namespace) pair.
///
/// Immutable once loaded; shared by reference between the cache and page
/// payloads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationMap {
    entries: HashMap<String, TranslationValue>,
}

impl TranslationMap {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a dotted key path (`contact.form.email`) to its leaf string.
    ///
    /// Every intermediate segment must name a section and the final segment
    /// must name a leaf. A missing key, or a section where a leaf is
    /// expected (and vice versa), resolves to `None`.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        let mut current = &self.entries;
        let mut segments = key.split('.').peekable();

        while let Some(segment) = segments.next() {
            match current.get(segment)? {
                TranslationValue::Text(text) => {
                    return if segments.peek().is_none() {
                        Some(text)
                    } else {
                        None
                    };
                }
                TranslationValue::Section(section) => {
                    segments.peek()?;
                    current = section;
                }
            }
        }

        None
    }

    #[cfg(test)]
    pub fn from_json(raw: &str) -> Self {
        serde_json::from_str(raw).expect("test translation JSON should parse")
    }
}

/// Loads translation resources from `{root}/{locale}/{namespace}.json`.
///
/// The loader owns no mutable state, so it is safe to call concurrently for
/// any mix of locales and namespaces. Caching happens in the per-request
/// context, not here.
#[derive(Debug, Clone)]
pub struct TranslationLoader {
    root: PathBuf,
}

impl TranslationLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Fetch the resource for a (locale, namespace) pair.
    ///
    /// A missing file maps to `I18nError::ResourceNotFound`; callers treat
    /// that as an empty map rather than a failure.
    pub async fn load(
        &self,
        locale: Locale,
        namespace: &str,
    ) -> Result<TranslationMap, I18nError> {
        let path = self
            .root
            .join(locale.code())
            .join(format!("{namespace}.json"));

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(source) if source.kind() == ErrorKind::NotFound => {
                return Err(I18nError::ResourceNotFound {
                    locale,
                    namespace: namespace.to_string(),
                });
            }
            Err(source) => {
                return Err(I18nError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };

        serde_json::from_str(&raw).map_err(|source| I18nError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}
