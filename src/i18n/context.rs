//! Per-request translation state.
//!
//! An `I18nContext` is created for one locale-scoped page render, seeded
//! with the `common` namespace, and grows as the page requests more
//! namespaces. It is passed explicitly to whatever needs it (there is no
//! ambient global) and is dropped with the request.

use crate::i18n::{I18nError, Locale, TranslationLoader, TranslationMap};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// The namespace every context loads eagerly on construction.
pub const COMMON_NAMESPACE: &str = "common";

type NamespaceCell = Arc<OnceCell<Arc<TranslationMap>>>;

/// Locale plus the namespace translations loaded so far.
pub struct I18nContext {
    locale: Locale,
    loader: TranslationLoader,
    /// One cell per namespace. The cell is the single-flight guard: however
    /// many callers ask for a namespace concurrently, exactly one load runs
    /// and the rest await its result.
    namespaces: Mutex<HashMap<String, NamespaceCell>>,
}

impl I18nContext {
    /// Create a context for `locale` with the `common` namespace loaded.
    pub async fn new(locale: Locale, loader: TranslationLoader) -> Self {
        let context = Self {
            locale,
            loader,
            namespaces: Mutex::new(HashMap::new()),
        };
        context.load_namespaces(&[COMMON_NAMESPACE]).await;
        context
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Translate a dotted key from the `common` namespace.
    pub fn t(&self, key: &str) -> String {
        self.t_ns(COMMON_NAMESPACE, key)
    }

    /// Translate a dotted key from the given namespace.
    ///
    /// A key that does not resolve (unknown namespace, unloaded namespace,
    /// missing segment, or a type mismatch along the path) comes back as the
    /// key itself so the page renders degraded instead of failing.
    pub fn t_ns(&self, namespace: &str, key: &str) -> String {
        let cell = self
            .namespaces
            .lock()
            .unwrap()
            .get(namespace)
            .cloned();
        let loaded = cell.as_ref().and_then(|cell| cell.get());

        match loaded.and_then(|map| map.lookup(key)) {
            Some(text) => text.to_string(),
            None => {
                warn!("translation key not found: {namespace}:{key}");
                key.to_string()
            }
        }
    }

    /// Ensure the given namespaces are loaded for this context's locale.
    ///
    /// Namespaces already loaded (or loading) are not fetched again; new
    /// ones load concurrently. Load failures are cached as empty maps, so a
    /// broken resource is fetched at most once and every lookup against it
    /// falls back to raw keys.
    pub async fn load_namespaces(&self, namespaces: &[&str]) {
        let cells: Vec<(String, NamespaceCell)> = {
            let mut cache = self.namespaces.lock().unwrap();
            namespaces
                .iter()
                .map(|namespace| {
                    let cell = cache
                        .entry(namespace.to_string())
                        .or_insert_with(|| Arc::new(OnceCell::new()))
                        .clone();
                    (namespace.to_string(), cell)
                })
                .collect()
        };

        let loads = cells.into_iter().map(|(namespace, cell)| async move {
            cell.get_or_init(|| self.fetch_namespace(namespace)).await;
        });
        futures::future::join_all(loads).await;
    }

    /// All namespaces loaded so far, for embedding into a page payload.
    pub fn translations(&self) -> HashMap<String, Arc<TranslationMap>> {
        self.namespaces
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(namespace, cell)| {
                cell.get().map(|map| (namespace.clone(), Arc::clone(map)))
            })
            .collect()
    }

    async fn fetch_namespace(&self, namespace: String) -> Arc<TranslationMap> {
        match self.loader.load(self.locale, &namespace).await {
            Ok(map) => {
                debug!("loaded translations for {}:{namespace}", self.locale);
                Arc::new(map)
            }
            Err(I18nError::ResourceNotFound { .. }) => {
                warn!(
                    "no translation resource for {}:{namespace}, serving raw keys",
                    self.locale
                );
                Arc::new(TranslationMap::default())
            }
            Err(error) => {
                warn!(
                    "failed to load translations for {}:{namespace}: {error}, serving raw keys",
                    self.locale
                );
                Arc::new(TranslationMap::default())
            }
        }
    }
}
