//! Target language catalog and selection.

use tracing::{info, warn};

use crate::api::Backend;
use crate::error::{Error, Result};

/// Shown when a filter matches nothing
pub const NO_RESULTS_LABEL: &str = "No languages found";

/// Notification raised when the catalog cannot be fetched
pub const CATALOG_FETCH_FAILED: &str =
    "Failed to fetch supported languages. Please refresh the page and try again.";

/// Language display names, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageCatalog {
    names: Vec<String>,
}

/// Outcome of filtering the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageMatches {
    Matches(Vec<String>),
    /// Explicit marker so the caller renders "no results" instead of an empty list
    NoResults,
}

impl LanguageMatches {
    pub fn names(&self) -> &[String] {
        match self {
            Self::Matches(names) => names,
            Self::NoResults => &[],
        }
    }
}

impl LanguageCatalog {
    pub const fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub const fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Case-insensitive substring match over display names.
    ///
    /// An empty query returns the whole catalog in its original order.
    pub fn filter(&self, query: &str) -> LanguageMatches {
        if query.is_empty() {
            return LanguageMatches::Matches(self.names.clone());
        }

        let needle = query.to_lowercase();
        let matches: Vec<String> = self
            .names
            .iter()
            .filter(|name| name.to_lowercase().contains(&needle))
            .cloned()
            .collect();

        if matches.is_empty() {
            LanguageMatches::NoResults
        } else {
            LanguageMatches::Matches(matches)
        }
    }

    /// Catalog spelling of `name`, compared case-insensitively
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let name = name.trim().to_lowercase();
        self.names
            .iter()
            .find(|candidate| candidate.to_lowercase() == name)
            .map(String::as_str)
    }
}

/// Catalog plus the user's current choice.
#[derive(Debug, Default)]
pub struct LanguageRegistry {
    catalog: LanguageCatalog,
    selected: Option<String>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_catalog(catalog: LanguageCatalog) -> Self {
        Self {
            catalog,
            selected: None,
        }
    }

    /// Fetch the catalog once. On failure the catalog stays empty.
    pub async fn load(&mut self, backend: &dyn Backend) -> Result<()> {
        match backend.languages().await {
            Ok(names) => {
                info!("Loaded {} target languages", names.len());
                self.catalog = LanguageCatalog::new(names);
                Ok(())
            }
            Err(e) => {
                warn!("Error fetching languages: {}", e);
                self.catalog = LanguageCatalog::default();
                Err(e)
            }
        }
    }

    pub const fn catalog(&self) -> &LanguageCatalog {
        &self.catalog
    }

    /// Selection UI is usable only once languages are known
    pub const fn is_enabled(&self) -> bool {
        !self.catalog.is_empty()
    }

    pub fn filter(&self, query: &str) -> LanguageMatches {
        self.catalog.filter(query)
    }

    /// Choose a target language. Returns the catalog spelling.
    pub fn select(&mut self, name: &str) -> Result<&str> {
        let resolved = self
            .catalog
            .resolve(name)
            .ok_or_else(|| Error::InvalidInput(format!("Unsupported language: {name}")))?
            .to_string();

        Ok(self.selected.insert(resolved).as_str())
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }
}
