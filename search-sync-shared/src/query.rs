//! Entries query configuration.
//!
//! The entries query shapes how a type's entries are read from the store and
//! which of them are eligible for indexing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Locale value that disables locale filtering.
pub const ALL_LOCALES: &str = "all";

/// Which publication states are indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationState {
    /// Only published entries.
    Live,
    /// Published entries and drafts.
    Preview,
}

/// Query rules applied when fetching and filtering a type's entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntriesQuery {
    /// Publication state to index. Unset behaves like `live`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_state: Option<PublicationState>,
    /// Locale to index. Unset or `all` indexes every locale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// Other store query parameters (fields, populate, ...), passed through.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntriesQuery {
    /// Set the publication state.
    pub fn with_publication_state(mut self, state: PublicationState) -> Self {
        self.publication_state = Some(state);
        self
    }

    /// Set the locale.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Whether drafts are indexed too.
    pub fn is_preview(&self) -> bool {
        self.publication_state == Some(PublicationState::Preview)
    }

    /// The locale entries must have, or `None` when every locale is kept.
    pub fn locale_filter(&self) -> Option<&str> {
        match self.locale.as_deref() {
            None | Some("") | Some(ALL_LOCALES) => None,
            Some(locale) => Some(locale),
        }
    }
}
