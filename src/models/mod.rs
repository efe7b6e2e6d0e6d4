use serde::{Deserialize, Serialize};

/// A single classified ad found on a search result page
///
/// Only `id` and `url` are guaranteed to be non-empty; the remaining fields
/// fall back to an empty string when the listing does not carry them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdRecord {
    pub id: String,
    pub url: String,
    pub title: String,
    /// Price text without currency symbol, "VB" marker or thousands separators
    pub price: String,
    pub description: String,
}
