//! Response shapes validated at the API boundary.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// A list-returning endpoint's body, classified by shape.
///
/// The storefront API is inconsistent about where it puts collections:
/// some endpoints answer `{"plans": [...]}`, some `{"data": [...]}`, some a
/// bare array. Classifying once here keeps call sites from probing ad hoc.
#[derive(Debug, Clone, PartialEq)]
pub enum ListResponse<T> {
    /// Items found under the named key (`"plans"`, `"usage"`, `"data"`, ...).
    Keyed { key: String, items: Vec<T> },
    /// The body itself was an array.
    Bare(Vec<T>),
    /// No recognised collection; the raw body is kept for diagnostics.
    Unknown(Value),
}

impl<T: DeserializeOwned> ListResponse<T> {
    /// Classify `body`, looking for an array under each of `keys` in order,
    /// then under `"data"`, then at the top level.
    ///
    /// An array whose elements fail to deserialize as `T` is treated as
    /// `Unknown` rather than an error.
    #[must_use]
    pub fn classify(body: Value, keys: &[&str]) -> Self {
        let candidates = keys.iter().copied().chain(std::iter::once("data"));
        for key in candidates {
            if let Some(arr) = body.get(key).filter(|v| v.is_array()) {
                if let Ok(items) = serde_json::from_value::<Vec<T>>(arr.clone()) {
                    return Self::Keyed {
                        key: key.to_string(),
                        items,
                    };
                }
                return Self::Unknown(body);
            }
        }
        if body.is_array() {
            return match serde_json::from_value::<Vec<T>>(body.clone()) {
                Ok(items) => Self::Bare(items),
                Err(_) => Self::Unknown(body),
            };
        }
        Self::Unknown(body)
    }
}

impl<T> ListResponse<T> {
    /// Items of a recognised shape; empty for [`ListResponse::Unknown`].
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Keyed { items, .. } | Self::Bare(items) => items,
            Self::Unknown(_) => Vec::new(),
        }
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}
