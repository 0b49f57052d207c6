use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Server-assigned identifier of a feedback record. Collection servers hand
/// out either integers or opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeedbackId {
    Int(i64),
    Str(String),
}

impl fmt::Display for FeedbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Str(id) => f.write_str(id),
        }
    }
}

impl FromStr for FeedbackId {
    type Err = Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(raw
            .parse::<i64>()
            .map(Self::Int)
            .unwrap_or_else(|_| Self::Str(raw.to_string())))
    }
}

impl From<i64> for FeedbackId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<&str> for FeedbackId {
    fn from(id: &str) -> Self {
        Self::Str(id.to_string())
    }
}

/// A single rating + comment record as stored by the collection endpoint.
///
/// Fields the server returns beyond `id`, `rating` and `text` are kept in
/// `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub id: FeedbackId,
    pub rating: Number,
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeedbackItem {
    pub fn new(
        id: impl Into<FeedbackId>,
        rating: impl Into<Number>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            rating: rating.into(),
            text: text.into(),
            extra: Map::new(),
        }
    }

    /// Overwrites every field present in `patch`. The id never changes.
    pub fn apply(&mut self, patch: FeedbackPatch) {
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
        if let Some(text) = patch.text {
            self.text = text;
        }
        for (key, value) in patch.extra {
            if key == "id" {
                continue;
            }
            self.extra.insert(key, value);
        }
    }

    /// Full replacement body: every current field, with `changes` laid over it.
    pub fn with_changes(&self, changes: FeedbackPatch) -> FeedbackPatch {
        let mut body = FeedbackPatch::from(self.clone());
        if changes.rating.is_some() {
            body.rating = changes.rating;
        }
        if changes.text.is_some() {
            body.text = changes.text;
        }
        for (key, value) in changes.extra {
            if key != "id" {
                body.extra.insert(key, value);
            }
        }
        body
    }
}

/// Body of a create request: a feedback record before the server assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFeedback {
    pub rating: Number,
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewFeedback {
    pub fn new(rating: impl Into<Number>, text: impl Into<String>) -> Self {
        Self {
            rating: rating.into(),
            text: text.into(),
            extra: Map::new(),
        }
    }
}

/// Partial field set, used both as the update request body and to decode the
/// update response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeedbackPatch {
    pub fn with_rating(mut self, rating: impl Into<Number>) -> Self {
        self.rating = Some(rating.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.text.is_none() && self.extra.is_empty()
    }
}

impl From<FeedbackItem> for FeedbackPatch {
    fn from(item: FeedbackItem) -> Self {
        Self {
            rating: Some(item.rating),
            text: Some(item.text),
            extra: item.extra,
        }
    }
}

/// The item currently targeted for an in-place edit, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditSelection {
    pub item: Option<FeedbackItem>,
    pub active: bool,
}

impl EditSelection {
    pub fn editing(item: FeedbackItem) -> Self {
        Self {
            item: Some(item),
            active: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeedbackStats {
    pub count: usize,
    /// Mean rating rounded to one decimal place; `None` for an empty list.
    pub average_rating: Option<f64>,
}

impl FeedbackStats {
    pub fn from_items(items: &[FeedbackItem]) -> Self {
        if items.is_empty() {
            return Self::default();
        }
        let ratings: Vec<f64> = items
            .iter()
            .filter_map(|item| item.rating.as_f64())
            .collect();
        if ratings.is_empty() {
            return Self {
                count: items.len(),
                average_rating: None,
            };
        }
        let average = ratings.iter().sum::<f64>() / ratings.len() as f64;
        Self {
            count: items.len(),
            average_rating: Some((average * 10.0).round() / 10.0),
        }
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
