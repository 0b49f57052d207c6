use serde::{Deserialize, Serialize};

/// Query string understood by the collection endpoint when listing records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFeedbackQuery {
    #[serde(rename = "_sort")]
    pub sort: String,
    #[serde(rename = "_order")]
    pub order: String,
}

impl ListFeedbackQuery {
    /// Most recent records first.
    pub fn newest_first() -> Self {
        Self {
            sort: "id".into(),
            order: "desc".into(),
        }
    }
}
