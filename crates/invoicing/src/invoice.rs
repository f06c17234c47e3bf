use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A rendered invoice kept for later retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: i32,
    pub body: String,
    pub created_date: DateTime<Utc>,
}

impl Invoice {
    pub fn new(body: impl Into<String>, created_date: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            body: body.into(),
            created_date,
        }
    }
}
