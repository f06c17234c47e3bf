use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use petstore_core::{DomainError, DomainResult};

/// Pet availability in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetStatus {
    Available,
    Pending,
    Sold,
}

impl PetStatus {
    pub const ALL: [PetStatus; 3] = [PetStatus::Available, PetStatus::Pending, PetStatus::Sold];

    pub fn as_str(self) -> &'static str {
        match self {
            PetStatus::Available => "available",
            PetStatus::Pending => "pending",
            PetStatus::Sold => "sold",
        }
    }
}

impl fmt::Display for PetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PetStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        PetStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::validation("not allowed status for pet model"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default)]
    pub id: i32,
    pub name: String,
}

impl Tag {
    pub fn named(name: impl Into<String>) -> Self {
        Self { id: 0, name: name.into() }
    }
}

/// A pet as exposed by the API and persisted by the repositories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: i32,
    pub name: String,
    pub status: PetStatus,
    pub photo_urls: Vec<String>,
    pub tags: Vec<Tag>,
    pub category: Category,
}

impl Pet {
    pub fn new(name: impl Into<String>, status: PetStatus, category: Category) -> Self {
        Self {
            id: 0,
            name: name.into(),
            status,
            photo_urls: Vec::new(),
            tags: Vec::new(),
            category,
        }
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.name.clone()).collect()
    }

    /// True when the pet carries every one of `names`.
    pub fn has_all_tags(&self, names: &[String]) -> bool {
        names.iter().all(|wanted| self.tags.iter().any(|t| &t.name == wanted))
    }

    pub fn add_photo_url(&mut self, url: impl Into<String>) {
        self.photo_urls.push(url.into());
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("pet name must not be empty"));
        }
        Ok(())
    }
}
