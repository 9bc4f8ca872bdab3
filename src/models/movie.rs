use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Canonical movie row owned by the record store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRecord {
    /// Unique identifier, assigned at creation and never reused
    pub id: u64,

    /// Movie title
    pub title: String,

    /// Free-text synopsis
    pub description: String,

    /// Release date, if known
    pub release_date: Option<NaiveDate>,

    /// Production budget in whole monetary units
    #[serde(with = "decimal_string")]
    pub budget: Option<u64>,

    /// Box-office collection in whole monetary units
    #[serde(with = "decimal_string")]
    pub collection: Option<u64>,

    /// Cast names in billing order
    pub cast: Vec<String>,

    /// Whether the movie is flagged as a hit
    pub is_hit: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl MovieRecord {
    /// Materialize a new record from a draft.
    pub fn from_draft(id: u64, draft: MovieDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            release_date: draft.release_date,
            budget: draft.budget,
            collection: draft.collection,
            cast: draft.cast,
            is_hit: draft.is_hit,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update in place. Fields left as `None` in the patch are untouched.
    pub fn apply(&mut self, patch: MoviePatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(release_date) = patch.release_date {
            self.release_date = Some(release_date);
        }
        if let Some(budget) = patch.budget {
            self.budget = Some(budget);
        }
        if let Some(collection) = patch.collection {
            self.collection = Some(collection);
        }
        if let Some(cast) = patch.cast {
            self.cast = cast;
        }
        // An explicit `false` is a real update, only an omitted flag is left alone.
        if let Some(is_hit) = patch.is_hit {
            self.is_hit = is_hit;
        }
        self.updated_at = now;
    }
}

/// Fully-typed input for creating a movie
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieDraft {
    pub title: String,
    pub description: String,
    pub release_date: Option<NaiveDate>,
    pub budget: Option<u64>,
    pub collection: Option<u64>,
    pub cast: Vec<String>,
    pub is_hit: bool,
}

impl MovieDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_release_date(mut self, date: NaiveDate) -> Self {
        self.release_date = Some(date);
        self
    }

    pub fn with_budget(mut self, budget: u64) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_collection(mut self, collection: u64) -> Self {
        self.collection = Some(collection);
        self
    }

    pub fn with_cast(mut self, cast: Vec<impl Into<String>>) -> Self {
        self.cast = cast.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hit(mut self, is_hit: bool) -> Self {
        self.is_hit = is_hit;
        self
    }
}

/// Partial update; `None` means "leave unchanged"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoviePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub budget: Option<u64>,
    pub collection: Option<u64>,
    pub cast: Option<Vec<String>>,
    pub is_hit: Option<bool>,
}

/// Serde adapter writing optional wide integers as decimal strings.
///
/// JSON consumers that parse numbers as doubles lose precision above 2^53;
/// a string keeps every digit.
pub mod decimal_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| s.parse::<u64>().map_err(de::Error::custom))
            .transpose()
    }
}
