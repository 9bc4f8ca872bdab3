//! Search document structures and index mappings

use crate::models::{decimal_string, MovieRecord};
use crate::search::error::{SearchError, SearchResult};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tantivy::schema::*;
use tantivy::tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, StopWordFilter, TextAnalyzer};
use tantivy::{Index, TantivyDocument};

/// Name under which the movie text analyzer is registered on the index
pub const MOVIE_ANALYZER: &str = "english_stop";

/// English stopwords dropped from title, description and cast at index and query time
const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

/// Denormalized projection of a movie, keyed by the record identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDocument {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub release_date: Option<NaiveDate>,
    #[serde(with = "decimal_string")]
    pub budget: Option<u64>,
    #[serde(with = "decimal_string")]
    pub collection: Option<u64>,
    pub cast: Vec<String>,
    pub is_hit: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&MovieRecord> for MovieDocument {
    fn from(movie: &MovieRecord) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            description: movie.description.clone(),
            release_date: movie.release_date,
            budget: movie.budget,
            collection: movie.collection,
            cast: movie.cast.clone(),
            is_hit: movie.is_hit,
            created_at: Some(movie.created_at),
            updated_at: Some(movie.updated_at),
        }
    }
}

impl From<MovieRecord> for MovieDocument {
    fn from(movie: MovieRecord) -> Self {
        Self::from(&movie)
    }
}

impl MovieDocument {
    /// Convert to a Tantivy document. Null columns are simply not added.
    pub fn to_tantivy_doc(&self, fields: &MovieFields) -> TantivyDocument {
        let mut doc = TantivyDocument::new();

        doc.add_u64(fields.id, self.id);
        doc.add_text(fields.title, &self.title);
        doc.add_text(fields.description, &self.description);

        // Multi-valued; stored values keep billing order
        for name in &self.cast {
            doc.add_text(fields.cast, name);
        }

        doc.add_bool(fields.is_hit, self.is_hit);

        if let Some(secs) = self.release_date.and_then(date_to_timestamp) {
            doc.add_date(fields.release_date, tantivy::DateTime::from_timestamp_secs(secs));
        }
        if let Some(budget) = self.budget {
            doc.add_u64(fields.budget, budget);
        }
        if let Some(collection) = self.collection {
            doc.add_u64(fields.collection, collection);
        }
        if let Some(created_at) = self.created_at {
            doc.add_date(
                fields.created_at,
                tantivy::DateTime::from_timestamp_secs(created_at.timestamp()),
            );
        }
        if let Some(updated_at) = self.updated_at {
            doc.add_date(
                fields.updated_at,
                tantivy::DateTime::from_timestamp_secs(updated_at.timestamp()),
            );
        }

        doc
    }

    /// Rebuild the projection from a stored Tantivy document
    pub fn from_tantivy_doc(doc: &TantivyDocument, fields: &MovieFields) -> SearchResult<Self> {
        let id = doc
            .get_first(fields.id)
            .and_then(|v| v.as_u64())
            .ok_or_else(|| SearchError::SearchFailed("Stored document has no id".to_string()))?;

        let text = |field: Field| {
            doc.get_first(field)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .unwrap_or_default()
        };
        let date = |field: Field| {
            doc.get_first(field)
                .and_then(|v| v.as_datetime())
                .and_then(|dt| DateTime::from_timestamp(dt.into_timestamp_secs(), 0))
        };

        Ok(Self {
            id,
            title: text(fields.title),
            description: text(fields.description),
            release_date: date(fields.release_date).map(|dt| dt.date_naive()),
            budget: doc.get_first(fields.budget).and_then(|v| v.as_u64()),
            collection: doc.get_first(fields.collection).and_then(|v| v.as_u64()),
            cast: doc
                .get_all(fields.cast)
                .filter_map(|v| v.as_str())
                .map(|s| s.to_string())
                .collect(),
            is_hit: doc
                .get_first(fields.is_hit)
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            created_at: date(fields.created_at),
            updated_at: date(fields.updated_at),
        })
    }
}

fn date_to_timestamp(date: NaiveDate) -> Option<i64> {
    date.and_hms_opt(0, 0, 0)
        .map(|midnight| Utc.from_utc_datetime(&midnight).timestamp())
}

/// Resolved field handles of the movie schema
#[derive(Debug, Clone, Copy)]
pub struct MovieFields {
    pub id: Field,
    pub title: Field,
    pub description: Field,
    pub cast: Field,
    pub is_hit: Field,
    pub release_date: Field,
    pub budget: Field,
    pub collection: Field,
    pub created_at: Field,
    pub updated_at: Field,
}

impl MovieFields {
    /// Resolve every mapped field, failing if the schema lacks one
    pub fn resolve(schema: &Schema) -> SearchResult<Self> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| SearchError::SchemaError(format!("Index has no '{}' field", name)))
        };

        Ok(Self {
            id: field("id")?,
            title: field("title")?,
            description: field("description")?,
            cast: field("cast")?,
            is_hit: field("is_hit")?,
            release_date: field("release_date")?,
            budget: field("budget")?,
            collection: field("collection")?,
            created_at: field("created_at")?,
            updated_at: field("updated_at")?,
        })
    }
}

fn analyzed_text() -> TextOptions {
    let indexing = TextFieldIndexing::default()
        .set_tokenizer(MOVIE_ANALYZER)
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);

    TextOptions::default()
        .set_indexing_options(indexing)
        .set_stored()
}

/// Build the search schema for movies
pub fn build_movie_schema() -> Schema {
    let mut schema_builder = Schema::builder();

    // ID - native u64 key, exact match and fast for enumeration
    schema_builder.add_u64_field("id", INDEXED | STORED | FAST);

    // Full-text fields sharing the stopword-aware analyzer
    schema_builder.add_text_field("title", analyzed_text());
    schema_builder.add_text_field("description", analyzed_text());
    schema_builder.add_text_field("cast", analyzed_text());

    // Exact-match and range-queryable fields
    schema_builder.add_bool_field("is_hit", INDEXED | STORED | FAST);
    schema_builder.add_date_field("release_date", INDEXED | STORED | FAST);
    schema_builder.add_u64_field("budget", INDEXED | STORED | FAST);
    schema_builder.add_u64_field("collection", INDEXED | STORED | FAST);
    schema_builder.add_date_field("created_at", INDEXED | STORED | FAST);
    schema_builder.add_date_field("updated_at", INDEXED | STORED | FAST);

    schema_builder.build()
}

/// Register the movie analyzer. Tokenizers are not persisted with the index,
/// so this runs every time an index is opened.
pub fn register_movie_analyzer(index: &Index) {
    let analyzer = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .filter(StopWordFilter::remove(
            ENGLISH_STOP_WORDS.iter().map(|word| word.to_string()),
        ))
        .build();

    index.tokenizers().register(MOVIE_ANALYZER, analyzer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MovieDraft;

    fn sample_movie() -> MovieRecord {
        let draft = MovieDraft::new("The Dark Knight", "Batman faces the Joker")
            .with_release_date(NaiveDate::from_ymd_opt(2008, 7, 18).unwrap())
            .with_budget(185_000_000)
            .with_cast(vec!["Christian Bale", "Heath Ledger", "Aaron Eckhart"])
            .with_hit(true);
        MovieRecord::from_draft(11, draft, Utc::now())
    }

    #[test]
    fn test_movie_to_document() {
        let movie = sample_movie();
        let doc = MovieDocument::from(&movie);

        assert_eq!(doc.id, 11);
        assert_eq!(doc.title, "The Dark Knight");
        assert_eq!(doc.cast, movie.cast);
        assert_eq!(doc.collection, None);
    }

    #[test]
    fn test_schema_building() {
        let schema = build_movie_schema();
        assert!(MovieFields::resolve(&schema).is_ok());
    }

    #[test]
    fn test_resolve_rejects_foreign_schema() {
        let mut builder = Schema::builder();
        builder.add_text_field("id", STRING | STORED);
        let schema = builder.build();

        assert!(matches!(
            MovieFields::resolve(&schema),
            Err(SearchError::SchemaError(_))
        ));
    }

    #[test]
    fn test_tantivy_document_round_trip_keeps_cast_order() {
        let schema = build_movie_schema();
        let fields = MovieFields::resolve(&schema).unwrap();
        let document = MovieDocument::from(sample_movie());

        let restored =
            MovieDocument::from_tantivy_doc(&document.to_tantivy_doc(&fields), &fields).unwrap();

        assert_eq!(restored.id, document.id);
        assert_eq!(restored.cast, vec!["Christian Bale", "Heath Ledger", "Aaron Eckhart"]);
        assert_eq!(restored.release_date, document.release_date);
        assert_eq!(restored.budget, Some(185_000_000));
        assert_eq!(restored.collection, None);
        assert!(restored.is_hit);
    }
}
