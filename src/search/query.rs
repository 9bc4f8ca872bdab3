//! Search query building

use crate::models::PageRequest;
use crate::search::document::MovieFields;
use serde::{Deserialize, Serialize};
use tantivy::query::{AllQuery, Query, QueryParser};
use tantivy::Index;

/// Relative weight of a title match
pub const TITLE_BOOST: f32 = 3.0;

/// Relative weight of a cast match
pub const CAST_BOOST: f32 = 2.0;

/// Relative weight of a description match
pub const DESCRIPTION_BOOST: f32 = 1.5;

/// A free-text search over the movie index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// User query text; empty means "browse everything"
    pub text: String,

    /// Pagination window
    pub page: PageRequest,
}

impl SearchRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            page: PageRequest::default(),
        }
    }

    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    /// True when the request should match all documents
    pub fn is_browse(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Query builder for constructing weighted multi-field Tantivy queries
pub struct QueryBuilder {
    index: Index,
    fields: MovieFields,
}

impl QueryBuilder {
    /// Create a new query builder
    pub fn new(index: Index, fields: MovieFields) -> Self {
        Self { index, fields }
    }

    /// Build a Tantivy query from a SearchRequest.
    ///
    /// Text is parsed leniently: stray quotes, colons or unbalanced brackets in
    /// user input degrade to plain terms instead of failing the search.
    pub fn build(&self, request: &SearchRequest) -> Box<dyn Query> {
        if request.is_browse() {
            return Box::new(AllQuery);
        }

        let mut parser = QueryParser::for_index(
            &self.index,
            vec![self.fields.title, self.fields.cast, self.fields.description],
        );
        parser.set_field_boost(self.fields.title, TITLE_BOOST);
        parser.set_field_boost(self.fields.cast, CAST_BOOST);
        parser.set_field_boost(self.fields.description, DESCRIPTION_BOOST);

        let (query, errors) = parser.parse_query_lenient(request.text.trim());
        if !errors.is_empty() {
            tracing::debug!(
                query = %request.text,
                errors = errors.len(),
                "Search text parsed leniently"
            );
        }

        query
    }
}
