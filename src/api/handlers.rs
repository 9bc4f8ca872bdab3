use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::MovieRecord;
use crate::planner::{self, BrowseParams, MovieInput, SearchParams};
use crate::search::SearchHit;
use crate::sync::{Propagation, Synced};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Success envelope shared by every movie endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Present only when the search index could not be updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<Propagation>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            count: None,
            page: None,
            page_size: None,
            total: None,
            message: None,
            index: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<MovieRecord> {
    fn from_synced(synced: Synced<MovieRecord>, message: &str) -> Self {
        let mut response = Self::new(synced.value).with_message(message);
        if !synced.propagation.is_applied() {
            response.index = Some(synced.propagation);
        }
        response
    }
}

impl<T> ApiResponse<Vec<T>> {
    fn page(data: Vec<T>, page: u32, page_size: u32) -> Self {
        let count = data.len();
        let mut response = Self::new(data);
        response.count = Some(count);
        response.page = Some(page);
        response.page_size = Some(page_size);
        response
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "Server is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// Full-text search over the index
pub async fn search_movies(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<Vec<SearchHit>>>> {
    let request = planner::plan_search(&params, state.search_page_size);
    let result = state.catalog.index().query(&request).await?;

    let mut response = ApiResponse::page(result.hits, result.page.page, result.page.page_size);
    response.total = Some(result.total);
    Ok(Json(response))
}

/// Attribute browse served by the record store
pub async fn list_movies(
    State(state): State<AppState>,
    Query(params): Query<BrowseParams>,
) -> Result<Json<ApiResponse<Vec<MovieRecord>>>> {
    let (filter, page) = planner::plan_browse(&params);
    let movies = state.catalog.store().list_movies(&filter, page).await?;

    Ok(Json(ApiResponse::page(movies, page.page, page.page_size)))
}

/// Fetch one movie
pub async fn get_movie(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<MovieRecord>>> {
    let id = movie_id(&raw_id)?;
    let movie = state
        .catalog
        .store()
        .get_movie(id)
        .await?
        .ok_or_else(|| not_found(&raw_id))?;

    Ok(Json(ApiResponse::new(movie)))
}

/// Create a movie
pub async fn create_movie(
    State(state): State<AppState>,
    payload: std::result::Result<Json<MovieInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<MovieRecord>>)> {
    let draft = planner::draft_from_input(json_body(payload)?)?;
    let created = state.catalog.create(draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::from_synced(created, "Movie created successfully")),
    ))
}

/// Partially update a movie
pub async fn update_movie(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: std::result::Result<Json<MovieInput>, JsonRejection>,
) -> Result<Json<ApiResponse<MovieRecord>>> {
    let id = movie_id(&raw_id)?;
    let patch = planner::patch_from_input(json_body(payload)?)?;

    let updated = state
        .catalog
        .update(id, patch)
        .await?
        .ok_or_else(|| not_found(&raw_id))?;

    Ok(Json(ApiResponse::from_synced(
        updated,
        "Movie updated successfully",
    )))
}

/// Delete a movie
pub async fn delete_movie(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<MovieRecord>>> {
    let id = movie_id(&raw_id)?;
    let removed = state
        .catalog
        .remove(id)
        .await?
        .ok_or_else(|| not_found(&raw_id))?;

    Ok(Json(ApiResponse::from_synced(
        removed,
        "Movie deleted successfully",
    )))
}

/// Prometheus metrics endpoint
///
/// Returns metrics in Prometheus text exposition format
pub async fn metrics() -> (StatusCode, String) {
    let metrics = crate::metrics::gather_metrics();
    (StatusCode::OK, metrics)
}

/// Fallback for unknown routes
pub async fn not_found_route() -> AppError {
    AppError::NotFound("Endpoint not found".to_string())
}

fn movie_id(raw: &str) -> Result<u64> {
    planner::parse_id(raw).ok_or_else(|| not_found(raw))
}

fn not_found(raw_id: &str) -> AppError {
    AppError::NotFound(format!("Movie {} not found", raw_id))
}

fn json_body(payload: std::result::Result<Json<MovieInput>, JsonRejection>) -> Result<MovieInput> {
    payload
        .map(|Json(input)| input)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}
