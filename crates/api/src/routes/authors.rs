//! Author endpoints.

use std::sync::Arc;

use application::{CreateAuthor, FindAuthors, Paginated, UpdateAuthor};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::AuthorId;
use domain::Author;
use serde::Deserialize;
use store::RowStore;

use super::page_from;
use crate::AppState;
use crate::error::ApiError;
use crate::extract::RequestCaller;

#[derive(Debug, Deserialize)]
pub struct AuthorListParams {
    pub name: Option<String>,
    pub is_approved: Option<bool>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

/// POST /authors
#[tracing::instrument(skip(state))]
pub async fn create<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Json(req): Json<CreateAuthor>,
) -> Result<(StatusCode, Json<Author>), ApiError> {
    let author = state.catalog.authors.create_author(&caller, req).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

/// GET /authors
#[tracing::instrument(skip(state))]
pub async fn list<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Query(params): Query<AuthorListParams>,
) -> Result<Json<Paginated<Author>>, ApiError> {
    let query = FindAuthors {
        name: params.name,
        is_approved: params.is_approved,
        page: page_from(params.page, params.per_page),
    };
    let authors = state.catalog.authors.find_authors(&caller, query).await?;
    Ok(Json(authors))
}

/// GET /authors/:id
#[tracing::instrument(skip(state))]
pub async fn get<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Path(id): Path<AuthorId>,
) -> Result<Json<Author>, ApiError> {
    let author = state.catalog.authors.find_author_by_id(&caller, id).await?;
    Ok(Json(author))
}

/// PATCH /authors/:id
#[tracing::instrument(skip(state))]
pub async fn update<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Path(id): Path<AuthorId>,
    Json(req): Json<UpdateAuthor>,
) -> Result<Json<Author>, ApiError> {
    let author = state.catalog.authors.update_author(&caller, id, req).await?;
    Ok(Json(author))
}
