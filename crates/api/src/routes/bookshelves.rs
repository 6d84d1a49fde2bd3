//! Bookshelf endpoints.

use std::sync::Arc;

use application::BookshelfName;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{BookshelfId, UserId};
use domain::Bookshelf;
use store::RowStore;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::RequestCaller;

/// POST /users/:user_id/bookshelves
#[tracing::instrument(skip(state))]
pub async fn create<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Path(user_id): Path<UserId>,
    Json(req): Json<BookshelfName>,
) -> Result<(StatusCode, Json<Bookshelf>), ApiError> {
    let bookshelf = state.catalog.bookshelves.create_bookshelf(&caller, user_id, req).await?;
    Ok((StatusCode::CREATED, Json(bookshelf)))
}

/// GET /users/:user_id/bookshelves
#[tracing::instrument(skip(state))]
pub async fn list<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<Bookshelf>>, ApiError> {
    let bookshelves = state.catalog.bookshelves.find_user_bookshelves(&caller, user_id).await?;
    Ok(Json(bookshelves))
}

/// PATCH /bookshelves/:id
#[tracing::instrument(skip(state))]
pub async fn rename<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Path(id): Path<BookshelfId>,
    Json(req): Json<BookshelfName>,
) -> Result<Json<Bookshelf>, ApiError> {
    let bookshelf = state.catalog.bookshelves.rename_bookshelf(&caller, id, req).await?;
    Ok(Json(bookshelf))
}

/// DELETE /bookshelves/:id
#[tracing::instrument(skip(state))]
pub async fn delete<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Path(id): Path<BookshelfId>,
) -> Result<StatusCode, ApiError> {
    state.catalog.bookshelves.delete_bookshelf(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
