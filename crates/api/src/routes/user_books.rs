//! Endpoints for the books on a user's shelves.

use std::sync::Arc;

use application::{FindUserBooks, Paginated, UpdateUserBook};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{BookshelfId, CollectionId, UserBookId, UserId};
use domain::{NewUserBook, RelationDelta, UserBook, UserBookStatus};
use serde::Deserialize;
use store::RowStore;

use super::page_from;
use crate::AppState;
use crate::error::ApiError;
use crate::extract::RequestCaller;

#[derive(Debug, Deserialize)]
pub struct UserBookListParams {
    pub bookshelf_id: Option<BookshelfId>,
    pub status: Option<UserBookStatus>,
    pub is_favorite: Option<bool>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

/// POST /users/:user_id/books
#[tracing::instrument(skip(state))]
pub async fn create<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Path(user_id): Path<UserId>,
    Json(req): Json<NewUserBook>,
) -> Result<(StatusCode, Json<UserBook>), ApiError> {
    let user_book = state.catalog.user_books.create_user_book(&caller, user_id, req).await?;
    Ok((StatusCode::CREATED, Json(user_book)))
}

/// GET /users/:user_id/books
#[tracing::instrument(skip(state))]
pub async fn list<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Path(user_id): Path<UserId>,
    Query(params): Query<UserBookListParams>,
) -> Result<Json<Paginated<UserBook>>, ApiError> {
    let query = FindUserBooks {
        bookshelf_id: params.bookshelf_id,
        status: params.status,
        is_favorite: params.is_favorite,
        page: page_from(params.page, params.per_page),
    };
    let user_books = state.catalog.user_books.find_user_books(&caller, user_id, query).await?;
    Ok(Json(user_books))
}

/// PATCH /user-books/:id
#[tracing::instrument(skip(state))]
pub async fn update<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Path(id): Path<UserBookId>,
    Json(req): Json<UpdateUserBook>,
) -> Result<Json<UserBook>, ApiError> {
    let user_book = state.catalog.user_books.update_user_book(&caller, id, req).await?;
    Ok(Json(user_book))
}

/// PUT /user-books/:id/collections: add and remove collection memberships.
#[tracing::instrument(skip(state))]
pub async fn update_collections<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Path(id): Path<UserBookId>,
    Json(delta): Json<RelationDelta<CollectionId>>,
) -> Result<Json<UserBook>, ApiError> {
    let user_book = state.catalog.user_books.update_collections(&caller, id, delta).await?;
    Ok(Json(user_book))
}

/// DELETE /user-books/:id: removes its readings, borrowings and quotes too.
#[tracing::instrument(skip(state))]
pub async fn delete<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Path(id): Path<UserBookId>,
) -> Result<StatusCode, ApiError> {
    state.catalog.user_books.delete_user_book(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
