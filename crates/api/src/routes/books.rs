//! Book catalogue endpoints.

use std::sync::Arc;

use application::{
    ApproveBook, CommandHandler, CreateBook, DeleteBook, FindBookById, FindBooks, Paginated,
    QueryHandler, UpdateBook,
};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{BookId, CategoryId};
use domain::{Book, NewBook};
use serde::Deserialize;
use store::RowStore;

use super::page_from;
use crate::AppState;
use crate::error::ApiError;
use crate::extract::RequestCaller;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct BookListParams {
    pub category_id: Option<CategoryId>,
    pub is_approved: Option<bool>,
    pub title: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl From<BookListParams> for FindBooks {
    fn from(params: BookListParams) -> Self {
        FindBooks {
            category_id: params.category_id,
            is_approved: params.is_approved,
            title: params.title,
            page: page_from(params.page, params.per_page),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    pub is_approved: bool,
}

// -- Handlers --

/// POST /books: add a book; books added by administrators start approved.
#[tracing::instrument(skip(state))]
pub async fn create<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Json(req): Json<NewBook>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    let book = state.catalog.books.create.execute(&caller, CreateBook::new(req)).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// GET /books: list books matching the query parameters.
#[tracing::instrument(skip(state))]
pub async fn list<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Query(params): Query<BookListParams>,
) -> Result<Json<Paginated<Book>>, ApiError> {
    let books = state.catalog.books.find.execute(&caller, params.into()).await?;
    Ok(Json(books))
}

/// GET /books/:id
#[tracing::instrument(skip(state))]
pub async fn get<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Path(id): Path<BookId>,
) -> Result<Json<Book>, ApiError> {
    let book = state.catalog.books.find_by_id.execute(&caller, FindBookById::new(id)).await?;
    Ok(Json(book))
}

/// PATCH /books/:id: edit a book directly (administrators only).
#[tracing::instrument(skip(state))]
pub async fn update<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Path(id): Path<BookId>,
    Json(req): Json<UpdateBook>,
) -> Result<Json<Book>, ApiError> {
    let cmd = UpdateBook { book_id: id, ..req };
    let book = state.catalog.books.update.execute(&caller, cmd).await?;
    Ok(Json(book))
}

/// PUT /books/:id/approval
#[tracing::instrument(skip(state))]
pub async fn approve<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Path(id): Path<BookId>,
    Json(req): Json<ApprovalRequest>,
) -> Result<Json<Book>, ApiError> {
    let cmd = ApproveBook::new(id, req.is_approved);
    let book = state.catalog.books.approve.execute(&caller, cmd).await?;
    Ok(Json(book))
}

/// DELETE /books/:id
#[tracing::instrument(skip(state))]
pub async fn delete<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Path(id): Path<BookId>,
) -> Result<StatusCode, ApiError> {
    state.catalog.books.delete.execute(&caller, DeleteBook::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
