//! Change-request moderation endpoints.

use std::sync::Arc;

use application::{
    ApplyBookChangeRequest, CommandHandler, CreateBookChangeRequest, DeleteBookChangeRequest,
    FindBookChangeRequest, FindBookChangeRequests, Paginated, QueryHandler,
};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{BookChangeRequestId, BookId};
use domain::{Book, BookChangeRequest, BookChanges};
use serde::Deserialize;
use store::RowStore;

use super::page_from;
use crate::AppState;
use crate::error::ApiError;
use crate::extract::RequestCaller;

#[derive(Debug, Deserialize)]
pub struct ChangeRequestListParams {
    pub book_id: Option<BookId>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

/// POST /books/:id/change-requests: propose changes to a book.
///
/// The proposal is validated against the current book but not applied.
#[tracing::instrument(skip(state))]
pub async fn create<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Path(book_id): Path<BookId>,
    Json(changes): Json<BookChanges>,
) -> Result<(StatusCode, Json<BookChangeRequest>), ApiError> {
    let cmd = CreateBookChangeRequest::new(book_id, changes);
    let request = state.catalog.change_requests.create.execute(&caller, cmd).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// GET /change-requests: pending requests, optionally for one book.
#[tracing::instrument(skip(state))]
pub async fn list<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Query(params): Query<ChangeRequestListParams>,
) -> Result<Json<Paginated<BookChangeRequest>>, ApiError> {
    let query = FindBookChangeRequests {
        book_id: params.book_id,
        page: page_from(params.page, params.per_page),
    };
    let requests = state.catalog.change_requests.find.execute(&caller, query).await?;
    Ok(Json(requests))
}

/// GET /change-requests/:id
#[tracing::instrument(skip(state))]
pub async fn get<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Path(id): Path<BookChangeRequestId>,
) -> Result<Json<BookChangeRequest>, ApiError> {
    let query = FindBookChangeRequest::new(id);
    let request = state.catalog.change_requests.find_by_id.execute(&caller, query).await?;
    Ok(Json(request))
}

/// POST /change-requests/:id/apply: merge onto the book and consume.
#[tracing::instrument(skip(state))]
pub async fn apply<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Path(id): Path<BookChangeRequestId>,
) -> Result<Json<Book>, ApiError> {
    let cmd = ApplyBookChangeRequest::new(id);
    let book = state.catalog.change_requests.apply.execute(&caller, cmd).await?;
    Ok(Json(book))
}

/// DELETE /change-requests/:id: reject without touching the book.
#[tracing::instrument(skip(state))]
pub async fn reject<S: RowStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Path(id): Path<BookChangeRequestId>,
) -> Result<StatusCode, ApiError> {
    let cmd = DeleteBookChangeRequest::new(id);
    state.catalog.change_requests.delete.execute(&caller, cmd).await?;
    Ok(StatusCode::NO_CONTENT)
}
