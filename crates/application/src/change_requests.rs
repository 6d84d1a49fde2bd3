//! Moderation workflow for book change requests.

use std::sync::Arc;

use async_trait::async_trait;
use common::{BookChangeRequestId, BookId};
use domain::{
    AuthorMapper, Book, BookChangeRequest, BookChangeRequestMapper, BookChanges, BookMapper,
    ChangeRequestMerger, DomainError, Entity, Mapper, Patch, Repository, Result,
};
use store::{Filter, RowStore};

use crate::access::{AccessControl, Caller, Requirement};
use crate::handler::{CommandHandler, QueryHandler};
use crate::lookup::require_all;
use crate::pagination::{Page, Paginated};

// Commands

/// Command to propose changes to a book.
#[derive(Debug, Clone)]
pub struct CreateBookChangeRequest {
    pub book_id: BookId,
    pub changes: BookChanges,
}

impl CreateBookChangeRequest {
    pub fn new(book_id: BookId, changes: BookChanges) -> Self {
        Self { book_id, changes }
    }
}

/// Command to merge a pending request onto its book and consume it.
#[derive(Debug, Clone, Copy)]
pub struct ApplyBookChangeRequest {
    pub book_change_request_id: BookChangeRequestId,
}

impl ApplyBookChangeRequest {
    pub fn new(book_change_request_id: BookChangeRequestId) -> Self {
        Self {
            book_change_request_id,
        }
    }
}

/// Command to reject a pending request without touching its book.
#[derive(Debug, Clone, Copy)]
pub struct DeleteBookChangeRequest {
    pub book_change_request_id: BookChangeRequestId,
}

impl DeleteBookChangeRequest {
    pub fn new(book_change_request_id: BookChangeRequestId) -> Self {
        Self {
            book_change_request_id,
        }
    }
}

// Queries

#[derive(Debug, Clone, Copy)]
pub struct FindBookChangeRequest {
    pub book_change_request_id: BookChangeRequestId,
}

impl FindBookChangeRequest {
    pub fn new(book_change_request_id: BookChangeRequestId) -> Self {
        Self {
            book_change_request_id,
        }
    }
}

/// Lists pending requests, optionally for a single book.
#[derive(Debug, Clone, Default)]
pub struct FindBookChangeRequests {
    pub book_id: Option<BookId>,
    pub page: Page,
}

// Handlers

pub struct CreateBookChangeRequestCommandHandler<S: RowStore> {
    requests: Repository<S, BookChangeRequestMapper>,
    books: Repository<S, BookMapper>,
    authors: Repository<S, AuthorMapper>,
    access: Arc<dyn AccessControl>,
}

impl<S: RowStore + Clone> CreateBookChangeRequestCommandHandler<S> {
    pub fn new(store: S, access: Arc<dyn AccessControl>) -> Self {
        Self {
            requests: Repository::new(store.clone()),
            books: Repository::new(store.clone()),
            authors: Repository::new(store),
            access,
        }
    }
}

#[async_trait]
impl<S: RowStore + Clone> CommandHandler<CreateBookChangeRequest>
    for CreateBookChangeRequestCommandHandler<S>
{
    type Output = BookChangeRequest;

    #[tracing::instrument(skip(self, caller, command), fields(book_id = %command.book_id))]
    async fn execute(
        &self,
        caller: &Caller,
        command: CreateBookChangeRequest,
    ) -> Result<BookChangeRequest> {
        let identity = self.access.check(caller, &Requirement::Authenticated)?;

        let mut book = self.books.find_by_id(command.book_id).await?;
        if let Patch::Present(author_ids) = &command.changes.author_ids {
            require_all(&self.authors, author_ids.iter().copied().collect()).await?;
        }

        // Trial merge on a book that is never saved
        ChangeRequestMerger::apply_changes(&mut book, &command.changes)?;

        let mut request =
            BookChangeRequest::create(command.book_id, identity.email.clone(), command.changes)?;
        self.requests.create(&mut request).await?;

        metrics::counter!("book_change_requests_created_total").increment(1);
        tracing::info!(
            book_change_request_id = %request.id(),
            fields = ?request.changes().present_fields(),
            "change request submitted"
        );
        Ok(request)
    }
}

pub struct ApplyBookChangeRequestCommandHandler<S: RowStore> {
    requests: Repository<S, BookChangeRequestMapper>,
    books: Repository<S, BookMapper>,
    authors: Repository<S, AuthorMapper>,
    access: Arc<dyn AccessControl>,
}

impl<S: RowStore + Clone> ApplyBookChangeRequestCommandHandler<S> {
    pub fn new(store: S, access: Arc<dyn AccessControl>) -> Self {
        Self {
            requests: Repository::new(store.clone()),
            books: Repository::new(store.clone()),
            authors: Repository::new(store),
            access,
        }
    }
}

#[async_trait]
impl<S: RowStore + Clone> CommandHandler<ApplyBookChangeRequest>
    for ApplyBookChangeRequestCommandHandler<S>
{
    type Output = Book;

    /// Merges the request and deletes it in one batch.
    ///
    /// The delete must remove exactly one row, so a request consumed
    /// concurrently rolls the whole merge back and surfaces as not-found.
    #[tracing::instrument(skip(self, caller))]
    async fn execute(&self, caller: &Caller, command: ApplyBookChangeRequest) -> Result<Book> {
        self.access.check(caller, &Requirement::Admin)?;
        let request_id = command.book_change_request_id;

        let request = self.requests.find_by_id(request_id).await?;
        let book_id = request.book_id();
        let mut book = self.books.find_optional(book_id).await?.ok_or_else(|| {
            DomainError::operation_not_valid(format!(
                "change request {request_id} targets missing book {book_id}"
            ))
        })?;

        if let Patch::Present(author_ids) = &request.changes().author_ids {
            let linked = book.authors();
            let added = author_ids.iter().filter(|id| !linked.contains(*id)).copied();
            require_all(&self.authors, added.collect()).await?;
        }

        let outcome = ChangeRequestMerger::merge(&mut book, &request)?;

        let consume = vec![BookChangeRequestMapper::consume_statement(request_id)];
        if let Err(error) = self.books.save_with(&mut book, consume).await {
            metrics::counter!("book_change_request_reconciliation_total").increment(1);
            tracing::error!(
                %error,
                book_change_request_id = %request_id,
                %book_id,
                "change request merge rolled back; book and request left unchanged"
            );

            if error.is_unexpected_row_count_on(BookChangeRequestMapper::TABLE) {
                return Err(DomainError::not_found(BookChangeRequest::entity_type(), request_id));
            }
            return Err(error);
        }

        metrics::counter!("book_change_requests_applied_total").increment(1);
        tracing::info!(
            book_change_request_id = %request_id,
            %book_id,
            fields = ?outcome.fields,
            authors_added = outcome.authors_added,
            authors_removed = outcome.authors_removed,
            "change request applied"
        );
        Ok(book)
    }
}

pub struct DeleteBookChangeRequestCommandHandler<S: RowStore> {
    requests: Repository<S, BookChangeRequestMapper>,
    access: Arc<dyn AccessControl>,
}

impl<S: RowStore> DeleteBookChangeRequestCommandHandler<S> {
    pub fn new(store: S, access: Arc<dyn AccessControl>) -> Self {
        Self {
            requests: Repository::new(store),
            access,
        }
    }
}

#[async_trait]
impl<S: RowStore> CommandHandler<DeleteBookChangeRequest>
    for DeleteBookChangeRequestCommandHandler<S>
{
    type Output = ();

    #[tracing::instrument(skip(self, caller))]
    async fn execute(&self, caller: &Caller, command: DeleteBookChangeRequest) -> Result<()> {
        self.access.check(caller, &Requirement::Admin)?;
        self.requests.delete(command.book_change_request_id).await?;

        metrics::counter!("book_change_requests_rejected_total").increment(1);
        tracing::info!(
            book_change_request_id = %command.book_change_request_id,
            "change request rejected"
        );
        Ok(())
    }
}

pub struct FindBookChangeRequestQueryHandler<S: RowStore> {
    requests: Repository<S, BookChangeRequestMapper>,
    access: Arc<dyn AccessControl>,
}

impl<S: RowStore> FindBookChangeRequestQueryHandler<S> {
    pub fn new(store: S, access: Arc<dyn AccessControl>) -> Self {
        Self {
            requests: Repository::new(store),
            access,
        }
    }
}

#[async_trait]
impl<S: RowStore> QueryHandler<FindBookChangeRequest> for FindBookChangeRequestQueryHandler<S> {
    type Output = BookChangeRequest;

    #[tracing::instrument(skip(self, caller))]
    async fn execute(
        &self,
        caller: &Caller,
        query: FindBookChangeRequest,
    ) -> Result<BookChangeRequest> {
        self.access.check(caller, &Requirement::Authenticated)?;

        let request = self.requests.find_by_id(query.book_change_request_id).await?;
        let proposer = Requirement::EmailOrAdmin(request.user_email().to_string());
        self.access.check(caller, &proposer)?;

        Ok(request)
    }
}

pub struct FindBookChangeRequestsQueryHandler<S: RowStore> {
    requests: Repository<S, BookChangeRequestMapper>,
    access: Arc<dyn AccessControl>,
}

impl<S: RowStore> FindBookChangeRequestsQueryHandler<S> {
    pub fn new(store: S, access: Arc<dyn AccessControl>) -> Self {
        Self {
            requests: Repository::new(store),
            access,
        }
    }
}

#[async_trait]
impl<S: RowStore> QueryHandler<FindBookChangeRequests> for FindBookChangeRequestsQueryHandler<S> {
    type Output = Paginated<BookChangeRequest>;

    #[tracing::instrument(skip(self, caller))]
    async fn execute(
        &self,
        caller: &Caller,
        query: FindBookChangeRequests,
    ) -> Result<Paginated<BookChangeRequest>> {
        self.access.check(caller, &Requirement::Admin)?;

        let filters = query
            .book_id
            .map(|book_id| Filter::eq("book_id", book_id.as_uuid()))
            .into_iter()
            .collect();
        let requests = self.requests.find_many(filters).await?;

        Ok(query.page.apply(requests))
    }
}
