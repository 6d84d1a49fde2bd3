//! HTTP API server with observability for the library catalogue.
//!
//! Exposes the catalogue handlers as JSON endpoints, with structured
//! logging (tracing) and Prometheus metrics. Caller identity arrives in
//! headers set by the upstream token service.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use application::{Catalog, RoleBasedAccessControl};
use axum::Router;
use axum::routing::{get, patch, post, put};
use domain::{CategoryMapper, GenreMapper};
use metrics_exporter_prometheus::PrometheusHandle;
use store::RowStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::{authors, books, bookshelves, change_requests, dictionaries, user_books};

/// Shared application state accessible from all handlers.
pub struct AppState<S: RowStore> {
    pub catalog: Catalog<S>,
}

/// Creates the application state over `store` with role-based access control.
pub fn create_state<S: RowStore + Clone>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        catalog: Catalog::new(store, Arc::new(RoleBasedAccessControl)),
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: RowStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        // Books
        .route("/books", post(books::create::<S>).get(books::list::<S>))
        .route(
            "/books/{id}",
            get(books::get::<S>)
                .patch(books::update::<S>)
                .delete(books::delete::<S>),
        )
        .route("/books/{id}/approval", put(books::approve::<S>))
        // Change requests
        .route("/books/{id}/change-requests", post(change_requests::create::<S>))
        .route("/change-requests", get(change_requests::list::<S>))
        .route(
            "/change-requests/{id}",
            get(change_requests::get::<S>)
                .delete(change_requests::reject::<S>),
        )
        .route("/change-requests/{id}/apply", post(change_requests::apply::<S>))
        // Authors and dictionaries
        .route("/authors", post(authors::create::<S>).get(authors::list::<S>))
        .route("/authors/{id}", get(authors::get::<S>).patch(authors::update::<S>))
        .route(
            "/genres",
            post(dictionaries::create::<S, GenreMapper>)
                .get(dictionaries::list::<S, GenreMapper>),
        )
        .route(
            "/genres/{id}",
            get(dictionaries::get::<S, GenreMapper>)
                .patch(dictionaries::rename::<S, GenreMapper>),
        )
        .route(
            "/categories",
            post(dictionaries::create::<S, CategoryMapper>)
                .get(dictionaries::list::<S, CategoryMapper>),
        )
        .route(
            "/categories/{id}",
            get(dictionaries::get::<S, CategoryMapper>)
                .patch(dictionaries::rename::<S, CategoryMapper>),
        )
        // Personal library
        .route(
            "/users/{user_id}/bookshelves",
            post(bookshelves::create::<S>).get(bookshelves::list::<S>),
        )
        .route(
            "/bookshelves/{id}",
            patch(bookshelves::rename::<S>)
                .delete(bookshelves::delete::<S>),
        )
        .route(
            "/users/{user_id}/books",
            post(user_books::create::<S>).get(user_books::list::<S>),
        )
        .route(
            "/user-books/{id}",
            patch(user_books::update::<S>)
                .delete(user_books::delete::<S>),
        )
        .route("/user-books/{id}/collections", put(user_books::update_collections::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
