//! HTTP route handlers, one module per resource.

pub mod authors;
pub mod books;
pub mod bookshelves;
pub mod change_requests;
pub mod dictionaries;
pub mod health;
pub mod metrics;
pub mod user_books;

use application::Page;

/// Builds a page from optional `page` and `per_page` query parameters.
fn page_from(page: Option<usize>, per_page: Option<usize>) -> Page {
    let defaults = Page::default();
    Page::new(page.unwrap_or(defaults.page), per_page.unwrap_or(defaults.per_page))
}
