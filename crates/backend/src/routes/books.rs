//! Catalog route handlers.

use axum::{Json, extract::Path, extract::State};
use tracing::instrument;

use readnook_core::BookId;

use crate::db::{BookRepository, BookStore};
use crate::error::{AppError, Result};
use crate::models::Book;
use crate::state::AppState;

/// List the catalog, newest first.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Book>>> {
    let books = BookRepository::new(state.pool());
    Ok(Json(books.list().await?))
}

/// Book detail.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<BookId>) -> Result<Json<Book>> {
    let books = BookRepository::new(state.pool());
    let book = books
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("book {id}")))?;
    Ok(Json(book))
}
