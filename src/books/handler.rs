//! HTTP handlers for the book collection and single-record routes.
//!
//! Every outcome, success or failure, is answered with status 200.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::api::{AddCommentRequest, CreateBookRequest, Payload};
use crate::error::BookError;
use crate::handler::AppState;
use crate::model::{Book, BookId, BookSummary, CreatedBook};
use crate::{json_response, text_response};

pub const COMPLETE_DELETE_SUCCESSFUL: &str = "complete delete successful";
pub const DELETE_SUCCESSFUL: &str = "delete successful";

// ============================================================================
// Collection Handlers
// ============================================================================

pub async fn list_books(State(state): State<AppState>) -> Response {
    match state.books.find_all().await {
        Ok(books) => {
            tracing::info!(count = books.len(), "listed books");
            let summaries: Vec<BookSummary> = books.iter().map(Book::summary).collect();
            json_response(summaries)
        }
        Err(e) => {
            tracing::error!("Failed to list books: {}", e);
            BookError::store("could not get books", e).into_response()
        }
    }
}

pub async fn create_book(
    State(state): State<AppState>,
    Payload(payload): Payload<CreateBookRequest>,
) -> Result<Response, BookError> {
    let title = payload.validate().inspect_err(|e| tracing::debug!("rejected book: {}", e))?;

    match state.books.insert(&title).await {
        Ok(id) => {
            tracing::info!(%id, "created book");
            Ok(json_response(CreatedBook { id, title }))
        }
        Err(e) => {
            tracing::error!("Failed to create book: {}", e);
            Err(BookError::store("could not post", e))
        }
    }
}

pub async fn delete_all_books(State(state): State<AppState>) -> Response {
    match state.books.delete_all().await {
        Ok(removed) => tracing::info!(removed, "deleted all books"),
        // The reply does not change when the bulk delete fails.
        Err(e) => tracing::warn!("Failed to delete all books: {}", e),
    }
    text_response(COMPLETE_DELETE_SUCCESSFUL)
}

// ============================================================================
// Record Handlers
// ============================================================================

/// Malformed ids are reported exactly like absent ones.
fn parse_id(raw: &str) -> Result<BookId, BookError> {
    BookId::parse(raw).ok_or_else(|| {
        tracing::debug!(id = raw, "malformed book id");
        BookError::NotFound
    })
}

fn lookup_failed(action: &str, e: crate::error::StoreError) -> BookError {
    tracing::error!("Failed to {}: {}", action, e);
    BookError::NotFound
}

pub async fn get_book(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, BookError> {
    let id = parse_id(&id)?;

    match state.books.find_by_id(id).await {
        Ok(Some(book)) => Ok(json_response(book.into_detail())),
        Ok(None) => Err(BookError::NotFound),
        Err(e) => Err(lookup_failed("get book", e)),
    }
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload(payload): Payload<AddCommentRequest>,
) -> Result<Response, BookError> {
    let comment = payload.validate().inspect_err(|e| tracing::debug!("rejected comment: {}", e))?;
    let id = parse_id(&id)?;

    // Read-modify-write without a version check: concurrent appends to one book
    // are last-write-wins.
    let mut book = match state.books.find_by_id(id).await {
        Ok(Some(book)) => book,
        Ok(None) => return Err(BookError::NotFound),
        Err(e) => return Err(lookup_failed("find book for comment", e)),
    };

    book.add_comment(comment);

    match state.books.save(&book).await {
        Ok(true) => {
            tracing::info!(%id, comment_count = book.comment_count, "added comment");
            Ok(json_response(book.into_detail()))
        }
        Ok(false) => Err(BookError::NotFound),
        Err(e) => Err(lookup_failed("save comment", e)),
    }
}

pub async fn delete_book(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, BookError> {
    let id = parse_id(&id)?;

    match state.books.delete_by_id(id).await {
        Ok(Some(_)) => {
            tracing::info!(%id, "deleted book");
            Ok(text_response(DELETE_SUCCESSFUL))
        }
        Ok(None) => Err(BookError::NotFound),
        Err(e) => Err(lookup_failed("delete book", e)),
    }
}
