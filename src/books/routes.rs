use axum::{
    Router,
    routing::{delete, get, post},
};

use super::handler;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/books", get(handler::list_books))
        .route("/books", post(handler::create_book))
        .route("/books", delete(handler::delete_all_books))
        .route("/books/:id", get(handler::get_book))
        .route("/books/:id", post(handler::add_comment))
        .route("/books/:id", delete(handler::delete_book))
}
