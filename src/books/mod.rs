//! Books Module
//!
//! A collection of book records, each holding a title and an append-only list of
//! comments, exposed over HTTP and persisted through a [`BookRepository`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use bokhylla::books::{self, LibsqlBookRepository};
//!
//! let repo = Arc::new(LibsqlBookRepository::new(db));
//! let app = Router::new()
//!     .nest("/api", books::routes())
//!     .with_state(AppState::new(repo));
//! ```

mod handler;
mod memory;
mod repository;
mod routes;

pub use handler::{COMPLETE_DELETE_SUCCESSFUL, DELETE_SUCCESSFUL};
pub use memory::InMemoryBookRepository;
pub use repository::{BookRepository, LibsqlBookRepository};
pub use routes::routes;
