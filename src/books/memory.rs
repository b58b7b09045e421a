use async_trait::async_trait;
use tokio::sync::RwLock;

use super::BookRepository;
use crate::error::StoreError;
use crate::model::{Book, BookId};

/// Process-local store. Records live as long as the repository does.
#[derive(Default)]
pub struct InMemoryBookRepository {
    books: RwLock<Vec<Book>>,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn insert(&self, title: &str) -> Result<BookId, StoreError> {
        let book = Book::new(BookId::generate(), title);
        let id = book.id;
        self.books.write().await.push(book);
        Ok(id)
    }

    async fn find_all(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.books.read().await.clone())
    }

    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        Ok(self.books.read().await.iter().find(|b| b.id == id).cloned())
    }

    async fn delete_by_id(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        let mut books = self.books.write().await;
        Ok(books.iter().position(|b| b.id == id).map(|idx| books.remove(idx)))
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let mut books = self.books.write().await;
        let removed = books.len() as u64;
        books.clear();
        Ok(removed)
    }

    async fn save(&self, book: &Book) -> Result<bool, StoreError> {
        let mut books = self.books.write().await;
        match books.iter_mut().find(|b| b.id == book.id) {
            Some(existing) => {
                *existing = book.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
