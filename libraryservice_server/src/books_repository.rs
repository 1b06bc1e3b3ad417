pub use in_memory_books_repository::InMemoryBooksRepository;
pub use postgres_books_repository::PostgresBooksRepository;

use crate::api::{Book, BookDetails, BookId};

mod in_memory_books_repository;
mod postgres_books_repository;

#[derive(thiserror::Error, Debug)]
pub enum BooksRepositoryError {
    #[error("Book {0} not found")]
    NotFound(BookId),

    #[error("Stock of book {0} is at its maximum")]
    StockOverflow(BookId),

    #[error("Failed to deserialize book: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Other error {0}")]
    Other(String),
}

/// Result of trying to take a single copy of a book off the shelf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyCheckout {
    /// Quantity was positive and has been decremented by one
    Taken,
    /// Quantity was zero, nothing changed
    OutOfStock,
}

#[async_trait::async_trait]
pub trait BooksRepository: Send + Sync {
    /// Adds book to repository, returns the stored book with its assigned id
    async fn add_book(&self, details: BookDetails) -> Result<Book, BooksRepositoryError>;
    /// Retrieves the book from repository
    async fn get_book(&self, book_id: BookId) -> Result<Book, BooksRepositoryError>;
    /// Lists all books in the repository ordered by id
    async fn list_books(&self) -> Result<Vec<Book>, BooksRepositoryError>;
    /// Overwrites the quantity of the book, returns the updated book
    async fn set_stock(&self, book_id: BookId, stock: i32) -> Result<Book, BooksRepositoryError>;
    /// Deletes the book, returns false if there was nothing to delete
    async fn delete_book(&self, book_id: BookId) -> Result<bool, BooksRepositoryError>;
    /// Decrements quantity by one only if it is positive. Check and decrement are a single atomic step
    async fn take_copy(&self, book_id: BookId) -> Result<CopyCheckout, BooksRepositoryError>;
    /// Increments quantity by one, returns the updated book.
    /// Fails with `StockOverflow` and leaves the book unchanged if the quantity cannot grow
    async fn return_copy(&self, book_id: BookId) -> Result<Book, BooksRepositoryError>;
}
