use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};

use serde_json::json;

use crate::api::{Book, BookDetails, BookId};
use crate::books_repository::{BooksRepository, BooksRepositoryError, CopyCheckout};

pub struct InMemoryBooksRepository {
    book_sequence_generator: AtomicI32,
    books: parking_lot::RwLock<HashMap<BookId, BookDetails>>,
}

impl Default for InMemoryBooksRepository {
    fn default() -> Self {
        Self {
            book_sequence_generator: AtomicI32::new(1),
            books: Default::default(),
        }
    }
}

#[async_trait::async_trait]
impl BooksRepository for InMemoryBooksRepository {
    async fn add_book(&self, details: BookDetails) -> Result<Book, BooksRepositoryError> {
        let id = self.book_sequence_generator.fetch_add(1, Ordering::Relaxed);
        self.books.write().insert(id, details.clone());
        Ok(Book::new(id, details))
    }

    async fn get_book(&self, book_id: BookId) -> Result<Book, BooksRepositoryError> {
        self.books
            .read()
            .get(&book_id)
            .cloned()
            .map(|details| Book::new(book_id, details))
            .ok_or(BooksRepositoryError::NotFound(book_id))
    }

    async fn list_books(&self) -> Result<Vec<Book>, BooksRepositoryError> {
        let mut books: Vec<Book> = self
            .books
            .read()
            .iter()
            .map(|(&book_id, details)| Book::new(book_id, details.clone()))
            .collect();
        books.sort_by_key(|book| book.id);
        Ok(books)
    }

    async fn set_stock(&self, book_id: BookId, stock: i32) -> Result<Book, BooksRepositoryError> {
        let mut locked_books = self.books.write();
        let book = locked_books
            .get_mut(&book_id)
            .ok_or(BooksRepositoryError::NotFound(book_id))?;
        let mut result_book = json!(book);
        json_patch::merge(&mut result_book, &json!({ "quantity": stock }));
        *book = serde_json::from_value(result_book)?;
        Ok(Book::new(book_id, book.clone()))
    }

    async fn delete_book(&self, book_id: BookId) -> Result<bool, BooksRepositoryError> {
        Ok(self.books.write().remove(&book_id).is_some())
    }

    async fn take_copy(&self, book_id: BookId) -> Result<CopyCheckout, BooksRepositoryError> {
        let mut locked_books = self.books.write();
        let book = locked_books
            .get_mut(&book_id)
            .ok_or(BooksRepositoryError::NotFound(book_id))?;
        if book.quantity > 0 {
            book.quantity -= 1;
            Ok(CopyCheckout::Taken)
        } else {
            Ok(CopyCheckout::OutOfStock)
        }
    }

    async fn return_copy(&self, book_id: BookId) -> Result<Book, BooksRepositoryError> {
        let mut locked_books = self.books.write();
        let book = locked_books
            .get_mut(&book_id)
            .ok_or(BooksRepositoryError::NotFound(book_id))?;
        book.quantity = book
            .quantity
            .checked_add(1)
            .ok_or(BooksRepositoryError::StockOverflow(book_id))?;
        Ok(Book::new(book_id, book.clone()))
    }
}

#[cfg(test)]
mod in_memory_books_repository_tests {
    use crate::api::{Book, BookDetails};
    use crate::books_repository::{
        BooksRepository, BooksRepositoryError, CopyCheckout, InMemoryBooksRepository,
    };

    fn book_details(title: &str, quantity: i32) -> BookDetails {
        BookDetails {
            title: title.to_string(),
            author: "author".to_string(),
            quantity,
        }
    }

    #[tokio::test]
    /// Tests if add_book, get_book and list_books work correctly
    async fn test_add_books_and_list_them() {
        let repo = InMemoryBooksRepository::default();

        assert_eq!(repo.list_books().await.unwrap(), vec![]);
        assert!(matches!(
            repo.get_book(20000).await,
            Err(BooksRepositoryError::NotFound(20000))
        ));

        let book1 = repo.add_book(book_details("title1", 2)).await.unwrap();
        let book2 = repo.add_book(book_details("title2", 0)).await.unwrap();
        assert_ne!(book1.id, book2.id);

        assert_eq!(repo.get_book(book1.id).await.unwrap(), book1);
        assert_eq!(repo.list_books().await.unwrap(), vec![book1, book2]);
    }

    #[tokio::test]
    /// Tests stock editing, deleting and error on unknown ids
    async fn test_set_stock_and_delete() {
        let repo = InMemoryBooksRepository::default();
        assert!(matches!(
            repo.set_stock(2000, 3).await,
            Err(BooksRepositoryError::NotFound(..))
        ));

        let book = repo.add_book(book_details("xx", 1)).await.unwrap();
        let updated = repo.set_stock(book.id, 9).await.unwrap();
        assert_eq!(
            updated,
            Book {
                quantity: 9,
                ..book.clone()
            }
        );
        assert_eq!(repo.get_book(book.id).await.unwrap().quantity, 9);

        assert!(repo.delete_book(book.id).await.unwrap());
        // deleting again is not an error, it just reports nothing was removed
        assert!(!repo.delete_book(book.id).await.unwrap());
    }

    #[tokio::test]
    /// Takes copies until the shelf is empty and puts one back
    async fn test_take_and_return_copies() {
        let repo = InMemoryBooksRepository::default();
        let book = repo.add_book(book_details("xx", 2)).await.unwrap();

        assert_eq!(repo.take_copy(book.id).await.unwrap(), CopyCheckout::Taken);
        assert_eq!(repo.take_copy(book.id).await.unwrap(), CopyCheckout::Taken);
        assert_eq!(
            repo.take_copy(book.id).await.unwrap(),
            CopyCheckout::OutOfStock
        );
        assert_eq!(repo.get_book(book.id).await.unwrap().quantity, 0);

        assert_eq!(repo.return_copy(book.id).await.unwrap().quantity, 1);
        assert!(matches!(
            repo.take_copy(book.id + 100).await,
            Err(BooksRepositoryError::NotFound(..))
        ));
        assert!(matches!(
            repo.return_copy(book.id + 100).await,
            Err(BooksRepositoryError::NotFound(..))
        ));
    }

    #[tokio::test]
    async fn test_return_copy_at_max_stock_is_rejected() {
        let repo = InMemoryBooksRepository::default();
        let book = repo.add_book(book_details("xx", 1)).await.unwrap();
        repo.set_stock(book.id, i32::MAX).await.unwrap();

        assert!(matches!(
            repo.return_copy(book.id).await,
            Err(BooksRepositoryError::StockOverflow(id)) if id == book.id
        ));
        assert_eq!(repo.get_book(book.id).await.unwrap().quantity, i32::MAX);

        repo.set_stock(book.id, i32::MAX - 1).await.unwrap();
        assert_eq!(repo.return_copy(book.id).await.unwrap().quantity, i32::MAX);
    }
}
