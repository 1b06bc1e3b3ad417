use serde_json::json;
use tokio_postgres::{Client, Row, Statement};

use crate::api::{Book, BookDetails, BookId};
use crate::books_repository::{BooksRepository, BooksRepositoryError, CopyCheckout};
use crate::postgres::{connect, PostgresConfig};

const BOOKS_SCHEMA: &str = "
        CREATE TABLE IF NOT EXISTS books (
            id              SERIAL PRIMARY KEY,
            params          JSONB NOT NULL
            )
        ";

pub struct PostgresBooksRepository {
    client: Client,
}

impl PostgresBooksRepository {
    pub async fn init(config: PostgresConfig) -> anyhow::Result<Self> {
        let client = connect(&config, BOOKS_SCHEMA).await?;
        Ok(Self { client })
    }

    async fn book_exists(&self, book_id: BookId) -> Result<bool, BooksRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT id FROM books WHERE id = ($1)")
            .await?;
        Ok(!self.client.query(&stmt, &[&book_id]).await?.is_empty())
    }
}

fn book_from_row(row: &Row) -> Result<Book, BooksRepositoryError> {
    let book_id: BookId = row.try_get(0)?;
    let details: serde_json::Value = row.try_get(1)?;
    let details: BookDetails = serde_json::from_value(details)?;
    Ok(Book::new(book_id, details))
}

#[async_trait::async_trait]
impl BooksRepository for PostgresBooksRepository {
    async fn add_book(&self, details: BookDetails) -> Result<Book, BooksRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("INSERT INTO books (params) VALUES ($1) RETURNING id")
            .await?;

        let rows = self.client.query(&stmt, &[&json!(details)]).await?;

        let book_id: BookId = rows
            .first()
            .ok_or_else(|| BooksRepositoryError::Other("Id not returned".to_string()))?
            .try_get(0)?;

        Ok(Book::new(book_id, details))
    }

    async fn get_book(&self, book_id: BookId) -> Result<Book, BooksRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT id, params FROM books WHERE id = ($1)")
            .await?;

        let rows = self.client.query(&stmt, &[&book_id]).await?;

        book_from_row(
            rows.first()
                .ok_or(BooksRepositoryError::NotFound(book_id))?,
        )
    }

    async fn list_books(&self) -> Result<Vec<Book>, BooksRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT id, params FROM books ORDER BY id")
            .await?;

        let rows = self.client.query(&stmt, &[]).await?;

        rows.iter().map(book_from_row).collect()
    }

    async fn set_stock(&self, book_id: BookId, stock: i32) -> Result<Book, BooksRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(
                "UPDATE books SET params = params || ($1)::JSONB WHERE id = ($2) RETURNING id, params",
            )
            .await?;

        let rows = self
            .client
            .query(&stmt, &[&json!({ "quantity": stock }), &book_id])
            .await?;

        book_from_row(
            rows.first()
                .ok_or(BooksRepositoryError::NotFound(book_id))?,
        )
    }

    async fn delete_book(&self, book_id: BookId) -> Result<bool, BooksRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("DELETE FROM books WHERE id = ($1) RETURNING id")
            .await?;

        let rows = self.client.query(&stmt, &[&book_id]).await?;
        Ok(!rows.is_empty())
    }

    async fn take_copy(&self, book_id: BookId) -> Result<CopyCheckout, BooksRepositoryError> {
        // The WHERE clause is re-checked against the latest row version by concurrent updates,
        // so two checkouts of the last copy cannot both match
        let stmt: Statement = self
            .client
            .prepare(
                "UPDATE books
                 SET params = jsonb_set(params, '{quantity}', to_jsonb((params->>'quantity')::INTEGER - 1))
                 WHERE id = ($1) AND (params->>'quantity')::INTEGER > 0
                 RETURNING id",
            )
            .await?;

        let rows = self.client.query(&stmt, &[&book_id]).await?;

        if !rows.is_empty() {
            Ok(CopyCheckout::Taken)
        } else if self.book_exists(book_id).await? {
            Ok(CopyCheckout::OutOfStock)
        } else {
            Err(BooksRepositoryError::NotFound(book_id))
        }
    }

    async fn return_copy(&self, book_id: BookId) -> Result<Book, BooksRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(
                "UPDATE books
                 SET params = jsonb_set(params, '{quantity}', to_jsonb(COALESCE((params->>'quantity')::INTEGER, 0) + 1))
                 WHERE id = ($1) AND COALESCE((params->>'quantity')::INTEGER, 0) < 2147483647
                 RETURNING id, params",
            )
            .await?;

        let rows = self.client.query(&stmt, &[&book_id]).await?;

        match rows.first() {
            Some(row) => book_from_row(row),
            None if self.book_exists(book_id).await? => {
                Err(BooksRepositoryError::StockOverflow(book_id))
            }
            None => Err(BooksRepositoryError::NotFound(book_id)),
        }
    }
}

#[cfg(test)]
mod postgres_books_repository_tests {
    use serial_test::file_serial;

    use crate::api::{Book, BookDetails};
    use crate::books_repository::{
        BooksRepository, BooksRepositoryError, CopyCheckout, PostgresBooksRepository,
    };
    use crate::postgres::test_support::start_postgres_container_and_init;

    fn book_details(title: &str, quantity: i32) -> BookDetails {
        BookDetails {
            title: title.to_string(),
            author: "author".to_string(),
            quantity,
        }
    }

    #[tokio::test]
    #[file_serial(key, path => "../.pgtestslock")]
    /// Tests adding, listing, stock edits and deletes
    /// for the sake of not starting container multiple times it tests everything in one testcase
    async fn test_book_management() {
        let (_container, repo) =
            start_postgres_container_and_init(PostgresBooksRepository::init).await;

        assert_eq!(repo.list_books().await.unwrap(), vec![]);
        assert!(matches!(
            repo.get_book(20000).await,
            Err(BooksRepositoryError::NotFound(..))
        ));
        assert!(matches!(
            repo.set_stock(20000, 1).await,
            Err(BooksRepositoryError::NotFound(..))
        ));

        let book1 = repo.add_book(book_details("title1", 1)).await.unwrap();
        let book2 = repo.add_book(book_details("title2", 4)).await.unwrap();

        assert_eq!(repo.get_book(book1.id).await.unwrap(), book1);
        assert_eq!(
            repo.list_books().await.unwrap(),
            vec![book1.clone(), book2.clone()]
        );

        let updated = repo.set_stock(book2.id, 7).await.unwrap();
        assert_eq!(
            updated,
            Book {
                quantity: 7,
                ..book2.clone()
            }
        );
        assert_eq!(repo.get_book(book2.id).await.unwrap(), updated);

        assert!(repo.delete_book(book2.id).await.unwrap());
        assert!(!repo.delete_book(book2.id).await.unwrap());
        assert_eq!(repo.list_books().await.unwrap(), vec![book1]);
    }

    #[tokio::test]
    #[file_serial(key, path => "../.pgtestslock")]
    /// Takes copies concurrently, only as many succeed as there were on the shelf
    async fn test_take_copy_never_goes_below_zero() {
        let (_container, repo) =
            start_postgres_container_and_init(PostgresBooksRepository::init).await;
        let book = repo.add_book(book_details("scarce", 3)).await.unwrap();

        let attempts =
            futures_util::future::join_all((0..10).map(|_| repo.take_copy(book.id))).await;
        let taken = attempts
            .into_iter()
            .filter(|attempt| matches!(attempt, Ok(CopyCheckout::Taken)))
            .count();

        assert_eq!(taken, 3);
        assert_eq!(repo.get_book(book.id).await.unwrap().quantity, 0);
        assert_eq!(
            repo.take_copy(book.id).await.unwrap(),
            CopyCheckout::OutOfStock
        );

        assert_eq!(repo.return_copy(book.id).await.unwrap().quantity, 1);
        assert!(matches!(
            repo.take_copy(book.id + 1000).await,
            Err(BooksRepositoryError::NotFound(..))
        ));
        assert!(matches!(
            repo.return_copy(book.id + 1000).await,
            Err(BooksRepositoryError::NotFound(..))
        ));

        repo.set_stock(book.id, i32::MAX).await.unwrap();
        assert!(matches!(
            repo.return_copy(book.id).await,
            Err(BooksRepositoryError::StockOverflow(..))
        ));
        assert_eq!(repo.get_book(book.id).await.unwrap().quantity, i32::MAX);
    }
}
