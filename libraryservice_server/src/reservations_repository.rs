pub use in_memory_reservations_repository::InMemoryReservationsRepository;
pub use postgres_reservations_repository::PostgresReservationsRepository;

use crate::api::{BookId, PersonId, ReservationEntry, ReservationId, ReservationRecord};

mod in_memory_reservations_repository;
mod postgres_reservations_repository;

#[derive(Debug, thiserror::Error)]
pub enum ReservationsRepositoryError {
    #[error("Book {book_id} is not reserved by person {user_id}")]
    ReservationNotFound { user_id: PersonId, book_id: BookId },

    #[error("Failed to deserialize reservation: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Other error {0}")]
    Other(String),
}

/// Entries taken out of a record by a return
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnedCheckout {
    pub reservation_id: ReservationId,
    pub entries: Vec<ReservationEntry>,
}

#[async_trait::async_trait]
pub trait ReservationsRepository: Send + Sync {
    /// Stores a new record of the person holding exactly one entry
    async fn add_reservation(
        &self,
        user_id: PersonId,
        entry: ReservationEntry,
    ) -> Result<ReservationId, ReservationsRepositoryError>;

    /// Removes the entries of the book from the first record of the person that holds it.
    /// The record is kept even if no entries are left
    async fn remove_reservation(
        &self,
        user_id: PersonId,
        book_id: BookId,
    ) -> Result<ReturnedCheckout, ReservationsRepositoryError>;

    /// Lists all records ordered by id, including the ones with no entries left
    async fn list_reservations(&self) -> Result<Vec<ReservationRecord>, ReservationsRepositoryError>;
}
