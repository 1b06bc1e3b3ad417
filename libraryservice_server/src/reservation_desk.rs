use std::sync::Arc;

use crate::api::{
    Book, BookId, BookReservationResult, MakeReservationRequest, MakeReservationResponse, PersonId,
    ReservationEntry, ReservationOutcome,
};
use crate::books_repository::{BooksRepository, BooksRepositoryError, CopyCheckout};
use crate::error::{ApiError, BOOK_STOCK_FULL, USER_NOT_FOUND};
use crate::persons_repository::{PersonsRepository, PersonsRepositoryError};
use crate::reservations_repository::{ReservationsRepository, ReturnedCheckout};
use crate::sessions::now_timestamp;

pub const INVALID_RESERVATION_INPUT: &str =
    "Invalid input. Please provide a valid user ID and selected books.";

/// Runs checkouts and returns over the books, persons and reservations repositories
pub struct ReservationDesk {
    books: Arc<dyn BooksRepository>,
    persons: Arc<dyn PersonsRepository>,
    reservations: Arc<dyn ReservationsRepository>,
}

impl ReservationDesk {
    pub fn new(
        books: Arc<dyn BooksRepository>,
        persons: Arc<dyn PersonsRepository>,
        reservations: Arc<dyn ReservationsRepository>,
    ) -> Self {
        Self {
            books,
            persons,
            reservations,
        }
    }

    pub async fn make_reservation(
        &self,
        request: MakeReservationRequest,
    ) -> Result<MakeReservationResponse, ApiError> {
        self.make_reservation_at(request, now_timestamp()).await
    }

    /// Reserves every selected book for the person independently, reporting the outcome per book.
    /// Nothing is changed if the input is invalid or the person does not exist
    pub async fn make_reservation_at(
        &self,
        request: MakeReservationRequest,
        now: i64,
    ) -> Result<MakeReservationResponse, ApiError> {
        let (user_id, selected_books) = match (request.user_id, request.selected_books) {
            (Some(user_id), Some(selected_books)) if !selected_books.is_empty() => {
                (user_id, selected_books)
            }
            _ => return Err(ApiError::validation(INVALID_RESERVATION_INPUT)),
        };

        match self.persons.get_person(user_id).await {
            Ok(_) => {}
            Err(PersonsRepositoryError::NotFound(_)) => {
                return Err(ApiError::not_found(USER_NOT_FOUND))
            }
            Err(err) => return Err(err.into()),
        }

        let mut results = Vec::with_capacity(selected_books.len());
        for book_id in selected_books {
            results.push(self.reserve_book(user_id, book_id, now).await);
        }

        let response = MakeReservationResponse::from_results(results);
        tracing::info!(
            user_id,
            requested = response.results.len(),
            reserved = response.reserved_count(),
            "Reservation request processed"
        );
        Ok(response)
    }

    async fn reserve_book(
        &self,
        user_id: PersonId,
        book_id: BookId,
        now: i64,
    ) -> BookReservationResult {
        let result = |outcome, reservation_id| BookReservationResult {
            book_id,
            outcome,
            reservation_id,
        };

        match self.books.take_copy(book_id).await {
            Ok(CopyCheckout::Taken) => {}
            Ok(CopyCheckout::OutOfStock) => {
                tracing::warn!(book_id, "Book out of stock");
                return result(ReservationOutcome::OutOfStock, None);
            }
            Err(BooksRepositoryError::NotFound(_)) => {
                tracing::warn!(book_id, "Book not found");
                return result(ReservationOutcome::NotFound, None);
            }
            Err(err) => {
                tracing::error!(book_id, "Failed to take copy of book: {}", err);
                return result(ReservationOutcome::Failed, None);
            }
        }

        match self
            .reservations
            .add_reservation(user_id, ReservationEntry::checked_out_at(book_id, now))
            .await
        {
            Ok(reservation_id) => result(ReservationOutcome::Reserved, Some(reservation_id)),
            Err(err) => {
                tracing::error!(book_id, user_id, "Failed to record reservation: {}", err);
                if let Err(err) = self.books.return_copy(book_id).await {
                    tracing::error!(book_id, "Failed to put back copy of book: {}", err);
                }
                result(ReservationOutcome::Failed, None)
            }
        }
    }

    /// Removes the checkout of the book from the person's reservations and puts the copy back.
    /// If the book was deleted in the meantime the checkout is removed anyway and not found is returned.
    /// If the stock of the book cannot grow any more the checkout is put back into the reservations
    pub async fn return_book(&self, user_id: PersonId, book_id: BookId) -> Result<Book, ApiError> {
        let checkout = self
            .reservations
            .remove_reservation(user_id, book_id)
            .await?;
        let reservation_id = checkout.reservation_id;

        match self.books.return_copy(book_id).await {
            Ok(book) => {
                tracing::info!(user_id, book_id, reservation_id, "Book returned");
                Ok(book)
            }
            Err(BooksRepositoryError::StockOverflow(_)) => {
                tracing::warn!(user_id, book_id, reservation_id, "Book stock is at its maximum");
                self.restore_checkout(user_id, checkout).await;
                Err(ApiError::validation(BOOK_STOCK_FULL))
            }
            Err(err) => {
                tracing::warn!(
                    user_id,
                    book_id,
                    reservation_id,
                    "Checkout removed but stock could not be restored: {}",
                    err
                );
                Err(err.into())
            }
        }
    }

    async fn restore_checkout(&self, user_id: PersonId, checkout: ReturnedCheckout) {
        for entry in checkout.entries {
            let book_id = entry.book_id;
            if let Err(err) = self.reservations.add_reservation(user_id, entry).await {
                tracing::error!(user_id, book_id, "Failed to put back checkout: {}", err);
            }
        }
    }
}
