use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};

pub type BookId = i32;
pub type PersonId = i32;
pub type ReservationId = i32;

/// Seconds between a checkout and its due date
pub const LOAN_PERIOD_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Default, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(default)]
/// Struct representing details of the book, as sent when adding it
pub struct BookDetails {
    pub title: String,
    pub author: String,
    /// Number of copies available for reservation
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Book stored in the catalog together with its id
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub quantity: i32,
}

impl Book {
    pub fn new(id: BookId, details: BookDetails) -> Self {
        Self {
            id,
            title: details.title,
            author: details.author,
            quantity: details.quantity,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Body of the stock update, stock is required
pub struct StockUpdate {
    pub stock: Option<i32>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(default)]
pub struct PersonDetails {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub email: String,
}

impl Person {
    pub fn new(id: PersonId, details: PersonDetails) -> Self {
        Self {
            id,
            name: details.name,
            email: details.email,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Struct representing an update of person details. Both fields have to be present
pub struct PersonUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
/// Single checked out book inside of a reservation record
pub struct ReservationEntry {
    pub book_id: BookId,
    /// Unix timestamp (seconds) of the checkout
    pub date_of_reservation: i64,
    /// Unix timestamp (seconds) by which the book should be returned
    pub due_date: i64,
}

impl ReservationEntry {
    /// Creates entry for a checkout made at `now`, due after the loan period
    pub fn checked_out_at(book_id: BookId, now: i64) -> Self {
        Self {
            book_id,
            date_of_reservation: now,
            due_date: now + LOAN_PERIOD_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
/// Reservation record of a person. Every checkout creates a new record with a single entry,
/// returned entries are removed but the record itself stays
pub struct ReservationRecord {
    pub id: ReservationId,
    pub user_id: PersonId,
    pub reservations: Vec<ReservationEntry>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct MakeReservationRequest {
    pub user_id: Option<PersonId>,
    pub selected_books: Option<Vec<BookId>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub enum ReservationOutcome {
    Reserved,
    NotFound,
    OutOfStock,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
/// Result of reserving a single book from the requested list
pub struct BookReservationResult {
    pub book_id: BookId,
    pub outcome: ReservationOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<ReservationId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct MakeReservationResponse {
    pub message: String,
    pub results: Vec<BookReservationResult>,
}

impl MakeReservationResponse {
    pub fn from_results(results: Vec<BookReservationResult>) -> Self {
        let reserved = results
            .iter()
            .filter(|r| r.outcome == ReservationOutcome::Reserved)
            .count();
        let message = if reserved == results.len() {
            "Reservations made successfully."
        } else if reserved > 0 {
            "Some reservations could not be made."
        } else {
            "No reservations were made."
        };
        Self {
            message: message.to_string(),
            results,
        }
    }

    pub fn reserved_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome == ReservationOutcome::Reserved)
            .count()
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub is_logged_in: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Body of every non-success response
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod api_tests {
    use super::*;

    #[test]
    fn test_wire_format_uses_original_field_names() {
        let record = ReservationRecord {
            id: 3,
            user_id: 7,
            reservations: vec![ReservationEntry::checked_out_at(11, 1_000)],
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": 3,
                "userId": 7,
                "reservations": [{
                    "bookId": 11,
                    "dateOfReservation": 1_000,
                    "dueDate": 1_000 + LOAN_PERIOD_SECS,
                }]
            })
        );

        let request: MakeReservationRequest =
            serde_json::from_str(r#"{"userId": 1, "selectedBooks": [2, 3]}"#).unwrap();
        assert_eq!(request.user_id, Some(1));
        assert_eq!(request.selected_books, Some(vec![2, 3]));

        let status = serde_json::to_value(AuthStatus { is_logged_in: true }).unwrap();
        assert_eq!(status, serde_json::json!({"isLoggedIn": true}));
    }

    #[test]
    fn test_partial_book_details_fall_back_to_defaults() {
        let details: BookDetails = serde_json::from_str(r#"{"title": "T"}"#).unwrap();
        assert_eq!(
            details,
            BookDetails {
                title: "T".to_string(),
                author: "".to_string(),
                quantity: 0,
            }
        );
    }

    #[test]
    fn test_reservation_message_reflects_outcomes() {
        let result = |book_id, outcome| BookReservationResult {
            book_id,
            outcome,
            reservation_id: None,
        };

        let all = MakeReservationResponse::from_results(vec![
            result(1, ReservationOutcome::Reserved),
            result(2, ReservationOutcome::Reserved),
        ]);
        assert_eq!(all.message, "Reservations made successfully.");
        assert_eq!(all.reserved_count(), 2);

        let some = MakeReservationResponse::from_results(vec![
            result(1, ReservationOutcome::Reserved),
            result(2, ReservationOutcome::OutOfStock),
        ]);
        assert_eq!(some.message, "Some reservations could not be made.");

        let none = MakeReservationResponse::from_results(vec![result(
            1,
            ReservationOutcome::NotFound,
        )]);
        assert_eq!(none.message, "No reservations were made.");
        assert_eq!(none.reserved_count(), 0);

        let serialized = serde_json::to_value(&some.results[1]).unwrap();
        assert_eq!(
            serialized,
            serde_json::json!({"bookId": 2, "outcome": "outOfStock"})
        );
    }
}
