use anyhow::{bail, Context};
use reqwest::Response;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use serde::de::DeserializeOwned;

use crate::api::{
    AuthStatus, Book, BookDetails, BookId, ErrorResponse, LoginRequest, LoginResponse,
    MakeReservationRequest, MakeReservationResponse, MessageResponse, Person, PersonDetails,
    PersonId, PersonUpdate, ReservationRecord, StockUpdate,
};

/// HTTP client for the library service. Keeps the session cookie set by `login`
/// and sends it on every following request
pub struct LibraryServiceClient {
    url: String,
    client: ClientWithMiddleware,
}

impl LibraryServiceClient {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .context("Failed to build reqwest client")?;
        let client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Calls POST /login
    pub async fn login(&self, username: &str, password: &str) -> anyhow::Result<LoginResponse> {
        let response = self
            .client
            .post(format!("{}/login", self.url))
            .json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        parse_response(response, "Failed to log in").await
    }

    /// Calls GET /logout
    pub async fn logout(&self) -> anyhow::Result<LoginResponse> {
        let response = self
            .client
            .get(format!("{}/logout", self.url))
            .send()
            .await?;
        parse_response(response, "Failed to log out").await
    }

    /// Calls GET /checkAuth
    pub async fn check_auth(&self) -> anyhow::Result<bool> {
        let response = self
            .client
            .get(format!("{}/checkAuth", self.url))
            .send()
            .await?;
        let status: AuthStatus = parse_response(response, "Failed to check session").await?;
        Ok(status.is_logged_in)
    }

    /// Calls GET /bookList
    pub async fn list_books(&self) -> anyhow::Result<Vec<Book>> {
        let response = self
            .client
            .get(format!("{}/bookList", self.url))
            .send()
            .await?;
        parse_response(response, "Failed to list books").await
    }

    /// Calls POST /saveBook
    pub async fn save_book(&self, details: &BookDetails) -> anyhow::Result<Book> {
        let response = self
            .client
            .post(format!("{}/saveBook", self.url))
            .json(details)
            .send()
            .await?;
        parse_response(response, "Failed to save book").await
    }

    /// Calls PUT /updateBook/{book_id}, setting the stock of the book
    pub async fn update_book(&self, book_id: BookId, stock: i32) -> anyhow::Result<Book> {
        let response = self
            .client
            .put(format!("{}/updateBook/{}", self.url, book_id))
            .json(&StockUpdate { stock: Some(stock) })
            .send()
            .await?;
        parse_response(response, "Failed to update book").await
    }

    /// Calls DELETE /deleteBook/{book_id}
    pub async fn delete_book(&self, book_id: BookId) -> anyhow::Result<MessageResponse> {
        let response = self
            .client
            .delete(format!("{}/deleteBook/{}", self.url, book_id))
            .send()
            .await?;
        parse_response(response, "Failed to delete book").await
    }

    /// Calls GET /userList
    pub async fn list_persons(&self) -> anyhow::Result<Vec<Person>> {
        let response = self
            .client
            .get(format!("{}/userList", self.url))
            .send()
            .await?;
        parse_response(response, "Failed to list persons").await
    }

    /// Calls POST /saveUser
    pub async fn save_person(&self, details: &PersonDetails) -> anyhow::Result<Person> {
        let response = self
            .client
            .post(format!("{}/saveUser", self.url))
            .json(details)
            .send()
            .await?;
        parse_response(response, "Failed to save person").await
    }

    /// Calls PUT /updateUser/{user_id}
    pub async fn update_person(
        &self,
        person_id: PersonId,
        details: &PersonDetails,
    ) -> anyhow::Result<Person> {
        let response = self
            .client
            .put(format!("{}/updateUser/{}", self.url, person_id))
            .json(&PersonUpdate {
                name: Some(details.name.clone()),
                email: Some(details.email.clone()),
            })
            .send()
            .await?;
        parse_response(response, "Failed to update person").await
    }

    /// Calls DELETE /deleteUser/{user_id}
    pub async fn delete_person(&self, person_id: PersonId) -> anyhow::Result<MessageResponse> {
        let response = self
            .client
            .delete(format!("{}/deleteUser/{}", self.url, person_id))
            .send()
            .await?;
        parse_response(response, "Failed to delete person").await
    }

    /// Calls GET /reservationList
    pub async fn list_reservations(&self) -> anyhow::Result<Vec<ReservationRecord>> {
        let response = self
            .client
            .get(format!("{}/reservationList", self.url))
            .send()
            .await?;
        parse_response(response, "Failed to list reservations").await
    }

    /// Calls POST /makeReservation
    /// Books that could not be reserved are reported in the per book results, not as an error
    pub async fn make_reservation(
        &self,
        person_id: PersonId,
        book_ids: &[BookId],
    ) -> anyhow::Result<MakeReservationResponse> {
        let response = self
            .client
            .post(format!("{}/makeReservation", self.url))
            .json(&MakeReservationRequest {
                user_id: Some(person_id),
                selected_books: Some(book_ids.to_vec()),
            })
            .send()
            .await?;
        parse_response(response, "Failed to make reservation").await
    }

    /// Calls PUT /returnBook/{user_id}/{book_id}
    pub async fn return_book(
        &self,
        person_id: PersonId,
        book_id: BookId,
    ) -> anyhow::Result<MessageResponse> {
        let response = self
            .client
            .put(format!("{}/returnBook/{}/{}", self.url, person_id, book_id))
            .send()
            .await?;
        parse_response(response, "Failed to return book").await
    }
}

async fn parse_response<T: DeserializeOwned>(response: Response, failure: &str) -> anyhow::Result<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .with_context(|| format!("{}: invalid response body", failure));
    }
    let error = response
        .json::<ErrorResponse>()
        .await
        .map(|body| body.error)
        .unwrap_or_default();
    bail!("{} ({}): {}", failure, status, error)
}

/// Books whose title, author or id contains `query`, ignoring case. An empty query matches all
pub fn filter_books<'a>(books: &'a [Book], query: &str) -> Vec<&'a Book> {
    let query = query.trim().to_lowercase();
    books
        .iter()
        .filter(|book| {
            query.is_empty()
                || book.title.to_lowercase().contains(&query)
                || book.author.to_lowercase().contains(&query)
                || book.id.to_string().contains(&query)
        })
        .collect()
}

/// Persons whose name, email or id contains `query`, ignoring case. An empty query matches all
pub fn filter_persons<'a>(persons: &'a [Person], query: &str) -> Vec<&'a Person> {
    let query = query.trim().to_lowercase();
    persons
        .iter()
        .filter(|person| {
            query.is_empty()
                || person.name.to_lowercase().contains(&query)
                || person.email.to_lowercase().contains(&query)
                || person.id.to_string().contains(&query)
        })
        .collect()
}

#[cfg(test)]
mod client_tests {
    use super::*;

    fn books() -> Vec<Book> {
        vec![
            Book::new(
                1,
                BookDetails {
                    title: "Dune".to_string(),
                    author: "Frank Herbert".to_string(),
                    quantity: 2,
                },
            ),
            Book::new(
                12,
                BookDetails {
                    title: "Hyperion".to_string(),
                    author: "Dan Simmons".to_string(),
                    quantity: 0,
                },
            ),
        ]
    }

    #[test]
    fn test_filter_books_matches_title_author_and_id() {
        let books = books();
        let titles = |query: &str| {
            filter_books(&books, query)
                .into_iter()
                .map(|book| book.title.as_str())
                .collect::<Vec<_>>()
        };

        assert_eq!(titles(""), vec!["Dune", "Hyperion"]);
        assert_eq!(titles("dUNe"), vec!["Dune"]);
        assert_eq!(titles("simmons"), vec!["Hyperion"]);
        assert_eq!(titles("1"), vec!["Dune", "Hyperion"]);
        assert_eq!(titles("12"), vec!["Hyperion"]);
        assert!(titles("tolkien").is_empty());
    }

    #[test]
    fn test_filter_persons_matches_name_and_email() {
        let persons = vec![
            Person::new(
                3,
                PersonDetails {
                    name: "Person x".to_string(),
                    email: "x@gmail.com".to_string(),
                },
            ),
            Person::new(
                4,
                PersonDetails {
                    name: "Someone".to_string(),
                    email: "someone@Library.org".to_string(),
                },
            ),
        ];

        let ids = |query: &str| {
            filter_persons(&persons, query)
                .into_iter()
                .map(|person| person.id)
                .collect::<Vec<_>>()
        };
        assert_eq!(ids("PERSON"), vec![3]);
        assert_eq!(ids("library.org"), vec![4]);
        assert_eq!(ids("4"), vec![4]);
        assert_eq!(ids(" "), vec![3, 4]);
    }

    #[test]
    fn test_trailing_slash_is_dropped_from_url() {
        let client = LibraryServiceClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.url, "http://localhost:8080");
    }
}
