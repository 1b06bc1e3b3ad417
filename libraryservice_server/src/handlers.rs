use std::sync::Arc;

use actix_web::web::Data;
use actix_web::{Error, HttpRequest, HttpResponse};
use paperclip::actix::{api_v2_operation, web, Apiv2Schema};
use serde::Deserialize;

use crate::admins_repository::AdminsRepository;
use crate::api::{
    AuthStatus, BookDetails, BookId, LoginRequest, LoginResponse, MakeReservationRequest,
    MessageResponse, PersonDetails, PersonId, PersonUpdate, StockUpdate,
};
use crate::auth::authenticate;
use crate::books_repository::BooksRepository;
use crate::error::ApiError;
use crate::persons_repository::PersonsRepository;
use crate::reservation_desk::ReservationDesk;
use crate::reservations_repository::ReservationsRepository;
use crate::sessions::{now_timestamp, session_tokens, AdminSession, SessionCookie, SessionStore};

const STOCK_REQUIRED: &str = "Invalid update. Stock parameter is required.";
const NEGATIVE_QUANTITY: &str = "Invalid book. Quantity cannot be negative.";
const PERSON_FIELDS_REQUIRED: &str = "Invalid update. All user parameters required.";
const INVALID_CREDENTIALS: &str = "Incorrect username or password";

#[derive(Debug, Deserialize, Apiv2Schema)]
pub struct ReturnBookPath {
    pub user_id: PersonId,
    pub book_id: BookId,
}

#[api_v2_operation]
pub async fn health() -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().finish())
}

#[api_v2_operation]
pub async fn list_books(
    books_repository: Data<Arc<dyn BooksRepository>>,
) -> Result<HttpResponse, Error> {
    let books = books_repository
        .list_books()
        .await
        .map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(books))
}

#[api_v2_operation]
pub async fn save_book(
    admin: AdminSession,
    books_repository: Data<Arc<dyn BooksRepository>>,
    details: web::Json<BookDetails>,
) -> Result<HttpResponse, Error> {
    let details = details.into_inner();
    if details.quantity < 0 {
        return Err(ApiError::validation(NEGATIVE_QUANTITY).into());
    }
    let book = books_repository
        .add_book(details)
        .await
        .map_err(ApiError::from)?;
    tracing::info!(book_id = book.id, admin = %admin.username, "Book saved");
    Ok(HttpResponse::Ok().json(book))
}

#[api_v2_operation]
pub async fn update_book(
    _admin: AdminSession,
    books_repository: Data<Arc<dyn BooksRepository>>,
    book_id: web::Path<BookId>,
    update: web::Json<StockUpdate>,
) -> Result<HttpResponse, Error> {
    let stock = update
        .into_inner()
        .stock
        .ok_or_else(|| ApiError::validation(STOCK_REQUIRED))?;
    if stock < 0 {
        return Err(ApiError::validation(NEGATIVE_QUANTITY).into());
    }
    let book = books_repository
        .set_stock(book_id.into_inner(), stock)
        .await
        .map_err(ApiError::from)?;
    tracing::info!(book_id = book.id, stock, "Book stock updated");
    Ok(HttpResponse::Ok().json(book))
}

#[api_v2_operation]
pub async fn delete_book(
    _admin: AdminSession,
    books_repository: Data<Arc<dyn BooksRepository>>,
    book_id: web::Path<BookId>,
) -> Result<HttpResponse, Error> {
    let book_id = book_id.into_inner();
    let deleted = books_repository
        .delete_book(book_id)
        .await
        .map_err(ApiError::from)?;
    tracing::info!(book_id, deleted, "Delete book processed");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Book deleted")))
}

#[api_v2_operation]
pub async fn list_persons(
    _admin: AdminSession,
    persons_repository: Data<Arc<dyn PersonsRepository>>,
) -> Result<HttpResponse, Error> {
    let persons = persons_repository
        .list_persons()
        .await
        .map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(persons))
}

#[api_v2_operation]
pub async fn save_person(
    _admin: AdminSession,
    persons_repository: Data<Arc<dyn PersonsRepository>>,
    details: web::Json<PersonDetails>,
) -> Result<HttpResponse, Error> {
    let person = persons_repository
        .add_person(details.into_inner())
        .await
        .map_err(ApiError::from)?;
    tracing::info!(person_id = person.id, "Person saved");
    Ok(HttpResponse::Ok().json(person))
}

#[api_v2_operation]
pub async fn update_person(
    _admin: AdminSession,
    persons_repository: Data<Arc<dyn PersonsRepository>>,
    person_id: web::Path<PersonId>,
    update: web::Json<PersonUpdate>,
) -> Result<HttpResponse, Error> {
    let details = match update.into_inner() {
        PersonUpdate {
            name: Some(name),
            email: Some(email),
        } => PersonDetails { name, email },
        _ => return Err(ApiError::validation(PERSON_FIELDS_REQUIRED).into()),
    };
    let person = persons_repository
        .update_person(person_id.into_inner(), details)
        .await
        .map_err(ApiError::from)?;
    tracing::info!(person_id = person.id, "Person details updated");
    Ok(HttpResponse::Ok().json(person))
}

#[api_v2_operation]
pub async fn delete_person(
    _admin: AdminSession,
    persons_repository: Data<Arc<dyn PersonsRepository>>,
    person_id: web::Path<PersonId>,
) -> Result<HttpResponse, Error> {
    let person_id = person_id.into_inner();
    let deleted = persons_repository
        .delete_person(person_id)
        .await
        .map_err(ApiError::from)?;
    tracing::info!(person_id, deleted, "Delete person processed");
    Ok(HttpResponse::Ok().json(MessageResponse::new("User deleted")))
}

#[api_v2_operation]
pub async fn list_reservations(
    _admin: AdminSession,
    reservations_repository: Data<Arc<dyn ReservationsRepository>>,
) -> Result<HttpResponse, Error> {
    let reservations = reservations_repository
        .list_reservations()
        .await
        .map_err(ApiError::from)?;
    Ok(HttpResponse::Ok().json(reservations))
}

#[api_v2_operation]
pub async fn make_reservation(
    _admin: AdminSession,
    desk: Data<ReservationDesk>,
    request: web::Json<MakeReservationRequest>,
) -> Result<HttpResponse, Error> {
    let response = desk.make_reservation(request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[api_v2_operation]
pub async fn return_book(
    _admin: AdminSession,
    desk: Data<ReservationDesk>,
    path: web::Path<ReturnBookPath>,
) -> Result<HttpResponse, Error> {
    let ReturnBookPath { user_id, book_id } = path.into_inner();
    desk.return_book(user_id, book_id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Book returned successfully.")))
}

#[api_v2_operation]
pub async fn login(
    admins_repository: Data<Arc<dyn AdminsRepository>>,
    sessions: Data<Arc<dyn SessionStore>>,
    session_cookie: Data<SessionCookie>,
    credentials: web::Json<LoginRequest>,
) -> Result<HttpResponse, Error> {
    let LoginRequest { username, password } = credentials.into_inner();
    let admin = authenticate(admins_repository.get_ref().as_ref(), &username, &password)
        .await
        .map_err(ApiError::from)?;

    let Some(admin) = admin else {
        tracing::warn!(username = %username, "Failed login attempt");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS).into());
    };

    let session = sessions.open(&admin.username, now_timestamp());
    tracing::info!(username = %admin.username, "Admin logged in");
    Ok(HttpResponse::Ok()
        .cookie(session_cookie.for_session(&session))
        .json(LoginResponse {
            success: true,
            message: "Login successful".to_string(),
        }))
}

#[api_v2_operation]
pub async fn logout(
    req: HttpRequest,
    sessions: Data<Arc<dyn SessionStore>>,
    session_cookie: Data<SessionCookie>,
) -> Result<HttpResponse, Error> {
    for token in session_tokens(&req) {
        if sessions.close(&token) {
            tracing::info!("Logging out...");
        }
    }
    Ok(HttpResponse::Ok()
        .cookie(session_cookie.removal())
        .json(LoginResponse {
            success: true,
            message: "Admin logout successful".to_string(),
        }))
}

#[api_v2_operation]
pub async fn check_auth(req: HttpRequest) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(AuthStatus {
        is_logged_in: AdminSession::from_http_request(&req).is_ok(),
    }))
}
