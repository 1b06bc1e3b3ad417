use actix_web::error::{JsonPayloadError, PathError};
use actix_web::web::{JsonConfig, PathConfig};
use actix_web::HttpRequest;
use paperclip::actix::web;

use crate::error::ApiError;
use crate::handlers;

pub fn config_app(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(handlers::health)))
        .service(web::resource("/bookList").route(web::get().to(handlers::list_books)))
        .service(web::resource("/saveBook").route(web::post().to(handlers::save_book)))
        .service(web::resource("/updateBook/{book_id}").route(web::put().to(handlers::update_book)))
        .service(
            web::resource("/deleteBook/{book_id}").route(web::delete().to(handlers::delete_book)),
        )
        .service(web::resource("/userList").route(web::get().to(handlers::list_persons)))
        .service(web::resource("/saveUser").route(web::post().to(handlers::save_person)))
        .service(
            web::resource("/updateUser/{user_id}").route(web::put().to(handlers::update_person)),
        )
        .service(
            web::resource("/deleteUser/{user_id}")
                .route(web::delete().to(handlers::delete_person)),
        )
        .service(
            web::resource("/reservationList").route(web::get().to(handlers::list_reservations)),
        )
        .service(
            web::resource("/makeReservation").route(web::post().to(handlers::make_reservation)),
        )
        .service(
            web::resource("/returnBook/{user_id}/{book_id}")
                .route(web::put().to(handlers::return_book)),
        )
        .service(web::resource("/login").route(web::post().to(handlers::login)))
        .service(web::resource("/logout").route(web::get().to(handlers::logout)))
        .service(web::resource("/checkAuth").route(web::get().to(handlers::check_auth)));
}

/// Malformed or mistyped JSON bodies are answered with 400 `{"error": ...}`
pub fn json_config() -> JsonConfig {
    JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        tracing::warn!("Rejected request body: {}", err);
        ApiError::Validation(err.to_string()).into()
    })
}

/// Path segments that do not parse as ids are answered with 404 `{"error": ...}`
pub fn path_config() -> PathConfig {
    PathConfig::default().error_handler(|err: PathError, _req: &HttpRequest| {
        ApiError::NotFound(err.to_string()).into()
    })
}
