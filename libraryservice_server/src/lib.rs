pub mod api;

#[cfg(any(feature = "client", test))]
pub mod client;

#[cfg(any(feature = "server", test))]
pub mod admins_repository;

#[cfg(any(feature = "server", test))]
pub mod app_config;

#[cfg(any(feature = "server", test))]
pub mod auth;

#[cfg(any(feature = "server", test))]
pub mod books_repository;

#[cfg(any(feature = "server", test))]
pub mod error;

#[cfg(any(feature = "server", test))]
mod handlers;

#[cfg(any(feature = "server", test))]
pub mod persons_repository;

#[cfg(any(feature = "server", test))]
pub mod postgres;

#[cfg(any(feature = "server", test))]
pub mod reservation_desk;

#[cfg(any(feature = "server", test))]
pub mod reservations_repository;

#[cfg(any(feature = "server", test))]
pub mod seed;

#[cfg(any(feature = "server", test))]
pub mod sessions;

#[cfg(any(feature = "server", test))]
pub mod settings;
