use std::sync::Arc;

use actix_web::{App, HttpServer};
use anyhow::Context;
use opentelemetry::global;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::runtime::TokioCurrentThread;
use paperclip::actix::{web, OpenApiExt};
use tracing_actix_web::TracingLogger;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

use libraryservice_server::admins_repository::{
    AdminsRepository, InMemoryAdminsRepository, PostgresAdminsRepository,
};
use libraryservice_server::app_config::{config_app, json_config, path_config};
use libraryservice_server::auth::ensure_admin;
use libraryservice_server::books_repository::{
    BooksRepository, InMemoryBooksRepository, PostgresBooksRepository,
};
use libraryservice_server::persons_repository::{
    InMemoryPersonsRepository, PersonsRepository, PostgresPersonsRepository,
};
use libraryservice_server::reservation_desk::ReservationDesk;
use libraryservice_server::reservations_repository::{
    InMemoryReservationsRepository, PostgresReservationsRepository, ReservationsRepository,
};
use libraryservice_server::seed::seed_sample_data;
use libraryservice_server::sessions::{InMemorySessionStore, SessionCookie, SessionStore};
use libraryservice_server::settings::Settings;

const APP_NAME: &str = "libraryservice_server";

// Based on https://github.com/LukeMathWalker/tracing-actix-web/blob/main/examples/opentelemetry/src/main.rs#L15
fn init_telemetry() -> anyhow::Result<()> {
    // Spans are exported to the Jaeger agent in batches
    global::set_text_map_propagator(TraceContextPropagator::new());
    #[allow(deprecated)]
    let tracer = opentelemetry_jaeger::new_agent_pipeline()
        .with_service_name(APP_NAME)
        .install_batch(TokioCurrentThread)
        .context("Failed to install OpenTelemetry tracer")?;

    // Tunable via `RUST_LOG`
    let env_filter = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info"));
    let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);
    let formatting_layer = BunyanFormattingLayer::new(APP_NAME.into(), std::io::stdout);
    let subscriber = Registry::default()
        .with(env_filter)
        .with(telemetry)
        .with(JsonStorageLayer)
        .with(formatting_layer);
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install `tracing` subscriber")
}

struct Repositories {
    books: Arc<dyn BooksRepository>,
    persons: Arc<dyn PersonsRepository>,
    reservations: Arc<dyn ReservationsRepository>,
    admins: Arc<dyn AdminsRepository>,
}

async fn init_repositories(settings: &Settings) -> anyhow::Result<Repositories> {
    if settings.database.use_in_memory {
        tracing::info!("Using in-memory repositories");
        return Ok(Repositories {
            books: Arc::new(InMemoryBooksRepository::default()),
            persons: Arc::new(InMemoryPersonsRepository::default()),
            reservations: Arc::new(InMemoryReservationsRepository::default()),
            admins: Arc::new(InMemoryAdminsRepository::default()),
        });
    }

    let config = settings.database.postgres_config();
    tracing::info!(hostname = %config.hostname, "Connecting to postgres");
    Ok(Repositories {
        books: Arc::new(
            PostgresBooksRepository::init(config.clone())
                .await
                .context("Failed to init books repository")?,
        ),
        persons: Arc::new(
            PostgresPersonsRepository::init(config.clone())
                .await
                .context("Failed to init persons repository")?,
        ),
        reservations: Arc::new(
            PostgresReservationsRepository::init(config.clone())
                .await
                .context("Failed to init reservations repository")?,
        ),
        admins: Arc::new(
            PostgresAdminsRepository::init(config)
                .await
                .context("Failed to init admins repository")?,
        ),
    })
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_telemetry()?;
    let settings = Settings::load().context("Failed to load settings")?;

    let repositories = init_repositories(&settings).await?;
    let Repositories {
        books,
        persons,
        reservations,
        admins,
    } = repositories;

    ensure_admin(
        admins.as_ref(),
        &settings.auth.admin_username,
        &settings.auth.admin_password,
    )
    .await
    .context("Failed to create admin user")?;

    let desk = web::Data::new(ReservationDesk::new(
        books.clone(),
        persons.clone(),
        reservations.clone(),
    ));

    if settings.seed_sample_data {
        seed_sample_data(books.as_ref(), persons.as_ref(), desk.get_ref()).await?;
    }

    let sessions: Arc<dyn SessionStore> =
        Arc::new(InMemorySessionStore::new(settings.auth.session_ttl_secs));
    let session_cookie = SessionCookie {
        secure: settings.auth.secure_cookie,
        max_age_secs: settings.auth.session_ttl_secs,
    };

    let bind_address = (settings.server.host.clone(), settings.server.port);
    tracing::info!(
        "starting HTTP server at http://{}:{}",
        bind_address.0,
        bind_address.1
    );

    HttpServer::new(move || {
        App::new()
            .wrap_api()
            .app_data(json_config())
            .app_data(path_config())
            .app_data(web::Data::new(books.clone()))
            .app_data(web::Data::new(persons.clone()))
            .app_data(web::Data::new(reservations.clone()))
            .app_data(web::Data::new(admins.clone()))
            .app_data(web::Data::new(sessions.clone()))
            .app_data(web::Data::new(session_cookie.clone()))
            .app_data(desk.clone())
            .wrap(TracingLogger::default())
            .configure(config_app)
            .with_json_spec_at("/apispec/v2")
            .build()
    })
    .bind(bind_address)?
    .run()
    .await?;

    global::shutdown_tracer_provider();
    Ok(())
}
