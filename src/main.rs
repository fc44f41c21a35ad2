use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use smart_match::auth::JwtValidator;
use smart_match::config::{LoggingSettings, Settings, StoreBackend};
use smart_match::routes::{self, error::{handle_json_payload_error, handle_query_payload_error}, matches::AppState};
use smart_match::services::{InMemoryStore, MatchStore, PostgresStore, RestStore, RestTables, StoreError, StoreFixture};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const REST_PATH: &str = "/rest/v1";

/// Initialize logging; `RUST_LOG` wins over the configured level
fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match logging.format.as_str() {
        "pretty" => subscriber.pretty().init(),
        "compact" => subscriber.compact().init(),
        _ => subscriber.json().init(),
    }
}

/// REST root for a project URL, accepting either form
fn rest_root(url: &str) -> String {
    let url = url.trim_end_matches('/');
    if url.ends_with(REST_PATH) {
        url.to_string()
    } else {
        format!("{}{}", url, REST_PATH)
    }
}

async fn build_store(settings: &Settings) -> Result<Arc<dyn MatchStore>, StoreError> {
    match settings.store.backend {
        StoreBackend::Rest => {
            let tables = &settings.rest.tables;
            let store = RestStore::new(
                rest_root(&settings.rest.url),
                settings.rest.api_key.clone(),
                RestTables {
                    preferences: tables.preferences.clone(),
                    profiles: tables.profiles.clone(),
                    bookings: tables.bookings.clone(),
                    tasks: tables.tasks.clone(),
                    match_logs: tables.match_logs.clone(),
                },
                Duration::from_secs(settings.rest.request_timeout_secs),
            )?;

            info!("REST store initialized ({})", settings.rest.url);
            Ok(Arc::new(store))
        }
        StoreBackend::Postgres => {
            let db = &settings.database;
            let max_connections = db.max_connections.unwrap_or(10);

            let store = PostgresStore::connect(
                &db.url,
                max_connections,
                db.min_connections.unwrap_or(1),
                Duration::from_secs(db.acquire_timeout_secs.unwrap_or(5)),
                Duration::from_secs(db.idle_timeout_secs.unwrap_or(600)),
            )
            .await?;

            info!("PostgreSQL store initialized (max: {} connections)", max_connections);
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            let fixture = match &settings.store.fixture_path {
                Some(path) => StoreFixture::load(path)?,
                None => StoreFixture::default(),
            };

            info!(
                "In-memory store initialized ({} tasks, {} preference rows)",
                fixture.tasks.len(),
                fixture.preferences.len()
            );
            Ok(Arc::new(InMemoryStore::new(fixture)))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_tracing(&settings.logging);

    info!("Starting Smart Match service...");

    let store = build_store(&settings).await.map_err(|e| {
        error!("Failed to initialize data store: {}", e);
        io::Error::new(io::ErrorKind::Other, e.to_string())
    })?;

    let auth = JwtValidator::new(&settings.auth.jwt_secret, settings.auth.audience.as_deref());

    info!(
        "Matcher initialized (radius: {} km, price: {}-{}, candidates: {})",
        settings.defaults.radius_km,
        settings.defaults.price_min,
        settings.defaults.price_max,
        settings.matching.candidate_fetch_limit
    );

    let app_state = AppState::new(store, auth, settings.matching.clone(), settings.defaults);

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
