use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use recruit_algo::config::Settings;
use recruit_algo::core::Matcher;
use recruit_algo::routes::{self, handle_json_payload_error, AppState};
use recruit_algo::services::{BackendClient, BackendTables, PostgresClient, ThrottleRegistry};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

fn startup_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, e);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    init_logging();

    info!("Starting Recruit Algo service...");

    let settings = Settings::load().map_err(|e| startup_error("Failed to load configuration", e))?;

    info!("Configuration loaded successfully");

    let tables = BackendTables {
        vacancies: settings.backend.vacancies_table.clone(),
        postulations: settings.backend.postulations_table.clone(),
    };

    let backend = Arc::new(
        BackendClient::new(
            settings.backend.endpoint.clone(),
            settings.backend.api_key.clone(),
            tables,
            settings.backend.timeout_secs,
        )
        .map_err(|e| startup_error("Failed to build backend client", e))?,
    );

    info!("Backend client initialized for {}", settings.backend.endpoint);

    // Score history is optional - analysis runs without it
    let postgres = match &settings.database {
        Some(db) => {
            let client = PostgresClient::from_settings(
                &db.url,
                db.max_connections,
                db.min_connections,
                db.acquire_timeout_secs,
                db.idle_timeout_secs,
            )
            .await
            .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?;
            info!("PostgreSQL client initialized (max: {} connections)", db.max_connections.unwrap_or(10));
            Some(Arc::new(client))
        }
        None => {
            warn!("No database configured, score history disabled");
            None
        }
    };

    let policy = settings.throttle.policy();
    let unlock_tick = settings.throttle.unlock_tick();
    let idle_ttl = settings.throttle.idle_ttl_secs;

    let throttles = match &settings.redis {
        Some(redis) => match ThrottleRegistry::with_redis(&redis.url, policy, unlock_tick, idle_ttl).await {
            Ok(registry) => {
                info!("Throttle state persisted to Redis");
                registry
            }
            Err(e) => {
                error!("Failed to connect to Redis ({}), keeping throttle state in memory", e);
                ThrottleRegistry::in_memory(policy, unlock_tick, idle_ttl)
            }
        },
        None => ThrottleRegistry::in_memory(policy, unlock_tick, idle_ttl),
    };

    info!(
        "Login throttle: {} attempts, {} minute lock",
        policy.max_attempts,
        policy.lock_duration.num_minutes()
    );

    let app_state = AppState {
        backend,
        postgres,
        throttles: Arc::new(throttles),
        matcher: Matcher::new(settings.scoring.max_limit as usize),
        default_limit: settings.scoring.default_limit as usize,
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
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
