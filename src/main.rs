use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

#[cfg(feature = "utoipa")]
use axum::Json;
use axum::{Router, routing::get};
use clap::Parser;
use ipnet::IpNet;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};
#[cfg(feature = "utoipa")]
use utoipa_scalar::{Scalar, Servable};

mod collection;
mod config;
mod db;
mod middleware;
mod models;
pub mod observability;
pub mod openapi;
mod routes;
pub mod services;

/// Config file looked up in the working directory when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "promptshelf.toml";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::AppConfig>,
    pub db: Option<Arc<db::DbPool>>,
    pub services: Option<services::Services>,
    /// Loads and parses the bundled collection documents.
    pub collection: collection::CollectionService,
    /// Parsed `server.trusted_proxies.cidrs`, checked on every identified request.
    pub trusted_cidrs: Arc<Vec<IpNet>>,
}

impl AppState {
    pub async fn new(config: config::AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        // Initialize database and services if configured
        let (db, services) = if config.database.is_none() {
            tracing::info!("No database configured, prompt endpoints are disabled");
            (None, None)
        } else {
            let pool = db::DbPool::from_config(&config.database).await?;
            if config.database.run_migrations() {
                pool.run_migrations().await?;
            }
            let db = Arc::new(pool);
            let services = services::Services::new(db.clone());
            (Some(db), Some(services))
        };

        let collection = collection::CollectionService::new(config.collection.clone());
        tracing::debug!(
            directory = %config.collection.directory.display(),
            default_language = %collection.default_language(),
            "Collection configured"
        );

        let trusted_cidrs = Arc::new(config.server.trusted_proxies.parsed_cidrs());

        Ok(Self {
            config: Arc::new(config),
            db,
            services,
            collection,
            trusted_cidrs,
        })
    }
}

pub fn build_app(config: &config::AppConfig, state: AppState) -> Router {
    let mut app = Router::new()
        // Health check endpoint
        .route("/health", get(routes::health::health_check))
        .route("/health/live", get(routes::health::liveness))
        .route("/health/ready", get(routes::health::readiness));

    // OpenAPI spec and Scalar docs UI (optional)
    #[cfg(feature = "utoipa")]
    {
        app = app
            .route("/openapi.json", get(openapi_json))
            .merge(Scalar::with_url("/api/docs", openapi::ApiDoc::build()));
    }

    app = app.nest("/api", routes::get_api_routes());

    app = app.layer(axum::middleware::from_fn(middleware::request_id_middleware));

    // Apply CORS layer if enabled (layers are applied in reverse order, so this runs first)
    if let Some(cors_layer) = config.server.cors.clone().into_layer() {
        app = app.layer(cors_layer);
    }

    app.layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            http::StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.timeout_secs),
        ))
        .layer(RequestBodyLimitLayer::new(config.server.body_limit_bytes))
        .with_state(state)
}

/// Returns the OpenAPI spec as JSON
#[cfg(feature = "utoipa")]
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi::ApiDoc::build())
}

/// CLI arguments for Promptshelf
#[derive(Parser, Debug)]
#[command(version, about = "Promptshelf prompt sharing service", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config file (defaults to ./promptshelf.toml if it exists,
    /// otherwise built-in defaults are used)
    #[arg(short, long, global = true)]
    config: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Start the server (default)
    Serve,
    /// Run database migrations and exit
    ///
    /// Useful for Kubernetes init containers or CI/CD pipelines.
    Migrate,
    /// Parse a collection document and print the result as JSON
    Parse {
        /// Markdown document to parse
        file: PathBuf,
        /// Marker set to parse with: "zh" or "en" (defaults to the configured language)
        #[arg(short, long)]
        language: Option<String>,
    },
    /// Export the OpenAPI specification (JSON format)
    Openapi {
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    match args.command {
        Some(Command::Openapi { output }) => {
            #[cfg(feature = "utoipa")]
            run_openapi_export(output);
            #[cfg(not(feature = "utoipa"))]
            {
                let _ = output;
                eprintln!("Error: OpenAPI export requires the 'utoipa' feature to be enabled");
                std::process::exit(1);
            }
        }
        Some(Command::Parse { file, language }) => {
            run_parse(args.config.as_deref(), &file, language.as_deref());
        }
        Some(Command::Migrate) => {
            run_migrate(args.config.as_deref()).await;
        }
        Some(Command::Serve) | None => {
            run_server(args.config.as_deref()).await;
        }
    }
}

/// Load the config file, exiting on failure.
///
/// An explicit path must exist. Without one, `promptshelf.toml` in the
/// working directory is used when present, and defaults otherwise.
fn load_config(explicit_path: Option<&str>) -> (config::AppConfig, Option<PathBuf>) {
    let path = match explicit_path {
        Some(path) => Some(PathBuf::from(path)),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        }
    };

    let Some(path) = path else {
        return (config::AppConfig::default(), None);
    };

    match config::AppConfig::from_file(&path) {
        Ok(config) => (config, Some(path)),
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn init_tracing_or_exit(config: &config::AppConfig) {
    if let Err(e) = observability::init_tracing(&config.observability) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run_server(explicit_config_path: Option<&str>) {
    let (config, config_path) = load_config(explicit_config_path);

    init_tracing_or_exit(&config);

    match &config_path {
        Some(path) => tracing::info!(config_file = %path.display(), "Starting Promptshelf"),
        None => tracing::info!("Starting Promptshelf with default configuration"),
    }

    let state = match AppState::new(config.clone()).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize application state");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let app = build_app(&config, state);

    let bind_addr = SocketAddr::new(config.server.host, config.server.port);
    let listener = match tokio::net::TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, address = %bind_addr, "Failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on http://{}", bind_addr);

    // Peer addresses feed the trusted-proxy check on the identity header.
    let result = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    if let Err(e) = result {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining in-flight requests");
}

async fn run_migrate(explicit_config_path: Option<&str>) {
    let (config, config_path) = load_config(explicit_config_path);

    init_tracing_or_exit(&config);

    match &config_path {
        Some(path) => tracing::info!(config_file = %path.display(), "Running database migrations"),
        None => tracing::info!("Running database migrations"),
    }

    if config.database.is_none() {
        eprintln!("Error: Database is not configured. Nothing to migrate.");
        std::process::exit(1);
    }

    match db::DbPool::from_config(&config.database).await {
        Ok(pool) => match pool.run_migrations().await {
            Ok(()) => {
                tracing::info!("Database migrations completed successfully");
            }
            Err(e) => {
                tracing::error!(error = %e, "Database migrations failed");
                eprintln!("Error: Database migrations failed: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database");
            eprintln!("Error: Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    }
}

/// Parse a collection document with the configured markers and print the
/// report. Exits non-zero when nothing could be extracted.
fn run_parse(explicit_config_path: Option<&str>, file: &Path, language: Option<&str>) {
    let (config, _) = load_config(explicit_config_path);

    let language = language
        .map(collection::Language::from_tag)
        .unwrap_or(config.collection.default_language);
    let markers = config.collection.markers(language);

    let text = match std::fs::read_to_string(file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: Failed to read {}: {}", file.display(), e);
            std::process::exit(1);
        }
    };

    let report = collection::parse_document(&text, &markers);
    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: Failed to serialize parse result: {}", e);
            std::process::exit(1);
        }
    }

    if report.entries.is_empty() {
        std::process::exit(2);
    }
}

/// Export OpenAPI specification to file or stdout (JSON format)
#[cfg(feature = "utoipa")]
fn run_openapi_export(output: Option<String>) {
    let spec = openapi::ApiDoc::build();
    let content = match serde_json::to_string_pretty(&spec) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error: Failed to serialize OpenAPI spec: {}", e);
            std::process::exit(1);
        }
    };

    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, &content) {
                eprintln!("Error: Failed to write to {}: {}", path, e);
                std::process::exit(1);
            }
            eprintln!("OpenAPI spec written to {}", path);
        }
        None => {
            println!("{}", content);
        }
    }
}
