//! # TrackRecord Web Server
//!
//! The HTTP API. Every request passes the admission pipeline (see
//! [`middleware`]) before it reaches a handler; handlers validate input,
//! call the repository and wrap the result in a JSON envelope.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use configuration::Settings;
use database::DbRepository;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub mod context;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod rate_tracker;
pub mod token;

use crate::rate_tracker::RateTracker;
use crate::token::TokenIssuer;

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 1_048_576;

/// The shared application state that all handlers can access.
#[derive(Debug)]
pub struct AppState {
    pub repo: DbRepository,
    pub tokens: TokenIssuer,
    /// `None` when rate limiting is disabled.
    pub rate_tracker: Option<Arc<RateTracker>>,
    pub environment: String,
    pub version: &'static str,
}

impl AppState {
    pub fn new(settings: &Settings, repo: DbRepository) -> Self {
        let rate_tracker = settings.rate_limit.enabled.then(|| {
            Arc::new(RateTracker::new(
                settings.rate_limit.requests_per_second,
                settings.rate_limit.idle_timeout(),
            ))
        });

        Self {
            repo,
            tokens: TokenIssuer::new(
                &settings.jwt.secret,
                chrono::Duration::hours(settings.jwt.token_ttl_hours),
            ),
            rate_tracker,
            environment: settings.environment.clone(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// All API routes behind the admission pipeline.
pub fn build_router(state: Arc<AppState>) -> Router {
    use handlers::{exercises, health, reports, users, workout_logs, workouts};

    let public = Router::new()
        .route("/v1/healthcheck", get(health::healthcheck))
        .route("/v1/users", post(users::register_user))
        .route("/v1/auth/login", post(users::login));

    let protected = Router::new()
        .route(
            "/v1/exercises",
            get(exercises::list_exercises).post(exercises::create_exercise),
        )
        .route("/v1/exercises/:id", get(exercises::show_exercise))
        .route(
            "/v1/workouts",
            get(workouts::list_workouts).post(workouts::create_workout),
        )
        .route(
            "/v1/workouts/:id",
            get(workouts::show_workout)
                .patch(workouts::update_workout)
                .delete(workouts::delete_workout),
        )
        .route(
            "/v1/workout-logs",
            get(workout_logs::list_workout_logs).post(workout_logs::create_workout_log),
        )
        .route("/v1/workout-logs/:id", get(workout_logs::show_workout_log))
        .route("/v1/reports/progress", get(reports::progress_report))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_authenticated_user,
        ));

    with_admission(public.merge(protected), state)
}

/// Wraps `routes` in the admission pipeline and attaches the state.
///
/// Layers, outermost first: request tracing, panic recovery, CORS, the
/// `OPTIONS` short-circuit, rate limiting, then the 405 envelope.
pub fn with_admission(routes: Router<Arc<AppState>>, state: Arc<AppState>) -> Router {
    routes
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::recover_panic_layer())
                .layer(middleware::cors_layer())
                .layer(from_fn(middleware::answer_options))
                .layer(from_fn_with_state(state.clone(), middleware::rate_limit))
                .layer(from_fn(middleware::envelope_method_not_allowed)),
        )
        .with_state(state)
}

/// Connects to the database, applies migrations and serves until Ctrl-C or
/// SIGTERM. In-flight requests are allowed to finish.
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let addr = settings.server.socket_addr()?;

    let db_pool = database::connect(&settings.database).await?;
    database::run_migrations(&db_pool).await?;
    let repo = DbRepository::new(db_pool).with_query_timeout(settings.database.query_timeout());

    let state = Arc::new(AppState::new(&settings, repo));
    let sweeper = state
        .rate_tracker
        .as_ref()
        .map(|tracker| tracker.spawn_sweeper(settings.rate_limit.sweep_interval()));

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = %settings.environment, "Web server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Some(sweeper) = sweeper {
        sweeper.stop();
    }
    tracing::info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
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
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received, draining connections");
}
