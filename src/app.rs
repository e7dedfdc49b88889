use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers;
use crate::identity::IdentityGateway;
use crate::middleware::require_identity;
use crate::services::{EventService, TaskService, TripService};
use crate::store::DocumentStore;

/// Shared handles injected into every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityGateway>,
    pub trips: TripService,
    pub events: EventService,
    pub tasks: TaskService,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityGateway>, invite_max_retries: u32) -> Self {
        Self {
            trips: TripService::new(store.clone(), identity.clone(), invite_max_retries),
            events: EventService::new(store.clone()),
            tasks: TaskService::new(store.clone()),
            store,
            identity,
        }
    }
}

pub fn router(state: AppState, security: &SecurityConfig) -> Router {
    let mut app = Router::new()
        // Public
        .route("/", get(handlers::system::root))
        .route("/health", get(handlers::system::health))
        // Protected
        .merge(protected_routes(state.clone()))
        .layer(TraceLayer::new_for_http());

    if security.enable_cors {
        app = app.layer(cors_layer(&security.cors_origins));
    }

    app.with_state(state)
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use handlers::{events, system, tasks, trips};

    Router::new()
        .route("/me", get(system::me))
        // Trips
        .route("/trips", post(trips::create))
        .route("/trips/user", get(trips::list_for_user))
        .route("/trips/:trip_id", get(trips::get))
        .route("/trips/:trip_id/members", get(trips::members))
        .route("/trips/:trip_id/invite", post(trips::invite))
        // Events
        .route("/trips/:trip_id/events", get(events::list).post(events::create))
        .route("/trips/:trip_id/events/:event_id", get(events::get))
        // Tasks
        .route("/trips/:trip_id/events/:event_id/tasks", post(tasks::create))
        .route("/trips/:trip_id/events/:event_id/tasks/grouped", get(tasks::grouped))
        .route(
            "/trips/:trip_id/events/:event_id/tasks/:task_id/status",
            patch(tasks::set_status),
        )
        .route_layer(from_fn_with_state(state, require_identity))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}
