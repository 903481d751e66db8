pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use axum::{
    routing::{get, patch},
    Router,
};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::middleware::{auth, cors::cors_layer, rate_limit};
use crate::services::{
    appointment_service::AppointmentService, review_service::ReviewService,
    vehicle_service::VehicleService,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub appointment_service: AppointmentService,
    pub review_service: ReviewService,
    pub vehicle_service: VehicleService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        Self {
            appointment_service: AppointmentService::new(pool.clone()),
            review_service: ReviewService::new(pool.clone()),
            vehicle_service: VehicleService::new(pool.clone()),
            pool,
        }
    }
}

/// Full HTTP surface: storefront routes for customers and bearer-protected
/// routes for dealership staff, each group behind its own rate limit.
pub fn app(state: AppState, config: &Config) -> Router {
    let base_routes = Router::new().route("/health", get(routes::health::health));

    let public_api = Router::new()
        .route("/api/typecar", get(routes::vehicle::list_vehicle_types))
        .route("/api/car", get(routes::vehicle::list_vehicles))
        .route("/api/car/:id", get(routes::vehicle::get_vehicle))
        .route(
            "/api/calendartestcar",
            axum::routing::post(routes::appointment::create_appointment),
        )
        .route("/api/review/:id", get(routes::review::list_reviews))
        .route("/api/review/:id/summary", get(routes::review::review_summary))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::new_rps_state(config.public_rps),
            rate_limit::rps_middleware,
        ));

    let staff_api = Router::new()
        .route(
            "/api/calendartestcar",
            get(routes::appointment::list_appointments),
        )
        .route(
            "/api/calendartestcar/:id",
            get(routes::appointment::get_appointment).put(routes::appointment::update_appointment),
        )
        .route(
            "/api/calendartestcar/:id/status",
            patch(routes::appointment::update_appointment_status),
        )
        .route(
            "/api/reviews/:id/visibility",
            patch(routes::review::set_review_visibility),
        )
        .route("/api/typecar/export", get(routes::export::export_vehicle_types))
        .route("/api/car/export", get(routes::export::export_vehicles))
        .route(
            "/api/calendartestcar/export",
            get(routes::export::export_appointments),
        )
        .layer(axum::middleware::from_fn(auth::require_staff))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::new_rps_state(config.staff_rps),
            rate_limit::rps_middleware,
        ));

    base_routes
        .merge(public_api)
        .merge(staff_api)
        .with_state(state)
        .layer(cors_layer(config.cors_origin.as_deref()))
        .layer(TraceLayer::new_for_http())
}
