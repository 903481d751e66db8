use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
};

use crate::{
    error::Result,
    models::vehicle::{Vehicle, VehicleType},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/typecar",
    responses(
        (status = 200, description = "All vehicle types", body = Json<Vec<VehicleType>>)
    )
)]
#[axum::debug_handler]
pub async fn list_vehicle_types(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let items = state.vehicle_service.list_types().await?;
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/car",
    responses(
        (status = 200, description = "All vehicles", body = Json<Vec<Vehicle>>)
    )
)]
#[axum::debug_handler]
pub async fn list_vehicles(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let items = state.vehicle_service.list_vehicles().await?;
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/car/{id}",
    params(
        ("id" = i32, Path, description = "Vehicle ID")
    ),
    responses(
        (status = 200, description = "Vehicle found", body = Json<Vehicle>),
        (status = 404, description = "Vehicle not found")
    )
)]
#[axum::debug_handler]
pub async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let vehicle = state.vehicle_service.get_vehicle(id).await?;
    Ok(Json(vehicle))
}
