use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::appointment_dto::{
        AppointmentListQuery, AppointmentListResponse, AppointmentPayload, StatusUpdatePayload,
    },
    error::{Error, Result},
    models::appointment::Appointment,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/calendartestcar",
    request_body = AppointmentPayload,
    responses(
        (status = 201, description = "Appointment booked", body = Json<Appointment>),
        (status = 400, description = "Invalid payload or time slot")
    )
)]
#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<AppState>,
    Json(payload): Json<AppointmentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let appointment = state.appointment_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

#[utoipa::path(
    put,
    path = "/api/calendartestcar/{id}",
    params(
        ("id" = i32, Path, description = "Appointment ID")
    ),
    request_body = AppointmentPayload,
    responses(
        (status = 200, description = "Appointment updated", body = Json<Appointment>),
        (status = 400, description = "Invalid payload or time slot"),
        (status = 404, description = "Appointment not found"),
        (status = 409, description = "Appointment is approved or completed")
    )
)]
#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<AppointmentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    if let Some(body_id) = payload.id.filter(|body_id| *body_id != id) {
        return Err(Error::BadRequest(format!(
            "idLichHen {} does not match the path id {}",
            body_id, id
        )));
    }
    let appointment = state.appointment_service.update(id, payload).await?;
    Ok(Json(appointment))
}

#[utoipa::path(
    get,
    path = "/api/calendartestcar/{id}",
    params(
        ("id" = i32, Path, description = "Appointment ID")
    ),
    responses(
        (status = 200, description = "Appointment found", body = Json<Appointment>),
        (status = 404, description = "Appointment not found")
    )
)]
#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let appointment = state.appointment_service.get_by_id(id).await?;
    Ok(Json(appointment))
}

#[utoipa::path(
    get,
    path = "/api/calendartestcar",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("search" = Option<String>, Query, description = "Search name, phone or email")
    ),
    responses(
        (status = 200, description = "Page of appointments", body = Json<AppointmentListResponse>),
        (status = 401, description = "Missing or invalid staff token")
    )
)]
#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppState>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<impl IntoResponse> {
    let result = state.appointment_service.list(query).await?;
    Ok(Json(AppointmentListResponse::from(result)))
}

#[utoipa::path(
    patch,
    path = "/api/calendartestcar/{id}/status",
    params(
        ("id" = i32, Path, description = "Appointment ID")
    ),
    request_body = StatusUpdatePayload,
    responses(
        (status = 200, description = "Status changed", body = Json<Appointment>),
        (status = 404, description = "Appointment not found"),
        (status = 409, description = "Transition not allowed")
    )
)]
#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<StatusUpdatePayload>,
) -> Result<impl IntoResponse> {
    let appointment = state
        .appointment_service
        .update_status(id, payload.status)
        .await?;
    Ok(Json(appointment))
}
