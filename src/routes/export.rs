use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::{
    dto::export_dto::{ExportFormat, ExportQuery},
    error::Result,
    services::export_service::{ExportService, ExportTable},
    AppState,
};

fn attachment(stem: &str, format: ExportFormat, table: &ExportTable) -> Result<impl IntoResponse> {
    let buffer = ExportService::render(table, format)?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        ExportService::file_name(stem, format)
    );
    tracing::info!(rows = table.rows.len(), format = format.extension(), "export generated");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    ))
}

#[utoipa::path(
    get,
    path = "/api/typecar/export",
    params(
        ("format" = Option<String>, Query, description = "excel (default), pdf or doc"),
        ("search" = Option<String>, Query, description = "Match on name or brand"),
        ("ids" = Option<String>, Query, description = "Comma-separated vehicle type IDs")
    ),
    responses(
        (status = 200, description = "Vehicle type export"),
        (status = 400, description = "Unsupported format or malformed ids")
    )
)]
#[axum::debug_handler]
pub async fn export_vehicle_types(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse> {
    let format = query.export_format()?;
    let ids = query.selected_ids()?;
    let items = state
        .vehicle_service
        .list_types_for_export(query.search_term(), &ids)
        .await?;
    attachment("vehicle_types", format, &ExportTable::vehicle_types(&items))
}

#[utoipa::path(
    get,
    path = "/api/car/export",
    params(
        ("format" = Option<String>, Query, description = "excel (default), pdf or doc"),
        ("search" = Option<String>, Query, description = "Match on vehicle name"),
        ("ids" = Option<String>, Query, description = "Comma-separated vehicle IDs")
    ),
    responses(
        (status = 200, description = "Vehicle export"),
        (status = 400, description = "Unsupported format or malformed ids")
    )
)]
#[axum::debug_handler]
pub async fn export_vehicles(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse> {
    let format = query.export_format()?;
    let ids = query.selected_ids()?;
    let items = state
        .vehicle_service
        .list_vehicles_for_export(query.search_term(), &ids)
        .await?;
    attachment("vehicles", format, &ExportTable::vehicles(&items))
}

#[utoipa::path(
    get,
    path = "/api/calendartestcar/export",
    params(
        ("format" = Option<String>, Query, description = "excel (default), pdf or doc"),
        ("search" = Option<String>, Query, description = "Match on customer name, phone or email"),
        ("ids" = Option<String>, Query, description = "Comma-separated appointment IDs")
    ),
    responses(
        (status = 200, description = "Appointment export"),
        (status = 400, description = "Unsupported format or malformed ids"),
        (status = 401, description = "Missing or invalid staff token")
    )
)]
#[axum::debug_handler]
pub async fn export_appointments(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse> {
    let format = query.export_format()?;
    let ids = query.selected_ids()?;
    let items = state
        .appointment_service
        .list_for_export(query.search_term(), &ids)
        .await?;
    attachment("appointments", format, &ExportTable::appointments(&items))
}
