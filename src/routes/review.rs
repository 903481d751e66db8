use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
};

use crate::{
    dto::review_dto::{ReviewSummaryResponse, VisibilityPayload},
    error::Result,
    models::review::Review,
    services::review_aggregator::{aggregate, filter_visible},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/review/{idXe}",
    params(
        ("idXe" = i32, Path, description = "Vehicle ID")
    ),
    responses(
        (status = 200, description = "Every review of the vehicle, hidden ones included", body = Json<Vec<Review>>)
    )
)]
#[axum::debug_handler]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(vehicle_id): Path<i32>,
) -> Result<impl IntoResponse> {
    let reviews = state.review_service.list_for_vehicle(vehicle_id).await?;
    Ok(Json(reviews))
}

#[utoipa::path(
    get,
    path = "/api/review/{idXe}/summary",
    params(
        ("idXe" = i32, Path, description = "Vehicle ID")
    ),
    responses(
        (status = 200, description = "Rating statistics over visible reviews", body = Json<ReviewSummaryResponse>)
    )
)]
#[axum::debug_handler]
pub async fn review_summary(
    State(state): State<AppState>,
    Path(vehicle_id): Path<i32>,
) -> Result<impl IntoResponse> {
    let reviews = state.review_service.list_for_vehicle(vehicle_id).await?;
    let visible = filter_visible(reviews);
    let summary = aggregate(&visible);
    Ok(Json(ReviewSummaryResponse::new(vehicle_id, &summary)))
}

#[utoipa::path(
    patch,
    path = "/api/reviews/{id}/visibility",
    params(
        ("id" = i32, Path, description = "Review ID")
    ),
    request_body = VisibilityPayload,
    responses(
        (status = 200, description = "Visibility changed", body = Json<Review>),
        (status = 404, description = "Review not found")
    )
)]
#[axum::debug_handler]
pub async fn set_review_visibility(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<VisibilityPayload>,
) -> Result<impl IntoResponse> {
    let review = state.review_service.set_visibility(id, payload.hidden).await?;
    Ok(Json(review))
}
