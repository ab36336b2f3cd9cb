use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};

use crate::{
    dto::reservations::{CreateReservationRequest, SlotAvailability},
    error::AppResult,
    models::Reservation,
    response::ApiResponse,
    routes::params::SlotQuery,
    services::reservation_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/slots", get(slot_availability))
        .route("/", post(book_reservation))
}

#[utoipa::path(
    get,
    path = "/api/reservations/slots",
    params(
        ("date" = String, Query, description = "Calendar date, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Slot availability for the date", body = ApiResponse<SlotAvailability>),
    ),
    tag = "Reservations"
)]
pub async fn slot_availability(
    State(state): State<AppState>,
    Query(query): Query<SlotQuery>,
) -> AppResult<Json<ApiResponse<SlotAvailability>>> {
    let resp = reservation_service::availability(&state, query.date).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/reservations",
    request_body = CreateReservationRequest,
    responses(
        (status = 200, description = "Reservation booked", body = ApiResponse<Reservation>),
        (status = 400, description = "Past date, unknown slot, taken slot, or invalid contact"),
    ),
    tag = "Reservations"
)]
pub async fn book_reservation(
    State(state): State<AppState>,
    Json(payload): Json<CreateReservationRequest>,
) -> AppResult<Json<ApiResponse<Reservation>>> {
    let resp = reservation_service::book(&state, payload).await?;
    Ok(Json(resp))
}
