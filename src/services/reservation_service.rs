use chrono::{NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    dto::reservations::{
        CreateReservationRequest, ReservationList, SlotAvailability, SlotStatus,
    },
    error::{AppError, AppResult},
    models::{RESERVATION_STATUSES, Reservation, decode_document, decode_or_skip},
    response::{ApiResponse, Meta},
    routes::params::ReservationListQuery,
    services::validate,
    state::AppState,
    store::Collection,
};

/// The workshop's bookable hours, one slot per hour around the midday
/// break.
pub const TIME_SLOTS: [&str; 8] = [
    "08:00", "09:00", "10:00", "11:00", "14:00", "15:00", "16:00", "17:00",
];

/// Which slots are still bookable on a date: one filtered read of the
/// reservations collection; cancelled reservations free their slot. A
/// past date reports every slot unavailable.
pub async fn availability(state: &AppState, date: NaiveDate) -> AppResult<ApiResponse<SlotAvailability>> {
    let past = date < Utc::now().date_naive();
    let taken = if past {
        Vec::new()
    } else {
        taken_slots(state, date).await?
    };

    let slots = TIME_SLOTS
        .iter()
        .map(|&time| SlotStatus {
            time: time.to_string(),
            available: !past && !taken.iter().any(|t| t == time),
        })
        .collect();

    Ok(ApiResponse::success(
        "Slot availability",
        SlotAvailability { date, past, slots },
        Some(Meta::empty()),
    ))
}

/// Books a slot. The availability re-check narrows the race window but
/// takes no lock: two concurrent bookers can still both succeed, and
/// staff resolve the conflict from the admin list.
pub async fn book(
    state: &AppState,
    payload: CreateReservationRequest,
) -> AppResult<ApiResponse<Reservation>> {
    validate::require("name", &payload.name)?;
    validate::phone("phone", &payload.phone)?;
    validate::email("email", &payload.email)?;
    if payload.date < Utc::now().date_naive() {
        return Err(AppError::field("date", "cannot book a past date"));
    }
    if !TIME_SLOTS.contains(&payload.time_slot.as_str()) {
        return Err(AppError::field("time_slot", "not a bookable time slot"));
    }
    if taken_slots(state, payload.date).await?.contains(&payload.time_slot) {
        return Err(AppError::field("time_slot", "this slot is already booked"));
    }

    let data = json!({
        "date": payload.date,
        "time_slot": payload.time_slot,
        "name": payload.name.trim(),
        "phone": payload.phone.trim(),
        "email": payload.email.trim(),
        "vehicle": payload.vehicle,
        "reason": payload.reason,
        "status": "pending",
    });
    let doc = state.store.create(Collection::Reservations, data).await?;
    let reservation: Reservation =
        decode_document(&doc).map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(reservation = %reservation.id, date = %reservation.date, slot = %reservation.time_slot, "reservation booked");
    Ok(ApiResponse::success(
        "Reservation created",
        reservation,
        Some(Meta::empty()),
    ))
}

pub async fn list(
    state: &AppState,
    query: ReservationListQuery,
) -> AppResult<ApiResponse<ReservationList>> {
    let docs = state.store.list(Collection::Reservations).await?;
    let mut items: Vec<Reservation> = docs.iter().filter_map(decode_or_skip).collect();

    if let Some(date) = query.date {
        items.retain(|r| r.date == date);
    }
    // Soonest appointment first, then by slot within the day.
    items.sort_by(|a, b| a.date.cmp(&b.date).then(a.time_slot.cmp(&b.time_slot)));

    let total = items.len() as i64;
    let (page, per_page, offset) = query.pagination.normalize();
    let items = items
        .into_iter()
        .skip(offset as usize)
        .take(per_page as usize)
        .collect();

    let meta = Meta::new(page, per_page, total);
    Ok(ApiResponse::success(
        "Reservations",
        ReservationList { items },
        Some(meta),
    ))
}

pub async fn get(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Reservation>> {
    let doc = state
        .store
        .get(Collection::Reservations, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let reservation = decode_document(&doc).map_err(|e| AppError::Internal(e.into()))?;
    Ok(ApiResponse::success("Reservation", reservation, None))
}

pub async fn update_status(
    state: &AppState,
    session_id: Uuid,
    id: Uuid,
    status: String,
) -> AppResult<ApiResponse<Reservation>> {
    if !RESERVATION_STATUSES.contains(&status.as_str()) {
        return Err(AppError::field("status", "unknown status"));
    }
    let doc = state
        .store
        .update(Collection::Reservations, id, json!({ "status": status }))
        .await?;
    let reservation: Reservation =
        decode_document(&doc).map_err(|e| AppError::Internal(e.into()))?;

    audit::record(
        session_id,
        "reservation_status",
        "reservations",
        json!({ "id": id, "status": reservation.status }),
    );
    Ok(ApiResponse::success(
        "Status updated",
        reservation,
        Some(Meta::empty()),
    ))
}

pub async fn delete(
    state: &AppState,
    session_id: Uuid,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let removed = state.store.delete(Collection::Reservations, id).await?;
    if !removed {
        return Err(AppError::NotFound);
    }
    audit::record(
        session_id,
        "reservation_delete",
        "reservations",
        json!({ "id": id }),
    );
    Ok(ApiResponse::success("Deleted", json!({}), Some(Meta::empty())))
}

async fn taken_slots(state: &AppState, date: NaiveDate) -> AppResult<Vec<String>> {
    let docs = state.store.list(Collection::Reservations).await?;
    Ok(docs
        .iter()
        .filter_map(decode_or_skip::<Reservation>)
        .filter(|r| r.date == date && r.status != "cancelled")
        .map(|r| r.time_slot)
        .collect())
}
