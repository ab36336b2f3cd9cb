use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Reservation;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReservationRequest {
    pub date: NaiveDate,
    pub time_slot: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub vehicle: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Per-slot availability for one calendar day. A past date reports
/// `past: true` and every slot unavailable.
#[derive(Debug, Serialize, ToSchema)]
pub struct SlotAvailability {
    pub date: NaiveDate,
    pub past: bool,
    pub slots: Vec<SlotStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SlotStatus {
    pub time: String,
    pub available: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationList {
    pub items: Vec<Reservation>,
}
