use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Command, Reservation};

/// Per-collection counts plus the latest activity, the admin landing
/// page's payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct Dashboard {
    pub products: usize,
    pub commands: usize,
    pub reservations: usize,
    pub messages: usize,
    pub recent_commands: Vec<Command>,
    pub recent_reservations: Vec<Reservation>,
}
