use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Command;

/// Customer form submitted at checkout; snapshotted into the command.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommandList {
    pub items: Vec<Command>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: String,
}
