use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::store::Document;

/// Typed views over the opaque documents. Decoding is tolerant where the
/// source data is known to be messy (legacy string prices) and skips
/// documents that cannot be decoded at all.

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: f64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_true")]
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommandItem {
    pub product_id: Uuid,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_price")]
    pub unit_price: f64,
    pub quantity: u32,
}

/// An order snapshot taken at checkout time: products, customer, quantities
/// and total as they were, never re-synced to later catalog changes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Command {
    pub id: Uuid,
    pub customer: Customer,
    pub items: Vec<CommandItem>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub total: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Reservation {
    pub id: Uuid,
    pub date: NaiveDate,
    pub time_slot: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub vehicle: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

pub const COMMAND_STATUSES: [&str; 6] = [
    "pending",
    "confirmed",
    "in_progress",
    "ready",
    "delivered",
    "cancelled",
];

pub const RESERVATION_STATUSES: [&str; 3] = ["pending", "confirmed", "cancelled"];

fn default_true() -> bool {
    true
}

/// Decodes a document into a typed model, injecting the id and timestamps
/// the store keeps outside the data payload.
pub fn decode_document<T: DeserializeOwned>(doc: &Document) -> Result<T, serde_json::Error> {
    let mut value = doc.data.clone();
    if let Some(map) = value.as_object_mut() {
        map.insert("id".to_string(), serde_json::to_value(doc.id)?);
        map.insert("created_at".to_string(), serde_json::to_value(doc.created_at)?);
        map.insert("updated_at".to_string(), serde_json::to_value(doc.updated_at)?);
    }
    serde_json::from_value(value)
}

/// Decode for listings: an undecodable document is logged and skipped so
/// one bad record cannot take the whole view down.
pub fn decode_or_skip<T: DeserializeOwned>(doc: &Document) -> Option<T> {
    match decode_document(doc) {
        Ok(model) => Some(model),
        Err(err) => {
            tracing::warn!(
                collection = %doc.collection,
                id = %doc.id,
                error = %err,
                "skipping undecodable document"
            );
            None
        }
    }
}

/// Boundary normalization for price fields: the data source carries prices
/// as numbers or legacy strings ("12.50", "12,50"). Anything uncoercible
/// normalizes to 0.0 and is flagged, never to a made-up default.
pub fn normalize_price(raw: Option<&Value>) -> f64 {
    match raw {
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if v.is_finite() && v >= 0.0 => v,
            _ => {
                tracing::warn!(value = %n, "price is not a usable number; treating as 0");
                0.0
            }
        },
        Some(Value::String(s)) => {
            let normalized = s.trim().replace(',', ".");
            match normalized.parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => v,
                _ => {
                    tracing::warn!(value = %s, "price string is not numeric; treating as 0");
                    0.0
                }
            }
        }
        Some(Value::Null) | None => 0.0,
        Some(other) => {
            tracing::warn!(value = %other, "price has an unexpected shape; treating as 0");
            0.0
        }
    }
}

pub fn lenient_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(normalize_price(raw.as_ref()))
}
