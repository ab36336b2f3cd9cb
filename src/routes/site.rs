//! Static site content: the business card and service offerings the
//! home, about and services pages render.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Serialize, ToSchema)]
pub struct SiteInfo {
    pub name: String,
    pub tagline: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub opening_hours: Vec<String>,
    pub services: Vec<ServiceOffering>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceOffering {
    pub name: String,
    pub description: String,
    /// Starting price; final quote depends on the vehicle.
    pub price_from: f64,
}

#[utoipa::path(
    get,
    path = "/api/site",
    responses(
        (status = 200, description = "Business info and service offerings", body = ApiResponse<SiteInfo>),
    ),
    tag = "Site"
)]
pub async fn site_info() -> Json<ApiResponse<SiteInfo>> {
    let data = SiteInfo {
        name: "Garage Lemoine".to_string(),
        tagline: "Entretien et réparation toutes marques".to_string(),
        phone: "+33 4 72 00 18 42".to_string(),
        email: "contact@garage-lemoine.fr".to_string(),
        address: "14 rue des Forges, 69007 Lyon".to_string(),
        opening_hours: vec![
            "Mon-Fri 08:00-12:00".to_string(),
            "Mon-Fri 14:00-18:00".to_string(),
            "Sat 09:00-12:00".to_string(),
        ],
        services: vec![
            ServiceOffering {
                name: "Vidange et filtres".to_string(),
                description: "Oil and filter change with a multi-point check".to_string(),
                price_from: 69.0,
            },
            ServiceOffering {
                name: "Freinage".to_string(),
                description: "Brake pads, discs and fluid service".to_string(),
                price_from: 89.0,
            },
            ServiceOffering {
                name: "Pneumatiques".to_string(),
                description: "Tyre fitting, balancing and alignment".to_string(),
                price_from: 25.0,
            },
            ServiceOffering {
                name: "Diagnostic électronique".to_string(),
                description: "Full OBD scan and fault report".to_string(),
                price_from: 49.0,
            },
            ServiceOffering {
                name: "Climatisation".to_string(),
                description: "A/C recharge and circuit check".to_string(),
                price_from: 79.0,
            },
        ],
    };

    Json(ApiResponse::success("Site", data, Some(Meta::empty())))
}
