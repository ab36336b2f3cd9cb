//! Seeds a demo catalog into the products collection. Skips when the
//! collection already has documents so re-running is harmless.

use serde_json::json;

use garage_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    store::{Collection, DocumentStore, PgStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let url = config
        .database_url
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set to seed"))?;
    let orm = create_orm_conn(&url).await?;
    run_migrations(&orm).await?;
    let store = PgStore::new(orm);

    let existing = store.list(Collection::Products).await?;
    if !existing.is_empty() {
        println!("Products already seeded ({} documents), nothing to do", existing.len());
        return Ok(());
    }

    let catalog = demo_catalog();
    let count = catalog.len();
    for product in catalog {
        store.create(Collection::Products, product).await?;
    }
    println!("Seeded {count} products");
    Ok(())
}

fn demo_catalog() -> Vec<serde_json::Value> {
    vec![
        product("Huile moteur 5W30 (5L)", "Synthetic engine oil, ACEA C3", 42.90, "Entretien", 24),
        product("Filtre à huile", "Spin-on oil filter, most common fitments", 9.50, "Entretien", 40),
        product("Plaquettes de frein avant", "Ceramic front brake pads", 49.90, "Freinage", 18),
        product("Disques de frein (paire)", "Vented front discs", 74.00, "Freinage", 12),
        product("Batterie 12V 70Ah", "Maintenance-free starter battery", 109.00, "Électricité", 8),
        product("Balais d'essuie-glace (x2)", "Flat-blade wipers, 60/45 cm", 21.90, "Accessoires", 30),
        product("Pneu été 205/55 R16", "Summer tyre, fitted and balanced", 68.00, "Pneumatiques", 16),
        product("Liquide de refroidissement (5L)", "Ready-mix G12 coolant", 14.50, "Entretien", 22),
    ]
}

fn product(name: &str, description: &str, price: f64, category: &str, stock: i32) -> serde_json::Value {
    json!({
        "name": name,
        "description": description,
        "price": price,
        "image_url": null,
        "category": category,
        "stock": stock,
        "available": true,
    })
}
