use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    dto::products::{
        CreateProductRequest, ImportLineError, ImportReport, ProductList, UpdateProductRequest,
        UploadedImage,
    },
    error::{AppError, AppResult},
    models::{Product, decode_document, decode_or_skip},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::validate,
    state::AppState,
    store::Collection,
};

/// Bulk import cap per file.
const IMPORT_MAX_ROWS: usize = 500;

/// Storefront listing: available products only, filtered, sorted and
/// paginated in memory over the collection listing.
pub async fn list_public(state: &AppState, query: ProductQuery) -> AppResult<ApiResponse<ProductList>> {
    list_filtered(state, query, true).await
}

/// Admin listing: includes unavailable products.
pub async fn list_admin(state: &AppState, query: ProductQuery) -> AppResult<ApiResponse<ProductList>> {
    list_filtered(state, query, false).await
}

async fn list_filtered(
    state: &AppState,
    query: ProductQuery,
    available_only: bool,
) -> AppResult<ApiResponse<ProductList>> {
    let docs = state.store.list(Collection::Products).await?;
    let mut items: Vec<Product> = docs.iter().filter_map(decode_or_skip).collect();

    if available_only {
        items.retain(|p| p.available);
    }
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let needle = q.to_lowercase();
        items.retain(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
                || p.category
                    .as_deref()
                    .is_some_and(|c| c.to_lowercase().contains(&needle))
        });
    }
    if let Some(category) = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        items.retain(|p| {
            p.category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(category))
        });
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    items.sort_by(|a, b| match sort_by {
        ProductSortBy::CreatedAt => a.created_at.cmp(&b.created_at),
        ProductSortBy::Price => a.price.total_cmp(&b.price),
        ProductSortBy::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    });
    if matches!(query.sort_order, Some(SortOrder::Desc)) {
        items.reverse();
    }

    let total = items.len() as i64;
    let (page, per_page, offset) = query.pagination.normalize();
    let items = items
        .into_iter()
        .skip(offset as usize)
        .take(per_page as usize)
        .collect();

    let meta = Meta::new(page, per_page, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let doc = state
        .store
        .get(Collection::Products, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let product = decode_document(&doc).map_err(|e| AppError::Internal(e.into()))?;
    Ok(ApiResponse::success("Product", product, None))
}

pub async fn create(
    state: &AppState,
    session_id: Uuid,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    validate::require("name", &payload.name)?;
    validate_price(payload.price)?;
    validate_stock(payload.stock)?;

    let data = json!({
        "name": payload.name.trim(),
        "description": payload.description,
        "price": payload.price,
        "image_url": payload.image_url,
        "category": payload.category,
        "stock": payload.stock,
        "available": payload.available.unwrap_or(true),
    });
    let doc = state.store.create(Collection::Products, data).await?;
    let product: Product = decode_document(&doc).map_err(|e| AppError::Internal(e.into()))?;

    audit::record(
        session_id,
        "product_create",
        "products",
        json!({ "id": product.id, "name": product.name }),
    );
    Ok(ApiResponse::success("Product created", product, Some(Meta::empty())))
}

pub async fn update(
    state: &AppState,
    session_id: Uuid,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let mut patch = serde_json::Map::new();
    if let Some(name) = payload.name {
        validate::require("name", &name)?;
        patch.insert("name".into(), json!(name.trim()));
    }
    if let Some(description) = payload.description {
        patch.insert("description".into(), json!(description));
    }
    if let Some(price) = payload.price {
        validate_price(price)?;
        patch.insert("price".into(), json!(price));
    }
    if let Some(image_url) = payload.image_url {
        patch.insert("image_url".into(), json!(image_url));
    }
    if let Some(category) = payload.category {
        patch.insert("category".into(), json!(category));
    }
    if let Some(stock) = payload.stock {
        validate_stock(stock)?;
        patch.insert("stock".into(), json!(stock));
    }
    if let Some(available) = payload.available {
        patch.insert("available".into(), json!(available));
    }
    if patch.is_empty() {
        return Err(AppError::Validation("nothing to update".to_string()));
    }

    let doc = state
        .store
        .update(Collection::Products, id, patch.into())
        .await?;
    let product: Product = decode_document(&doc).map_err(|e| AppError::Internal(e.into()))?;

    audit::record(session_id, "product_update", "products", json!({ "id": id }));
    Ok(ApiResponse::success("Updated", product, Some(Meta::empty())))
}

pub async fn delete(
    state: &AppState,
    session_id: Uuid,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let removed = state.store.delete(Collection::Products, id).await?;
    if !removed {
        return Err(AppError::NotFound);
    }
    audit::record(session_id, "product_delete", "products", json!({ "id": id }));
    Ok(ApiResponse::success("Deleted", json!({}), Some(Meta::empty())))
}

pub async fn upload_image(
    state: &AppState,
    session_id: Uuid,
    content_type: &str,
    bytes: Vec<u8>,
) -> AppResult<ApiResponse<UploadedImage>> {
    if bytes.is_empty() {
        return Err(AppError::field("image", "file is empty"));
    }
    let url = state
        .images
        .store(content_type, bytes)
        .await
        .map_err(|e| AppError::Upload(e.to_string()))?;
    audit::record(session_id, "image_upload", "products", json!({ "url": url }));
    Ok(ApiResponse::success("Uploaded", UploadedImage { url }, Some(Meta::empty())))
}

/// CSV bulk import. Single pass over the lines: the header maps column
/// names to positions, each data row is validated independently and bad
/// rows are reported without aborting the good ones. Quoted fields are
/// supported; embedded newlines are not (an unterminated quote fails that
/// line only).
pub async fn import_csv(
    state: &AppState,
    session_id: Uuid,
    text: &str,
) -> AppResult<ApiResponse<ImportReport>> {
    let mut lines = text
        .lines()
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());

    let (_, header_line) = lines
        .next()
        .ok_or_else(|| AppError::Validation("the file is empty".to_string()))?;
    let header = split_csv_line(header_line)
        .map_err(|e| AppError::Validation(format!("invalid header: {e}")))?;
    let columns: Vec<String> = header.iter().map(|c| c.trim().to_lowercase()).collect();

    let position = |name: &str| columns.iter().position(|c| c == name);
    let name_col = position("name")
        .ok_or_else(|| AppError::Validation("missing required column: name".to_string()))?;
    let price_col = position("price")
        .ok_or_else(|| AppError::Validation("missing required column: price".to_string()))?;
    let description_col = position("description");
    let category_col = position("category");
    let image_col = position("image_url");
    let stock_col = position("stock");
    let available_col = position("available");

    let rows: Vec<(usize, &str)> = lines.collect();
    if rows.len() > IMPORT_MAX_ROWS {
        return Err(AppError::Validation(format!(
            "too many rows: {} (limit {IMPORT_MAX_ROWS})",
            rows.len()
        )));
    }

    let mut created = 0usize;
    let mut errors = Vec::new();
    for (index, row) in rows {
        let line = index + 1;
        let fields = match split_csv_line(row) {
            Ok(fields) => fields,
            Err(message) => {
                errors.push(ImportLineError { line, message });
                continue;
            }
        };
        let field = |col: usize| fields.get(col).map(|f| f.trim()).unwrap_or("");
        let opt_field = |col: Option<usize>| {
            col.map(field)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let name = field(name_col);
        if name.is_empty() {
            errors.push(ImportLineError {
                line,
                message: "name must not be empty".to_string(),
            });
            continue;
        }
        let price = match parse_price_field(field(price_col)) {
            Ok(price) => price,
            Err(message) => {
                errors.push(ImportLineError { line, message });
                continue;
            }
        };
        let stock = match stock_col.map(field).filter(|v| !v.is_empty()) {
            Some(raw) => match raw.parse::<i32>() {
                Ok(stock) if stock >= 0 => stock,
                _ => {
                    errors.push(ImportLineError {
                        line,
                        message: format!("invalid stock: {raw}"),
                    });
                    continue;
                }
            },
            None => 0,
        };
        let available = match available_col.map(field).filter(|v| !v.is_empty()) {
            Some(raw) => match parse_bool_field(raw) {
                Some(value) => value,
                None => {
                    errors.push(ImportLineError {
                        line,
                        message: format!("invalid available flag: {raw}"),
                    });
                    continue;
                }
            },
            None => true,
        };

        let data = json!({
            "name": name,
            "description": opt_field(description_col),
            "price": price,
            "image_url": opt_field(image_col),
            "category": opt_field(category_col),
            "stock": stock,
            "available": available,
        });
        state.store.create(Collection::Products, data).await?;
        created += 1;
    }

    audit::record(
        session_id,
        "product_import",
        "products",
        json!({ "created": created, "rejected": errors.len() }),
    );
    Ok(ApiResponse::success(
        "Import finished",
        ImportReport { created, errors },
        Some(Meta::empty()),
    ))
}

fn validate_price(price: f64) -> AppResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::field("price", "must be a non-negative number"));
    }
    Ok(())
}

fn validate_stock(stock: i32) -> AppResult<()> {
    if stock < 0 {
        return Err(AppError::field("stock", "must not be negative"));
    }
    Ok(())
}

fn parse_price_field(raw: &str) -> Result<f64, String> {
    let normalized = raw.trim().replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => Ok(price),
        _ => Err(format!("invalid price: {raw}")),
    }
}

fn parse_bool_field(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "oui" => Some(true),
        "false" | "0" | "no" | "non" => Some(false),
        _ => None,
    }
}

/// Splits one CSV line into fields. Double quotes delimit fields that
/// contain commas; a doubled quote inside a quoted field escapes it.
fn split_csv_line(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        current.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => current.push(c),
            }
        } else {
            match c {
                '"' if current.is_empty() => in_quotes = true,
                ',' => {
                    fields.push(std::mem::take(&mut current));
                }
                _ => current.push(c),
            }
        }
    }
    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(current);
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_and_quoted_fields() {
        assert_eq!(
            split_csv_line(r#"Brake pads,"Front axle, ceramic",49.90"#).unwrap(),
            vec!["Brake pads", "Front axle, ceramic", "49.90"]
        );
        assert_eq!(
            split_csv_line(r#""He said ""ok""",2"#).unwrap(),
            vec![r#"He said "ok""#, "2"]
        );
    }

    #[test]
    fn rejects_unterminated_quote() {
        assert!(split_csv_line(r#""dangling,1"#).is_err());
    }

    #[test]
    fn price_field_accepts_comma_decimal() {
        assert_eq!(parse_price_field("12,50").unwrap(), 12.5);
        assert!(parse_price_field("free").is_err());
        assert!(parse_price_field("-1").is_err());
    }
}
