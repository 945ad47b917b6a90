//! Product route handlers.
//!
//! Reads are public and limited to approved shops. Writes need an approved
//! vendor and only touch that vendor's own listings; another shop's product
//! answers 404 exactly like a missing one.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use tracing::{info, instrument};
use ushop_core::{CategoryId, PriceRange, ProductId, VendorId};
use uuid::Uuid;

use crate::db::{ProductQuery, ProductRepository, ProductSort, buckets};
use crate::error::{AppError, Result};
use crate::middleware::RequireVendor;
use crate::models::{NewProduct, Product, ProductPatch};
use crate::state::AppState;

use super::upload::read_image;
use super::validate::{optional_text, page_limit, required_text};

const DEFAULT_PAGE: u32 = 20;
const MAX_PAGE: u32 = 50;

/// Most images one listing may carry.
pub const MAX_IMAGES: usize = 6;

const NAME_CHARS: (usize, usize) = (2, 120);
const MAX_DESCRIPTION_CHARS: usize = 2000;

// =============================================================================
// Public reads
// =============================================================================

/// Query string of `GET /api/products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub category: Option<CategoryId>,
    pub vendor: Option<VendorId>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Only listings marked available.
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub sort: ProductSort,
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: u32,
}

impl ProductListQuery {
    fn to_query(&self) -> Result<ProductQuery> {
        if let (Some(lo), Some(hi)) = (self.min_price, self.max_price)
            && lo > hi
        {
            return Err(AppError::BadRequest(
                "min_price cannot exceed max_price".to_string(),
            ));
        }
        Ok(ProductQuery {
            category: self.category,
            vendor: self.vendor,
            min_price: self.min_price,
            max_price: self.max_price,
            available_only: self.available,
            sort: self.sort,
            limit: page_limit(self.limit, DEFAULT_PAGE, MAX_PAGE),
            offset: self.offset,
        })
    }
}

/// Products of approved shops.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.supabase())
        .list_public(&query.to_query()?)
        .await?;
    Ok(Json(products))
}

/// One product of an approved shop.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.supabase())
        .get_public(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

/// Public products of one shop.
#[instrument(skip(state))]
pub async fn for_vendor(
    State(state): State<AppState>,
    Path(vendor): Path<VendorId>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Vec<Product>>> {
    let query = ProductListQuery {
        vendor: Some(vendor),
        ..query
    };
    let products = ProductRepository::new(state.supabase())
        .list_public(&query.to_query()?)
        .await?;
    Ok(Json(products))
}

/// All of the caller's products, including unavailable ones.
pub async fn mine(
    State(state): State<AppState>,
    RequireVendor { caller, vendor }: RequireVendor,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.supabase())
        .list_for_vendor(vendor.id, caller.auth())
        .await?;
    Ok(Json(products))
}

// =============================================================================
// Vendor writes
// =============================================================================

/// Body of `POST /api/products`.
#[derive(Debug, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price_min: Decimal,
    pub price_max: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<String>,
    pub category_id: Option<CategoryId>,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

const fn default_true() -> bool {
    true
}

/// Body of `PATCH /api/products/{id}`. Absent fields are left unchanged;
/// `"price_max": null` clears the maximum.
#[derive(Debug, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_min: Option<Decimal>,
    #[serde(default, deserialize_with = "present")]
    pub price_max: Option<Option<Decimal>>,
    pub images: Option<Vec<String>>,
    pub category_id: Option<CategoryId>,
    pub is_available: Option<bool>,
}

/// Distinguish an explicit `null` from an absent field.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn validate_price(min: Decimal, max: Option<Decimal>) -> Result<PriceRange> {
    PriceRange::new(min, max).map_err(|e| AppError::BadRequest(e.to_string()))
}

fn validate_images(images: Vec<String>) -> Result<Vec<String>> {
    let images: Vec<String> = images
        .into_iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect();
    if images.len() > MAX_IMAGES {
        return Err(AppError::BadRequest(format!(
            "a product can have at most {MAX_IMAGES} images"
        )));
    }
    if let Some(bad) = images.iter().find(|url| !is_http_url(url)) {
        return Err(AppError::BadRequest(format!("invalid image URL: {bad}")));
    }
    Ok(images)
}

fn is_http_url(value: &str) -> bool {
    url::Url::parse(value).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

/// Create a listing in the caller's shop.
#[instrument(skip(state, caller, vendor, body), fields(vendor_id = %vendor.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireVendor { caller, vendor }: RequireVendor,
    Json(body): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let price = validate_price(body.price_min, body.price_max)?;
    let new_product = NewProduct {
        vendor_id: vendor.id,
        name: required_text("name", &body.name, NAME_CHARS.0, NAME_CHARS.1)?,
        description: optional_text("description", body.description.as_deref(), MAX_DESCRIPTION_CHARS)?,
        price_min: price.min(),
        price_max: price.max(),
        images: validate_images(body.images)?,
        category_id: body.category_id,
        is_available: body.is_available,
    };

    let product = ProductRepository::new(state.supabase())
        .create(&new_product, caller.auth())
        .await?;
    state.search().invalidate_all();
    info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Edit one of the caller's listings.
#[instrument(skip(state, caller, vendor, body), fields(vendor_id = %vendor.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireVendor { caller, vendor }: RequireVendor,
    Path(id): Path<ProductId>,
    Json(body): Json<ProductUpdate>,
) -> Result<Json<Product>> {
    let repo = ProductRepository::new(state.supabase());
    let existing = repo
        .get_owned(id, vendor.id, caller.auth())
        .await?
        .ok_or_else(not_found)?;

    // Validate the range the row will end up with.
    let min = body.price_min.unwrap_or(existing.price_min);
    let max = body.price_max.unwrap_or(existing.price_max);
    let price = validate_price(min, max)?;
    let price_changed = body.price_min.is_some() || body.price_max.is_some();

    let patch = ProductPatch {
        name: body
            .name
            .as_deref()
            .map(|n| required_text("name", n, NAME_CHARS.0, NAME_CHARS.1))
            .transpose()?,
        description: optional_text("description", body.description.as_deref(), MAX_DESCRIPTION_CHARS)?,
        price_min: price_changed.then(|| price.min()),
        price_max: price_changed.then(|| price.max()),
        images: body.images.map(validate_images).transpose()?,
        category_id: body.category_id,
        is_available: body.is_available,
    };

    let product = repo.update(id, vendor.id, &patch, caller.auth()).await?;
    state.search().invalidate_all();
    Ok(Json(product))
}

/// Delete one of the caller's listings.
#[instrument(skip(state, caller, vendor), fields(vendor_id = %vendor.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireVendor { caller, vendor }: RequireVendor,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    let repo = ProductRepository::new(state.supabase());
    repo.get_owned(id, vendor.id, caller.auth())
        .await?
        .ok_or_else(not_found)?;
    repo.delete(id, vendor.id, caller.auth()).await?;
    state.search().invalidate_all();
    info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Upload an image and append it to one of the caller's listings.
#[instrument(skip_all, fields(vendor_id = %vendor.id, product_id = %id))]
pub async fn upload_image(
    State(state): State<AppState>,
    RequireVendor { caller, vendor }: RequireVendor,
    Path(id): Path<ProductId>,
    mut multipart: Multipart,
) -> Result<Json<Product>> {
    let repo = ProductRepository::new(state.supabase());
    let product = repo
        .get_owned(id, vendor.id, caller.auth())
        .await?
        .ok_or_else(not_found)?;
    if product.images.len() >= MAX_IMAGES {
        return Err(AppError::Conflict(format!(
            "a product can have at most {MAX_IMAGES} images"
        )));
    }

    let image = read_image(&mut multipart).await?;
    let path = format!("{}/{}/{}.{}", vendor.id, id, Uuid::new_v4(), image.extension);
    let url = state
        .supabase()
        .upload_object(
            buckets::PRODUCT_IMAGES,
            &path,
            image.bytes,
            image.content_type,
            caller.auth(),
        )
        .await?;

    let mut images = product.images;
    images.push(url);
    let patch = ProductPatch {
        images: Some(images),
        ..ProductPatch::default()
    };
    let product = repo.update(id, vendor.id, &patch, caller.auth()).await?;
    state.search().invalidate_all();
    Ok(Json(product))
}

fn not_found() -> AppError {
    AppError::NotFound("Product not found".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let absent: ProductUpdate = serde_json::from_str(r#"{"name": "Rye"}"#).unwrap();
        assert_eq!(absent.price_max, None);

        let cleared: ProductUpdate = serde_json::from_str(r#"{"price_max": null}"#).unwrap();
        assert_eq!(cleared.price_max, Some(None));

        let set: ProductUpdate = serde_json::from_str(r#"{"price_max": "12.50"}"#).unwrap();
        assert_eq!(set.price_max, Some(Some(Decimal::new(1250, 2))));
    }

    #[test]
    fn test_validate_images() {
        let urls = |n: usize| (0..n).map(|i| format!("https://cdn.test/{i}.jpg")).collect();
        assert_eq!(validate_images(urls(6)).unwrap().len(), 6);
        assert!(validate_images(urls(7)).is_err());
        assert!(validate_images(vec!["javascript:alert(1)".to_string()]).is_err());
        assert_eq!(
            validate_images(vec!["  ".to_string(), " https://a.test/x.png ".to_string()]).unwrap(),
            vec!["https://a.test/x.png"]
        );
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(Decimal::new(10, 0), Some(Decimal::new(5, 0))).is_err());
        assert!(validate_price(Decimal::new(-1, 0), None).is_err());
        let price = validate_price(Decimal::new(10, 0), Some(Decimal::new(10, 0))).unwrap();
        assert_eq!(price.max(), None);
    }

    #[test]
    fn test_list_query_rejects_inverted_bounds() {
        let query = ProductListQuery {
            min_price: Some(Decimal::new(50, 0)),
            max_price: Some(Decimal::new(10, 0)),
            ..ProductListQuery::default()
        };
        assert!(query.to_query().is_err());
    }

    #[test]
    fn test_list_query_clamps_limit() {
        let query = ProductListQuery {
            limit: Some(1000),
            ..ProductListQuery::default()
        };
        assert_eq!(query.to_query().unwrap().limit, MAX_PAGE);
    }
}
