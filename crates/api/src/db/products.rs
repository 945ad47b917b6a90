//! Product repository.

use rust_decimal::Decimal;
use ushop_core::{CategoryId, ProductId, VendorId, VendorStatus};

use super::tables::PRODUCTS;
use crate::models::{NewProduct, Product, ProductPatch};
use crate::supabase::{Auth, Filter, SupabaseClient, SupabaseError};

/// Select with the owning vendor inner-joined, so filters on
/// `vendors.status` drop products of unapproved shops.
const PUBLIC_SELECT: &str = "*,vendors!inner(id,business_name,status,is_verified,logo_url)";

/// Database-side orderings for product lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

/// Filters for the public product list.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub category: Option<CategoryId>,
    pub vendor: Option<VendorId>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub available_only: bool,
    pub sort: ProductSort,
    pub limit: u32,
    pub offset: u32,
}

impl ProductQuery {
    fn to_filter(&self) -> Filter {
        let mut filter = public_filter();
        if let Some(category) = self.category {
            filter = filter.eq("category_id", category);
        }
        if let Some(vendor) = self.vendor {
            filter = filter.eq("vendor_id", vendor);
        }
        // A range [min, max] overlaps [lo, hi] when max >= lo and min <= hi.
        // Listings without a max compare on min.
        if let Some(lo) = self.min_price {
            filter = filter.or_any(&[
                ("price_max", "gte", lo.to_string()),
                ("price_min", "gte", lo.to_string()),
            ]);
        }
        if let Some(hi) = self.max_price {
            filter = filter.lte("price_min", hi);
        }
        if self.available_only {
            filter = filter.eq("is_available", true);
        }
        filter = match self.sort {
            ProductSort::Newest => filter.order_desc("created_at"),
            ProductSort::PriceAsc => filter.order_asc("price_min"),
            ProductSort::PriceDesc => filter.order_desc("price_min"),
            ProductSort::Name => filter.order_asc("name"),
        };
        filter.order_asc("id").limit(self.limit).offset(self.offset)
    }
}

fn public_filter() -> Filter {
    Filter::new()
        .select(PUBLIC_SELECT)
        .eq("vendors.status", VendorStatus::Approved)
}

/// Repository for `products`.
pub struct ProductRepository<'a> {
    client: &'a SupabaseClient,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(client: &'a SupabaseClient) -> Self {
        Self { client }
    }

    /// Public product list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_public(&self, query: &ProductQuery) -> Result<Vec<Product>, SupabaseError> {
        self.client
            .select(PRODUCTS, &query.to_filter(), Auth::Anon)
            .await
    }

    /// A product of an approved vendor.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_public(&self, id: ProductId) -> Result<Option<Product>, SupabaseError> {
        let filter = public_filter().eq("id", id);
        self.client.select_one(PRODUCTS, &filter, Auth::Anon).await
    }

    /// All of one vendor's products, newest first, regardless of vendor status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_for_vendor(
        &self,
        vendor: VendorId,
        auth: Auth<'_>,
    ) -> Result<Vec<Product>, SupabaseError> {
        let filter = Filter::new()
            .eq("vendor_id", vendor)
            .order_desc("created_at");
        self.client.select(PRODUCTS, &filter, auth).await
    }

    /// A product only if it belongs to `vendor`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_owned(
        &self,
        id: ProductId,
        vendor: VendorId,
        auth: Auth<'_>,
    ) -> Result<Option<Product>, SupabaseError> {
        let filter = Filter::new().eq("id", id).eq("vendor_id", vendor);
        self.client.select_one(PRODUCTS, &filter, auth).await
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn create(&self, product: &NewProduct, auth: Auth<'_>) -> Result<Product, SupabaseError> {
        self.client.insert(PRODUCTS, product, auth).await
    }

    /// Patch a product owned by `vendor`.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::NotFound` if no owned product matched.
    pub async fn update(
        &self,
        id: ProductId,
        vendor: VendorId,
        patch: &ProductPatch,
        auth: Auth<'_>,
    ) -> Result<Product, SupabaseError> {
        let filter = Filter::new().eq("id", id).eq("vendor_id", vendor);
        let mut body = serde_json::to_value(patch)?;
        if let Some(map) = body.as_object_mut() {
            map.insert("updated_at".to_string(), serde_json::json!(chrono::Utc::now()));
        }
        let rows: Vec<Product> = self.client.update(PRODUCTS, &filter, &body, auth).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| SupabaseError::NotFound(format!("product {id}")))
    }

    /// Delete a product owned by `vendor`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete(
        &self,
        id: ProductId,
        vendor: VendorId,
        auth: Auth<'_>,
    ) -> Result<(), SupabaseError> {
        let filter = Filter::new().eq("id", id).eq("vendor_id", vendor);
        self.client.delete(PRODUCTS, &filter, auth).await
    }

    /// Products of approved vendors whose name or description contains `term`, newest first.
    ///
    /// At most `window` rows come back; callers rank and trim them.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn search(
        &self,
        term: &str,
        category: Option<CategoryId>,
        window: u32,
    ) -> Result<Vec<Product>, SupabaseError> {
        let mut filter = public_filter().or_ilike(&["name", "description"], term);
        if let Some(category) = category {
            filter = filter.eq("category_id", category);
        }
        let filter = filter.order_desc("created_at").limit(window);
        self.client.select(PRODUCTS, &filter, Auth::Anon).await
    }

    /// Total number of products. Service role only.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn count_all(&self) -> Result<u64, SupabaseError> {
        self.client
            .count(PRODUCTS, &Filter::new(), Auth::Service)
            .await
    }
}
