//! Repositories over the Supabase tables.
//!
//! # Tables
//!
//! - `profiles` - one per auth user, holds the role
//! - `vendors` - shop applications and approved shops
//! - `products` - listings, owned by a vendor
//! - `categories` - shared taxonomy for shops and products
//! - `ratings` - one star rating per user and vendor
//! - `saved_shops` - user bookmarks
//! - `reports` - abuse reports, moderated by admins
//!
//! The schema and its RLS policies live in the Supabase project. Repositories
//! take an [`Auth`](crate::supabase::Auth) per call so RLS sees the real caller.

pub mod categories;
pub mod products;
pub mod profiles;
pub mod ratings;
pub mod reports;
pub mod saved_shops;
pub mod vendors;

pub use categories::CategoryRepository;
pub use products::{ProductQuery, ProductRepository, ProductSort};
pub use profiles::ProfileRepository;
pub use ratings::RatingRepository;
pub use reports::ReportRepository;
pub use saved_shops::SavedShopRepository;
pub use vendors::{VendorRepository, VendorSort};

/// Table names.
pub mod tables {
    pub const PROFILES: &str = "profiles";
    pub const VENDORS: &str = "vendors";
    pub const PRODUCTS: &str = "products";
    pub const CATEGORIES: &str = "categories";
    pub const RATINGS: &str = "ratings";
    pub const SAVED_SHOPS: &str = "saved_shops";
    pub const REPORTS: &str = "reports";
}

/// Storage buckets.
pub mod buckets {
    pub const VENDOR_IMAGES: &str = "vendor-images";
    pub const PRODUCT_IMAGES: &str = "product-images";
}
