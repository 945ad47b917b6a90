//! Row types mirroring the Supabase tables.
//!
//! Each module holds the row as read back from PostgREST plus the insert and
//! patch bodies written to it. Patch bodies skip `None` fields so PATCH only
//! touches what the caller sent.

pub mod category;
pub mod product;
pub mod profile;
pub mod rating;
pub mod report;
pub mod saved_shop;
pub mod vendor;

pub use category::{Category, NewCategory, slugify};
pub use product::{NewProduct, Product, ProductPatch, VendorSummary};
pub use profile::Profile;
pub use rating::{Rating, RatingSummary, RatingUpsert};
pub use report::{NewReport, Report};
pub use saved_shop::SavedShop;
pub use vendor::{NewVendor, Vendor, VendorPatch};
