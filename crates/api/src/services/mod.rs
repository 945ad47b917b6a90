//! Business logic services.
//!
//! # Services
//!
//! - `analytics` - Per-vendor dashboard aggregates
//! - `moderation` - Vendor approval, verification and report handling

pub mod analytics;
pub mod moderation;

pub use analytics::{VendorAnalytics, vendor_analytics};
pub use moderation::{ModerationError, ModerationService, PlatformStats};
