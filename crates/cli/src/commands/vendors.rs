//! Vendor moderation commands.
//!
//! Output goes through `tracing` at info level, one line per shop.

use ushop_api::models::Vendor;
use ushop_api::services::{ModerationError, ModerationService};
use ushop_api::supabase::SupabaseClient;
use ushop_core::{VendorId, VendorStatus};

/// List applications in `status`.
///
/// # Errors
///
/// Returns an error if the Supabase request fails.
pub async fn list(client: &SupabaseClient, status: VendorStatus) -> Result<(), ModerationError> {
    let vendors = ModerationService::new(client).list(status).await?;
    if vendors.is_empty() {
        tracing::info!("No {} applications", status);
        return Ok(());
    }

    tracing::info!("{} {} application(s):", vendors.len(), status);
    for vendor in &vendors {
        tracing::info!("  {}", summary_line(vendor));
    }
    Ok(())
}

/// Approve a pending application.
///
/// # Errors
///
/// Returns an error if the shop is missing or not pending.
pub async fn approve(client: &SupabaseClient, id: VendorId) -> Result<(), ModerationError> {
    let vendor = ModerationService::new(client).approve(id).await?;
    tracing::info!("Approved: {}", summary_line(&vendor));
    Ok(())
}

/// Reject a pending application.
///
/// # Errors
///
/// Returns an error if the reason is blank or the shop is not pending.
pub async fn reject(
    client: &SupabaseClient,
    id: VendorId,
    reason: &str,
) -> Result<(), ModerationError> {
    let vendor = ModerationService::new(client).reject(id, reason).await?;
    tracing::info!("Rejected: {}", summary_line(&vendor));
    Ok(())
}

/// Set or clear the verified badge.
///
/// # Errors
///
/// Returns an error if the shop is missing.
pub async fn verify(
    client: &SupabaseClient,
    id: VendorId,
    verified: bool,
) -> Result<(), ModerationError> {
    let vendor = ModerationService::new(client)
        .set_verified(id, verified)
        .await?;
    tracing::info!("Updated: {}", summary_line(&vendor));
    Ok(())
}

/// Show platform counters.
///
/// # Errors
///
/// Returns an error if any count fails.
pub async fn stats(client: &SupabaseClient) -> Result<(), ModerationError> {
    let stats = ModerationService::new(client).stats().await?;
    tracing::info!("Vendors pending:  {}", stats.vendors_pending);
    tracing::info!("Vendors approved: {}", stats.vendors_approved);
    tracing::info!("Vendors rejected: {}", stats.vendors_rejected);
    tracing::info!("Products:         {}", stats.products);
    tracing::info!("Open reports:     {}", stats.open_reports);
    Ok(())
}

fn summary_line(vendor: &Vendor) -> String {
    let mut line = format!(
        "{}  {}  [{}]",
        vendor.id, vendor.business_name, vendor.status
    );
    if vendor.is_verified {
        line.push_str(" verified");
    }
    if let Some(reason) = &vendor.rejection_reason {
        line.push_str(&format!(" (reason: {reason})"));
    }
    line.push_str(&format!("  applied {}", vendor.created_at.format("%Y-%m-%d")));
    line
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_line() {
        let vendor: Vendor = serde_json::from_value(serde_json::json!({
            "id": "5f0c3c84-2a4a-4c56-9f6a-9d2f5d1e7a10",
            "owner_id": "a3a1f1de-7f0a-4d7e-9d0c-3c3b6f0e1a21",
            "business_name": "Corner Bakery",
            "status": "rejected",
            "rejection_reason": "Missing address",
            "created_at": "2025-03-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(
            summary_line(&vendor),
            "5f0c3c84-2a4a-4c56-9f6a-9d2f5d1e7a10  Corner Bakery  [rejected] (reason: Missing address)  applied 2025-03-01"
        );
    }
}
