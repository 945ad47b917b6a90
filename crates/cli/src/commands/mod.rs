//! CLI command implementations.
//!
//! # Environment Variables
//!
//! - `SUPABASE_URL` - Supabase project URL
//! - `SUPABASE_ANON_KEY` - Public anon key
//! - `SUPABASE_SERVICE_ROLE_KEY` - Service role key (moderation bypasses RLS)

pub mod vendors;

use thiserror::Error;
use ushop_api::config::{ConfigError, SupabaseConfig};
use ushop_api::services::ModerationError;
use ushop_api::supabase::SupabaseClient;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The moderation action was refused or failed.
    #[error("{0}")]
    Moderation(#[from] ModerationError),
}

/// Build a Supabase client from the environment (`.env` is loaded if present).
///
/// # Errors
///
/// Returns `CommandError::Config` if a Supabase variable is missing.
pub fn connect() -> Result<SupabaseClient, CommandError> {
    dotenvy::dotenv().ok();
    let config = SupabaseConfig::from_env()?;
    tracing::debug!(url = %config.url, "Using Supabase project");
    Ok(SupabaseClient::new(&config))
}
