//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SUPABASE_URL` - Project URL (e.g., `https://abc.supabase.co`)
//! - `SUPABASE_ANON_KEY` - Public anon key (safe to expose; RLS applies)
//! - `SUPABASE_SERVICE_ROLE_KEY` - Service role key (server-side only, bypasses RLS)
//!
//! ## Optional
//! - `USHOP_HOST` - Bind address (default: 127.0.0.1)
//! - `USHOP_PORT` - Listen port (default: 3000)
//! - `USHOP_CORS_ORIGINS` - Comma-separated allowed origins (default: none)
//! - `LLM_GATEWAY_URL` - OpenAI-compatible gateway base URL (enables AI features)
//! - `LLM_API_KEY` - Gateway API key (required when `LLM_GATEWAY_URL` is set)
//! - `LLM_MODEL` - Text model (default: google/gemini-2.5-flash)
//! - `LLM_IMAGE_MODEL` - Image model (default: google/gemini-2.5-flash-image-preview)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_LLM_MODEL: &str = "google/gemini-2.5-flash";
const DEFAULT_LLM_IMAGE_MODEL: &str = "google/gemini-2.5-flash-image-preview";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Origins allowed by CORS (the SPA's URL)
    pub cors_origins: Vec<String>,
    /// Supabase project configuration
    pub supabase: SupabaseConfig,
    /// LLM gateway configuration (AI features are disabled when absent)
    pub llm: Option<LlmConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production")
    pub sentry_environment: Option<String>,
}

/// Supabase project configuration.
///
/// Implements `Debug` manually to redact the service role key.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL without trailing slash
    pub url: String,
    /// Public anon key
    pub anon_key: String,
    /// Service role key (bypasses RLS)
    pub service_role_key: SecretString,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &self.anon_key)
            .field("service_role_key", &"[REDACTED]")
            .finish()
    }
}

/// LLM gateway configuration.
#[derive(Clone)]
pub struct LlmConfig {
    /// Gateway base URL without trailing slash
    pub gateway_url: String,
    /// Gateway API key
    pub api_key: SecretString,
    /// Model used for text generation
    pub model: String,
    /// Model used for image generation
    pub image_model: String,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("gateway_url", &self.gateway_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("image_model", &self.image_model)
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("USHOP_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("USHOP_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("USHOP_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("USHOP_PORT".to_string(), e.to_string()))?;
        let cors_origins = parse_origins(&get_env_or_default("USHOP_CORS_ORIGINS", ""));

        Ok(Self {
            host,
            port,
            cors_origins,
            supabase: SupabaseConfig::from_env()?,
            llm: LlmConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl SupabaseConfig {
    /// Load the Supabase block on its own (also used by the CLI).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is missing or the URL is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = get_required_env("SUPABASE_URL")?;
        validate_url("SUPABASE_URL", &url)?;
        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: get_required_env("SUPABASE_ANON_KEY")?,
            service_role_key: get_validated_secret("SUPABASE_SERVICE_ROLE_KEY")?,
        })
    }
}

impl LlmConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(gateway_url) = get_optional_env("LLM_GATEWAY_URL") else {
            return Ok(None);
        };
        validate_url("LLM_GATEWAY_URL", &gateway_url)?;

        Ok(Some(Self {
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
            api_key: get_validated_secret("LLM_API_KEY")?,
            model: get_env_or_default("LLM_MODEL", DEFAULT_LLM_MODEL),
            image_model: get_env_or_default("LLM_IMAGE_MODEL", DEFAULT_LLM_IMAGE_MODEL),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn validate_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", parsed.scheme()),
        ));
    }
    Ok(())
}

/// Split a comma-separated origin list, dropping blanks.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_end_matches('/').to_string())
        .collect()
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the provider."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
