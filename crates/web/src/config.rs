//! Application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `EXPRESSLY_BASE_URL` - Public URL for the site
//! - `IDENTITY_API_URL` - Base URL of the identity service
//! - `IDENTITY_API_KEY` - Identity service project API key (high entropy)
//! - `DOCSTORE_API_URL` - Base URL of the document store
//! - `DOCSTORE_API_TOKEN` - Document store API token (high entropy)
//!
//! ## Optional
//! - `EXPRESSLY_HOST` - Bind address (default: 127.0.0.1)
//! - `EXPRESSLY_PORT` - Listen port (default: 3000)
//! - `EXPRESSLY_ADMIN_PANEL` - Expose the members admin panel (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
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

/// Application configuration.
#[derive(Debug, Clone)]
pub struct ExpresslyConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the site
    pub base_url: String,
    /// Identity service configuration
    pub identity: IdentityConfig,
    /// Document store configuration
    pub store: DocumentStoreConfig,
    /// Whether the members admin panel is exposed
    pub admin_panel_enabled: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Identity service configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct IdentityConfig {
    /// Base URL of the identity service
    pub base_url: String,
    /// Project API key
    pub api_key: SecretString,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Document store configuration.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct DocumentStoreConfig {
    /// Base URL of the document store
    pub base_url: String,
    /// API token
    pub api_token: SecretString,
}

impl std::fmt::Debug for DocumentStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStoreConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

impl ExpresslyConfig {
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

        let host = get_env_or_default("EXPRESSLY_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("EXPRESSLY_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("EXPRESSLY_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("EXPRESSLY_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("EXPRESSLY_BASE_URL")?;
        let admin_panel_enabled = get_env_or_default("EXPRESSLY_ADMIN_PANEL", "true")
            .parse::<bool>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("EXPRESSLY_ADMIN_PANEL".to_string(), e.to_string())
            })?;

        let identity = IdentityConfig::from_env()?;
        let store = DocumentStoreConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            host,
            port,
            base_url,
            identity,
            store,
            admin_panel_enabled,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl IdentityConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: get_required_env("IDENTITY_API_URL")?,
            api_key: get_validated_secret("IDENTITY_API_KEY")?,
        })
    }
}

impl DocumentStoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: get_required_env("DOCSTORE_API_URL")?,
            api_token: get_validated_secret("DOCSTORE_API_TOKEN")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
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
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
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
