//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `KONVY_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `KONVY_BASE_URL` - Public URL for the storefront
//! - `KONVY_ADMIN_PASSWORD` - Owner dashboard password (min 12 chars, high entropy)
//!
//! ## Optional
//! - `KONVY_HOST` - Bind address (default: 127.0.0.1)
//! - `KONVY_PORT` - Listen port (default: 3000)
//! - `KONVY_ADMIN_USERNAME` - Owner account username (default: Konvy)
//! - `KONVY_ADMIN_EMAIL` - Owner account email (default: admin@konvy.local)
//! - `KONVY_REDEMPTION_POLICY` - `provisional` or `issued_only` (default: provisional)
//! - `KONVY_REDEEMED_PRODUCT_NAME` - Product name for customer-submitted orders
//! - `KONVY_REDEEMED_PRODUCT_DESCRIPTION` - Description for customer-submitted orders
//! - `KONVY_AUTH_RATE_LIMIT_BURST` - Credential attempts allowed per client before throttling (default: 5)
//! - `KONVY_AUTH_RATE_LIMIT_REPLENISH_SECS` - Seconds until one more attempt is allowed (default: 6)
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_STOREFRONT_ACCESS_TOKEN` - Storefront API access token
//! - `SHOPIFY_API_VERSION` - API version (default: 2024-01)
//! - `TRACKING_REDEMPTION_URL` - Form endpoint notified of redemptions
//! - `TRACKING_REGISTRATION_URL` - Form endpoint notified of registrations
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)
//!
//! The catalog and checkout proxies fail closed when either Shopify variable
//! is missing; the rest of the server still starts.

use std::net::{IpAddr, SocketAddr};
use std::num::{NonZeroU32, NonZeroU64};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use konvy_core::Email;

const MIN_ADMIN_PASSWORD_LENGTH: usize = 12;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Owner username when `KONVY_ADMIN_USERNAME` is unset.
pub const DEFAULT_ADMIN_USERNAME: &str = "Konvy";
const DEFAULT_ADMIN_EMAIL: &str = "admin@konvy.local";
const DEFAULT_REDEEMED_PRODUCT_NAME: &str = "Fortnite Account";
const DEFAULT_REDEEMED_PRODUCT_DESCRIPTION: &str = "Premium Fortnite Account with Skins";

/// Fragments of template values, matched case-insensitively.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "changeme",
    "change-me",
    "placeholder",
    "password",
    "secret",
    "example",
    "your-",
    "replace",
    "konvy",
    "admin",
    "xxx",
    "todo",
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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// Owner account bootstrap settings
    pub admin: AdminConfig,
    /// Shopify Storefront API configuration, absent when not deployed
    pub shopify: Option<ShopifyStorefrontConfig>,
    /// Customer redemption settings
    pub redemption: RedemptionConfig,
    /// Side-channel tracking endpoints
    pub tracking: TrackingConfig,
    /// Throttling of the credential endpoints
    pub auth_rate_limit: AuthRateLimitConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

/// Owner account configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct AdminConfig {
    pub username: String,
    pub email: Email,
    pub password: SecretString,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Shopify Storefront API configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopifyStorefrontConfig {
    /// Shopify store domain (e.g., your-store.myshopify.com)
    pub store: String,
    /// Shopify API version (e.g., 2024-01)
    pub api_version: String,
    /// Storefront API access token
    pub access_token: SecretString,
}

impl std::fmt::Debug for ShopifyStorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyStorefrontConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// What happens when a customer submits a code no admin has issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedemptionPolicy {
    /// Record a pending order for the submitter; the owner reviews it.
    #[default]
    Provisional,
    /// Reject codes that were not created from the admin dashboard.
    IssuedOnly,
}

impl FromStr for RedemptionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "provisional" => Ok(Self::Provisional),
            "issued_only" | "issued-only" => Ok(Self::IssuedOnly),
            other => Err(format!(
                "expected `provisional` or `issued_only`, got `{other}`"
            )),
        }
    }
}

/// Customer redemption settings.
#[derive(Debug, Clone)]
pub struct RedemptionConfig {
    pub policy: RedemptionPolicy,
    /// Product name recorded on customer-submitted orders
    pub product_name: String,
    /// Description recorded on customer-submitted orders
    pub product_description: String,
}

/// Form endpoints notified (best effort) of customer activity.
#[derive(Debug, Clone, Default)]
pub struct TrackingConfig {
    pub redemption_url: Option<Url>,
    pub registration_url: Option<Url>,
}

/// Per-client quota on login and registration attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthRateLimitConfig {
    /// Attempts allowed back to back
    pub burst: NonZeroU32,
    /// Seconds for one spent attempt to come back
    pub replenish_secs: NonZeroU64,
}

impl Default for AuthRateLimitConfig {
    fn default() -> Self {
        Self {
            burst: NonZeroU32::new(5).unwrap_or(NonZeroU32::MIN),
            replenish_secs: NonZeroU64::new(6).unwrap_or(NonZeroU64::MIN),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the admin password fails validation (placeholder detection,
    /// length, entropy).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = database_url("KONVY_DATABASE_URL")?;
        let host = parsed("KONVY_HOST", "127.0.0.1")?;
        let port = parsed("KONVY_PORT", "3000")?;
        let base_url = url("KONVY_BASE_URL", &required("KONVY_BASE_URL")?)?;

        let admin = AdminConfig::from_env()?;
        let shopify = ShopifyStorefrontConfig::from_env();
        let redemption = RedemptionConfig::from_env()?;
        let tracking = TrackingConfig::from_env()?;
        let auth_rate_limit = AuthRateLimitConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            admin,
            shopify,
            redemption,
            tracking,
            auth_rate_limit,
            sentry_dsn: var("SENTRY_DSN"),
            sentry_environment: var("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parsed("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parsed("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the public URL is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }

    /// Local settings with Shopify and tracking disabled.
    #[cfg(test)]
    #[allow(clippy::unwrap_used)]
    pub(crate) fn for_tests() -> Self {
        Self {
            database_url: SecretString::from("postgres://localhost/konvy_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: Url::parse("http://localhost:3000").unwrap(),
            admin: AdminConfig {
                username: DEFAULT_ADMIN_USERNAME.to_string(),
                email: Email::parse(DEFAULT_ADMIN_EMAIL).unwrap(),
                password: SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6"),
            },
            shopify: None,
            redemption: RedemptionConfig {
                policy: RedemptionPolicy::default(),
                product_name: DEFAULT_REDEEMED_PRODUCT_NAME.to_string(),
                product_description: DEFAULT_REDEEMED_PRODUCT_DESCRIPTION.to_string(),
            },
            tracking: TrackingConfig::default(),
            auth_rate_limit: AuthRateLimitConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

impl AdminConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let email = var_or("KONVY_ADMIN_EMAIL", DEFAULT_ADMIN_EMAIL);
        let email = Email::parse(&email).map_err(|e| {
            ConfigError::InvalidEnvVar("KONVY_ADMIN_EMAIL".to_string(), e.to_string())
        })?;

        Ok(Self {
            username: admin_username(),
            email,
            password: admin_password("KONVY_ADMIN_PASSWORD")?,
        })
    }
}

impl ShopifyStorefrontConfig {
    fn from_env() -> Option<Self> {
        Self::from_parts(
            var("SHOPIFY_STORE"),
            var("SHOPIFY_STOREFRONT_ACCESS_TOKEN"),
            var_or("SHOPIFY_API_VERSION", "2024-01"),
        )
    }

    /// Both the store domain and the token are needed; anything less
    /// disables the proxies.
    fn from_parts(
        store: Option<String>,
        access_token: Option<String>,
        api_version: String,
    ) -> Option<Self> {
        let store = store.filter(|s| !s.trim().is_empty())?;
        let access_token = access_token.filter(|t| !t.trim().is_empty())?;
        Some(Self {
            store: store.trim().to_string(),
            api_version,
            access_token: SecretString::from(access_token),
        })
    }
}

impl RedemptionConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            policy: parsed("KONVY_REDEMPTION_POLICY", "provisional")?,
            product_name: var_or(
                "KONVY_REDEEMED_PRODUCT_NAME",
                DEFAULT_REDEEMED_PRODUCT_NAME,
            ),
            product_description: var_or(
                "KONVY_REDEEMED_PRODUCT_DESCRIPTION",
                DEFAULT_REDEEMED_PRODUCT_DESCRIPTION,
            ),
        })
    }
}

impl TrackingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            redemption_url: optional_url("TRACKING_REDEMPTION_URL")?,
            registration_url: optional_url("TRACKING_REGISTRATION_URL")?,
        })
    }
}

impl AuthRateLimitConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            burst: parsed(
                "KONVY_AUTH_RATE_LIMIT_BURST",
                &defaults.burst.to_string(),
            )?,
            replenish_secs: parsed(
                "KONVY_AUTH_RATE_LIMIT_REPLENISH_SECS",
                &defaults.replenish_secs.to_string(),
            )?,
        })
    }
}

// =============================================================================
// Environment access
// =============================================================================

/// Owner username from `KONVY_ADMIN_USERNAME`, or [`DEFAULT_ADMIN_USERNAME`].
///
/// Shared with the CLI so both resolve the same owner account.
#[must_use]
pub fn admin_username() -> String {
    username_or_default(var("KONVY_ADMIN_USERNAME"))
}

fn username_or_default(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string())
}

/// A variable's value; empty counts as unset.
fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn var_or(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|| default.to_string())
}

fn required(key: &str) -> Result<String, ConfigError> {
    var(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// `key`, or the bare `DATABASE_URL` that Fly's Postgres attach sets.
fn database_url(key: &str) -> Result<SecretString, ConfigError> {
    var(key)
        .or_else(|| var("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// `key` (or `default`) parsed with `FromStr`.
fn parsed<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var_or(key, default)
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn url(key: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn optional_url(key: &str) -> Result<Option<Url>, ConfigError> {
    var(key).map(|value| url(key, &value)).transpose()
}

fn admin_password(key: &str) -> Result<SecretString, ConfigError> {
    let password = required(key)?;
    check_admin_password(&password)
        .map_err(|e| ConfigError::InsecureSecret(key.to_string(), e.to_string()))?;
    Ok(SecretString::from(password))
}

// =============================================================================
// Admin password strength
// =============================================================================

/// Why a configured admin password was refused.
#[derive(Debug, Error, PartialEq)]
pub enum WeakPassword {
    #[error("must be at least {MIN_ADMIN_PASSWORD_LENGTH} characters (got {0})")]
    TooShort(usize),

    #[error("appears to be a placeholder (contains '{0}')")]
    Placeholder(&'static str),

    #[error(
        "entropy too low ({0:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}); use a randomly generated value"
    )]
    LowEntropy(f64),
}

/// Shannon entropy of `s`, in bits per character.
#[allow(clippy::cast_precision_loss)]
fn entropy_bits_per_char(s: &str) -> f64 {
    let mut chars: Vec<char> = s.chars().collect();
    if chars.is_empty() {
        return 0.0;
    }
    chars.sort_unstable();

    let total = chars.len() as f64;
    chars
        .chunk_by(|a, b| a == b)
        .map(|run| {
            let p = run.len() as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Refuse short, templated or repetitive admin passwords.
fn check_admin_password(password: &str) -> Result<(), WeakPassword> {
    let len = password.chars().count();
    if len < MIN_ADMIN_PASSWORD_LENGTH {
        return Err(WeakPassword::TooShort(len));
    }

    let lower = password.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().copied().find(|p| lower.contains(p)) {
        return Err(WeakPassword::Placeholder(pattern));
    }

    let entropy = entropy_bits_per_char(password);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(WeakPassword::LowEntropy(entropy));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const STRONG: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6";

    #[test]
    fn test_entropy() {
        assert!(entropy_bits_per_char("").abs() < f64::EPSILON);
        assert!(entropy_bits_per_char("zzzzzz").abs() < f64::EPSILON);
        assert!((entropy_bits_per_char("abab") - 1.0).abs() < 1e-9);
        assert!((entropy_bits_per_char("abcd") - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_admin_password_rules() {
        assert_eq!(
            check_admin_password("aB3$xY9!"),
            Err(WeakPassword::TooShort(8))
        );
        assert_eq!(
            check_admin_password("ChangeMe-9182736"),
            Err(WeakPassword::Placeholder("changeme"))
        );
        assert!(matches!(
            check_admin_password(&"ab".repeat(20)),
            Err(WeakPassword::LowEntropy(_))
        ));
        assert_eq!(check_admin_password(STRONG), Ok(()));
    }

    #[test]
    fn test_refusal_names_the_variable() {
        let err = ConfigError::InsecureSecret(
            "KONVY_ADMIN_PASSWORD".to_string(),
            WeakPassword::TooShort(3).to_string(),
        );
        assert_eq!(
            err.to_string(),
            "Insecure secret in KONVY_ADMIN_PASSWORD: must be at least 12 characters (got 3)"
        );
    }

    #[test]
    fn test_redemption_policy_parsing() {
        assert_eq!(
            "provisional".parse::<RedemptionPolicy>().unwrap(),
            RedemptionPolicy::Provisional
        );
        assert_eq!(
            " ISSUED_ONLY ".parse::<RedemptionPolicy>().unwrap(),
            RedemptionPolicy::IssuedOnly
        );
        assert!("strict".parse::<RedemptionPolicy>().is_err());
    }

    #[test]
    fn test_shopify_config_requires_both_parts() {
        let version = || "2024-01".to_string();
        assert!(ShopifyStorefrontConfig::from_parts(None, None, version()).is_none());
        assert!(
            ShopifyStorefrontConfig::from_parts(Some("s.myshopify.com".into()), None, version())
                .is_none()
        );
        assert!(
            ShopifyStorefrontConfig::from_parts(None, Some("token".into()), version()).is_none()
        );
        assert!(
            ShopifyStorefrontConfig::from_parts(Some("  ".into()), Some("token".into()), version())
                .is_none()
        );

        let config = ShopifyStorefrontConfig::from_parts(
            Some(" s.myshopify.com ".into()),
            Some("token".into()),
            version(),
        )
        .unwrap();
        assert_eq!(config.store, "s.myshopify.com");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let shopify = ShopifyStorefrontConfig {
            store: "test.myshopify.com".to_string(),
            api_version: "2024-01".to_string(),
            access_token: SecretString::from("super_secret_token"),
        };
        let admin = AdminConfig {
            username: "Konvy".to_string(),
            email: Email::parse(DEFAULT_ADMIN_EMAIL).unwrap(),
            password: SecretString::from("super_secret_password"),
        };

        let output = format!("{shopify:?} {admin:?}");
        assert!(output.contains("test.myshopify.com"));
        assert!(output.contains("Konvy"));
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("super_secret_token"));
        assert!(!output.contains("super_secret_password"));
    }

    #[test]
    fn test_socket_addr_and_scheme() {
        let mut config = StorefrontConfig::for_tests();
        config.base_url = Url::parse("https://konvy.example").unwrap();

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(config.is_secure());
    }

    #[test]
    fn test_admin_username_falls_back_to_default() {
        assert_eq!(username_or_default(None), DEFAULT_ADMIN_USERNAME);
        assert_eq!(username_or_default(Some("   ".into())), DEFAULT_ADMIN_USERNAME);
        assert_eq!(username_or_default(Some(" Boss ".into())), "Boss");
    }

    #[test]
    fn test_auth_rate_limit_defaults() {
        let limit = AuthRateLimitConfig::default();
        assert_eq!(limit.burst.get(), 5);
        assert_eq!(limit.replenish_secs.get(), 6);
    }
}
