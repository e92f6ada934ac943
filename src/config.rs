//! Application configuration loaded from environment variables.
//!
//! Values are read once at startup. A `.env` file is honored for local
//! development.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default forced-refresh interval for the session timer (30 minutes).
pub const DEFAULT_SESSION_REFRESH_SECS: u64 = 30 * 60;
/// Default toast lifetime.
pub const DEFAULT_TOAST_DISMISS_MS: u64 = 5000;

/// Which identity/profile/blob backends the facade is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthBackend {
    /// Firebase Auth + Firestore + Firebase Storage.
    Firebase,
    /// In-process demo provider with an optional on-disk session cache.
    Demo,
}

impl FromStr for AuthBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firebase" => Ok(AuthBackend::Firebase),
            "demo" => Ok(AuthBackend::Demo),
            _ => Err(ConfigError::Invalid("AUTH_BACKEND", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub auth_backend: AuthBackend,
    /// Firebase Web API key (public; identifies the project to Identity Toolkit)
    pub firebase_api_key: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Firebase Storage bucket for profile photos
    pub storage_bucket: String,
    /// Frontend origin allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    pub session_refresh_interval: Duration,
    pub toast_dismiss_after: Duration,
    /// HS256 key for demo-mode tokens. Generated at startup when unset.
    pub demo_signing_key: Option<Vec<u8>>,
    /// Where demo mode persists `{isAuthenticated, user}` between runs.
    pub demo_session_cache: Option<PathBuf>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            auth_backend: AuthBackend::Demo,
            firebase_api_key: String::new(),
            gcp_project_id: "test-project".to_string(),
            storage_bucket: "test-project.appspot.com".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            session_refresh_interval: Duration::from_secs(DEFAULT_SESSION_REFRESH_SECS),
            toast_dismiss_after: Duration::from_millis(DEFAULT_TOAST_DISMISS_MS),
            demo_signing_key: Some(b"test_demo_key_32_bytes_minimum!!".to_vec()),
            demo_session_cache: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let auth_backend = match env::var("AUTH_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => AuthBackend::Firebase,
        };

        let firebase_api_key = match auth_backend {
            AuthBackend::Firebase => env::var("FIREBASE_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?,
            AuthBackend::Demo => env::var("FIREBASE_API_KEY").unwrap_or_default(),
        };

        let gcp_project_id =
            env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string());
        let storage_bucket = env::var("FIREBASE_STORAGE_BUCKET")
            .unwrap_or_else(|_| format!("{}.appspot.com", gcp_project_id));

        Ok(Self {
            auth_backend,
            firebase_api_key,
            gcp_project_id,
            storage_bucket,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: parse_or("PORT", 8080),
            session_refresh_interval: Duration::from_secs(parse_or(
                "SESSION_REFRESH_SECS",
                DEFAULT_SESSION_REFRESH_SECS,
            )),
            toast_dismiss_after: Duration::from_millis(parse_or(
                "TOAST_DISMISS_MS",
                DEFAULT_TOAST_DISMISS_MS,
            )),
            demo_signing_key: env::var("DEMO_SIGNING_KEY")
                .ok()
                .filter(|v| !v.is_empty())
                .map(String::into_bytes),
            demo_session_cache: env::var("DEMO_SESSION_CACHE").ok().map(PathBuf::from),
        })
    }
}

fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("AUTH_BACKEND", "demo");
        env::set_var("SESSION_REFRESH_SECS", "90");
        env::set_var("DEMO_SIGNING_KEY", "test_demo_key");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.auth_backend, AuthBackend::Demo);
        assert_eq!(config.session_refresh_interval, Duration::from_secs(90));
        assert_eq!(config.demo_signing_key.as_deref(), Some(&b"test_demo_key"[..]));
        assert_eq!(config.toast_dismiss_after, Duration::from_millis(5000));
    }

    #[test]
    fn test_auth_backend_parse() {
        assert_eq!("Firebase".parse::<AuthBackend>().unwrap(), AuthBackend::Firebase);
        assert!(matches!(
            "ldap".parse::<AuthBackend>(),
            Err(ConfigError::Invalid("AUTH_BACKEND", _))
        ));
    }
}
