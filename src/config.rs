use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Hosted backend configuration
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
    pub request_timeout_secs: u64,
    pub bootstrap_timeout_ms: u64,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub log_level: String,
    pub environment: String,
    pub data_dir: PathBuf,
}

impl BackendConfig {
    /// Create backend config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let url = env::var("SUPABASE_URL")
            .map_err(|_| "SUPABASE_URL environment variable is required")?;

        let anon_key = env::var("SUPABASE_ANON_KEY")
            .map_err(|_| "SUPABASE_ANON_KEY environment variable is required")?;

        let request_timeout_secs = env::var("BACKEND_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        let bootstrap_timeout_ms = env::var("BOOTSTRAP_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(3000);

        let config = Self {
            url,
            anon_key,
            request_timeout_secs,
            bootstrap_timeout_ms,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the values that cannot be caught by parsing alone
    pub fn validate(&self) -> Result<(), String> {
        if self.url.trim().is_empty() {
            return Err("SUPABASE_URL must not be empty".to_string());
        }

        if self.anon_key.trim().is_empty() {
            return Err("SUPABASE_ANON_KEY must not be empty".to_string());
        }

        if self.request_timeout_secs == 0 {
            return Err("BACKEND_REQUEST_TIMEOUT_SECS must be greater than 0".to_string());
        }

        if self.bootstrap_timeout_ms == 0 {
            return Err("BOOTSTRAP_TIMEOUT_MS must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Get the bound on client construction as Duration
    pub fn bootstrap_timeout(&self) -> Duration {
        Duration::from_millis(self.bootstrap_timeout_ms)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            anon_key: "local-anon-key".to_string(),
            request_timeout_secs: 30,
            bootstrap_timeout_ms: 3000,
        }
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let backend = BackendConfig::from_env()?;
        Self::with_backend(backend)
    }

    /// Read everything except the backend section from the environment.
    ///
    /// Offline runs use this with a placeholder backend.
    pub fn with_backend(backend: BackendConfig) -> Result<Self, String> {
        let log_level = env::var("LOG_LEVEL")
            .unwrap_or_else(|_| "info".to_string());

        let environment = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string());

        let data_dir = env::var("CONNECTHUB_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".connecthub"));

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            ));
        }

        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&environment.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid ENVIRONMENT: {}. Must be one of: {:?}",
                environment, valid_environments
            ));
        }

        Ok(Self {
            backend,
            log_level: log_level.to_lowercase(),
            environment: environment.to_lowercase(),
            data_dir,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if running in development
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Location of the saved preferences file
    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join("preferences.json")
    }

    /// Location of the persisted session when "remember me" is on
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            log_level: "info".to_string(),
            environment: "development".to_string(),
            data_dir: PathBuf::from(".connecthub"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_config_default() {
        let config = BackendConfig::default();
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.bootstrap_timeout(), Duration::from_millis(3000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_backend_config_rejects_blank_key() {
        let config = BackendConfig {
            anon_key: "  ".to_string(),
            ..BackendConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert!(config.is_development());
        assert!(!config.is_production());
        assert_eq!(config.session_path(), PathBuf::from(".connecthub/session.json"));
    }
}
