//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use taleweaver_llm::NarratorSettings;
use taleweaver_llm::client::{DEFAULT_BASE_URL, DEFAULT_MODEL};

use crate::error::AppError;

/// Everything the server needs to start.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// `PostgreSQL` connection URL.
    pub database_url: String,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Connection pool size.
    pub database_max_connections: u32,
    /// Apply embedded migrations at startup.
    pub run_migrations: bool,
    /// Narrator service settings.
    pub narrator: NarratorSettings,
    /// Deadline for one narrator call.
    pub generation_timeout: Duration,
    /// OTLP collector endpoint; export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config("DATABASE_URL environment variable must be set".to_owned())
            })?;
        let generation_timeout =
            Duration::from_secs(parsed(&lookup, "GENERATION_TIMEOUT_SECS", 60_u64)?);
        if generation_timeout.is_zero() {
            return Err(AppError::Config(
                "GENERATION_TIMEOUT_SECS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port: parsed(&lookup, "PORT", 3000)?,
            database_max_connections: parsed(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            run_migrations: parsed(&lookup, "RUN_MIGRATIONS", true)?,
            narrator: NarratorSettings {
                base_url: lookup("NARRATOR_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
                model: lookup("NARRATOR_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
                api_key: lookup("NARRATOR_API_KEY").filter(|v| !v.is_empty()),
                temperature: parsed(&lookup, "NARRATOR_TEMPERATURE", 0.8)?,
                max_tokens: parsed(&lookup, "NARRATOR_MAX_TOKENS", 2048)?,
                request_timeout: generation_timeout,
            },
            generation_timeout,
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.is_empty()),
        })
    }

    /// The address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid ({raw:?}): {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_apply_when_only_database_url_is_set() {
        let config = config(&[("DATABASE_URL", "postgres://localhost/taleweaver")]).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.database_max_connections, 10);
        assert!(config.run_migrations);
        assert_eq!(config.narrator.base_url, "http://localhost:11434");
        assert_eq!(config.narrator.model, "llama3.1");
        assert_eq!(config.narrator.api_key, None);
        assert_eq!(config.narrator.max_tokens, 2048);
        assert_eq!(config.generation_timeout, Duration::from_secs(60));
        assert_eq!(config.otlp_endpoint, None);
        assert_eq!(config.socket_addr().unwrap().port(), 3000);
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = config(&[
            ("DATABASE_URL", "postgres://db/taleweaver"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("RUN_MIGRATIONS", "false"),
            ("NARRATOR_API_KEY", "sk-test"),
            ("NARRATOR_TEMPERATURE", "0.2"),
            ("GENERATION_TIMEOUT_SECS", "15"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://collector:4317"),
        ])
        .unwrap();

        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:8080");
        assert!(!config.run_migrations);
        assert_eq!(config.narrator.api_key.as_deref(), Some("sk-test"));
        assert!((config.narrator.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.narrator.request_timeout, Duration::from_secs(15));
        assert_eq!(config.otlp_endpoint.as_deref(), Some("http://collector:4317"));
    }

    #[test]
    fn test_missing_database_url_is_config_error() {
        assert!(matches!(config(&[]), Err(AppError::Config(_))));
    }

    #[test]
    fn test_invalid_port_names_the_variable() {
        let err = config(&[("DATABASE_URL", "postgres://db"), ("PORT", "http")]).unwrap_err();

        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let result = config(&[
            ("DATABASE_URL", "postgres://db"),
            ("GENERATION_TIMEOUT_SECS", "0"),
        ]);

        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
