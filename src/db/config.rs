use std::env;
use std::time::Duration;

use thiserror::Error;

/// Database settings read from the environment.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub auto_migrate: bool,
    pub probe_timeout: Duration,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, DbConfigError> {
        let url = env::var("DATABASE_URL").map_err(|_| DbConfigError::MissingUrl)?;
        if url.trim().is_empty() {
            return Err(DbConfigError::MissingUrl);
        }

        Ok(Self {
            url,
            auto_migrate: env_bool("DB_AUTO_MIGRATE", true),
            probe_timeout: Duration::from_millis(env_u64("DB_PROBE_TIMEOUT_MS", 2_000)),
        })
    }
}

#[derive(Debug, Error)]
pub enum DbConfigError {
    #[error("DATABASE_URL is not set")]
    MissingUrl,
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
        Err(_) => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_bool_parses_common_spellings() {
        std::env::set_var("DB_TEST_FLAG_A", "TRUE");
        assert!(env_bool("DB_TEST_FLAG_A", false));
        std::env::set_var("DB_TEST_FLAG_A", "0");
        assert!(!env_bool("DB_TEST_FLAG_A", true));
        std::env::remove_var("DB_TEST_FLAG_A");
        assert!(env_bool("DB_TEST_FLAG_A", true));
    }

    #[test]
    fn env_u64_falls_back_on_garbage() {
        std::env::set_var("DB_TEST_NUM", "not-a-number");
        assert_eq!(env_u64("DB_TEST_NUM", 42), 42);
        std::env::set_var("DB_TEST_NUM", " 1500 ");
        assert_eq!(env_u64("DB_TEST_NUM", 42), 1500);
        std::env::remove_var("DB_TEST_NUM");
    }
}
