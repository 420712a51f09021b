//! Gate for logging recipe text and model output.

use std::fmt::Display;

use crate::config_manager::LoggingConfig;

pub const USER_DATA_ENV: &str = "RB_ALLOW_USER_DATA_LOGS";

/// Whether user-supplied content may appear in log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserDataPolicy {
    allow: bool,
}

impl UserDataPolicy {
    pub fn new(allow: bool) -> Self {
        Self { allow }
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        Self::new(config.allow_user_data)
    }

    /// Reads `RB_ALLOW_USER_DATA_LOGS` directly; anything but "true" disables.
    pub fn from_env() -> Self {
        let allow = std::env::var(USER_DATA_ENV)
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);
        Self::new(allow)
    }

    pub fn allows_user_data(&self) -> bool {
        self.allow
    }

    /// The value itself when allowed, otherwise a placeholder with its size.
    pub fn redact<T: Display + ?Sized>(&self, value: &T) -> String {
        if self.allow {
            value.to_string()
        } else {
            format!("<redacted {} chars>", value.to_string().chars().count())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_unless_allowed() {
        let strict = UserDataPolicy::default();
        assert!(!strict.allows_user_data());
        assert_eq!(strict.redact("2 cups flour"), "<redacted 12 chars>");

        let open = UserDataPolicy::new(true);
        assert_eq!(open.redact("2 cups flour"), "2 cups flour");
    }

    #[test]
    fn follows_logging_config() {
        let config = LoggingConfig {
            allow_user_data: true,
            ..LoggingConfig::default()
        };
        assert!(UserDataPolicy::from_config(&config).allows_user_data());
    }
}
