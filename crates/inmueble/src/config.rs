use std::time::Duration;

use chrono::Datelike;

pub const DEFAULT_CONCURRENCY_LIMIT: usize = 8;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "es-MX,es;q=0.9";

/// From here on, any age below 100 maps to a year no earlier than 1900.
pub const MIN_REFERENCE_YEAR: i32 = 2000;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Concurrency limit must be greater than 0")]
    ZeroConcurrency,
    #[error("Timeout must be greater than 0")]
    ZeroTimeout,
    #[error("User agent cannot be empty")]
    EmptyUserAgent,
    #[error("Reference year {0} is out of range")]
    ReferenceYearOutOfRange(i32),
}

/// Settings for fetching listing pages. Build one explicitly and hand it to
/// [`WebScraper::with_config`](crate::WebScraper::with_config).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub concurrency_limit: usize,
    pub timeout: Duration,
    pub user_agent: String,
    pub accept_language: String,
    /// Year used to turn a building's age into its construction year.
    pub reference_year: i32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            reference_year: current_year(),
        }
    }
}

impl FetchConfig {
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_accept_language(mut self, accept_language: impl Into<String>) -> Self {
        self.accept_language = accept_language.into();
        self
    }

    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = year;
        self
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.concurrency_limit == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::EmptyUserAgent);
        }
        if !(MIN_REFERENCE_YEAR..=9999).contains(&self.reference_year) {
            return Err(ConfigError::ReferenceYearOutOfRange(self.reference_year));
        }
        Ok(self)
    }
}

pub fn current_year() -> i32 {
    chrono::Local::now().year()
}
