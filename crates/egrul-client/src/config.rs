//! Client configuration

use std::time::Duration;

/// Public address of the register search
pub const DEFAULT_BASE_URL: &str = "https://egrul.nalog.ru";

/// The register rejects requests without a browser-like user agent
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Configuration for [`EgrulClient`](crate::EgrulClient)
#[derive(Clone, Debug)]
pub struct EgrulConfig {
    /// Scheme and host of the register, without a trailing path
    pub base_url: String,
    /// `User-Agent` header sent with every request
    pub user_agent: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Pause between obtaining the token and fetching its result page
    pub token_delay: Duration,
}

impl Default for EgrulConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(15),
            token_delay: Duration::from_secs(1),
        }
    }
}

impl EgrulConfig {
    /// Create a config pointing at another register address (mirrors, tests)
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the pause between the token and result requests
    pub fn with_token_delay(mut self, delay: Duration) -> Self {
        self.token_delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EgrulConfig::default();
        assert_eq!(config.base_url, "https://egrul.nalog.ru");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.token_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_builder() {
        let config = EgrulConfig::new("http://127.0.0.1:9000/")
            .with_timeout(Duration::from_secs(2))
            .with_token_delay(Duration::ZERO)
            .with_user_agent("test");
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.request_timeout, Duration::from_secs(2));
        assert_eq!(config.token_delay, Duration::ZERO);
        assert_eq!(config.user_agent, "test");
    }
}
