use std::time::Duration;

/// Per-attempt timeout budgets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Request against the backend origin (default: 10 seconds)
    pub direct_request: Duration,

    /// Request through a relay; relays add hops (default: 20 seconds)
    pub relay_request: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            direct_request: Duration::from_secs(10),
            relay_request: Duration::from_secs(20),
        }
    }
}

impl TimeoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: set direct request timeout
    pub fn with_direct_request(mut self, duration: Duration) -> Self {
        self.direct_request = duration;
        self
    }

    /// Builder pattern: set relay request timeout
    pub fn with_relay_request(mut self, duration: Duration) -> Self {
        self.relay_request = duration;
        self
    }
}
