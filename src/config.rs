use crate::constants::*;
use std::time::Duration;

/// Runtime settings. `Default` gives the stock actuator board setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `host` or `host:port` of the actuator.
    pub host: String,
    pub send_timeout: Duration,
    pub read_timeout: Duration,
    pub dispatch_interval: Duration,
    pub monitor_interval: Duration,
}

impl Config {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.host)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            send_timeout: Duration::from_millis(SEND_TIMEOUT_MS),
            read_timeout: Duration::from_millis(READ_TIMEOUT_MS),
            dispatch_interval: Duration::from_millis(DISPATCH_INTERVAL_MS),
            monitor_interval: Duration::from_millis(MONITOR_INTERVAL_MS),
        }
    }
}
