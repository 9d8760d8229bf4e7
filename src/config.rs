//! Configuration options for the Supabase client

use std::env;
use std::time::Duration;

use crate::error::Error;

/// Configuration options for the Supabase client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// The database schema
    pub db_schema: String,

    /// Interval between realtime heartbeats
    pub heartbeat_interval: Duration,

    /// Whether a dropped realtime socket is reconnected
    pub auto_reconnect: bool,

    /// Give up reconnecting after this many consecutive failures
    pub max_reconnect_attempts: Option<u32>,

    /// Delay before the first reconnect attempt
    pub reconnect_interval: Duration,

    /// Multiplier applied to the delay after each failed attempt
    pub reconnect_backoff_factor: f64,

    /// Upper bound for the reconnect delay
    pub max_reconnect_interval: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            db_schema: "public".to_string(),
            heartbeat_interval: Duration::from_secs(30),
            auto_reconnect: true,
            max_reconnect_attempts: None,
            reconnect_interval: Duration::from_secs(1),
            reconnect_backoff_factor: 1.5,
            max_reconnect_interval: Duration::from_secs(30),
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the database schema
    pub fn with_db_schema(mut self, value: &str) -> Self {
        self.db_schema = value.to_string();
        self
    }

    /// Set the realtime heartbeat interval
    pub fn with_heartbeat_interval(mut self, value: Duration) -> Self {
        self.heartbeat_interval = value;
        self
    }

    /// Set whether the realtime socket reconnects after a drop
    pub fn with_auto_reconnect(mut self, value: bool) -> Self {
        self.auto_reconnect = value;
        self
    }

    /// Set the maximum number of consecutive reconnect attempts
    pub fn with_max_reconnect_attempts(mut self, value: Option<u32>) -> Self {
        self.max_reconnect_attempts = value;
        self
    }

    /// Set the initial reconnect delay
    pub fn with_reconnect_interval(mut self, value: Duration) -> Self {
        self.reconnect_interval = value;
        self
    }

    /// Delay to wait before reconnect attempt number `attempt` (1-based)
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let millis = self.reconnect_interval.as_millis() as f64
            * self.reconnect_backoff_factor.powi(exponent);
        let capped = millis.min(self.max_reconnect_interval.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

/// Project connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// The base URL for the Supabase project
    pub url: String,

    /// The anonymous API key for the Supabase project
    pub key: String,
}

impl Settings {
    /// Read `SUPABASE_URL` and `SUPABASE_ANON_KEY` (or `SUPABASE_KEY`) from the environment
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let url = non_empty("SUPABASE_URL")
            .ok_or_else(|| Error::config("SUPABASE_URL must be set"))?;
        let key = non_empty("SUPABASE_ANON_KEY")
            .or_else(|| non_empty("SUPABASE_KEY"))
            .ok_or_else(|| Error::config("SUPABASE_ANON_KEY must be set"))?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            key,
        })
    }
}
