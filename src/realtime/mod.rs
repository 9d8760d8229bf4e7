//! Realtime client for Supabase

mod channel;
mod message;

use url::Url;

use crate::config::ClientOptions;
use crate::error::Error;

pub use channel::{ChangeEvent, ChannelBuilder, PostgresChanges, Subscription};
pub use message::{ChangePayload, ChannelEvent, RealtimeMessage};

/// Protocol version requested from the realtime server
const PROTOCOL_VSN: &str = "1.0.0";

/// Client for Supabase Realtime
#[derive(Debug, Clone)]
pub struct RealtimeClient {
    /// The base URL for the Supabase project
    pub(crate) url: String,

    /// The anonymous API key for the Supabase project
    pub(crate) key: String,

    pub(crate) options: ClientOptions,
}

impl RealtimeClient {
    /// Create a new RealtimeClient
    pub fn new(url: &str, key: &str, options: ClientOptions) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            options,
        }
    }

    /// Get the WebSocket URL for the Realtime API
    pub fn websocket_url(&self) -> Result<String, Error> {
        let mut url = Url::parse(&self.url)?;

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => return Err(Error::realtime(format!("Unsupported URL scheme: {}", other))),
        };
        url.set_scheme(scheme)
            .map_err(|_| Error::realtime(format!("Cannot use scheme {} for {}", scheme, self.url)))?;

        let path = format!("{}/realtime/v1/websocket", url.path().trim_end_matches('/'));
        url.set_path(&path);
        url.query_pairs_mut()
            .clear()
            .append_pair("apikey", &self.key)
            .append_pair("vsn", PROTOCOL_VSN);

        Ok(url.to_string())
    }

    /// Create a channel; its topic is `realtime:{name}`
    pub fn channel(&self, name: &str) -> ChannelBuilder {
        ChannelBuilder::new(self, name)
    }
}
