//! Portfolio listings
//!
//! A view over the public investment deals stored in a Supabase project:
//! the deals are read through PostgREST, kept fresh through a Realtime
//! channel subscription, and filtered by search text and state for display.

pub mod config;
pub mod error;
pub mod fetch;
pub mod listings;
pub mod postgrest;
pub mod realtime;

use reqwest::Client;

use crate::config::{ClientOptions, Settings};
use crate::postgrest::PostgrestClient;
use crate::realtime::RealtimeClient;

/// The main entry point for the Supabase client
#[derive(Debug, Clone)]
pub struct Supabase {
    /// The base URL for the Supabase project
    pub url: String,
    /// The anonymous API key for the Supabase project
    pub key: String,
    /// HTTP client used for requests
    pub http_client: Client,
    /// Client options
    pub options: ClientOptions,
}

impl Supabase {
    /// Create a new Supabase client
    ///
    /// # Example
    ///
    /// ```
    /// use portfolio_listings::Supabase;
    ///
    /// let supabase = Supabase::new("https://your-project-url.supabase.co", "your-anon-key");
    /// ```
    pub fn new(supabase_url: &str, supabase_key: &str) -> Self {
        Self::new_with_options(supabase_url, supabase_key, ClientOptions::default())
    }

    /// Create a new Supabase client with custom options
    pub fn new_with_options(supabase_url: &str, supabase_key: &str, options: ClientOptions) -> Self {
        Self {
            url: supabase_url.trim_end_matches('/').to_string(),
            key: supabase_key.to_string(),
            http_client: Client::new(),
            options,
        }
    }

    /// Create a client from project settings
    pub fn from_settings(settings: &Settings, options: ClientOptions) -> Self {
        Self::new_with_options(&settings.url, &settings.key, options)
    }

    /// Create a new PostgrestClient for reads on a specific table or view
    ///
    /// # Example
    ///
    /// ```
    /// use portfolio_listings::Supabase;
    ///
    /// let supabase = Supabase::new("https://your-project-url.supabase.co", "your-anon-key");
    /// let query = supabase.from("deals").select("*").eq("public_status", true);
    /// ```
    pub fn from(&self, table: &str) -> PostgrestClient {
        PostgrestClient::new(
            &self.url,
            &self.key,
            table,
            self.http_client.clone(),
            self.options.clone(),
        )
    }

    /// Get a realtime client for change subscriptions
    pub fn realtime(&self) -> RealtimeClient {
        RealtimeClient::new(&self.url, &self.key, self.options.clone())
    }
}

/// Re-exports of the commonly used types
pub mod prelude {
    pub use crate::config::{ClientOptions, Settings};
    pub use crate::error::Error;
    pub use crate::listings::{
        format_price, render_page, ChangeFeed, Deal, DealSource, ListingsSnapshot, ListingsView,
        PostgrestDealSource, RealtimeChangeFeed, ALL_STATES,
    };
    pub use crate::postgrest::SortOrder;
    pub use crate::realtime::{PostgresChanges, Subscription};
    pub use crate::Supabase;
}
