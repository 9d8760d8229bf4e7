//! Database reads through the PostgREST API

mod filter;
mod query;
mod types;

use reqwest::Client;

use crate::config::ClientOptions;

pub use filter::*;
pub use query::*;
pub use types::*;

/// Client for database operations on one table or view
pub struct PostgrestClient {
    /// The base URL for the Supabase project
    url: String,

    /// The anonymous API key for the Supabase project
    key: String,

    /// The table or view name
    table: String,

    /// HTTP client
    client: Client,

    /// Client options
    options: ClientOptions,
}

impl PostgrestClient {
    /// Create a new PostgrestClient
    pub fn new(url: &str, key: &str, table: &str, client: Client, options: ClientOptions) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            table: table.to_string(),
            client,
            options,
        }
    }

    /// The table this client reads from
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Get the base URL for REST API requests
    fn get_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url, self.table)
    }

    /// Select specific columns from the table
    pub fn select(&self, columns: &str) -> SelectBuilder {
        SelectBuilder::new(
            self.get_url(),
            self.key.clone(),
            columns,
            self.client.clone(),
            self.options.clone(),
        )
    }
}
