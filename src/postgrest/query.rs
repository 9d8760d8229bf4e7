//! Query builder for PostgrestClient

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::config::ClientOptions;
use crate::error::Error;
use crate::fetch::Fetch;
use crate::postgrest::filter::Filter;
use crate::postgrest::types::SortOrder;

const CLIENT_INFO: &str = concat!("portfolio-listings/", env!("CARGO_PKG_VERSION"));

/// Builder for SELECT queries
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    /// The base URL for the request
    url: String,

    /// The API key
    key: String,

    /// HTTP client
    client: Client,

    /// Client options
    options: ClientOptions,

    /// Query parameters in insertion order
    params: Vec<(String, String)>,
}

impl SelectBuilder {
    /// Create a new SelectBuilder
    pub fn new(url: String, key: String, columns: &str, client: Client, options: ClientOptions) -> Self {
        Self {
            url,
            key,
            client,
            options,
            params: vec![("select".to_string(), columns.to_string())],
        }
    }

    /// Add a filter condition
    pub fn filter(mut self, filter: &Filter) -> Self {
        self.params.push((filter.column.clone(), filter.param_value()));
        self
    }

    /// Filter rows where column equals a value
    pub fn eq<T: ToString>(self, column: &str, value: T) -> Self {
        self.filter(&Filter::eq(column, value))
    }

    /// Order the results by a column
    pub fn order(mut self, column: &str, order: SortOrder) -> Self {
        self.params
            .push(("order".to_string(), format!("{}.{}", column, order.as_str())));
        self
    }

    /// The query parameters that will be sent
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Execute the query and return the results
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<Vec<T>, Error> {
        Fetch::get(&self.client, &self.url)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Accept-Profile", &self.options.db_schema)
            .header("X-Client-Info", CLIENT_INFO)
            .query(&self.params)
            .timeout(self.options.request_timeout)
            .execute::<Vec<T>>()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_params_keep_order() {
        let builder = SelectBuilder::new(
            "http://localhost/rest/v1/deals".to_string(),
            "key".to_string(),
            "*",
            Client::new(),
            ClientOptions::default(),
        )
        .eq("public_status", true)
        .order("created_at", SortOrder::Descending);

        let params: Vec<(&str, &str)> = builder
            .params()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            params,
            vec![
                ("select", "*"),
                ("public_status", "eq.true"),
                ("order", "created_at.desc"),
            ]
        );
    }
}
