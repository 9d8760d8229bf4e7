//! HTTP client abstraction for making requests to Supabase services

use reqwest::{header::{HeaderMap, HeaderName, HeaderValue}, Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::Error;

/// Error body returned by PostgREST for failed requests
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ApiErrorDetails {
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

/// Helper for building and executing HTTP requests
pub struct FetchBuilder<'a> {
    client: &'a Client,
    url: String,
    method: Method,
    headers: HeaderMap,
    query_params: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl<'a> FetchBuilder<'a> {
    /// Create a new FetchBuilder
    pub fn new(client: &'a Client, url: &str, method: Method) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        Self {
            client,
            url: url.to_string(),
            method,
            headers,
            query_params: Vec::new(),
            timeout: None,
        }
    }

    /// Add a header to the request
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add bearer token authentication to the request
    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("Authorization", &format!("Bearer {}", token))
    }

    /// Add query parameters to the request, keeping their order
    pub fn query(mut self, params: &[(String, String)]) -> Self {
        self.query_params.extend(params.iter().cloned());
        self
    }

    /// Abort the request if it takes longer than `timeout`
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the request
    fn build(&self) -> Result<RequestBuilder, Error> {
        let mut url = Url::parse(&self.url)?;

        if !self.query_params.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                query_pairs.append_pair(key, value);
            }
        }

        debug!(method = %self.method, url = %url, "building request");

        let mut req = self
            .client
            .request(self.method.clone(), url.as_str())
            .headers(self.headers.clone());

        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        Ok(req)
    }

    /// Execute the request and parse the response as JSON
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let req = self.build()?;
        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            return Err(api_error(status, &text));
        }

        let result = response.json::<T>().await?;
        Ok(result)
    }
}

/// Convert a failed response body into a database error
pub(crate) fn api_error(status: StatusCode, body: &str) -> Error {
    match serde_json::from_str::<ApiErrorDetails>(body) {
        Ok(ApiErrorDetails { message: Some(message), .. }) => Error::Database(message),
        _ => Error::database(format!("Request failed with status {}: {}", status, body)),
    }
}

/// Helper for creating HTTP requests
pub struct Fetch;

impl Fetch {
    /// Create a GET request
    pub fn get<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::GET)
    }
}
