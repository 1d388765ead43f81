// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Supabase (PostgREST) implementation of [`DataStore`].

use std::fmt;
use std::time::Duration;

use log::{debug, warn};
use reqwest::{Client, Method, Request};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::{DataStore, DataStoreError, RetryPolicy};
use crate::model::{Bar, VoteRecord};

const BARS_PATH: &str = "rest/v1/bars";
const VOTES_PATH: &str = "rest/v1/votes";
const INCREMENT_VOTE_PATH: &str = "rest/v1/rpc/increment_vote";

/// Connection settings for a Supabase project.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abc.supabase.co`.
    pub url: String,
    /// Public anon key, sent as both `apikey` and bearer token.
    pub anon_key: String,
    pub timeout: Duration,
    /// Retry policy for the vote increment.
    pub retry: RetryPolicy,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

#[derive(Serialize)]
struct IncrementVote<'a> {
    bar: &'a str,
}

/// Data store client for a Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: Client,
    config: SupabaseConfig,
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig) -> Result<Self, DataStoreError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.url.trim_end_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.endpoint(path))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
    }

    fn select_all_request(&self, path: &str) -> Result<Request, DataStoreError> {
        Ok(self
            .request(Method::GET, path)
            .query(&[("select", "*")])
            .build()?)
    }

    fn increment_request(&self, bar_name: &str) -> Result<Request, DataStoreError> {
        Ok(self
            .request(Method::POST, INCREMENT_VOTE_PATH)
            .json(&IncrementVote { bar: bar_name })
            .build()?)
    }

    async fn send(&self, operation: &'static str, request: Request) -> Result<String, DataStoreError> {
        debug!("{operation}: {} {}", request.method(), request.url().path());
        let response = self.http.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(DataStoreError::Status {
                operation,
                status,
                body,
            })
        }
    }

    async fn select_all<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<Vec<T>, DataStoreError> {
        let request = self.select_all_request(path)?;
        let body = self.send(operation, request).await?;
        decode_rows(operation, &body)
    }

    async fn increment_once(&self, bar_name: &str) -> Result<(), DataStoreError> {
        let request = self.increment_request(bar_name)?;
        self.send("increment_vote", request).await.map(drop)
    }
}

impl DataStore for SupabaseClient {
    async fn list_bars(&self) -> Result<Vec<Bar>, DataStoreError> {
        self.select_all("list_bars", BARS_PATH).await
    }

    async fn list_votes(&self) -> Result<Vec<VoteRecord>, DataStoreError> {
        self.select_all("list_votes", VOTES_PATH).await
    }

    async fn increment_vote(&self, bar_name: &str) -> Result<(), DataStoreError> {
        self.config
            .retry
            .run("increment_vote", || self.increment_once(bar_name))
            .await
    }
}

/// Decode a JSON array row by row, skipping rows that do not fit `T`.
fn decode_rows<T: DeserializeOwned>(what: &'static str, body: &str) -> Result<Vec<T>, DataStoreError> {
    let rows: Vec<Value> =
        serde_json::from_str(body).map_err(|source| DataStoreError::Decode { what, source })?;

    let total = rows.len();
    let decoded: Vec<T> = rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("{what}: skipping malformed row: {e}");
                None
            }
        })
        .collect();

    if decoded.len() < total {
        warn!("{what}: kept {} of {total} rows", decoded.len());
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SupabaseClient {
        SupabaseClient::new(SupabaseConfig::new("https://demo.supabase.co/", "anon-key")).unwrap()
    }

    fn header<'a>(request: &'a Request, name: &str) -> &'a str {
        request.headers()[name].to_str().unwrap()
    }

    #[test]
    fn test_bars_request() {
        let request = client().select_all_request(BARS_PATH).unwrap();

        assert_eq!(request.method(), Method::GET);
        assert_eq!(
            request.url().as_str(),
            "https://demo.supabase.co/rest/v1/bars?select=*"
        );
        assert_eq!(header(&request, "apikey"), "anon-key");
        assert_eq!(header(&request, "authorization"), "Bearer anon-key");
    }

    #[test]
    fn test_votes_request() {
        let request = client().select_all_request(VOTES_PATH).unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://demo.supabase.co/rest/v1/votes?select=*"
        );
    }

    #[test]
    fn test_increment_request_body() {
        let request = client().increment_request("Eagle \"Tavern\"").unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(
            request.url().as_str(),
            "https://demo.supabase.co/rest/v1/rpc/increment_vote"
        );
        assert_eq!(header(&request, "content-type"), "application/json");
        assert_eq!(header(&request, "authorization"), "Bearer anon-key");

        let body = request.body().and_then(reqwest::Body::as_bytes).unwrap();
        let json: Value = serde_json::from_slice(body).unwrap();
        assert_eq!(json, serde_json::json!({ "bar": "Eagle \"Tavern\"" }));
    }

    #[test]
    fn test_decode_rows_skips_malformed() {
        let body = r#"[
            {"id": 1, "name": "Breakroom", "lat": 37.77, "long": -122.43},
            {"name": "No id"},
            {"id": 3, "name": "Eagle"}
        ]"#;

        let bars: Vec<Bar> = decode_rows("list_bars", body).unwrap();
        let ids: Vec<_> = bars.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_decode_rows_rejects_non_array() {
        let err = decode_rows::<VoteRecord>("list_votes", r#"{"message": "denied"}"#).unwrap_err();
        assert!(matches!(err, DataStoreError::Decode { what: "list_votes", .. }));
    }

    #[test]
    fn test_debug_redacts_key() {
        let printed = format!("{:?}", client());
        assert!(!printed.contains("anon-key"));
    }
}
