// src/services/search_client.rs
// DOCUMENTATION: Top-K similarity search backend client
// PURPOSE: Validate search requests and forward them to the external backend

use crate::errors::GridError;
use crate::models::{parse_lenses, SearchRequest, SearchResponse};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::time::Duration;
use validator::Validate;

/// Search backend client
/// DOCUMENTATION: Owns the HTTP client and the outgoing rate limiter
pub struct SearchClient {
    /// HTTP client for making requests
    client: Client,
    /// Backend search endpoint
    base_url: String,
    /// Outgoing request budget
    limiter: DefaultDirectRateLimiter,
}

impl SearchClient {
    /// Create new search client
    /// DOCUMENTATION: `requests_per_second` of 0 is treated as 1
    pub fn new(base_url: String, timeout_secs: u64, requests_per_second: u32) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);

        Self {
            client,
            base_url,
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Validate a request and normalize its lens names
    /// DOCUMENTATION: Every catalog lens is searchable, roads included.
    /// Unknown names are dropped; none left is NoValidLenses
    pub fn prepare_request(request: SearchRequest) -> Result<SearchRequest, GridError> {
        request
            .validate()
            .map_err(|e| GridError::ValidationError(e.to_string()))?;
        request.bounding_box.validate()?;

        let lenses = parse_lenses(&request.lenses);
        if lenses.is_empty() {
            return Err(GridError::NoValidLenses(format!("{:?}", request.lenses)));
        }

        Ok(SearchRequest {
            lenses: lenses.iter().map(|l| l.as_str().to_string()).collect(),
            ..request
        })
    }

    /// Pad or truncate response arrays to the number of returned cells
    /// DOCUMENTATION: Missing similarities become 0.0 and missing lens maps
    /// become empty, keeping every array aligned with `top_k_cells`
    pub fn align_response(mut response: SearchResponse) -> SearchResponse {
        let n = response.top_k_cells.len();

        if response.similarities.len() != n || response.lens_similarity.len() != n {
            log::warn!(
                "Search backend returned misaligned arrays: {} cells, {} similarities, {} lens maps",
                n,
                response.similarities.len(),
                response.lens_similarity.len()
            );
        }

        response.similarities.resize(n, 0.0);
        response.lens_similarity.resize_with(n, HashMap::new);
        response
    }

    /// Run a top-K search on the backend
    ///
    /// # Arguments
    /// * `request` - Search parameters from the client
    ///
    /// # Returns
    /// Backend results with index-aligned arrays
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse, GridError> {
        let request = Self::prepare_request(request)?;

        if self.limiter.check().is_err() {
            log::warn!("Search rate limit exceeded");
            return Err(GridError::RateLimitExceeded);
        }

        log::debug!(
            "Top-K search: top_k={}, lenses={:?}, bbox={:?}",
            request.top_k,
            request.lenses,
            request.bounding_box
        );

        let response = self
            .client
            .post(&self.base_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                log::error!("Search backend request failed: {}", e);
                GridError::ExternalApiError(format!("Request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("Search backend error {}: {}", status, body);
            return Err(GridError::ExternalApiError(format!(
                "Backend error {}: {}",
                status, body
            )));
        }

        let api_response: SearchResponse = response.json().await.map_err(|e| {
            log::error!("Failed to parse search backend response: {}", e);
            GridError::ExternalApiError(format!("Parse error: {}", e))
        })?;

        log::info!(
            "Search backend returned {} cells",
            api_response.top_k_cells.len()
        );

        Ok(Self::align_response(api_response))
    }
}
