//! HTTP client for the recommendation delegate.
//!
//! The delegate is an opaque scoring oracle; this client binds it to one
//! wire contract (`POST /recommend`) and normalizes every failure mode
//! (transport error, timeout, non-success status, schema mismatch) into
//! `RecommendationUnavailable`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use mandi_core::config::RecommenderConfig;
use mandi_core::discovery::{RankedRecommendations, RecommendationClient, RecommendationRequest};
use mandi_core::domain::product::ProductId;
use mandi_core::errors::DiscoveryError;

#[derive(Debug, Serialize)]
struct RecommendPayload<'a> {
    #[serde(rename = "userId")]
    user_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct RecommendResponse {
    recommendations: Vec<String>,
    algorithm: String,
    #[serde(default)]
    confidence: Option<f64>,
}

pub struct HttpRecommendationClient {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl HttpRecommendationClient {
    /// Build the client from configuration. The delegate timeout is
    /// mandatory: an unbounded wait here would stall the whole discovery
    /// path.
    pub fn from_config(config: &RecommenderConfig) -> Result<Self, DiscoveryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| {
                DiscoveryError::RecommendationUnavailable(format!(
                    "failed to build delegate client: {error}"
                ))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(api_key) => request.bearer_auth(api_key.expose_secret()),
            None => request,
        }
    }

    /// Liveness probe against the delegate's `/health` endpoint; used by
    /// `mandi doctor`, never on the request path.
    pub async fn probe_health(&self) -> Result<(), DiscoveryError> {
        let response =
            self.authorize(self.client.get(self.endpoint("/health"))).send().await.map_err(
                |error| {
                    DiscoveryError::RecommendationUnavailable(format!(
                        "delegate health probe failed: {error}"
                    ))
                },
            )?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::RecommendationUnavailable(format!(
                "delegate health probe returned status {status}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RecommendationClient for HttpRecommendationClient {
    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RankedRecommendations, DiscoveryError> {
        let payload = RecommendPayload {
            user_id: &request.user_id,
            category: request.category.as_deref(),
            limit: request.limit,
        };

        let response = self
            .authorize(self.client.post(self.endpoint("/recommend")).json(&payload))
            .send()
            .await
            .map_err(|error| {
                warn!(
                    event_name = "recs.delegate.transport_error",
                    error = %error,
                    "recommendation delegate call failed"
                );
                DiscoveryError::RecommendationUnavailable(format!(
                    "delegate request failed: {error}"
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                event_name = "recs.delegate.bad_status",
                status = %status,
                "recommendation delegate returned non-success status"
            );
            return Err(DiscoveryError::RecommendationUnavailable(format!(
                "delegate returned status {status}"
            )));
        }

        let decoded: RecommendResponse = response.json().await.map_err(|error| {
            warn!(
                event_name = "recs.delegate.schema_mismatch",
                error = %error,
                "recommendation delegate payload did not match contract"
            );
            DiscoveryError::RecommendationUnavailable(format!(
                "delegate payload did not match contract: {error}"
            ))
        })?;

        debug!(
            event_name = "recs.delegate.ranked",
            algorithm = %decoded.algorithm,
            returned = decoded.recommendations.len(),
            "recommendation delegate returned ranking"
        );

        Ok(RankedRecommendations {
            product_ids: decoded.recommendations.into_iter().map(ProductId).collect(),
            algorithm: decoded.algorithm,
            confidence: decoded.confidence,
        })
    }
}
