//! HTTP fetch boundary.
//!
//! The flow talks to merchants through [`PaymentFetcher`], a minimal
//! trait over "GET this URL, optionally with a payment proof attached".
//! [`ReqwestFetcher`] is the production implementation; tests substitute
//! scripted stubs.

use async_trait::async_trait;
use std::collections::HashMap;
use url::Url;

use crate::error::X402Result;
use crate::requirement::PAYMENT_PROOF_HEADER;

/// HTTP status code demanding payment.
pub const PAYMENT_REQUIRED_STATUS: u16 = 402;

/// A fetched response, reduced to what the negotiation needs.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, names lowercased.
    pub headers: HashMap<String, String>,
    /// Response body as text.
    pub body: String,
}

impl FetchResponse {
    /// Build a response from status, headers, and body.
    ///
    /// Header names are lowercased so lookups are case-insensitive.
    #[must_use]
    pub fn new(
        status: u16,
        headers: impl IntoIterator<Item = (String, String)>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            status,
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value))
                .collect(),
            body: body.into(),
        }
    }

    /// Look up a header by name, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Whether this response demands payment.
    #[must_use]
    pub fn requires_payment(&self) -> bool {
        self.status == PAYMENT_REQUIRED_STATUS
    }
}

/// Fetch primitive consumed by the payment flow.
#[async_trait]
pub trait PaymentFetcher: Send + Sync {
    /// GET `url`, attaching an `x-payment-proof` header when given.
    ///
    /// # Errors
    ///
    /// Returns [`crate::X402Error::Http`] if the request fails at the
    /// transport level. Non-success HTTP statuses are not errors; the
    /// flow inspects them.
    async fn fetch(&self, url: &Url, payment_proof: Option<&str>) -> X402Result<FetchResponse>;
}

/// [`PaymentFetcher`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Create a fetcher with a fresh client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fetcher over an existing client (shared pools, timeouts).
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PaymentFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &Url, payment_proof: Option<&str>) -> X402Result<FetchResponse> {
        let mut request = self.client.get(url.clone());
        if let Some(proof) = payment_proof {
            request = request.header(PAYMENT_PROOF_HEADER, proof);
        }
        let response = request.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect::<Vec<_>>();
        let body = response.text().await?;
        Ok(FetchResponse::new(status, headers, body))
    }
}
