//! Marketplace client: estimate and purchase.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::auth::Credential;
use crate::error::OffsetResult;
use crate::types::{
    parse_cents, Estimate, EstimateRequest, EstimateResponse, OffsetConfig, Purchase,
    PurchaseRequest,
};

pub(crate) mod http;

use http::{decode_json, read_payload, HttpBackend};

/// The two marketplace calls the workflow depends on.
#[async_trait]
pub trait Marketplace: Send + Sync {
    /// Quote a price for offsetting `footprint_kg` kilograms.
    async fn estimate(&self, credential: &Credential, footprint_kg: f64)
        -> OffsetResult<Estimate>;

    /// Redeem an estimate. Takes the estimate by value: a slug is used once.
    async fn purchase(&self, credential: &Credential, estimate: Estimate)
        -> OffsetResult<Purchase>;
}

/// reqwest-backed Cloverly client.
#[derive(Debug, Clone)]
pub struct MarketplaceClient {
    http: HttpBackend,
    base_url: String,
}

impl MarketplaceClient {
    pub fn new(config: &OffsetConfig) -> OffsetResult<Self> {
        Ok(Self {
            http: HttpBackend::new(config)?,
            base_url: config.marketplace_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn estimate_url(&self) -> String {
        format!("{}/estimates/carbon/", self.base_url)
    }

    fn purchase_url(&self) -> String {
        format!("{}/purchases/", self.base_url)
    }
}

#[async_trait]
impl Marketplace for MarketplaceClient {
    async fn estimate(
        &self,
        credential: &Credential,
        footprint_kg: f64,
    ) -> OffsetResult<Estimate> {
        let url = self.estimate_url();
        debug!(url = %url, footprint_kg, "requesting estimate");

        let response = self
            .http
            .post_json(&url, Some(credential), &EstimateRequest::kilograms(footprint_kg))
            .await?;
        let (body, _raw): (EstimateResponse, _) = decode_json(response, "estimate").await?;

        info!(cost_cents = body.total_cost_in_usd_cents, slug = %body.slug, "estimate returned");
        Ok(Estimate {
            cost_cents: body.total_cost_in_usd_cents,
            slug: body.slug,
        })
    }

    async fn purchase(
        &self,
        credential: &Credential,
        estimate: Estimate,
    ) -> OffsetResult<Purchase> {
        let url = self.purchase_url();
        debug!(url = %url, slug = %estimate.slug, "converting estimate to purchase");

        let estimated_cents = estimate.cost_cents;
        let body = PurchaseRequest {
            estimate_slug: estimate.slug,
        };
        let response = self.http.post_json(&url, Some(credential), &body).await?;

        // Past this point the purchase has happened; the body is informational.
        let payload = read_payload(response).await;
        let confirmed_cents = payload.get("total_cost_in_usd_cents").and_then(parse_cents);
        if confirmed_cents.is_none() {
            warn!(
                estimated_cents,
                "purchase confirmation has no readable cost; using estimate cost"
            );
        }

        Ok(Purchase {
            cost_cents: confirmed_cents.unwrap_or(estimated_cents),
            cost_confirmed: confirmed_cents.is_some(),
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = OffsetConfig::default().with_marketplace_url("http://localhost:1234/v1/");
        let client = MarketplaceClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:1234/v1");
        assert_eq!(client.estimate_url(), "http://localhost:1234/v1/estimates/carbon/");
        assert_eq!(client.purchase_url(), "http://localhost:1234/v1/purchases/");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = OffsetConfig::default().with_marketplace_url("::nope::");
        assert!(MarketplaceClient::new(&config).is_err());
    }
}
