//! Configuration and wire types for the marketplace and pipeline endpoints.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{OffsetError, OffsetResult};

/// Estimate body sent to `POST /estimates/carbon/`.
#[derive(Debug, Clone, Serialize)]
pub struct EstimateRequest {
    pub weight: Weight,
}

#[derive(Debug, Clone, Serialize)]
pub struct Weight {
    pub value: f64,
    pub units: &'static str,
}

impl EstimateRequest {
    pub fn kilograms(value: f64) -> Self {
        Self {
            weight: Weight { value, units: "kg" },
        }
    }
}

/// Response from `POST /estimates/carbon/`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EstimateResponse {
    #[serde(deserialize_with = "deserialize_cents")]
    pub total_cost_in_usd_cents: u64,
    pub slug: String,
}

/// Body sent to `POST /purchases/`.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseRequest {
    pub estimate_slug: String,
}

/// A quoted price for offsetting a footprint.
///
/// The slug is single-use and expires on the marketplace side; an estimate is
/// consumed at most once by [`crate::Marketplace::purchase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Estimate {
    pub cost_cents: u64,
    pub slug: String,
}

/// A redeemed estimate. The money is spent once this exists.
#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    /// Cost reported in the confirmation, or the estimate's cost when the
    /// confirmation carries no readable amount.
    pub cost_cents: u64,

    /// `false` when `cost_cents` was taken from the estimate.
    pub cost_confirmed: bool,

    /// Raw confirmation body as returned by the marketplace.
    pub payload: serde_json::Value,
}

/// Reporting table refreshed after a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineTarget {
    #[serde(rename = "bucketName")]
    pub bucket_name: String,

    #[serde(rename = "datasetId")]
    pub dataset_id: String,

    #[serde(rename = "tableId")]
    pub table_id: String,
}

pub const DEFAULT_BUCKET_NAME: &str = "absolve_bucket";
pub const DEFAULT_DATASET_ID: &str = "offset_purchases";
pub const DEFAULT_TABLE_ID: &str = "offsets";

impl Default for PipelineTarget {
    fn default() -> Self {
        Self {
            bucket_name: DEFAULT_BUCKET_NAME.to_string(),
            dataset_id: DEFAULT_DATASET_ID.to_string(),
            table_id: DEFAULT_TABLE_ID.to_string(),
        }
    }
}

/// Accepts cents as a JSON integer, an integral float, or a numeric string.
fn deserialize_cents<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    parse_cents(&value).ok_or_else(|| {
        serde::de::Error::custom(format!("expected a non-negative cent amount, got {}", value))
    })
}

pub(crate) fn parse_cents(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(integral)),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(f: f64) -> Option<u64> {
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then_some(f as u64)
}

/// Workflow configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffsetConfig {
    /// Base URL for the Cloverly marketplace API.
    #[serde(default = "default_marketplace_url")]
    pub marketplace_url: String,

    /// Webhook that refreshes the offset reporting table.
    #[serde(default = "default_pipeline_url")]
    pub pipeline_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_marketplace_url() -> String {
    "https://api.cloverly.app/2019-03-beta".to_string()
}

fn default_pipeline_url() -> String {
    "https://us-central1-absolve.cloudfunctions.net/refresh_offset_data".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for OffsetConfig {
    fn default() -> Self {
        Self {
            marketplace_url: default_marketplace_url(),
            pipeline_url: default_pipeline_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl OffsetConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `ABSOLVE_MARKETPLACE_URL` | Marketplace base URL |
    /// | `ABSOLVE_PIPELINE_URL` | Refresh webhook URL |
    /// | `ABSOLVE_TIMEOUT` | Request timeout in seconds |
    pub fn from_env() -> Self {
        Self {
            marketplace_url: std::env::var("ABSOLVE_MARKETPLACE_URL")
                .unwrap_or_else(|_| default_marketplace_url()),
            pipeline_url: std::env::var("ABSOLVE_PIPELINE_URL")
                .unwrap_or_else(|_| default_pipeline_url()),
            timeout_secs: std::env::var("ABSOLVE_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
        }
    }

    /// Set the marketplace base URL.
    pub fn with_marketplace_url(mut self, url: impl Into<String>) -> Self {
        self.marketplace_url = url.into();
        self
    }

    /// Set the refresh webhook URL.
    pub fn with_pipeline_url(mut self, url: impl Into<String>) -> Self {
        self.pipeline_url = url.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Reject unparsable URLs and a zero timeout before any client is built.
    pub fn validate(&self) -> OffsetResult<()> {
        for (name, value) in [
            ("marketplace_url", &self.marketplace_url),
            ("pipeline_url", &self.pipeline_url),
        ] {
            url::Url::parse(value).map_err(|e| OffsetError::Config {
                message: format!("{} '{}' is not a valid URL: {}", name, value, e),
            })?;
        }
        if self.timeout_secs == 0 {
            return Err(OffsetError::Config {
                message: "timeout_secs must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;

    #[test]
    fn test_estimate_request_body() {
        let body = serde_json::to_value(EstimateRequest::kilograms(100.0)).unwrap();
        assert_eq!(body, json!({"weight": {"value": 100.0, "units": "kg"}}));
    }

    #[test]
    fn test_pipeline_target_wire_names() {
        let body = serde_json::to_value(PipelineTarget::default()).unwrap();
        assert_eq!(
            body,
            json!({
                "bucketName": "absolve_bucket",
                "datasetId": "offset_purchases",
                "tableId": "offsets"
            })
        );
    }

    #[test]
    fn test_cents_accepts_string_integer_and_integral_float() {
        for raw in [json!("150"), json!(150), json!(150.0), json!(" 150 ")] {
            let body = json!({"total_cost_in_usd_cents": raw, "slug": "s"});
            let parsed: EstimateResponse = serde_json::from_value(body).unwrap();
            assert_eq!(parsed.total_cost_in_usd_cents, 150);
        }
    }

    #[test]
    fn test_cents_rejects_garbage() {
        for raw in [json!("abc"), json!(-3), json!(1.5), json!(null), json!([1])] {
            let body = json!({"total_cost_in_usd_cents": raw, "slug": "s"});
            assert!(serde_json::from_value::<EstimateResponse>(body).is_err());
        }
    }

    #[test]
    fn test_estimate_response_requires_slug() {
        let body = json!({"total_cost_in_usd_cents": 150});
        assert!(serde_json::from_value::<EstimateResponse>(body).is_err());
    }

    #[test]
    fn test_config_validate() {
        assert!(OffsetConfig::default().validate().is_ok());

        let bad_url = OffsetConfig::default().with_marketplace_url("not a url");
        assert!(matches!(bad_url.validate(), Err(OffsetError::Config { .. })));

        let zero_timeout = OffsetConfig::default().with_timeout_secs(0);
        assert!(matches!(
            zero_timeout.validate(),
            Err(OffsetError::Config { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        std::env::set_var("ABSOLVE_MARKETPLACE_URL", "http://localhost:9000");
        std::env::set_var("ABSOLVE_TIMEOUT", "not-a-number");
        std::env::remove_var("ABSOLVE_PIPELINE_URL");

        let config = OffsetConfig::from_env();
        assert_eq!(config.marketplace_url, "http://localhost:9000");
        assert_eq!(config.pipeline_url, default_pipeline_url());
        assert_eq!(config.timeout_secs, 30);

        std::env::remove_var("ABSOLVE_MARKETPLACE_URL");
        std::env::remove_var("ABSOLVE_TIMEOUT");
    }
}
