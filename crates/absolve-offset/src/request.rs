//! Inbound request parsing and validation.
//!
//! The host hands over two loosely typed bags: `params` (cell value, private
//! key, pipeline settings) and `formParams` (threshold settings). Everything
//! is converted to typed values here, before it reaches the decision logic.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::auth::Credential;
use crate::error::{OffsetError, OffsetResult};
use crate::threshold::{derive_ceiling, is_negligible_percent, Ceiling};
use crate::types::{PipelineTarget, DEFAULT_BUCKET_NAME, DEFAULT_DATASET_ID, DEFAULT_TABLE_ID};

pub const MISSING_FOOTPRINT: &str = "Couldn't get data from cell.";
pub const MISSING_THRESHOLDS: &str = "Threshold use required, but no thresholds set!";

/// Inbound action request as delivered by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionRequest {
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,

    #[serde(default, rename = "formParams", alias = "form_params")]
    pub form_params: BTreeMap<String, serde_json::Value>,
}

impl ActionRequest {
    pub fn with_param(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn with_form_param(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.form_params.insert(key.to_string(), value.into());
        self
    }
}

/// Read a bag entry as trimmed text; blanks and nulls count as absent.
fn text(bag: &BTreeMap<String, serde_json::Value>, key: &str) -> Option<String> {
    let raw = match bag.get(key)? {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!raw.is_empty()).then_some(raw)
}

/// Form-level yes/no selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    pub fn is_yes(self) -> bool {
        self == Self::Yes
    }

    fn field(
        bag: &BTreeMap<String, serde_json::Value>,
        key: &str,
        default: YesNo,
    ) -> OffsetResult<YesNo> {
        match text(bag, key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|_| {
                OffsetError::validation(format!("{} must be \"yes\" or \"no\", got \"{}\"", key, raw))
            }),
        }
    }
}

impl FromStr for YesNo {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("yes") {
            Ok(Self::Yes)
        } else if s.eq_ignore_ascii_case("no") {
            Ok(Self::No)
        } else {
            Err(())
        }
    }
}

/// Parse a spending limit; absent is fine, negative or non-numeric is not.
fn limit(bag: &BTreeMap<String, serde_json::Value>, key: &str) -> OffsetResult<Option<f64>> {
    let Some(raw) = text(bag, key) else {
        return Ok(None);
    };
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(Some(value)),
        Ok(value) if value.is_finite() => Err(OffsetError::validation(format!(
            "{} must not be negative, got \"{}\"",
            key, raw
        ))),
        _ => Err(OffsetError::validation(format!(
            "{} must be a number, got \"{}\"",
            key, raw
        ))),
    }
}

/// Threshold settings from the action form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdConfig {
    /// `false` means the user chose to bypass the ceiling.
    pub use_thresholds: bool,

    /// Absolute ceiling in cents.
    pub absolute_cents: Option<f64>,

    /// Percentage of gross margin. Negligible values are stored as `None`.
    pub percent: Option<f64>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            use_thresholds: true,
            absolute_cents: None,
            percent: None,
        }
    }
}

impl ThresholdConfig {
    pub fn bypass() -> Self {
        Self {
            use_thresholds: false,
            ..Self::default()
        }
    }

    pub fn with_absolute_cents(mut self, cents: f64) -> Self {
        self.absolute_cents = Some(cents);
        self
    }

    pub fn with_percent(mut self, percent: f64) -> Self {
        self.percent = Some(percent).filter(|p| !is_negligible_percent(*p));
        self
    }

    pub fn has_limit(&self) -> bool {
        self.absolute_cents.is_some() || self.percent.is_some()
    }

    pub fn ceiling(&self) -> Ceiling {
        derive_ceiling(self.absolute_cents, self.percent)
    }
}

/// A validated request to offset one footprint value.
#[derive(Debug, Clone)]
pub struct OffsetRequest {
    pub footprint_kg: f64,
    pub credential: Credential,
    pub thresholds: ThresholdConfig,

    /// Refresh target, present only when the pipeline is enabled.
    pub pipeline: Option<PipelineTarget>,
}

impl OffsetRequest {
    pub fn new(
        footprint_kg: f64,
        credential: Credential,
        thresholds: ThresholdConfig,
    ) -> OffsetResult<Self> {
        let request = Self {
            footprint_kg,
            credential,
            thresholds,
            pipeline: None,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn with_pipeline(mut self, target: PipelineTarget) -> Self {
        self.pipeline = Some(target);
        self
    }

    /// Invariants that must hold before any network call.
    pub fn validate(&self) -> OffsetResult<()> {
        if !(self.footprint_kg.is_finite() && self.footprint_kg > 0.0) {
            return Err(OffsetError::validation(MISSING_FOOTPRINT));
        }
        if self.thresholds.use_thresholds && !self.thresholds.has_limit() {
            return Err(OffsetError::validation(MISSING_THRESHOLDS));
        }
        Ok(())
    }

    /// Parse and validate a host request.
    ///
    /// `fallback` is used when the request carries no `privateKey`.
    pub fn from_action(action: &ActionRequest, fallback: Option<Credential>) -> OffsetResult<Self> {
        let footprint_kg = text(&action.params, "value")
            .and_then(|raw| raw.parse::<f64>().ok())
            .filter(|kg| kg.is_finite() && *kg > 0.0)
            .ok_or_else(|| OffsetError::validation(MISSING_FOOTPRINT))?;

        let use_thresholds = YesNo::field(&action.form_params, "useThresholds", YesNo::Yes)?;
        let mut thresholds = ThresholdConfig {
            use_thresholds: use_thresholds.is_yes(),
            absolute_cents: limit(&action.form_params, "costThreshold")?,
            percent: None,
        };
        if let Some(percent) = limit(&action.form_params, "percentThreshold")? {
            thresholds = thresholds.with_percent(percent);
        }

        let pipeline = YesNo::field(&action.params, "use_full_data_pipeline", YesNo::No)?
            .is_yes()
            .then(|| PipelineTarget {
                bucket_name: text(&action.params, "bucketName")
                    .unwrap_or_else(|| DEFAULT_BUCKET_NAME.to_string()),
                dataset_id: text(&action.params, "datasetId")
                    .unwrap_or_else(|| DEFAULT_DATASET_ID.to_string()),
                table_id: text(&action.params, "tableId")
                    .unwrap_or_else(|| DEFAULT_TABLE_ID.to_string()),
            });

        let credential = match text(&action.params, "privateKey") {
            Some(key) => Credential::new(key)?,
            None => fallback
                .ok_or_else(|| OffsetError::validation("Missing Cloverly API private key."))?,
        };

        let request = Self {
            footprint_kg,
            credential,
            thresholds,
            pipeline,
        };
        request.validate()?;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ActionRequest {
        ActionRequest::default()
            .with_param("value", "100")
            .with_param("privateKey", "sk_test")
    }

    fn message(err: OffsetError) -> String {
        match err {
            OffsetError::Validation { message } => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_footprint_must_be_positive_number() {
        for value in ["0", "-5", "abc", "", "NaN", "inf"] {
            let action = base()
                .with_param("value", value)
                .with_form_param("useThresholds", "no");
            let err = OffsetRequest::from_action(&action, None).unwrap_err();
            assert_eq!(message(err), MISSING_FOOTPRINT, "value={value:?}");
        }

        let missing = ActionRequest::default().with_param("privateKey", "k");
        let err = OffsetRequest::from_action(&missing, None).unwrap_err();
        assert_eq!(message(err), MISSING_FOOTPRINT);
    }

    #[test]
    fn test_numeric_footprint_accepted() {
        let action = base()
            .with_param("value", 12.5)
            .with_form_param("useThresholds", "no");
        let request = OffsetRequest::from_action(&action, None).unwrap();
        assert_eq!(request.footprint_kg, 12.5);
    }

    #[test]
    fn test_thresholds_required_but_missing() {
        let action = base().with_form_param("useThresholds", "yes");
        let err = OffsetRequest::from_action(&action, None).unwrap_err();
        assert_eq!(message(err), MISSING_THRESHOLDS);
    }

    #[test]
    fn test_use_thresholds_defaults_to_yes() {
        let err = OffsetRequest::from_action(&base(), None).unwrap_err();
        assert_eq!(message(err), MISSING_THRESHOLDS);
    }

    #[test]
    fn test_negligible_percent_does_not_satisfy_required_thresholds() {
        let action = base()
            .with_form_param("useThresholds", "yes")
            .with_form_param("percentThreshold", "0.0005");
        let err = OffsetRequest::from_action(&action, None).unwrap_err();
        assert_eq!(message(err), MISSING_THRESHOLDS);
    }

    #[test]
    fn test_limits_parsed() {
        let action = base()
            .with_form_param("useThresholds", "YES")
            .with_form_param("costThreshold", "200")
            .with_form_param("percentThreshold", "2");
        let request = OffsetRequest::from_action(&action, None).unwrap();
        assert!(request.thresholds.use_thresholds);
        assert_eq!(request.thresholds.absolute_cents, Some(200.0));
        assert_eq!(request.thresholds.percent, Some(2.0));
        assert_eq!(request.thresholds.ceiling(), Ceiling::Cents(200.0));
    }

    #[test]
    fn test_non_numeric_limit_rejected() {
        let action = base()
            .with_form_param("useThresholds", "yes")
            .with_form_param("costThreshold", "two hundred");
        let err = OffsetRequest::from_action(&action, None).unwrap_err();
        assert!(message(err).contains("costThreshold"));
    }

    #[test]
    fn test_negative_limits_rejected() {
        for key in ["costThreshold", "percentThreshold"] {
            let action = base()
                .with_form_param("useThresholds", "yes")
                .with_form_param(key, "-5");
            let err = OffsetRequest::from_action(&action, None).unwrap_err();
            let message = message(err);
            assert!(message.contains(key), "{message}");
            assert!(message.contains("negative"), "{message}");
        }
    }

    #[test]
    fn test_zero_absolute_limit_is_accepted() {
        let action = base()
            .with_form_param("useThresholds", "yes")
            .with_form_param("costThreshold", "0");
        let request = OffsetRequest::from_action(&action, None).unwrap();
        assert_eq!(request.thresholds.ceiling(), Ceiling::Cents(0.0));
    }

    #[test]
    fn test_invalid_flag_rejected() {
        let action = base().with_form_param("useThresholds", "maybe");
        let err = OffsetRequest::from_action(&action, None).unwrap_err();
        assert!(message(err).contains("useThresholds"));
    }

    #[test]
    fn test_pipeline_defaults() {
        let action = base()
            .with_form_param("useThresholds", "no")
            .with_param("use_full_data_pipeline", "yes")
            .with_param("tableId", "custom_table")
            .with_param("bucketName", "   ");
        let request = OffsetRequest::from_action(&action, None).unwrap();
        assert_eq!(
            request.pipeline,
            Some(PipelineTarget {
                bucket_name: "absolve_bucket".to_string(),
                dataset_id: "offset_purchases".to_string(),
                table_id: "custom_table".to_string(),
            })
        );
    }

    #[test]
    fn test_pipeline_disabled_by_default() {
        let action = base().with_form_param("useThresholds", "no");
        let request = OffsetRequest::from_action(&action, None).unwrap();
        assert!(request.pipeline.is_none());
    }

    #[test]
    fn test_credential_fallback() {
        let action = ActionRequest::default()
            .with_param("value", "1")
            .with_form_param("useThresholds", "no");
        assert!(OffsetRequest::from_action(&action, None).is_err());

        let fallback = Credential::new("from-env").unwrap();
        let request = OffsetRequest::from_action(&action, Some(fallback.clone())).unwrap();
        assert_eq!(request.credential, fallback);
    }

    #[test]
    fn test_deserialize_host_shape() {
        let raw = r#"{
            "params": {"value": "1000", "privateKey": "k", "use_full_data_pipeline": "no"},
            "formParams": {"useThresholds": "yes", "costThreshold": "200"}
        }"#;
        let action: ActionRequest = serde_json::from_str(raw).unwrap();
        let request = OffsetRequest::from_action(&action, None).unwrap();
        assert_eq!(request.footprint_kg, 1000.0);
        assert_eq!(request.thresholds.ceiling(), Ceiling::Cents(200.0));
    }

    #[test]
    fn test_programmatic_constructor_validates() {
        let credential = Credential::new("k").unwrap();
        assert!(OffsetRequest::new(0.0, credential.clone(), ThresholdConfig::bypass()).is_err());
        assert!(OffsetRequest::new(10.0, credential.clone(), ThresholdConfig::default()).is_err());

        let request = OffsetRequest::new(
            10.0,
            credential,
            ThresholdConfig::default().with_absolute_cents(200.0),
        )
        .unwrap();
        assert_eq!(request.thresholds.ceiling(), Ceiling::Cents(200.0));
    }
}
