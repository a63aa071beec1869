//! Workflow outcome, discriminated by how the invocation ended.
//!
//! The host only understands `{success, message}`; [`WorkflowOutcome`] keeps
//! the richer shape so callers (and tests) can tell a threshold rejection from
//! an API fault without matching on message text.

use std::fmt;

use serde::Serialize;

use crate::error::OffsetError;
use crate::threshold::Ceiling;
use crate::types::{Estimate, Purchase};

/// Stage at which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validation,
    Estimate,
    Purchase,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validation => "validation",
            Self::Estimate => "estimate",
            Self::Purchase => "purchase",
        })
    }
}

/// What happened with the pipeline refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum NotificationStatus {
    NotRequested,
    Sent,
    /// Refresh failed after money was spent; purchase still counts.
    Failed(String),
}

#[derive(Debug)]
pub enum OutcomeKind {
    Purchased {
        footprint_kg: f64,
        estimate: Estimate,
        purchase: Purchase,
        ceiling: Ceiling,
        notification: NotificationStatus,
    },
    Rejected {
        estimate: Estimate,
        ceiling: Ceiling,
    },
    Failed {
        stage: Stage,
        error: OffsetError,
    },
}

/// Exactly one per invocation.
#[derive(Debug)]
pub struct WorkflowOutcome {
    pub kind: OutcomeKind,
}

impl WorkflowOutcome {
    pub(crate) fn failed(stage: Stage, error: OffsetError) -> Self {
        Self {
            kind: OutcomeKind::Failed { stage, error },
        }
    }

    pub fn success(&self) -> bool {
        matches!(self.kind, OutcomeKind::Purchased { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.kind, OutcomeKind::Rejected { .. })
    }

    /// Failed stage and error, if any.
    pub fn failure(&self) -> Option<(Stage, &OffsetError)> {
        match &self.kind {
            OutcomeKind::Failed { stage, error } => Some((*stage, error)),
            _ => None,
        }
    }

    /// Host-facing message: the confirmation payload on success, text otherwise.
    pub fn message(&self) -> serde_json::Value {
        match &self.kind {
            OutcomeKind::Purchased { purchase, .. } => purchase.payload.clone(),
            OutcomeKind::Rejected { estimate, ceiling } => {
                serde_json::Value::String(rejection_message(estimate.cost_cents, *ceiling))
            }
            OutcomeKind::Failed { error, .. } => serde_json::Value::String(error.to_string()),
        }
    }

    pub fn to_response(&self) -> ActionResponse {
        ActionResponse {
            success: self.success(),
            message: self.message(),
        }
    }
}

pub(crate) fn rejection_message(cost_cents: u64, ceiling: Ceiling) -> String {
    format!(
        "Estimate for offset ({}) was greater than threshold ({}). \
         Increase threshold or decrease offset quantity.",
        cost_cents, ceiling
    )
}

/// Response handed back to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn estimate(cost_cents: u64) -> Estimate {
        Estimate {
            cost_cents,
            slug: "slug-1".to_string(),
        }
    }

    #[test]
    fn test_rejection_message_names_cost_and_ceiling() {
        let outcome = WorkflowOutcome {
            kind: OutcomeKind::Rejected {
                estimate: estimate(500),
                ceiling: Ceiling::Cents(200.0),
            },
        };
        assert!(!outcome.success());
        assert!(outcome.is_rejected());
        assert!(outcome.failure().is_none());
        assert_eq!(
            outcome.message(),
            json!("Estimate for offset (500) was greater than threshold (200). Increase threshold or decrease offset quantity.")
        );
    }

    #[test]
    fn test_purchase_response_carries_payload() {
        let payload = json!({"slug": "p-1", "total_cost_in_usd_cents": 150});
        let outcome = WorkflowOutcome {
            kind: OutcomeKind::Purchased {
                footprint_kg: 100.0,
                estimate: estimate(150),
                purchase: Purchase {
                    cost_cents: 150,
                    cost_confirmed: true,
                    payload: payload.clone(),
                },
                ceiling: Ceiling::Unlimited,
                notification: NotificationStatus::NotRequested,
            },
        };
        assert_eq!(
            outcome.to_response(),
            ActionResponse {
                success: true,
                message: payload
            }
        );
    }

    #[test]
    fn test_failure_message_is_error_text() {
        let outcome = WorkflowOutcome::failed(
            Stage::Estimate,
            OffsetError::Network {
                message: "connection refused".to_string(),
            },
        );
        let response = outcome.to_response();
        assert!(!response.success);
        assert_eq!(response.message, json!("network error: connection refused"));
        assert_eq!(outcome.failure().map(|(stage, _)| stage), Some(Stage::Estimate));
        assert_eq!(Stage::Estimate.to_string(), "estimate");
    }

    #[test]
    fn test_notification_status_serialization() {
        assert_eq!(
            serde_json::to_value(NotificationStatus::Failed("HTTP 500: boom".into())).unwrap(),
            json!({"status": "failed", "message": "HTTP 500: boom"})
        );
        assert_eq!(
            serde_json::to_value(NotificationStatus::Sent).unwrap(),
            json!({"status": "sent"})
        );
    }
}
