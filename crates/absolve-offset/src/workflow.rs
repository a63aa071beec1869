//! Estimate → evaluate → purchase → notify.
//!
//! Stages run strictly in sequence, each awaited to completion. A failed
//! estimate never reaches the purchase call and a failed purchase never
//! reaches the notifier. Nothing is retried; resubmitting the workflow fetches
//! a fresh estimate.

use tracing::{error, info, warn};

use crate::auth::Credential;
use crate::client::{Marketplace, MarketplaceClient};
use crate::error::OffsetResult;
use crate::outcome::{rejection_message, NotificationStatus, OutcomeKind, Stage, WorkflowOutcome};
use crate::pipeline::{Notifier, PipelineNotifier};
use crate::request::{ActionRequest, OffsetRequest};
use crate::threshold::evaluate;
use crate::types::OffsetConfig;

/// The offset workflow over a marketplace and a notifier.
#[derive(Debug, Clone)]
pub struct OffsetWorkflow<M = MarketplaceClient, N = PipelineNotifier> {
    marketplace: M,
    notifier: N,
}

impl OffsetWorkflow {
    /// Build the reqwest-backed workflow.
    pub fn from_config(config: &OffsetConfig) -> OffsetResult<Self> {
        Ok(Self::new(
            MarketplaceClient::new(config)?,
            PipelineNotifier::new(config)?,
        ))
    }

    pub fn from_env() -> OffsetResult<Self> {
        Self::from_config(&OffsetConfig::from_env())
    }
}

impl<M: Marketplace, N: Notifier> OffsetWorkflow<M, N> {
    pub fn new(marketplace: M, notifier: N) -> Self {
        Self {
            marketplace,
            notifier,
        }
    }

    /// Parse a host request and run it.
    ///
    /// `fallback` supplies the key when the request's credential bag is empty.
    pub async fn run_action(
        &self,
        action: &ActionRequest,
        fallback: Option<Credential>,
    ) -> WorkflowOutcome {
        match OffsetRequest::from_action(action, fallback) {
            Ok(request) => self.execute(&request).await,
            Err(e) => {
                warn!(stage = %Stage::Validation, error = %e, "rejecting action request");
                WorkflowOutcome::failed(Stage::Validation, e)
            }
        }
    }

    pub async fn execute(&self, request: &OffsetRequest) -> WorkflowOutcome {
        if let Err(e) = request.validate() {
            warn!(stage = %Stage::Validation, error = %e, "rejecting offset request");
            return WorkflowOutcome::failed(Stage::Validation, e);
        }

        let estimate = match self
            .marketplace
            .estimate(&request.credential, request.footprint_kg)
            .await
        {
            Ok(estimate) => estimate,
            Err(e) => {
                error!(stage = %Stage::Estimate, error = %e, "failure getting estimate");
                return WorkflowOutcome::failed(Stage::Estimate, e);
            }
        };

        let ceiling = request.thresholds.ceiling();
        let decision = evaluate(
            estimate.cost_cents,
            ceiling,
            request.thresholds.use_thresholds,
        );
        if !decision.is_approved() {
            warn!("{}", rejection_message(estimate.cost_cents, ceiling));
            return WorkflowOutcome {
                kind: OutcomeKind::Rejected { estimate, ceiling },
            };
        }

        let purchase = match self
            .marketplace
            .purchase(&request.credential, estimate.clone())
            .await
        {
            Ok(purchase) => purchase,
            Err(e) => {
                error!(
                    stage = %Stage::Purchase,
                    error = %e,
                    slug = %estimate.slug,
                    "failure with purchase execution"
                );
                return WorkflowOutcome::failed(Stage::Purchase, e);
            }
        };
        info!(
            footprint_kg = request.footprint_kg,
            cost_cents = purchase.cost_cents,
            cost_confirmed = purchase.cost_confirmed,
            ceiling = %ceiling,
            decision = ?decision,
            "footprint offset"
        );

        let notification = match &request.pipeline {
            None => NotificationStatus::NotRequested,
            Some(target) => match self.notifier.refresh(target).await {
                Ok(()) => {
                    info!(table = %target.table_id, "offset dataset refreshed");
                    NotificationStatus::Sent
                }
                Err(e) => {
                    // Money is already spent; the purchase outcome stands.
                    warn!(error = %e, "offset dataset refresh failed");
                    NotificationStatus::Failed(e.to_string())
                }
            },
        };

        WorkflowOutcome {
            kind: OutcomeKind::Purchased {
                footprint_kg: request.footprint_kg,
                estimate,
                purchase,
                ceiling,
                notification,
            },
        }
    }
}
