//! Reporting pipeline refresh webhook.
//!
//! Called after a successful purchase when the full data pipeline is enabled.
//! The endpoint is unauthenticated.

use async_trait::async_trait;
use tracing::debug;

use crate::client::http::HttpBackend;
use crate::error::OffsetResult;
use crate::types::{OffsetConfig, PipelineTarget};

/// Downstream refresh signal.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn refresh(&self, target: &PipelineTarget) -> OffsetResult<()>;
}

/// reqwest-backed webhook caller.
#[derive(Debug, Clone)]
pub struct PipelineNotifier {
    http: HttpBackend,
    url: String,
}

impl PipelineNotifier {
    pub fn new(config: &OffsetConfig) -> OffsetResult<Self> {
        Ok(Self {
            http: HttpBackend::new(config)?,
            url: config.pipeline_url.clone(),
        })
    }
}

#[async_trait]
impl Notifier for PipelineNotifier {
    async fn refresh(&self, target: &PipelineTarget) -> OffsetResult<()> {
        debug!(
            url = %self.url,
            bucket = %target.bucket_name,
            dataset = %target.dataset_id,
            table = %target.table_id,
            "requesting offset data refresh"
        );
        // Response body is not inspected; any 2xx counts as refreshed.
        self.http.post_json(&self.url, None, target).await?;
        Ok(())
    }
}
