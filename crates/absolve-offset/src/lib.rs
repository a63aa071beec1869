//! Carbon footprint to purchased offset, via the Cloverly marketplace.
//!
//! One invocation runs four stages in order:
//!
//! - request an estimate for the footprint (kg)
//! - check the estimate cost against the configured spending ceiling
//! - convert the estimate into a purchase via its slug
//! - optionally ask the reporting pipeline to refresh its offsets table
//!
//! # Quick Start
//!
//! ```no_run
//! use absolve_offset::{ActionRequest, Credential, OffsetWorkflow};
//!
//! # async fn example() -> Result<(), absolve_offset::OffsetError> {
//! let workflow = OffsetWorkflow::from_env()?;
//!
//! let action = ActionRequest::default()
//!     .with_param("value", "100")
//!     .with_form_param("useThresholds", "yes")
//!     .with_form_param("costThreshold", "200");
//!
//! let outcome = workflow.run_action(&action, Credential::from_env()).await;
//! println!("{}", serde_json::to_string(&outcome.to_response()).unwrap());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `ABSOLVE_MARKETPLACE_URL` | Marketplace base URL (default: `https://api.cloverly.app/2019-03-beta`) |
//! | `ABSOLVE_PIPELINE_URL` | Refresh webhook URL |
//! | `ABSOLVE_TIMEOUT` | Request timeout in seconds (default: 30) |
//! | `ABSOLVE_PRIVATE_KEY` | Private key used when the request carries none |

pub mod auth;
pub mod client;
pub mod error;
pub mod outcome;
pub mod pipeline;
pub mod request;
pub mod threshold;
pub mod types;
pub mod workflow;

// Re-export main types
pub use auth::Credential;
pub use client::http::USER_AGENT_VALUE as OFFSET_USER_AGENT;
pub use client::{Marketplace, MarketplaceClient};
pub use error::{OffsetError, OffsetResult};
pub use outcome::{ActionResponse, NotificationStatus, OutcomeKind, Stage, WorkflowOutcome};
pub use pipeline::{Notifier, PipelineNotifier};
pub use request::{ActionRequest, OffsetRequest, ThresholdConfig, YesNo};
pub use threshold::{derive_ceiling, evaluate, Ceiling, ThresholdDecision};
pub use types::{Estimate, OffsetConfig, PipelineTarget, Purchase};
pub use workflow::OffsetWorkflow;
