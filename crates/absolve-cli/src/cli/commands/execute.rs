use std::io::Read;
use std::path::Path;

use absolve_offset::{ActionRequest, Credential, OffsetConfig, OffsetWorkflow, OutcomeKind};
use anyhow::Context;
use tracing::info;

use crate::cli::args::ExecuteArgs;
use crate::exit_codes;

fn read_request(path: &Path) -> anyhow::Result<ActionRequest> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read action request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read action request {}", path.display()))?
    };
    serde_json::from_str(&raw).context("action request is not valid JSON")
}

fn config(args: &ExecuteArgs) -> OffsetConfig {
    let mut config = OffsetConfig::default();
    if let Some(url) = &args.marketplace_url {
        config = config.with_marketplace_url(url);
    }
    if let Some(url) = &args.pipeline_url {
        config = config.with_pipeline_url(url);
    }
    if let Some(secs) = args.timeout {
        config = config.with_timeout_secs(secs);
    }
    config
}

pub async fn run(args: ExecuteArgs) -> anyhow::Result<i32> {
    let action = match read_request(&args.request) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("error: {e:#}");
            return Ok(exit_codes::FAILED);
        }
    };

    let workflow = match OffsetWorkflow::from_config(&config(&args)) {
        Ok(workflow) => workflow,
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(exit_codes::INTERNAL_ERROR);
        }
    };

    let fallback = args.private_key.and_then(|key| Credential::new(key).ok());
    let outcome = workflow.run_action(&action, fallback).await;

    let response = outcome.to_response();
    let rendered = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{}", rendered);

    let code = match &outcome.kind {
        OutcomeKind::Purchased { .. } => exit_codes::SUCCESS,
        OutcomeKind::Rejected { .. } => exit_codes::REJECTED,
        OutcomeKind::Failed { error, .. } => error.exit_code(),
    };
    info!(success = response.success, exit_code = code, "action finished");
    Ok(code)
}
