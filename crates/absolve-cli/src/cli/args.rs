use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "absolve",
    version,
    about = "Offset a carbon footprint by purchasing offsets from the Cloverly marketplace"
)]
pub struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the estimate → purchase workflow for one action request
    Execute(ExecuteArgs),
    /// Show the spending ceiling derived from threshold settings (no network)
    Ceiling(CeilingArgs),
}

#[derive(Parser, Debug)]
pub struct ExecuteArgs {
    /// Action request JSON (`{"params": {...}, "formParams": {...}}`); `-` reads stdin
    #[arg(long, short = 'r', default_value = "-")]
    pub request: PathBuf,

    /// Private key used when the request has no `privateKey` param
    #[arg(long, env = "ABSOLVE_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    #[arg(long, env = "ABSOLVE_MARKETPLACE_URL")]
    pub marketplace_url: Option<String>,

    #[arg(long, env = "ABSOLVE_PIPELINE_URL")]
    pub pipeline_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "ABSOLVE_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Pretty-print the response
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Parser, Debug)]
pub struct CeilingArgs {
    /// Absolute limit in cents
    #[arg(long)]
    pub cost_threshold: Option<f64>,

    /// Percentage of total gross margin
    #[arg(long)]
    pub percent_threshold: Option<f64>,

    /// Estimate cost in cents to check against the ceiling
    #[arg(long)]
    pub cost: Option<u64>,
}
