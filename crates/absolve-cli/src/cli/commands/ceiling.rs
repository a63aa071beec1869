use absolve_offset::{derive_ceiling, evaluate};

use crate::cli::args::CeilingArgs;
use crate::exit_codes;

pub fn run(args: CeilingArgs) -> anyhow::Result<i32> {
    let ceiling = derive_ceiling(args.cost_threshold, args.percent_threshold);

    let mut report = serde_json::json!({ "ceiling": ceiling.to_string() });
    let mut code = exit_codes::SUCCESS;
    if let Some(cost) = args.cost {
        let decision = evaluate(cost, ceiling, true);
        report["cost"] = cost.into();
        report["decision"] = serde_json::to_value(decision)?;
        if !decision.is_approved() {
            code = exit_codes::REJECTED;
        }
    }

    println!("{}", serde_json::to_string(&report)?);
    Ok(code)
}
