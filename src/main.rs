use preflight::config::{Config, EnforcementMode};
use preflight::orchestrator::{Decision, Orchestrator};
use preflight::request::{OperationRequest, RequestError};
use serde_json::json;
use std::io::Read;

// Exit codes understood by the host runtime.
const EXIT_ALLOW: i32 = 0;
const EXIT_UNPARSABLE: i32 = 1;
const EXIT_BLOCK: i32 = 2;

fn main() {
    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        eprintln!("preflight: failed to read request: {}", e);
        std::process::exit(EXIT_UNPARSABLE);
    }

    if input.trim().is_empty() {
        std::process::exit(EXIT_ALLOW);
    }

    let request = match OperationRequest::from_json(&input) {
        Ok(request) => request,
        // A payload with no tool name is not an operation at all; pass it
        // through rather than blocking the host on nothing.
        Err(RequestError::MissingToolName) => std::process::exit(EXIT_ALLOW),
        Err(e) => {
            eprintln!("preflight: {}", e);
            std::process::exit(EXIT_UNPARSABLE);
        }
    };

    let config = Config::load_or_default();
    let orchestrator = Orchestrator::new(&config);
    let outcome = orchestrator.validate(&request);

    match outcome.decision {
        Decision::Deny => {
            if let Some(message) = &outcome.message {
                eprintln!("{}", message);
            }
            std::process::exit(EXIT_BLOCK);
        }
        Decision::Ask | Decision::Allow => {
            if orchestrator.mode() != EnforcementMode::Silent {
                let advisory = json!({
                    "decision": outcome.decision.as_str(),
                    "reason": outcome.message,
                    "suggestions": outcome.suggestions,
                });
                println!("{}", advisory);
            }
            std::process::exit(EXIT_ALLOW);
        }
    }
}
