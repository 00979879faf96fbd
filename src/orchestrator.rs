use crate::audit::DecisionLogger;
use crate::config::{Config, EnforcementMode};
use crate::request::OperationRequest;
use crate::validators::{build_validators, CompositeValidator};
use crate::verdict::Verdict;
use serde::Serialize;

/// Host-visible decision for one operation.
///
/// `Deny` blocks outright; `Ask` signals success but requests explicit
/// approval; `Allow` is a plain pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Ask,
    Deny,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Ask => "ask",
            Decision::Deny => "deny",
        }
    }
}

/// Full outcome of one pipeline run: the decision, the composite verdict
/// behind it, the message to surface (None under silent mode), and any
/// advisory suggestions.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub decision: Decision,
    pub verdict: Verdict,
    pub message: Option<String>,
    pub suggestions: Vec<String>,
}

/// Builds the validator set from configuration, runs the composite,
/// appends a decision record, and applies the enforcement mode.
///
/// The mode and log path are plain constructor inputs, not globals; the
/// same binary can run with different modes in different contexts.
pub struct Orchestrator {
    enabled: bool,
    mode: EnforcementMode,
    composite: CompositeValidator,
    logger: Option<DecisionLogger>,
}

impl Orchestrator {
    pub fn new(config: &Config) -> Self {
        let composite = CompositeValidator::new(build_validators(config));

        // Default log location applies when no explicit path is configured;
        // a logger that cannot be set up just disables logging.
        let logger = match &config.log_file {
            Some(path) => DecisionLogger::with_path(path).ok(),
            None => DecisionLogger::new().ok(),
        };

        Self {
            enabled: config.enabled,
            mode: config.mode,
            composite,
            logger,
        }
    }

    pub fn mode(&self) -> EnforcementMode {
        self.mode
    }

    /// Validate one request and map the composite verdict to an outcome.
    pub fn validate(&self, request: &OperationRequest) -> Outcome {
        if !self.enabled {
            return Outcome {
                decision: Decision::Allow,
                verdict: Verdict::passed(),
                message: None,
                suggestions: Vec::new(),
            };
        }

        let report = self.composite.evaluate(request);

        if let Some(logger) = &self.logger {
            // Logging never affects the decision.
            if let Err(e) =
                logger.log_decision(&request.tool_name, request.file_path(), &report.verdict)
            {
                eprintln!("preflight: failed to write decision log: {}", e);
            }
        }

        let verdict = report.verdict.clone();
        let flagged = !verdict.is_valid || !report.warnings.is_empty();

        let (decision, message) = match self.mode {
            EnforcementMode::Blocking => {
                if !verdict.is_valid {
                    (Decision::Deny, Some(verdict.message.clone()))
                } else if !report.warnings.is_empty() {
                    (Decision::Ask, Some(verdict.message.clone()))
                } else {
                    (Decision::Allow, None)
                }
            }
            EnforcementMode::Warning => {
                if flagged {
                    (Decision::Ask, Some(verdict.message.clone()))
                } else {
                    (Decision::Allow, None)
                }
            }
            EnforcementMode::Silent => (Decision::Allow, None),
        };

        Outcome {
            decision,
            verdict,
            message,
            suggestions: report.notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn bash(command: &str) -> OperationRequest {
        OperationRequest::new("Bash", json!({"command": command}), PathBuf::from("/tmp"))
    }

    fn orchestrator_with_mode(mode: EnforcementMode) -> Orchestrator {
        let mut config = Config::default_config();
        config.mode = mode;
        Orchestrator::new(&config)
    }

    #[test]
    fn test_blocking_mode_denies_destructive_command() {
        let orchestrator = orchestrator_with_mode(EnforcementMode::Blocking);
        let outcome = orchestrator.validate(&bash("rm -rf /"));
        assert_eq!(outcome.decision, Decision::Deny);
        let message = outcome.message.unwrap();
        assert!(message.contains("recursive deletion on root"), "{}", message);
    }

    #[test]
    fn test_blocking_mode_allows_clean_command() {
        let orchestrator = orchestrator_with_mode(EnforcementMode::Blocking);
        let outcome = orchestrator.validate(&bash("cargo build"));
        assert_eq!(outcome.decision, Decision::Allow);
        assert!(outcome.message.is_none());
    }

    #[test]
    fn test_blocking_mode_asks_on_warning() {
        let orchestrator = orchestrator_with_mode(EnforcementMode::Blocking);
        let outcome = orchestrator.validate(&bash("git push --force origin main"));
        assert_eq!(outcome.decision, Decision::Ask);
        assert!(outcome.message.is_some());
    }

    #[test]
    fn test_warning_mode_never_denies() {
        let orchestrator = orchestrator_with_mode(EnforcementMode::Warning);
        let outcome = orchestrator.validate(&bash("rm -rf /"));
        assert_ne!(outcome.decision, Decision::Deny);
        assert!(outcome.message.is_some());
    }

    #[test]
    fn test_silent_mode_allows_and_says_nothing() {
        let orchestrator = orchestrator_with_mode(EnforcementMode::Silent);
        let outcome = orchestrator.validate(&bash("rm -rf /"));
        assert_eq!(outcome.decision, Decision::Allow);
        assert!(outcome.message.is_none());
        // The verdict itself still records the violation for the log
        assert!(!outcome.verdict.is_valid);
    }

    #[test]
    fn test_disabled_pipeline_allows_everything() {
        let mut config = Config::default_config();
        config.enabled = false;
        let orchestrator = Orchestrator::new(&config);
        let outcome = orchestrator.validate(&bash("rm -rf /"));
        assert_eq!(outcome.decision, Decision::Allow);
        assert!(outcome.verdict.is_valid);
    }

    #[test]
    fn test_suggestions_surface_without_blocking() {
        let orchestrator = orchestrator_with_mode(EnforcementMode::Blocking);
        let outcome = orchestrator.validate(&bash("ls | grep foo"));
        assert_eq!(outcome.decision, Decision::Allow);
        assert!(!outcome.suggestions.is_empty());
    }

    #[test]
    fn test_idempotent_for_same_request() {
        let orchestrator = orchestrator_with_mode(EnforcementMode::Blocking);
        let first = orchestrator.validate(&bash("rm -rf /"));
        let second = orchestrator.validate(&bash("rm -rf /"));
        assert_eq!(first.decision, second.decision);
        assert_eq!(first.verdict, second.verdict);
    }

    #[test]
    fn test_decision_logged_in_silent_mode() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("decisions.log");
        let mut config = Config::default_config();
        config.mode = EnforcementMode::Silent;
        config.log_file = Some(log_path.clone());

        let orchestrator = Orchestrator::new(&config);
        let outcome = orchestrator.validate(&bash("rm -rf /"));
        assert_eq!(outcome.decision, Decision::Allow);

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("\"is_valid\":false"));
    }

    #[test]
    fn test_decision_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Decision::Deny).unwrap(), "\"deny\"");
        assert_eq!(Decision::Ask.as_str(), "ask");
    }
}
