use crate::request::{OperationRequest, ToolKind};
use crate::validators::Validator;
use crate::verdict::{Severity, Verdict};

/// Per-validator findings gathered by one composite run.
#[derive(Debug, Clone)]
pub struct CompositeReport {
    /// The merged verdict per the aggregation rule.
    pub verdict: Verdict,
    /// `validator-name: message` lines for error findings.
    pub errors: Vec<String>,
    /// `validator-name: message` lines for warning findings.
    pub warnings: Vec<String>,
    /// Info-severity messages (suggestions). Excluded from aggregation,
    /// surfaced through the advisory payload.
    pub notes: Vec<String>,
}

/// Runs every applicable validator and merges their verdicts.
///
/// No short-circuiting across validators: all applicable validators
/// execute, in registration order, and the merged message preserves that
/// order. Errors make the composite invalid; warnings alone never do.
pub struct CompositeValidator {
    validators: Vec<Box<dyn Validator>>,
}

impl CompositeValidator {
    pub fn new(validators: Vec<Box<dyn Validator>>) -> Self {
        Self { validators }
    }

    pub fn evaluate(&self, request: &OperationRequest) -> CompositeReport {
        let path = request.file_path();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut notes = Vec::new();

        for validator in &self.validators {
            if !validator.should_run(&request.tool_kind, path) {
                continue;
            }
            let verdict = validator.validate(request);
            if verdict.is_clean() && verdict.message.is_empty() {
                continue;
            }
            let line = format!("{}: {}", validator.name(), verdict.message);
            if !verdict.is_valid && verdict.severity == Severity::Error {
                errors.push(line);
            } else if verdict.severity == Severity::Warning {
                warnings.push(line);
            } else {
                notes.push(verdict.message);
            }
        }

        let verdict = if !errors.is_empty() {
            Verdict::error(errors.join("\n"))
        } else if !warnings.is_empty() {
            Verdict::warning(warnings.join("\n"))
        } else {
            Verdict::info("all validations passed")
        };

        CompositeReport {
            verdict,
            errors,
            warnings,
            notes,
        }
    }
}

impl Validator for CompositeValidator {
    fn name(&self) -> &str {
        "composite"
    }

    fn description(&self) -> &str {
        "Runs all applicable validators and merges their verdicts"
    }

    fn should_run(&self, tool_kind: &ToolKind, path: Option<&str>) -> bool {
        self.validators.iter().any(|v| v.should_run(tool_kind, path))
    }

    fn validate(&self, request: &OperationRequest) -> Verdict {
        self.evaluate(request).verdict
    }
}
