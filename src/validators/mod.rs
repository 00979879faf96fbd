pub mod command_safety;
pub mod composite;
pub mod content_safety;
pub mod convention;
pub mod path_safety;
pub mod permission_policy;
pub mod security_scan;

pub use command_safety::CommandSafetyValidator;
pub use composite::{CompositeReport, CompositeValidator};
pub use content_safety::ContentSafetyValidator;
pub use convention::ConventionValidator;
pub use path_safety::PathSafetyValidator;
pub use permission_policy::PermissionPolicyValidator;
pub use security_scan::SecurityScanValidator;

use crate::config::Config;
use crate::request::{OperationRequest, ToolKind};
use crate::verdict::Verdict;
use regex::Regex;
use thiserror::Error;

/// A pluggable validation unit.
///
/// `should_run` must be pure; `validate` must never panic for
/// malformed-but-present input. Internal faults are mapped to a neutral
/// info verdict at the validator boundary (see [`fail_open`]) so a bug in
/// one validator can never block an otherwise-safe operation.
pub trait Validator {
    fn name(&self) -> &str;
    fn description(&self) -> &str;

    /// Applicability predicate: disabled validators, excluded tool kinds,
    /// and non-matching paths all opt out.
    fn should_run(&self, tool_kind: &ToolKind, path: Option<&str>) -> bool;

    fn validate(&self, request: &OperationRequest) -> Verdict;
}

/// Fault channel for genuinely unexpected errors inside a validator.
///
/// Policy findings travel through `Verdict`; this type exists only so the
/// boundary can distinguish "the check fired" from "the check broke".
#[derive(Debug, Error)]
pub enum Fault {
    #[error("i/o fault: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal fault: {0}")]
    Other(String),
}

/// Map an internal fault to the fail-open verdict.
///
/// Fail-open applies to the pipeline's own errors only; detected policy
/// violations always surface as their configured severity.
pub(crate) fn fail_open(result: Result<Verdict, Fault>) -> Verdict {
    match result {
        Ok(verdict) => verdict,
        Err(_) => Verdict::info("no issue found"),
    }
}

/// Shared applicability filter built from per-validator configuration:
/// an enabled flag, a tool-kind set (empty = all), and path regexes
/// (empty = all).
pub struct ValidatorFilter {
    enabled: bool,
    allowed_tool_kinds: Vec<ToolKind>,
    path_patterns: Vec<Regex>,
}

impl ValidatorFilter {
    pub fn new(enabled: bool, allowed_tool_kinds: Vec<ToolKind>, path_patterns: &[String]) -> Self {
        // Patterns that fail to compile are dropped rather than taking the
        // whole validator down (fail-open on config mistakes).
        let path_patterns = path_patterns
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();

        Self {
            enabled,
            allowed_tool_kinds,
            path_patterns,
        }
    }

    pub fn accepts(&self, tool_kind: &ToolKind, path: Option<&str>) -> bool {
        if !self.enabled {
            return false;
        }

        if !self.allowed_tool_kinds.is_empty() && !self.allowed_tool_kinds.contains(tool_kind) {
            return false;
        }

        // Path patterns only filter when the request actually has a path.
        if !self.path_patterns.is_empty() {
            if let Some(path) = path {
                if !self.path_patterns.iter().any(|re| re.is_match(path)) {
                    return false;
                }
            }
        }

        true
    }
}

/// Build the active validator set from configuration, in fixed
/// registration order. Aggregated messages follow this order.
pub fn build_validators(config: &Config) -> Vec<Box<dyn Validator>> {
    let mut validators: Vec<Box<dyn Validator>> = Vec::new();

    if config.file_validation.enabled {
        validators.push(Box::new(PathSafetyValidator::new(
            config.file_validation.path.clone(),
        )));
        validators.push(Box::new(ContentSafetyValidator::new(
            config.file_validation.content.clone(),
        )));
    }

    if config.security_validation.enabled {
        validators.push(Box::new(SecurityScanValidator::new(
            config.security_validation.scanner.clone(),
        )));
        validators.push(Box::new(PermissionPolicyValidator::new(
            config.security_validation.permissions.clone(),
        )));
    }

    if config.pattern_validation.enabled {
        validators.push(Box::new(ConventionValidator::new(
            config.pattern_validation.clone(),
        )));
    }

    if config.command_validation.enabled {
        validators.push(Box::new(CommandSafetyValidator::new(
            config.command_validation.clone(),
        )));
    }

    validators
}
