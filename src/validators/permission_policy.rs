use crate::config::PermissionPolicyConfig;
use crate::request::{OperationRequest, ToolKind};
use crate::validators::{Validator, ValidatorFilter};
use crate::verdict::Verdict;
use chrono::{Local, Timelike};

/// Tool-level allow/deny policy: pure table lookups, no pattern matching.
///
/// A blocked tool is an error; an approval-required tool is a warning
/// (the advisory channel turns it into an explicit approval request);
/// a tool used outside its configured time window is an error.
pub struct PermissionPolicyValidator {
    config: PermissionPolicyConfig,
    filter: ValidatorFilter,
}

impl PermissionPolicyValidator {
    pub fn new(config: PermissionPolicyConfig) -> Self {
        // Applies to every tool kind.
        let filter = ValidatorFilter::new(true, vec![], &[]);
        Self { config, filter }
    }

    /// Policy evaluation at an explicit local hour, for determinism in
    /// tests.
    fn evaluate_at(&self, tool_name: &str, hour: u32) -> Verdict {
        if self
            .config
            .blocked_tools
            .iter()
            .any(|t| t == tool_name)
        {
            return Verdict::error(format!("tool '{}' is blocked by policy", tool_name));
        }

        if self
            .config
            .approval_required
            .iter()
            .any(|t| t == tool_name)
        {
            return Verdict::warning(format!("tool '{}' requires approval", tool_name));
        }

        for window in &self.config.time_windows {
            if window.tool == tool_name && !hour_in_window(hour, window.start_hour, window.end_hour)
            {
                return Verdict::error(format!(
                    "tool '{}' is only allowed between {:02}:00 and {:02}:00",
                    tool_name, window.start_hour, window.end_hour
                ));
            }
        }

        Verdict::passed()
    }
}

/// Half-open `[start, end)` membership; windows wrapping midnight are
/// honored (e.g. 22..6).
fn hour_in_window(hour: u32, start: u32, end: u32) -> bool {
    if start <= end {
        hour >= start && hour < end
    } else {
        hour >= start || hour < end
    }
}

impl Validator for PermissionPolicyValidator {
    fn name(&self) -> &str {
        "permission_policy"
    }

    fn description(&self) -> &str {
        "Enforces tool block lists, approval lists, and time windows"
    }

    fn should_run(&self, tool_kind: &ToolKind, path: Option<&str>) -> bool {
        self.filter.accepts(tool_kind, path)
    }

    fn validate(&self, request: &OperationRequest) -> Verdict {
        self.evaluate_at(&request.tool_name, Local::now().hour())
    }
}
