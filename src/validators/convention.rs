use crate::config::{CustomRuleConfig, PatternValidationConfig};
use crate::request::{OperationRequest, ToolKind};
use crate::validators::{fail_open, Fault, Validator, ValidatorFilter};
use crate::verdict::Verdict;
use crate::verdict::Severity;
use regex::Regex;
use std::path::Path;

const MAX_REPORTED_FINDINGS: usize = 3;

/// A compiled custom convention rule.
struct CustomRule {
    regex: Regex,
    message: String,
    severity: Severity,
    applies_to: Vec<String>,
}

/// Naming and structural convention checks for written files.
///
/// Informational by design: everything here is a warning unless a custom
/// rule is explicitly configured with error severity.
pub struct ConventionValidator {
    custom_rules: Vec<CustomRule>,
    filter: ValidatorFilter,
}

impl ConventionValidator {
    pub fn new(config: PatternValidationConfig) -> Self {
        let custom_rules = config
            .custom_rules
            .iter()
            .filter_map(compile_rule)
            .collect();

        let filter = ValidatorFilter::new(
            true,
            vec![
                ToolKind::FileWrite,
                ToolKind::FileEdit,
                ToolKind::MultiFileEdit,
            ],
            &config.path_patterns,
        );

        Self {
            custom_rules,
            filter,
        }
    }

    fn check(&self, request: &OperationRequest) -> Result<Verdict, Fault> {
        let Some(path) = request.file_path() else {
            return Ok(Verdict::passed());
        };
        let extension = Path::new(path)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let content = request.written_text().join("\n");

        // Custom rules short-circuit with their configured severity.
        for rule in &self.custom_rules {
            let applies =
                rule.applies_to.is_empty() || rule.applies_to.iter().any(|e| *e == extension);
            if applies && rule.regex.is_match(&content) {
                return Ok(match rule.severity {
                    Severity::Error => Verdict::error(rule.message.clone()),
                    Severity::Warning => Verdict::warning(rule.message.clone()),
                    Severity::Info => Verdict::info(rule.message.clone()),
                });
            }
        }

        let mut findings: Vec<String> = Vec::new();

        if let Some(note) = naming_finding(path, &extension) {
            findings.push(note);
        }
        findings.extend(structure_findings(&content, &extension));

        if findings.is_empty() {
            return Ok(Verdict::passed());
        }

        findings.truncate(MAX_REPORTED_FINDINGS);
        Ok(Verdict::warning(findings.join("; ")))
    }
}

fn compile_rule(config: &CustomRuleConfig) -> Option<CustomRule> {
    let severity = match config.severity.as_str() {
        "error" => Severity::Error,
        "info" => Severity::Info,
        _ => Severity::Warning,
    };
    Regex::new(&config.pattern).ok().map(|regex| CustomRule {
        regex,
        message: config.message.clone(),
        severity,
        applies_to: config.applies_to.clone(),
    })
}

/// Filename-stem convention per extension family: snake_case for Python,
/// Rust, and Go; camelCase or kebab-case for JavaScript/TypeScript;
/// PascalCase for component files.
fn naming_finding(path: &str, extension: &str) -> Option<String> {
    let stem = Path::new(path).file_stem()?.to_string_lossy();

    let conventional = match extension {
        "py" | "rs" | "go" => is_snake_case(&stem),
        "js" | "ts" | "mjs" => is_camel_case(&stem) || is_kebab_case(&stem),
        "jsx" | "tsx" => is_pascal_case(&stem),
        _ => return None,
    };

    if conventional {
        None
    } else {
        Some(format!(
            "file name '{}' does not follow the .{} naming convention",
            stem, extension
        ))
    }
}

fn is_snake_case(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn is_camel_case(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_lowercase())
        && s.chars().all(|c| c.is_ascii_alphanumeric())
}

fn is_kebab_case(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn is_pascal_case(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && s.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Extension-specific content smells. Each returns at most one finding so
/// a noisy file does not flood the report.
fn structure_findings(content: &str, extension: &str) -> Vec<String> {
    let mut findings = Vec::new();
    if content.is_empty() {
        return findings;
    }

    match extension {
        "py" => {
            if content.contains("pdb.set_trace()") || content.contains("breakpoint()") {
                findings.push("debugger call left in code".to_string());
            }
            if content.lines().any(|l| l.trim() == "except:") {
                findings.push("bare except swallows all errors".to_string());
            }
            if imports_after_code(content, &["import ", "from "]) {
                findings.push("imports interleaved with code".to_string());
            }
        }
        "js" | "ts" | "jsx" | "tsx" | "mjs" => {
            if content.contains("console.log(") || content.contains("debugger;") {
                findings.push("debug statement left in code".to_string());
            }
            if loose_equality(content) {
                findings.push("loose equality operator; prefer === / !==".to_string());
            }
        }
        "rs" => {
            if content.contains("dbg!(") {
                findings.push("dbg! macro left in code".to_string());
            }
            if content.contains(".unwrap()") {
                findings.push("unwrap() may panic; consider propagating the error".to_string());
            }
            if undocumented_pub(content) {
                findings.push("public item without a doc comment".to_string());
            }
        }
        _ => {}
    }

    if has_unreferenced_todo(content) {
        findings.push("TODO without an issue reference".to_string());
    }

    findings
}

fn loose_equality(content: &str) -> bool {
    for line in content.lines() {
        let mut rest = line;
        while let Some(idx) = rest.find("==") {
            let before = rest[..idx].chars().last();
            let after = rest[idx + 2..].chars().next();
            // Skip ===, !==, <=, >=, and == inside a longer chain.
            let strict = after == Some('=') || before == Some('=') || before == Some('!');
            if !strict {
                return true;
            }
            rest = &rest[idx + 2..];
        }
    }
    false
}

fn undocumented_pub(content: &str) -> bool {
    let lines: Vec<&str> = content.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("pub fn ")
            || trimmed.starts_with("pub struct ")
            || trimmed.starts_with("pub enum ")
        {
            let documented = i > 0
                && {
                    let prev = lines[i - 1].trim_start();
                    prev.starts_with("///") || prev.starts_with("#[")
                };
            if !documented {
                return true;
            }
        }
    }
    false
}

fn has_unreferenced_todo(content: &str) -> bool {
    for line in content.lines() {
        if let Some(idx) = line.find("TODO") {
            let rest = &line[idx + 4..];
            // TODO(name) or TODO: #123 count as referenced.
            let referenced = rest.starts_with('(') || rest.contains('#');
            if !referenced {
                return true;
            }
        }
    }
    false
}

fn imports_after_code(content: &str, import_prefixes: &[&str]) -> bool {
    let mut seen_code = false;
    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("\"\"\"") {
            continue;
        }
        let is_import = import_prefixes.iter().any(|p| trimmed.starts_with(p));
        if is_import {
            if seen_code {
                return true;
            }
        } else {
            seen_code = true;
        }
    }
    false
}

impl Validator for ConventionValidator {
    fn name(&self) -> &str {
        "convention"
    }

    fn description(&self) -> &str {
        "Checks naming and style conventions; informational by design"
    }

    fn should_run(&self, tool_kind: &ToolKind, path: Option<&str>) -> bool {
        self.filter.accepts(tool_kind, path)
    }

    fn validate(&self, request: &OperationRequest) -> Verdict {
        fail_open(self.check(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn validator() -> ConventionValidator {
        ConventionValidator::new(PatternValidationConfig::default())
    }

    fn write(path: &str, content: &str) -> OperationRequest {
        OperationRequest::new(
            "Write",
            json!({"file_path": path, "content": content}),
            PathBuf::from("/tmp"),
        )
    }

    #[test]
    fn test_conventional_python_file_passes() {
        let verdict = validator().validate(&write(
            "src/utils/helper.py",
            "import os\n\ndef run():\n    return os.getcwd()\n",
        ));
        assert!(verdict.is_clean(), "{}", verdict.message);
    }

    #[test]
    fn test_python_camel_case_name_warns() {
        let verdict = validator().validate(&write("src/MyHelper.py", "x = 1\n"));
        assert!(verdict.is_valid);
        assert_eq!(verdict.severity, Severity::Warning);
        assert!(verdict.message.contains("naming convention"));
    }

    #[test]
    fn test_component_pascal_case_accepted() {
        let verdict = validator().validate(&write(
            "src/components/UserCard.tsx",
            "export function UserCard() { return null; }\n",
        ));
        assert!(verdict.is_clean(), "{}", verdict.message);
    }

    #[test]
    fn test_js_loose_equality_warns() {
        let verdict = validator().validate(&write(
            "src/app.js",
            "if (a == b) { doThing(); }\n",
        ));
        assert_eq!(verdict.severity, Severity::Warning);
        assert!(verdict.message.contains("loose equality"));
    }

    #[test]
    fn test_js_strict_equality_passes() {
        let verdict = validator().validate(&write("src/app.js", "if (a === b) { go(); }\n"));
        assert!(verdict.is_clean(), "{}", verdict.message);
    }

    #[test]
    fn test_debugger_residue_warns() {
        let verdict = validator().validate(&write(
            "scripts/run.py",
            "import pdb\npdb.set_trace()\n",
        ));
        assert_eq!(verdict.severity, Severity::Warning);
    }

    #[test]
    fn test_rust_unwrap_warns() {
        let verdict = validator().validate(&write(
            "src/io_helpers.rs",
            "fn read() -> String { std::fs::read_to_string(\"x\").unwrap() }\n",
        ));
        assert_eq!(verdict.severity, Severity::Warning);
        assert!(verdict.message.contains("unwrap"));
    }

    #[test]
    fn test_todo_without_reference_warns() {
        let verdict = validator().validate(&write("src/lib.rs", "// TODO fix this later\n"));
        assert_eq!(verdict.severity, Severity::Warning);
    }

    #[test]
    fn test_todo_with_issue_reference_passes() {
        let verdict =
            validator().validate(&write("src/lib.rs", "// TODO(#482): remove after migration\n"));
        assert!(verdict.is_clean(), "{}", verdict.message);
    }

    #[test]
    fn test_imports_after_code_warns() {
        let verdict = validator().validate(&write(
            "tool.py",
            "x = compute()\nimport json\n",
        ));
        assert_eq!(verdict.severity, Severity::Warning);
        assert!(verdict.message.contains("interleaved"));
    }

    #[test]
    fn test_findings_capped() {
        let content = "pdb.set_trace()\nexcept:\nimport late\n# TODO later\n";
        let noisy = format!("x = 1\n{}", content);
        let verdict = validator().validate(&write("messy.py", &noisy));
        assert!(verdict.message.matches(';').count() < MAX_REPORTED_FINDINGS);
    }

    #[test]
    fn test_custom_rule_error_severity() {
        let config = PatternValidationConfig {
            custom_rules: vec![CustomRuleConfig {
                pattern: r"unsafe\s*\{".to_string(),
                message: "unsafe blocks are not allowed here".to_string(),
                severity: "error".to_string(),
                applies_to: vec!["rs".to_string()],
            }],
            ..PatternValidationConfig::default()
        };
        let v = ConventionValidator::new(config);
        let verdict = v.validate(&write("src/ffi.rs", "unsafe { ptr.read() }\n"));
        assert!(!verdict.is_valid);
        assert!(verdict.message.contains("unsafe blocks"));
    }

    #[test]
    fn test_custom_rule_extension_filter() {
        let config = PatternValidationConfig {
            custom_rules: vec![CustomRuleConfig {
                pattern: "forbidden".to_string(),
                message: "nope".to_string(),
                severity: "error".to_string(),
                applies_to: vec!["py".to_string()],
            }],
            ..PatternValidationConfig::default()
        };
        let v = ConventionValidator::new(config);
        // Rule only applies to .py files
        assert!(v.validate(&write("a.md", "forbidden")).is_valid);
        assert!(!v.validate(&write("a.py", "forbidden")).is_valid);
    }

    #[test]
    fn test_unknown_extension_skips_naming() {
        let verdict = validator().validate(&write("Notes And Things.md", "hello\n"));
        assert!(verdict.is_clean(), "{}", verdict.message);
    }

    #[test]
    fn test_case_predicates() {
        assert!(is_snake_case("my_module"));
        assert!(!is_snake_case("MyModule"));
        assert!(is_camel_case("useThing"));
        assert!(is_kebab_case("use-thing"));
        assert!(is_pascal_case("UserCard"));
        assert!(!is_pascal_case("userCard"));
    }
}
