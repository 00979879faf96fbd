use crate::config::CommandValidationConfig;
use crate::request::{OperationRequest, ToolKind};
use crate::validators::{fail_open, Fault, Validator, ValidatorFilter};
use crate::verdict::Verdict;

/// Shell-command-specific checks: length, syntax, allow/block lists,
/// destructive patterns, common-mistake tips, and alternative-tool
/// suggestions.
///
/// Priority: any error from the first four steps returns immediately;
/// otherwise a mistake warning; otherwise one info suggestion; otherwise
/// a clean pass.
pub struct CommandSafetyValidator {
    config: CommandValidationConfig,
    filter: ValidatorFilter,
}

impl CommandSafetyValidator {
    pub fn new(config: CommandValidationConfig) -> Self {
        let filter = ValidatorFilter::new(true, vec![ToolKind::ShellCommand], &[]);
        Self { config, filter }
    }

    fn check(&self, request: &OperationRequest) -> Result<Verdict, Fault> {
        let Some(command) = request.command() else {
            return Ok(Verdict::passed());
        };
        let command = command.trim();
        if command.is_empty() {
            return Ok(Verdict::passed());
        }

        // 1. Length limit.
        if command.len() > self.config.max_length {
            return Ok(Verdict::error(format!(
                "command length {} exceeds maximum {}",
                command.len(),
                self.config.max_length
            )));
        }

        // 2. Shell-style tokenization.
        let tokens = match tokenize(command) {
            Ok(tokens) if !tokens.is_empty() => tokens,
            _ => return Ok(Verdict::error("invalid command syntax")),
        };

        // 3. Allow/block lists on the base command.
        let base = base_command(&tokens);
        if self.config.blocked_commands.iter().any(|c| c == &base) {
            return Ok(Verdict::error(format!("command '{}' is blocked", base)));
        }
        if !self.config.allowed_commands.is_empty()
            && !self.config.allowed_commands.iter().any(|c| c == &base)
        {
            return Ok(Verdict::error(format!(
                "command '{}' is not in the allowed list",
                base
            )));
        }

        // 4. Destructive patterns.
        if let Some(verdict) = destructive_check(command, &tokens, &base) {
            return Ok(verdict);
        }

        // 5. Common-mistake tips (never block).
        if let Some(tip) = mistake_tip(command, &base) {
            return Ok(Verdict::warning(tip));
        }

        // 6. One alternative-tool suggestion at most.
        if let Some(suggestion) = tool_suggestion(command, &base) {
            return Ok(Verdict::info(suggestion));
        }

        Ok(Verdict::passed())
    }
}

/// Shell-style tokenization honoring single quotes, double quotes, and
/// backslash escapes. An unterminated quote is a syntax error.
fn tokenize(command: &str) -> Result<Vec<String>, ()> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = command.chars().peekable();
    let mut in_token = false;

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => current.push(ch),
                        None => return Err(()),
                    }
                }
            }
            '"' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => {
                            if let Some(escaped) = chars.next() {
                                current.push(escaped);
                            } else {
                                return Err(());
                            }
                        }
                        Some(ch) => current.push(ch),
                        None => return Err(()),
                    }
                }
            }
            '\\' => {
                in_token = true;
                match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => return Err(()),
                }
            }
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                in_token = true;
                current.push(c);
            }
        }
    }

    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// First token that is neither an environment assignment nor `sudo`.
fn base_command(tokens: &[String]) -> String {
    let mut iter = tokens.iter().peekable();
    while let Some(token) = iter.next() {
        if is_env_assignment(token) {
            continue;
        }
        if token == "sudo" {
            // Policy applies to what sudo runs, with sudo's own flags skipped.
            for next in iter.by_ref() {
                if !next.starts_with('-') && !is_env_assignment(next) {
                    return next.clone();
                }
            }
            return "sudo".to_string();
        }
        return token.clone();
    }
    String::new()
}

fn is_env_assignment(token: &str) -> bool {
    match token.split_once('=') {
        Some((name, _)) => {
            !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

/// Destructive-pattern detection with more nuance than the raw regex scan:
/// rm/rmdir force-recursive against root or home, fork bombs, device
/// writes, and permission blowouts.
fn destructive_check(command: &str, tokens: &[String], base: &str) -> Option<Verdict> {
    if (base == "rm" || base == "rmdir") && rm_targets_root_or_home(tokens) {
        return Some(Verdict::error(
            "recursive deletion on root or home directory",
        ));
    }

    if command.contains(":(){") || command.contains(":|:&") {
        return Some(Verdict::error("fork bomb signature"));
    }

    if base == "dd" && tokens.iter().any(|t| t.starts_with("of=/dev/")) {
        return Some(Verdict::error("dd writing directly to a device"));
    }

    let pipes_download_to_shell = (command.contains("curl") || command.contains("wget"))
        && command
            .split('|')
            .skip(1)
            .any(|seg| {
                let seg = seg.trim();
                ["sh", "bash", "zsh", "dash"]
                    .iter()
                    .any(|shell| seg == *shell || seg.starts_with(&format!("{} ", shell)))
            });
    if pipes_download_to_shell {
        return Some(Verdict::error("remote download piped into a shell"));
    }

    if tokens.iter().any(|t| t == "eval") && (command.contains("$(") || command.contains('`')) {
        return Some(Verdict::error("eval with command substitution"));
    }

    if command.contains("> /dev/sd")
        || command.contains(">/dev/sd")
        || command.contains("> /dev/nvme")
        || command.contains(">/dev/nvme")
    {
        return Some(Verdict::error("redirect to a raw disk device"));
    }

    if base == "chmod" && tokens.iter().any(|t| t == "777" || t == "666") {
        return Some(Verdict::warning(
            "world-writable permission change; consider a narrower mode",
        ));
    }

    None
}

fn rm_targets_root_or_home(tokens: &[String]) -> bool {
    let mut recursive = false;
    let mut force = false;
    let mut dangerous_target = false;

    for token in &tokens[1..] {
        if let Some(flags) = token.strip_prefix('-') {
            if token == "--recursive" {
                recursive = true;
            } else if token == "--force" {
                force = true;
            } else if !token.starts_with("--") {
                recursive |= flags.contains('r') || flags.contains('R');
                force |= flags.contains('f');
            }
        } else {
            dangerous_target |= matches!(
                token.as_str(),
                "/" | "/*" | "~" | "~/" | "$HOME" | "$HOME/" | "/home"
            );
        }
    }

    recursive && force && dangerous_target
}

/// Non-blocking tips for commonly mis-issued commands.
fn mistake_tip(command: &str, base: &str) -> Option<String> {
    if base == "git" {
        let force_push = command.contains("push")
            && (command.contains("--force") || command.contains(" -f"));
        if force_push && (command.contains("main") || command.contains("master")) {
            return Some(
                "force push to a protected branch; --force-with-lease is safer".to_string(),
            );
        }

        if command.contains("reset --hard")
            && !command
                .split("reset --hard")
                .nth(1)
                .is_some_and(|rest| !rest.trim().is_empty())
        {
            return Some(
                "hard reset without a target commit discards uncommitted work".to_string(),
            );
        }
    }

    if base == "find"
        && command.contains("| xargs")
        && !command.contains("-print0")
        && !command.contains("xargs -0")
    {
        return Some(
            "find piped to xargs without -print0/-0 breaks on spaces in names".to_string(),
        );
    }

    if base == "grep" && !command.contains("-F") && fixed_string_pattern(command) {
        return Some("pattern has no regex syntax; grep -F is faster".to_string());
    }

    None
}

/// True when the first non-flag grep argument contains no regex
/// metacharacters.
fn fixed_string_pattern(command: &str) -> bool {
    let pattern = command
        .split_whitespace()
        .skip(1)
        .find(|t| !t.starts_with('-'));
    match pattern {
        Some(p) => {
            let p = p.trim_matches(|c| c == '\'' || c == '"');
            !p.is_empty()
                && !p
                    .chars()
                    .any(|c| ['.', '*', '[', ']', '^', '$', '\\', '+', '?', '(', ')', '|'].contains(&c))
        }
        None => false,
    }
}

/// Alternative-tool table: at most one suggestion per command, advisory
/// only.
fn tool_suggestion(command: &str, base: &str) -> Option<String> {
    if command.contains("| grep") {
        return Some(
            "consider a direct pattern match with rg instead of piping through grep".to_string(),
        );
    }
    if base == "grep" && command.contains("-r") {
        return Some("rg searches recursively by default and is faster".to_string());
    }
    if base == "find" && command.contains("-name") {
        return Some("fd offers simpler name matching than find -name".to_string());
    }
    None
}

impl Validator for CommandSafetyValidator {
    fn name(&self) -> &str {
        "command_safety"
    }

    fn description(&self) -> &str {
        "Blocks destructive shell commands and suggests safer alternatives"
    }

    fn should_run(&self, tool_kind: &ToolKind, path: Option<&str>) -> bool {
        self.filter.accepts(tool_kind, path)
    }

    fn validate(&self, request: &OperationRequest) -> Verdict {
        fail_open(self.check(request))
    }
}
