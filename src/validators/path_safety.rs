use crate::config::PathSafetyConfig;
use crate::request::{OperationRequest, ToolKind};
use crate::validators::{fail_open, Fault, Validator, ValidatorFilter};
use crate::verdict::Verdict;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Filesystem-path-level checks for file operations.
///
/// Checks run in a fixed order and short-circuit on the first violation:
/// traversal tokens, resolution, working-directory escape, protected
/// directories/files, depth, hidden segments, symlinks, and suspicious
/// filename characters.
pub struct PathSafetyValidator {
    config: PathSafetyConfig,
    filter: ValidatorFilter,
}

impl PathSafetyValidator {
    pub fn new(config: PathSafetyConfig) -> Self {
        let filter = ValidatorFilter::new(
            true,
            vec![
                ToolKind::FileWrite,
                ToolKind::FileEdit,
                ToolKind::MultiFileEdit,
            ],
            &config.path_patterns,
        );
        Self { config, filter }
    }

    fn check(&self, request: &OperationRequest) -> Result<Verdict, Fault> {
        let Some(raw_path) = request.file_path() else {
            // No path to check is trivially valid.
            return Ok(Verdict::passed());
        };
        if raw_path.is_empty() {
            return Ok(Verdict::passed());
        }

        // 1. Literal parent-directory traversal tokens.
        if raw_path.contains("../") || raw_path.contains("..\\") || raw_path == ".." {
            return Ok(Verdict::error(format!(
                "path traversal detected in '{}'",
                raw_path
            )));
        }

        // 2. Resolve to an absolute, symlink-normalized path.
        let was_relative = Path::new(raw_path).is_relative();
        let resolved = match resolve_path(&request.cwd, raw_path) {
            Some(p) => p,
            None => {
                return Ok(Verdict::error(format!(
                    "could not resolve path '{}'",
                    raw_path
                )));
            }
        };

        // 3. Relative paths must stay inside the working directory.
        if was_relative {
            let cwd = fs::canonicalize(&request.cwd).unwrap_or_else(|_| request.cwd.clone());
            if !resolved.starts_with(&cwd) {
                return Ok(Verdict::error(format!(
                    "path '{}' escapes working directory",
                    raw_path
                )));
            }
        }

        let resolved_str = resolved.to_string_lossy();

        // 4. Protected directories.
        for dir in &self.config.protected_dirs {
            if dir.is_absolute() {
                if resolved.starts_with(dir) {
                    return Ok(Verdict::error(format!(
                        "path is under protected directory '{}'",
                        dir.display()
                    )));
                }
            } else {
                let needle = format!("/{}/", dir.display());
                let tail = format!("/{}", dir.display());
                if resolved_str.contains(&needle) || resolved_str.ends_with(&tail) {
                    return Ok(Verdict::error(format!(
                        "path is under protected directory '{}'",
                        dir.display()
                    )));
                }
            }
        }

        // 5. Protected files.
        let file_name = resolved
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        for protected in &self.config.protected_files {
            let matched = if protected.contains('/') {
                resolved_str.ends_with(protected.as_str())
            } else {
                file_name == *protected
            };
            if matched {
                return Ok(Verdict::error(format!(
                    "'{}' is a protected file",
                    protected
                )));
            }
        }

        // 6. Depth limit.
        let depth = resolved
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .count();
        if depth > self.config.max_depth {
            return Ok(Verdict::warning(format!(
                "path depth {} exceeds maximum {}",
                depth, self.config.max_depth
            )));
        }

        // 7. Hidden segments.
        if !self.config.allow_hidden {
            let hidden = Path::new(raw_path).components().any(|c| match c {
                Component::Normal(seg) => {
                    let seg = seg.to_string_lossy();
                    seg.starts_with('.') && seg != "." && seg != ".."
                }
                _ => false,
            });
            if hidden {
                return Ok(Verdict::warning(format!(
                    "path '{}' touches a hidden file or directory",
                    raw_path
                )));
            }
        }

        // 8. Symlinked targets.
        if !self.config.allow_symlinks {
            let direct = request.cwd.join(raw_path);
            let link = fs::symlink_metadata(&direct)
                .map(|m| m.file_type().is_symlink())
                .unwrap_or(false);
            if link {
                return Ok(Verdict::error(format!(
                    "'{}' is a symlink and symlinked targets are not allowed",
                    raw_path
                )));
            }
        }

        // 9. Filenames a downstream shell could misinterpret.
        if let Some(reason) = suspicious_file_name(&file_name) {
            return Ok(Verdict::warning(format!(
                "file name '{}' {}",
                file_name, reason
            )));
        }

        Ok(Verdict::passed())
    }
}

/// Resolve a path to absolute form, normalizing `.` segments lexically and
/// symlinks through the nearest existing ancestor. Write targets usually
/// do not exist yet, so plain `canonicalize` is not enough.
fn resolve_path(cwd: &Path, raw: &str) -> Option<PathBuf> {
    let joined = if Path::new(raw).is_absolute() {
        PathBuf::from(raw)
    } else {
        cwd.join(raw)
    };

    let normalized = normalize_lexically(&joined);
    if !normalized.is_absolute() {
        return None;
    }

    // Canonicalize the deepest existing ancestor, then reattach the rest.
    let mut existing = normalized.clone();
    let mut remainder: Vec<std::ffi::OsString> = Vec::new();
    loop {
        if existing.exists() {
            break;
        }
        let name = existing.file_name()?.to_os_string();
        remainder.push(name);
        existing = existing.parent()?.to_path_buf();
    }

    let mut resolved = fs::canonicalize(&existing).ok()?;
    for part in remainder.iter().rev() {
        resolved.push(part);
    }
    Some(resolved)
}

/// Resolve `.` and `..` components without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if parts
                    .last()
                    .is_some_and(|c| matches!(c, Component::Normal(_)))
                {
                    parts.pop();
                } else if !matches!(parts.last(), Some(Component::RootDir)) {
                    parts.push(component);
                }
            }
            _ => parts.push(component),
        }
    }
    parts.iter().collect()
}

fn suspicious_file_name(name: &str) -> Option<&'static str> {
    if name.chars().any(|c| c.is_control()) {
        return Some("contains control characters");
    }
    if name.starts_with('-') {
        return Some("starts with a dash and could be read as a flag");
    }
    if name.contains("$(") || name.contains('`') {
        return Some("contains command substitution syntax");
    }
    const SHELL_META: &[char] = &[';', '|', '&', '<', '>', '$', '*', '?', '!', '~'];
    if name.chars().any(|c| SHELL_META.contains(&c)) {
        return Some("contains shell metacharacters");
    }
    None
}

impl Validator for PathSafetyValidator {
    fn name(&self) -> &str {
        "path_safety"
    }

    fn description(&self) -> &str {
        "Rejects traversal, protected locations, and misleading file paths"
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
    use crate::verdict::Severity;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn validator() -> PathSafetyValidator {
        PathSafetyValidator::new(PathSafetyConfig::default())
    }

    fn write_request(dir: &Path, path: &str) -> OperationRequest {
        OperationRequest::new(
            "Write",
            json!({"file_path": path, "content": ""}),
            dir.to_path_buf(),
        )
    }

    #[test]
    fn test_traversal_rejected() {
        let tmp = TempDir::new().unwrap();
        let req = write_request(tmp.path(), "../../etc/passwd");
        let verdict = validator().validate(&req);
        assert!(!verdict.is_valid);
        assert!(verdict.message.contains("traversal"));
    }

    #[test]
    fn test_backslash_traversal_rejected() {
        let tmp = TempDir::new().unwrap();
        let req = write_request(tmp.path(), "..\\..\\secrets");
        assert!(!validator().validate(&req).is_valid);
    }

    #[test]
    fn test_plain_relative_path_passes() {
        let tmp = TempDir::new().unwrap();
        let req = write_request(tmp.path(), "src/utils/helper.py");
        let verdict = validator().validate(&req);
        assert!(verdict.is_valid, "{}", verdict.message);
        assert!(verdict.is_clean());
    }

    #[test]
    fn test_protected_dir_rejected() {
        let tmp = TempDir::new().unwrap();
        let req = write_request(tmp.path(), "/etc/cron.d/task");
        let verdict = validator().validate(&req);
        assert!(!verdict.is_valid);
        assert!(verdict.message.contains("protected directory"));
    }

    #[test]
    fn test_protected_file_rejected() {
        let tmp = TempDir::new().unwrap();
        let req = write_request(tmp.path(), "config/.env");
        let verdict = validator().validate(&req);
        assert!(!verdict.is_valid);
        assert!(verdict.message.contains("protected file"));
    }

    #[test]
    fn test_ssh_key_suffix_rejected() {
        let tmp = TempDir::new().unwrap();
        let home_like = tmp.path().join("keys");
        std::fs::create_dir_all(&home_like).unwrap();
        let req = write_request(tmp.path(), "keys/id_rsa");
        assert!(!validator().validate(&req).is_valid);
    }

    #[test]
    fn test_depth_warning() {
        let tmp = TempDir::new().unwrap();
        let deep = (0..25).map(|i| format!("d{}", i)).collect::<Vec<_>>().join("/");
        let req = write_request(tmp.path(), &format!("{}/file.txt", deep));
        let verdict = validator().validate(&req);
        assert!(verdict.is_valid);
        assert_eq!(verdict.severity, Severity::Warning);
        assert!(verdict.message.contains("depth"));
    }

    #[test]
    fn test_hidden_file_warns_by_default() {
        let tmp = TempDir::new().unwrap();
        let req = write_request(tmp.path(), ".hidden/notes.txt");
        let verdict = validator().validate(&req);
        assert!(verdict.is_valid);
        assert_eq!(verdict.severity, Severity::Warning);
    }

    #[test]
    fn test_hidden_file_allowed_by_config() {
        let tmp = TempDir::new().unwrap();
        let config = PathSafetyConfig {
            allow_hidden: true,
            ..PathSafetyConfig::default()
        };
        let req = write_request(tmp.path(), ".hidden/notes.txt");
        let verdict = PathSafetyValidator::new(config).validate(&req);
        assert!(verdict.is_clean(), "{}", verdict.message);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_rejected() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("real.txt");
        std::fs::write(&target, "x").unwrap();
        std::os::unix::fs::symlink(&target, tmp.path().join("link.txt")).unwrap();

        let req = write_request(tmp.path(), "link.txt");
        let verdict = validator().validate(&req);
        assert!(!verdict.is_valid);
        assert!(verdict.message.contains("symlink"));
    }

    #[test]
    fn test_leading_dash_filename_warns() {
        let tmp = TempDir::new().unwrap();
        let req = write_request(tmp.path(), "-rf.txt");
        let verdict = validator().validate(&req);
        assert!(verdict.is_valid);
        assert_eq!(verdict.severity, Severity::Warning);
    }

    #[test]
    fn test_command_substitution_filename_warns() {
        let tmp = TempDir::new().unwrap();
        let req = write_request(tmp.path(), "out$(whoami).txt");
        let verdict = validator().validate(&req);
        assert_eq!(verdict.severity, Severity::Warning);
    }

    #[test]
    fn test_empty_path_trivially_valid() {
        let req = OperationRequest::new(
            "Write",
            json!({"file_path": "", "content": "x"}),
            PathBuf::from("/tmp"),
        );
        assert!(validator().validate(&req).is_clean());
    }

    #[test]
    fn test_should_run_only_for_file_operations() {
        let v = validator();
        assert!(v.should_run(&ToolKind::FileWrite, Some("a.txt")));
        assert!(v.should_run(&ToolKind::MultiFileEdit, Some("a.txt")));
        assert!(!v.should_run(&ToolKind::ShellCommand, None));
        assert!(!v.should_run(&ToolKind::WebFetch, None));
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/a/b/./c")),
            PathBuf::from("/a/b/c")
        );
        assert_eq!(
            normalize_lexically(Path::new("/a/b/../c")),
            PathBuf::from("/a/c")
        );
        // ".." at the root cannot climb higher
        assert_eq!(normalize_lexically(Path::new("/../a")), PathBuf::from("/a"));
    }
}
