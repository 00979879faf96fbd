use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    DirectoryNotFound,

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

/// Process-wide policy for mapping a composite verdict to host-visible
/// effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnforcementMode {
    /// Invalid verdicts block the operation; warnings are surfaced.
    #[default]
    Blocking,
    /// Nothing blocks; findings are surfaced as messages.
    Warning,
    /// Nothing blocks and nothing is surfaced; decisions are only logged.
    Silent,
}

/// How to treat binary-looking content in whole-file writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BinaryAction {
    Block,
    #[default]
    Warn,
    Allow,
}

/// Top-level configuration snapshot, loaded once at orchestrator
/// construction and immutable afterwards. Every section and every
/// list-valued option has a built-in default so the pipeline is safe
/// with zero configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub enabled: bool,
    pub mode: EnforcementMode,
    pub log_file: Option<PathBuf>,
    pub file_validation: FileValidationConfig,
    pub security_validation: SecurityValidationConfig,
    pub pattern_validation: PatternValidationConfig,
    pub command_validation: CommandValidationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileValidationConfig {
    pub enabled: bool,
    pub path: PathSafetyConfig,
    pub content: ContentSafetyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSafetyConfig {
    /// Resolved paths under any of these directories are rejected.
    pub protected_dirs: Vec<PathBuf>,
    /// Filenames (or path suffixes) that must never be written.
    pub protected_files: Vec<String>,
    /// Warn when a path has more segments than this.
    pub max_depth: usize,
    /// Allow writes to hidden files/directories without a warning.
    pub allow_hidden: bool,
    /// Allow writes through symlinked targets.
    pub allow_symlinks: bool,
    /// Regexes restricting which paths this validator applies to
    /// (empty = all).
    pub path_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSafetyConfig {
    /// Maximum UTF-8 byte length for literal content.
    pub max_size_bytes: usize,
    /// What to do when content looks binary.
    pub binary_action: BinaryAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityValidationConfig {
    pub enabled: bool,
    pub scanner: SecretScanConfig,
    pub permissions: PermissionPolicyConfig,
}

/// One entry in the secret-pattern table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretPatternConfig {
    pub pattern: String,
    pub label: String,
    /// Severity tag: `low`, `medium`, `high`, or `critical`.
    pub severity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretScanConfig {
    /// Error (true) or warn (false) on secret-pattern matches.
    pub block_on_secrets: bool,
    /// Extra patterns appended to the built-in secret table.
    pub extra_patterns: Vec<SecretPatternConfig>,
    /// Substring-matched domain block-list for web operations.
    pub blocked_domains: Vec<String>,
    /// If non-empty, web operations outside this list are rejected.
    pub allowed_domains: Vec<String>,
}

/// Time window during which a tool may run. Hours are local,
/// half-open `[start_hour, end_hour)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeWindowPolicy {
    pub tool: String,
    pub start_hour: u32,
    pub end_hour: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PermissionPolicyConfig {
    pub blocked_tools: Vec<String>,
    pub approval_required: Vec<String>,
    pub time_windows: Vec<TimeWindowPolicy>,
}

/// A configurable convention rule checked against written content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomRuleConfig {
    pub pattern: String,
    pub message: String,
    /// `error`, `warning`, or `info`.
    pub severity: String,
    /// Extensions (without dot) this rule applies to; empty = all.
    #[serde(default)]
    pub applies_to: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternValidationConfig {
    pub enabled: bool,
    pub custom_rules: Vec<CustomRuleConfig>,
    pub path_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandValidationConfig {
    pub enabled: bool,
    /// Commands longer than this are rejected outright.
    pub max_length: usize,
    /// Base commands that are always rejected.
    pub blocked_commands: Vec<String>,
    /// If non-empty, base commands outside this list are rejected.
    pub allowed_commands: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: EnforcementMode::default(),
            log_file: None,
            file_validation: FileValidationConfig::default(),
            security_validation: SecurityValidationConfig::default(),
            pattern_validation: PatternValidationConfig::default(),
            command_validation: CommandValidationConfig::default(),
        }
    }
}

impl Default for FileValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathSafetyConfig::default(),
            content: ContentSafetyConfig::default(),
        }
    }
}

impl Default for PathSafetyConfig {
    fn default() -> Self {
        Self {
            protected_dirs: [
                "/etc", "/usr", "/bin", "/sbin", "/boot", "/sys", "/proc", "/dev",
                "/var", "/lib", "/lib64", ".git/objects", ".git/refs",
            ]
            .iter()
            .map(PathBuf::from)
            .collect(),
            protected_files: [
                ".env",
                ".env.local",
                ".env.production",
                "credentials.json",
                "id_rsa",
                "id_ed25519",
                "id_ecdsa",
                "id_dsa",
                ".git/config",
                ".git-credentials",
                ".netrc",
                ".aws/credentials",
                ".ssh/config",
                "authorized_keys",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            max_depth: 20,
            allow_hidden: false,
            allow_symlinks: false,
            path_patterns: Vec::new(),
        }
    }
}

impl Default for ContentSafetyConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 10 * 1024 * 1024,
            binary_action: BinaryAction::Warn,
        }
    }
}

impl Default for SecurityValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            scanner: SecretScanConfig::default(),
            permissions: PermissionPolicyConfig::default(),
        }
    }
}

impl Default for SecretScanConfig {
    fn default() -> Self {
        Self {
            block_on_secrets: true,
            extra_patterns: Vec::new(),
            blocked_domains: ["pastebin.com", "transfer.sh", "0x0.st"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allowed_domains: Vec::new(),
        }
    }
}

impl Default for PatternValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            custom_rules: Vec::new(),
            path_patterns: Vec::new(),
        }
    }
}

impl Default for CommandValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_length: 5000,
            blocked_commands: ["shutdown", "reboot", "halt", "poweroff", "mkfs", "fdisk"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allowed_commands: Vec::new(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::DirectoryNotFound)?;
        Ok(PathBuf::from(home).join(".config").join("preflight"))
    }

    /// Get the config file path, honoring the `PREFLIGHT_CONFIG` override.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var("PREFLIGHT_CONFIG") {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Create the default configuration (enabled, blocking mode).
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Load configuration from an explicit file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration, falling back to built-in defaults on any
    /// failure. A missing or broken config file must never abort the
    /// pipeline; the defaults are safe on their own.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(ConfigError::ReadError(_)) => Self::default_config(),
            Err(e) => {
                eprintln!("preflight: ignoring invalid config: {}", e);
                Self::default_config()
            }
        }
    }

    /// Save configuration to an explicit file path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        // Set permissions to 600 (owner read/write only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_dir()?.join("config.toml"))
    }

    /// Validate configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.file_validation.content.max_size_bytes == 0 {
            return Err(ConfigError::InvalidValue(
                "max_size_bytes must be greater than 0".to_string(),
            ));
        }

        if self.command_validation.max_length == 0 {
            return Err(ConfigError::InvalidValue(
                "max_length must be greater than 0".to_string(),
            ));
        }

        for window in &self.security_validation.permissions.time_windows {
            if window.start_hour > 23 || window.end_hour > 24 {
                return Err(ConfigError::InvalidValue(format!(
                    "time window for '{}' has out-of-range hours",
                    window.tool
                )));
            }
        }

        for rule in &self.pattern_validation.custom_rules {
            if regex::Regex::new(&rule.pattern).is_err() {
                return Err(ConfigError::InvalidValue(format!(
                    "custom rule pattern does not compile: {}",
                    rule.pattern
                )));
            }
        }

        for entry in &self.security_validation.scanner.extra_patterns {
            if regex::Regex::new(&entry.pattern).is_err() {
                return Err(ConfigError::InvalidValue(format!(
                    "secret pattern does not compile: {}",
                    entry.label
                )));
            }
        }

        Ok(())
    }
}
