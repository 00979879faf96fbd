pub mod settings;

pub use settings::{
    BinaryAction, CommandValidationConfig, Config, ConfigError, ContentSafetyConfig,
    CustomRuleConfig, EnforcementMode, FileValidationConfig, PathSafetyConfig,
    PatternValidationConfig, PermissionPolicyConfig, SecretPatternConfig, SecretScanConfig,
    SecurityValidationConfig, TimeWindowPolicy,
};
