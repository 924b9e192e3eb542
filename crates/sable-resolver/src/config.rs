//! Resolver configuration (sable.toml `[resolver]` table or a standalone file)

use crate::diagnostic::{ErrorCode, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Compiler-wide switches consulted by the resolver
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct ResolverConfig {
    /// Drop warnings and infos located in core-library sources
    pub suppress_core_warnings: bool,

    /// File-name suffixes that mark a compilation unit as part of the core library
    pub core_library_suffixes: Vec<String>,

    pub warnings: WarningConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            suppress_core_warnings: true,
            core_library_suffixes: vec!["core.sbl".to_string()],
            warnings: WarningConfig::default(),
        }
    }
}

impl ResolverConfig {
    /// Load a configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse a configuration from a string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: ResolverConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.core_library_suffixes.iter().any(|suffix| suffix.is_empty()) {
            return Err(ConfigError::ValidationError(
                "core-library-suffixes cannot contain an empty suffix".to_string(),
            ));
        }
        for name in self.warnings.disabled.iter().chain(&self.warnings.deny) {
            match ErrorCode::from_name(name) {
                None => {
                    return Err(ConfigError::ValidationError(format!("Unknown diagnostic: {}", name)));
                }
                Some(code) if code.severity() == Severity::Error => {
                    return Err(ConfigError::ValidationError(format!(
                        "{} is an error and cannot be configured as a warning",
                        name
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Whether `path` names a core-library compilation unit
    pub fn is_core_path(&self, path: &str) -> bool {
        self.core_library_suffixes.iter().any(|suffix| path.ends_with(suffix.as_str()))
    }
}

/// Per-warning switches, keyed by kebab-case name or `Exxxx` identifier
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WarningConfig {
    /// Suppressed warnings
    pub disabled: BTreeSet<String>,
    /// Warnings promoted to errors
    pub deny: BTreeSet<String>,
    /// When true, all warnings become errors
    pub strict: bool,
}

impl WarningConfig {
    /// Strict mode: all warnings are errors
    pub fn strict() -> Self {
        Self { strict: true, ..Self::default() }
    }

    pub fn is_enabled(&self, code: ErrorCode) -> bool {
        !self.disabled.contains(code.name()) && !self.disabled.contains(code.as_str())
    }

    pub fn is_denied(&self, code: ErrorCode) -> bool {
        self.strict || self.deny.contains(code.name()) || self.deny.contains(code.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::ResolverErrorCode;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert!(config.suppress_core_warnings);
        assert!(config.is_core_path("sdk/lib/core/core.sbl"));
        assert!(!config.is_core_path("app/main.sbl"));
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
suppress-core-warnings = false
core-library-suffixes = ["corelib.sbl", "core_impl.sbl"]

[warnings]
disabled = ["shadowed-local-variable"]
deny = ["E1107"]
"#;
        let config = ResolverConfig::from_str(toml).unwrap();
        assert!(!config.suppress_core_warnings);
        assert_eq!(config.core_library_suffixes, vec!["corelib.sbl".to_string(), "core_impl.sbl".to_string()]);

        let shadowed = ErrorCode::from(ResolverErrorCode::ShadowedLocalVariable);
        let hides = ErrorCode::from(ResolverErrorCode::TypeVariableShadowsType);
        assert!(!config.warnings.is_enabled(shadowed));
        assert!(config.warnings.is_enabled(hides));
        assert!(config.warnings.is_denied(hides));
        assert!(!config.warnings.is_denied(shadowed));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        assert_eq!(ResolverConfig::from_str("").unwrap(), ResolverConfig::default());
    }

    #[test]
    fn test_unknown_warning_rejected() {
        let err = ResolverConfig::from_str("[warnings]\ndisabled = [\"no-such-warning\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_error_code_cannot_be_disabled() {
        let err = ResolverConfig::from_str("[warnings]\ndisabled = [\"cyclic-class\"]\n").unwrap_err();
        assert!(err.to_string().contains("cyclic-class"));
    }

    #[test]
    fn test_strict_denies_everything() {
        let warnings = WarningConfig::strict();
        assert!(warnings.is_denied(ErrorCode::from(ResolverErrorCode::ShadowedLocalVariable)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sable.toml");
        std::fs::write(&path, "suppress-core-warnings = false\n").unwrap();
        let config = ResolverConfig::from_file(&path).unwrap();
        assert!(!config.suppress_core_warnings);

        let missing = ResolverConfig::from_file(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::IoError(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let err = ResolverConfig::from_str("suppress-core-warnings = ").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
