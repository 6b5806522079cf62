//! Generator configuration (`openpid-hal.toml`).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Knobs for one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GeneratorConfig {
    /// Restrict matching to these contract ids (and what they require).
    pub contracts: Option<Vec<String>>,
    /// Emit per-field getters and setters in raw accessor units.
    pub field_accessors: bool,
    /// Override the generated handle type name.
    pub struct_name: Option<String>,
    /// Associated `Error` type of every `ErrorType` implementation.
    pub error_type: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            contracts: None,
            field_accessors: true,
            struct_name: None,
            error_type: "core::convert::Infallible".to_string(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reject names that would not compile in the generated code.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = &self.struct_name {
            let mut chars = name.chars();
            let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(ConfigError::InvalidStructName { name: name.clone() });
            }
        }
        let ty = self.error_type.trim();
        if ty.is_empty()
            || !ty
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '<' | '>' | ' ' | ','))
        {
            return Err(ConfigError::InvalidErrorType {
                ty: self.error_type.clone(),
            });
        }
        Ok(())
    }
}
