//! CLI command implementations.

pub mod check;
pub mod contracts;
pub mod generate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use openpid_codegen::GeneratorConfig;
use openpid_contracts::ContractRegistry;
use openpid_model::PeripheralDescription;

/// The built-in registry extended with every `--contracts` file, in order.
pub(crate) fn load_registry(extra: &[PathBuf]) -> Result<ContractRegistry> {
    let mut registry = ContractRegistry::embedded_hal_v1();
    for path in extra {
        let added = registry
            .extend_from_file(path)
            .with_context(|| format!("loading contracts from {}", path.display()))?;
        tracing::debug!(path = %path.display(), added, "loaded extra contracts");
    }
    Ok(registry)
}

pub(crate) fn load_config(path: Option<&Path>) -> Result<GeneratorConfig> {
    match path {
        Some(path) => GeneratorConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(GeneratorConfig::default()),
    }
}

pub(crate) fn load_description(path: &Path) -> Result<PeripheralDescription> {
    PeripheralDescription::load(path)
        .with_context(|| format!("loading description {}", path.display()))
}
