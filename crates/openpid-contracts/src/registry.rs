//! Versioned, ordered set of capability contracts.
//!
//! Registration order is significant: it fixes the order of match results,
//! report entries and trait units. A contract may only require contracts
//! registered before it, so the dependency graph is acyclic by construction.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;

use crate::builtin;
use crate::contract::{CapabilityContract, Intent, OutputKind, ScalarType};
use crate::error::{RegistryError, Result};

/// Version of the built-in contract set.
pub const EMBEDDED_HAL_V1_VERSION: semver::Version = semver::Version::new(1, 0, 0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractRegistry {
    version: semver::Version,
    contracts: Vec<CapabilityContract>,
}

/// On-disk form of a contract extension file.
#[derive(Debug, Deserialize)]
struct ContractFile {
    #[serde(default)]
    contracts: Vec<CapabilityContract>,
}

impl ContractRegistry {
    /// An empty registry.
    pub fn new(version: semver::Version) -> Self {
        Self {
            version,
            contracts: Vec::new(),
        }
    }

    /// The built-in embedded-hal 1.0 / embedded-hal-nb 1.0 contracts.
    pub fn embedded_hal_v1() -> Self {
        Self {
            version: EMBEDDED_HAL_V1_VERSION,
            contracts: builtin::embedded_hal_v1(),
        }
    }

    pub fn version(&self) -> &semver::Version {
        &self.version
    }

    pub fn contracts(&self) -> &[CapabilityContract] {
        &self.contracts
    }

    pub fn iter(&self) -> impl Iterator<Item = &CapabilityContract> {
        self.contracts.iter()
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CapabilityContract> {
        self.contracts.iter().find(|c| c.id == id)
    }

    /// Registration index of a contract.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.contracts.iter().position(|c| c.id == id)
    }

    /// Validate and append a contract.
    pub fn register(&mut self, contract: CapabilityContract) -> Result<()> {
        self.validate(&contract)?;
        tracing::debug!(contract = %contract.id, "registered capability contract");
        self.contracts.push(contract);
        Ok(())
    }

    fn validate(&self, contract: &CapabilityContract) -> Result<()> {
        if self.get(&contract.id).is_some() {
            return Err(RegistryError::DuplicateContract {
                id: contract.id.clone(),
            });
        }
        if contract.operations.is_empty() {
            return Err(RegistryError::EmptyContract {
                contract: contract.id.clone(),
            });
        }
        for dep in &contract.requires {
            if self.get(dep).is_none() {
                return Err(RegistryError::UnknownDependency {
                    contract: contract.id.clone(),
                    dependency: dep.clone(),
                });
            }
        }

        let mut names = BTreeSet::new();
        for op in &contract.operations {
            if !names.insert(op.name.as_str()) {
                return Err(RegistryError::DuplicateOperation {
                    contract: contract.id.clone(),
                    operation: op.name.clone(),
                });
            }
            let w = op.width;
            if w.min == 0 || w.min > w.max || w.max > 64 {
                return Err(RegistryError::InvalidWidth {
                    contract: contract.id.clone(),
                    operation: op.name.clone(),
                    min: w.min,
                    max: w.max,
                });
            }
            let blocks = op.guard.is_some() || op.intent == Intent::Poll;
            if blocks && op.output.kind != OutputKind::Nb {
                return Err(RegistryError::BlockingWithoutNb {
                    contract: contract.id.clone(),
                    operation: op.name.clone(),
                });
            }
            if op.intent == Intent::Store && op.argument.is_none() {
                return Err(RegistryError::MissingArgument {
                    contract: contract.id.clone(),
                    operation: op.name.clone(),
                });
            }
            let expected = match op.intent {
                Intent::TestAsserted | Intent::TestDeasserted if op.output.ty != ScalarType::Bool => {
                    Some("bool")
                }
                Intent::Load | Intent::Maximum if op.output.ty == ScalarType::Unit => {
                    Some("a value")
                }
                _ => None,
            };
            if let Some(expected) = expected {
                return Err(RegistryError::OutputMismatch {
                    contract: contract.id.clone(),
                    operation: op.name.clone(),
                    expected,
                });
            }
        }
        Ok(())
    }

    /// Register every contract of a TOML extension file, in file order.
    ///
    /// Returns the number of contracts added. Nothing is added if any
    /// contract in the file is rejected.
    pub fn extend_from_toml_str(&mut self, input: &str) -> Result<usize> {
        let file: ContractFile = toml::from_str(input)?;
        let mut staged = self.clone();
        for contract in file.contracts {
            staged.register(contract)?;
        }
        let added = staged.len() - self.len();
        *self = staged;
        Ok(added)
    }

    /// Load an extension file from disk.
    pub fn extend_from_file(&mut self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path)?;
        self.extend_from_toml_str(&content)
    }

    /// A registry restricted to `allow` and the contracts they require.
    ///
    /// Registration order and version are preserved.
    pub fn filtered(&self, allow: &[String]) -> Result<Self> {
        let mut keep: BTreeSet<&str> = BTreeSet::new();
        let mut pending: Vec<&str> = Vec::new();
        for id in allow {
            let contract = self
                .get(id)
                .ok_or_else(|| RegistryError::UnknownContract { id: id.clone() })?;
            pending.push(&contract.id);
        }
        while let Some(id) = pending.pop() {
            if keep.insert(id) {
                if let Some(contract) = self.get(id) {
                    pending.extend(contract.requires.iter().map(String::as_str));
                }
            }
        }

        Ok(Self {
            version: self.version.clone(),
            contracts: self
                .contracts
                .iter()
                .filter(|c| keep.contains(c.id.as_str()))
                .cloned()
                .collect(),
        })
    }
}

impl Default for ContractRegistry {
    fn default() -> Self {
        Self::embedded_hal_v1()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPI_CONTRACT: &str = r#"
[[contracts]]
id = "spi-enable"
capability = "spi"
trait-path = "crate::SpiEnable"
requires = ["digital-output"]

[[contracts.operations]]
name = "enable"
intent = "assert"
role = "spi_enable"
receiver = "ref-mut"
width = { min = 1, max = 1 }
"#;

    #[test]
    fn builtin_contracts_validate() {
        let builtin = ContractRegistry::embedded_hal_v1();
        let mut fresh = ContractRegistry::new(builtin.version().clone());
        for contract in builtin.iter() {
            fresh.register(contract.clone()).unwrap();
        }
        assert_eq!(fresh, builtin);
        assert_eq!(builtin.len(), 6);
        assert_eq!(builtin.position("stateful-output"), Some(1));
    }

    #[test]
    fn extend_from_toml() {
        let mut registry = ContractRegistry::embedded_hal_v1();
        let added = registry.extend_from_toml_str(SPI_CONTRACT).unwrap();
        assert_eq!(added, 1);
        let spi = registry.get("spi-enable").unwrap();
        assert_eq!(spi.operations[0].intent, Intent::Assert);
        assert!(spi.error_trait.is_none());
    }

    #[test]
    fn extension_is_all_or_nothing() {
        let mut registry = ContractRegistry::new(semver::Version::new(0, 1, 0));
        let err = registry.extend_from_toml_str(SPI_CONTRACT).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownDependency { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn rejects_duplicates_and_bad_widths() {
        let mut registry = ContractRegistry::embedded_hal_v1();
        let dup = registry.get("pwm").unwrap().clone();
        assert!(matches!(
            registry.register(dup.clone()),
            Err(RegistryError::DuplicateContract { .. })
        ));

        let mut bad = dup.clone();
        bad.id = "pwm-2".into();
        bad.operations[0].width.min = 0;
        assert!(matches!(
            registry.register(bad),
            Err(RegistryError::InvalidWidth { .. })
        ));

        let mut twice = dup.clone();
        twice.id = "pwm-3".into();
        twice.operations[1].name = twice.operations[0].name.clone();
        assert!(matches!(
            registry.register(twice),
            Err(RegistryError::DuplicateOperation { .. })
        ));

        let mut bare = dup.clone();
        bare.id = "pwm-4".into();
        bare.operations[1].argument = None;
        assert!(matches!(
            registry.register(bare),
            Err(RegistryError::MissingArgument { .. })
        ));

        let mut silent = dup;
        silent.id = "pwm-5".into();
        silent.operations[0].output.ty = ScalarType::Unit;
        assert!(matches!(
            registry.register(silent),
            Err(RegistryError::OutputMismatch { expected: "a value", .. })
        ));
    }

    #[test]
    fn filter_pulls_in_dependencies() {
        let registry = ContractRegistry::embedded_hal_v1();
        let filtered = registry
            .filtered(&["stateful-output".to_string(), "pwm".to_string()])
            .unwrap();
        let ids: Vec<&str> = filtered.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["digital-output", "stateful-output", "pwm"]);

        assert!(matches!(
            registry.filtered(&["spi".to_string()]),
            Err(RegistryError::UnknownContract { .. })
        ));
    }
}
