//! Emission report: what matched, what did not, and how each register is reached.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use openpid_contracts::{ContractRegistry, MatchSet, MatchStatus, UnmetRequirement};
use openpid_model::PeripheralModel;

use crate::emit::{byte_sink, EmissionUnit, UnitKind};
use crate::error::PlanError;
use crate::plan::{AccessPlan, AccessStrategy, Reach, ReadDiscipline};

/// Outcome of one capability contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityEntry {
    pub contract: String,
    pub trait_path: String,
    pub status: MatchStatus,
    pub hinted: bool,
    /// `operation -> REGISTER.FIELD` for every bound operation.
    pub bindings: Vec<String>,
    pub unmet: Vec<UnmetRequirement>,
}

/// Access decisions for one register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterEntry {
    pub name: String,
    pub offset: u64,
    pub strategy: AccessStrategy,
    pub read: ReadDiscipline,
    pub reached_via: Reach,
    pub serialization_required: bool,
    pub sharers: Vec<String>,
    pub caveats: Vec<String>,
}

/// A described payload and the contract its writer sends through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayloadEntry {
    pub name: String,
    pub bytes: u32,
    /// `None` when no Full match can write bytes and no writer was emitted.
    pub written_via: Option<String>,
}

/// Number of emitted units per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UnitCounts {
    pub peripheral: usize,
    pub trait_impls: usize,
    pub raw_accessors: usize,
    pub payload_writers: usize,
}

impl UnitCounts {
    pub fn total(&self) -> usize {
        self.peripheral + self.trait_impls + self.raw_accessors + self.payload_writers
    }
}

/// Summary of one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmissionReport {
    pub peripheral: String,
    pub registry_version: String,
    pub hints: Vec<String>,
    pub capabilities: Vec<CapabilityEntry>,
    pub registers: Vec<RegisterEntry>,
    pub payloads: Vec<PayloadEntry>,
    /// Planner errors that demoted a match.
    pub plan_errors: Vec<PlanError>,
    pub units: UnitCounts,
    /// `sha256:` digest of the emitted units.
    pub fingerprint: String,
}

impl EmissionReport {
    pub fn build(
        model: &PeripheralModel,
        registry: &ContractRegistry,
        matches: &MatchSet,
        plan: &AccessPlan,
        units: &[EmissionUnit],
    ) -> Self {
        let capabilities = matches
            .iter()
            .map(|result| CapabilityEntry {
                contract: result.contract.clone(),
                trait_path: result.trait_path.clone(),
                status: result.status,
                hinted: result.hinted,
                bindings: result
                    .bindings
                    .iter()
                    .map(|b| format!("{} -> {}", b.operation, model.field_path(b.field)))
                    .collect(),
                unmet: result.unmet.clone(),
            })
            .collect();

        let registers = plan
            .registers
            .iter()
            .map(|p| RegisterEntry {
                name: p.name.clone(),
                offset: model.register(p.register).map_or(0, |r| r.offset),
                strategy: p.strategy,
                read: p.read,
                reached_via: p.reached_via,
                serialization_required: p.requires_serialization(),
                sharers: p.sharers().to_vec(),
                caveats: p.caveats.clone(),
            })
            .collect();

        let sink = byte_sink(registry, matches).map(|sink| sink.contract.id.clone());
        let payloads = model
            .payloads
            .iter()
            .map(|p| PayloadEntry {
                name: p.name.clone(),
                bytes: p.bytes(),
                written_via: sink.clone(),
            })
            .collect();

        let mut counts = UnitCounts::default();
        for unit in units {
            match unit.kind {
                UnitKind::Peripheral => counts.peripheral += 1,
                UnitKind::TraitImpl => counts.trait_impls += 1,
                UnitKind::RawAccessor => counts.raw_accessors += 1,
                UnitKind::PayloadWriter => counts.payload_writers += 1,
            }
        }

        Self {
            peripheral: model.name.clone(),
            registry_version: registry.version().to_string(),
            hints: model.hints.clone(),
            capabilities,
            registers,
            payloads,
            plan_errors: plan.errors.clone(),
            units: counts,
            fingerprint: fingerprint(units),
        }
    }

    pub fn capability(&self, contract: &str) -> Option<&CapabilityEntry> {
        self.capabilities.iter().find(|c| c.contract == contract)
    }

    pub fn register(&self, name: &str) -> Option<&RegisterEntry> {
        self.registers.iter().find(|r| r.name == name)
    }

    /// Contracts that produced a trait implementation.
    pub fn implemented(&self) -> impl Iterator<Item = &CapabilityEntry> {
        self.capabilities
            .iter()
            .filter(|c| c.status == MatchStatus::Full)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// SHA-256 over the serialized unit sequence, as `sha256:<hex>`.
pub fn fingerprint(units: &[EmissionUnit]) -> String {
    let json = serde_json::to_vec(units).unwrap_or_default();
    let digest = Sha256::digest(&json);
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("sha256:{hex}")
}

impl fmt::Display for EmissionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Emission Report ===")?;
        writeln!(f, "Peripheral: {}", self.peripheral)?;
        writeln!(f, "Contract registry: v{}", self.registry_version)?;
        if self.hints.is_empty() {
            writeln!(f, "Hints: (none)")?;
        } else {
            writeln!(f, "Hints: {}", self.hints.join(", "))?;
        }
        writeln!(f, "Fingerprint: {}", self.fingerprint)?;

        writeln!(f)?;
        writeln!(f, "--- Capabilities ---")?;
        for cap in &self.capabilities {
            let hinted = if cap.hinted { " [hinted]" } else { "" };
            writeln!(
                f,
                "  {} ({}): {}{hinted}",
                cap.contract, cap.trait_path, cap.status
            )?;
            for binding in &cap.bindings {
                writeln!(f, "    {binding}")?;
            }
            for unmet in &cap.unmet {
                writeln!(f, "    unmet: {unmet}")?;
            }
        }

        writeln!(f)?;
        writeln!(f, "--- Registers ---")?;
        for reg in &self.registers {
            writeln!(
                f,
                "  {} @ {:#x}: {}, {} reads, via {}",
                reg.name,
                reg.offset,
                reg.strategy.as_str(),
                reg.read.as_str(),
                reg.reached_via.as_str()
            )?;
            if reg.serialization_required {
                writeln!(f, "    serialize: {}", reg.sharers.join(", "))?;
            }
            for caveat in &reg.caveats {
                writeln!(f, "    caveat: {caveat}")?;
            }
        }

        if !self.payloads.is_empty() {
            writeln!(f)?;
            writeln!(f, "--- Payloads ---")?;
            for payload in &self.payloads {
                match &payload.written_via {
                    Some(contract) => writeln!(
                        f,
                        "  {}: {} bytes, via {contract}",
                        payload.name, payload.bytes
                    )?,
                    None => writeln!(
                        f,
                        "  {}: {} bytes, not generated (no byte-writing capability)",
                        payload.name, payload.bytes
                    )?,
                }
            }
        }

        if !self.plan_errors.is_empty() {
            writeln!(f)?;
            writeln!(f, "--- Demotions ({}) ---", self.plan_errors.len())?;
            for err in &self.plan_errors {
                writeln!(f, "  {err}")?;
            }
        }

        writeln!(f)?;
        writeln!(f, "--- Units ---")?;
        writeln!(
            f,
            "  {} peripheral, {} trait impls, {} raw accessors, {} payload writers",
            self.units.peripheral,
            self.units.trait_impls,
            self.units.raw_accessors,
            self.units.payload_writers
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::Provenance;

    fn unit(kind: UnitKind, source: &str) -> EmissionUnit {
        EmissionUnit {
            kind,
            module_hint: "gpioa.rs".into(),
            source: source.into(),
            provenance: Provenance::Peripheral {
                name: "GPIOA".into(),
            },
        }
    }

    #[test]
    fn fingerprint_tracks_unit_content() {
        let a = vec![unit(UnitKind::Peripheral, "pub struct Gpioa;")];
        let b = vec![unit(UnitKind::Peripheral, "pub struct Gpiob;")];
        assert_eq!(fingerprint(&a), fingerprint(&a.clone()));
        assert_ne!(fingerprint(&a), fingerprint(&b));
        assert!(fingerprint(&a).starts_with("sha256:"));
        assert_eq!(fingerprint(&a).len(), "sha256:".len() + 64);
    }

    #[test]
    fn report_display() {
        let report = EmissionReport {
            peripheral: "GPIOA".into(),
            registry_version: "1.0.0".into(),
            hints: vec!["gpio".into()],
            capabilities: vec![CapabilityEntry {
                contract: "digital-output".into(),
                trait_path: "embedded_hal::digital::OutputPin".into(),
                status: MatchStatus::Full,
                hinted: true,
                bindings: vec!["set_high -> ODR.OD0".into()],
                unmet: vec![],
            }],
            registers: vec![RegisterEntry {
                name: "ODR".into(),
                offset: 0x14,
                strategy: AccessStrategy::ReadModifyWrite,
                read: ReadDiscipline::Volatile,
                reached_via: Reach::Both,
                serialization_required: true,
                sharers: vec!["digital-output".into(), "raw accessor".into()],
                caveats: vec![],
            }],
            payloads: vec![PayloadEntry {
                name: "status".into(),
                bytes: 4,
                written_via: None,
            }],
            plan_errors: vec![],
            units: UnitCounts {
                peripheral: 1,
                trait_impls: 1,
                raw_accessors: 1,
                payload_writers: 0,
            },
            fingerprint: "sha256:abc123".into(),
        };

        let output = format!("{report}");
        assert!(output.contains("=== Emission Report ==="));
        assert!(output.contains("Contract registry: v1.0.0"));
        assert!(output.contains("digital-output (embedded_hal::digital::OutputPin): full [hinted]"));
        assert!(output.contains("set_high -> ODR.OD0"));
        assert!(output.contains("ODR @ 0x14: read-modify-write, volatile reads, via both"));
        assert!(output.contains("serialize: digital-output, raw accessor"));
        assert!(output.contains("status: 4 bytes, not generated (no byte-writing capability)"));
        assert!(output.contains("1 peripheral, 1 trait impls, 1 raw accessors, 0 payload writers"));
        assert!(!output.contains("Demotions"));
        assert_eq!(report.units.total(), 3);

        let json = report.to_json().unwrap();
        assert!(json.contains("\"strategy\": \"read-modify-write\""));
        assert!(json.contains("\"reached_via\": \"both\""));
    }
}
