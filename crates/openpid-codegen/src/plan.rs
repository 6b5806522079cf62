//! Register access planner.
//!
//! Produces exactly one [`RegisterPlan`] per register, in declaration order.
//! A plan fixes how generated code reads the register and how a write of a
//! subset of its bits is composed:
//!
//! ```text
//! written = (current & keep) | constant | (bits & field_mask)
//! ```
//!
//! where `current` is only read for read-modify-write registers. `keep` is
//! the preserve mask without the target field, `constant` carries the reset
//! value of write-only fields that cannot be read back. One-shot bits
//! (write-one-to-set/clear) are never part of `keep`, so writing one field
//! never re-triggers another.

use serde::Serialize;

use openpid_contracts::{MatchSet, MatchStatus};
use openpid_model::{AccessMode, PeripheralModel, Register, WriteEffect};

use crate::error::PlanError;

/// How generated code writes a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessStrategy {
    /// Not writable.
    ReadOnly,
    /// Written without reading first.
    DirectWrite,
    /// A single field spans the register; reads and writes are whole-value.
    ReadWrite,
    /// Read, mask, write back; requires serialization.
    ReadModifyWrite,
}

impl AccessStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessStrategy::ReadOnly => "read-only",
            AccessStrategy::DirectWrite => "direct-write",
            AccessStrategy::ReadWrite => "read-write",
            AccessStrategy::ReadModifyWrite => "read-modify-write",
        }
    }
}

/// How generated code reads a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadDiscipline {
    /// Not readable.
    None,
    /// Reads are free of side effects and the value only changes when written.
    Stable,
    /// Hardware may change the value; reads must not be cached or reordered.
    Volatile,
    /// Reading changes hardware state.
    Destructive,
}

impl ReadDiscipline {
    pub fn as_str(self) -> &'static str {
        match self {
            ReadDiscipline::None => "none",
            ReadDiscipline::Stable => "stable",
            ReadDiscipline::Volatile => "volatile",
            ReadDiscipline::Destructive => "destructive",
        }
    }
}

/// Whether concurrent writers of a register must be serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Serialization {
    NotRequired,
    /// `sharers` lists every generated owner that touches the register.
    Required { sharers: Vec<String> },
}

/// How the register is exposed by generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reach {
    Trait,
    Fallback,
    Both,
}

impl Reach {
    pub fn as_str(self) -> &'static str {
        match self {
            Reach::Trait => "trait",
            Reach::Fallback => "fallback",
            Reach::Both => "both",
        }
    }
}

/// Owner name used for raw accessor units in sharer lists.
pub const RAW_ACCESSOR: &str = "raw accessor";

/// The access plan of one register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterPlan {
    /// Register index in the model.
    pub register: usize,
    pub name: String,
    pub strategy: AccessStrategy,
    pub read: ReadDiscipline,
    /// Bits that are safe to write back exactly as read.
    pub preserve_mask: u64,
    /// Bits written in place of values that cannot be read back.
    pub fill: u64,
    /// One-shot bits written as zero unless targeted.
    pub zero_mask: u64,
    /// Indices of writable fields that cannot be written individually.
    pub unreachable: Vec<usize>,
    /// Full contracts whose trait code touches this register.
    pub trait_owners: Vec<String>,
    /// Whether a raw accessor unit is emitted for this register.
    pub raw_accessor: bool,
    pub serialization: Serialization,
    pub reached_via: Reach,
    pub caveats: Vec<String>,
}

/// How to compose a write that targets `mask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRecipe {
    pub readback: bool,
    pub keep: u64,
    pub constant: u64,
}

impl RegisterPlan {
    pub fn is_readable(&self) -> bool {
        self.read != ReadDiscipline::None
    }

    pub fn is_writable(&self) -> bool {
        self.strategy != AccessStrategy::ReadOnly
    }

    /// Whether the field at `index` can be written on its own.
    pub fn is_reachable(&self, index: usize) -> bool {
        !self.unreachable.contains(&index)
    }

    pub fn requires_serialization(&self) -> bool {
        matches!(self.serialization, Serialization::Required { .. })
    }

    pub fn sharers(&self) -> &[String] {
        match &self.serialization {
            Serialization::Required { sharers } => sharers,
            Serialization::NotRequired => &[],
        }
    }

    pub fn write_recipe(&self, mask: u64) -> WriteRecipe {
        match self.strategy {
            AccessStrategy::ReadModifyWrite => WriteRecipe {
                readback: true,
                keep: self.preserve_mask & !mask,
                constant: self.fill & !mask,
            },
            AccessStrategy::DirectWrite => WriteRecipe {
                readback: false,
                keep: 0,
                constant: self.fill & !mask,
            },
            AccessStrategy::ReadWrite | AccessStrategy::ReadOnly => WriteRecipe {
                readback: false,
                keep: 0,
                constant: 0,
            },
        }
    }
}

/// Plans for every register plus the errors raised for bound operations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AccessPlan {
    pub registers: Vec<RegisterPlan>,
    pub errors: Vec<PlanError>,
}

impl AccessPlan {
    pub fn register(&self, index: usize) -> Option<&RegisterPlan> {
        self.registers.get(index)
    }

    pub fn register_by_name(&self, name: &str) -> Option<&RegisterPlan> {
        self.registers.iter().find(|p| p.name == name)
    }

    /// Record errors of an earlier pass as caveats of their registers.
    pub fn absorb(&mut self, errors: Vec<PlanError>) {
        for err in &errors {
            if let Some(plan) = self.registers.get_mut(err.register_index()) {
                plan.caveats
                    .push(format!("{err}; the operation falls back to raw access"));
            }
        }
        self.errors = errors;
    }
}

/// Plan every register of `model` against the current match results.
pub fn plan_access(model: &PeripheralModel, matches: &MatchSet) -> AccessPlan {
    let mut plan = AccessPlan::default();
    for (index, reg) in model.registers.iter().enumerate() {
        let (register_plan, errors) = plan_register(model, matches, index, reg);
        tracing::debug!(
            register = %reg.name,
            strategy = register_plan.strategy.as_str(),
            read = register_plan.read.as_str(),
            reach = register_plan.reached_via.as_str(),
            "planned register access"
        );
        plan.registers.push(register_plan);
        plan.errors.extend(errors);
    }
    plan
}

fn plan_register(
    model: &PeripheralModel,
    matches: &MatchSet,
    index: usize,
    reg: &Register,
) -> (RegisterPlan, Vec<PlanError>) {
    let full = reg.width.full_mask();
    let readable = reg.access.is_readable();
    let writable = reg.access.is_writable();
    let mut caveats = Vec::new();

    let read = if !readable {
        ReadDiscipline::None
    } else if reg.access.has_read_side_effect()
        || reg.fields.iter().any(|f| f.access.has_read_side_effect())
    {
        ReadDiscipline::Destructive
    } else if reg.volatile {
        ReadDiscipline::Volatile
    } else {
        ReadDiscipline::Stable
    };

    // Fields that store what is written but cannot be read back.
    let write_only = |access: AccessMode| {
        access.write_effect() == WriteEffect::Store && !access.is_readable()
    };

    let mut zero_mask = 0;
    let mut write_only_mask = 0;
    let mut fill = 0;
    let mut refilled = Vec::new();
    let mut blockers = Vec::new();
    for (i, field) in reg.fields.iter().enumerate() {
        if field.access.is_zero_neutral() {
            zero_mask |= field.mask();
        }
        if write_only(field.access) {
            write_only_mask |= field.mask();
            match field.reset {
                Some(reset) => {
                    fill |= (reset << field.bit_offset) & field.mask();
                    refilled.push(field.name.as_str());
                }
                None => blockers.push(i),
            }
        }
    }
    if !readable {
        if let Some(reset) = reg.reset {
            fill |= reset & reg.reserved_mask();
        }
    }

    let writable_fields: Vec<usize> = reg
        .fields
        .iter()
        .enumerate()
        .filter(|(_, f)| f.access.is_writable())
        .map(|(i, _)| i)
        .collect();

    let mut unreachable = Vec::new();
    for &i in &writable_fields {
        if let Some(&blocker) = blockers.iter().find(|&&b| b != i) {
            unreachable.push(i);
            caveats.push(format!(
                "{} cannot be written on its own: {} has no known reset value",
                reg.fields[i].name, reg.fields[blocker].name
            ));
        }
    }

    let strategy = if !writable {
        AccessStrategy::ReadOnly
    } else if !readable {
        AccessStrategy::DirectWrite
    } else if reg.fields.is_empty() || reg.is_single_full_field() {
        AccessStrategy::ReadWrite
    } else if writable_fields
        .iter()
        .all(|&i| reg.fields[i].access.is_zero_neutral())
    {
        AccessStrategy::DirectWrite
    } else {
        AccessStrategy::ReadModifyWrite
    };

    let preserve_mask = if readable && writable {
        full & !zero_mask & !write_only_mask
    } else {
        0
    };

    if writable_fields.len() > 1 && !refilled.is_empty() {
        caveats.push(format!(
            "writing one field rewrites {} with the reset value",
            refilled.join(", ")
        ));
    }
    // Read-to-clear fields a read-modify-write would clear as a side effect.
    let cleared = if strategy == AccessStrategy::ReadModifyWrite && read == ReadDiscipline::Destructive {
        let names: Vec<&str> = reg
            .fields
            .iter()
            .filter(|f| f.access.has_read_side_effect())
            .map(|f| f.name.as_str())
            .collect();
        let cleared = if names.is_empty() {
            reg.name.clone()
        } else {
            names.join(", ")
        };
        caveats.push(format!(
            "read-modify-write reads the register, clearing {cleared}"
        ));
        Some(cleared)
    } else {
        None
    };
    let too_wide = reg.width.bits() > model.word_size;
    if too_wide {
        caveats.push(format!(
            "{}-bit register is wider than the {}-bit target word; accesses are not atomic",
            reg.width.bits(),
            model.word_size
        ));
    }

    let mut errors = Vec::new();
    let mut trait_owners: Vec<String> = Vec::new();
    let mut partial_bound = false;
    let mut covered = vec![false; reg.fields.len()];
    for result in matches.iter() {
        if result.status == MatchStatus::None {
            continue;
        }
        let touches = result.touched_fields().any(|at| at.register == index);
        if !touches {
            continue;
        }
        if result.is_full() {
            trait_owners.push(result.contract.clone());
            for at in result.touched_fields().filter(|at| at.register == index) {
                if let Some(slot) = covered.get_mut(at.field) {
                    *slot = true;
                }
            }
        } else {
            partial_bound = true;
        }

        for binding in &result.bindings {
            for at in std::iter::once(binding.field).chain(binding.guard) {
                if at.register != index {
                    continue;
                }
                let field = &reg.fields[at.field];
                if too_wide {
                    errors.push(PlanError::NonAtomicWidth {
                        contract: result.contract.clone(),
                        operation: binding.operation.clone(),
                        register: reg.name.clone(),
                        field: field.name.clone(),
                        width: reg.width.bits(),
                        word_size: model.word_size,
                        at,
                    });
                } else if at == binding.field
                    && binding.intent.writes()
                    && unreachable.contains(&at.field)
                {
                    let blocker = blockers
                        .iter()
                        .find(|&&b| b != at.field)
                        .map(|&b| reg.fields[b].name.clone())
                        .unwrap_or_default();
                    errors.push(PlanError::UnreachableField {
                        contract: result.contract.clone(),
                        operation: binding.operation.clone(),
                        register: reg.name.clone(),
                        field: field.name.clone(),
                        blocker,
                        at,
                    });
                } else if let Some(cleared) =
                    cleared.as_ref().filter(|_| at == binding.field && binding.intent.writes())
                {
                    errors.push(PlanError::DestructiveReadBack {
                        contract: result.contract.clone(),
                        operation: binding.operation.clone(),
                        register: reg.name.clone(),
                        field: field.name.clone(),
                        cleared: cleared.clone(),
                        at,
                    });
                }
            }
        }
    }

    let fully_covered = !covered.is_empty() && covered.iter().all(|c| *c);
    let raw_accessor = !fully_covered || partial_bound;
    let reached_via = match (trait_owners.is_empty(), raw_accessor) {
        (true, _) => Reach::Fallback,
        (false, true) => Reach::Both,
        (false, false) => Reach::Trait,
    };

    let serialization = if strategy == AccessStrategy::ReadModifyWrite {
        let mut sharers = trait_owners.clone();
        if raw_accessor {
            sharers.push(RAW_ACCESSOR.to_string());
        }
        Serialization::Required { sharers }
    } else {
        Serialization::NotRequired
    };

    let plan = RegisterPlan {
        register: index,
        name: reg.name.clone(),
        strategy,
        read,
        preserve_mask,
        fill,
        zero_mask,
        unreachable,
        trait_owners,
        raw_accessor,
        serialization,
        reached_via,
        caveats,
    };
    (plan, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use openpid_contracts::{match_capabilities, ContractRegistry};
    use openpid_model::{build_model, FieldDescription, PeripheralDescription, RegisterDescription};

    fn model_with(word_size: u32, registers: Vec<RegisterDescription>) -> PeripheralModel {
        build_model(&PeripheralDescription {
            name: "PERIPH".into(),
            description: None,
            version: None,
            base_address: 0x4000_0000,
            word_size,
            capabilities: vec![],
            registers,
            payloads: Vec::new(),
        })
        .unwrap()
    }

    fn planned(registers: Vec<RegisterDescription>) -> (PeripheralModel, AccessPlan) {
        let model = model_with(32, registers);
        let matches = match_capabilities(&model, &ContractRegistry::embedded_hal_v1());
        let plan = plan_access(&model, &matches);
        (model, plan)
    }

    #[test]
    fn shared_read_write_register_needs_rmw() {
        let (_, plan) = planned(vec![RegisterDescription::new(
            "CTRL",
            0,
            8,
            AccessMode::ReadWrite,
        )
        .with_field(FieldDescription::new("enable", 0, 1).with_role("enable"))]);
        let ctrl = &plan.registers[0];
        assert_eq!(ctrl.strategy, AccessStrategy::ReadModifyWrite);
        assert_eq!(ctrl.read, ReadDiscipline::Volatile);
        assert_eq!(ctrl.preserve_mask, 0xFF);
        assert_eq!(
            ctrl.sharers(),
            &["digital-output".to_string(), "stateful-output".to_string()]
        );
        assert!(!ctrl.raw_accessor);
        assert_eq!(ctrl.reached_via, Reach::Trait);
        assert!(plan.errors.is_empty());

        let recipe = ctrl.write_recipe(0x1);
        assert!(recipe.readback);
        assert_eq!(recipe.keep, 0xFE);
        assert_eq!(recipe.constant, 0);
    }

    #[test]
    fn set_clear_registers_write_directly() {
        let (_, plan) = planned(vec![
            RegisterDescription::new("SET", 0, 32, AccessMode::WriteOneToSet)
                .with_field(FieldDescription::new("EN", 0, 1).with_role("enable")),
            RegisterDescription::new("CLEAR", 4, 32, AccessMode::WriteOneToClear)
                .with_field(FieldDescription::new("EN", 0, 1).with_role("enable")),
        ]);
        for reg in &plan.registers {
            assert_eq!(reg.strategy, AccessStrategy::DirectWrite);
            assert_eq!(reg.read, ReadDiscipline::None);
            assert!(!reg.write_recipe(0x1).readback);
            assert!(!reg.requires_serialization());
        }
    }

    #[test]
    fn one_shot_bits_are_not_written_back() {
        let (_, plan) = planned(vec![RegisterDescription::new(
            "CSR",
            0,
            32,
            AccessMode::ReadWrite,
        )
        .with_field(FieldDescription::new("EN", 0, 1).with_role("output"))
        .with_field(FieldDescription::new("OVF", 4, 1).with_access(AccessMode::ReadWriteOneToClear))
        .with_field(FieldDescription::new("START", 5, 1).with_access(AccessMode::WriteOneToSet))]);
        let csr = &plan.registers[0];
        assert_eq!(csr.strategy, AccessStrategy::ReadModifyWrite);
        assert_eq!(csr.zero_mask, 0x30);
        assert_eq!(csr.preserve_mask, 0xFFFF_FFCF);
        assert_eq!(csr.write_recipe(0x1).keep, 0xFFFF_FFCE);
        assert!(csr.raw_accessor);
        assert_eq!(csr.reached_via, Reach::Both);
        assert_eq!(
            csr.sharers(),
            &[
                "digital-output".to_string(),
                "stateful-output".to_string(),
                RAW_ACCESSOR.to_string()
            ]
        );
    }

    #[test]
    fn clear_only_status_register_writes_directly() {
        let (_, plan) = planned(vec![RegisterDescription::new(
            "ISR",
            0,
            16,
            AccessMode::ReadWriteOneToClear,
        )
        .with_field(FieldDescription::new("A", 0, 1))
        .with_field(FieldDescription::new("B", 1, 1))]);
        let isr = &plan.registers[0];
        assert_eq!(isr.strategy, AccessStrategy::DirectWrite);
        assert_eq!(isr.zero_mask, 0x3);
        assert_eq!(isr.reached_via, Reach::Fallback);
    }

    #[test]
    fn opaque_write_only_field_blocks_neighbours() {
        let (_, plan) = planned(vec![RegisterDescription::new(
            "CFG",
            0,
            32,
            AccessMode::WriteOnly,
        )
        .with_field(FieldDescription::new("OUT", 0, 1).with_role("output"))
        .with_field(FieldDescription::new("MODE", 4, 4))]);
        let cfg = &plan.registers[0];
        assert_eq!(cfg.strategy, AccessStrategy::DirectWrite);
        assert_eq!(cfg.unreachable, vec![0, 1]);
        assert_eq!(plan.errors.len(), 2);
        assert!(plan.errors.iter().all(|e| matches!(
            e,
            PlanError::UnreachableField { blocker, .. } if blocker == "MODE"
        )));
    }

    #[test]
    fn known_resets_fill_write_only_registers() {
        let (_, plan) = planned(vec![RegisterDescription::new(
            "CFG",
            0,
            32,
            AccessMode::WriteOnly,
        )
        .with_reset(0x8000_0000)
        .with_field(FieldDescription::new("OUT", 0, 1).with_role("output"))
        .with_field(FieldDescription::new("MODE", 4, 4).with_reset(0x3))]);
        let cfg = &plan.registers[0];
        assert!(cfg.unreachable.is_empty());
        assert_eq!(cfg.fill, 0x8000_0030);
        assert_eq!(cfg.write_recipe(0x1).constant, 0x8000_0030);
        assert_eq!(cfg.write_recipe(0xF0).constant, 0x8000_0000);
        assert!(plan.errors.is_empty());
        assert!(cfg.caveats.iter().any(|c| c.contains("OUT, MODE")));
    }

    #[test]
    fn wide_register_is_not_atomic() {
        let model = model_with(
            32,
            vec![RegisterDescription::new("CNT", 0, 64, AccessMode::ReadWrite)
                .with_field(FieldDescription::new("OUT", 0, 1).with_role("output"))],
        );
        let matches = match_capabilities(&model, &ContractRegistry::embedded_hal_v1());
        let plan = plan_access(&model, &matches);
        assert!(plan.registers[0].caveats[0].contains("not atomic"));
        assert!(!plan.errors.is_empty());
        assert!(plan
            .errors
            .iter()
            .all(|e| matches!(e, PlanError::NonAtomicWidth { width: 64, .. })));
    }

    #[test]
    fn writes_next_to_read_to_clear_flags_are_rejected() {
        let (_, plan) = planned(vec![RegisterDescription::new(
            "CSR",
            0,
            32,
            AccessMode::ReadWrite,
        )
        .with_field(FieldDescription::new("EN", 0, 1).with_role("output"))
        .with_field(FieldDescription::new("IRQ", 1, 1).with_access(AccessMode::ReadToClear))]);
        let csr = &plan.registers[0];
        assert_eq!(csr.strategy, AccessStrategy::ReadModifyWrite);
        assert_eq!(csr.read, ReadDiscipline::Destructive);
        assert!(csr.caveats.iter().any(|c| c.ends_with("clearing IRQ")));

        // set_high and set_low both write EN.
        assert!(!plan.errors.is_empty());
        for err in &plan.errors {
            match err {
                PlanError::DestructiveReadBack { register, field, cleared, .. } => {
                    assert_eq!(register, "CSR");
                    assert_eq!(field, "EN");
                    assert_eq!(cleared, "IRQ");
                }
                other => panic!("unexpected plan error: {other}"),
            }
        }
    }

    #[test]
    fn read_discipline() {
        let (_, plan) = planned(vec![
            RegisterDescription::new("SR", 0, 32, AccessMode::ReadOnly)
                .with_field(FieldDescription::new("ERR", 0, 1).with_access(AccessMode::ReadToClear)),
            RegisterDescription::new("ID", 4, 32, AccessMode::ReadOnly).non_volatile(),
            RegisterDescription::new("DR", 8, 32, AccessMode::ReadOnly),
        ]);
        assert_eq!(plan.registers[0].read, ReadDiscipline::Destructive);
        assert_eq!(plan.registers[1].read, ReadDiscipline::Stable);
        assert_eq!(plan.registers[2].read, ReadDiscipline::Volatile);
        assert!(plan.registers.iter().all(|p| p.strategy == AccessStrategy::ReadOnly));
    }

    #[test]
    fn one_plan_per_register_in_order() {
        let (model, plan) = planned(vec![
            RegisterDescription::new("B", 8, 32, AccessMode::ReadWrite),
            RegisterDescription::new("A", 0, 32, AccessMode::ReadOnly),
            RegisterDescription::new("C", 4, 16, AccessMode::WriteOnly),
        ]);
        assert_eq!(plan.registers.len(), model.registers.len());
        for (i, reg) in plan.registers.iter().enumerate() {
            assert_eq!(reg.register, i);
            assert_eq!(reg.name, model.registers[i].name);
            assert!(reg.raw_accessor);
        }
        assert_eq!(plan.registers[0].strategy, AccessStrategy::ReadWrite);
    }

    #[test]
    fn absorbed_errors_become_caveats() {
        let (_, mut plan) = planned(vec![RegisterDescription::new(
            "CFG",
            0,
            32,
            AccessMode::WriteOnly,
        )
        .with_field(FieldDescription::new("OUT", 0, 1).with_role("output"))
        .with_field(FieldDescription::new("MODE", 4, 4))]);
        let errors = std::mem::take(&mut plan.errors);
        let before = plan.registers[0].caveats.len();
        plan.absorb(errors.clone());
        assert_eq!(plan.registers[0].caveats.len(), before + errors.len());
        assert_eq!(plan.errors, errors);
    }
}
