//! Capability matcher: decides which contracts a hardware model satisfies.
//!
//! For each contract, every operation is bound to at most one field. A field
//! is a candidate when its role fits the operation; candidates are ranked by
//! role fit (exact before compatible) and then by declaration order, and the
//! first one whose access and width suit the operation wins. Operations with
//! a guard also need a readable 1-bit flag.
//!
//! A contract is Full when every operation is bound and every contract it
//! requires is Full, Partial when at least one operation is bound, and None
//! otherwise. Matching is a pure function of the model and the registry.

use std::fmt;

use serde::{Deserialize, Serialize};

use openpid_model::{AccessMode, FieldRef, PeripheralModel};

use crate::contract::{
    CapabilityContract, GuardRequirement, Intent, OperationRequirement, RoleMatch,
};
use crate::registry::ContractRegistry;

/// Overall outcome of matching one contract. Ordered `None < Partial < Full`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStatus {
    None,
    Partial,
    Full,
}

impl MatchStatus {
    fn from_counts(bound: usize, required: usize) -> Self {
        if bound == 0 {
            MatchStatus::None
        } else if bound < required {
            MatchStatus::Partial
        } else {
            MatchStatus::Full
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::None => "none",
            MatchStatus::Partial => "partial",
            MatchStatus::Full => "full",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operation bound to the field that implements it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationBinding {
    pub operation: String,
    pub intent: Intent,
    pub field: FieldRef,
    pub role_match: RoleMatch,
    /// Readiness flag consulted before the operation proceeds.
    pub guard: Option<FieldRef>,
}

impl OperationBinding {
    pub fn touches(&self, at: FieldRef) -> bool {
        self.field == at || self.guard == Some(at)
    }
}

/// Why a requirement could not be met.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum UnmetReason {
    /// No field carries the role or a compatible one.
    NoCandidate { role: String },
    /// The best candidate cannot be accessed the way the operation needs.
    InsufficientAccess { field: String, access: AccessMode },
    /// The best candidate has the wrong width.
    WidthOutOfRange {
        field: String,
        width: u32,
        min: u32,
        max: u32,
    },
    /// No readable 1-bit flag for the operation's guard.
    GuardUnavailable { role: String },
    /// A required contract is not Full.
    MissingDependency { contract: String },
    /// The access planner could not reach the bound field.
    Unplannable {
        register: String,
        field: String,
        detail: String,
    },
}

impl fmt::Display for UnmetReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmetReason::NoCandidate { role } => write!(f, "no field with role '{role}'"),
            UnmetReason::InsufficientAccess { field, access } => {
                write!(f, "field {field} is {access}")
            }
            UnmetReason::WidthOutOfRange {
                field,
                width,
                min,
                max,
            } => write!(
                f,
                "field {field} is {width} bits wide, expected {min}..={max}"
            ),
            UnmetReason::GuardUnavailable { role } => {
                write!(f, "no readable 1-bit '{role}' flag")
            }
            UnmetReason::MissingDependency { contract } => {
                write!(f, "requires '{contract}' to match fully")
            }
            UnmetReason::Unplannable {
                register,
                field,
                detail,
            } => write!(f, "{register}.{field} cannot be written safely: {detail}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmetRequirement {
    /// Operation the requirement belongs to; `None` for contract-level needs.
    pub operation: Option<String>,
    pub reason: UnmetReason,
}

impl fmt::Display for UnmetRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operation {
            Some(op) => write!(f, "{op}: {}", self.reason),
            None => write!(f, "{}", self.reason),
        }
    }
}

/// The outcome of matching one contract against one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub contract: String,
    pub trait_path: String,
    pub status: MatchStatus,
    /// Whether the description declared this contract's capability tag.
    pub hinted: bool,
    pub bindings: Vec<OperationBinding>,
    pub unmet: Vec<UnmetRequirement>,
    required: usize,
}

impl MatchResult {
    pub fn is_full(&self) -> bool {
        self.status == MatchStatus::Full
    }

    pub fn binding(&self, operation: &str) -> Option<&OperationBinding> {
        self.bindings.iter().find(|b| b.operation == operation)
    }

    /// Every field this result reads or writes, guards included.
    pub fn touched_fields(&self) -> impl Iterator<Item = FieldRef> + '_ {
        self.bindings
            .iter()
            .flat_map(|b| std::iter::once(b.field).chain(b.guard))
    }

    fn note(&mut self, unmet: UnmetRequirement) -> bool {
        if self.unmet.contains(&unmet) {
            false
        } else {
            self.unmet.push(unmet);
            true
        }
    }
}

/// Match results for every registered contract, in registry order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchSet {
    results: Vec<MatchResult>,
}

impl MatchSet {
    pub fn iter(&self) -> impl Iterator<Item = &MatchResult> {
        self.results.iter()
    }

    pub fn get(&self, contract: &str) -> Option<&MatchResult> {
        self.results.iter().find(|r| r.contract == contract)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results that will become trait implementations.
    pub fn full(&self) -> impl Iterator<Item = &MatchResult> {
        self.results.iter().filter(|r| r.is_full())
    }

    /// Drop every binding that touches `field`, recording `reason`.
    ///
    /// Returns the number of results that changed.
    pub fn demote(&mut self, field: FieldRef, reason: &UnmetReason) -> usize {
        let mut changed = 0;
        for result in &mut self.results {
            let (lost, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut result.bindings)
                .into_iter()
                .partition(|b| b.touches(field));
            result.bindings = kept;
            if lost.is_empty() {
                continue;
            }
            for binding in lost {
                result.note(UnmetRequirement {
                    operation: Some(binding.operation),
                    reason: reason.clone(),
                });
            }
            result.status = MatchStatus::from_counts(result.bindings.len(), result.required);
            tracing::debug!(
                contract = %result.contract,
                status = %result.status,
                "demoted capability match: {reason}"
            );
            changed += 1;
        }
        changed
    }

    /// Downgrade results whose required contracts are not Full, to a fixpoint.
    pub fn enforce_dependencies(&mut self, registry: &ContractRegistry) {
        loop {
            let mut changed = false;
            for i in 0..self.results.len() {
                let Some(contract) = registry.get(&self.results[i].contract) else {
                    continue;
                };
                let missing: Vec<String> = contract
                    .requires
                    .iter()
                    .filter(|dep| !self.get(dep).is_some_and(MatchResult::is_full))
                    .cloned()
                    .collect();

                let result = &mut self.results[i];
                for dep in missing {
                    changed |= result.note(UnmetRequirement {
                        operation: None,
                        reason: UnmetReason::MissingDependency { contract: dep },
                    });
                    if result.status == MatchStatus::Full {
                        result.status = MatchStatus::Partial;
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }
}

/// Match every contract of `registry` against `model`.
pub fn match_capabilities(model: &PeripheralModel, registry: &ContractRegistry) -> MatchSet {
    let mut set = MatchSet {
        results: registry
            .iter()
            .map(|contract| match_contract(model, contract))
            .collect(),
    };
    set.enforce_dependencies(registry);

    for result in set.iter() {
        tracing::debug!(
            peripheral = %model.name,
            contract = %result.contract,
            status = %result.status,
            hinted = result.hinted,
            "capability matched"
        );
    }
    set
}

fn match_contract(model: &PeripheralModel, contract: &CapabilityContract) -> MatchResult {
    let mut bindings = Vec::new();
    let mut unmet = Vec::new();
    for op in &contract.operations {
        match bind_operation(model, op) {
            Ok(binding) => bindings.push(binding),
            Err(reason) => unmet.push(UnmetRequirement {
                operation: Some(op.name.clone()),
                reason,
            }),
        }
    }

    MatchResult {
        contract: contract.id.clone(),
        trait_path: contract.trait_path.clone(),
        status: MatchStatus::from_counts(bindings.len(), contract.operations.len()),
        hinted: model.has_hint(&contract.capability),
        bindings,
        unmet,
        required: contract.operations.len(),
    }
}

fn bind_operation(
    model: &PeripheralModel,
    op: &OperationRequirement,
) -> Result<OperationBinding, UnmetReason> {
    let mut candidates: Vec<(RoleMatch, FieldRef)> = model
        .fields()
        .filter_map(|(at, field)| op.role_match(field).map(|fit| (fit, at)))
        .collect();
    candidates.sort();

    let mut rejection = None;
    for (role_match, at) in candidates {
        let Some(field) = model.field(at) else {
            continue;
        };
        if !op.intent.accepts(field.access) {
            rejection.get_or_insert(UnmetReason::InsufficientAccess {
                field: model.field_path(at),
                access: field.access,
            });
            continue;
        }
        if !op.width.contains(field.bit_width) {
            rejection.get_or_insert(UnmetReason::WidthOutOfRange {
                field: model.field_path(at),
                width: field.bit_width,
                min: op.width.min,
                max: op.width.max,
            });
            continue;
        }

        let guard = match &op.guard {
            Some(guard) => Some(find_guard(model, guard).ok_or_else(|| {
                UnmetReason::GuardUnavailable {
                    role: guard.role.clone(),
                }
            })?),
            None => None,
        };
        return Ok(OperationBinding {
            operation: op.name.clone(),
            intent: op.intent,
            field: at,
            role_match,
            guard,
        });
    }

    Err(rejection.unwrap_or_else(|| UnmetReason::NoCandidate {
        role: op.role.clone(),
    }))
}

fn find_guard(model: &PeripheralModel, guard: &GuardRequirement) -> Option<FieldRef> {
    model
        .fields()
        .filter(|(_, field)| field.access.is_readable() && field.bit_width == 1)
        .filter_map(|(at, field)| guard.role_match(field).map(|fit| (fit, at)))
        .min()
        .map(|(_, at)| at)
}
