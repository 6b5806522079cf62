//! Code emitter: renders the generated driver as an ordered list of units.
//!
//! Unit order is fixed: the peripheral handle first, then for each register
//! in declaration order its raw accessor unit (if any) followed by the trait
//! units anchored at it, in contract order. A trait unit is anchored at the
//! lowest register it touches. Only Full matches produce trait units.
//! Payload writers come last, in declaration order, and only when a Full
//! match provides a byte sink.

mod hal;
mod payload;
mod peripheral;
mod raw;
mod writer;

use std::collections::BTreeSet;

use serde::Serialize;

use openpid_contracts::{ContractRegistry, MatchResult, MatchSet};
use openpid_model::{BitField, PeripheralModel, Register, RegisterWidth};

use crate::config::GeneratorConfig;
use crate::plan::{AccessPlan, WriteRecipe};
use writer::literal;

pub(crate) use payload::byte_sink;

/// What a unit implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitKind {
    /// The handle type and its constructors.
    Peripheral,
    /// One capability trait implementation.
    TraitImpl,
    /// Direct register accessors for one register.
    RawAccessor,
    /// A `send_*` writer for one payload.
    PayloadWriter,
}

/// Where a unit came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Provenance {
    Peripheral { name: String },
    Capability { contract: String, trait_path: String },
    Register { name: String, offset: u64 },
    Payload { name: String, contract: String },
}

/// One generated source fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmissionUnit {
    pub kind: UnitKind,
    /// Target file, relative to the generated crate's `src/`.
    pub module_hint: String,
    pub source: String,
    pub provenance: Provenance,
}

/// Inputs shared by every renderer.
pub(crate) struct EmitContext<'a> {
    pub model: &'a PeripheralModel,
    pub type_name: String,
    pub config: &'a GeneratorConfig,
}

impl<'a> EmitContext<'a> {
    pub fn new(model: &'a PeripheralModel, config: &'a GeneratorConfig) -> Self {
        let type_name = config
            .struct_name
            .clone()
            .unwrap_or_else(|| model.type_ident.clone());
        Self {
            model,
            type_name,
            config,
        }
    }
}

/// Render all units for one peripheral.
pub fn emit_units(
    model: &PeripheralModel,
    registry: &ContractRegistry,
    matches: &MatchSet,
    plan: &AccessPlan,
    config: &GeneratorConfig,
) -> Vec<EmissionUnit> {
    let ctx = EmitContext::new(model, config);
    let module_hint = format!("{}.rs", model.ident);
    let mut units = vec![EmissionUnit {
        kind: UnitKind::Peripheral,
        module_hint: module_hint.clone(),
        source: peripheral::render(&ctx),
        provenance: Provenance::Peripheral {
            name: model.name.clone(),
        },
    }];

    let anchored: Vec<(usize, &MatchResult)> = matches
        .full()
        .filter_map(|result| {
            result
                .touched_fields()
                .map(|at| at.register)
                .min()
                .map(|anchor| (anchor, result))
        })
        .collect();

    let mut error_impls: BTreeSet<String> = BTreeSet::new();
    for (index, reg) in model.registers.iter().enumerate() {
        let Some(reg_plan) = plan.register(index) else {
            continue;
        };
        if reg_plan.raw_accessor {
            units.push(EmissionUnit {
                kind: UnitKind::RawAccessor,
                module_hint: module_hint.clone(),
                source: raw::render(&ctx, reg, reg_plan),
                provenance: Provenance::Register {
                    name: reg.name.clone(),
                    offset: reg.offset,
                },
            });
        }

        for (_, result) in anchored.iter().filter(|(anchor, _)| *anchor == index) {
            let Some(contract) = registry.get(&result.contract) else {
                continue;
            };
            let error_impl = contract
                .error_trait
                .as_ref()
                .filter(|path| error_impls.insert((*path).clone()))
                .cloned();
            units.push(EmissionUnit {
                kind: UnitKind::TraitImpl,
                module_hint: module_hint.clone(),
                source: hal::render(&ctx, contract, result, plan, error_impl.as_deref()),
                provenance: Provenance::Capability {
                    contract: contract.id.clone(),
                    trait_path: contract.trait_path.clone(),
                },
            });
        }
    }

    match payload::byte_sink(registry, matches) {
        Some(sink) => {
            for (index, payload) in model.payloads.iter().enumerate() {
                units.push(EmissionUnit {
                    kind: UnitKind::PayloadWriter,
                    module_hint: module_hint.clone(),
                    source: payload::render(&ctx, sink, payload, index == 0),
                    provenance: Provenance::Payload {
                        name: payload.name.clone(),
                        contract: sink.contract.id.clone(),
                    },
                });
            }
        }
        None if !model.payloads.is_empty() => tracing::warn!(
            peripheral = %model.name,
            payloads = model.payloads.len(),
            "no byte-writing capability matched; payload writers are not generated"
        ),
        None => {}
    }

    tracing::debug!(
        peripheral = %model.name,
        units = units.len(),
        "emitted units"
    );
    units
}

/// `self.register::<u32>(offset)`
fn register_ptr(reg: &Register, offset: &str) -> String {
    format!("self.register::<{}>({offset})", reg.width.rust_type())
}

/// Value written when a field-targeted write is composed with `recipe`.
///
/// `current` names the value read back, `bits` the already-masked field bits.
/// Terms are parenthesized only when joined, so a lone term is a valid
/// argument as is.
fn compose_write(recipe: &WriteRecipe, bits: &str) -> String {
    let mut terms = Vec::new();
    if needs_readback(recipe) {
        terms.push(format!("current & {}", literal(recipe.keep)));
    }
    if recipe.constant != 0 {
        terms.push(literal(recipe.constant));
    }
    if bits != "0" || terms.is_empty() {
        terms.push(bits.to_string());
    }
    join_terms(terms)
}

/// `a | b | ...`, with compound terms in parentheses.
fn join_terms(terms: Vec<String>) -> String {
    if terms.len() == 1 {
        return terms.into_iter().collect();
    }
    terms
        .into_iter()
        .map(|t| if t.contains(' ') { format!("({t})") } else { t })
        .collect::<Vec<_>>()
        .join(" | ")
}

fn needs_readback(recipe: &WriteRecipe) -> bool {
    recipe.readback && recipe.keep != 0
}

/// Masked field bits from a value expression of type `from`.
fn shifted_bits(value: &str, from: &str, field: &BitField, width: RegisterWidth) -> String {
    let ty = width.rust_type();
    let cast = if from == ty {
        value.to_string()
    } else {
        format!("({value} as {ty})")
    };
    if field.bit_offset == 0 {
        format!("{cast} & {}", literal(field.mask()))
    } else {
        format!("({cast} << {}) & {}", field.bit_offset, literal(field.mask()))
    }
}

/// Field content extracted from `value`, as `to` (`bool` tests for non-zero).
fn extracted_bits(value: &str, field: &BitField, width: RegisterWidth, to: &str) -> String {
    let masked = format!("{value} & {}", literal(field.mask()));
    if to == "bool" {
        return format!("({masked}) != 0");
    }
    let shifted = if field.bit_offset == 0 {
        masked
    } else {
        format!("({masked}) >> {}", field.bit_offset)
    };
    if to == width.rust_type() {
        shifted
    } else {
        format!("({shifted}) as {to}")
    }
}

/// Emit the statements performing a field-targeted write of `bits`.
fn write_statements(
    w: &mut writer::CodeWriter,
    reg: &Register,
    ptr: &str,
    recipe: &WriteRecipe,
    bits: &str,
) {
    w.line(format!("let reg = {ptr};"));
    w.line(safety_comment(reg));
    if needs_readback(recipe) {
        w.open("unsafe");
        w.line("let current = core::ptr::read_volatile(reg);");
        w.line(format!(
            "core::ptr::write_volatile(reg, {});",
            compose_write(recipe, bits)
        ));
        w.close();
    } else {
        w.line(format!(
            "unsafe {{ core::ptr::write_volatile(reg, {}) }};",
            compose_write(recipe, bits)
        ));
    }
}

fn safety_comment(reg: &Register) -> String {
    format!(
        "// SAFETY: `reg` points at {}, inside the block owned by this handle and {}-byte aligned.",
        reg.name,
        reg.width.bytes()
    )
}
