//! Trait implementation units for Full matches.

use openpid_contracts::{
    CapabilityContract, Intent, MatchResult, OperationBinding, OperationRequirement, ScalarType,
};
use openpid_model::{bit_mask, FieldRef, Register, WriteEffect};

use super::writer::{literal, CodeWriter};
use super::{extracted_bits, register_ptr, safety_comment, shifted_bits, write_statements, EmitContext};
use crate::plan::{AccessPlan, ReadDiscipline};

pub(super) fn render(
    ctx: &EmitContext<'_>,
    contract: &CapabilityContract,
    result: &MatchResult,
    plan: &AccessPlan,
    error_impl: Option<&str>,
) -> String {
    let mut w = CodeWriter::new();
    let name = &ctx.type_name;

    if let Some(error_trait) = error_impl {
        w.open(format!("impl {error_trait} for {name}"));
        w.line(format!("type Error = {};", ctx.config.error_type));
        w.close();
        w.blank();
    }

    match &contract.description {
        Some(desc) => w.doc(format!("`{}`: {desc}.", contract.id)),
        None => w.doc(format!("`{}`.", contract.id)),
    }
    w.doc("");
    for op in &contract.operations {
        if let Some(binding) = result.binding(&op.name) {
            w.doc(format!("- `{}` {}", op.name, describe(ctx, binding)));
        }
    }
    contract_notes(&mut w, ctx, result, plan);

    w.open(format!("impl {} for {name}", contract.trait_path));
    let mut first = true;
    for op in &contract.operations {
        let Some(binding) = result.binding(&op.name) else {
            continue;
        };
        if !first {
            w.blank();
        }
        first = false;
        w.open(op.signature());
        method_body(&mut w, ctx, op, binding, plan);
        w.close();
    }
    w.close();
    w.finish()
}

fn field_path(ctx: &EmitContext<'_>, at: FieldRef) -> String {
    let bits = ctx
        .model
        .field(at)
        .map(|f| format!(" ({})", f.bit_range()))
        .unwrap_or_default();
    format!("`{}`{bits}", ctx.model.field_path(at))
}

fn describe(ctx: &EmitContext<'_>, binding: &OperationBinding) -> String {
    let verb = match binding.intent {
        Intent::Assert => "sets",
        Intent::Deassert => "clears",
        Intent::TestAsserted | Intent::TestDeasserted => "tests",
        Intent::Store => "writes",
        Intent::Load => "reads",
        Intent::Maximum => "reports the largest value of",
        Intent::Poll => "waits for",
    };
    let mut text = format!("{verb} {}", field_path(ctx, binding.field));
    if let Some(guard) = binding.guard {
        text.push_str(&format!(" once {} is set", field_path(ctx, guard)));
    }
    text
}

/// Destructive reads and serialization obligations of the touched registers.
fn contract_notes(w: &mut CodeWriter, ctx: &EmitContext<'_>, result: &MatchResult, plan: &AccessPlan) {
    let mut registers: Vec<usize> = result.touched_fields().map(|at| at.register).collect();
    registers.sort_unstable();
    registers.dedup();

    for &index in &registers {
        if let (Some(reg), Some(p)) = (ctx.model.register(index), plan.register(index)) {
            if p.read == ReadDiscipline::Destructive {
                w.doc("");
                w.doc(format!("Reading `{}` clears its read-to-clear fields.", reg.name));
            }
        }
    }

    let written: Vec<usize> = registers
        .iter()
        .copied()
        .filter(|&index| {
            result
                .bindings
                .iter()
                .any(|b| b.intent.writes() && b.field.register == index)
        })
        .filter(|&index| plan.register(index).is_some_and(|p| p.requires_serialization()))
        .collect();
    if written.is_empty() {
        return;
    }

    w.doc("");
    w.doc("# Synchronization");
    w.doc("");
    for index in written {
        if let (Some(reg), Some(p)) = (ctx.model.register(index), plan.register(index)) {
            w.doc(format!(
                "`{}` is updated with read-modify-write and shared by: {}.",
                reg.name,
                p.sharers().join(", ")
            ));
        }
    }
    w.doc(
        "Code reaching these registers through more than one handle, or from\n\
         interrupt context, must serialize those accesses.",
    );
}

fn method_body(
    w: &mut CodeWriter,
    ctx: &EmitContext<'_>,
    op: &OperationRequirement,
    binding: &OperationBinding,
    plan: &AccessPlan,
) {
    let model = ctx.model;
    let (Some(reg), Some(field), Some(reg_plan)) = (
        model.register(binding.field.register),
        model.field(binding.field),
        plan.register(binding.field.register),
    ) else {
        w.line("unreachable!()");
        return;
    };

    if let Some(guard) = binding.guard {
        guard_check(w, ctx, guard);
    }

    let ptr = register_ptr(reg, &literal(reg.offset));
    let mask = field.mask();
    match op.intent {
        Intent::Assert | Intent::Deassert | Intent::Store => {
            let bits = match op.intent {
                Intent::Assert => literal(mask),
                Intent::Deassert if field.access.write_effect() == WriteEffect::ClearOnOne => {
                    literal(mask)
                }
                Intent::Store => match &op.argument {
                    Some(arg) => shifted_bits(&arg.name, arg.ty.rust_type(), field, reg.width),
                    None => "0".to_string(),
                },
                _ => "0".to_string(),
            };
            write_statements(w, reg, &ptr, &reg_plan.write_recipe(mask), &bits);
            finish_unit(w, op);
        }
        Intent::TestAsserted | Intent::TestDeasserted | Intent::Load | Intent::Poll => {
            read_value(w, reg, &ptr);
            match op.intent {
                Intent::TestAsserted => {
                    w.line(op.output.wrap(&format!("(value & {}) != 0", literal(mask))))
                }
                Intent::TestDeasserted => {
                    w.line(op.output.wrap(&format!("(value & {}) == 0", literal(mask))))
                }
                Intent::Load => w.line(op.output.wrap(&extracted_bits(
                    "value",
                    field,
                    reg.width,
                    op.output.ty.rust_type(),
                ))),
                _ => {
                    w.open(format!("if (value & {}) == 0", literal(mask)));
                    w.line("return Err(nb::Error::WouldBlock);");
                    w.close();
                    finish_unit(w, op);
                }
            }
        }
        Intent::Maximum => {
            let max = field.max_value().min(bit_mask(0, op.output.ty.bits()));
            w.line(op.output.wrap(&literal(max)));
        }
    }
}

fn guard_check(w: &mut CodeWriter, ctx: &EmitContext<'_>, guard: FieldRef) {
    let (Some(reg), Some(field)) = (ctx.model.register(guard.register), ctx.model.field(guard))
    else {
        return;
    };
    w.line(format!(
        "let flag = {};",
        register_ptr(reg, &literal(reg.offset))
    ));
    w.line(safety_comment(reg).replace("`reg`", "`flag`"));
    w.line(format!(
        "let ready = unsafe {{ core::ptr::read_volatile(flag) }} & {};",
        literal(field.mask())
    ));
    w.open("if ready == 0");
    w.line("return Err(nb::Error::WouldBlock);");
    w.close();
}

fn read_value(w: &mut CodeWriter, reg: &Register, ptr: &str) {
    w.line(format!("let reg = {ptr};"));
    w.line(safety_comment(reg));
    w.line("let value = unsafe { core::ptr::read_volatile(reg) };");
}

/// Trailing `Ok(())` for operations that return nothing else.
fn finish_unit(w: &mut CodeWriter, op: &OperationRequirement) {
    if op.output.return_type().is_some() && op.output.ty == ScalarType::Unit {
        w.line(op.output.wrap("()"));
    }
}
