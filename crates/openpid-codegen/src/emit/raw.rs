//! Raw accessor units: direct register and field access for one register.

use openpid_model::{BitField, Register, WriteEffect};

use super::writer::{literal, CodeWriter};
use super::{extracted_bits, join_terms, register_ptr, safety_comment, shifted_bits, write_statements, EmitContext};
use crate::plan::{AccessStrategy, ReadDiscipline, RegisterPlan};

pub(super) fn render(ctx: &EmitContext<'_>, reg: &Register, plan: &RegisterPlan) -> String {
    let mut w = CodeWriter::new();
    let offset_const = format!(
        "{}_OFFSET",
        reg.ident.trim_end_matches('_').to_ascii_uppercase()
    );
    let ptr = register_ptr(reg, &format!("Self::{offset_const}"));
    let ty = reg.width.rust_type();

    w.comment(format!(
        "{} at offset {}: {}, {} reads.",
        reg.name,
        literal(reg.offset),
        plan.strategy.as_str(),
        plan.read.as_str()
    ));
    for caveat in &plan.caveats {
        w.comment(caveat);
    }
    w.open(format!("impl {}", ctx.type_name));
    w.doc(format!("Byte offset of `{}` from the base address.", reg.name));
    w.line(format!(
        "pub const {offset_const}: usize = {};",
        literal(reg.offset)
    ));

    if plan.is_readable() {
        w.blank();
        w.doc(format!("Reads `{}`.", reg.name));
        if let Some(desc) = &reg.description {
            w.doc("");
            w.doc(desc);
        }
        read_discipline_doc(&mut w, plan.read, &reg.name);
        w.open(format!("pub fn read_{}(&mut self) -> {ty}", reg.ident));
        w.line(format!("let reg = {ptr};"));
        w.line(safety_comment(reg));
        w.line("unsafe { core::ptr::read_volatile(reg) }");
        w.close();
    }

    if plan.is_writable() {
        w.blank();
        w.doc(format!("Writes `value` to `{}` as is.", reg.name));
        if plan.zero_mask != 0 {
            w.doc("");
            w.doc(format!(
                "Bits {} are one-shot: a 1 triggers them, a 0 leaves them alone.",
                literal(plan.zero_mask)
            ));
        }
        w.open(format!("pub fn write_{}(&mut self, value: {ty})", reg.ident));
        w.line(format!("let reg = {ptr};"));
        w.line(safety_comment(reg));
        w.line("unsafe { core::ptr::write_volatile(reg, value) };");
        w.close();
    }

    if plan.is_readable() && plan.is_writable() {
        w.blank();
        w.doc(format!("Updates `{}` through `f`.", reg.name));
        w.doc("");
        let mut given = String::from("`f` receives the current value");
        if plan.zero_mask != 0 {
            given.push_str(" with one-shot bits cleared");
        }
        if plan.fill != 0 {
            given.push_str(", write-only fields at their reset value,");
        }
        given.push_str(" and its result is written back.");
        w.doc(given);
        synchronization_doc(&mut w, plan, &reg.name);
        w.open(format!(
            "pub fn modify_{}(&mut self, f: impl FnOnce({ty}) -> {ty})",
            reg.ident
        ));
        w.line(format!("let reg = {ptr};"));
        w.line(safety_comment(reg));
        w.open("unsafe");
        w.line("let current = core::ptr::read_volatile(reg);");
        w.line(format!(
            "core::ptr::write_volatile(reg, f({}));",
            modify_base(reg, plan)
        ));
        w.close();
        w.close();
    }

    if ctx.config.field_accessors {
        for (index, field) in reg.fields.iter().enumerate() {
            if field.access.is_readable() {
                w.blank();
                getter(&mut w, reg, field, &ptr);
            }
            if field.access.is_writable() && plan.is_reachable(index) {
                w.blank();
                setter(&mut w, reg, field, plan, &ptr);
            }
        }
    }

    w.close();
    w.finish()
}

/// The value handed to a `modify` closure.
fn modify_base(reg: &Register, plan: &RegisterPlan) -> String {
    if plan.preserve_mask == reg.width.full_mask() && plan.fill == 0 {
        return "current".to_string();
    }
    let mut terms = vec![format!("current & {}", literal(plan.preserve_mask))];
    if plan.fill != 0 {
        terms.push(literal(plan.fill));
    }
    join_terms(terms)
}

fn read_discipline_doc(w: &mut CodeWriter, read: ReadDiscipline, name: &str) {
    match read {
        ReadDiscipline::Volatile => {
            w.doc("");
            w.doc(format!(
                "Hardware may change `{name}` at any time; every call is a fresh volatile read."
            ));
        }
        ReadDiscipline::Destructive => {
            w.doc("");
            w.doc(format!(
                "Reading `{name}` clears its read-to-clear fields."
            ));
        }
        ReadDiscipline::Stable | ReadDiscipline::None => {}
    }
}

pub(super) fn synchronization_doc(w: &mut CodeWriter, plan: &RegisterPlan, name: &str) {
    if !plan.requires_serialization() {
        return;
    }
    w.doc("");
    w.doc("# Synchronization");
    w.doc("");
    w.doc(format!(
        "The read and the write-back of `{name}` are separate bus accesses.\n\
         `{name}` is shared by: {}. Code reaching it through more than one\n\
         handle, or from interrupt context, must serialize these accesses.",
        plan.sharers().join(", ")
    ));
}

fn field_title(reg: &Register, field: &BitField) -> String {
    format!("`{}.{}` ({})", reg.name, field.name, field.bit_range())
}

fn field_value_type(reg: &Register, field: &BitField) -> &'static str {
    if field.bit_width == 1 {
        "bool"
    } else {
        reg.width.rust_type()
    }
}

fn getter(w: &mut CodeWriter, reg: &Register, field: &BitField, ptr: &str) {
    let out = field_value_type(reg, field);
    w.doc(format!("Reads {}.", field_title(reg, field)));
    if let Some(desc) = &field.description {
        w.doc("");
        w.doc(desc);
    }
    if field.access.has_read_side_effect() {
        w.doc("");
        w.doc("Reading clears this field.");
    }
    w.open(format!(
        "pub fn {}_{}(&mut self) -> {out}",
        reg.ident, field.ident
    ));
    w.line(format!("let reg = {ptr};"));
    w.line(safety_comment(reg));
    w.line("let value = unsafe { core::ptr::read_volatile(reg) };");
    w.line(extracted_bits("value", field, reg.width, out));
    w.close();
}

fn setter(w: &mut CodeWriter, reg: &Register, field: &BitField, plan: &RegisterPlan, ptr: &str) {
    let param = field_value_type(reg, field);
    let recipe = plan.write_recipe(field.mask());

    w.doc(format!("Writes {}.", field_title(reg, field)));
    w.doc("");
    match field.access.write_effect() {
        WriteEffect::SetOnOne => w.doc("Writing 1 sets the field; 0 has no effect."),
        WriteEffect::ClearOnOne => w.doc("Writing 1 clears the field; 0 has no effect."),
        WriteEffect::Store | WriteEffect::None => {}
    }
    match plan.strategy {
        AccessStrategy::ReadModifyWrite => w.doc("Other fields keep their current value."),
        AccessStrategy::DirectWrite if recipe.constant != 0 => {
            w.doc("Write-only fields are rewritten with their reset value.")
        }
        _ => {}
    }
    if field.bit_width > 1 {
        w.doc("Bits of `value` beyond the field width are ignored.");
    }
    synchronization_doc(w, plan, &reg.name);

    w.open(format!(
        "pub fn set_{}_{}(&mut self, value: {param})",
        reg.ident, field.ident
    ));
    let bits = shifted_bits("value", param, field, reg.width);
    write_statements(w, reg, ptr, &recipe, &bits);
    w.close();
}
