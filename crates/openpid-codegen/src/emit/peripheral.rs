//! The peripheral handle: struct, constructors and the pointer helper.

use super::writer::{literal, CodeWriter};
use super::EmitContext;

pub(super) fn render(ctx: &EmitContext<'_>) -> String {
    let model = ctx.model;
    let name = &ctx.type_name;
    let mut w = CodeWriter::new();

    match &model.description {
        Some(desc) => w.doc(format!("{}: {desc}", model.name)),
        None => w.doc(format!("{} register block.", model.name)),
    }
    w.doc("");
    w.doc(
        "Every accessor takes `&mut self`, so one handle never interleaves\n\
         two register accesses. Creating more than one handle for the same\n\
         block moves that obligation to the caller.",
    );
    w.open(format!("pub struct {name}"));
    w.line("base: usize,");
    w.close();
    w.blank();

    w.open(format!("impl {name}"));
    w.doc("Base address of the register block.");
    w.line(format!(
        "pub const BASE_ADDRESS: usize = {};",
        literal(model.base_address)
    ));
    w.blank();

    w.doc("Handle for the block at [`Self::BASE_ADDRESS`].");
    w.doc("");
    w.doc("# Safety");
    w.doc("");
    w.doc(
        "The address must map this peripheral, and no other handle for it may\n\
         be in use while this one exists.",
    );
    w.open("pub const unsafe fn new() -> Self");
    w.line("Self {");
    w.line("    base: Self::BASE_ADDRESS,");
    w.line("}");
    w.close();
    w.blank();

    w.doc("Handle for the same register layout at another base address.");
    w.doc("");
    w.doc("# Safety");
    w.doc("");
    w.doc(
        "`base` must map a block with this layout, aligned for its widest\n\
         register, and no other handle for it may be in use while this one exists.",
    );
    w.open("pub const unsafe fn new_at(base: usize) -> Self");
    w.line("Self { base }");
    w.close();
    w.blank();

    w.line("#[allow(dead_code)]");
    w.line("#[inline(always)]");
    w.open("fn register<T>(&self, offset: usize) -> *mut T");
    w.line("(self.base + offset) as *mut T");
    w.close();
    w.close();
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use openpid_model::{build_model, PeripheralDescription};

    #[test]
    fn handle_with_constructors() {
        let mut desc = PeripheralDescription {
            name: "GPIOA".into(),
            description: Some("General purpose I/O".into()),
            version: None,
            base_address: 0x4002_0000,
            word_size: 32,
            capabilities: vec![],
            registers: vec![],
            payloads: Vec::new(),
        };
        let model = build_model(&desc).unwrap();
        let config = GeneratorConfig::default();
        let source = render(&EmitContext::new(&model, &config));
        assert!(source.starts_with("/// GPIOA: General purpose I/O\n"));
        assert!(source.contains("pub struct Gpioa {\n    base: usize,\n}"));
        assert!(source.contains("pub const BASE_ADDRESS: usize = 0x4002_0000;"));
        assert!(source.contains("pub const unsafe fn new() -> Self {"));
        assert!(source.contains("pub const unsafe fn new_at(base: usize) -> Self {"));
        assert!(source.contains("/// # Safety"));

        desc.description = None;
        let model = build_model(&desc).unwrap();
        let config = GeneratorConfig {
            struct_name: Some("PortA".into()),
            ..GeneratorConfig::default()
        };
        let source = render(&EmitContext::new(&model, &config));
        assert!(source.contains("pub struct PortA {"));
        assert!(source.contains("impl PortA {"));
    }
}
