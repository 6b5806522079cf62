//! Payload writers: one `send_{payload}` method per transmitted packet.
//!
//! Writers sit on top of a byte sink, a Full contract with a non-blocking
//! `u8` store (`serial-write` among the built-ins). Each byte goes through
//! that trait method under `nb::block!`, so the writer inherits its guard.

use openpid_contracts::{
    CapabilityContract, ContractRegistry, Intent, MatchSet, OutputKind, ScalarType,
};
use openpid_model::{Payload, Segment, SegmentKind, SEND_BYTES};

use super::writer::CodeWriter;
use super::EmitContext;

/// The contract and trait method payload bytes are written through.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ByteSink<'a> {
    pub contract: &'a CapabilityContract,
    pub method: &'a str,
}

impl ByteSink<'_> {
    fn error_type(&self) -> String {
        let owner = self
            .contract
            .error_trait
            .as_deref()
            .unwrap_or(&self.contract.trait_path);
        format!("<Self as {owner}>::Error")
    }
}

/// First Full match, in contract order, that can write single bytes.
pub(crate) fn byte_sink<'a>(
    registry: &'a ContractRegistry,
    matches: &MatchSet,
) -> Option<ByteSink<'a>> {
    matches.full().find_map(|result| {
        let contract = registry.get(&result.contract)?;
        let op = contract.operations.iter().find(|op| {
            op.intent == Intent::Store
                && op.output.kind == OutputKind::Nb
                && op.argument.as_ref().is_some_and(|arg| arg.ty == ScalarType::U8)
        })?;
        Some(ByteSink {
            contract,
            method: &op.name,
        })
    })
}

pub(super) fn render(
    ctx: &EmitContext<'_>,
    sink: ByteSink<'_>,
    payload: &Payload,
    with_helper: bool,
) -> String {
    let mut w = CodeWriter::new();
    let error = sink.error_type();
    w.open(format!("impl {}", ctx.type_name));

    if with_helper {
        w.doc(format!(
            "Writes `bytes` in order through `{}::{}`, blocking on each byte.",
            sink.contract.trait_name(),
            sink.method
        ));
        w.open(format!(
            "fn {SEND_BYTES}(&mut self, bytes: &[u8]) -> Result<(), {error}>"
        ));
        w.open("for &byte in bytes");
        w.line(format!(
            "nb::block!(<Self as {}>::{}(self, byte))?;",
            sink.contract.trait_path, sink.method
        ));
        w.close();
        w.line("Ok(())");
        w.close();
        w.blank();
    }

    match &payload.description {
        Some(desc) => w.doc(desc),
        None => w.doc(format!("Sends the `{}` payload.", payload.name)),
    }
    w.doc("");
    w.doc(format!("{} bytes on the wire, in segment order.", payload.bytes()));
    let documented: Vec<&Segment> = payload
        .arguments()
        .map(|(seg, _)| seg)
        .filter(|seg| seg.description.is_some() || seg.kind == SegmentKind::Utf8)
        .collect();
    if !documented.is_empty() {
        w.doc("");
        w.doc("# Arguments");
        w.doc("");
        for seg in documented {
            w.doc(argument_doc(seg));
        }
    }

    let params: Vec<String> = payload
        .arguments()
        .map(|(seg, ty)| format!("{}: {ty}", seg.ident))
        .collect();
    let receiver = std::iter::once("&mut self".to_string())
        .chain(params)
        .collect::<Vec<_>>()
        .join(", ");
    w.open(format!(
        "pub fn send_{}({receiver}) -> Result<(), {error}>",
        payload.ident
    ));
    for seg in &payload.segments {
        segment_write(&mut w, seg);
    }
    w.line("Ok(())");
    w.close();

    w.close();
    w.finish()
}

fn argument_doc(seg: &Segment) -> String {
    let mut text = format!("* `{}`", seg.ident);
    if let Some(desc) = &seg.description {
        text.push_str(&format!(": {}", desc.lines().collect::<Vec<_>>().join(" ")));
    }
    if seg.kind == SegmentKind::Utf8 {
        text.push_str(&format!(
            " (sent as exactly {} bytes, truncated or zero-padded)",
            seg.bytes()
        ));
    }
    text
}

fn segment_write(w: &mut CodeWriter, seg: &Segment) {
    let name = &seg.ident;
    match &seg.kind {
        SegmentKind::Raw => w.line(format!("self.{SEND_BYTES}({name})?;")),
        SegmentKind::Const { data } => {
            let bytes: Vec<String> = data.iter().map(|b| format!("{b:#04x}")).collect();
            w.comment(&seg.name);
            w.line(format!("self.{SEND_BYTES}(&[{}])?;", bytes.join(", ")));
        }
        SegmentKind::Integer { endianness, .. } | SegmentKind::Float { endianness } => {
            w.line(format!(
                "self.{SEND_BYTES}(&{name}.{}())?;",
                endianness.to_bytes_fn()
            ));
        }
        SegmentKind::Utf8 => {
            let size = seg.bytes();
            w.open_scope();
            w.line(format!("let text = {name}.as_bytes();"));
            w.line(format!("let len = text.len().min({size});"));
            w.line(format!("self.{SEND_BYTES}(&text[..len])?;"));
            w.open(format!("for _ in len..{size}"));
            w.line(format!("self.{SEND_BYTES}(&[0])?;"));
            w.close();
            w.close();
        }
    }
}
