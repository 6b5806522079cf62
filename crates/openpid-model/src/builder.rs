//! IR builder: turns a validated description into a [`PeripheralModel`].
//!
//! Checks performed, in order (the first violation is returned):
//! 1. Target word size is 8, 16, 32 or 64
//! 2. Base address and every register fit the target address space
//! 3. Register widths are supported and addresses are width-aligned
//! 4. No two registers overlap in address range
//! 5. Fields have non-zero width, fit their register and do not overlap
//! 6. Field access is compatible with the register's access
//! 7. Reset values fit their register or field
//! 8. Payload segments have a size their data type can be encoded in
//! 9. Generated identifiers, including every emitted accessor name, are unique
//!
//! The input description is never mutated and declaration order is kept.

use std::collections::BTreeMap;

use crate::access::{bit_mask, RegisterWidth};
use crate::description::{
    FieldDescription, PayloadDescription, PeripheralDescription, RegisterDescription,
    SegmentDescription, SegmentType,
};
use crate::error::{ModelError, Result};
use crate::model::{BitField, PeripheralModel, Register, Role};
use crate::naming::{camel_case, snake_case};
use crate::payload::{Payload, Segment, SegmentKind, Signing};

/// Build the hardware model for a peripheral description.
pub fn build_model(desc: &PeripheralDescription) -> Result<PeripheralModel> {
    if RegisterWidth::from_bits(desc.word_size).is_none() {
        return Err(ModelError::InvalidWordSize {
            bits: desc.word_size,
        });
    }

    let address_bits = address_bits(desc.word_size);
    if desc.base_address > address_limit(address_bits) {
        return Err(ModelError::BaseAddressOutOfRange {
            address: desc.base_address,
            address_bits,
        });
    }

    let ident = identifier(&desc.name, snake_case(&desc.name))?;
    let type_ident = identifier(&desc.name, camel_case(&desc.name))?;

    let mut registers = Vec::with_capacity(desc.registers.len());
    for reg in &desc.registers {
        registers.push(build_register(desc.base_address, address_bits, reg)?);
    }

    check_register_overlap(&registers)?;

    let mut payloads = Vec::with_capacity(desc.payloads.len());
    for payload in &desc.payloads {
        payloads.push(build_payload(payload)?);
    }
    check_identifiers(&registers, &payloads)?;

    let mut hints: Vec<String> = Vec::new();
    for hint in &desc.capabilities {
        let hint = hint.trim().to_ascii_lowercase();
        if !hint.is_empty() && !hints.contains(&hint) {
            hints.push(hint);
        }
    }

    Ok(PeripheralModel {
        name: desc.name.clone(),
        ident,
        type_ident,
        description: desc.description.clone(),
        version: desc.version.clone(),
        base_address: desc.base_address,
        word_size: desc.word_size,
        registers,
        hints,
        payloads,
    })
}

/// Width of a target `usize`; 8-bit cores still address 16 bits.
fn address_bits(word_size: u32) -> u32 {
    word_size.max(16)
}

/// Highest address representable in `bits`.
fn address_limit(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

fn identifier(name: &str, ident: String) -> Result<String> {
    if ident.is_empty() {
        return Err(ModelError::EmptyIdentifier {
            name: name.to_string(),
        });
    }
    Ok(ident)
}

fn build_register(
    base_address: u64,
    address_bits: u32,
    reg: &RegisterDescription,
) -> Result<Register> {
    let width = RegisterWidth::from_bits(reg.width).ok_or_else(|| {
        ModelError::InvalidRegisterWidth {
            register: reg.name.clone(),
            width: reg.width,
        }
    })?;

    // Last byte of the register, as an absolute address.
    let last = base_address
        .checked_add(reg.offset)
        .and_then(|address| address.checked_add(width.bytes() - 1))
        .filter(|&last| last <= address_limit(address_bits));
    if last.is_none() || reg.offset.checked_add(width.bytes()).is_none() {
        return Err(ModelError::AddressOutOfRange {
            register: reg.name.clone(),
            offset: reg.offset,
            address_bits,
        });
    }

    let address = base_address + reg.offset;
    if address % width.bytes() != 0 {
        return Err(ModelError::MisalignedRegister {
            register: reg.name.clone(),
            address,
            width: reg.width,
        });
    }

    if let Some(reset) = reg.reset {
        if reset & !width.full_mask() != 0 {
            return Err(ModelError::ResetOutOfRange {
                location: reg.name.clone(),
                value: reset,
                width: reg.width,
            });
        }
    }

    let mut fields: Vec<BitField> = Vec::with_capacity(reg.fields.len());
    for field in &reg.fields {
        let built = build_field(reg, width, field)?;
        if let Some(other) = fields.iter().find(|f| f.mask() & built.mask() != 0) {
            return Err(ModelError::OverlappingFields {
                register: reg.name.clone(),
                first: other.name.clone(),
                second: built.name.clone(),
            });
        }
        fields.push(built);
    }

    Ok(Register {
        name: reg.name.clone(),
        ident: identifier(&reg.name, snake_case(&reg.name))?,
        offset: reg.offset,
        width,
        access: reg.access,
        fields,
        volatile: reg.volatile,
        reset: reg.reset,
        description: reg.description.clone(),
    })
}

fn build_field(
    reg: &RegisterDescription,
    width: RegisterWidth,
    field: &FieldDescription,
) -> Result<BitField> {
    if field.bit_width == 0 {
        return Err(ModelError::ZeroWidthField {
            register: reg.name.clone(),
            field: field.name.clone(),
        });
    }

    let bit_end = field.bit_offset.saturating_add(field.bit_width);
    if bit_end > width.bits() {
        return Err(ModelError::FieldOutOfRange {
            register: reg.name.clone(),
            field: field.name.clone(),
            bit_offset: field.bit_offset,
            bit_end,
            register_width: width.bits(),
        });
    }

    let access = field.access.unwrap_or(reg.access);
    if !reg.access.admits(access) {
        return Err(ModelError::FieldAccessConflict {
            register: reg.name.clone(),
            field: field.name.clone(),
            field_access: access,
            register_access: reg.access,
        });
    }

    let reset = match (field.reset, reg.reset) {
        (Some(reset), _) => {
            if reset & !bit_mask(0, field.bit_width) != 0 {
                return Err(ModelError::ResetOutOfRange {
                    location: format!("{}.{}", reg.name, field.name),
                    value: reset,
                    width: field.bit_width,
                });
            }
            Some(reset)
        }
        (None, Some(reg_reset)) => {
            Some((reg_reset & bit_mask(field.bit_offset, field.bit_width)) >> field.bit_offset)
        }
        (None, None) => None,
    };

    Ok(BitField {
        name: field.name.clone(),
        ident: identifier(&field.name, snake_case(&field.name))?,
        bit_offset: field.bit_offset,
        bit_width: field.bit_width,
        role: field
            .role
            .as_deref()
            .map(Role::new)
            .filter(|r| !r.as_str().is_empty()),
        access,
        reset,
        description: field.description.clone(),
    })
}

fn build_payload(payload: &PayloadDescription) -> Result<Payload> {
    let mut segments: Vec<Segment> = Vec::with_capacity(payload.segments.len());
    for seg in &payload.segments {
        let built = build_segment(&payload.name, seg)?;
        if built.kind.is_argument() {
            if let Some(other) = segments
                .iter()
                .find(|s| s.kind.is_argument() && s.ident == built.ident)
            {
                return Err(ModelError::IdentifierCollision {
                    first: format!("{}.{}", payload.name, other.name),
                    second: format!("{}.{}", payload.name, built.name),
                    identifier: built.ident,
                });
            }
        }
        segments.push(built);
    }
    Ok(Payload {
        name: payload.name.clone(),
        ident: identifier(&payload.name, snake_case(&payload.name))?,
        description: payload.description.clone(),
        segments,
    })
}

fn build_segment(payload: &str, seg: &SegmentDescription) -> Result<Segment> {
    let invalid = |reason: String| ModelError::InvalidSegment {
        payload: payload.to_string(),
        segment: seg.name.clone(),
        reason,
    };
    if seg.bits == 0 {
        return Err(invalid("has zero width".into()));
    }

    let endianness = seg.endianness.unwrap_or_default();
    let kind = match seg.ty {
        SegmentType::Raw => SegmentKind::Raw,
        SegmentType::Const => {
            let data = seg
                .data
                .clone()
                .ok_or_else(|| invalid("constant segment without data".into()))?;
            if data.len() as u64 * 8 != u64::from(seg.bits) {
                return Err(invalid(format!(
                    "carries {} bytes but declares {} bits",
                    data.len(),
                    seg.bits
                )));
            }
            SegmentKind::Const { data }
        }
        SegmentType::Integer => {
            if !matches!(seg.bits, 8 | 16 | 32 | 64) {
                return Err(invalid(format!(
                    "{}-bit integers are not supported (expected 8, 16, 32 or 64)",
                    seg.bits
                )));
            }
            let signed = match seg.signing.unwrap_or_default() {
                Signing::Unsigned => false,
                Signing::TwosComplement => true,
                Signing::OnesComplement => {
                    return Err(invalid("ones' complement integers are not supported".into()))
                }
            };
            SegmentKind::Integer { endianness, signed }
        }
        SegmentType::String => {
            if seg.bits % 8 != 0 {
                return Err(invalid("strings must be a whole number of bytes".into()));
            }
            SegmentKind::Utf8
        }
        SegmentType::Float => {
            if !matches!(seg.bits, 32 | 64) {
                return Err(invalid(format!(
                    "{}-bit floats are not supported (expected 32 or 64)",
                    seg.bits
                )));
            }
            SegmentKind::Float { endianness }
        }
    };

    Ok(Segment {
        name: seg.name.clone(),
        ident: identifier(&seg.name, snake_case(&seg.name))?,
        bits: seg.bits,
        kind,
        description: seg.description.clone(),
    })
}

/// Pairwise address-range overlap check, reported in declaration order.
fn check_register_overlap(registers: &[Register]) -> Result<()> {
    for (i, a) in registers.iter().enumerate() {
        for b in &registers[i + 1..] {
            if a.offset < b.end() && b.offset < a.end() {
                return Err(ModelError::OverlappingRegisters {
                    first: a.name.clone(),
                    first_offset: a.offset,
                    first_end: a.end(),
                    second: b.name.clone(),
                    second_offset: b.offset,
                    second_end: b.end(),
                });
            }
        }
    }
    Ok(())
}

/// Inherent items of the generated handle that accessors must not shadow.
const HANDLE_METHODS: [&str; 3] = ["new", "new_at", "register"];

/// Byte-level helper shared by the payload writers.
pub const SEND_BYTES: &str = "send_bytes";

/// First owner of each generated name.
#[derive(Default)]
struct Claims(BTreeMap<String, String>);

impl Claims {
    fn claim(&mut self, ident: String, owner: String) -> Result<()> {
        if let Some(first) = self.0.get(&ident) {
            return Err(ModelError::IdentifierCollision {
                first: first.clone(),
                second: owner,
                identifier: ident,
            });
        }
        self.0.insert(ident, owner);
        Ok(())
    }
}

/// Register identifiers must be unique, and so must every method emitted on
/// the handle: `read_`/`write_`/`modify_{register}`, the field getters
/// `{register}_{field}`, the setters `set_{register}_{field}` and, when there
/// are payloads, `send_{payload}` plus the shared `send_bytes`.
fn check_identifiers(registers: &[Register], payloads: &[Payload]) -> Result<()> {
    let mut idents = Claims::default();
    for reg in registers {
        idents.claim(reg.ident.clone(), reg.name.clone())?;
    }

    let mut methods = Claims::default();
    for name in HANDLE_METHODS {
        methods.claim(name.to_string(), format!("handle method `{name}`"))?;
    }
    for reg in registers {
        for prefix in ["read", "write", "modify"] {
            methods.claim(format!("{prefix}_{}", reg.ident), reg.name.clone())?;
        }
        for field in &reg.fields {
            let stem = format!("{}_{}", reg.ident, field.ident);
            let owner = format!("{}.{}", reg.name, field.name);
            methods.claim(stem.clone(), owner.clone())?;
            methods.claim(format!("set_{stem}"), owner)?;
        }
    }
    if !payloads.is_empty() {
        methods.claim(SEND_BYTES.to_string(), "payload writer `send_bytes`".to_string())?;
    }
    for payload in payloads {
        methods.claim(format!("send_{}", payload.ident), payload.name.clone())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessMode;
    use crate::model::FieldRef;
    use crate::payload::Endianness;

    fn peripheral(registers: Vec<RegisterDescription>) -> PeripheralDescription {
        PeripheralDescription {
            name: "GPIOA".into(),
            description: None,
            version: None,
            base_address: 0x4002_0000,
            word_size: 32,
            capabilities: vec!["GPIO".into(), "gpio".into()],
            registers,
            payloads: Vec::new(),
        }
    }

    #[test]
    fn builds_model_in_declaration_order() {
        let desc = peripheral(vec![
            RegisterDescription::new("ODR", 0x14, 32, AccessMode::ReadWrite)
                .with_field(FieldDescription::new("OD1", 1, 1).with_role("Output"))
                .with_field(FieldDescription::new("OD0", 0, 1).with_role("output")),
            RegisterDescription::new("IDR", 0x10, 32, AccessMode::ReadOnly),
        ]);
        let model = build_model(&desc).unwrap();
        assert_eq!(model.ident, "gpioa");
        assert_eq!(model.type_ident, "Gpioa");
        assert_eq!(model.hints, vec!["gpio".to_string()]);
        assert_eq!(model.registers[0].name, "ODR");
        assert_eq!(model.registers[1].name, "IDR");
        assert_eq!(model.registers[0].fields[0].name, "OD1");
        assert!(model.field(FieldRef::new(0, 0)).unwrap().has_role("output"));
        assert_eq!(model.registers[0].fields[1].access, AccessMode::ReadWrite);
    }

    #[test]
    fn input_is_not_mutated() {
        let desc = peripheral(vec![RegisterDescription::new(
            "CTRL",
            0,
            8,
            AccessMode::ReadWrite,
        )
        .with_field(FieldDescription::new("EN", 0, 1).with_role("ENABLE"))]);
        let before = desc.clone();
        let _ = build_model(&desc).unwrap();
        assert_eq!(desc, before);
    }

    #[test]
    fn registers_at_same_offset_are_rejected() {
        let desc = peripheral(vec![
            RegisterDescription::new("STATUS", 4, 32, AccessMode::ReadOnly),
            RegisterDescription::new("CONTROL", 4, 32, AccessMode::ReadWrite),
        ]);
        let err = build_model(&desc).unwrap_err();
        match err {
            ModelError::OverlappingRegisters { first, second, .. } => {
                assert_eq!(first, "STATUS");
                assert_eq!(second, "CONTROL");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn partially_overlapping_registers_are_rejected() {
        let desc = peripheral(vec![
            RegisterDescription::new("WIDE", 0, 64, AccessMode::ReadWrite),
            RegisterDescription::new("NARROW", 4, 32, AccessMode::ReadWrite),
        ]);
        assert!(matches!(
            build_model(&desc),
            Err(ModelError::OverlappingRegisters { .. })
        ));
    }

    #[test]
    fn adjacent_registers_are_accepted() {
        let desc = peripheral(vec![
            RegisterDescription::new("A", 0, 32, AccessMode::ReadWrite),
            RegisterDescription::new("B", 4, 32, AccessMode::ReadWrite),
        ]);
        assert!(build_model(&desc).is_ok());
    }

    #[test]
    fn overlapping_fields_are_rejected() {
        let desc = peripheral(vec![RegisterDescription::new(
            "CTRL",
            0,
            8,
            AccessMode::ReadWrite,
        )
        .with_field(FieldDescription::new("MODE", 0, 3))
        .with_field(FieldDescription::new("EN", 2, 1))]);
        let err = build_model(&desc).unwrap_err();
        assert_eq!(
            err,
            ModelError::OverlappingFields {
                register: "CTRL".into(),
                first: "MODE".into(),
                second: "EN".into(),
            }
        );
    }

    #[test]
    fn field_exceeding_register_is_rejected() {
        let desc = peripheral(vec![RegisterDescription::new(
            "CTRL",
            0,
            8,
            AccessMode::ReadWrite,
        )
        .with_field(FieldDescription::new("MODE", 6, 4))]);
        assert!(matches!(
            build_model(&desc),
            Err(ModelError::FieldOutOfRange { bit_end: 10, .. })
        ));
    }

    #[test]
    fn zero_width_field_is_rejected() {
        let desc = peripheral(vec![RegisterDescription::new(
            "CTRL",
            0,
            8,
            AccessMode::ReadWrite,
        )
        .with_field(FieldDescription::new("NONE", 0, 0))]);
        assert!(matches!(
            build_model(&desc),
            Err(ModelError::ZeroWidthField { .. })
        ));
    }

    #[test]
    fn unsupported_widths_are_rejected() {
        let desc = peripheral(vec![RegisterDescription::new(
            "ODD",
            0,
            24,
            AccessMode::ReadWrite,
        )]);
        assert!(matches!(
            build_model(&desc),
            Err(ModelError::InvalidRegisterWidth { width: 24, .. })
        ));

        let mut desc = peripheral(vec![]);
        desc.word_size = 12;
        assert!(matches!(
            build_model(&desc),
            Err(ModelError::InvalidWordSize { bits: 12 })
        ));
    }

    #[test]
    fn misaligned_register_is_rejected() {
        let desc = peripheral(vec![RegisterDescription::new(
            "CTRL",
            2,
            32,
            AccessMode::ReadWrite,
        )]);
        assert!(matches!(
            build_model(&desc),
            Err(ModelError::MisalignedRegister { address: 0x4002_0002, .. })
        ));
    }

    #[test]
    fn writable_field_in_read_only_register_is_rejected() {
        let desc = peripheral(vec![RegisterDescription::new(
            "STATUS",
            0,
            32,
            AccessMode::ReadOnly,
        )
        .with_field(FieldDescription::new("EN", 0, 1).with_access(AccessMode::ReadWrite))]);
        assert!(matches!(
            build_model(&desc),
            Err(ModelError::FieldAccessConflict { .. })
        ));
    }

    #[test]
    fn register_reset_distributes_to_fields() {
        let desc = peripheral(vec![RegisterDescription::new(
            "CTRL",
            0,
            16,
            AccessMode::WriteOnly,
        )
        .with_reset(0x0350)
        .with_field(FieldDescription::new("MODE", 4, 4))
        .with_field(FieldDescription::new("PRESCALE", 8, 4).with_reset(0x1))]);
        let model = build_model(&desc).unwrap();
        assert_eq!(model.registers[0].fields[0].reset, Some(0x5));
        assert_eq!(model.registers[0].fields[1].reset, Some(0x1));
    }

    #[test]
    fn oversized_reset_is_rejected() {
        let desc = peripheral(vec![RegisterDescription::new(
            "CTRL",
            0,
            8,
            AccessMode::ReadWrite,
        )
        .with_field(FieldDescription::new("EN", 0, 1).with_reset(2))]);
        assert!(matches!(
            build_model(&desc),
            Err(ModelError::ResetOutOfRange { width: 1, .. })
        ));
    }

    #[test]
    fn colliding_identifiers_are_rejected() {
        let desc = peripheral(vec![
            RegisterDescription::new("Ctrl", 0, 32, AccessMode::ReadWrite),
            RegisterDescription::new("CTRL", 4, 32, AccessMode::ReadWrite),
        ]);
        assert!(matches!(
            build_model(&desc),
            Err(ModelError::IdentifierCollision { .. })
        ));

        let desc = peripheral(vec![
            RegisterDescription::new("A_B", 0, 32, AccessMode::ReadWrite)
                .with_field(FieldDescription::new("C", 0, 1)),
            RegisterDescription::new("A", 4, 32, AccessMode::ReadWrite)
                .with_field(FieldDescription::new("B_C", 0, 1)),
        ]);
        assert!(matches!(
            build_model(&desc),
            Err(ModelError::IdentifierCollision { .. })
        ));
    }

    #[test]
    fn accessor_names_must_not_collide() {
        // `READ.A` gets the getter `read_a`, which is also the reader of `A`.
        let desc = peripheral(vec![
            RegisterDescription::new("A", 0, 32, AccessMode::ReadWrite),
            RegisterDescription::new("READ", 4, 32, AccessMode::ReadWrite)
                .with_field(FieldDescription::new("A", 0, 1)),
        ]);
        assert_eq!(
            build_model(&desc).unwrap_err(),
            ModelError::IdentifierCollision {
                first: "A".into(),
                second: "READ.A".into(),
                identifier: "read_a".into(),
            }
        );

        // `CTRL.EN` has the setter `set_ctrl_en`; `SET_CTRL.EN` the getter.
        let desc = peripheral(vec![
            RegisterDescription::new("CTRL", 0, 32, AccessMode::ReadWrite)
                .with_field(FieldDescription::new("EN", 0, 1)),
            RegisterDescription::new("SET_CTRL", 4, 32, AccessMode::ReadWrite)
                .with_field(FieldDescription::new("EN", 0, 1)),
        ]);
        assert!(matches!(
            build_model(&desc),
            Err(ModelError::IdentifierCollision { identifier, .. }) if identifier == "set_ctrl_en"
        ));

        let desc = peripheral(vec![RegisterDescription::new("NEW", 0, 32, AccessMode::ReadWrite)
            .with_field(FieldDescription::new("AT", 0, 1))]);
        assert!(matches!(
            build_model(&desc),
            Err(ModelError::IdentifierCollision { identifier, .. }) if identifier == "new_at"
        ));
    }

    #[test]
    fn address_overflow_is_an_error() {
        let mut desc = peripheral(vec![
            RegisterDescription::new("Y", 0, 64, AccessMode::ReadWrite),
            RegisterDescription::new("X", u64::MAX - 7, 64, AccessMode::ReadWrite),
        ]);
        desc.base_address = 8;
        desc.word_size = 64;
        assert_eq!(
            build_model(&desc).unwrap_err(),
            ModelError::AddressOutOfRange {
                register: "X".into(),
                offset: u64::MAX - 7,
                address_bits: 64,
            }
        );
    }

    #[test]
    fn addresses_must_fit_the_target() {
        let mut desc = peripheral(vec![]);
        desc.base_address = 0x1_0000_0000;
        assert_eq!(
            build_model(&desc).unwrap_err(),
            ModelError::BaseAddressOutOfRange {
                address: 0x1_0000_0000,
                address_bits: 32,
            }
        );

        let mut desc = peripheral(vec![RegisterDescription::new(
            "LAST",
            0xfffc,
            32,
            AccessMode::ReadWrite,
        )]);
        desc.base_address = 0xffff_0000;
        assert!(build_model(&desc).is_ok());
        desc.registers[0].offset = 0x1_0000;
        assert!(matches!(
            build_model(&desc),
            Err(ModelError::AddressOutOfRange { address_bits: 32, .. })
        ));

        // 8-bit cores still have 16-bit pointers.
        let mut desc = peripheral(vec![RegisterDescription::new("PORTB", 0x25, 8, AccessMode::ReadWrite)]);
        desc.base_address = 0;
        desc.word_size = 8;
        assert!(build_model(&desc).is_ok());
    }

    fn with_payload(segments: Vec<SegmentDescription>) -> PeripheralDescription {
        let mut desc = peripheral(vec![]);
        desc.payloads.push(PayloadDescription {
            name: "Status Frame".into(),
            description: None,
            segments,
        });
        desc
    }

    #[test]
    fn builds_payload_segments() {
        let model = build_model(&with_payload(vec![
            SegmentDescription::new("SYNC", 16, SegmentType::Const).with_data(&[0xAA, 0x55]),
            SegmentDescription::new("Temp", 16, SegmentType::Integer)
                .with_signing(Signing::TwosComplement)
                .with_endianness(Endianness::LittleEndian),
            SegmentDescription::new("Ratio", 32, SegmentType::Float),
        ]))
        .unwrap();
        let payload = &model.payloads[0];
        assert_eq!(payload.ident, "status_frame");
        assert_eq!(payload.bytes(), 8);
        assert_eq!(
            payload.segments[1].kind,
            SegmentKind::Integer {
                endianness: Endianness::LittleEndian,
                signed: true,
            }
        );
        assert_eq!(
            payload.segments[2].kind,
            SegmentKind::Float {
                endianness: Endianness::BigEndian,
            }
        );
    }

    #[test]
    fn unencodable_segments_are_rejected() {
        let cases = [
            SegmentDescription::new("SYNC", 24, SegmentType::Const).with_data(&[0xAA, 0x55]),
            SegmentDescription::new("SYNC", 8, SegmentType::Const),
            SegmentDescription::new("COUNT", 24, SegmentType::Integer),
            SegmentDescription::new("COUNT", 8, SegmentType::Integer)
                .with_signing(Signing::OnesComplement),
            SegmentDescription::new("LABEL", 12, SegmentType::String),
            SegmentDescription::new("RATIO", 16, SegmentType::Float),
            SegmentDescription::new("BLOB", 0, SegmentType::Raw),
        ];
        for seg in cases {
            let err = build_model(&with_payload(vec![seg.clone()])).unwrap_err();
            assert!(
                matches!(&err, ModelError::InvalidSegment { payload, segment, .. }
                    if payload == "Status Frame" && *segment == seg.name),
                "{seg:?} gave {err}"
            );
        }
    }

    #[test]
    fn payload_names_must_not_collide() {
        let err = build_model(&with_payload(vec![
            SegmentDescription::new("Value", 8, SegmentType::Integer),
            SegmentDescription::new("VALUE", 8, SegmentType::Raw),
        ]))
        .unwrap_err();
        assert!(matches!(err, ModelError::IdentifierCollision { identifier, .. } if identifier == "value"));

        // Constants take no parameter, so they may share a name.
        assert!(build_model(&with_payload(vec![
            SegmentDescription::new("PAD", 8, SegmentType::Const).with_data(&[0]),
            SegmentDescription::new("PAD", 8, SegmentType::Const).with_data(&[0]),
        ]))
        .is_ok());

        let mut desc = with_payload(vec![]);
        desc.payloads[0].name = "bytes".into();
        assert!(matches!(
            build_model(&desc),
            Err(ModelError::IdentifierCollision { identifier, .. }) if identifier == "send_bytes"
        ));
    }

    #[test]
    fn punctuation_only_name_is_rejected() {
        let desc = peripheral(vec![RegisterDescription::new(
            "--",
            0,
            32,
            AccessMode::ReadWrite,
        )]);
        assert!(matches!(
            build_model(&desc),
            Err(ModelError::EmptyIdentifier { .. })
        ));
    }
}
