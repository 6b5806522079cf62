//! The hardware model: the validated IR every later stage consults.
//!
//! A [`PeripheralModel`] owns its registers, a [`Register`] owns its fields.
//! Registers and fields keep their declaration order, which every later
//! stage relies on for deterministic output. Other stages refer to a field
//! through a [`FieldRef`] (register index, field index) rather than by
//! borrowing it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::access::{bit_mask, AccessMode, RegisterWidth};
use crate::payload::Payload;

/// A normalized (lowercase, trimmed) semantic role name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub fn new(name: &str) -> Self {
        Role(name.trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this role equals `name` after normalization.
    pub fn is(&self, name: &str) -> bool {
        self.0 == name.trim().to_ascii_lowercase()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position of a field inside a model: (register index, field index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldRef {
    pub register: usize,
    pub field: usize,
}

impl FieldRef {
    pub fn new(register: usize, field: usize) -> Self {
        Self { register, field }
    }
}

/// A bit-field within a register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitField {
    pub name: String,
    /// snake_case identifier used in generated code.
    pub ident: String,
    pub bit_offset: u32,
    pub bit_width: u32,
    pub role: Option<Role>,
    /// Effective access (the register's mode unless overridden).
    pub access: AccessMode,
    pub reset: Option<u64>,
    pub description: Option<String>,
}

impl BitField {
    /// Mask of this field's bits within the register.
    pub fn mask(&self) -> u64 {
        bit_mask(self.bit_offset, self.bit_width)
    }

    /// One past the highest bit of this field.
    pub fn bit_end(&self) -> u32 {
        self.bit_offset + self.bit_width
    }

    /// Largest value the field can hold.
    pub fn max_value(&self) -> u64 {
        bit_mask(0, self.bit_width)
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.role.as_ref().is_some_and(|r| r.is(name))
    }

    /// Human-readable bit range, e.g. `bit 3` or `bits 4..8`.
    pub fn bit_range(&self) -> String {
        if self.bit_width == 1 {
            format!("bit {}", self.bit_offset)
        } else {
            format!("bits {}..{}", self.bit_offset, self.bit_end())
        }
    }
}

/// A memory-mapped register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    pub name: String,
    /// snake_case identifier used in generated code.
    pub ident: String,
    /// Byte offset from the peripheral base address.
    pub offset: u64,
    pub width: RegisterWidth,
    pub access: AccessMode,
    pub fields: Vec<BitField>,
    /// Whether re-reads may observe changes made by hardware.
    pub volatile: bool,
    pub reset: Option<u64>,
    pub description: Option<String>,
}

impl Register {
    /// One past the last byte occupied by this register, saturating at
    /// `u64::MAX`. The builder rejects registers where that would happen.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.width.bytes())
    }

    pub fn field(&self, name: &str) -> Option<&BitField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Bits not covered by any field.
    pub fn reserved_mask(&self) -> u64 {
        let used = self.fields.iter().fold(0, |acc, f| acc | f.mask());
        self.width.full_mask() & !used
    }

    /// Whether a single field spans every bit of the register.
    pub fn is_single_full_field(&self) -> bool {
        self.fields.len() == 1 && self.fields[0].mask() == self.width.full_mask()
    }
}

/// The root IR node for one peripheral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeripheralModel {
    pub name: String,
    /// snake_case identifier (module name).
    pub ident: String,
    /// CamelCase identifier (handle type name).
    pub type_ident: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub base_address: u64,
    /// Target word size in bits.
    pub word_size: u32,
    pub registers: Vec<Register>,
    /// Declared capability hint tags, normalized to lowercase.
    pub hints: Vec<String>,
    pub payloads: Vec<Payload>,
}

impl PeripheralModel {
    pub fn register(&self, index: usize) -> Option<&Register> {
        self.registers.get(index)
    }

    pub fn register_by_name(&self, name: &str) -> Option<&Register> {
        self.registers.iter().find(|r| r.name == name)
    }

    /// Resolve a field reference.
    pub fn field(&self, at: FieldRef) -> Option<&BitField> {
        self.registers.get(at.register)?.fields.get(at.field)
    }

    /// `REGISTER.FIELD` path for diagnostics.
    pub fn field_path(&self, at: FieldRef) -> String {
        match (self.registers.get(at.register), self.field(at)) {
            (Some(reg), Some(field)) => format!("{}.{}", reg.name, field.name),
            _ => format!("<invalid field {}:{}>", at.register, at.field),
        }
    }

    /// Iterate over every field with its reference, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (FieldRef, &BitField)> + '_ {
        self.registers.iter().enumerate().flat_map(|(r, reg)| {
            reg.fields
                .iter()
                .enumerate()
                .map(move |(f, field)| (FieldRef::new(r, f), field))
        })
    }

    pub fn has_hint(&self, tag: &str) -> bool {
        let tag = tag.to_ascii_lowercase();
        self.hints.iter().any(|h| *h == tag)
    }

    pub fn field_count(&self) -> usize {
        self.registers.iter().map(|r| r.fields.len()).sum()
    }
}
