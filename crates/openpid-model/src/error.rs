//! Error types for description loading and model construction.

use std::path::PathBuf;

use crate::access::AccessMode;

/// An inconsistency in a peripheral description that prevents building a model.
///
/// Fatal for the peripheral being generated. Every variant names the
/// offending register (and field, where one is involved).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("unsupported target word size: {bits} bits")]
    InvalidWordSize { bits: u32 },

    #[error("register `{register}` has unsupported width {width} (expected 8, 16, 32 or 64)")]
    InvalidRegisterWidth { register: String, width: u32 },

    #[error("register `{register}` at address 0x{address:X} is not aligned to its {width}-bit width")]
    MisalignedRegister {
        register: String,
        address: u64,
        width: u32,
    },

    #[error("base address 0x{address:X} does not fit a {address_bits}-bit address space")]
    BaseAddressOutOfRange { address: u64, address_bits: u32 },

    #[error(
        "register `{register}` at offset 0x{offset:X} ends beyond the {address_bits}-bit address space"
    )]
    AddressOutOfRange {
        register: String,
        offset: u64,
        address_bits: u32,
    },

    #[error(
        "registers `{first}` (0x{first_offset:X}..0x{first_end:X}) and `{second}` \
         (0x{second_offset:X}..0x{second_end:X}) overlap"
    )]
    OverlappingRegisters {
        first: String,
        first_offset: u64,
        first_end: u64,
        second: String,
        second_offset: u64,
        second_end: u64,
    },

    #[error("field `{register}.{field}` has zero width")]
    ZeroWidthField { register: String, field: String },

    #[error(
        "field `{register}.{field}` (bits {bit_offset}..{bit_end}) exceeds the {register_width}-bit register"
    )]
    FieldOutOfRange {
        register: String,
        field: String,
        bit_offset: u32,
        bit_end: u32,
        register_width: u32,
    },

    #[error("fields `{register}.{first}` and `{register}.{second}` overlap")]
    OverlappingFields {
        register: String,
        first: String,
        second: String,
    },

    #[error("field `{register}.{field}` is {field_access} but its register is {register_access}")]
    FieldAccessConflict {
        register: String,
        field: String,
        field_access: AccessMode,
        register_access: AccessMode,
    },

    #[error("reset value 0x{value:X} of `{location}` does not fit in {width} bits")]
    ResetOutOfRange {
        location: String,
        value: u64,
        width: u32,
    },

    #[error("`{first}` and `{second}` both map to the generated identifier `{identifier}`")]
    IdentifierCollision {
        first: String,
        second: String,
        identifier: String,
    },

    #[error("segment `{payload}.{segment}`: {reason}")]
    InvalidSegment {
        payload: String,
        segment: String,
        reason: String,
    },

    #[error("`{name}` does not produce a usable identifier")]
    EmptyIdentifier { name: String },
}

/// Errors raised while loading a description through the convenience loaders.
#[derive(Debug, thiserror::Error)]
pub enum DescriptionError {
    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error reading the description file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Description file not found.
    #[error("description file not found: {}", path.display())]
    NotFound { path: PathBuf },
}

/// Result type for model construction.
pub type Result<T> = std::result::Result<T, ModelError>;
