//! Access modes and register widths.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How software may access a register or bit-field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessMode {
    #[serde(alias = "ro")]
    ReadOnly,
    #[serde(alias = "wo")]
    WriteOnly,
    #[serde(alias = "rw")]
    ReadWrite,
    /// Readable; a read clears the bits it returns.
    #[serde(alias = "rc")]
    ReadToClear,
    /// Readable; writing 1 clears a bit, writing 0 has no effect.
    #[serde(alias = "rw1c")]
    ReadWriteOneToClear,
    /// Write-only; writing 1 sets a bit, writing 0 has no effect.
    #[serde(alias = "w1s")]
    WriteOneToSet,
    /// Write-only; writing 1 clears a bit, writing 0 has no effect.
    #[serde(alias = "w1c")]
    WriteOneToClear,
}

/// What a write of a given bit pattern does to the hardware state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteEffect {
    /// Not writable.
    None,
    /// The written value is stored.
    Store,
    /// Bits written as 1 become set; zeros are ignored.
    SetOnOne,
    /// Bits written as 1 become clear; zeros are ignored.
    ClearOnOne,
}

impl AccessMode {
    pub fn is_readable(self) -> bool {
        matches!(
            self,
            AccessMode::ReadOnly
                | AccessMode::ReadWrite
                | AccessMode::ReadToClear
                | AccessMode::ReadWriteOneToClear
        )
    }

    pub fn is_writable(self) -> bool {
        self.write_effect() != WriteEffect::None
    }

    /// Whether reading changes hardware state.
    pub fn has_read_side_effect(self) -> bool {
        self == AccessMode::ReadToClear
    }

    pub fn write_effect(self) -> WriteEffect {
        match self {
            AccessMode::ReadOnly | AccessMode::ReadToClear => WriteEffect::None,
            AccessMode::WriteOnly | AccessMode::ReadWrite => WriteEffect::Store,
            AccessMode::WriteOneToSet => WriteEffect::SetOnOne,
            AccessMode::ReadWriteOneToClear | AccessMode::WriteOneToClear => {
                WriteEffect::ClearOnOne
            }
        }
    }

    /// Writing zero to a field with this mode leaves its hardware state untouched.
    pub fn is_zero_neutral(self) -> bool {
        matches!(
            self.write_effect(),
            WriteEffect::SetOnOne | WriteEffect::ClearOnOne
        )
    }

    /// Whether a field with access `field` can live inside a register with this mode.
    pub fn admits(self, field: AccessMode) -> bool {
        (!field.is_readable() || self.is_readable()) && (!field.is_writable() || self.is_writable())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccessMode::ReadOnly => "read-only",
            AccessMode::WriteOnly => "write-only",
            AccessMode::ReadWrite => "read-write",
            AccessMode::ReadToClear => "read-to-clear",
            AccessMode::ReadWriteOneToClear => "read-write-one-to-clear",
            AccessMode::WriteOneToSet => "write-one-to-set",
            AccessMode::WriteOneToClear => "write-one-to-clear",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Width of a register in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum RegisterWidth {
    W8,
    W16,
    W32,
    W64,
}

impl RegisterWidth {
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(RegisterWidth::W8),
            16 => Some(RegisterWidth::W16),
            32 => Some(RegisterWidth::W32),
            64 => Some(RegisterWidth::W64),
            _ => None,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            RegisterWidth::W8 => 8,
            RegisterWidth::W16 => 16,
            RegisterWidth::W32 => 32,
            RegisterWidth::W64 => 64,
        }
    }

    pub fn bytes(self) -> u64 {
        u64::from(self.bits() / 8)
    }

    /// The unsigned Rust integer type of this width.
    pub fn rust_type(self) -> &'static str {
        match self {
            RegisterWidth::W8 => "u8",
            RegisterWidth::W16 => "u16",
            RegisterWidth::W32 => "u32",
            RegisterWidth::W64 => "u64",
        }
    }

    /// All bits of the register set.
    pub fn full_mask(self) -> u64 {
        bit_mask(0, self.bits())
    }
}

impl From<RegisterWidth> for u32 {
    fn from(width: RegisterWidth) -> u32 {
        width.bits()
    }
}

impl TryFrom<u32> for RegisterWidth {
    type Error = String;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        RegisterWidth::from_bits(bits).ok_or_else(|| format!("unsupported register width {bits}"))
    }
}

impl fmt::Display for RegisterWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Mask covering `width` bits starting at `offset`.
///
/// Bits past 63 are dropped rather than overflowing.
pub fn bit_mask(offset: u32, width: u32) -> u64 {
    if width == 0 || offset >= 64 {
        return 0;
    }
    let ones = if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    };
    ones << offset
}
