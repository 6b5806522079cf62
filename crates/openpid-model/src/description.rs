//! The validated peripheral description handed to the generator.
//!
//! These types mirror the openPID schema one-to-one and carry no invariants
//! of their own: syntax and schema checks happen upstream, consistency checks
//! happen in [`crate::builder::build_model`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::access::AccessMode;
use crate::error::DescriptionError;
use crate::payload::{Endianness, Signing};

/// A peripheral as described by an openPID document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PeripheralDescription {
    /// Peripheral name (e.g., "GPIOA", "USART1").
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Document version; becomes the generated crate's version.
    #[serde(default)]
    pub version: Option<String>,
    pub base_address: u64,
    /// Target word size in bits.
    #[serde(default = "default_word_size")]
    pub word_size: u32,
    /// Capability hint tags (e.g., "gpio", "pwm").
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub registers: Vec<RegisterDescription>,
    /// Packets the peripheral transmits over its serial data path.
    #[serde(default)]
    pub payloads: Vec<PayloadDescription>,
}

fn default_word_size() -> u32 {
    32
}

/// A register entry of a description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RegisterDescription {
    pub name: String,
    /// Byte offset from the peripheral base address.
    pub offset: u64,
    /// Width in bits.
    pub width: u32,
    pub access: AccessMode,
    /// Whether hardware may change the value between two reads.
    #[serde(default = "default_volatile")]
    pub volatile: bool,
    #[serde(default)]
    pub reset: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDescription>,
}

fn default_volatile() -> bool {
    true
}

/// A bit-field entry of a register description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldDescription {
    pub name: String,
    pub bit_offset: u32,
    pub bit_width: u32,
    /// Semantic role (e.g., "output", "status", "data").
    #[serde(default)]
    pub role: Option<String>,
    /// Overrides the register's access mode for this field.
    #[serde(default)]
    pub access: Option<AccessMode>,
    #[serde(default)]
    pub reset: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A transmitted packet: its segments are sent in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PayloadDescription {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub segments: Vec<SegmentDescription>,
}

/// Data type of a fixed-size packet segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentType {
    /// Opaque bytes supplied by the caller.
    Raw,
    /// Bytes fixed by the description.
    Const,
    Integer,
    #[serde(alias = "utf8")]
    String,
    /// IEEE 754 float.
    Float,
}

/// One fixed-size segment of a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SegmentDescription {
    pub name: String,
    /// Size on the wire in bits.
    pub bits: u32,
    #[serde(rename = "type")]
    pub ty: SegmentType,
    /// Content of a `const` segment.
    #[serde(default)]
    pub data: Option<Vec<u8>>,
    /// Byte order of integers and floats (big-endian when omitted).
    #[serde(default)]
    pub endianness: Option<Endianness>,
    /// Integer encoding (unsigned when omitted).
    #[serde(default)]
    pub signing: Option<Signing>,
    #[serde(default)]
    pub description: Option<String>,
}

impl SegmentDescription {
    pub fn new(name: impl Into<String>, bits: u32, ty: SegmentType) -> Self {
        Self {
            name: name.into(),
            bits,
            ty,
            data: None,
            endianness: None,
            signing: None,
            description: None,
        }
    }

    pub fn with_data(mut self, data: &[u8]) -> Self {
        self.data = Some(data.to_vec());
        self
    }

    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = Some(endianness);
        self
    }

    pub fn with_signing(mut self, signing: Signing) -> Self {
        self.signing = Some(signing);
        self
    }
}

impl PeripheralDescription {
    /// Parse a description from TOML text.
    pub fn from_toml_str(input: &str) -> Result<Self, DescriptionError> {
        Ok(toml::from_str(input)?)
    }

    /// Load a description from a TOML file.
    pub fn load(path: &Path) -> Result<Self, DescriptionError> {
        if !path.exists() {
            return Err(DescriptionError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

impl RegisterDescription {
    /// Convenience constructor used by loaders and tests.
    pub fn new(name: impl Into<String>, offset: u64, width: u32, access: AccessMode) -> Self {
        Self {
            name: name.into(),
            offset,
            width,
            access,
            volatile: true,
            reset: None,
            description: None,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDescription) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_reset(mut self, reset: u64) -> Self {
        self.reset = Some(reset);
        self
    }

    pub fn non_volatile(mut self) -> Self {
        self.volatile = false;
        self
    }
}

impl FieldDescription {
    /// Convenience constructor used by loaders and tests.
    pub fn new(name: impl Into<String>, bit_offset: u32, bit_width: u32) -> Self {
        Self {
            name: name.into(),
            bit_offset,
            bit_width,
            role: None,
            access: None,
            reset: None,
            description: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_access(mut self, access: AccessMode) -> Self {
        self.access = Some(access);
        self
    }

    pub fn with_reset(mut self, reset: u64) -> Self {
        self.reset = Some(reset);
        self
    }
}
