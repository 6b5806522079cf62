//! Transmitted packets: payloads made of fixed-size segments.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Byte order of a multi-byte segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Endianness {
    #[default]
    #[serde(alias = "big")]
    BigEndian,
    #[serde(alias = "little")]
    LittleEndian,
}

impl Endianness {
    /// The `to_*_bytes` conversion for this byte order.
    pub fn to_bytes_fn(self) -> &'static str {
        match self {
            Endianness::BigEndian => "to_be_bytes",
            Endianness::LittleEndian => "to_le_bytes",
        }
    }
}

/// Integer encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Signing {
    #[default]
    Unsigned,
    TwosComplement,
    /// Described by some devices; no Rust integer type carries it.
    OnesComplement,
}

/// What a segment carries and how it is encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SegmentKind {
    Raw,
    Const { data: Vec<u8> },
    Integer { endianness: Endianness, signed: bool },
    Utf8,
    Float { endianness: Endianness },
}

impl SegmentKind {
    /// Whether the caller supplies this segment's value.
    pub fn is_argument(&self) -> bool {
        !matches!(self, SegmentKind::Const { .. })
    }
}

/// A validated payload segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub name: String,
    /// snake_case parameter name.
    pub ident: String,
    pub bits: u32,
    pub kind: SegmentKind,
    pub description: Option<String>,
}

impl Segment {
    /// Bytes on the wire; a partial last byte counts as a whole one.
    pub fn bytes(&self) -> u32 {
        self.bits.div_ceil(8)
    }

    /// Rust type of the caller-supplied value, `None` for constants.
    pub fn rust_type(&self) -> Option<String> {
        match &self.kind {
            SegmentKind::Raw => Some(format!("&[u8; {}]", self.bytes())),
            SegmentKind::Const { .. } => None,
            SegmentKind::Integer { signed, .. } => {
                Some(format!("{}{}", if *signed { 'i' } else { 'u' }, self.bits))
            }
            SegmentKind::Utf8 => Some("&str".to_string()),
            SegmentKind::Float { .. } => Some(format!("f{}", self.bits)),
        }
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentKind::Raw => f.write_str("raw"),
            SegmentKind::Const { .. } => f.write_str("const"),
            SegmentKind::Integer { signed: true, .. } => f.write_str("signed integer"),
            SegmentKind::Integer { signed: false, .. } => f.write_str("unsigned integer"),
            SegmentKind::Utf8 => f.write_str("utf-8 string"),
            SegmentKind::Float { .. } => f.write_str("float"),
        }
    }
}

/// A validated payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub name: String,
    /// snake_case identifier; the generated method is `send_{ident}`.
    pub ident: String,
    pub description: Option<String>,
    pub segments: Vec<Segment>,
}

impl Payload {
    /// Total bytes on the wire.
    pub fn bytes(&self) -> u32 {
        self.segments.iter().map(Segment::bytes).sum()
    }

    /// Segments the caller supplies a value for.
    pub fn arguments(&self) -> impl Iterator<Item = (&Segment, String)> {
        self.segments
            .iter()
            .filter_map(|seg| seg.rust_type().map(|ty| (seg, ty)))
    }
}
