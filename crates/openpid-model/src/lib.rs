//! openPID peripheral descriptions and the validated hardware model.
//!
//! ## Modules
//!
//! - [`description`]: The already-validated description handed to the generator
//! - [`access`]: Access modes and register widths
//! - [`model`]: The hardware IR: peripheral, registers, bit-fields
//! - [`payload`]: Transmitted packets and their segments
//! - [`builder`]: Consistency checks that turn a description into a model
//! - [`naming`]: Identifier conversion for generated code
//! - [`error`]: `ModelError` and loader errors

pub mod access;
pub mod builder;
pub mod description;
pub mod error;
pub mod model;
pub mod naming;
pub mod payload;

pub use access::{bit_mask, AccessMode, RegisterWidth, WriteEffect};
pub use builder::{build_model, SEND_BYTES};
pub use description::{
    FieldDescription, PayloadDescription, PeripheralDescription, RegisterDescription,
    SegmentDescription, SegmentType,
};
pub use error::{DescriptionError, ModelError};
pub use model::{BitField, FieldRef, PeripheralModel, Register, Role};
pub use payload::{Endianness, Payload, Segment, SegmentKind, Signing};
