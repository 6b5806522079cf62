//! Capability contracts and the capability matcher.
//!
//! A [`ContractRegistry`] is a versioned, ordered set of
//! [`CapabilityContract`]s, each describing one abstraction-layer trait as
//! data. [`match_capabilities`] decides, per contract, whether a
//! [`openpid_model::PeripheralModel`] can implement it fully, partially or
//! not at all.

mod builtin;
pub mod contract;
pub mod error;
pub mod matcher;
pub mod registry;

pub use contract::{
    Argument, CapabilityContract, GuardRequirement, Intent, OperationRequirement, Output,
    OutputKind, Receiver, RoleMatch, ScalarType, WidthRange,
};
pub use error::{RegistryError, Result};
pub use matcher::{
    match_capabilities, MatchResult, MatchSet, MatchStatus, OperationBinding, UnmetReason,
    UnmetRequirement,
};
pub use registry::{ContractRegistry, EMBEDDED_HAL_V1_VERSION};
