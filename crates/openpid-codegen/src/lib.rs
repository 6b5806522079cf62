//! Access planning and embedded-hal code emission for openPID peripherals.
//!
//! [`generate`] runs the whole core for one peripheral description:
//! the hardware model is built, matched against a [`ContractRegistry`],
//! every register gets an [`AccessPlan`] entry, and the emitter renders an
//! ordered list of [`EmissionUnit`]s plus an [`EmissionReport`]. Bindings the
//! planner cannot satisfy are demoted and their registers fall back to raw
//! accessors; only an inconsistent description is fatal. Described payloads
//! get `send_*` writers on top of a matched byte-writing capability.
//!
//! [`ContractRegistry`]: openpid_contracts::ContractRegistry

pub mod config;
pub mod emit;
pub mod error;
pub mod pipeline;
pub mod plan;
pub mod report;

pub use config::GeneratorConfig;
pub use emit::{emit_units, EmissionUnit, Provenance, UnitKind};
pub use error::{ConfigError, GenerationError, PlanError, Result};
pub use pipeline::{generate, GenerationOutput};
pub use plan::{
    plan_access, AccessPlan, AccessStrategy, Reach, ReadDiscipline, RegisterPlan, Serialization,
    WriteRecipe, RAW_ACCESSOR,
};
pub use report::{
    fingerprint, CapabilityEntry, EmissionReport, PayloadEntry, RegisterEntry, UnitCounts,
};
