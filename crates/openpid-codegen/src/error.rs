//! Code generation errors.

use std::path::PathBuf;

use openpid_contracts::{RegistryError, UnmetReason};
use openpid_model::{FieldRef, ModelError};
use serde::Serialize;
use thiserror::Error;

/// A register whose access needs cannot be satisfied for a bound operation.
///
/// Never fatal: the operation's match is demoted and the register falls
/// back to raw access with the error recorded as a caveat.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PlanError {
    #[error(
        "{contract}::{operation} writes {register}.{field}, but writing it would clobber \
         {blocker}, whose value cannot be read back or restored"
    )]
    UnreachableField {
        contract: String,
        operation: String,
        register: String,
        field: String,
        blocker: String,
        at: FieldRef,
    },

    #[error(
        "{contract}::{operation} writes {register}.{field}, but the read-modify-write would \
         clear {cleared}"
    )]
    DestructiveReadBack {
        contract: String,
        operation: String,
        register: String,
        field: String,
        cleared: String,
        at: FieldRef,
    },

    #[error(
        "{contract}::{operation} uses {register}.{field}, but the {width}-bit register is wider \
         than the {word_size}-bit target word and cannot be accessed atomically"
    )]
    NonAtomicWidth {
        contract: String,
        operation: String,
        register: String,
        field: String,
        width: u32,
        word_size: u32,
        at: FieldRef,
    },
}

impl PlanError {
    /// The field whose binding must be dropped.
    pub fn field(&self) -> FieldRef {
        match self {
            PlanError::UnreachableField { at, .. }
            | PlanError::DestructiveReadBack { at, .. }
            | PlanError::NonAtomicWidth { at, .. } => *at,
        }
    }

    pub fn register_index(&self) -> usize {
        self.field().register
    }

    /// How the demoted operation is reported in its match result.
    pub fn unmet_reason(&self) -> UnmetReason {
        match self {
            PlanError::UnreachableField {
                register,
                field,
                blocker,
                ..
            } => UnmetReason::Unplannable {
                register: register.clone(),
                field: field.clone(),
                detail: format!("{blocker} has no known reset value"),
            },
            PlanError::DestructiveReadBack {
                register,
                field,
                cleared,
                ..
            } => UnmetReason::Unplannable {
                register: register.clone(),
                field: field.clone(),
                detail: format!("writing it reads the register and clears {cleared}"),
            },
            PlanError::NonAtomicWidth {
                register,
                field,
                width,
                word_size,
                ..
            } => UnmetReason::Unplannable {
                register: register.clone(),
                field: field.clone(),
                detail: format!("{width}-bit access is not atomic on a {word_size}-bit target"),
            },
        }
    }
}

/// Errors loading a generator configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("invalid struct name '{name}': expected a Rust type identifier")]
    InvalidStructName { name: String },

    #[error("invalid error type '{ty}'")]
    InvalidErrorType { ty: String },
}

/// Fatal errors of a generation run.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("inconsistent description: {0}")]
    Model(#[from] ModelError),

    #[error("contract registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for a generation run.
pub type Result<T> = std::result::Result<T, GenerationError>;
