//! Registry error types.

/// Errors raised while building or extending a contract registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Two contracts share an id.
    #[error("contract '{id}' is already registered")]
    DuplicateContract { id: String },

    /// Two operations of one contract share a method name.
    #[error("contract '{contract}' declares operation '{operation}' twice")]
    DuplicateOperation { contract: String, operation: String },

    /// A contract requires one that is not registered before it.
    #[error("contract '{contract}' requires unknown contract '{dependency}'")]
    UnknownDependency { contract: String, dependency: String },

    /// A contract with nothing to implement.
    #[error("contract '{contract}' declares no operations")]
    EmptyContract { contract: String },

    /// Width range that no field can satisfy.
    #[error("operation '{contract}::{operation}' has invalid width range {min}..={max}")]
    InvalidWidth {
        contract: String,
        operation: String,
        min: u32,
        max: u32,
    },

    /// A store operation without a value to store.
    #[error("operation '{contract}::{operation}' stores a value but declares no argument")]
    MissingArgument { contract: String, operation: String },

    /// A reading operation whose output type cannot carry the result.
    #[error("operation '{contract}::{operation}' must return {expected}")]
    OutputMismatch {
        contract: String,
        operation: String,
        expected: &'static str,
    },

    /// A guarded or polling operation that cannot report `WouldBlock`.
    #[error("operation '{contract}::{operation}' may block but does not return nb::Result")]
    BlockingWithoutNb { contract: String, operation: String },

    /// An allow-list names a contract the registry does not know.
    #[error("unknown contract '{id}'")]
    UnknownContract { id: String },

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error reading a contract file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
