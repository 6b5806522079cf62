//! Capability contracts: what an abstraction trait needs from the hardware.
//!
//! A contract is plain data. Each operation names the logical role of the
//! field it drives, the shape that field must have, and the Rust signature
//! the generated method carries. Supporting a new trait means writing a new
//! contract, never touching the matcher.

use serde::{Deserialize, Serialize};

use openpid_model::{AccessMode, BitField, WriteEffect};

/// One abstraction-layer trait and the operations it requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CapabilityContract {
    /// Stable identifier (e.g., `digital-output`).
    pub id: String,
    /// Capability hint tag this contract corresponds to (e.g., `gpio`).
    pub capability: String,
    /// Fully qualified trait path implemented by generated code.
    pub trait_path: String,
    /// Super-trait carrying the associated `Error` type, if any.
    #[serde(default)]
    pub error_trait: Option<String>,
    /// Contracts that must also match Full (super-traits).
    #[serde(default)]
    pub requires: Vec<String>,
    pub operations: Vec<OperationRequirement>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CapabilityContract {
    pub fn operation(&self, name: &str) -> Option<&OperationRequirement> {
        self.operations.iter().find(|op| op.name == name)
    }

    /// Last path segment of the trait, e.g. `OutputPin`.
    pub fn trait_name(&self) -> &str {
        let path = self.trait_path.split('<').next().unwrap_or(&self.trait_path);
        path.rsplit("::").next().unwrap_or(path)
    }
}

/// What a generated method does to its bound field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    /// Drive the field to its asserted (all-ones) state.
    Assert,
    /// Drive the field to its deasserted (zero) state.
    Deassert,
    /// Report whether the field is non-zero.
    TestAsserted,
    /// Report whether the field is zero.
    TestDeasserted,
    /// Write the method argument into the field.
    Store,
    /// Return the field's content.
    Load,
    /// Return the largest value the field can hold.
    Maximum,
    /// Block (`WouldBlock`) until the field reads non-zero.
    Poll,
}

impl Intent {
    /// Whether a field with `access` can carry out this intent.
    pub fn accepts(self, access: AccessMode) -> bool {
        match self {
            Intent::Assert => matches!(
                access.write_effect(),
                WriteEffect::Store | WriteEffect::SetOnOne
            ),
            Intent::Deassert => matches!(
                access.write_effect(),
                WriteEffect::Store | WriteEffect::ClearOnOne
            ),
            Intent::TestAsserted | Intent::TestDeasserted | Intent::Load | Intent::Poll => {
                access.is_readable()
            }
            Intent::Store | Intent::Maximum => access.write_effect() == WriteEffect::Store,
        }
    }

    /// Whether the generated method writes the register.
    pub fn writes(self) -> bool {
        matches!(self, Intent::Assert | Intent::Deassert | Intent::Store)
    }

    /// Whether the generated method reads the register.
    pub fn reads(self) -> bool {
        matches!(
            self,
            Intent::TestAsserted | Intent::TestDeasserted | Intent::Load | Intent::Poll
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Assert => "assert",
            Intent::Deassert => "deassert",
            Intent::TestAsserted => "test-asserted",
            Intent::TestDeasserted => "test-deasserted",
            Intent::Store => "store",
            Intent::Load => "load",
            Intent::Maximum => "maximum",
            Intent::Poll => "poll",
        }
    }
}

/// Inclusive field width range, in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidthRange {
    pub min: u32,
    pub max: u32,
}

impl WidthRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub const fn exactly(bits: u32) -> Self {
        Self::new(bits, bits)
    }

    pub fn contains(&self, bits: u32) -> bool {
        self.min <= bits && bits <= self.max
    }
}

impl Default for WidthRange {
    fn default() -> Self {
        Self::new(1, 64)
    }
}

/// A flag that must be set before an operation may proceed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GuardRequirement {
    pub role: String,
    #[serde(default)]
    pub accepts: Vec<String>,
}

/// How the generated method borrows the peripheral handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Receiver {
    Ref,
    RefMut,
}

impl Receiver {
    pub fn as_str(self) -> &'static str {
        match self {
            Receiver::Ref => "&self",
            Receiver::RefMut => "&mut self",
        }
    }
}

/// Scalar types appearing in trait signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalarType {
    Unit,
    Bool,
    U8,
    U16,
    U32,
}

impl ScalarType {
    pub fn rust_type(self) -> &'static str {
        match self {
            ScalarType::Unit => "()",
            ScalarType::Bool => "bool",
            ScalarType::U8 => "u8",
            ScalarType::U16 => "u16",
            ScalarType::U32 => "u32",
        }
    }

    /// Bits a value of this type can carry.
    pub fn bits(self) -> u32 {
        match self {
            ScalarType::Unit => 0,
            ScalarType::Bool => 1,
            ScalarType::U8 => 8,
            ScalarType::U16 => 16,
            ScalarType::U32 => 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    pub ty: ScalarType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputKind {
    /// `Result<T, Self::Error>`
    Result,
    /// `T`
    Plain,
    /// `nb::Result<T, Self::Error>`
    Nb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub kind: OutputKind,
    pub ty: ScalarType,
}

impl Default for Output {
    fn default() -> Self {
        Self {
            kind: OutputKind::Result,
            ty: ScalarType::Unit,
        }
    }
}

impl Output {
    /// Rendered return type, `None` for a plain unit return.
    pub fn return_type(&self) -> Option<String> {
        let ty = self.ty.rust_type();
        match self.kind {
            OutputKind::Result => Some(format!("Result<{ty}, Self::Error>")),
            OutputKind::Nb => Some(format!("nb::Result<{ty}, Self::Error>")),
            OutputKind::Plain if self.ty == ScalarType::Unit => None,
            OutputKind::Plain => Some(ty.to_string()),
        }
    }

    /// Wrap a value expression the way this output returns it.
    pub fn wrap(&self, value: &str) -> String {
        match self.kind {
            OutputKind::Result | OutputKind::Nb => format!("Ok({value})"),
            OutputKind::Plain => value.to_string(),
        }
    }
}

/// How closely a field's role fits an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleMatch {
    /// The field's role names the operation's role.
    Exact,
    /// The field's role is one the operation accepts by shape.
    Compatible,
}

/// One required operation of a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OperationRequirement {
    /// Method name in the trait.
    pub name: String,
    pub intent: Intent,
    /// Logical role of the field this operation drives.
    pub role: String,
    /// Other roles that are shape-compatible.
    #[serde(default)]
    pub accepts: Vec<String>,
    #[serde(default)]
    pub width: WidthRange,
    #[serde(default)]
    pub guard: Option<GuardRequirement>,
    pub receiver: Receiver,
    #[serde(default)]
    pub argument: Option<Argument>,
    #[serde(default)]
    pub output: Output,
}

impl OperationRequirement {
    /// Role fit of `field`, if any.
    pub fn role_match(&self, field: &BitField) -> Option<RoleMatch> {
        role_fit(field, &self.role, &self.accepts)
    }

    /// Rendered method signature, without the trailing body.
    pub fn signature(&self) -> String {
        let mut sig = format!("fn {}({}", self.name, self.receiver.as_str());
        if let Some(arg) = &self.argument {
            sig.push_str(&format!(", {}: {}", arg.name, arg.ty.rust_type()));
        }
        sig.push(')');
        if let Some(ret) = self.output.return_type() {
            sig.push_str(" -> ");
            sig.push_str(&ret);
        }
        sig
    }
}

impl GuardRequirement {
    pub fn role_match(&self, field: &BitField) -> Option<RoleMatch> {
        role_fit(field, &self.role, &self.accepts)
    }
}

fn role_fit(field: &BitField, role: &str, accepts: &[String]) -> Option<RoleMatch> {
    if field.has_role(role) {
        Some(RoleMatch::Exact)
    } else if accepts.iter().any(|r| field.has_role(r)) {
        Some(RoleMatch::Compatible)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openpid_model::Role;

    fn field(role: &str, access: AccessMode) -> BitField {
        BitField {
            name: "F".into(),
            ident: "f".into(),
            bit_offset: 0,
            bit_width: 1,
            role: Some(Role::new(role)),
            access,
            reset: None,
            description: None,
        }
    }

    fn op(intent: Intent) -> OperationRequirement {
        OperationRequirement {
            name: "set_high".into(),
            intent,
            role: "output".into(),
            accepts: vec!["enable".into()],
            width: WidthRange::exactly(1),
            guard: None,
            receiver: Receiver::RefMut,
            argument: None,
            output: Output::default(),
        }
    }

    #[test]
    fn intent_access_requirements() {
        assert!(Intent::Assert.accepts(AccessMode::ReadWrite));
        assert!(Intent::Assert.accepts(AccessMode::WriteOneToSet));
        assert!(!Intent::Assert.accepts(AccessMode::WriteOneToClear));
        assert!(!Intent::Assert.accepts(AccessMode::ReadOnly));
        assert!(Intent::Deassert.accepts(AccessMode::ReadWriteOneToClear));
        assert!(!Intent::Deassert.accepts(AccessMode::WriteOneToSet));
        assert!(Intent::Load.accepts(AccessMode::ReadToClear));
        assert!(!Intent::Load.accepts(AccessMode::WriteOnly));
        assert!(!Intent::Store.accepts(AccessMode::WriteOneToSet));
    }

    #[test]
    fn role_fit_prefers_exact() {
        let op = op(Intent::Assert);
        assert_eq!(
            op.role_match(&field("Output", AccessMode::ReadWrite)),
            Some(RoleMatch::Exact)
        );
        assert_eq!(
            op.role_match(&field("enable", AccessMode::ReadWrite)),
            Some(RoleMatch::Compatible)
        );
        assert_eq!(op.role_match(&field("status", AccessMode::ReadWrite)), None);
        assert!(RoleMatch::Exact < RoleMatch::Compatible);
    }

    #[test]
    fn signatures() {
        assert_eq!(
            op(Intent::Assert).signature(),
            "fn set_high(&mut self) -> Result<(), Self::Error>"
        );
        let max = OperationRequirement {
            name: "max_duty_cycle".into(),
            receiver: Receiver::Ref,
            output: Output {
                kind: OutputKind::Plain,
                ty: ScalarType::U16,
            },
            ..op(Intent::Maximum)
        };
        assert_eq!(max.signature(), "fn max_duty_cycle(&self) -> u16");
        let write = OperationRequirement {
            name: "write".into(),
            argument: Some(Argument {
                name: "word".into(),
                ty: ScalarType::U8,
            }),
            output: Output {
                kind: OutputKind::Nb,
                ty: ScalarType::Unit,
            },
            ..op(Intent::Store)
        };
        assert_eq!(
            write.signature(),
            "fn write(&mut self, word: u8) -> nb::Result<(), Self::Error>"
        );
    }

    #[test]
    fn trait_name_strips_path_and_generics() {
        let contract = CapabilityContract {
            id: "serial-write".into(),
            capability: "uart".into(),
            trait_path: "embedded_hal_nb::serial::Write<u8>".into(),
            error_trait: None,
            requires: vec![],
            operations: vec![],
            description: None,
        };
        assert_eq!(contract.trait_name(), "Write");
    }
}
