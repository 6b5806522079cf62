//! The built-in embedded-hal 1.0 contract set.

use crate::contract::{
    Argument, CapabilityContract, GuardRequirement, Intent, OperationRequirement, Output,
    OutputKind, Receiver, ScalarType, WidthRange,
};

const DIGITAL_ERROR: &str = "embedded_hal::digital::ErrorType";
const OUTPUT_ROLES: &[&str] = &["enable", "level", "out"];
const INPUT_ROLES: &[&str] = &["level", "status", "in"];

fn roles(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn op(name: &str, intent: Intent, role: &str, accepts: &[&str]) -> OperationRequirement {
    OperationRequirement {
        name: name.to_string(),
        intent,
        role: role.to_string(),
        accepts: roles(accepts),
        width: WidthRange::exactly(1),
        guard: None,
        receiver: Receiver::RefMut,
        argument: None,
        output: Output::default(),
    }
}

fn returning(mut op: OperationRequirement, kind: OutputKind, ty: ScalarType) -> OperationRequirement {
    op.output = Output { kind, ty };
    op
}

fn contract(
    id: &str,
    capability: &str,
    trait_path: &str,
    error_trait: &str,
    requires: &[&str],
    operations: Vec<OperationRequirement>,
    description: &str,
) -> CapabilityContract {
    CapabilityContract {
        id: id.to_string(),
        capability: capability.to_string(),
        trait_path: trait_path.to_string(),
        error_trait: Some(error_trait.to_string()),
        requires: roles(requires),
        operations,
        description: Some(description.to_string()),
    }
}

/// Contracts in registration order; dependencies come first.
pub(crate) fn embedded_hal_v1() -> Vec<CapabilityContract> {
    vec![
        contract(
            "digital-output",
            "gpio",
            "embedded_hal::digital::OutputPin",
            DIGITAL_ERROR,
            &[],
            vec![
                op("set_low", Intent::Deassert, "output", OUTPUT_ROLES),
                op("set_high", Intent::Assert, "output", OUTPUT_ROLES),
            ],
            "Drive a single output line high or low",
        ),
        contract(
            "stateful-output",
            "gpio",
            "embedded_hal::digital::StatefulOutputPin",
            DIGITAL_ERROR,
            &["digital-output"],
            vec![
                returning(
                    op("is_set_high", Intent::TestAsserted, "output", OUTPUT_ROLES),
                    OutputKind::Result,
                    ScalarType::Bool,
                ),
                returning(
                    op("is_set_low", Intent::TestDeasserted, "output", OUTPUT_ROLES),
                    OutputKind::Result,
                    ScalarType::Bool,
                ),
            ],
            "Read back the driven state of an output line",
        ),
        contract(
            "digital-input",
            "gpio",
            "embedded_hal::digital::InputPin",
            DIGITAL_ERROR,
            &[],
            vec![
                returning(
                    op("is_high", Intent::TestAsserted, "input", INPUT_ROLES),
                    OutputKind::Result,
                    ScalarType::Bool,
                ),
                returning(
                    op("is_low", Intent::TestDeasserted, "input", INPUT_ROLES),
                    OutputKind::Result,
                    ScalarType::Bool,
                ),
            ],
            "Sample the level of an input line",
        ),
        contract(
            "pwm",
            "pwm",
            "embedded_hal::pwm::SetDutyCycle",
            "embedded_hal::pwm::ErrorType",
            &[],
            vec![
                OperationRequirement {
                    width: WidthRange::new(1, 16),
                    receiver: Receiver::Ref,
                    output: Output {
                        kind: OutputKind::Plain,
                        ty: ScalarType::U16,
                    },
                    ..op("max_duty_cycle", Intent::Maximum, "duty", &["duty_cycle", "compare"])
                },
                OperationRequirement {
                    width: WidthRange::new(1, 16),
                    argument: Some(Argument {
                        name: "duty".into(),
                        ty: ScalarType::U16,
                    }),
                    ..op("set_duty_cycle", Intent::Store, "duty", &["duty_cycle", "compare"])
                },
            ],
            "Set the duty cycle of a single PWM channel",
        ),
        contract(
            "serial-write",
            "uart",
            "embedded_hal_nb::serial::Write<u8>",
            "embedded_hal_nb::serial::ErrorType",
            &[],
            vec![
                OperationRequirement {
                    width: WidthRange::new(1, 8),
                    guard: Some(GuardRequirement {
                        role: "tx_ready".into(),
                        accepts: roles(&["txe"]),
                    }),
                    argument: Some(Argument {
                        name: "word".into(),
                        ty: ScalarType::U8,
                    }),
                    output: Output {
                        kind: OutputKind::Nb,
                        ty: ScalarType::Unit,
                    },
                    ..op("write", Intent::Store, "tx_data", &["data"])
                },
                returning(
                    op("flush", Intent::Poll, "tx_complete", &["tc"]),
                    OutputKind::Nb,
                    ScalarType::Unit,
                ),
            ],
            "Non-blocking byte transmission",
        ),
        contract(
            "serial-read",
            "uart",
            "embedded_hal_nb::serial::Read<u8>",
            "embedded_hal_nb::serial::ErrorType",
            &[],
            vec![OperationRequirement {
                width: WidthRange::new(1, 8),
                guard: Some(GuardRequirement {
                    role: "rx_ready".into(),
                    accepts: roles(&["rxne"]),
                }),
                output: Output {
                    kind: OutputKind::Nb,
                    ty: ScalarType::U8,
                },
                ..op("read", Intent::Load, "rx_data", &["data"])
            }],
            "Non-blocking byte reception",
        ),
    ]
}
