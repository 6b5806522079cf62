//! `openpid-hal contracts`: list the capability contracts.

use std::path::PathBuf;

use anyhow::Result;
use openpid_contracts::ContractRegistry;

use super::load_registry;

pub fn run(extra: &[PathBuf]) -> Result<()> {
    let registry = load_registry(extra)?;
    print!("{}", listing(&registry));
    Ok(())
}

fn listing(registry: &ContractRegistry) -> String {
    let mut out = format!(
        "Capability contracts (registry v{}, {} contracts):\n",
        registry.version(),
        registry.len()
    );
    for contract in registry.iter() {
        out.push_str(&format!(
            "\n  {} [{}] -> {}\n",
            contract.id, contract.capability, contract.trait_path
        ));
        if !contract.requires.is_empty() {
            out.push_str(&format!("    requires: {}\n", contract.requires.join(", ")));
        }
        for op in &contract.operations {
            let mut line = format!("    {}  ({} '{}'", op.signature(), op.intent.as_str(), op.role);
            if let Some(guard) = &op.guard {
                line.push_str(&format!(", guard '{}'", guard.role));
            }
            line.push(')');
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}
