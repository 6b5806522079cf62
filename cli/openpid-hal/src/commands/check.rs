//! `openpid-hal check`: run the generator and print the emission report.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use openpid_codegen::{generate, EmissionReport};

use super::{load_config, load_description, load_registry};

pub fn run(
    description: &Path,
    config: Option<&Path>,
    contracts: &[PathBuf],
    json: bool,
) -> Result<()> {
    let report = check(description, config, contracts)?;
    if json {
        println!("{}", report.to_json().context("serializing emission report")?);
    } else {
        print!("{report}");
    }
    Ok(())
}

fn check(description: &Path, config: Option<&Path>, contracts: &[PathBuf]) -> Result<EmissionReport> {
    let desc = load_description(description)?;
    let registry = load_registry(contracts)?;
    let config = load_config(config)?;
    Ok(generate(&desc, &registry, &config)?.report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::GPIO;
    use openpid_contracts::MatchStatus;

    #[test]
    fn check_reports_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let desc = dir.path().join("gpioa.toml");
        std::fs::write(&desc, GPIO).unwrap();

        let report = check(&desc, None, &[]).unwrap();
        assert_eq!(report.peripheral, "GPIOA");
        assert_eq!(
            report.capability("digital-output").unwrap().status,
            MatchStatus::Full
        );
        assert_eq!(
            report.capability("pwm").unwrap().status,
            MatchStatus::None
        );
        assert!(report.register("ODR").unwrap().serialization_required);

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn config_restricts_contracts() {
        let dir = tempfile::tempdir().unwrap();
        let desc = dir.path().join("gpioa.toml");
        std::fs::write(&desc, GPIO).unwrap();
        let config = dir.path().join("openpid-hal.toml");
        std::fs::write(&config, "contracts = [\"stateful-output\"]\n").unwrap();

        let report = check(&desc, Some(&config), &[]).unwrap();
        let ids: Vec<_> = report.capabilities.iter().map(|c| c.contract.as_str()).collect();
        assert_eq!(ids, vec!["digital-output", "stateful-output"]);
    }
}
