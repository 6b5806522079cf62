//! `openpid-hal generate`: run the generator and write the driver crate.

use std::path::{Path, PathBuf};

use anyhow::Result;
use openpid_codegen::generate;

use super::{load_config, load_description, load_registry};
use crate::scaffold;

pub fn run(
    description: &Path,
    out: &Path,
    config: Option<&Path>,
    contracts: &[PathBuf],
    force: bool,
) -> Result<()> {
    let desc = load_description(description)?;
    let registry = load_registry(contracts)?;
    let config = load_config(config)?;

    let output = generate(&desc, &registry, &config)?;
    let written = scaffold::write_crate(out, &output, force)?;

    let report = &output.report;
    println!(
        "Generated {} ({} trait impls, {} raw accessors)",
        report.peripheral, report.units.trait_impls, report.units.raw_accessors
    );
    for cap in report.implemented() {
        println!("  implements {}", cap.trait_path);
    }
    for payload in &report.payloads {
        match &payload.written_via {
            Some(contract) => println!("  sends {} via {contract}", payload.name),
            None => println!("  skipped payload {} (no byte-writing capability)", payload.name),
        }
    }
    if !report.plan_errors.is_empty() {
        println!(
            "  {} operation(s) fell back to raw access; see {}",
            report.plan_errors.len(),
            scaffold::REPORT_FILE
        );
    }
    for path in written {
        let shown = path.strip_prefix(out).unwrap_or(path.as_path());
        println!("  {}/{}", out.display(), shown.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::GPIO;

    #[test]
    fn generate_writes_crate() {
        let dir = tempfile::tempdir().unwrap();
        let desc = dir.path().join("gpioa.toml");
        std::fs::write(&desc, GPIO).unwrap();
        let out = dir.path().join("out");

        run(&desc, &out, None, &[], false).unwrap();
        assert!(out.join("src/gpioa.rs").is_file());
        assert!(out.join(scaffold::REPORT_FILE).is_file());
    }

    #[test]
    fn inconsistent_description_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let desc = dir.path().join("bad.toml");
        std::fs::write(
            &desc,
            r#"
name = "BAD"
base-address = 0x1000

[[registers]]
name = "A"
offset = 4
width = 32
access = "rw"

[[registers]]
name = "B"
offset = 4
width = 32
access = "ro"
"#,
        )
        .unwrap();
        let out = dir.path().join("out");

        let err = run(&desc, &out, None, &[], false).unwrap_err();
        assert!(format!("{err:#}").contains("`A`"));
        assert!(!out.exists());
    }

    #[test]
    fn missing_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let desc = dir.path().join("gpioa.toml");
        std::fs::write(&desc, GPIO).unwrap();

        let err = run(
            &desc,
            &dir.path().join("out"),
            Some(&dir.path().join("missing.toml")),
            &[],
            false,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("missing.toml"));
    }
}
