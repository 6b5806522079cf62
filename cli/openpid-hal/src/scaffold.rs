//! Writes a generation run to disk as a `no_std` crate.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use openpid_codegen::GenerationOutput;
use openpid_model::PeripheralModel;
use serde::Serialize;

const DEFAULT_VERSION: &str = "0.1.0";
pub(crate) const REPORT_FILE: &str = "openpid-report.json";

#[derive(Serialize)]
struct CrateManifest {
    package: Package,
    dependencies: BTreeMap<&'static str, &'static str>,
}

#[derive(Serialize)]
struct Package {
    name: String,
    version: String,
    edition: &'static str,
    description: String,
    categories: Vec<&'static str>,
    keywords: Vec<&'static str>,
}

/// The generated crate's version: the description's document version when it
/// is valid semver, `0.1.0` otherwise.
fn crate_version(model: &PeripheralModel) -> String {
    match &model.version {
        Some(version) if semver::Version::parse(version).is_ok() => version.clone(),
        Some(version) => {
            tracing::warn!(
                peripheral = %model.name,
                "document version '{version}' is not semver; using {DEFAULT_VERSION}"
            );
            DEFAULT_VERSION.to_string()
        }
        None => {
            tracing::warn!(
                peripheral = %model.name,
                "no document version; the generated crate defaults to {DEFAULT_VERSION}"
            );
            DEFAULT_VERSION.to_string()
        }
    }
}

pub(crate) fn cargo_manifest(model: &PeripheralModel) -> Result<String> {
    let manifest = CrateManifest {
        package: Package {
            name: format!("{}-hal", model.ident.trim_matches('_').replace('_', "-")),
            version: crate_version(model),
            edition: "2021",
            description: model
                .description
                .clone()
                .unwrap_or_else(|| format!("embedded-hal driver for {}", model.name)),
            categories: vec!["embedded", "no-std", "hardware-support"],
            keywords: vec!["driver", "openpid", "embedded-hal"],
        },
        dependencies: BTreeMap::from([
            ("embedded-hal", "1"),
            ("embedded-hal-nb", "1"),
            ("nb", "1"),
        ]),
    };
    toml::to_string(&manifest).context("serializing Cargo.toml")
}

fn lib_rs(output: &GenerationOutput, modules: &[(String, String)]) -> String {
    let mut out = format!(
        "//! Driver for {} generated by openpid-hal.\n\n#![no_std]\n\n",
        output.model.name
    );
    for (hint, _) in modules {
        out.push_str(&format!("pub mod {};\n", module_name(hint)));
    }
    out
}

fn module_name(hint: &str) -> &str {
    hint.strip_suffix(".rs").unwrap_or(hint)
}

fn is_empty_dir(dir: &Path) -> Result<bool> {
    Ok(fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .next()
        .is_none())
}

/// Write the crate for `output` into `dir` and return the files written.
pub(crate) fn write_crate(dir: &Path, output: &GenerationOutput, force: bool) -> Result<Vec<PathBuf>> {
    if dir.exists() && !force && !is_empty_dir(dir)? {
        bail!(
            "output directory '{}' is not empty (use --force to overwrite)",
            dir.display()
        );
    }

    let src = dir.join("src");
    fs::create_dir_all(&src).with_context(|| format!("creating {}", src.display()))?;

    let modules = output.modules();
    let mut files: Vec<(PathBuf, String)> = vec![
        (dir.join("Cargo.toml"), cargo_manifest(&output.model)?),
        (dir.join(".gitignore"), "target/\nCargo.lock\n".to_string()),
        (src.join("lib.rs"), lib_rs(output, &modules)),
    ];
    for (hint, source) in &modules {
        let header = format!(
            "// Generated by openpid-hal from the {} description. Do not edit.\n\n",
            output.model.name
        );
        files.push((src.join(hint), header + source));
    }
    let report = output
        .report
        .to_json()
        .context("serializing emission report")?;
    files.push((dir.join(REPORT_FILE), report + "\n"));

    let mut written = Vec::with_capacity(files.len());
    for (path, content) in files {
        fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
        tracing::debug!(path = %path.display(), "wrote file");
        written.push(path);
    }
    Ok(written)
}
