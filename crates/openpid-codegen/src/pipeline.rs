//! Generation pipeline orchestrator.

use openpid_contracts::{match_capabilities, ContractRegistry, MatchSet};
use openpid_model::{build_model, PeripheralDescription, PeripheralModel};

use crate::config::GeneratorConfig;
use crate::emit::{emit_units, EmissionUnit};
use crate::error::{PlanError, Result};
use crate::plan::{plan_access, AccessPlan};
use crate::report::EmissionReport;

/// Everything one generation run produces.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub model: PeripheralModel,
    pub matches: MatchSet,
    pub plan: AccessPlan,
    /// Ordered source fragments.
    pub units: Vec<EmissionUnit>,
    pub report: EmissionReport,
}

impl GenerationOutput {
    /// Units grouped by module hint, concatenated in order.
    pub fn modules(&self) -> Vec<(String, String)> {
        let mut modules: Vec<(String, String)> = Vec::new();
        for unit in &self.units {
            match modules.iter_mut().find(|(hint, _)| *hint == unit.module_hint) {
                Some((_, source)) => {
                    source.push('\n');
                    source.push_str(&unit.source);
                }
                None => modules.push((unit.module_hint.clone(), unit.source.clone())),
            }
        }
        modules
    }
}

/// Run the full pipeline:
/// build -> match -> plan -> demote unplannable bindings -> re-plan -> emit -> report.
///
/// Only an inconsistent description, an unknown contract in the allow-list
/// or an invalid configuration abort the run.
pub fn generate(
    desc: &PeripheralDescription,
    registry: &ContractRegistry,
    config: &GeneratorConfig,
) -> Result<GenerationOutput> {
    config.validate()?;

    // Stage 1: IR
    let model = build_model(desc)?;
    tracing::debug!(
        peripheral = %model.name,
        registers = model.registers.len(),
        fields = model.field_count(),
        "built hardware model"
    );

    let filtered;
    let registry = match &config.contracts {
        Some(allow) => {
            filtered = registry.filtered(allow)?;
            &filtered
        }
        None => registry,
    };

    // Stage 2: capability matching
    let mut matches = match_capabilities(&model, registry);

    // Stage 3: access planning, demoting bindings the planner rejects
    let mut plan = plan_access(&model, &matches);
    let mut demotions: Vec<PlanError> = Vec::new();
    while !plan.errors.is_empty() {
        for err in &plan.errors {
            tracing::warn!(
                peripheral = %model.name,
                register = %model.field_path(err.field()),
                "falling back to raw access: {err}"
            );
            matches.demote(err.field(), &err.unmet_reason());
        }
        matches.enforce_dependencies(registry);
        demotions.append(&mut plan.errors);
        plan = plan_access(&model, &matches);
    }
    plan.absorb(demotions);

    // Stage 4: emission
    let units = emit_units(&model, registry, &matches, &plan, config);
    let report = EmissionReport::build(&model, registry, &matches, &plan, &units);

    tracing::info!(
        peripheral = %model.name,
        implemented = report.implemented().count(),
        demoted = report.plan_errors.len(),
        units = report.units.total(),
        "generated driver"
    );

    Ok(GenerationOutput {
        model,
        matches,
        plan,
        units,
        report,
    })
}
