use anyhow::{Result, bail};
use comfy_table::Table;
use sdtm_cli::config::RunConfig;
use sdtm_cli::pipeline::{
    StudyOutcome, load_registry, read_visit_schedule, run_study as run_study_folder, write_report,
};
use sdtm_standards::DomainRegistry;
use tracing::info;

use crate::cli::StudyArgs;
use crate::summary::apply_table_style;

pub fn run_domains() -> Result<()> {
    let registry = DomainRegistry::builtin();
    let mut table = Table::new();
    table.set_header(vec!["Domain", "Label", "Class", "Depends on"]);
    apply_table_style(&mut table);
    for domain in registry.domains() {
        let dependencies: Vec<String> = domain
            .dependencies
            .iter()
            .map(|d| {
                if d.required {
                    d.domain.clone()
                } else {
                    format!("{} (optional)", d.domain)
                }
            })
            .collect();
        table.add_row(vec![
            domain.code.clone(),
            domain.label.clone(),
            domain.dataset_class.as_str().to_string(),
            dependencies.join(", "),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_study(args: &StudyArgs) -> Result<StudyOutcome> {
    if !args.study_folder.is_dir() {
        bail!("study folder not found: {}", args.study_folder.display());
    }
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    apply_overrides(&mut config, args);

    let registry = load_registry(args.ct.as_deref())?;
    let visits = args.visits.as_deref().map(read_visit_schedule).transpose()?;
    let outcome = run_study_folder(&args.study_folder, &config, &registry, visits.as_ref())?;

    if let Some(path) = &args.report {
        write_report(path, &outcome.report)?;
        info!(path = %path.display(), "wrote report");
    }
    Ok(outcome)
}

fn apply_overrides(config: &mut RunConfig, args: &StudyArgs) {
    if let Some(workers) = args.workers {
        config.pipeline.workers = workers;
    }
    if let Some(threshold) = args.threshold {
        config.conformance.ready_threshold = threshold;
    }
    if let Some(study_id) = &args.study_id {
        config.study_id = Some(study_id.clone());
    }
}
