//! Study pipeline: derives every domain in dependency order.
//!
//! Domains of a scheduler wave only depend on earlier waves, so they are
//! derived concurrently on up to `workers` scoped threads. All workers of a
//! wave borrow the same [`ProducedTables`] snapshot; the coordinating thread
//! extends it once the wave has finished.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use polars::prelude::DataFrame;
use sdtm_model::{Defect, DerivationOptions, sort_defects};
use sdtm_standards::{DomainRegistry, StandardsError};
use sdtm_transform::{DomainOutput, ProducedTables, TransformContext, failed_output, produce};
use tracing::{info, info_span, warn};

use crate::error::PipelineError;
use crate::scheduler::{Schedule, schedule};

/// Default number of derivation workers per wave.
pub const DEFAULT_WORKERS: usize = 4;

/// Everything a pipeline run produced.
#[derive(Debug, Clone)]
pub struct StudyRun {
    pub schedule: Schedule,
    pub tables: ProducedTables,
    /// Derivation defects across all domains, in canonical order.
    pub defects: Vec<Defect>,
    /// Domains whose derivation failed and were replaced by an empty table.
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct StudyPipeline<'a> {
    registry: &'a DomainRegistry,
    options: &'a DerivationOptions,
    workers: usize,
}

impl<'a> StudyPipeline<'a> {
    pub fn new(registry: &'a DomainRegistry, options: &'a DerivationOptions) -> Self {
        Self {
            registry,
            options,
            workers: DEFAULT_WORKERS,
        }
    }

    /// Upper bound on concurrently derived domains. Zero is treated as one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Derives every domain in `raw`, keyed by domain code.
    ///
    /// Scheduling errors abort before any domain work. A domain whose
    /// derivation fails is isolated: it contributes an empty table and a
    /// blocking defect, and its dependents still run.
    pub fn run(&self, raw: &BTreeMap<String, DataFrame>) -> Result<StudyRun, PipelineError> {
        let raw: BTreeMap<String, &DataFrame> = raw
            .iter()
            .map(|(code, frame)| (code.trim().to_uppercase(), frame))
            .collect();
        let schedule = schedule(raw.keys(), self.registry)?;
        info!(
            domains = schedule.len(),
            waves = schedule.waves.len(),
            workers = self.workers,
            "starting study derivation"
        );

        let mut tables = ProducedTables::new();
        let mut defects = Vec::new();
        let mut failed = Vec::new();
        for (index, wave) in schedule.waves.iter().enumerate() {
            let span = info_span!("wave", index, domains = wave.len());
            let _guard = span.enter();
            let outputs = self.run_wave(wave, &raw, &tables)?;
            for (code, output, ok) in outputs {
                if !ok {
                    failed.push(code);
                }
                defects.extend(output.defects);
                tables.insert(output.frame);
            }
        }

        sort_defects(&mut defects);
        info!(
            tables = tables.len(),
            defects = defects.len(),
            failed = failed.len(),
            "study derivation finished"
        );
        Ok(StudyRun {
            schedule,
            tables,
            defects,
            failed,
        })
    }

    /// Derives one wave against a fixed snapshot. Results come back in wave order.
    fn run_wave(
        &self,
        wave: &[String],
        raw: &BTreeMap<String, &DataFrame>,
        snapshot: &ProducedTables,
    ) -> Result<Vec<(String, DomainOutput, bool)>, PipelineError> {
        let next = AtomicUsize::new(0);
        let worker_count = self.workers.min(wave.len()).max(1);

        let mut results: Vec<(usize, Result<(DomainOutput, bool), PipelineError>)> =
            std::thread::scope(|s| {
                let mut joins = Vec::with_capacity(worker_count);
                for _ in 0..worker_count {
                    let next = &next;
                    joins.push(s.spawn(move || {
                        let mut done = Vec::new();
                        loop {
                            let idx = next.fetch_add(1, Ordering::Relaxed);
                            let Some(code) = wave.get(idx) else {
                                break;
                            };
                            done.push((idx, self.derive_isolated(code, raw, snapshot)));
                        }
                        done
                    }));
                }
                joins
                    .into_iter()
                    .flat_map(|join| {
                        join.join().unwrap_or_else(|_| {
                            vec![(
                                usize::MAX,
                                Err(PipelineError::WorkerPanicked {
                                    domain: wave.join(", "),
                                }),
                            )]
                        })
                    })
                    .collect()
            });

        results.sort_by_key(|(idx, _)| *idx);
        results
            .into_iter()
            .map(|(idx, result)| {
                let (output, ok) = result?;
                let code = wave.get(idx).cloned().unwrap_or_default();
                Ok((code, output, ok))
            })
            .collect()
    }

    /// Derives one domain, replacing a failed derivation with an empty table.
    fn derive_isolated(
        &self,
        code: &str,
        raw: &BTreeMap<String, &DataFrame>,
        snapshot: &ProducedTables,
    ) -> Result<(DomainOutput, bool), PipelineError> {
        let domain = self.registry.require_domain(code)?;
        let ctx = TransformContext::new(self.registry, self.options);
        let frame = raw.get(code).ok_or_else(|| StandardsError::UnknownDomain {
            code: code.to_string(),
        })?;
        match produce(code, frame, snapshot, &ctx) {
            Ok(output) => Ok((output, true)),
            Err(error) => {
                warn!(domain = code, %error, "derivation failed, emitting empty table");
                Ok((failed_output(domain, &error)?, false))
            }
        }
    }
}
