//! Domain dependency scheduling.
//!
//! Domains are ordered with Kahn's algorithm over the subgraph induced by the
//! requested domains. The ready set is kept sorted, so domains that become
//! ready together run in code order and the schedule is deterministic.

use std::collections::{BTreeMap, BTreeSet};

use sdtm_standards::DomainRegistry;
use tracing::debug;

use crate::error::ScheduleError;

/// Derivation order for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    /// Every requested domain after all of its requested dependencies.
    pub order: Vec<String>,
    /// Domains grouped by dependency depth; siblings in a wave are independent.
    pub waves: Vec<Vec<String>>,
}

impl Schedule {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Orders the requested domains by their registry dependencies.
///
/// Optional dependencies only constrain the order when both domains are
/// requested. A required dependency outside the request, an unknown code or
/// a cycle among the requested domains fails the whole run.
pub fn schedule<I, S>(requested: I, registry: &DomainRegistry) -> Result<Schedule, ScheduleError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut domains = BTreeSet::new();
    for code in requested {
        let code = code.as_ref().trim().to_uppercase();
        if !registry.contains(&code) {
            return Err(ScheduleError::UnknownDomain { code });
        }
        domains.insert(code);
    }

    // dependency -> dependents, restricted to the requested subgraph
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut in_degree: BTreeMap<&str, usize> = domains.iter().map(|d| (d.as_str(), 0)).collect();
    let mut prerequisites: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for domain in &domains {
        for dependency in registry.dependencies(domain) {
            let dependency_code = dependency.domain.to_uppercase();
            match domains.get(&dependency_code) {
                Some(dependency_code) => {
                    dependents
                        .entry(dependency_code.as_str())
                        .or_default()
                        .push(domain.as_str());
                    prerequisites
                        .entry(domain.as_str())
                        .or_default()
                        .push(dependency_code.as_str());
                    *in_degree.entry(domain.as_str()).or_default() += 1;
                }
                None if dependency.required => {
                    return Err(ScheduleError::MissingDependency {
                        domain: domain.clone(),
                        dependency: dependency_code,
                    });
                }
                None => {}
            }
        }
    }

    let mut ready: BTreeSet<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(code, _)| *code)
        .collect();
    let mut order: Vec<String> = Vec::with_capacity(domains.len());
    while let Some(code) = ready.pop_first() {
        order.push(code.to_string());
        for dependent in dependents.get(code).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(*dependent);
                }
            }
        }
    }

    if order.len() < domains.len() {
        let residual: BTreeSet<&str> = in_degree
            .into_iter()
            .filter(|(_, degree)| *degree > 0)
            .map(|(code, _)| code)
            .collect();
        let domains = cycle_members(residual, &dependents)
            .into_iter()
            .map(str::to_string)
            .collect();
        return Err(ScheduleError::Cycle { domains });
    }

    let mut depth: BTreeMap<&str, usize> = BTreeMap::new();
    let mut waves: Vec<Vec<String>> = Vec::new();
    for code in &order {
        let level = prerequisites
            .get(code.as_str())
            .into_iter()
            .flatten()
            .filter_map(|dependency| depth.get(dependency))
            .map(|level| level + 1)
            .max()
            .unwrap_or(0);
        depth.insert(code.as_str(), level);
        if waves.len() <= level {
            waves.resize_with(level + 1, Vec::new);
        }
        waves[level].push(code.clone());
    }
    for wave in &mut waves {
        wave.sort();
    }

    debug!(domains = order.len(), waves = waves.len(), "scheduled domains");
    Ok(Schedule { order, waves })
}

/// Domains of the unscheduled remainder that can reach themselves.
///
/// Domains that only depend on a cycle, or sit between two cycles, are left
/// over by Kahn's algorithm as well but are not part of any cycle.
fn cycle_members<'a>(
    residual: BTreeSet<&'a str>,
    dependents: &BTreeMap<&str, Vec<&'a str>>,
) -> BTreeSet<&'a str> {
    let next = |code: &str| -> Vec<&'a str> {
        dependents
            .get(code)
            .into_iter()
            .flatten()
            .copied()
            .filter(|dependent| residual.contains(dependent))
            .collect()
    };
    residual
        .iter()
        .copied()
        .filter(|start| {
            let mut seen = BTreeSet::new();
            let mut stack = next(*start);
            while let Some(code) = stack.pop() {
                if code == *start {
                    return true;
                }
                if seen.insert(code) {
                    stack.extend(next(code));
                }
            }
            false
        })
        .collect()
}
