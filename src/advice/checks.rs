// Integrity checks of the reference datasets.
//
// The engines never fail on inconsistent data, they ignore what they cannot
// use. These checks tell the maintainers of the datasets what was ignored.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;

use voting_advice::*;

use crate::advice::config_reader::Datasets;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    fn error(message: String) -> Finding {
        Finding {
            severity: Severity::Error,
            message,
        }
    }

    fn warning(message: String) -> Finding {
        Finding {
            severity: Severity::Warning,
            message,
        }
    }
}

pub fn count_severity(findings: &[Finding], severity: Severity) -> usize {
    findings.iter().filter(|f| f.severity == severity).count()
}

fn duplicate_ids<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> Vec<Finding> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut res: Vec<Finding> = Vec::new();
    for id in ids {
        if !seen.insert(id) {
            res.push(Finding::error(format!("duplicate {} id {}", kind, id)));
        }
    }
    res
}

/// Checks the datasets against each other.
///
/// Errors are references that cannot be resolved, values outside of their
/// scales and duplicate ids. Everything else that the engines silently work
/// around is a warning.
pub fn check_datasets(datasets: &Datasets, now: DateTime<Utc>) -> Vec<Finding> {
    let mut findings: Vec<Finding> = Vec::new();

    findings.extend(duplicate_ids("party", datasets.parties.iter().map(|p| p.id.as_str())));
    findings.extend(duplicate_ids("thesis", datasets.theses.iter().map(|t| t.id.as_str())));
    if let Some(issues) = &datasets.issues {
        findings.extend(duplicate_ids("issue", issues.iter().map(|i| i.id.as_str())));
        let issue_ids: HashSet<&str> = issues.iter().map(|i| i.id.as_str()).collect();
        for t in datasets.theses.iter() {
            if !issue_ids.contains(t.issue_id.as_str()) {
                findings.push(Finding::warning(format!(
                    "thesis {} refers to an unknown issue {}",
                    t.id, t.issue_id
                )));
            }
        }
    }

    let party_ids: HashSet<&str> = datasets.parties.iter().map(|p| p.id.as_str()).collect();
    let mut theses: HashMap<&str, &Thesis> = HashMap::new();
    for t in datasets.theses.iter() {
        theses.entry(t.id.as_str()).or_insert(t);
    }

    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    for p in datasets.positions.iter() {
        let name = format!("position {}/{}", p.party_id, p.thesis_id);
        if !party_ids.contains(p.party_id.as_str()) {
            findings.push(Finding::error(format!("{}: unknown party", name)));
        }
        match theses.get(p.thesis_id.as_str()) {
            None => findings.push(Finding::error(format!("{}: unknown thesis", name))),
            Some(t) => {
                let (lo, hi) = (t.scale_min.max(SCALE_MIN), t.scale_max.min(SCALE_MAX));
                if !(lo..=hi).contains(&p.value) {
                    findings.push(Finding::error(format!(
                        "{}: value {} outside of [{}, {}]",
                        name, p.value, lo, hi
                    )));
                }
            }
        }
        if !(0.0..=1.0).contains(&p.confidence) {
            findings.push(Finding::error(format!(
                "{}: confidence {} outside of [0, 1]",
                name, p.confidence
            )));
        }
        if !seen.insert((p.party_id.as_str(), p.thesis_id.as_str())) {
            findings.push(Finding::warning(format!(
                "{}: duplicate position, only the first one is used",
                name
            )));
        }
        match position_timestamp(p) {
            None => findings.push(Finding::warning(format!("{}: no usable date", name))),
            Some(ts) if ts > now => {
                findings.push(Finding::warning(format!("{}: dated in the future", name)))
            }
            Some(_) => {}
        }
    }

    debug!(
        "check_datasets: {} errors, {} warnings",
        count_severity(&findings, Severity::Error),
        count_severity(&findings, Severity::Warning)
    );
    findings
}
