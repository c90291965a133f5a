//! Engagement metrics of the parties.
//!
//! These metrics do not depend on the answers of a user: they describe how
//! thoroughly a party has documented its positions, issue by issue.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use log::{debug, info};

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::*;
use crate::round1;

/// A justification of this many words gets the full justification score.
pub const FULL_JUSTIFICATION_WORDS: f64 = 120.0;
/// This many arguments, quotes and votes get the full evidence score.
pub const FULL_EVIDENCE_UNITS: f64 = 4.0;
const JUSTIFICATION_SHARE: f64 = 0.6;
const EVIDENCE_SHARE: f64 = 0.4;

/// The recency of a position with no known date.
pub const UNKNOWN_RECENCY_SCORE: f64 = 0.4;
// (maximum age in days, score)
const RECENCY_STEPS: [(f64, f64); 5] = [
    (90.0, 1.0),
    (180.0, 0.85),
    (365.0, 0.70),
    (540.0, 0.55),
    (720.0, 0.45),
];
const STALE_RECENCY_SCORE: f64 = 0.30;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// How well a position is argued, between 0 and 1.
///
/// The length of the justification accounts for 60% of the score, the amount
/// of structured evidence (arguments, quotes and related votes) for the rest.
pub fn compute_position_depth_score(position: &PartyPosition) -> f64 {
    let words = position
        .justification
        .as_deref()
        .map(|j| j.split_whitespace().count())
        .unwrap_or(0);
    let justification_score = (words as f64 / FULL_JUSTIFICATION_WORDS).min(1.0);

    let evidence = position
        .details
        .as_ref()
        .map(|d| d.evidence_count())
        .unwrap_or(0);
    let evidence_score = (evidence as f64 / FULL_EVIDENCE_UNITS).min(1.0);

    (JUSTIFICATION_SHARE * justification_score + EVIDENCE_SHARE * evidence_score).min(1.0)
}

/// Parses the dates found in the datasets.
///
/// Accepts RFC 3339 timestamps, naive timestamps (taken as UTC) and plain
/// dates (midnight UTC). Anything else is an unknown date.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|ndt| Utc.from_utc_datetime(&ndt));
    }
    debug!("parse_timestamp: could not understand {:?}", s);
    None
}

/// The date of a position: `last_updated` if it can be read, then the date of
/// the source.
pub fn position_timestamp(position: &PartyPosition) -> Option<DateTime<Utc>> {
    position
        .last_updated
        .as_deref()
        .and_then(parse_timestamp)
        .or_else(|| position.source.date.as_deref().and_then(parse_timestamp))
}

/// How fresh a date is compared to `now`, between 0.3 and 1.
///
/// Dates in the future are scored by their distance to `now` as well.
pub fn calculate_recency_score(timestamp: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let ts = match timestamp {
        Some(ts) => ts,
        None => return UNKNOWN_RECENCY_SCORE,
    };
    let age_days = (now - ts).num_seconds().abs() as f64 / SECONDS_PER_DAY;
    RECENCY_STEPS
        .iter()
        .find(|(max_age, _)| age_days <= *max_age)
        .map(|(_, score)| *score)
        .unwrap_or(STALE_RECENCY_SCORE)
}

// Running totals over a group of positions.
#[derive(PartialEq, Debug, Clone, Default)]
struct Accumulator {
    count: u32,
    value_sum: f64,
    confidence_sum: f64,
    depth_sum: f64,
    latest: Option<DateTime<Utc>>,
}

impl Accumulator {
    fn add(&mut self, position: &PartyPosition, depth: f64, timestamp: Option<DateTime<Utc>>) {
        self.count += 1;
        self.value_sum += position.value;
        self.confidence_sum += position.confidence;
        self.depth_sum += depth;
        self.latest = match (self.latest, timestamp) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    fn mean(&self, sum: f64) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            sum / self.count as f64
        }
    }
}

#[derive(PartialEq, Debug, Clone, Default)]
struct PartyAccumulator {
    totals: Accumulator,
    positive: u32,
    negative: u32,
    neutral: u32,
    issues: BTreeMap<String, Accumulator>,
}

/// Computes the engagement metrics of every party that has positions, using
/// the current time and the default weights.
pub fn calculate_party_metrics(
    positions: &[PartyPosition],
    theses: &[Thesis],
) -> BTreeMap<String, PartyMetrics> {
    calculate_party_metrics_at(
        positions,
        theses,
        &EngagementWeights::DEFAULT_WEIGHTS,
        Utc::now(),
    )
}

/// Computes the engagement metrics of every party that has positions.
///
/// Positions on a thesis that is not in `theses` cannot be attributed to an
/// issue and are left out. Only the first position of a party on a thesis is
/// counted.
pub fn calculate_party_metrics_at(
    positions: &[PartyPosition],
    theses: &[Thesis],
    weights: &EngagementWeights,
    now: DateTime<Utc>,
) -> BTreeMap<String, PartyMetrics> {
    info!(
        "calculate_party_metrics: {} positions, {} theses, now: {}",
        positions.len(),
        theses.len(),
        now
    );

    let mut theses_by_id: HashMap<&str, &Thesis> = HashMap::new();
    let mut theses_per_issue: HashMap<&str, u32> = HashMap::new();
    for t in theses.iter() {
        if theses_by_id.contains_key(t.id.as_str()) {
            continue;
        }
        theses_by_id.insert(t.id.as_str(), t);
        *theses_per_issue.entry(t.issue_id.as_str()).or_insert(0) += 1;
    }
    let total_theses = theses_by_id.len().max(1) as f64;

    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let accumulators: BTreeMap<String, PartyAccumulator> =
        positions.iter().fold(BTreeMap::new(), |mut acc, position| {
            let thesis = match theses_by_id.get(position.thesis_id.as_str()) {
                Some(t) => t,
                None => {
                    debug!(
                        "calculate_party_metrics: dropping position {}/{}: unknown thesis",
                        position.party_id, position.thesis_id
                    );
                    return acc;
                }
            };
            if !seen.insert((position.party_id.as_str(), position.thesis_id.as_str())) {
                debug!(
                    "calculate_party_metrics: duplicate position {}/{}, keeping the first one",
                    position.party_id, position.thesis_id
                );
                return acc;
            }

            let depth = compute_position_depth_score(position);
            let timestamp = position_timestamp(position);

            let party: &mut PartyAccumulator = acc.entry(position.party_id.clone()).or_default();
            party.totals.add(position, depth, timestamp);
            if position.value > 0.0 {
                party.positive += 1;
            } else if position.value < 0.0 {
                party.negative += 1;
            } else {
                party.neutral += 1;
            }
            party
                .issues
                .entry(thesis.issue_id.clone())
                .or_default()
                .add(position, depth, timestamp);
            acc
        });

    accumulators
        .into_iter()
        .map(|(party_id, party)| {
            let mut top_issues: Vec<PartyMetricsIssue> = party
                .issues
                .iter()
                .map(|(issue_id, issue)| {
                    let in_issue = theses_per_issue.get(issue_id.as_str()).cloned().unwrap_or(1);
                    issue_metrics(issue_id, issue, in_issue, weights, now)
                })
                .collect();
            top_issues.sort_by(|a, b| {
                b.engagement_score
                    .total_cmp(&a.engagement_score)
                    .then_with(|| b.count.cmp(&a.count))
                    .then_with(|| b.avg_value.abs().total_cmp(&a.avg_value.abs()))
            });

            let totals = &party.totals;
            let count = totals.count as f64;
            let metrics = PartyMetrics {
                party_id: party_id.clone(),
                position_count: totals.count,
                coverage_ratio: count / total_theses,
                avg_confidence: totals.mean(totals.confidence_sum),
                avg_value: totals.mean(totals.value_sum),
                avg_depth_score: totals.mean(totals.depth_sum),
                positive_share: party.positive as f64 / count,
                negative_share: party.negative as f64 / count,
                neutral_share: party.neutral as f64 / count,
                top_issues,
                latest_update: totals.latest.map(format_timestamp),
            };
            debug!(
                "calculate_party_metrics: {}: {} positions, coverage {:.2}",
                party_id, metrics.position_count, metrics.coverage_ratio
            );
            (party_id, metrics)
        })
        .collect()
}

fn issue_metrics(
    issue_id: &str,
    issue: &Accumulator,
    theses_in_issue: u32,
    weights: &EngagementWeights,
    now: DateTime<Utc>,
) -> PartyMetricsIssue {
    let coverage = (issue.count as f64 / theses_in_issue.max(1) as f64).min(1.0);
    let depth_score = issue.mean(issue.depth_sum);
    let avg_confidence = issue.mean(issue.confidence_sum);
    let recency_score = calculate_recency_score(issue.latest, now);

    let weight_sum = weights.sum();
    let engagement_score = if weight_sum > 0.0 {
        let blend = coverage * weights.coverage
            + depth_score * weights.depth
            + avg_confidence * weights.confidence
            + recency_score * weights.recency;
        round1(blend / weight_sum * 100.0)
    } else {
        0.0
    };

    PartyMetricsIssue {
        issue_id: issue_id.to_string(),
        count: issue.count,
        avg_value: issue.mean(issue.value_sum),
        avg_confidence,
        coverage,
        depth_score,
        recency_score,
        engagement_score,
        latest_update: issue.latest.map(format_timestamp),
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{init, position};
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap()
    }

    fn thesis(id: &str, issue_id: &str) -> Thesis {
        Thesis {
            id: id.to_string(),
            issue_id: issue_id.to_string(),
            text: format!("Thesis {}", id),
            scale_min: SCALE_MIN,
            scale_max: SCALE_MAX,
            order: 0,
            is_active: true,
        }
    }

    fn words(n: usize) -> String {
        vec!["slovo"; n].join(" ")
    }

    fn undated(party_id: &str, thesis_id: &str, value: f64, confidence: f64) -> PartyPosition {
        let mut p = position(party_id, thesis_id, value, confidence);
        p.source.date = None;
        p
    }

    #[test]
    fn depth_of_an_empty_position() {
        let p = position("a", "t1", 1.0, 1.0);
        assert_eq!(compute_position_depth_score(&p), 0.0);
    }

    #[test]
    fn depth_is_bounded() {
        let mut p = position("a", "t1", 1.0, 1.0);
        p.justification = Some(words(130));
        p.details = Some(PositionDetails {
            arguments: vec!["a".to_string(), "b".to_string()],
            quotes: vec![Quote {
                text: "quote".to_string(),
                ..Quote::default()
            }],
            related_votes: vec![RelatedVote {
                title: "vote".to_string(),
                ..RelatedVote::default()
            }],
        });
        let rich = compute_position_depth_score(&p);
        assert!(rich > 0.6);
        assert!(rich <= 1.0);

        p.justification = Some(words(5000));
        p.details.as_mut().unwrap().arguments = vec!["x".to_string(); 40];
        assert_eq!(compute_position_depth_score(&p), 1.0);
    }

    #[test]
    fn depth_mixes_justification_and_evidence() {
        let mut p = position("a", "t1", 1.0, 1.0);
        p.justification = Some(format!("  {}\n", words(60)));
        p.details = Some(PositionDetails {
            arguments: vec!["a".to_string(), "b".to_string()],
            ..PositionDetails::default()
        });
        let depth = compute_position_depth_score(&p);
        assert!((depth - 0.5).abs() < 1e-9);
    }

    #[test]
    fn recency_steps() {
        let now = now();
        let at = |days: i64| calculate_recency_score(Some(now - Duration::days(days)), now);
        assert_eq!(at(0), 1.0);
        assert_eq!(at(90), 1.0);
        assert_eq!(at(91), 0.85);
        assert_eq!(at(200), 0.70);
        assert_eq!(at(400), 0.55);
        assert_eq!(at(600), 0.45);
        assert_eq!(at(1000), 0.30);
        // Future dates are scored by distance.
        assert_eq!(at(-10), 1.0);
        assert_eq!(calculate_recency_score(None, now), UNKNOWN_RECENCY_SCORE);
    }

    #[test]
    fn recency_is_monotonic() {
        let now = now();
        let mut previous = calculate_recency_score(Some(now), now);
        for days in (0..1200).step_by(7) {
            let score = calculate_recency_score(Some(now - Duration::days(days)), now);
            assert!(score <= previous, "{} days: {} > {}", days, score, previous);
            previous = score;
        }
    }

    #[test]
    fn timestamps() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-03-04"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-04T00:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-04T01:00:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-04T00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-04T00:00:00.000"), Some(expected));
        assert_eq!(parse_timestamp("brzy"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn last_update_falls_back_to_source_date() {
        let mut p = position("a", "t1", 1.0, 1.0);
        p.source.date = Some("2024-01-01".to_string());
        assert_eq!(position_timestamp(&p), parse_timestamp("2024-01-01"));

        p.last_updated = Some("2025-01-01T12:00:00Z".to_string());
        assert_eq!(position_timestamp(&p), parse_timestamp("2025-01-01T12:00:00Z"));

        p.last_updated = Some("not a date".to_string());
        assert_eq!(position_timestamp(&p), parse_timestamp("2024-01-01"));

        p.source.date = None;
        assert_eq!(position_timestamp(&p), None);
    }

    #[test]
    fn economy_beats_migration() {
        init();
        let theses = vec![
            thesis("t1", "economy"),
            thesis("t2", "economy"),
            thesis("t3", "migration"),
        ];
        let mut p1 = position("p", "t1", 1.0, 0.9);
        p1.justification = Some(words(130));
        p1.last_updated = Some("2025-09-01T00:00:00Z".to_string());
        let mut p2 = position("p", "t2", -1.0, 0.85);
        p2.justification = Some(words(125));
        p2.last_updated = Some("2025-08-20".to_string());
        let mut p3 = position("p", "t3", 0.0, 0.4);
        p3.justification = Some(words(5));
        p3.source.date = Some("2023-07-01".to_string());

        let metrics = calculate_party_metrics_at(
            &[p1, p2, p3],
            &theses,
            &EngagementWeights::DEFAULT_WEIGHTS,
            now(),
        );
        let m = metrics.get("p").unwrap();
        assert_eq!(m.position_count, 3);
        assert_eq!(m.coverage_ratio, 1.0);
        assert_eq!(m.avg_value, 0.0);
        assert!((m.positive_share - 1.0 / 3.0).abs() < 1e-9);
        assert!((m.negative_share - 1.0 / 3.0).abs() < 1e-9);
        assert!((m.neutral_share - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(m.latest_update.as_deref(), Some("2025-09-01T00:00:00.000Z"));

        assert_eq!(m.top_issues.len(), 2);
        let economy = &m.top_issues[0];
        let migration = &m.top_issues[1];
        assert_eq!(economy.issue_id, "economy");
        assert_eq!(migration.issue_id, "migration");
        assert_eq!(economy.coverage, 1.0);
        assert_eq!(economy.count, 2);
        assert!(economy.engagement_score > migration.engagement_score);
        assert!(economy.depth_score > migration.depth_score);
        assert!(economy.recency_score > migration.recency_score);
        assert_eq!(economy.engagement_score, 87.5);
        assert_eq!(migration.engagement_score, 56.6);
        assert_eq!(migration.recency_score, 0.30);
    }

    #[test]
    fn unknown_theses_are_dropped() {
        let theses = vec![thesis("t1", "economy"), thesis("t2", "economy")];
        let positions = vec![
            undated("a", "t1", 2.0, 1.0),
            undated("a", "t-missing", -2.0, 1.0),
            undated("b", "t-missing", 1.0, 1.0),
        ];
        let metrics = calculate_party_metrics_at(
            &positions,
            &theses,
            &EngagementWeights::DEFAULT_WEIGHTS,
            now(),
        );
        assert_eq!(metrics.len(), 1);
        let a = metrics.get("a").unwrap();
        assert_eq!(a.position_count, 1);
        assert_eq!(a.coverage_ratio, 0.5);
        assert_eq!(a.positive_share, 1.0);
        assert_eq!(a.latest_update, None);
        assert_eq!(a.top_issues[0].coverage, 0.5);
        assert_eq!(a.top_issues[0].recency_score, UNKNOWN_RECENCY_SCORE);
        assert!(!metrics.contains_key("b"));
    }

    #[test]
    fn duplicate_positions_count_once() {
        let theses = vec![thesis("t1", "economy")];
        let positions = vec![undated("a", "t1", 2.0, 1.0), undated("a", "t1", -2.0, 0.0)];
        let metrics = calculate_party_metrics_at(
            &positions,
            &theses,
            &EngagementWeights::DEFAULT_WEIGHTS,
            now(),
        );
        let a = metrics.get("a").unwrap();
        assert_eq!(a.position_count, 1);
        assert_eq!(a.avg_value, 2.0);
        assert_eq!(a.avg_confidence, 1.0);
    }

    #[test]
    fn issue_ties_are_broken_by_count_then_stance() {
        let theses = vec![
            thesis("t1", "z"),
            thesis("t2", "z"),
            thesis("t3", "m"),
            thesis("t4", "a"),
        ];
        let positions = vec![
            undated("p", "t4", 0.0, 0.5),
            undated("p", "t3", -2.0, 0.5),
            undated("p", "t1", 1.0, 0.5),
            undated("p", "t2", 1.0, 0.5),
        ];
        let metrics = calculate_party_metrics_at(
            &positions,
            &theses,
            &EngagementWeights::DEFAULT_WEIGHTS,
            now(),
        );
        let issues: Vec<&str> = metrics["p"]
            .top_issues
            .iter()
            .map(|i| i.issue_id.as_str())
            .collect();
        assert_eq!(issues, vec!["z", "m", "a"]);
        let scores: Vec<f64> = metrics["p"]
            .top_issues
            .iter()
            .map(|i| i.engagement_score)
            .collect();
        assert!(scores.iter().all(|s| *s == scores[0]));
    }

    #[test]
    fn metrics_with_the_current_clock() {
        init();
        let theses = vec![thesis("t1", "economy"), thesis("t2", "migration")];
        let mut recent = position("a", "t1", 2.0, 0.8);
        recent.last_updated = Some(Utc::now().to_rfc3339());
        let positions = vec![recent, undated("a", "t2", -1.0, 0.4), undated("b", "t2", 0.0, 1.0)];

        let metrics = calculate_party_metrics(&positions, &theses);
        assert_eq!(metrics.len(), 2);
        let a = &metrics["a"];
        assert_eq!(a.position_count, 2);
        assert_eq!(a.coverage_ratio, 1.0);
        assert_eq!(a.top_issues[0].issue_id, "economy");
        assert_eq!(a.top_issues[0].recency_score, 1.0);
        assert_eq!(a.top_issues[1].recency_score, UNKNOWN_RECENCY_SCORE);
        assert_eq!(metrics["b"].neutral_share, 1.0);
    }

    #[test]
    fn zero_weights_give_zero_engagement() {
        let theses = vec![thesis("t1", "economy")];
        let weights = EngagementWeights {
            coverage: 0.0,
            depth: 0.0,
            confidence: 0.0,
            recency: 0.0,
        };
        let metrics =
            calculate_party_metrics_at(&[undated("a", "t1", 1.0, 1.0)], &theses, &weights, now());
        assert_eq!(metrics["a"].top_issues[0].engagement_score, 0.0);
    }

    #[test]
    fn custom_weights_are_normalized() {
        let theses = vec![thesis("t1", "economy")];
        let weights = EngagementWeights {
            coverage: 2.0,
            depth: 0.0,
            confidence: 0.0,
            recency: 0.0,
        };
        let metrics =
            calculate_party_metrics_at(&[undated("a", "t1", 1.0, 0.2)], &theses, &weights, now());
        assert_eq!(metrics["a"].top_issues[0].engagement_score, 100.0);
    }
}
