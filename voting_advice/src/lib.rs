pub mod builder;
mod config;
pub mod manual;
mod metrics;
use log::{debug, info};

use std::collections::{HashMap, HashSet};

pub use crate::config::*;
pub use crate::metrics::*;

// **** Scoring policy ****

/// Points removed from the agreement for every red line that a party crosses.
pub const RED_LINE_PENALTY: f64 = 20.0;
/// A red line is crossed when the stances differ by strictly more than this.
pub const RED_LINE_DIFFERENCE: f64 = 2.0;
/// Up to this difference, the user and the party strongly agree.
pub const STRONG_AGREEMENT_MAX_DIFFERENCE: f64 = 1.0;
/// From this difference on, the user and the party strongly disagree.
pub const STRONG_DISAGREEMENT_MIN_DIFFERENCE: f64 = 3.0;

// **** Private structures ****

// The positions of all the parties, first occurrence wins.
type PositionIndex<'a> = HashMap<&'a str, HashMap<&'a str, &'a PartyPosition>>;

#[derive(PartialEq, Debug, Clone, Default)]
struct PartyTally {
    total_weighted_score: f64,
    max_weighted_score: f64,
    total_confidence: f64,
    answered_theses: u32,
    thesis_results: Vec<ThesisResult>,
}

impl PartyTally {
    fn add(&mut self, answer: &UserAnswer, position: &PartyPosition) {
        let difference = (answer.value - position.value).abs();
        let agreement = (MAX_DIFFERENCE - difference) / MAX_DIFFERENCE;
        let weight = answer.weight as f64;
        let contribution = agreement * weight;

        self.total_weighted_score += contribution;
        self.max_weighted_score += weight;
        self.total_confidence += position.confidence;
        self.answered_theses += 1;
        self.thesis_results.push(ThesisResult {
            thesis_id: answer.thesis_id.clone(),
            user_value: answer.value,
            party_value: position.value,
            difference,
            weight: answer.weight,
            confidence: position.confidence,
            contribution,
        });
    }
}

/// Compares the answers of a user with the positions of every party.
///
/// Arguments:
/// * `answers` the answers of the user. Skipped theses (weight 0) are ignored,
/// and only the first answer counts if a thesis is answered several times.
/// Note that [builder::Builder] keeps the last answer instead, so answers
/// collected with it never repeat a thesis.
/// * `positions` the declared positions of all the parties
/// * `parties` the parties to score, in their display order. This order is
/// used to break ties.
///
/// The results are sorted with all the main parties first, then by decreasing
/// agreement. Missing positions are never an error: they lower the coverage of
/// the party instead.
pub fn calculate_scores(
    answers: &[UserAnswer],
    positions: &[PartyPosition],
    parties: &[Party],
) -> Vec<ScoreResult> {
    info!(
        "calculate_scores: {} answers, {} positions, {} parties",
        answers.len(),
        positions.len(),
        parties.len()
    );

    let answers = dedup_answers(answers);
    let answered: Vec<&UserAnswer> = answers.into_iter().filter(|a| !a.is_skipped()).collect();
    debug!("calculate_scores: {} answered theses", answered.len());

    let index = index_positions(positions);
    let empty: HashMap<&str, &PartyPosition> = HashMap::new();

    let results: Vec<ScoreResult> = parties
        .iter()
        .map(|party| {
            let party_positions = index.get(party.id.as_str()).unwrap_or(&empty);
            score_party(party, &answered, party_positions)
        })
        .collect();
    rank_results(results)
}

fn score_party(
    party: &Party,
    answered: &[&UserAnswer],
    positions: &HashMap<&str, &PartyPosition>,
) -> ScoreResult {
    let mut tally = PartyTally::default();
    for answer in answered.iter() {
        // A party without a position on this thesis only loses coverage.
        if let Some(position) = positions.get(answer.thesis_id.as_str()) {
            tally.add(answer, position);
        }
    }

    let agreement_percentage = if tally.max_weighted_score > 0.0 {
        round2(tally.total_weighted_score / tally.max_weighted_score * 100.0)
    } else {
        0.0
    };
    let confidence_score = if tally.answered_theses > 0 {
        round2(tally.total_confidence / tally.answered_theses as f64)
    } else {
        0.0
    };
    let coverage_percentage = if answered.is_empty() {
        0
    } else {
        (tally.answered_theses as f64 / answered.len() as f64 * 100.0).round() as u32
    };
    debug!(
        "score_party: {}: agreement {} confidence {} coverage {} ({} theses)",
        party.id,
        agreement_percentage,
        confidence_score,
        coverage_percentage,
        tally.answered_theses
    );

    ScoreResult {
        party_id: party.id.clone(),
        party_name: party.name.clone(),
        party_category: party.category,
        total_score: tally.total_weighted_score,
        max_possible_score: tally.max_weighted_score,
        agreement_percentage,
        confidence_score,
        coverage_percentage,
        thesis_results: tally.thesis_results,
        red_line_violations: Vec::new(),
    }
}

/// Orders the results: main parties first, then by decreasing agreement.
///
/// The sort is stable, so parties with the same agreement keep their relative
/// order.
pub fn rank_results(results: Vec<ScoreResult>) -> Vec<ScoreResult> {
    let mut res = results;
    res.sort_by(|a, b| {
        a.party_category
            .cmp(&b.party_category)
            .then_with(|| b.agreement_percentage.total_cmp(&a.agreement_percentage))
    });
    res
}

/// Penalizes the parties that sharply oppose the user on a red-line thesis.
///
/// Every crossed red line removes a flat [RED_LINE_PENALTY] points from the
/// agreement, which never goes below 0. The order of the results is kept: use
/// [rank_results] to rank them again.
pub fn apply_red_line_policy(
    results: &[ScoreResult],
    red_line_thesis_ids: &[String],
) -> Vec<ScoreResult> {
    if red_line_thesis_ids.is_empty() {
        return results.to_vec();
    }
    let red_lines: HashSet<&str> = red_line_thesis_ids.iter().map(|s| s.as_str()).collect();

    results
        .iter()
        .map(|r| {
            let violations: Vec<String> = r
                .thesis_results
                .iter()
                .filter(|tr| {
                    red_lines.contains(tr.thesis_id.as_str()) && tr.difference > RED_LINE_DIFFERENCE
                })
                .map(|tr| tr.thesis_id.clone())
                .collect();
            let mut res = r.clone();
            if !violations.is_empty() {
                let penalty = RED_LINE_PENALTY * violations.len() as f64;
                res.agreement_percentage = round2((r.agreement_percentage - penalty).max(0.0));
                debug!(
                    "apply_red_line_policy: {}: {:?} crossed, {} -> {}",
                    r.party_id, violations, r.agreement_percentage, res.agreement_percentage
                );
                res.red_line_violations.extend(violations);
            }
            res
        })
        .collect()
}

/// Splits the thesis results of a party into agreements and disagreements.
///
/// Only the theses that are still answered in `answers` are kept. Agreements
/// come with the largest contributions first, disagreements with the most
/// important theses first.
pub fn generate_detailed_comparison(
    answers: &[UserAnswer],
    result: &ScoreResult,
) -> DetailedComparison {
    let answered: HashSet<&str> = answers
        .iter()
        .filter(|a| !a.is_skipped())
        .map(|a| a.thesis_id.as_str())
        .collect();

    let mut comparison = DetailedComparison::default();
    for tr in result
        .thesis_results
        .iter()
        .filter(|tr| answered.contains(tr.thesis_id.as_str()))
    {
        if tr.difference <= STRONG_AGREEMENT_MAX_DIFFERENCE {
            comparison.strong_agreements.push(tr.clone());
        } else if tr.difference >= STRONG_DISAGREEMENT_MIN_DIFFERENCE {
            comparison.strong_disagreements.push(tr.clone());
        } else {
            comparison.partial_agreements.push(tr.clone());
        }
    }

    comparison
        .strong_agreements
        .sort_by(|a, b| b.contribution.total_cmp(&a.contribution));
    comparison
        .partial_agreements
        .sort_by(|a, b| b.contribution.total_cmp(&a.contribution));
    comparison
        .strong_disagreements
        .sort_by(|a, b| b.weight.cmp(&a.weight));
    comparison
}

// Keeps the first answer for every thesis, in input order.
fn dedup_answers(answers: &[UserAnswer]) -> Vec<&UserAnswer> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut res: Vec<&UserAnswer> = Vec::new();
    for a in answers.iter() {
        if seen.insert(a.thesis_id.as_str()) {
            res.push(a);
        } else {
            debug!("dedup_answers: ignoring repeated answer for {}", a.thesis_id);
        }
    }
    res
}

fn index_positions(positions: &[PartyPosition]) -> PositionIndex<'_> {
    let mut index: PositionIndex = HashMap::new();
    for p in positions.iter() {
        let party = index.entry(p.party_id.as_str()).or_default();
        if party.contains_key(p.thesis_id.as_str()) {
            debug!(
                "index_positions: duplicate position {}/{}, keeping the first one",
                p.party_id, p.thesis_id
            );
            continue;
        }
        party.insert(p.thesis_id.as_str(), p);
    }
    index
}

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub(crate) fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
