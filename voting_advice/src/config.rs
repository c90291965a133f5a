// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The lowest stance on the agreement scale (strongly disagree).
pub const SCALE_MIN: f64 = -2.0;
/// The highest stance on the agreement scale (strongly agree).
pub const SCALE_MAX: f64 = 2.0;
/// The largest possible distance between two stances.
pub const MAX_DIFFERENCE: f64 = SCALE_MAX - SCALE_MIN;

/// A single statement that users and parties take a stance on.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Thesis {
    pub id: String,
    #[serde(rename = "issueId")]
    pub issue_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "scaleMin", default = "default_scale_min")]
    pub scale_min: f64,
    #[serde(rename = "scaleMax", default = "default_scale_max")]
    pub scale_max: f64,
    #[serde(default)]
    pub order: u32,
    #[serde(rename = "isActive", default = "default_true")]
    pub is_active: bool,
}

fn default_scale_min() -> f64 {
    SCALE_MIN
}

fn default_scale_max() -> f64 {
    SCALE_MAX
}

fn default_true() -> bool {
    true
}

/// A topic grouping several theses.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub order: u32,
}

/// Display grouping of the parties. Main parties are always listed first.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyCategory {
    Main,
    Secondary,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    pub id: String,
    pub name: String,
    #[serde(rename = "shortName", default)]
    pub short_name: Option<String>,
    pub category: PartyCategory,
    #[serde(rename = "pollPercentage", default)]
    pub poll_percentage: Option<f64>,
    // Curated by hand, never derived from the positions.
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    #[serde(rename = "historicalAchievements", default)]
    pub historical_achievements: Vec<String>,
    #[serde(default)]
    pub controversies: Vec<String>,
}

/// Where a party position comes from.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PositionSource {
    pub url: String,
    /// ISO 8601 date of the source document.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A roll-call vote backing a position.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelatedVote {
    pub title: String,
    #[serde(default)]
    pub date: Option<String>,
    /// How the party voted ("for", "against", "abstained", ...).
    #[serde(default)]
    pub vote: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Structured evidence attached to a position.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionDetails {
    #[serde(default)]
    pub arguments: Vec<String>,
    #[serde(default)]
    pub quotes: Vec<Quote>,
    #[serde(rename = "relatedVotes", default)]
    pub related_votes: Vec<RelatedVote>,
}

impl PositionDetails {
    /// The number of evidence units (arguments, quotes and votes combined).
    pub fn evidence_count(&self) -> usize {
        self.arguments.len() + self.quotes.len() + self.related_votes.len()
    }
}

/// The declared stance of one party on one thesis.
///
/// `(party_id, thesis_id)` is expected to be unique. When it is not, the first
/// position in the input wins everywhere in this crate.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PartyPosition {
    #[serde(rename = "partyId")]
    pub party_id: String,
    #[serde(rename = "thesisId")]
    pub thesis_id: String,
    /// Between -2 and 2
    pub value: f64,
    /// Between 0 and 1
    pub confidence: f64,
    #[serde(default)]
    pub justification: Option<String>,
    #[serde(default)]
    pub details: Option<PositionDetails>,
    pub source: PositionSource,
    #[serde(rename = "lastUpdated", default)]
    pub last_updated: Option<String>,
}

/// One answer of the user.
///
/// A weight of 0 means that the user skipped the thesis. Weights 1 to 3 express
/// how important the thesis is to the user.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct UserAnswer {
    #[serde(rename = "thesisId")]
    pub thesis_id: String,
    pub value: f64,
    pub weight: u8,
}

impl UserAnswer {
    pub fn is_skipped(&self) -> bool {
        self.weight == 0
    }
}

// ******** Output data structures *********

/// How one thesis contributed to the score of a party.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ThesisResult {
    #[serde(rename = "thesisId")]
    pub thesis_id: String,
    #[serde(rename = "userValue")]
    pub user_value: f64,
    #[serde(rename = "partyValue")]
    pub party_value: f64,
    pub difference: f64,
    pub weight: u8,
    pub confidence: f64,
    pub contribution: f64,
}

/// The agreement between the user and one party.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    #[serde(rename = "partyId")]
    pub party_id: String,
    #[serde(rename = "partyName")]
    pub party_name: String,
    #[serde(rename = "partyCategory")]
    pub party_category: PartyCategory,
    #[serde(rename = "totalScore")]
    pub total_score: f64,
    #[serde(rename = "maxPossibleScore")]
    pub max_possible_score: f64,
    /// 0 to 100, rounded to 2 decimals.
    #[serde(rename = "agreementPercentage")]
    pub agreement_percentage: f64,
    /// 0 to 1, rounded to 2 decimals.
    #[serde(rename = "confidenceScore")]
    pub confidence_score: f64,
    #[serde(rename = "coveragePercentage")]
    pub coverage_percentage: u32,
    #[serde(rename = "thesisResults")]
    pub thesis_results: Vec<ThesisResult>,
    /// The red-line theses that were held against this party.
    #[serde(
        rename = "redLineViolations",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub red_line_violations: Vec<String>,
}

/// Thesis results of one party, split by how close the stances are.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailedComparison {
    #[serde(rename = "strongAgreements")]
    pub strong_agreements: Vec<ThesisResult>,
    #[serde(rename = "partialAgreements")]
    pub partial_agreements: Vec<ThesisResult>,
    #[serde(rename = "strongDisagreements")]
    pub strong_disagreements: Vec<ThesisResult>,
}

/// Engagement of a party on one issue.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PartyMetricsIssue {
    #[serde(rename = "issueId")]
    pub issue_id: String,
    pub count: u32,
    #[serde(rename = "avgValue")]
    pub avg_value: f64,
    #[serde(rename = "avgConfidence")]
    pub avg_confidence: f64,
    pub coverage: f64,
    #[serde(rename = "depthScore")]
    pub depth_score: f64,
    #[serde(rename = "recencyScore")]
    pub recency_score: f64,
    #[serde(rename = "engagementScore")]
    pub engagement_score: f64,
    #[serde(rename = "latestUpdate", skip_serializing_if = "Option::is_none")]
    pub latest_update: Option<String>,
}

/// Aggregated statistics over all the positions of one party.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PartyMetrics {
    #[serde(rename = "partyId")]
    pub party_id: String,
    #[serde(rename = "positionCount")]
    pub position_count: u32,
    #[serde(rename = "coverageRatio")]
    pub coverage_ratio: f64,
    #[serde(rename = "avgConfidence")]
    pub avg_confidence: f64,
    #[serde(rename = "avgValue")]
    pub avg_value: f64,
    #[serde(rename = "avgDepthScore")]
    pub avg_depth_score: f64,
    #[serde(rename = "positiveShare")]
    pub positive_share: f64,
    #[serde(rename = "negativeShare")]
    pub negative_share: f64,
    #[serde(rename = "neutralShare")]
    pub neutral_share: f64,
    #[serde(rename = "topIssues")]
    pub top_issues: Vec<PartyMetricsIssue>,
    #[serde(rename = "latestUpdate", skip_serializing_if = "Option::is_none")]
    pub latest_update: Option<String>,
}

/// Errors raised when collecting the answers of a user.
#[derive(PartialEq, Debug, Clone)]
pub enum AnswerError {
    UnknownThesis(String),
    ValueOutOfRange { thesis_id: String, value: f64 },
    InvalidWeight { thesis_id: String, weight: u8 },
}

impl Error for AnswerError {}

impl Display for AnswerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerError::UnknownThesis(id) => write!(f, "unknown thesis {}", id),
            AnswerError::ValueOutOfRange { thesis_id, value } => {
                write!(f, "value {} is outside the scale of thesis {}", value, thesis_id)
            }
            AnswerError::InvalidWeight { thesis_id, weight } => write!(
                f,
                "weight {} for thesis {} is not one of 0, 1, 2, 3",
                weight, thesis_id
            ),
        }
    }
}

// ********* Configuration **********

/// The weights of the components of the engagement score.
///
/// The score is normalized by the sum of the weights, so they do not need to
/// add up to 1.
#[derive(PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngagementWeights {
    pub coverage: f64,
    pub depth: f64,
    pub confidence: f64,
    pub recency: f64,
}

impl EngagementWeights {
    pub const DEFAULT_WEIGHTS: EngagementWeights = EngagementWeights {
        coverage: 0.45,
        depth: 0.25,
        confidence: 0.20,
        recency: 0.10,
    };

    pub fn sum(&self) -> f64 {
        self.coverage + self.depth + self.confidence + self.recency
    }
}

impl Default for EngagementWeights {
    fn default() -> Self {
        EngagementWeights::DEFAULT_WEIGHTS
    }
}
