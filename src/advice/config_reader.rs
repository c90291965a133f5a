use crate::advice::io_common::resolve_path;
use crate::advice::io_json::read_json_file;
use crate::advice::*;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use std::path::Path;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    pub title: String,
    #[serde(rename = "electionDate")]
    pub election_date: Option<String>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DataSources {
    pub parties: String,
    pub theses: String,
    pub positions: String,
    pub issues: Option<String>,
}

impl DataSources {
    /// The default file names in a data directory. The issues are optional.
    pub fn in_directory(dir: &Path) -> DataSources {
        let issues = if dir.join("issues.json").exists() {
            Some("issues.json".to_string())
        } else {
            None
        };
        DataSources {
            parties: "parties.json".to_string(),
            theses: "theses.json".to_string(),
            positions: "positions.json".to_string(),
            issues,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSource {
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: String,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdviceRules {
    #[serde(rename = "redLineTheses", default)]
    pub red_line_theses: Vec<String>,
    #[serde(rename = "includeInactiveTheses")]
    pub include_inactive_theses: Option<bool>,
    #[serde(rename = "engagementWeights")]
    pub engagement_weights: Option<EngagementWeights>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AdviceConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: Option<OutputSettings>,
    #[serde(rename = "dataSources")]
    pub data_sources: DataSources,
    #[serde(rename = "answerSource")]
    pub answer_source: Option<AnswerSource>,
    pub rules: Option<AdviceRules>,
}

/// The reference datasets, as loaded from the files.
#[derive(PartialEq, Debug, Clone)]
pub struct Datasets {
    pub parties: Vec<Party>,
    pub theses: Vec<Thesis>,
    pub positions: Vec<PartyPosition>,
    pub issues: Option<Vec<Issue>>,
}

impl Datasets {
    /// Drops the theses that are not active anymore.
    /// The positions on these theses are kept but cannot be attributed anymore.
    pub fn without_inactive_theses(self) -> Datasets {
        let (active, inactive): (Vec<Thesis>, Vec<Thesis>) =
            self.theses.into_iter().partition(|t| t.is_active);
        if !inactive.is_empty() {
            info!(
                "Dropping {} inactive theses: {:?}",
                inactive.len(),
                inactive.iter().map(|t| t.id.as_str()).collect::<Vec<&str>>()
            );
        }
        Datasets {
            theses: active,
            ..self
        }
    }
}

pub fn read_config(path: &str) -> AdviceResult<AdviceConfig> {
    let config: AdviceConfig = read_json_file(path)?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn load_datasets(root: &Path, sources: &DataSources) -> AdviceResult<Datasets> {
    let path = |file: &str| resolve_path(root, file).display().to_string();
    let parties: Vec<Party> = read_json_file(&path(&sources.parties))?;
    let theses: Vec<Thesis> = read_json_file(&path(&sources.theses))?;
    let positions: Vec<PartyPosition> = read_json_file(&path(&sources.positions))?;
    let issues: Option<Vec<Issue>> = match &sources.issues {
        Some(f) => Some(read_json_file(&path(f))?),
        None => None,
    };
    info!(
        "Loaded {} parties, {} theses, {} positions, {:?} issues",
        parties.len(),
        theses.len(),
        positions.len(),
        issues.as_ref().map(|i| i.len())
    );
    Ok(Datasets {
        parties,
        theses,
        positions,
        issues,
    })
}

pub fn read_summary(path: &str) -> AdviceResult<JSValue> {
    let js: JSValue = read_json_file(path)?;
    debug!("read_summary: {:?}", js);
    Ok(js)
}
