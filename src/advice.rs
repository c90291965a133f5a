use log::{debug, info, warn};

use voting_advice::builder::Builder;
use voting_advice::*;

use snafu::{prelude::*, Snafu};

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::advice::checks::*;
use crate::advice::config_reader::*;
use crate::args::Args;

pub mod checks;
pub mod config_reader;
mod io_common;
mod io_csv;
mod io_json;

#[derive(Debug, Snafu)]
pub enum AdviceError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the summary"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing line {lineno} of the CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Line {lineno} of the CSV file has no column {column}"))]
    CsvLineTooShort { lineno: usize, column: String },
    #[snafu(display("Line {lineno}: could not read the {column} from {content:?}"))]
    CsvWrongValue {
        lineno: usize,
        column: String,
        content: String,
    },
    #[snafu(display("Invalid answer: {source}"))]
    InvalidAnswer { source: AnswerError },
    #[snafu(display("The file {path} has no parent directory"))]
    MissingParentDir { path: String },
    #[snafu(display("No datasets: pass --config or --data-dir"))]
    MissingDatasets {},
    #[snafu(display("No answers: pass --input or set answerSource in the configuration"))]
    MissingAnswers {},
    #[snafu(display("The datasets failed the integrity check with {count} error(s)"))]
    IntegrityCheck { count: usize },
    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    ReferenceMismatch {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type AdviceResult<T> = Result<T, AdviceError>;

/// The answers of the voter, as read from a file.
/// This is before checking them against the theses.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ParsedAnswer {
    #[serde(skip)]
    pub lineno: Option<usize>,
    #[serde(rename = "thesisId")]
    pub thesis_id: String,
    pub value: f64,
    pub weight: Option<u8>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum Mode {
    Score,
    Metrics,
    Check,
}

fn read_mode(mode: &Option<String>) -> AdviceResult<Mode> {
    match mode.as_deref() {
        None | Some("score") => Ok(Mode::Score),
        Some("metrics") => Ok(Mode::Metrics),
        Some("check") => Ok(Mode::Check),
        Some(x) => whatever!("Unknown mode {:?}: expected score, metrics or check", x),
    }
}

// Everything needed to run, after merging the configuration and the command line.
struct Setup {
    mode: Mode,
    out: String,
    root: PathBuf,
    sources: DataSources,
    output_settings: Option<OutputSettings>,
    answers: Option<(PathBuf, String)>,
    red_lines: Vec<String>,
    include_inactive: bool,
    weights: EngagementWeights,
    now: DateTime<Utc>,
}

fn make_setup(args: &Args) -> AdviceResult<Setup> {
    let mode = read_mode(&args.mode)?;
    let config: Option<(PathBuf, AdviceConfig)> = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu {
                    path: config_path.clone(),
                })?
                .to_path_buf();
            Some((root, config))
        }
        None => None,
    };

    let (root, sources) = match (&config, &args.data_dir) {
        (Some((root, c)), _) => (root.clone(), c.data_sources.clone()),
        (None, Some(dir)) => {
            let root = PathBuf::from(dir);
            let sources = DataSources::in_directory(&root);
            (root, sources)
        }
        (None, None) => return MissingDatasetsSnafu {}.fail(),
    };

    let rules = config
        .as_ref()
        .and_then(|(_, c)| c.rules.clone())
        .unwrap_or_default();

    let answers: Option<(PathBuf, String)> = match (&args.input, &config) {
        (Some(input), _) => {
            let provider = args
                .input_type
                .clone()
                .unwrap_or_else(|| io_common::infer_provider(input));
            Some((PathBuf::from(input), provider))
        }
        (None, Some((root, c))) => c.answer_source.as_ref().map(|source| {
            let provider = source
                .provider
                .clone()
                .unwrap_or_else(|| io_common::infer_provider(&source.file_path));
            (io_common::resolve_path(root, &source.file_path), provider)
        }),
        (None, None) => None,
    };

    let red_lines = match &args.red_lines {
        Some(ids) => io_common::split_list(ids),
        None => rules.red_line_theses.clone(),
    };

    let now = match &args.now {
        Some(s) => match parse_timestamp(s) {
            Some(ts) => ts,
            None => whatever!("Could not understand the date {:?}", s),
        },
        None => Utc::now(),
    };

    let config_out = config.as_ref().and_then(|(root, c)| {
        c.output_settings
            .as_ref()
            .and_then(|s| s.output_path.as_ref())
            .map(|o| io_common::resolve_path(root, o).display().to_string())
    });
    let out = args
        .out
        .clone()
        .or(config_out)
        .unwrap_or_else(|| "stdout".to_string());

    Ok(Setup {
        mode,
        out,
        root,
        sources,
        output_settings: config.and_then(|(_, c)| c.output_settings),
        answers,
        red_lines,
        include_inactive: args.include_inactive || rules.include_inactive_theses.unwrap_or(false),
        weights: rules
            .engagement_weights
            .unwrap_or(EngagementWeights::DEFAULT_WEIGHTS),
        now,
    })
}

fn read_answers(path: &Path, provider: &str) -> AdviceResult<Vec<ParsedAnswer>> {
    let p = path.display().to_string();
    info!("Attempting to read answer file {:?}", p);
    match provider {
        "csv" => io_csv::read_csv_answers(&p),
        "json" => io_json::read_json_file(&p),
        x => whatever!("Answer provider not implemented {:?}", x),
    }
}

fn validate_answers(parsed: &[ParsedAnswer], theses: &[Thesis]) -> AdviceResult<Vec<UserAnswer>> {
    let known: HashSet<&str> = theses.iter().map(|t| t.id.as_str()).collect();
    let mut builder = Builder::new(theses).context(InvalidAnswerSnafu {})?;
    for pa in parsed.iter() {
        if !known.contains(pa.thesis_id.as_str()) {
            warn!(
                "validate_answers: line {:?}: skipping answer to unknown or inactive thesis {}",
                pa.lineno, pa.thesis_id
            );
            continue;
        }
        // Default weight of 1 if not specified
        let weight = pa.weight.unwrap_or(1);
        builder
            .answer(&pa.thesis_id, pa.value, weight)
            .context(InvalidAnswerSnafu {})?;
    }
    let answers = builder.build();
    debug!("validate_answers: {} answers", answers.len());
    Ok(answers)
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub title: Option<String>,
    #[serde(rename = "electionDate")]
    pub election_date: Option<String>,
    pub mode: String,
}

fn build_output_config(setup: &Setup, mode: &str) -> OutputConfig {
    OutputConfig {
        title: setup.output_settings.as_ref().map(|s| s.title.clone()),
        election_date: setup
            .output_settings
            .as_ref()
            .and_then(|s| s.election_date.clone()),
        mode: mode.to_string(),
    }
}

fn build_score_js(
    setup: &Setup,
    datasets: &Datasets,
    answers: &[UserAnswer],
    details: bool,
) -> AdviceResult<JSValue> {
    let results = calculate_scores(answers, &datasets.positions, &datasets.parties);
    let results = if setup.red_lines.is_empty() {
        results
    } else {
        info!("Applying red lines {:?}", setup.red_lines);
        rank_results(apply_red_line_policy(&results, &setup.red_lines))
    };
    for r in results.iter() {
        info!(
            "{:>7.2}% {} (coverage {}%, confidence {:.2})",
            r.agreement_percentage, r.party_name, r.coverage_percentage, r.confidence_score
        );
    }

    let answered = answers.iter().filter(|a| !a.is_skipped()).count();
    let mut js = json!({
        "config": build_output_config(setup, "score"),
        "answers": { "answered": answered, "skipped": answers.len() - answered },
        "redLineTheses": setup.red_lines,
        "results": serde_json::to_value(&results).context(SerializingJsonSnafu {})?,
    });
    if details {
        let mut comparisons: JSMap<String, JSValue> = JSMap::new();
        for r in results.iter() {
            let cmp = generate_detailed_comparison(answers, r);
            comparisons.insert(
                r.party_id.clone(),
                serde_json::to_value(&cmp).context(SerializingJsonSnafu {})?,
            );
        }
        js["comparisons"] = JSValue::Object(comparisons);
    }
    Ok(js)
}

/// A party as shown on its profile page.
#[derive(PartialEq, Debug, Clone, Serialize)]
struct PartyProfile<'a> {
    #[serde(rename = "partyId")]
    party_id: &'a str,
    name: &'a str,
    #[serde(rename = "shortName")]
    short_name: Option<&'a str>,
    category: PartyCategory,
    #[serde(rename = "pollPercentage")]
    poll_percentage: Option<f64>,
    metrics: Option<&'a PartyMetrics>,
}

fn build_metrics_js(setup: &Setup, datasets: &Datasets) -> AdviceResult<JSValue> {
    let metrics = calculate_party_metrics_at(
        &datasets.positions,
        &datasets.theses,
        &setup.weights,
        setup.now,
    );

    // Main parties first, then in the order of the dataset.
    let mut parties: Vec<&Party> = datasets.parties.iter().collect();
    parties.sort_by_key(|p| p.category);
    let profiles: Vec<PartyProfile> = parties
        .iter()
        .map(|p| PartyProfile {
            party_id: &p.id,
            name: &p.name,
            short_name: p.short_name.as_deref(),
            category: p.category,
            poll_percentage: p.poll_percentage,
            metrics: metrics.get(&p.id),
        })
        .collect();
    for p in profiles.iter() {
        match p.metrics {
            Some(m) => info!(
                "{}: {} positions, coverage {:.2}, top issue {:?}",
                p.name,
                m.position_count,
                m.coverage_ratio,
                m.top_issues.first().map(|i| i.issue_id.as_str())
            ),
            None => info!("{}: no positions", p.name),
        }
    }

    Ok(json!({
        "config": build_output_config(setup, "metrics"),
        "now": setup.now.to_rfc3339(),
        "profiles": serde_json::to_value(&profiles).context(SerializingJsonSnafu {})?,
    }))
}

fn build_check_js(setup: &Setup, findings: &[Finding]) -> AdviceResult<JSValue> {
    Ok(json!({
        "config": build_output_config(setup, "check"),
        "errors": count_severity(findings, Severity::Error),
        "warnings": count_severity(findings, Severity::Warning),
        "findings": serde_json::to_value(findings).context(SerializingJsonSnafu {})?,
    }))
}

// Loads the datasets and computes the summary requested by the arguments.
fn summarize(args: &Args) -> AdviceResult<(Setup, JSValue)> {
    let setup = make_setup(args)?;

    let all = load_datasets(&setup.root, &setup.sources)?;
    let findings = check_datasets(&all, setup.now);
    for f in findings.iter() {
        match f.severity {
            Severity::Error => warn!("check: error: {}", f.message),
            Severity::Warning => warn!("check: {}", f.message),
        }
    }
    let errors = count_severity(&findings, Severity::Error);

    if setup.mode == Mode::Check {
        let js = build_check_js(&setup, &findings)?;
        return Ok((setup, js));
    }
    if errors > 0 {
        warn!(
            "The datasets have {} integrity error(s), continuing with what can be used",
            errors
        );
    }

    let datasets = if setup.include_inactive {
        all
    } else {
        all.without_inactive_theses()
    };

    let js = match setup.mode {
        Mode::Score => {
            let (path, provider) = setup.answers.clone().context(MissingAnswersSnafu {})?;
            let parsed = read_answers(&path, &provider)?;
            let answers = validate_answers(&parsed, &datasets.theses)?;
            build_score_js(&setup, &datasets, &answers, args.details)?
        }
        Mode::Metrics => build_metrics_js(&setup, &datasets)?,
        Mode::Check => build_check_js(&setup, &findings)?,
    };
    Ok((setup, js))
}

/// Computes the summary requested by the arguments, without writing it.
pub fn build_summary(args: &Args) -> AdviceResult<JSValue> {
    summarize(args).map(|(_, js)| js)
}

fn write_summary(out: &str, pretty_js: &str) -> AdviceResult<()> {
    if out == "stdout" {
        println!("{}", pretty_js);
    } else {
        info!("Writing summary to {:?}", out);
        fs::write(out, pretty_js).context(WritingFileSnafu { path: out })?;
    }
    Ok(())
}

/// Runs the calculator with the given arguments.
pub fn run(args: &Args) -> AdviceResult<()> {
    let (setup, result_js) = summarize(args)?;
    let pretty_js_stats =
        serde_json::to_string_pretty(&result_js).context(SerializingJsonSnafu {})?;
    write_summary(&setup.out, &pretty_js_stats)?;

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(SerializingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            return ReferenceMismatchSnafu {}.fail();
        }
        info!("The summary matches the reference {:?}", summary_p);
    }

    if setup.mode == Mode::Check {
        let errors = result_js["errors"].as_u64().unwrap_or(0) as usize;
        ensure!(errors == 0, IntegrityCheckSnafu { count: errors });
    }
    Ok(())
}
