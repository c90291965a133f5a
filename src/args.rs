use clap::Parser;

/// This is a voting advice calculator: it matches the answers of a voter with the positions of the parties.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON configuration naming the datasets, the answers and the rules.
    /// For more information about the file format, read the manual of the voting_advice crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory, optional) A directory containing parties.json, theses.json, positions.json
    /// and optionally issues.json. Used when no configuration is given.
    #[clap(short, long, value_parser)]
    pub data_dir: Option<String>,

    /// (file path) A reference file containing the expected summary in JSON format. If provided, kalkulacka will
    /// check that the computed output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) The answers of the voter. Setting this option overrides the answer source
    /// of the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (csv or json) The type of the answers file. By default, it is guessed from the file extension.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default score) What to compute: 'score' matches the answers with the parties, 'metrics' computes
    /// the engagement of the parties, 'check' only checks the datasets.
    #[clap(short, long, value_parser)]
    pub mode: Option<String>,

    /// (list of comma-separated thesis ids or not specified) The theses on which a strong disagreement
    /// is penalized. Overrides the red lines of the configuration.
    #[clap(long, value_parser)]
    pub red_lines: Option<Vec<String>>,

    /// If passed as an argument, the summary includes the agreements and disagreements with each party.
    #[clap(long, takes_value = false)]
    pub details: bool,

    /// (date, optional) The reference date for the recency of the positions. Defaults to the current time.
    #[clap(long, value_parser)]
    pub now: Option<String>,

    /// If passed as an argument, the inactive theses are kept.
    #[clap(long, takes_value = false)]
    pub include_inactive: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
