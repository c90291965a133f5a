use std::fs::File;
use std::io::BufReader;

use log::debug;
use serde::de::DeserializeOwned;
use snafu::prelude::*;

use crate::advice::*;

/// Reads any JSON file: the configuration, the datasets, the answers or a reference summary.
pub fn read_json_file<T: DeserializeOwned>(path: &str) -> AdviceResult<T> {
    debug!("read_json_file: {:?}", path);
    let file = File::open(path).context(OpeningJsonSnafu { path })?;
    let reader = BufReader::new(file);
    let value: T = serde_json::from_reader(reader).context(ParsingJsonSnafu { path })?;
    Ok(value)
}
