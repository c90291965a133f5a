// Reading the answers of a voter from a CSV file.

use log::debug;
use snafu::prelude::*;

use crate::advice::*;

const THESIS_COLUMN: &str = "thesisId";
const VALUE_COLUMN: &str = "value";
const WEIGHT_COLUMN: &str = "weight";

/// Reads a file with the header `thesisId,value,weight`.
/// An empty weight is left unspecified.
pub fn read_csv_answers(path: &str) -> AdviceResult<Vec<ParsedAnswer>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let mut res: Vec<ParsedAnswer> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        // The header is on the first line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("read_csv_answers: lineno: {:?} row: {:?}", lineno, line);
        if line.iter().all(|s| s.is_empty()) {
            continue;
        }

        let thesis_id = line.get(0).context(CsvLineTooShortSnafu {
            lineno,
            column: THESIS_COLUMN,
        })?;
        let value_s = line.get(1).context(CsvLineTooShortSnafu {
            lineno,
            column: VALUE_COLUMN,
        })?;
        let value = value_s.parse::<f64>().ok().context(CsvWrongValueSnafu {
            lineno,
            column: VALUE_COLUMN,
            content: value_s,
        })?;
        let weight = match line.get(2) {
            None | Some("") => None,
            Some(weight_s) => Some(weight_s.parse::<u8>().ok().context(CsvWrongValueSnafu {
                lineno,
                column: WEIGHT_COLUMN,
                content: weight_s,
            })?),
        };

        res.push(ParsedAnswer {
            lineno: Some(lineno),
            thesis_id: thesis_id.to_string(),
            value,
            weight,
        });
    }
    Ok(res)
}
