/*
 * File-level entrypoints. These functions read a whole input file, convert or score it, and only
 * then write the output, so that a failed run never leaves a truncated JSON-lines file behind.
 */
use crate::bio::{read_tagged, ConversionError};
use crate::config::NerConfig;
use crate::cot::{align_rationales, read_rationales};
use crate::freetext::{read_results, Diagnostic};
use crate::metrics::{evaluate, MetricsError, Scores};
use crate::record::Record;
use serde_jsonlines::{json_lines, write_json_lines};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors of the file-level functions.
pub enum NerlinesError {
    #[error("Could not open or write `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid record in `{path}`: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Could not serialize the scores: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Could not convert `{path}`: {source}")]
    Conversion {
        path: PathBuf,
        #[source]
        source: ConversionError,
    },
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> NerlinesError {
    let path = path.to_path_buf();
    move |source| NerlinesError::Io { path, source }
}

fn open(path: &Path) -> Result<BufReader<File>, NerlinesError> {
    File::open(path).map(BufReader::new).map_err(io_error(path))
}

/// Reads the records of a JSON-lines file. Empty entity lists are dropped while reading.
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<Record>, NerlinesError> {
    let path = path.as_ref();
    let lines = json_lines::<Record, _>(path).map_err(io_error(path))?;
    lines
        .collect::<io::Result<Vec<Record>>>()
        .map_err(|source| NerlinesError::Json {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes one record per line. Non-ASCII characters are written as is.
pub fn write_records<P: AsRef<Path>>(path: P, records: &[Record]) -> Result<(), NerlinesError> {
    let path = path.as_ref();
    write_json_lines(path, records).map_err(io_error(path))
}

/// Converts a CoNLL-style tagged file into a JSON-lines file and returns the number of records
/// written.
///
/// * `rationales`: File of rationale blocks to attach to the records, in order.
/// * `with_cot`: Adds a `cot` field to every record, even without a rationale file (it is then
///   empty). Passing `rationales` implies it.
pub fn convert_tagged_file<P, Q>(
    input: P,
    output: Q,
    config: &NerConfig,
    rationales: Option<&Path>,
    with_cot: bool,
) -> Result<usize, NerlinesError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let input = input.as_ref();
    let mut records =
        read_tagged(open(input)?, config).map_err(|source| NerlinesError::Conversion {
            path: input.to_path_buf(),
            source,
        })?;
    log::info!("{} sentences read from {}", records.len(), input.display());
    match rationales {
        Some(path) => {
            let rationales = read_rationales(open(path)?).map_err(io_error(path))?;
            align_rationales(&mut records, &rationales);
        }
        None if with_cot => align_rationales(&mut records, &[]),
        None => (),
    }
    write_records(output, &records)?;
    Ok(records.len())
}

/// Converts a free-text result file into a JSON-lines file. Returns the number of records written
/// and the clauses that were skipped.
pub fn convert_result_file<P, Q>(
    input: P,
    output: Q,
    config: &NerConfig,
) -> Result<(usize, Vec<Diagnostic>), NerlinesError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let input = input.as_ref();
    let (records, diagnostics) =
        read_results(open(input)?, config.label_set()).map_err(io_error(input))?;
    log::info!(
        "{} examples read from {}, {} clauses skipped",
        records.len(),
        input.display(),
        diagnostics.len()
    );
    write_records(output, &records)?;
    Ok((records.len(), diagnostics))
}

/// Pretty JSON of the scores: per-label scores in label set order, then the overall averages.
pub fn scores_to_json(scores: &Scores) -> Result<String, NerlinesError> {
    Ok(serde_json::to_string_pretty(scores)?)
}

/// Scores a prediction file against a ground-truth file, records being aligned by position.
pub fn evaluate_files<P, Q>(
    predictions: P,
    gold: Q,
    config: &NerConfig,
) -> Result<Scores, NerlinesError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let predictions = read_records(predictions)?;
    let gold = read_records(gold)?;
    Ok(evaluate(&predictions, &gold, config)?)
}
