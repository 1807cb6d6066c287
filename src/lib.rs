/*!
This library converts named-entity-recognition datasets between a CoNLL-style tagged format and
JSON-lines records, and scores predicted records against ground-truth records.

# FORMATS
* Tagged files: one `token ... tag` per line, a blank line between sentences. Only the first and
    the last columns are read, so CoNLL-2003 files with their POS and chunk columns can be used
    directly. Lines starting with `-DOCSTART-` are skipped. Tags follow the BIO scheme: `B-X`
    begins a span of type `X`, `I-X` extends it and `O` is outside of any span.
* Records: one JSON object per line, such as
    `{"text": "Barack Obama visited Berlin", "label": {"PER": ["Barack Obama"], "LOC": ["Berlin"]}}`.
    The keys of `label` follow the order of the label set and only types with at least one span
    are written. A `cot` field holds the rationale of the record, when rationales are aligned.
* Free-text results: `input: <text>` followed by
    `result: <name>: <description> -> <type>: <entity>, <entity>; ...` and a blank line.

# Terminology
* A label set is the ordered list of entity types we care about. The label sets of the CoNLL-2003
    and CrossNER datasets are available through `Domain`.
* A span is the text of one entity: the tokens of a `B-`/`I-` run joined by single spaces.
* Spans are compared as exact strings. A span predicted twice but present once in the ground truth
    counts as one true positive.
*/

mod bio;
mod config;
mod cot;
mod freetext;
mod io;
mod labels;
mod metrics;
mod record;
mod reporter;

// The public api starts here
pub use bio::{
    decode_sentence, read_tagged, ConversionError, SentenceDecoder, TaggedRecords,
    UnknownEntityType, DOCSTART,
};

pub use config::{NerConfig, NerConfigBuilder, ParsePolicyError, UnknownTypePolicy};

pub use cot::{align_rationales, read_rationales};

pub use freetext::{read_results, Diagnostic, DiagnosticKind, ResultParser};

pub use io::{
    convert_result_file, convert_tagged_file, evaluate_files, read_records, scores_to_json,
    write_records, NerlinesError,
};

pub use labels::{Domain, LabelSet, ParseDomainError, ParseTypeCaseError, TypeCase};

pub use metrics::{evaluate, LabelScore, MetricsError, OverallScores, Scores, SpanCounts};

pub use record::{Labels, Record};

pub use reporter::{Average, AverageParsingError, ClassMetrics, Reporter};

/// Scores the predictions and returns them as a `Reporter`, which can be prettyprinted or
/// converted into a `HashSet` of `ClassMetrics`.
///
/// * `predictions`: Predicted records
/// * `gold`: Ground-truth records, aligned by position with `predictions`
/// * `config`: Label set and parallelism
///
/// #Example
/// ```rust
/// use nerlines::{classification_report, Domain, NerConfig, Record};
///
/// let gold: Vec<Record> = vec![serde_json::from_str(
///     r#"{"text": "Obama in Berlin", "label": {"PER": ["Obama"], "LOC": ["Berlin"]}}"#,
/// )
/// .unwrap()];
/// let pred: Vec<Record> = vec![serde_json::from_str(
///     r#"{"text": "Obama in Berlin", "label": {"PER": ["Obama", "Obama"], "LOC": []}}"#,
/// )
/// .unwrap()];
///
/// let reporter = classification_report(&pred, &gold, &NerConfig::from(Domain::Conll)).unwrap();
/// let expected_report = "Class, Precision, Recall, Fscore, Support
/// Overall_Micro, 0.5000, 0.5000, 0.5000, 2
/// Overall_Macro, 0.5000, 1.0000, 0.6667, 2
/// Overall_Weighted, 0.2500, 0.5000, 0.3333, 2
/// PER, 0.5000, 1.0000, 0.6667, 1
/// LOC, 0.0000, 0.0000, 0.0000, 1
/// ORG, 0.0000, 0.0000, 0.0000, 0
/// MISC, 0.0000, 0.0000, 0.0000, 0\n";
/// assert_eq!(expected_report, reporter.to_string());
/// ```
pub fn classification_report(
    predictions: &[Record],
    gold: &[Record],
    config: &NerConfig,
) -> Result<Reporter, MetricsError> {
    let scores = evaluate(predictions, gold, config)?;
    Ok(Reporter::from(&scores))
}
