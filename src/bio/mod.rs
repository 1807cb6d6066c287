/**
This module decodes a CoNLL-style tagged file (one `token ... tag` per line, blank line between
sentences) into records. Each sentence becomes a `Record` whose labels are the entity spans merged
from the `B-`/`I-` tags.
*/
use crate::config::{NerConfig, UnknownTypePolicy};
use crate::labels::LabelSet;
use crate::record::{Labels, Record};
use itertools::Itertools;
use std::io::{self, BufRead, Lines};
use std::iter::Enumerate;
use std::mem::take;
use thiserror::Error;

mod tag;

use tag::{InnerTag, Prefix};

/// Lines starting with this marker separate documents and are not part of any sentence.
pub const DOCSTART: &str = "-DOCSTART-";

#[derive(Debug, Error)]
/// Errors raised while decoding a tagged file.
pub enum ConversionError {
    #[error("IO error while reading the tagged file: {0}")]
    Io(#[from] io::Error),
    /// The line does not contain a token and a tag.
    #[error("Malformed line {line_number}: expected `token ... tag`, found `{content}`")]
    MalformedLine { line_number: usize, content: String },
    /// Raised only with `UnknownTypePolicy::Reject`, by a `B-` tag.
    #[error("Line {line_number} (`{content}`): entity type `{entity_type}` is not part of the label set")]
    UnknownType {
        line_number: usize,
        content: String,
        entity_type: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Entity type `{0}` is not part of the label set")]
pub struct UnknownEntityType(pub String);

/// State of the span of a single entity type within the current sentence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum SpanState {
    #[default]
    Closed,
    Open(String),
}

/// Spans of one entity type. A `B-` tag closes the open span (if any) and opens a new one, an `I-`
/// tag extends the open span. `O` tags do not close anything: a later `I-` tag of the same type
/// keeps extending the last span of the sentence.
#[derive(Debug, Clone, Default)]
struct TypeAccumulator {
    state: SpanState,
    finished: Vec<String>,
}

impl TypeAccumulator {
    fn begin(&mut self, token: &str) {
        self.close();
        self.state = SpanState::Open(String::from(token));
    }

    /// Returns false when there is no open span to extend.
    fn extend(&mut self, token: &str) -> bool {
        match &mut self.state {
            SpanState::Open(text) => {
                text.push(' ');
                text.push_str(token);
                true
            }
            SpanState::Closed => false,
        }
    }

    fn close(&mut self) {
        if let SpanState::Open(text) = take(&mut self.state) {
            self.finished.push(String::from(text.trim()));
        }
    }

    fn finish(&mut self) -> Vec<String> {
        self.close();
        take(&mut self.finished)
    }
}

/// Accumulates the tokens of one sentence and the spans of every entity type of the label set.
/// `finish` turns the sentence into a `Record` and resets the decoder for the next one.
#[derive(Debug, Clone)]
pub struct SentenceDecoder<'a> {
    label_set: &'a LabelSet,
    policy: UnknownTypePolicy,
    tokens: Vec<String>,
    spans: Vec<TypeAccumulator>,
}

impl<'a> SentenceDecoder<'a> {
    pub fn new(label_set: &'a LabelSet, policy: UnknownTypePolicy) -> Self {
        Self {
            label_set,
            policy,
            tokens: Vec::new(),
            spans: vec![TypeAccumulator::default(); label_set.len()],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Adds a token and its tag to the current sentence. The token is always part of the sentence
    /// text, even when its tag is ignored. An `I-` tag without an open span of its type is dropped.
    pub fn push(&mut self, token: &str, tag: &str) -> Result<(), UnknownEntityType> {
        self.tokens.push(String::from(token));
        let inner_tag = match InnerTag::parse(tag) {
            Some(t) => t,
            None => {
                log::debug!("Ignoring unsupported tag `{}` of token `{}`", tag, token);
                return Ok(());
            }
        };
        if inner_tag.prefix == Prefix::O {
            return Ok(());
        }
        let index = match self.label_set.resolve(inner_tag.entity_type) {
            Some(i) => i,
            // An unknown type can never have an open span: its `I-` tags are orphans.
            None if inner_tag.prefix == Prefix::I => {
                log::debug!("`{}` continues no open span and is dropped", tag);
                return Ok(());
            }
            None => {
                return match self.policy {
                    UnknownTypePolicy::Reject => {
                        Err(UnknownEntityType(String::from(inner_tag.entity_type)))
                    }
                    UnknownTypePolicy::Drop => {
                        log::warn!(
                            "Dropping entity `{}` of unknown type `{}`",
                            token,
                            inner_tag.entity_type
                        );
                        Ok(())
                    }
                };
            }
        };
        // The index comes from the label set, which has one accumulator per label.
        let accumulator = &mut self.spans[index];
        match inner_tag.prefix {
            Prefix::B => accumulator.begin(token),
            Prefix::I => {
                if !accumulator.extend(token) {
                    log::debug!("`{}` continues no open span and is dropped", tag);
                }
            }
            Prefix::O => (),
        }
        Ok(())
    }

    /// Closes the sentence. Returns `None` if no token was pushed since the last call.
    pub fn finish(&mut self) -> Option<Record> {
        if self.tokens.is_empty() {
            return None;
        }
        let text = take(&mut self.tokens).into_iter().join(" ");
        let mut labels = Labels::new();
        for (entity_type, accumulator) in self.label_set.iter().zip(self.spans.iter_mut()) {
            labels.extend(entity_type, accumulator.finish());
        }
        Some(Record::new(text, labels))
    }
}

/// Decodes the spans of a single sentence given as `(token, tag)` pairs.
pub fn decode_sentence<'b, I>(
    pairs: I,
    label_set: &LabelSet,
    policy: UnknownTypePolicy,
) -> Result<Option<Record>, UnknownEntityType>
where
    I: IntoIterator<Item = (&'b str, &'b str)>,
{
    let mut decoder = SentenceDecoder::new(label_set, policy);
    for (token, tag) in pairs {
        decoder.push(token, tag)?;
    }
    Ok(decoder.finish())
}

/// Splits a non-blank line into its token (first field) and its tag (last field). Middle columns,
/// such as POS or chunk tags, are ignored.
fn split_line(line: &str) -> Option<(&str, &str)> {
    let mut fields = line.split_whitespace();
    let token = fields.next()?;
    let tag = fields.last()?;
    Some((token, tag))
}

/// This struct iterates over the lines of a tagged file and returns one record per sentence. The
/// iteration stops after the first error.
pub struct TaggedRecords<'a, R: BufRead> {
    lines: Enumerate<Lines<R>>,
    decoder: SentenceDecoder<'a>,
    done: bool,
}

impl<'a, R: BufRead> TaggedRecords<'a, R> {
    pub fn new(reader: R, config: &'a NerConfig) -> Self {
        Self {
            lines: reader.lines().enumerate(),
            decoder: SentenceDecoder::new(config.label_set(), config.unknown_types()),
            done: false,
        }
    }

    fn process_line(
        &mut self,
        line_number: usize,
        line: &str,
    ) -> Result<Option<Record>, ConversionError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(self.decoder.finish());
        }
        if trimmed.starts_with(DOCSTART) {
            return Ok(None);
        }
        let (token, tag) = split_line(trimmed).ok_or_else(|| ConversionError::MalformedLine {
            line_number,
            content: String::from(line),
        })?;
        self.decoder
            .push(token, tag)
            .map_err(|UnknownEntityType(entity_type)| ConversionError::UnknownType {
                line_number,
                content: String::from(line),
                entity_type,
            })?;
        Ok(None)
    }
}

impl<'a, R: BufRead> Iterator for TaggedRecords<'a, R> {
    type Item = Result<Record, ConversionError>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let (index, line) = match self.lines.next() {
                Some(v) => v,
                None => {
                    // Last sentence of a file without a trailing blank line
                    self.done = true;
                    return self.decoder.finish().map(Ok);
                }
            };
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    self.done = true;
                    return Some(Err(ConversionError::from(e)));
                }
            };
            match self.process_line(index + 1, &line) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Reads every sentence of a tagged file. Fails on the first malformed line.
pub fn read_tagged<R: BufRead>(
    reader: R,
    config: &NerConfig,
) -> Result<Vec<Record>, ConversionError> {
    TaggedRecords::new(reader, config).collect()
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;
    use crate::labels::{Domain, TypeCase};
    use crate::NerConfigBuilder;
    use enum_iterator::{all, Sequence};
    use quickcheck::{self, TestResult};
    use rstest::rstest;
    use std::io::Cursor;

    fn conll() -> NerConfig {
        NerConfig::default()
    }

    fn spans(record: &Record, entity_type: &str) -> Vec<String> {
        record.label.get(entity_type).to_vec()
    }

    #[test]
    fn test_decode_sentence() {
        let label_set = LabelSet::default();
        let pairs = vec![
            ("Barack", "B-PER"),
            ("Obama", "I-PER"),
            ("visited", "O"),
            ("Berlin", "B-LOC"),
        ];
        let record = decode_sentence(pairs, &label_set, UnknownTypePolicy::Drop)
            .unwrap()
            .unwrap();
        assert_eq!(record.text, "Barack Obama visited Berlin");
        let expected: Labels = vec![
            ("PER", vec![String::from("Barack Obama")]),
            ("LOC", vec![String::from("Berlin")]),
        ]
        .into_iter()
        .collect();
        assert_eq!(record.label, expected);
    }

    #[test]
    fn test_orphan_inside_tag_is_dropped() {
        let label_set = LabelSet::default();
        let pairs = vec![("in", "O"), ("Paris", "I-LOC"), ("today", "O")];
        let record = decode_sentence(pairs, &label_set, UnknownTypePolicy::Drop)
            .unwrap()
            .unwrap();
        assert_eq!(record.text, "in Paris today");
        assert!(record.label.is_empty());
    }

    #[test]
    fn test_inside_tag_extends_last_span_of_its_type() {
        let label_set = LabelSet::default();
        let pairs = vec![
            ("New", "B-LOC"),
            ("and", "O"),
            ("York", "I-LOC"),
            ("Kim", "B-PER"),
            ("Lee", "B-PER"),
            ("Jr", "I-PER"),
        ];
        let record = decode_sentence(pairs, &label_set, UnknownTypePolicy::Drop)
            .unwrap()
            .unwrap();
        assert_eq!(spans(&record, "LOC"), vec!["New York"]);
        assert_eq!(spans(&record, "PER"), vec!["Kim", "Lee Jr"]);
    }

    #[test]
    fn test_empty_sentence_gives_no_record() {
        let label_set = LabelSet::default();
        let pairs: Vec<(&str, &str)> = vec![];
        assert_eq!(
            decode_sentence(pairs, &label_set, UnknownTypePolicy::Drop).unwrap(),
            None
        );
    }

    #[test]
    fn test_unknown_type_policy() {
        let label_set = LabelSet::default();
        let pairs = vec![("Google", "B-COMPANY"), ("Inc", "I-COMPANY")];
        let dropped = decode_sentence(pairs.clone(), &label_set, UnknownTypePolicy::Drop)
            .unwrap()
            .unwrap();
        assert!(dropped.label.is_empty());
        let rejected = decode_sentence(pairs, &label_set, UnknownTypePolicy::Reject);
        assert_eq!(rejected, Err(UnknownEntityType(String::from("COMPANY"))));
    }

    #[rstest]
    #[case(UnknownTypePolicy::Drop)]
    #[case(UnknownTypePolicy::Reject)]
    fn test_inside_tag_of_unknown_type_is_an_orphan(#[case] policy: UnknownTypePolicy) {
        let label_set = LabelSet::new(["PER"], TypeCase::Upper);
        let pairs = vec![("a", "O"), ("b", "I-FOO"), ("c", "B-PER")];
        let record = decode_sentence(pairs, &label_set, policy).unwrap().unwrap();
        assert_eq!(record.text, "a b c");
        assert_eq!(spans(&record, "PER"), vec!["c"]);
        assert_eq!(record.label.len(), 1);
    }

    #[test]
    fn test_lowercase_label_set_normalizes_tags() {
        let config = NerConfigBuilder::default().domain(Domain::Ai).build();
        let input = "Yann B-Researcher\nLeCun I-Researcher\nlikes O\nCNNs B-algorithm\n";
        let records = read_tagged(Cursor::new(input), &config).unwrap();
        assert_eq!(records.len(), 1);
        let keys: Vec<&str> = records[0].label.iter().map(|(t, _)| t).collect();
        // Label set order, not order of appearance
        assert_eq!(keys, vec!["algorithm", "researcher"]);
        assert_eq!(spans(&records[0], "researcher"), vec!["Yann LeCun"]);
        assert_eq!(config.label_set().case(), TypeCase::Lower);
    }

    #[test]
    fn test_read_tagged_file() {
        let input = "-DOCSTART- -X- -X- O\n\
                     \n\
                     EU NNP B-NP B-ORG\n\
                     rejects VBZ B-VP O\n\
                     German JJ B-NP B-MISC\n\
                     call NN I-NP O\n\
                     \n\
                     \n\
                     Peter NNP B-NP B-PER\n\
                     Blackburn NNP I-NP I-PER\n";
        let records = read_tagged(Cursor::new(input), &conll()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text, "EU rejects German call");
        assert_eq!(spans(&records[0], "ORG"), vec!["EU"]);
        assert_eq!(spans(&records[0], "MISC"), vec!["German"]);
        assert_eq!(records[1].text, "Peter Blackburn");
        assert_eq!(spans(&records[1], "PER"), vec!["Peter Blackburn"]);
        assert_eq!(records[1].cot, None);
    }

    #[test]
    fn test_docstart_does_not_split_sentence() {
        let input = "A B-PER\n-DOCSTART- O\nB I-PER\n";
        let records = read_tagged(Cursor::new(input), &conll()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "A B");
        assert_eq!(spans(&records[0], "PER"), vec!["A B"]);
    }

    #[test]
    fn test_malformed_line() {
        let input = "Peter B-PER\nBlackburn\n";
        let err = read_tagged(Cursor::new(input), &conll()).unwrap_err();
        match err {
            ConversionError::MalformedLine {
                line_number,
                content,
            } => {
                assert_eq!(line_number, 2);
                assert_eq!(content, "Blackburn");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_rejected_type_reports_line() {
        let config = NerConfigBuilder::default()
            .unknown_types(UnknownTypePolicy::Reject)
            .build();
        let input = "Paris B-LOC\n\nACME B-COMPANY\n";
        let mut iter = TaggedRecords::new(Cursor::new(input), &config);
        assert!(iter.next().unwrap().is_ok());
        match iter.next().unwrap() {
            Err(ConversionError::UnknownType {
                line_number,
                entity_type,
                ..
            }) => {
                assert_eq!(line_number, 3);
                assert_eq!(entity_type, "COMPANY");
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_decoding_is_deterministic() {
        let input = "Barack B-PER\nObama I-PER\nvisited O\nBerlin B-LOC\n\nHi O\n";
        let first = read_tagged(Cursor::new(input), &conll()).unwrap();
        let second = read_tagged(Cursor::new(input), &conll()).unwrap();
        let to_json = |records: &[Record]| -> Vec<String> {
            records
                .iter()
                .map(|r| serde_json::to_string(r).unwrap())
                .collect()
        };
        assert_eq!(to_json(first.as_slice()), to_json(second.as_slice()));
    }

    #[derive(Debug, PartialEq, Hash, Clone, Sequence, Eq)]
    pub(crate) enum TagsToTest {
        BPER,
        IPER,
        BLOC,
        ILOC,
        BOTHER,
        O,
    }
    impl From<&TagsToTest> for &str {
        fn from(value: &TagsToTest) -> Self {
            match value {
                TagsToTest::BPER => "B-PER",
                TagsToTest::IPER => "I-PER",
                TagsToTest::BLOC => "B-LOC",
                TagsToTest::ILOC => "I-LOC",
                TagsToTest::BOTHER => "B-OTHER",
                TagsToTest::O => "O",
            }
        }
    }
    impl quickcheck::Arbitrary for TagsToTest {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            let choice_slice: Vec<TagsToTest> = all::<TagsToTest>().collect();
            g.choose(choice_slice.as_ref()).unwrap().clone()
        }
    }

    #[test]
    fn test_propertie_one_word_per_line() {
        fn one_word_per_line(sentences: Vec<Vec<TagsToTest>>) -> TestResult {
            let non_empty: Vec<&Vec<TagsToTest>> =
                sentences.iter().filter(|s| !s.is_empty()).collect();
            let mut input = String::new();
            for sentence in non_empty.iter() {
                for (i, tag) in sentence.iter().enumerate() {
                    let tag: &str = tag.into();
                    input.push_str(&format!("w{} POS {}\n", i, tag));
                }
                input.push('\n');
            }
            let records = match read_tagged(Cursor::new(input), &NerConfig::default()) {
                Ok(r) => r,
                Err(_) => return TestResult::failed(),
            };
            if records.len() != non_empty.len() {
                return TestResult::failed();
            }
            for (record, sentence) in records.iter().zip(non_empty) {
                if record.text.split(' ').count() != sentence.len() {
                    return TestResult::failed();
                }
                // A span is made of the words of the sentence
                if record.label.span_count() > sentence.len() {
                    return TestResult::failed();
                }
                if record.label.iter().any(|(_, spans)| spans.is_empty()) {
                    return TestResult::failed();
                }
            }
            TestResult::passed()
        }
        let mut qc = quickcheck::QuickCheck::new().tests(1000);
        qc.quickcheck(one_word_per_line as fn(Vec<Vec<TagsToTest>>) -> TestResult)
    }
}
