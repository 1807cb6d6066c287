/**
Parser of the free-text outputs of a generative model. Each example is written as

```text
input: Marie Curie worked in Paris .
result: scientist -> person: Marie Curie; city -> location: Paris

```

The entity type of a clause is the text after the last `->` of its left part. Clauses naming a
type outside of the label set are reported and skipped, they never stop the parsing.
*/
use crate::labels::LabelSet;
use crate::record::{Labels, Record};
use std::fmt::Display;
use std::io::{self, BufRead};

const INPUT_PREFIX: &str = "input:";
const RESULT_PREFIX: &str = "result:";

/// Why a clause (or a line) was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The entity type is not part of the label set.
    UnknownType(String),
    /// The clause has no `": "` separator or no `->` in its left part.
    MalformedClause(String),
    /// A `result:` line without a preceding `input:` line.
    ResultWithoutInput,
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownType(t) => write!(f, "unrecognized label type `{}`", t),
            Self::MalformedClause(c) => write!(f, "malformed clause `{}`", c),
            Self::ResultWithoutInput => write!(f, "result line without a preceding input line"),
        }
    }
}

/// A recoverable problem found while parsing, with the line it was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based
    pub line_number: usize,
    pub content: String,
    pub kind: DiagnosticKind,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: {} (`{}`)",
            self.line_number, self.kind, self.content
        )
    }
}

/// Example being built: the input text and the entities found so far, one list per label.
struct OpenExample {
    text: String,
    entities: Vec<Vec<String>>,
}

/// Line-by-line parser of a free-text result file. Records are returned as soon as the blank line
/// closing their example is fed.
pub struct ResultParser<'a> {
    label_set: &'a LabelSet,
    current: Option<OpenExample>,
    diagnostics: Vec<Diagnostic>,
    line_number: usize,
}

impl<'a> ResultParser<'a> {
    pub fn new(label_set: &'a LabelSet) -> Self {
        Self {
            label_set,
            current: None,
            diagnostics: Vec::new(),
            line_number: 0,
        }
    }

    /// Problems met so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Feeds the next line of the file.
    pub fn feed(&mut self, raw_line: &str) -> Option<Record> {
        self.line_number += 1;
        let line = raw_line.trim();
        if let Some(text) = line.strip_prefix(INPUT_PREFIX) {
            self.current = Some(OpenExample {
                text: String::from(text.trim()),
                entities: vec![Vec::new(); self.label_set.len()],
            });
            None
        } else if let Some(result) = line.strip_prefix(RESULT_PREFIX) {
            self.parse_result(line, result.trim());
            None
        } else if line.is_empty() {
            self.close()
        } else {
            None
        }
    }

    /// Closes the example still open at the end of the input, if any.
    pub fn finish(&mut self) -> Option<Record> {
        self.close()
    }

    fn close(&mut self) -> Option<Record> {
        let example = self.current.take()?;
        let labels: Labels = self
            .label_set
            .iter()
            .cloned()
            .zip(example.entities)
            .collect();
        Some(Record::new(example.text, labels))
    }

    fn parse_result(&mut self, line: &str, result: &str) {
        if self.current.is_none() {
            self.warn(line, DiagnosticKind::ResultWithoutInput);
            return;
        }
        for clause in result.split(';').map(str::trim).filter(|c| !c.is_empty()) {
            match self.parse_clause(clause) {
                Ok((index, entities)) => {
                    if let Some(example) = self.current.as_mut() {
                        example.entities[index].extend(entities);
                    }
                }
                Err(kind) => self.warn(line, kind),
            }
        }
    }

    /// Returns the index of the entity type in the label set and the entities of the clause.
    fn parse_clause(&self, clause: &str) -> Result<(usize, Vec<String>), DiagnosticKind> {
        let (descriptor, entities) = clause
            .split_once(": ")
            .ok_or_else(|| DiagnosticKind::MalformedClause(String::from(clause)))?;
        let (_, raw_type) = descriptor
            .rsplit_once("->")
            .ok_or_else(|| DiagnosticKind::MalformedClause(String::from(clause)))?;
        let entity_type = self.label_set.case().apply(raw_type.trim());
        let index = self
            .label_set
            .position(&entity_type)
            .ok_or(DiagnosticKind::UnknownType(entity_type))?;
        let entities = entities
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(String::from)
            .collect();
        Ok((index, entities))
    }

    fn warn(&mut self, line: &str, kind: DiagnosticKind) {
        let diagnostic = Diagnostic {
            line_number: self.line_number,
            content: String::from(line),
            kind,
        };
        log::warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}

/// Parses a whole free-text result file. Returns the records and the diagnostics of the skipped
/// clauses.
pub fn read_results<R: BufRead>(
    reader: R,
    label_set: &LabelSet,
) -> io::Result<(Vec<Record>, Vec<Diagnostic>)> {
    let mut parser = ResultParser::new(label_set);
    let mut records = Vec::new();
    for line in reader.lines() {
        if let Some(record) = parser.feed(&line?) {
            records.push(record);
        }
    }
    records.extend(parser.finish());
    Ok((records, parser.into_diagnostics()))
}
