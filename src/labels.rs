/**
This module holds the label sets (the entity types we care about) of the supported domains. A
`Domain` maps to a fixed, ordered `LabelSet` through a lookup table.
*/
use enum_iterator::{all, Sequence};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

const CONLL_LABELS: &[&str] = &["PER", "LOC", "ORG", "MISC"];

const LITERATURE_LABELS: &[&str] = &[
    "book",
    "writer",
    "award",
    "poem",
    "event",
    "magazine",
    "person",
    "location",
    "organisation",
    "country",
    "misc",
    "literarygenre",
];

const POLITICS_LABELS: &[&str] = &[
    "politician",
    "person",
    "organisation",
    "politicalparty",
    "event",
    "election",
    "country",
    "location",
    "misc",
];

const SCIENCE_LABELS: &[&str] = &[
    "scientist",
    "person",
    "university",
    "organisation",
    "country",
    "location",
    "discipline",
    "enzyme",
    "protein",
    "chemicalcompound",
    "chemicalelement",
    "event",
    "astronomicalobject",
    "academicjournal",
    "award",
    "theory",
    "misc",
];

const MUSIC_LABELS: &[&str] = &[
    "musicgenre",
    "song",
    "band",
    "album",
    "musicalartist",
    "musicalinstrument",
    "award",
    "event",
    "country",
    "location",
    "organisation",
    "person",
    "misc",
];

const AI_LABELS: &[&str] = &[
    "field",
    "task",
    "product",
    "algorithm",
    "researcher",
    "metrics",
    "university",
    "country",
    "person",
    "organisation",
    "location",
    "misc",
    "conference",
    "programlang",
];

/// The datasets we know the label set of. `Conll` is the CoNLL-2003 dataset, the others are the
/// CrossNER domains.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Sequence, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Conll,
    Literature,
    Politics,
    Science,
    Music,
    Ai,
}

impl Domain {
    /// Returns the entity types of the domain, in their canonical order.
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            Self::Conll => CONLL_LABELS,
            Self::Literature => LITERATURE_LABELS,
            Self::Politics => POLITICS_LABELS,
            Self::Science => SCIENCE_LABELS,
            Self::Music => MUSIC_LABELS,
            Self::Ai => AI_LABELS,
        }
    }

    /// CoNLL-2003 types are written in uppercase, CrossNER types in lowercase.
    pub fn case(&self) -> TypeCase {
        match self {
            Self::Conll => TypeCase::Upper,
            _ => TypeCase::Lower,
        }
    }

    pub fn label_set(&self) -> LabelSet {
        LabelSet::new(self.labels().iter().copied(), self.case())
    }

    /// Every known domain, in declaration order.
    pub fn all() -> impl Iterator<Item = Domain> {
        all::<Domain>()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Conll => "conll",
            Self::Literature => "literature",
            Self::Politics => "politics",
            Self::Science => "science",
            Self::Music => "music",
            Self::Ai => "ai",
        }
    }
}

impl Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown domain `{0}`. Expected one of: conll, literature, politics, science, music, ai")]
pub struct ParseDomainError(pub String);

impl FromStr for Domain {
    type Err = ParseDomainError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        // `technology` is the name the result files of the `ai` domain were produced under.
        if lowered == "technology" {
            return Ok(Domain::Ai);
        }
        Domain::all()
            .find(|d| d.name() == lowered)
            .ok_or_else(|| ParseDomainError(String::from(s)))
    }
}

/// The case convention of the entity types. The suffix of a `B-`/`I-` tag is converted to this
/// case before being looked up in the label set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeCase {
    #[default]
    Upper,
    Lower,
    /// Types are compared exactly as written.
    Verbatim,
}

impl TypeCase {
    pub fn apply(&self, entity_type: &str) -> String {
        match self {
            Self::Upper => entity_type.to_uppercase(),
            Self::Lower => entity_type.to_lowercase(),
            Self::Verbatim => String::from(entity_type),
        }
    }

    /// Case convention followed by a list of types: `Lower` when they hold lowercase letters only,
    /// `Verbatim` when they mix both cases, `Upper` otherwise (including lists without letters).
    pub fn infer<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (mut has_upper, mut has_lower) = (false, false);
        for label in labels {
            let label = label.as_ref();
            has_upper |= label.chars().any(char::is_uppercase);
            has_lower |= label.chars().any(char::is_lowercase);
        }
        match (has_upper, has_lower) {
            (false, true) => Self::Lower,
            (true, true) => Self::Verbatim,
            _ => Self::Upper,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Impossible to parse the string ({0}) into a TypeCase. Expected `upper`, `lower` or `verbatim`")]
pub struct ParseTypeCaseError(pub String);

impl FromStr for TypeCase {
    type Err = ParseTypeCaseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "upper" | "uppercase" => Ok(Self::Upper),
            "lower" | "lowercase" => Ok(Self::Lower),
            "verbatim" | "keep" => Ok(Self::Verbatim),
            _ => Err(ParseTypeCaseError(String::from(s))),
        }
    }
}

/// Ordered set of valid entity types. The order is the order of the keys in the produced records
/// and of the lines in the metrics report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSet {
    labels: Vec<String>,
    case: TypeCase,
}

impl LabelSet {
    /// Builds a label set. Every label is normalized to `case` and duplicates are removed, keeping
    /// the first occurrence.
    pub fn new<I, S>(labels: I, case: TypeCase) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for label in labels {
            let label = case.apply(label.as_ref().trim());
            if !label.is_empty() && !normalized.contains(&label) {
                normalized.push(label);
            }
        }
        Self {
            labels: normalized,
            case,
        }
    }

    pub fn case(&self) -> TypeCase {
        self.case
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.labels.iter()
    }

    /// Position of an (already normalized) entity type in the set.
    pub fn position(&self, entity_type: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == entity_type)
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.position(entity_type).is_some()
    }

    /// Converts a raw entity type to the case of the set and returns its position, if it is part
    /// of the set.
    pub fn resolve(&self, raw_type: &str) -> Option<usize> {
        self.position(&self.case.apply(raw_type.trim()))
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(|s| s.as_str())
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Domain::Conll.label_set()
    }
}

impl From<Domain> for LabelSet {
    fn from(value: Domain) -> Self {
        value.label_set()
    }
}

impl<'a> IntoIterator for &'a LabelSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;
    fn into_iter(self) -> Self::IntoIter {
        self.labels.iter()
    }
}

impl Display for LabelSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", itertools::join(self.labels.iter(), ", "))
    }
}
