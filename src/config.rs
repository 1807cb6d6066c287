/*
 * This modules contains the `NerConfig` struct and its builder. The config gathers the label set
 * used to validate entity types, the policy applied to types missing from that set and whether the
 * metrics can use multiple cores. It can be passed to the conversion and evaluation functions to
 * simplify their arguments.
*/
use crate::labels::{Domain, LabelSet, TypeCase};
use either::Either as LeftOrRight;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// What to do when a `B-`/`I-` tag names an entity type that is not part of the label set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownTypePolicy {
    /// Log a warning and ignore the tag. The token is still part of the sentence text.
    #[default]
    Drop,
    /// Stop the conversion with an error.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not parse `{0}` into an `UnknownTypePolicy`. Expected `drop` or `reject`")]
pub struct ParsePolicyError(pub String);

impl FromStr for UnknownTypePolicy {
    type Err = ParsePolicyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "drop" | "ignore" => Ok(Self::Drop),
            "reject" | "error" => Ok(Self::Reject),
            _ => Err(ParsePolicyError(String::from(s))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// Config struct used to simplify the inputs of the main functions of `nerlines`. It implements
/// the default trait, which uses the CoNLL-2003 label set.
pub struct NerConfig {
    /// The valid entity types, in output order, with their case convention.
    label_set: LabelSet,
    /// Behaviour of the BIO decoder when it meets a type missing from `label_set`. The free-text
    /// parser always warns and continues.
    unknown_types: UnknownTypePolicy,
    /// Can we use multiple cores to compute the metrics? Only the divisions are parallelized, it
    /// pays off with very large label sets only.
    parallel: bool,
}

impl NerConfig {
    pub fn new(label_set: LabelSet) -> Self {
        Self {
            label_set,
            unknown_types: UnknownTypePolicy::default(),
            parallel: false,
        }
    }
    pub fn label_set(&self) -> &LabelSet {
        &self.label_set
    }
    pub fn unknown_types(&self) -> UnknownTypePolicy {
        self.unknown_types
    }
    pub fn parallel(&self) -> bool {
        self.parallel
    }
}

impl Default for NerConfig {
    fn default() -> Self {
        Self::new(LabelSet::default())
    }
}

impl From<Domain> for NerConfig {
    fn from(value: Domain) -> Self {
        Self::new(value.label_set())
    }
}

impl From<NerConfigBuilder> for NerConfig {
    fn from(value: NerConfigBuilder) -> Self {
        let label_set = match value.labels {
            LeftOrRight::Left(labels) => {
                // Without an explicit case, the labels keep the convention they were written in.
                let case = value.case.unwrap_or_else(|| TypeCase::infer(&labels));
                LabelSet::new(labels, case)
            }
            LeftOrRight::Right(domain) => match value.case {
                // Keeps the domain's types but forces another case convention.
                Some(case) if case != domain.case() => LabelSet::new(domain.labels(), case),
                _ => domain.label_set(),
            },
        };
        Self {
            label_set,
            unknown_types: value.unknown_types,
            parallel: value.parallel,
        }
    }
}

impl Display for NerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Labels: [{}]\n Type case: {:?}\n Unknown types: {:?}\n Using parallel computations: {}",
            self.label_set, self.label_set.case(), self.unknown_types, self.parallel
        )
    }
}

/// This builder can be used to build and customize a `NerConfig` structure. The label set is
/// either an explicit list of types or the label set of a `Domain`.
#[derive(Debug, Clone)]
pub struct NerConfigBuilder {
    labels: LeftOrRight<Vec<String>, Domain>,
    case: Option<TypeCase>,
    unknown_types: UnknownTypePolicy,
    parallel: bool,
}

impl Default for NerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NerConfigBuilder {
    pub fn new() -> Self {
        Self {
            labels: LeftOrRight::Right(Domain::Conll),
            case: None,
            unknown_types: UnknownTypePolicy::Drop,
            parallel: false,
        }
    }
    pub fn domain(mut self, domain: Domain) -> Self {
        self.labels = LeftOrRight::Right(domain);
        self
    }
    pub fn labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = LeftOrRight::Left(labels.into_iter().map(Into::into).collect());
        self
    }
    pub fn case(mut self, case: TypeCase) -> Self {
        self.case = Some(case);
        self
    }
    pub fn unknown_types(mut self, policy: UnknownTypePolicy) -> Self {
        self.unknown_types = policy;
        self
    }
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
    pub fn build(self) -> NerConfig {
        NerConfig::from(self)
    }
}
