/**
This modules gives a few tools to prettyprint the scores of all the labels and the overall
metrics.
*/
use crate::metrics::Scores;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;
use std::str::FromStr;
use thiserror::Error;

/// The reporter holds the metrics of every label and the overall metrics. It can be used to
/// display the results (i.e. prettyprint them) as if they were collected into a dataframe and can
/// be consumed to obtain a `HashSet` containing the metrics. The reporter can be built with the
/// `classification_report` function.
///
/// # Example
///
/// ```rust
/// use nerlines::{classification_report, Labels, NerConfigBuilder, Record};
///
/// let gold = vec![Record::new(
///     String::from("Barack Obama visited Berlin"),
///     vec![("PER", vec![String::from("Barack Obama")]), ("LOC", vec![String::from("Berlin")])]
///         .into_iter()
///         .collect::<Labels>(),
/// )];
/// let pred = vec![Record::new(
///     String::from("Barack Obama visited Berlin"),
///     vec![("PER", vec![String::from("Obama")]), ("LOC", vec![String::from("Berlin")])]
///         .into_iter()
///         .collect::<Labels>(),
/// )];
/// let config = NerConfigBuilder::default().labels(["PER", "LOC"]).build();
/// let reporter = classification_report(&pred, &gold, &config).unwrap();
///
/// let expected_report = "Class, Precision, Recall, Fscore, Support
/// Overall_Micro, 0.5000, 0.5000, 0.5000, 2
/// Overall_Macro, 1.0000, 1.0000, 1.0000, 2
/// Overall_Weighted, 0.5000, 0.5000, 0.5000, 2
/// PER, 0.0000, 0.0000, 0.0000, 1
/// LOC, 1.0000, 1.0000, 1.0000, 1\n";
///
/// assert_eq!(expected_report, reporter.to_string());
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Reporter {
    pub(crate) classes: Vec<ClassMetrics>,
}

/// By converting the reporter into a `HashSet` of `ClassMetrics`, you lose the ordering of the
/// report. If you mean to consume the data without prettypriting it, this is not a problem.
impl From<Reporter> for HashSet<ClassMetrics> {
    fn from(value: Reporter) -> Self {
        value.classes.into_iter().collect()
    }
}

impl From<&Scores> for Reporter {
    fn from(value: &Scores) -> Self {
        let overall = &value.overall;
        let mut classes = vec![
            ClassMetrics::new_overall(
                Average::Micro,
                overall.micro_precision,
                overall.micro_recall,
                overall.micro_f1,
                value.support,
            ),
            ClassMetrics::new_overall(
                Average::Macro,
                overall.macro_precision,
                overall.macro_recall,
                overall.macro_f1,
                value.support,
            ),
            ClassMetrics::new_overall(
                Average::Weighted,
                overall.weighted_precision,
                overall.weighted_recall,
                overall.weighted_f1,
                value.support,
            ),
        ];
        classes.extend(value.labels.iter().map(|(label, score)| ClassMetrics {
            class: label.clone(),
            average: Average::None,
            precision: score.precision,
            recall: score.recall,
            fscore: score.f1,
            support: score.support,
        }));
        Reporter { classes }
    }
}

impl Reporter {
    pub fn iter(&self) -> std::slice::Iter<'_, ClassMetrics> {
        self.classes.iter()
    }

    /// Keeps the lines computed with one of the given averages, in their original order.
    /// `Average::None` selects the lines of the individual labels.
    pub fn filtered(&self, averages: &[Average]) -> Reporter {
        Reporter {
            classes: self
                .iter()
                .filter(|c| averages.contains(&c.average))
                .cloned()
                .collect(),
        }
    }
}

/// The Reporter struct acts as a dataframe when displayed.
impl Display for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Class, Precision, Recall, Fscore, Support")?;
        for v in self.classes.iter() {
            writeln!(f, "{}", v)?
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Datastructure holding metrics about a given label or about an average.
pub struct ClassMetrics {
    /// The label, such as "PER", "location", or the name of the average.
    pub class: String,
    /// The average used to compute this class' metrics
    pub average: Average,
    /// Precision metric
    pub precision: f64,
    /// Recall metric
    pub recall: f64,
    /// Fscore metric
    pub fscore: f64,
    /// Support metric
    pub support: usize,
}

impl ClassMetrics {
    pub(crate) fn new_overall(
        average: Average,
        precision: f64,
        recall: f64,
        fscore: f64,
        support: usize,
    ) -> Self {
        ClassMetrics {
            class: format!("Overall_{}", average),
            average,
            precision,
            recall,
            fscore,
            support,
        }
    }
}

impl Hash for ClassMetrics {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.class.hash(state);
        self.average.hash(state)
    }
}

impl PartialEq for ClassMetrics {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && self.average == other.average
    }
}
impl Eq for ClassMetrics {}

/// The Classmetrics struct acts as a line in a dataframe when displayed.
impl Display for ClassMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {:.4}, {:.4}, {:.4}, {}",
            self.class, self.precision, self.recall, self.fscore, self.support
        )
    }
}

/// Enumeration of the different types of averaging reported by this crate. &str can be parsed to
/// create an `Average`.
#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum Average {
    None,
    Micro,
    Macro,
    Weighted,
}
impl Display for Average {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Error)]
#[error("Impossible to parse the string ({0}) into an Average")]
pub struct AverageParsingError(String);

impl FromStr for Average {
    type Err = AverageParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Average::None),
            "micro" => Ok(Average::Micro),
            "macro" => Ok(Average::Macro),
            "weighted" => Ok(Average::Weighted),
            _ => Err(AverageParsingError(String::from(s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{LabelScore, OverallScores};
    use rstest::rstest;

    fn build_scores() -> Scores {
        Scores {
            labels: vec![
                (
                    String::from("PER"),
                    LabelScore {
                        precision: 0.5,
                        recall: 1.0,
                        f1: 2.0 / 3.0,
                        support: 1,
                    },
                ),
                (
                    String::from("LOC"),
                    LabelScore {
                        precision: 0.0,
                        recall: 0.0,
                        f1: 0.0,
                        support: 0,
                    },
                ),
            ],
            overall: OverallScores {
                micro_precision: 0.5,
                micro_recall: 1.0,
                micro_f1: 2.0 / 3.0,
                ..Default::default()
            },
            support: 1,
        }
    }

    #[test]
    fn test_reporter_output() {
        let reporter = Reporter::from(&build_scores());
        let expected = "Class, Precision, Recall, Fscore, Support
Overall_Micro, 0.5000, 1.0000, 0.6667, 1
Overall_Macro, 0.0000, 0.0000, 0.0000, 1
Overall_Weighted, 0.0000, 0.0000, 0.0000, 1
PER, 0.5000, 1.0000, 0.6667, 1
LOC, 0.0000, 0.0000, 0.0000, 0\n";
        assert_eq!(reporter.to_string(), expected);
    }

    #[test]
    fn test_reporter_into_hashset() {
        let set: HashSet<ClassMetrics> = Reporter::from(&build_scores()).into();
        assert_eq!(set.len(), 5);
        let key = ClassMetrics {
            class: String::from("PER"),
            average: Average::None,
            precision: 0.0,
            recall: 0.0,
            fscore: 0.0,
            support: 0,
        };
        assert_eq!(set.get(&key).unwrap().precision, 0.5);
    }

    #[test]
    fn test_reporter_filtered_by_average() {
        let reporter = Reporter::from(&build_scores());
        let overall = reporter.filtered(&["micro".parse().unwrap(), "macro".parse().unwrap()]);
        let classes: Vec<&str> = overall.iter().map(|c| c.class.as_str()).collect();
        assert_eq!(classes, vec!["Overall_Micro", "Overall_Macro"]);

        let labels = reporter.filtered(&[Average::None]);
        let expected = "Class, Precision, Recall, Fscore, Support
PER, 0.5000, 1.0000, 0.6667, 1
LOC, 0.0000, 0.0000, 0.0000, 0\n";
        assert_eq!(labels.to_string(), expected);
        assert!(reporter.filtered(&[]).iter().next().is_none());
    }

    #[test]
    fn test_average_from_str_error() {
        let err = "harmonic".parse::<Average>().unwrap_err();
        assert_eq!(err, AverageParsingError(String::from("harmonic")));
    }

    #[rstest]
    #[case("micro", Average::Micro)]
    #[case("MACRO", Average::Macro)]
    #[case("Weighted", Average::Weighted)]
    #[case("none", Average::None)]
    fn test_average_from_str(#[case] input: &str, #[case] expected: Average) {
        assert_eq!(input.parse::<Average>().unwrap(), expected);
    }
}
