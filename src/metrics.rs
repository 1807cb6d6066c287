/**
This module computes the metrics (precision, recall, f-score) of predicted records against
ground-truth records. Entities are compared as exact strings, per entity type, and repeated
entities are matched as a multiset.
*/
use crate::config::NerConfig;
use crate::labels::LabelSet;
use crate::record::Record;
use ahash::AHashMap;
use ndarray::{prelude::*, Zip};
use ndarray_stats::{errors::MultiInputError, SummaryStatisticsExt};
use num::Num;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::cmp;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
/// Enum error encompassing the failures that could happen when computing the scores.
pub enum MetricsError {
    #[error("Cannot merge counts computed over different label sets")]
    LabelSetMismatch,
    #[error(transparent)]
    InputError(#[from] MultiInputError),
}

/// Occurrences of every distinct span of a list.
fn counter(spans: &[String]) -> AHashMap<&str, usize> {
    let mut counts = AHashMap::with_capacity(spans.len());
    for span in spans {
        *counts.entry(span.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Size of the multiset intersection of two lists of spans: a span predicted twice but present
/// once in the ground truth counts once.
fn multiset_intersection(gold: &[String], pred: &[String]) -> usize {
    let gold_counts = counter(gold);
    let pred_counts = counter(pred);
    pred_counts
        .iter()
        .filter_map(|(span, pred_count)| {
            gold_counts
                .get(span)
                .map(|gold_count| cmp::min(*gold_count, *pred_count))
        })
        .sum()
}

/// True positive, predicted and true counts of every label of a label set. The counts of a run are
/// returned as a value, and the counts of different shards of a dataset can be merged before
/// computing the scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanCounts {
    label_set: LabelSet,
    tp_sum: Array1<usize>,
    pred_sum: Array1<usize>,
    true_sum: Array1<usize>,
}

impl SpanCounts {
    pub fn new(label_set: &LabelSet) -> Self {
        let n = label_set.len();
        Self {
            label_set: label_set.clone(),
            tp_sum: Array1::zeros(n),
            pred_sum: Array1::zeros(n),
            true_sum: Array1::zeros(n),
        }
    }

    /// Counts the spans of the aligned pairs of `predictions` and `gold`. The two lists are
    /// expected to have the same length; extra records of the longer one are ignored.
    pub fn count(predictions: &[Record], gold: &[Record], label_set: &LabelSet) -> Self {
        if predictions.len() != gold.len() {
            log::warn!(
                "{} predictions for {} ground-truth records, only the first {} pairs are scored",
                predictions.len(),
                gold.len(),
                cmp::min(predictions.len(), gold.len())
            );
        }
        let mut counts = Self::new(label_set);
        for (pred, true_record) in predictions.iter().zip(gold) {
            counts.add_pair(pred, true_record);
        }
        counts
    }

    /// Adds the counts of one (prediction, ground truth) pair.
    pub fn add_pair(&mut self, pred: &Record, gold: &Record) {
        for (i, label) in self.label_set.iter().enumerate() {
            let gold_spans = gold.label.get(label);
            let pred_spans = pred.label.get(label);
            self.true_sum[i] += gold_spans.len();
            self.pred_sum[i] += pred_spans.len();
            self.tp_sum[i] += multiset_intersection(gold_spans, pred_spans);
        }
    }

    /// Sums the counts of two shards scored with the same label set.
    pub fn merge(mut self, other: &SpanCounts) -> Result<Self, MetricsError> {
        if self.label_set != other.label_set {
            return Err(MetricsError::LabelSetMismatch);
        }
        self.tp_sum += &other.tp_sum;
        self.pred_sum += &other.pred_sum;
        self.true_sum += &other.true_sum;
        Ok(self)
    }

    pub fn label_set(&self) -> &LabelSet {
        &self.label_set
    }
    pub fn tp_sum(&self) -> ArrayView1<usize> {
        self.tp_sum.view()
    }
    pub fn pred_sum(&self) -> ArrayView1<usize> {
        self.pred_sum.view()
    }
    pub fn true_sum(&self) -> ArrayView1<usize> {
        self.true_sum.view()
    }

    /// Computes the per-label and the overall scores from the counts.
    pub fn scores(&self, parallel: bool) -> Result<Scores, MetricsError> {
        let tp = self.tp_sum.mapv(|x| x as f64);
        let pred = self.pred_sum.mapv(|x| x as f64);
        let truth = self.true_sum.mapv(|x| x as f64);

        let precision = prf_divide(&tp, &pred, parallel);
        let recall = prf_divide(&tp, &truth, parallel);
        let f1 = f_score(&precision, &recall, parallel);

        let micro = {
            let tp = array![tp.sum()];
            let precision = prf_divide(&tp, &array![pred.sum()], false);
            let recall = prf_divide(&tp, &array![truth.sum()], false);
            let f1 = f_score(&precision, &recall, false);
            (precision[0], recall[0], f1[0])
        };

        let macro_avg = {
            let precision = positive_mean(&precision);
            let recall = positive_mean(&recall);
            (precision, recall, f1_of(precision, recall))
        };

        let weighted = if truth.sum() == 0.0 {
            (0.0, 0.0, 0.0)
        } else {
            let precision = precision.weighted_mean(&truth)?;
            let recall = recall.weighted_mean(&truth)?;
            (precision, recall, f1_of(precision, recall))
        };

        let labels = self
            .label_set
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let score = LabelScore {
                    precision: precision[i],
                    recall: recall[i],
                    f1: f1[i],
                    support: self.true_sum[i],
                };
                (label.clone(), score)
            })
            .collect();

        Ok(Scores {
            labels,
            overall: OverallScores {
                micro_precision: micro.0,
                micro_recall: micro.1,
                micro_f1: micro.2,
                macro_precision: macro_avg.0,
                macro_recall: macro_avg.1,
                macro_f1: macro_avg.2,
                weighted_precision: weighted.0,
                weighted_recall: weighted.1,
                weighted_f1: weighted.2,
            },
            support: self.true_sum.sum(),
        })
    }
}

/// Element-wise division where a zero denominator gives a zero result.
fn prf_divide<I>(numerator: &Array1<I>, denominator: &Array1<I>, parallel: bool) -> Array1<I>
where
    I: Num + Copy + Send + Sync,
{
    let (result, zero_mask) = if parallel {
        par_prf_divide_results_and_mask(numerator, denominator.clone())
    } else {
        prf_divide_results_and_mask(numerator, denominator.clone())
    };
    result * zero_mask
}

/// This function computes the result in parallel. For a synchronous
/// version of this function, see `prf_divide_results_and_mask`.
fn par_prf_divide_results_and_mask<I>(
    numerator: &Array1<I>,
    mut denominator: Array1<I>,
) -> (Array1<I>, Array1<I>)
where
    I: Num + Copy + Send + Sync,
{
    let zero_at_mask = Zip::from(&denominator).par_map_collect(|d| {
        if *d == I::zero() {
            I::zero()
        } else {
            I::one()
        }
    });
    denominator.par_mapv_inplace(|v| if v == I::zero() { I::one() } else { v });
    (numerator / &denominator, zero_at_mask)
}

/// This function computes the result synchronously. For a parallel
/// version of this function, see `par_prf_divide_results_and_mask`.
fn prf_divide_results_and_mask<I>(
    numerator: &Array1<I>,
    mut denominator: Array1<I>,
) -> (Array1<I>, Array1<I>)
where
    I: Num + Copy,
{
    let zero_at_mask =
        Zip::from(&denominator).map_collect(|d| if *d == I::zero() { I::zero() } else { I::one() });
    denominator.mapv_inplace(|v| if v == I::zero() { I::one() } else { v });
    (numerator / &denominator, zero_at_mask)
}

/// Harmonic mean of precision and recall, 0 where both are 0.
fn f_score(precision: &Array1<f64>, recall: &Array1<f64>, parallel: bool) -> Array1<f64> {
    let numerator = precision * recall * 2.0;
    let denominator = precision + recall;
    prf_divide(&numerator, &denominator, parallel)
}

fn f1_of(precision: f64, recall: f64) -> f64 {
    f_score(&array![precision], &array![recall], false)[0]
}

/// Mean over the strictly positive values only. Labels scoring exactly 0 are left out of the
/// denominator. Returns 0 when no value is positive.
fn positive_mean(scores: &Array1<f64>) -> f64 {
    let positives: Array1<f64> = scores.iter().copied().filter(|s| *s > 0.0).collect();
    positives.mean().unwrap_or(0.0)
}

/// Scores of a single label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of ground-truth spans of the label.
    #[serde(skip)]
    pub support: usize,
}

/// The micro, macro and weighted averages.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OverallScores {
    pub micro_precision: f64,
    pub micro_recall: f64,
    pub micro_f1: f64,
    pub macro_precision: f64,
    pub macro_recall: f64,
    pub macro_f1: f64,
    pub weighted_precision: f64,
    pub weighted_recall: f64,
    pub weighted_f1: f64,
}

/// Per-label scores, in label set order, and overall averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scores {
    #[serde(serialize_with = "serialize_ordered")]
    pub labels: Vec<(String, LabelScore)>,
    pub overall: OverallScores,
    /// Total number of ground-truth spans.
    #[serde(skip)]
    pub support: usize,
}

impl Scores {
    pub fn get(&self, label: &str) -> Option<&LabelScore> {
        self.labels.iter().find(|(l, _)| l == label).map(|(_, s)| s)
    }
}

fn serialize_ordered<S: Serializer>(
    labels: &[(String, LabelScore)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(labels.len()))?;
    for (label, score) in labels {
        map.serialize_entry(label, score)?;
    }
    map.end()
}

/// Main entrypoint of the metrics. Counts the spans of the aligned records and computes the
/// scores of every label of the config's label set.
///
/// * `predictions`: Predicted records
/// * `gold`: Ground-truth records, aligned by position with `predictions`
/// * `config`: Label set and parallelism
pub fn evaluate(
    predictions: &[Record],
    gold: &[Record],
    config: &NerConfig,
) -> Result<Scores, MetricsError> {
    SpanCounts::count(predictions, gold, config.label_set()).scores(config.parallel())
}
