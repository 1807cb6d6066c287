use criterion::{criterion_group, criterion_main, Criterion};
use nerlines::{
    evaluate, read_tagged, Domain, Labels, NerConfig, NerConfigBuilder, Record, SpanCounts,
};
use pprof::criterion::{Output, PProfProfiler};
use std::io::Cursor;

/// Builds `n` aligned (prediction, ground truth) pairs over the labels of a domain. One prediction
/// out of three misses its last entity and one out of five has an extra one.
fn build_records(n: usize, domain: Domain) -> (Vec<Record>, Vec<Record>) {
    let labels = domain.label_set();
    let mut predictions = Vec::with_capacity(n);
    let mut gold = Vec::with_capacity(n);
    for i in 0..n {
        let mut true_labels = Labels::new();
        let mut pred_labels = Labels::new();
        for (j, label) in labels.iter().enumerate() {
            let spans: Vec<String> = (0..(i + j) % 4)
                .map(|k| format!("entity {} {}", i, k))
                .collect();
            let mut predicted = spans.clone();
            if i % 3 == 0 {
                predicted.pop();
            }
            if i % 5 == 0 {
                predicted.push(format!("spurious {}", j));
            }
            true_labels.extend(label, spans);
            pred_labels.extend(label, predicted);
        }
        let text = format!("sentence {}", i);
        gold.push(Record::new(text.clone(), true_labels));
        predictions.push(Record::new(text, pred_labels));
    }
    (predictions, gold)
}

fn build_tagged_file(n_sentences: usize) -> String {
    let mut content = String::from("-DOCSTART- -X- -X- O\n\n");
    for i in 0..n_sentences {
        content.push_str(&format!("Barack NNP B-NP B-PER\nObama{} NNP I-NP I-PER\n", i));
        content.push_str("visited VBD B-VP O\nthe DT B-NP O\n");
        content.push_str("European NNP I-NP B-ORG\nCommission NNP I-NP I-ORG\n");
        content.push_str("in IN B-PP O\nBerlin NNP B-NP B-LOC\n. . O O\n\n");
    }
    content
}

fn benchmark_small_evaluation(c: &mut Criterion) {
    let (predictions, gold) = build_records(1_000, Domain::Conll);
    let config = NerConfig::default();
    c.bench_function("small_evaluation", |b| {
        b.iter(|| evaluate(&predictions, &gold, &config).unwrap())
    });
}

fn benchmark_big_evaluation(c: &mut Criterion) {
    let (predictions, gold) = build_records(50_000, Domain::Science);
    let config = NerConfig::from(Domain::Science);
    c.bench_function("big_evaluation", |b| {
        b.iter(|| evaluate(&predictions, &gold, &config).unwrap())
    });
}

fn benchmark_parallel_scores(c: &mut Criterion) {
    let (predictions, gold) = build_records(50_000, Domain::Science);
    let counts = SpanCounts::count(&predictions, &gold, &Domain::Science.label_set());
    c.bench_function("parallel_scores", |b| {
        b.iter(|| counts.scores(true).unwrap())
    });
}

fn benchmark_conversion(c: &mut Criterion) {
    let content = build_tagged_file(20_000);
    let config = NerConfigBuilder::default().build();
    c.bench_function("conll_conversion", |b| {
        b.iter(|| read_tagged(Cursor::new(content.as_bytes()), &config).unwrap())
    });
}

criterion_group!(
    name=evaluation_benches;
    config = Criterion::default().sample_size(50).with_profiler(PProfProfiler::new(3000, Output::Flamegraph(None)));
    targets = benchmark_small_evaluation,
    benchmark_big_evaluation,
    benchmark_parallel_scores,
    benchmark_conversion
);
criterion_main!(evaluation_benches);
