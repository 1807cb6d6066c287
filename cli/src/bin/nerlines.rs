use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use nerlines::{
    classification_report, convert_result_file, convert_tagged_file, evaluate, read_records,
    scores_to_json, Average, Domain, NerConfig, NerConfigBuilder, TypeCase, UnknownTypePolicy,
};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "nerlines", version, about = "Convert and score NER datasets")]
struct Cli {
    /// Raise the log level (-v: info, -vv: debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert a CoNLL-style tagged file into JSON-lines records
    Conll {
        input: PathBuf,
        output: PathBuf,
        #[command(flatten)]
        labels: LabelArgs,
        /// What to do with entity types missing from the label set
        #[arg(long, default_value = "drop")]
        unknown_types: UnknownTypePolicy,
        /// Rationale blocks to attach to the records, in order
        #[arg(long)]
        rationales: Option<PathBuf>,
        /// Write a `cot` field even without a rationale file
        #[arg(long)]
        with_cot: bool,
    },
    /// Convert a free-text result file into JSON-lines records
    Results {
        input: PathBuf,
        output: PathBuf,
        #[command(flatten)]
        labels: LabelArgs,
    },
    /// Score a prediction file against a ground-truth file
    Eval {
        predictions: PathBuf,
        gold: PathBuf,
        #[command(flatten)]
        labels: LabelArgs,
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
        /// Only print the lines of these averages (none, micro, macro, weighted) in the table.
        /// `none` selects the per-label lines
        #[arg(long, value_delimiter = ',')]
        average: Option<Vec<Average>>,
        /// Parallelize the divisions of the metrics
        #[arg(long)]
        parallel: bool,
    },
    /// List the known domains and their label sets
    Domains,
}

#[derive(Debug, Args)]
struct LabelArgs {
    /// Use the label set of a known domain
    #[arg(long, conflicts_with = "labels")]
    domain: Option<Domain>,
    /// Comma separated list of entity types
    #[arg(long, value_delimiter = ',')]
    labels: Option<Vec<String>>,
    /// Case convention of the entity types. Defaults to the domain's convention, or to the case
    /// the labels are written in (`verbatim` when they mix cases)
    #[arg(long)]
    case: Option<TypeCase>,
}

impl LabelArgs {
    fn builder(&self) -> NerConfigBuilder {
        let mut builder = NerConfigBuilder::default();
        if let Some(domain) = self.domain {
            builder = builder.domain(domain);
        }
        if let Some(labels) = &self.labels {
            builder = builder.labels(labels.iter().map(String::as_str));
        }
        if let Some(case) = self.case {
            builder = builder.case(case);
        }
        builder
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Json,
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Command::Conll {
            input,
            output,
            labels,
            unknown_types,
            rationales,
            with_cot,
        } => {
            let config = labels.builder().unknown_types(unknown_types).build();
            log::debug!("{}", config);
            let written = convert_tagged_file(
                &input,
                &output,
                &config,
                rationales.as_deref(),
                with_cot,
            )
            .with_context(|| format!("Failed to convert {}", input.display()))?;
            println!("{} records written to {}", written, output.display());
        }
        Command::Results {
            input,
            output,
            labels,
        } => {
            let config = labels.builder().build();
            let (written, diagnostics) = convert_result_file(&input, &output, &config)
                .with_context(|| format!("Failed to convert {}", input.display()))?;
            println!("{} records written to {}", written, output.display());
            if !diagnostics.is_empty() {
                eprintln!("{} clauses skipped", diagnostics.len());
            }
        }
        Command::Eval {
            predictions,
            gold,
            labels,
            format,
            average,
            parallel,
        } => {
            let config = labels.builder().parallel(parallel).build();
            run_eval(&predictions, &gold, &config, format, average.as_deref())?;
        }
        Command::Domains => {
            for domain in Domain::all() {
                println!("{}: {}", domain, domain.label_set());
            }
        }
    }
    Ok(())
}

fn run_eval(
    predictions: &Path,
    gold: &Path,
    config: &NerConfig,
    format: Format,
    averages: Option<&[Average]>,
) -> Result<()> {
    let predictions = read_records(predictions)
        .with_context(|| format!("Failed to read predictions {}", predictions.display()))?;
    let gold = read_records(gold)
        .with_context(|| format!("Failed to read ground truth {}", gold.display()))?;
    match format {
        Format::Table => {
            let reporter = classification_report(&predictions, &gold, config)?;
            match averages {
                Some(averages) => print!("{}", reporter.filtered(averages)),
                None => print!("{}", reporter),
            }
        }
        Format::Json => {
            let scores = evaluate(&predictions, &gold, config)?;
            println!("{}", scores_to_json(&scores)?);
        }
    }
    Ok(())
}
