//! Dronesense - RF drone detection from spectrogram raster features.
//!
//! Recordings are turned into STFT spectrograms, rendered onto a fixed square
//! raster and flattened into normalized feature vectors. Models are selected
//! by stratified cross-validation and evaluated on a held-out partition.

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod constants;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod signal;
pub mod training;

use clap::Parser;
use cli::{Cli, Command, ConfigAction};
use config::{
    Config, ModelFamily, Task, load_config, resolve_config_path, save_config, validate_config,
    validate_grid,
};
use dataset::{Corpus, LabelSet, stratified_split};
use model::{HyperparameterGrid, learner_for};
use output::{
    CorpusSummary, Failure, ModelReport, RunReport, TaskReport, create_fit_progress,
    create_recording_progress, finish_progress, read_feature_table, write_failures,
    write_feature_tables,
};
use pipeline::{collect_corpus, process_corpus};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};
use training::{Trainer, TrainerSettings};

pub use error::{Error, Result};

/// Main entry point for the dronesense CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    let progress = cli.progress_enabled();

    if let Command::Config { action } = cli.command {
        return handle_config_command(action, cli.config.as_deref());
    }

    let mut config = load_config(cli.config.as_deref())?;
    cli.overrides.apply(&mut config);
    validate_config(&config)?;
    init_thread_pool(config.processing.threads)?;

    match cli.command {
        Command::Extract { corpus, output } => {
            extract(&corpus, &output, &config, progress)?;
            Ok(())
        }
        Command::Train {
            table,
            output,
            task,
            family,
        } => {
            let label_set = LabelSet::new(&config.dataset.classes);
            let feature_len = config.raster.size * config.raster.size;
            let corpus = read_feature_table(
                &table,
                &label_set,
                feature_len,
                &config.dataset.background_class,
            )?;
            let selection = Selection::new(&config, task, family);
            train(&corpus, 0, &output, &config, &selection, progress)?;
            Ok(())
        }
        Command::Run { corpus, output } => {
            let extraction = extract(&corpus, &output, &config, progress)?;
            let selection = Selection::new(&config, None, None);
            train(
                &extraction.corpus,
                extraction.failures.len(),
                &output,
                &config,
                &selection,
                progress,
            )?;
            Ok(())
        }
        Command::Config { .. } => Ok(()),
    }
}

/// Corpus produced by [`extract`] and the files it wrote.
#[derive(Debug)]
pub struct Extraction {
    /// Labeled feature vectors.
    pub corpus: Corpus,
    /// Recordings that could not be processed.
    pub failures: Vec<Failure>,
    /// Feature tables written, one per configured format.
    pub tables: Vec<PathBuf>,
}

/// Turn a corpus tree into rasters, feature tables and a failure log.
///
/// # Errors
///
/// Fails when the corpus root is missing, a declared class has no usable
/// recording, or an output artifact cannot be written. Individual
/// recordings that fail are logged and skipped.
pub fn extract(
    corpus_root: &Path,
    output_dir: &Path,
    config: &Config,
    progress: bool,
) -> Result<Extraction> {
    let start = Instant::now();
    let entries = collect_corpus(corpus_root, &config.dataset.classes)?;
    info!(
        "Found {} recording(s) in {} class(es)",
        entries.len(),
        config.dataset.classes.len()
    );

    create_output_dir(output_dir)?;
    let raster_dir = config.output.save_rasters.then_some(output_dir);

    let pb = create_recording_progress(entries.len(), progress);
    let outcome = process_corpus(&entries, config, raster_dir, pb.as_ref());
    finish_progress(pb, "Extraction complete");
    let outcome = outcome?;

    let tables = write_feature_tables(&outcome.corpus, output_dir, &config.output.formats)?;
    write_failures(&output_dir.join(constants::output::FAILURE_LOG), &outcome.failures)?;

    if !outcome.failures.is_empty() {
        warn!(
            "{} recording(s) failed, see {}",
            outcome.failures.len(),
            output_dir.join(constants::output::FAILURE_LOG).display()
        );
    }
    info!(
        "Extracted {} feature vectors of length {} in {:.1}s",
        outcome.corpus.len(),
        outcome.corpus.n_features(),
        start.elapsed().as_secs_f64()
    );

    Ok(Extraction {
        corpus: outcome.corpus,
        failures: outcome.failures,
        tables,
    })
}

/// Label views and learner families to train.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Label views, in training order.
    pub tasks: Vec<Task>,
    /// Learner families, in training order.
    pub families: Vec<ModelFamily>,
}

impl Selection {
    /// Configured tasks and families, narrowed to `task`/`family` when given.
    pub fn new(config: &Config, task: Option<Task>, family: Option<ModelFamily>) -> Self {
        Self {
            tasks: task.map_or_else(|| config.training.tasks.clone(), |t| vec![t]),
            families: family.map_or_else(|| config.training.families.clone(), |f| vec![f]),
        }
    }
}

/// Seed of the training/hold-out split for `task`.
///
/// The multiclass split draws from its own stream so it does not mirror
/// the binary one.
pub const fn partition_seed(config: &Config, task: Task) -> u64 {
    match task {
        Task::Binary => config.dataset.seed,
        Task::Multiclass => config.dataset.seed.wrapping_add(1),
    }
}

/// Partition, select, refit and evaluate every selected task and family.
///
/// Writes `report.json` under `output_dir` and prints each hold-out
/// confusion matrix.
///
/// # Errors
///
/// Fails when a partition would lose a class, a grid is invalid, every
/// combination of a family is unusable, or the final refit fails.
#[allow(clippy::print_stdout)]
pub fn train(
    corpus: &Corpus,
    failures: usize,
    output_dir: &Path,
    config: &Config,
    selection: &Selection,
    progress: bool,
) -> Result<RunReport> {
    create_output_dir(output_dir)?;
    let settings = TrainerSettings::from(&config.training);
    let mut tasks = Vec::with_capacity(selection.tasks.len());

    for &task in &selection.tasks {
        let dataset = corpus.view(task);
        let seed = partition_seed(config, task);
        let partition = stratified_split(&dataset, config.dataset.train_fraction, seed)?;
        info!(
            "{task}: {} training / {} hold-out observations",
            partition.training.len(),
            partition.holdout.len()
        );

        let mut models = Vec::with_capacity(selection.families.len());
        for &family in &selection.families {
            validate_grid(config, family)?;
            let grid = HyperparameterGrid::new(config.training.grids.for_family(family).clone());
            let learner = learner_for(family);
            let trainer = Trainer::new(learner.as_ref(), settings);

            let pb = create_fit_progress(
                grid.len() * settings.folds,
                &format!("{task} {family}"),
                progress,
            );
            let cross_validation = trainer.cross_validate(&partition.training, &grid, pb.as_ref());
            finish_progress(pb, "Cross-validation complete");

            let selected = cross_validation.select()?.params.clone();
            info!("{task} {family}: selected [{selected}]");

            let pipeline = trainer.fit_final(&partition.training, &selected)?;
            let evaluation = evaluation::evaluate(&pipeline, &partition.holdout)?;

            println!("{task} / {family} [{selected}]");
            println!("{}", evaluation.confusion);
            println!(
                "accuracy {}  kappa {}  AUC {}",
                evaluation::fmt_metric(evaluation.accuracy),
                evaluation::fmt_metric(evaluation.kappa),
                evaluation::fmt_metric(evaluation.auc)
            );
            println!();

            models.push(ModelReport {
                family,
                selected,
                cross_validation,
                evaluation,
            });
        }

        tasks.push(TaskReport {
            task,
            classes: dataset.label_set().clone(),
            training_counts: partition.training.class_counts(),
            holdout_counts: partition.holdout.class_counts(),
            models,
        });
    }

    let report = RunReport::new(CorpusSummary::new(corpus, failures), tasks);
    let path = output_dir.join(constants::output::REPORT);
    report.write(&path)?;
    info!("Wrote run report: {}", path.display());
    Ok(report)
}

fn create_output_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| Error::OutputDirCreateFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

fn init_thread_pool(threads: usize) -> Result<()> {
    if threads == 0 {
        return Ok(());
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .map_err(|e| Error::ThreadPool {
            reason: e.to_string(),
        })
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter_str = if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[allow(clippy::print_stdout)]
fn handle_config_command(action: ConfigAction, explicit: Option<&Path>) -> Result<()> {
    let path = resolve_config_path(explicit)?;

    match action {
        ConfigAction::Init => {
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                save_config(&Config::default(), &path)?;
                println!("Created configuration file: {}", path.display());
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_config(explicit)?;
            let rendered =
                toml::to_string_pretty(&config).map_err(|e| Error::ConfigSerialize { source: e })?;
            println!("{rendered}");
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}
