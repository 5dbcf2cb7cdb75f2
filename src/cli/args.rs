//! CLI argument definitions.

use crate::cli::validators::parse_folds;
use crate::config::{Config, ModelFamily, OutputFormat, Task};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// RF drone detection: spectrogram raster features and model selection.
#[derive(Debug, Parser)]
#[command(name = "dronesense")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors, and hide progress bars.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Hide progress bars.
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Configuration file (default: platform config directory).
    #[arg(long, global = true, env = "DRONESENSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Configuration overrides.
    #[command(flatten)]
    pub overrides: Overrides,
}

impl Cli {
    /// Whether progress bars should be drawn.
    pub const fn progress_enabled(&self) -> bool {
        !self.quiet && !self.no_progress
    }
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Turn a corpus of recordings into rasters and a feature table.
    Extract {
        /// Corpus root with one subdirectory per class.
        corpus: PathBuf,
        /// Output directory.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Select, refit and evaluate models on a feature table.
    Train {
        /// CSV feature table written by `extract`.
        table: PathBuf,
        /// Output directory.
        #[arg(short, long)]
        output: PathBuf,
        /// Train only this label view.
        #[arg(long, value_enum)]
        task: Option<Task>,
        /// Train only this learner family.
        #[arg(long, value_enum)]
        family: Option<ModelFamily>,
    },
    /// Extract features, then train and evaluate every configured model.
    Run {
        /// Corpus root with one subdirectory per class.
        corpus: PathBuf,
        /// Output directory.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Flags that override configuration values.
#[derive(Debug, Default, Args)]
pub struct Overrides {
    /// Seed for partitioning, folds, undersampling and learners.
    #[arg(long, global = true, env = "DRONESENSE_SEED")]
    pub seed: Option<u64>,

    /// Cross-validation fold count (at least 2).
    #[arg(long, global = true, value_parser = parse_folds)]
    pub folds: Option<usize>,

    /// Keep class imbalance in training subsets.
    #[arg(long, global = true)]
    pub no_undersample: bool,

    /// Feature table formats (comma-separated: csv,parquet).
    #[arg(long, global = true, value_delimiter = ',', env = "DRONESENSE_FORMAT")]
    pub format: Option<Vec<OutputFormat>>,

    /// Worker threads (0 = one per core).
    #[arg(long, global = true, env = "DRONESENSE_THREADS")]
    pub threads: Option<usize>,
}

impl Overrides {
    /// Apply the flags that were given to `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(seed) = self.seed {
            config.dataset.seed = seed;
            config.training.seed = seed;
        }
        if let Some(folds) = self.folds {
            config.training.folds = folds;
        }
        if self.no_undersample {
            config.training.undersample = false;
        }
        if let Some(formats) = &self.format {
            config.output.formats.clone_from(formats);
        }
        if let Some(threads) = self.threads {
            config.processing.threads = threads;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_extract() {
        let cli = Cli::try_parse_from(["dronesense", "extract", "corpus", "-o", "out"]).unwrap();
        match &cli.command {
            Command::Extract { corpus, output } => {
                assert_eq!(corpus, &PathBuf::from("corpus"));
                assert_eq!(output, &PathBuf::from("out"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(cli.progress_enabled());
    }

    #[test]
    fn test_cli_parse_train_filters() {
        let cli = Cli::try_parse_from([
            "dronesense",
            "train",
            "features.csv",
            "-o",
            "out",
            "--task",
            "binary",
            "--family",
            "forest",
        ])
        .unwrap();
        match cli.command {
            Command::Train { task, family, .. } => {
                assert_eq!(task, Some(Task::Binary));
                assert_eq!(family, Some(ModelFamily::Forest));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_requires_output() {
        assert!(Cli::try_parse_from(["dronesense", "run", "corpus"]).is_err());
    }

    #[test]
    fn test_cli_parse_config_subcommand() {
        let cli = Cli::try_parse_from(["dronesense", "config", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Show
            }
        ));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "dronesense",
            "run",
            "corpus",
            "-o",
            "out",
            "-vv",
            "--no-progress",
            "--seed",
            "7",
            "--format",
            "csv,parquet",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(!cli.progress_enabled());
        assert_eq!(cli.overrides.seed, Some(7));
        assert_eq!(
            cli.overrides.format,
            Some(vec![OutputFormat::Csv, OutputFormat::Parquet])
        );
    }

    #[test]
    fn test_folds_must_be_at_least_two() {
        assert!(Cli::try_parse_from(["dronesense", "--folds", "1", "config", "path"]).is_err());
        let cli = Cli::try_parse_from(["dronesense", "--folds", "3", "config", "path"]).unwrap();
        assert_eq!(cli.overrides.folds, Some(3));
    }

    #[test]
    fn test_overrides_apply() {
        let overrides = Overrides {
            seed: Some(9),
            folds: Some(3),
            no_undersample: true,
            format: Some(vec![OutputFormat::Parquet]),
            threads: Some(2),
        };
        let mut config = Config::default();
        overrides.apply(&mut config);

        assert_eq!(config.dataset.seed, 9);
        assert_eq!(config.training.seed, 9);
        assert_eq!(config.training.folds, 3);
        assert!(!config.training.undersample);
        assert_eq!(config.output.formats, vec![OutputFormat::Parquet]);
        assert_eq!(config.processing.threads, 2);
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let mut config = Config::default();
        Overrides::default().apply(&mut config);
        assert_eq!(config.training.folds, 5);
        assert!(config.training.undersample);
    }
}
