//! End-to-end tests of extraction, model selection and evaluation.

#![allow(clippy::unwrap_used)]

mod common;

use dronesense::config::{ModelFamily, OutputFormat, Task};
use dronesense::dataset::{CorpusBuilder, LabelSet, stratified_split};
use dronesense::features::FeatureVector;
use dronesense::model::learner_for;
use dronesense::training::{Trainer, TrainerSettings};
use dronesense::{Selection, extract, partition_seed, train};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_extract_writes_artifacts() {
    let dir = TempDir::new().unwrap();
    let corpus_root = dir.path().join("corpus");
    common::write_corpus(&corpus_root, 6);
    fs::write(corpus_root.join("ar/broken.csv"), "0.1\nnot-a-sample\n").unwrap();

    let mut config = common::test_config();
    config.output.formats = vec![OutputFormat::Csv, OutputFormat::Parquet];
    let out = dir.path().join("out");
    let extraction = extract(&corpus_root, &out, &config, false).unwrap();

    assert_eq!(extraction.corpus.len(), 24);
    assert_eq!(extraction.corpus.n_features(), 64);
    assert_eq!(extraction.failures.len(), 1);
    assert_eq!(extraction.failures[0].identifier, "broken");

    assert!(out.join("features.csv").is_file());
    assert!(out.join("features.parquet").is_file());
    assert!(out.join("rasters/phantom/phantom_03.png").is_file());
    assert!(!out.join("rasters/ar/broken.png").exists());

    let failures = fs::read_to_string(out.join("failures.csv")).unwrap();
    assert!(failures.starts_with("identifier,class,path,reason\n"));
    assert!(failures.contains("broken,ar,"));

    let values = extraction.corpus.features();
    assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
}

#[test]
fn test_rerun_features_bit_identical() {
    let dir = TempDir::new().unwrap();
    let corpus_root = dir.path().join("corpus");
    common::write_corpus(&corpus_root, 4);
    let mut config = common::test_config();
    config.output.save_rasters = false;

    let first = extract(&corpus_root, &dir.path().join("a"), &config, false).unwrap();
    let second = extract(&corpus_root, &dir.path().join("b"), &config, false).unwrap();

    assert_eq!(first.corpus.ids(), second.corpus.ids());
    assert_eq!(first.corpus.features(), second.corpus.features());
    assert_eq!(
        fs::read(dir.path().join("a/features.csv")).unwrap(),
        fs::read(dir.path().join("b/features.csv")).unwrap()
    );
    assert!(!dir.path().join("a/rasters").exists());
}

#[test]
fn test_train_confusion_matrix_consistent() {
    let dir = TempDir::new().unwrap();
    let corpus_root = dir.path().join("corpus");
    common::write_corpus(&corpus_root, 12);
    let config = common::test_config();
    let out = dir.path().join("out");

    let extraction = extract(&corpus_root, &out, &config, false).unwrap();
    let selection = Selection::new(&config, None, None);
    let report = train(&extraction.corpus, 0, &out, &config, &selection, false).unwrap();

    assert_eq!(report.tasks.len(), 2);
    for task in &report.tasks {
        assert_eq!(task.models.len(), 2);
        let holdout_total: usize = task.holdout_counts.iter().sum();
        for model in &task.models {
            let confusion = &model.evaluation.confusion;
            assert_eq!(confusion.row_sums(), task.holdout_counts);
            assert_eq!(confusion.column_sums().iter().sum::<usize>(), holdout_total);
            assert_eq!(model.cross_validation.folds, 5);
            assert_eq!(model.cross_validation.combinations.len(), 2);
            let accuracy = model.evaluation.accuracy.unwrap();
            assert!((0.0..=1.0).contains(&accuracy));
        }
    }

    let binary = &report.tasks[0];
    assert_eq!(binary.task, Task::Binary);
    assert_eq!(binary.training_counts, vec![27, 9]);
    assert_eq!(binary.holdout_counts, vec![9, 3]);
    assert!(binary.models[0].evaluation.binary.is_some());

    let multiclass = &report.tasks[1];
    assert_eq!(multiclass.training_counts, vec![9, 9, 9, 9]);
    assert!(multiclass.models[1].evaluation.multiclass.is_some());

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("report.json")).unwrap()).unwrap();
    assert_eq!(json["corpus"]["recordings"], 48);
    assert_eq!(json["tasks"][1]["task"], "multiclass");

    // refit the selected models and count their hold-out predictions per class
    let settings = TrainerSettings::from(&config.training);
    for task in &report.tasks {
        let dataset = extraction.corpus.view(task.task);
        let seed = partition_seed(&config, task.task);
        let partition = stratified_split(&dataset, config.dataset.train_fraction, seed).unwrap();
        assert_eq!(partition.holdout.class_counts(), task.holdout_counts);

        for model in &task.models {
            let learner = learner_for(model.family);
            let pipeline = Trainer::new(learner.as_ref(), settings)
                .fit_final(&partition.training, &model.selected)
                .unwrap();
            let mut predicted = vec![0; task.classes.len()];
            for label in pipeline.predict(&partition.holdout.matrix()).unwrap() {
                predicted[label] += 1;
            }
            assert_eq!(model.evaluation.confusion.column_sums(), predicted);
        }
    }
}

#[test]
fn test_train_single_family_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let corpus_root = dir.path().join("corpus");
    common::write_corpus(&corpus_root, 10);
    let mut config = common::test_config();
    config.output.save_rasters = false;

    let extraction = extract(&corpus_root, &dir.path().join("x"), &config, false).unwrap();
    let selection = Selection::new(&config, Some(Task::Multiclass), Some(ModelFamily::Forest));

    let run = |name: &str| {
        train(&extraction.corpus, 0, &dir.path().join(name), &config, &selection, false).unwrap()
    };
    let first = run("r1");
    let second = run("r2");

    let a = &first.tasks[0].models[0];
    let b = &second.tasks[0].models[0];
    assert_eq!(a.selected, b.selected);
    assert_eq!(a.evaluation, b.evaluation);
    let means = |m: &dronesense::output::ModelReport| -> Vec<Option<f64>> {
        m.cross_validation.combinations.iter().map(|c| c.mean_auc).collect()
    };
    assert_eq!(means(a), means(b));
}

#[test]
fn test_binary_split_of_imbalanced_corpus() {
    let labels = LabelSet::new(["ar", "bepop", "phantom", "background"]);
    let mut builder = CorpusBuilder::new(labels, 1);
    let classes = [("ar", 50), ("bepop", 50), ("phantom", 50), ("background", 77)];
    for (class, count) in classes {
        for i in 0..count {
            builder
                .push(format!("{class}_{i}"), class, FeatureVector::from(vec![0.5]))
                .unwrap();
        }
    }
    let corpus = builder.finish("background").unwrap();
    let binary = corpus.view(Task::Binary);
    assert_eq!(binary.class_counts(), vec![150, 77]);

    let partition = stratified_split(&binary, 0.75, 42).unwrap();
    assert_eq!(partition.training.class_counts(), vec![113, 58]);
    assert_eq!(partition.holdout.class_counts(), vec![37, 19]);
}
