//! Synthetic corpora shared by the integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use dronesense::config::{Config, GridsConfig, ProcessingConfig, RasterConfig, SignalConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Sample rate of the synthetic recordings.
pub const SAMPLE_RATE: f64 = 1000.0;

/// Class name and carrier frequency; `None` is noise only.
pub const CLASSES: [(&str, Option<f64>); 4] = [
    ("ar", Some(90.0)),
    ("bepop", Some(210.0)),
    ("phantom", Some(340.0)),
    ("background", None),
];

/// Write `per_class` recordings for every class under `root/<class>/`.
pub fn write_corpus(root: &Path, per_class: usize) {
    for (c, (class, carrier)) in CLASSES.iter().enumerate() {
        let dir = root.join(class);
        fs::create_dir_all(&dir).unwrap();
        for i in 0..per_class {
            let mut rng = StdRng::seed_from_u64((c * 1000 + i) as u64);
            let mut text = String::new();
            for n in 0..256 {
                let t = f64::from(n) / SAMPLE_RATE;
                let noise: f64 = rng.gen_range(-0.3..0.3);
                let tone = carrier.map_or(0.0, |f| (2.0 * std::f64::consts::PI * f * t).sin());
                writeln!(text, "{:.6}", tone + noise).unwrap();
            }
            fs::write(dir.join(format!("{class}_{i:02}.csv")), text).unwrap();
        }
    }
}

/// Configuration sized for fast tests: 8x8 rasters and small grids.
pub fn test_config() -> Config {
    let mut config = Config {
        signal: SignalConfig {
            sample_rate: SAMPLE_RATE,
            window_secs: 0.016,
            ..SignalConfig::default()
        },
        raster: RasterConfig {
            size: 8,
            ..RasterConfig::default()
        },
        processing: ProcessingConfig {
            batch_size: 4,
            threads: 0,
        },
        ..Config::default()
    };
    config.training.grids = GridsConfig {
        logistic: BTreeMap::from([
            ("alpha".to_string(), vec![0.5]),
            ("lambda".to_string(), vec![0.01, 0.1]),
        ]),
        forest: BTreeMap::from([
            ("mtry".to_string(), vec![4.0, 8.0]),
            ("trees".to_string(), vec![20.0]),
        ]),
    };
    config
}
