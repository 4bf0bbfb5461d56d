use chrono::{DateTime, Utc};
use ndarray::{Array1, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::ml::dataset::MissionDataset;
use crate::ml::features::{FeatureBuilder, StandardScaler};
use crate::ml::regressor::StackedRegressor;
use crate::models::TrainingScore;

/// Everything inference needs, produced by one training run.
///
/// The feature builder carries the frozen column order and the encoders
/// fitted on the full table; the scaler is fitted on the train split only.
pub struct ModelArtifacts {
    pub features: FeatureBuilder,
    pub scaler: StandardScaler,
    pub model: StackedRegressor,
    pub score: TrainingScore,
    pub trained_at: DateTime<Utc>,
}

/// Run the full training pipeline: dataset, features, split, scale, fit,
/// evaluate. Fails atomically; no partial artifacts escape.
pub fn train(config: &EngineConfig) -> Result<ModelArtifacts> {
    let started = std::time::Instant::now();
    let dataset = MissionDataset::load_or_generate(&config.dataset);
    let n = dataset.len();
    if n < 20 {
        return Err(EngineError::Training(format!(
            "training table too small: {} rows",
            n
        )));
    }
    info!(rows = n, "starting model training");

    let mut features = FeatureBuilder::new();
    let matrix = features.fit_transform(&dataset.records)?;
    let targets = Array1::from_vec(dataset.targets.clone());

    let (train_idx, test_idx) =
        train_test_split(n, config.model.test_fraction, config.dataset.seed);

    let x_train_raw = matrix.select(Axis(0), &train_idx);
    let x_test_raw = matrix.select(Axis(0), &test_idx);
    let y_train = targets.select(Axis(0), &train_idx);
    let y_test = targets.select(Axis(0), &test_idx);

    let scaler = StandardScaler::fit(&x_train_raw)?;
    let x_train = scaler.transform(&x_train_raw)?;
    let x_test = scaler.transform(&x_test_raw)?;

    let model = StackedRegressor::fit(&x_train, &y_train, &config.model, config.dataset.seed)?;

    let train_pred = model.predict(&x_train)?;
    let test_pred = model.predict(&x_test)?;
    let score = TrainingScore {
        r2_score: r2(&y_test, &test_pred),
        rmse: rmse(&y_test, &test_pred),
        train_r2: r2(&y_train, &train_pred),
        train_rmse: rmse(&y_train, &train_pred),
    };

    info!(
        test_r2 = score.r2_score,
        test_rmse = score.rmse,
        train_r2 = score.train_r2,
        train_rmse = score.train_rmse,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "model training completed"
    );

    Ok(ModelArtifacts {
        features,
        scaler,
        model,
        score,
        trained_at: Utc::now(),
    })
}

/// Seeded shuffle split; the test partition holds `test_fraction` of the
/// rows, at least one and never all of them.
fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n as f64 * test_fraction).round() as usize).clamp(1, n - 1);
    let test_idx = indices[..n_test].to_vec();
    let train_idx = indices[n_test..].to_vec();
    (train_idx, test_idx)
}

pub fn r2(actual: &Array1<f64>, predicted: &[f64]) -> f64 {
    let n = actual.len();
    if n == 0 {
        return 0.0;
    }
    let mean = actual.sum() / n as f64;
    let ss_total: f64 = actual.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_residual: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(y, p)| (y - p).powi(2))
        .sum();
    if ss_total == 0.0 {
        return 0.0;
    }
    1.0 - ss_residual / ss_total
}

pub fn rmse(actual: &Array1<f64>, predicted: &[f64]) -> f64 {
    let n = actual.len();
    if n == 0 {
        return 0.0;
    }
    let mse: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(y, p)| (y - p).powi(2))
        .sum::<f64>()
        / n as f64;
    mse.sqrt()
}
