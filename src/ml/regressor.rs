use crate::config::ModelConfig;
use crate::error::{EngineError, Result};
use ndarray::{Array1, Array2, Axis};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::ridge_regression::{RidgeRegression, RidgeRegressionParameters};
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};

fn to_dense(x: &Array2<f64>) -> DenseMatrix<f64> {
    let shape = x.shape();
    let data: Vec<f64> = x.iter().copied().collect();
    DenseMatrix::new(shape[0], shape[1], data, false)
}

/// Bagged tree ensemble base learner
pub struct RandomForestModel {
    model: RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>,
}

impl RandomForestModel {
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>, config: &ModelConfig, seed: u64) -> Result<Self> {
        let params = RandomForestRegressorParameters::default()
            .with_n_trees(config.forest_trees.into())
            .with_max_depth(config.forest_max_depth.into())
            .with_seed(seed);

        let model = RandomForestRegressor::fit(&to_dense(x), &y.to_vec(), params)
            .map_err(|e| EngineError::Training(format!("random forest fit failed: {}", e)))?;

        Ok(Self { model })
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        self.model
            .predict(&to_dense(x))
            .map_err(|e| EngineError::Inference(format!("random forest predict failed: {}", e)))
    }
}

/// Boosted tree ensemble base learner.
///
/// Additive gradient boosting with squared loss over shallow decision-tree
/// weak learners: each round fits the current residuals and contributes a
/// shrunken correction.
pub struct GradientBoostModel {
    base: f64,
    learning_rate: f64,
    trees: Vec<DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>>,
}

impl GradientBoostModel {
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>, config: &ModelConfig) -> Result<Self> {
        let n = y.len();
        if n == 0 {
            return Err(EngineError::Training(
                "cannot fit gradient boosting on an empty split".to_string(),
            ));
        }

        let dense = to_dense(x);
        let base = y.sum() / n as f64;
        let learning_rate = config.learning_rate;
        let mut residuals: Vec<f64> = y.iter().map(|v| v - base).collect();
        let mut trees = Vec::with_capacity(config.boost_rounds);

        for _ in 0..config.boost_rounds {
            let params =
                DecisionTreeRegressorParameters::default().with_max_depth(config.boost_max_depth.into());
            let tree = DecisionTreeRegressor::fit(&dense, &residuals, params)
                .map_err(|e| EngineError::Training(format!("boosting round failed: {}", e)))?;

            let corrections = tree
                .predict(&dense)
                .map_err(|e| EngineError::Training(format!("boosting round failed: {}", e)))?;
            for (r, c) in residuals.iter_mut().zip(corrections.iter()) {
                *r -= learning_rate * c;
            }

            trees.push(tree);
        }

        Ok(Self {
            base,
            learning_rate,
            trees,
        })
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        let dense = to_dense(x);
        let mut predictions = vec![self.base; x.nrows()];

        for tree in &self.trees {
            let corrections = tree
                .predict(&dense)
                .map_err(|e| EngineError::Inference(format!("boosting predict failed: {}", e)))?;
            for (p, c) in predictions.iter_mut().zip(corrections.iter()) {
                *p += self.learning_rate * c;
            }
        }

        Ok(predictions)
    }
}

/// Kernel-based base learner: RBF kernel ridge regression.
///
/// smartcore's SVR borrows its parameters for the model's lifetime and so
/// cannot live inside long-lived artifacts; the dual ridge solution over the
/// training kernel matrix covers the same inductive bias.
pub struct KernelRidgeModel {
    train_x: Array2<f64>,
    dual_coef: Array1<f64>,
    gamma: f64,
}

impl KernelRidgeModel {
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>, config: &ModelConfig) -> Result<Self> {
        let n = x.nrows();
        if n == 0 {
            return Err(EngineError::Training(
                "cannot fit kernel ridge on an empty split".to_string(),
            ));
        }

        // Inputs are standardized, so 1 / n_features matches the usual
        // "scale" heuristic for the kernel width
        let gamma = config
            .kernel_gamma
            .unwrap_or(1.0 / x.ncols().max(1) as f64);

        let mut system = Array2::zeros((n, n));
        for i in 0..n {
            for j in i..n {
                let k = rbf(&x.row(i).to_owned(), &x.row(j).to_owned(), gamma);
                system[[i, j]] = k;
                system[[j, i]] = k;
            }
            system[[i, i]] += config.kernel_lambda;
        }

        let dual_coef = solve_linear(system, y.to_owned())?;

        Ok(Self {
            train_x: x.to_owned(),
            dual_coef,
            gamma,
        })
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        if x.ncols() != self.train_x.ncols() {
            return Err(EngineError::Inference(format!(
                "kernel ridge fitted on {} features, got {}",
                self.train_x.ncols(),
                x.ncols()
            )));
        }

        let predictions = x
            .axis_iter(Axis(0))
            .map(|row| {
                let row = row.to_owned();
                self.train_x
                    .axis_iter(Axis(0))
                    .zip(self.dual_coef.iter())
                    .map(|(train_row, coef)| coef * rbf(&row, &train_row.to_owned(), self.gamma))
                    .sum()
            })
            .collect();

        Ok(predictions)
    }
}

fn rbf(a: &Array1<f64>, b: &Array1<f64>, gamma: f64) -> f64 {
    let squared_distance: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum();
    (-gamma * squared_distance).exp()
}

/// Gaussian elimination with partial pivoting
fn solve_linear(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>> {
    let n = b.len();

    for col in 0..n {
        let mut pivot = col;
        for row in (col + 1)..n {
            if a[[row, col]].abs() > a[[pivot, col]].abs() {
                pivot = row;
            }
        }
        if a[[pivot, col]].abs() < 1e-12 {
            return Err(EngineError::Training(
                "kernel system is singular".to_string(),
            ));
        }
        if pivot != col {
            for k in 0..n {
                a.swap([col, k], [pivot, k]);
            }
            b.swap(col, pivot);
        }

        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in (row + 1)..n {
            sum -= a[[row, k]] * x[k];
        }
        x[row] = sum / a[[row, row]];
    }

    Ok(x)
}

/// Two-layer stacked ensemble: heterogeneous base regressors feed
/// out-of-fold predictions into a ridge meta-learner.
pub struct StackedRegressor {
    forest: RandomForestModel,
    boost: GradientBoostModel,
    kernel: KernelRidgeModel,
    meta: RidgeRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>,
}

impl StackedRegressor {
    const N_BASE_LEARNERS: usize = 3;

    pub fn fit(x: &Array2<f64>, y: &Array1<f64>, config: &ModelConfig, seed: u64) -> Result<Self> {
        let n = x.nrows();
        if n < 4 {
            return Err(EngineError::Training(format!(
                "too few training rows for stacking: {}",
                n
            )));
        }
        let folds = config.cv_folds.min(n / 2).max(2);

        // Out-of-fold predictions become the meta-learner's training matrix
        let mut meta_features = Array2::zeros((n, Self::N_BASE_LEARNERS));
        for fold in 0..folds {
            let start = fold * n / folds;
            let end = (fold + 1) * n / folds;
            let holdout: Vec<usize> = (start..end).collect();
            let train: Vec<usize> = (0..n).filter(|i| *i < start || *i >= end).collect();

            let x_train = x.select(Axis(0), &train);
            let y_train = y.select(Axis(0), &train);
            let x_holdout = x.select(Axis(0), &holdout);

            let forest = RandomForestModel::fit(&x_train, &y_train, config, seed)?;
            let boost = GradientBoostModel::fit(&x_train, &y_train, config)?;
            let kernel = KernelRidgeModel::fit(&x_train, &y_train, config)?;

            let forest_pred = forest.predict(&x_holdout)?;
            let boost_pred = boost.predict(&x_holdout)?;
            let kernel_pred = kernel.predict(&x_holdout)?;

            for (offset, row) in holdout.into_iter().enumerate() {
                meta_features[[row, 0]] = forest_pred[offset];
                meta_features[[row, 1]] = boost_pred[offset];
                meta_features[[row, 2]] = kernel_pred[offset];
            }
        }

        let meta_params = RidgeRegressionParameters::default().with_alpha(config.meta_alpha);
        let meta = RidgeRegression::fit(&to_dense(&meta_features), &y.to_vec(), meta_params)
            .map_err(|e| EngineError::Training(format!("meta-learner fit failed: {}", e)))?;

        // Refit the base layer on the full train split for inference
        let forest = RandomForestModel::fit(x, y, config, seed)?;
        let boost = GradientBoostModel::fit(x, y, config)?;
        let kernel = KernelRidgeModel::fit(x, y, config)?;

        Ok(Self {
            forest,
            boost,
            kernel,
            meta,
        })
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        let forest_pred = self.forest.predict(x)?;
        let boost_pred = self.boost.predict(x)?;
        let kernel_pred = self.kernel.predict(x)?;

        let n = x.nrows();
        let mut meta_features = Array2::zeros((n, Self::N_BASE_LEARNERS));
        for i in 0..n {
            meta_features[[i, 0]] = forest_pred[i];
            meta_features[[i, 1]] = boost_pred[i];
            meta_features[[i, 2]] = kernel_pred[i];
        }

        self.meta
            .predict(&to_dense(&meta_features))
            .map_err(|e| EngineError::Inference(format!("meta-learner predict failed: {}", e)))
    }

    /// Point estimate for a single feature vector
    pub fn predict_one(&self, features: &Array1<f64>) -> Result<f64> {
        let matrix = features
            .to_owned()
            .into_shape((1, features.len()))
            .map_err(|e| EngineError::Inference(format!("failed to shape feature row: {}", e)))?;

        let predictions = self.predict(&matrix)?;
        predictions
            .first()
            .copied()
            .ok_or_else(|| EngineError::Inference("empty prediction output".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn test_config() -> ModelConfig {
        ModelConfig {
            forest_trees: 20,
            boost_rounds: 20,
            ..ModelConfig::default()
        }
    }

    /// Noisy linear data with three features
    fn toy_data(n: usize) -> (Array2<f64>, Array1<f64>) {
        let mut rng = StdRng::seed_from_u64(7);
        let mut x = Array2::zeros((n, 3));
        let mut y = Array1::zeros(n);
        for i in 0..n {
            let a: f64 = rng.gen_range(-1.0..1.0);
            let b: f64 = rng.gen_range(-1.0..1.0);
            let c: f64 = rng.gen_range(-1.0..1.0);
            x[[i, 0]] = a;
            x[[i, 1]] = b;
            x[[i, 2]] = c;
            y[i] = 3.0 * a - 2.0 * b + 0.5 * c + rng.gen_range(-0.1..0.1);
        }
        (x, y)
    }

    fn mse(y: &Array1<f64>, pred: &[f64]) -> f64 {
        y.iter()
            .zip(pred.iter())
            .map(|(t, p)| (t - p).powi(2))
            .sum::<f64>()
            / y.len() as f64
    }

    #[test]
    fn test_solve_linear_identity() {
        let a = Array::eye(3);
        let b = ndarray::arr1(&[2.0, -1.0, 0.5]);
        let x = solve_linear(a, b.clone()).unwrap();
        assert!((x[0] - 2.0).abs() < 1e-9);
        assert!((x[1] + 1.0).abs() < 1e-9);
        assert!((x[2] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_solve_linear_pivots() {
        // Zero leading element forces a row swap
        let a = ndarray::arr2(&[[0.0, 1.0], [1.0, 0.0]]);
        let b = ndarray::arr1(&[3.0, 5.0]);
        let x = solve_linear(a, b).unwrap();
        assert!((x[0] - 5.0).abs() < 1e-9);
        assert!((x[1] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_solve_linear_singular_fails() {
        let a = ndarray::arr2(&[[1.0, 1.0], [1.0, 1.0]]);
        let b = ndarray::arr1(&[1.0, 2.0]);
        assert!(solve_linear(a, b).is_err());
    }

    #[test]
    fn test_gradient_boost_beats_mean_baseline() {
        let (x, y) = toy_data(80);
        let model = GradientBoostModel::fit(&x, &y, &test_config()).unwrap();
        let predictions = model.predict(&x).unwrap();

        let mean = y.sum() / y.len() as f64;
        let baseline: Vec<f64> = vec![mean; y.len()];
        assert!(mse(&y, &predictions) < mse(&y, &baseline));
    }

    #[test]
    fn test_kernel_ridge_fits_smooth_function() {
        let (x, y) = toy_data(60);
        let model = KernelRidgeModel::fit(&x, &y, &test_config()).unwrap();
        let predictions = model.predict(&x).unwrap();

        let mean = y.sum() / y.len() as f64;
        let baseline: Vec<f64> = vec![mean; y.len()];
        assert!(mse(&y, &predictions) < mse(&y, &baseline));
        assert!(predictions.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_stacked_regressor_predicts_finite_values() {
        let (x, y) = toy_data(60);
        let model = StackedRegressor::fit(&x, &y, &test_config(), 42).unwrap();

        let predictions = model.predict(&x).unwrap();
        assert_eq!(predictions.len(), 60);
        assert!(predictions.iter().all(|p| p.is_finite()));

        let single = model.predict_one(&x.row(0).to_owned()).unwrap();
        assert!((single - predictions[0]).abs() < 1e-9);
    }

    #[test]
    fn test_stacked_regressor_is_deterministic() {
        let (x, y) = toy_data(50);
        let a = StackedRegressor::fit(&x, &y, &test_config(), 42).unwrap();
        let b = StackedRegressor::fit(&x, &y, &test_config(), 42).unwrap();

        let probe = x.row(13).to_owned();
        assert_eq!(a.predict_one(&probe).unwrap(), b.predict_one(&probe).unwrap());
    }

    #[test]
    fn test_stacked_regressor_rejects_tiny_datasets() {
        let x = ndarray::arr2(&[[1.0], [2.0]]);
        let y = ndarray::arr1(&[1.0, 2.0]);
        assert!(StackedRegressor::fit(&x, &y, &test_config(), 42).is_err());
    }
}
