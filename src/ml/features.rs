use crate::error::{EngineError, Result};
use crate::models::ResolvedRecord;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Numeric attributes, in frozen feature order
pub const NUMERIC_FEATURES: [&str; 6] = [
    "age",
    "missions",
    "space_time",
    "mission_complexity",
    "success_probability",
    "military_numeric",
];

/// Categorical attributes, in frozen feature order (each contributes one
/// `<name>_encoded` column after the numeric block)
pub const CATEGORICAL_FEATURES: [&str; 8] = [
    "nationality",
    "mission_type",
    "role",
    "launch_weather",
    "manufacturer",
    "experience_level",
    "age_group",
    "career_stage",
];

/// Code a categorical value maps to when it was not seen at training time
pub const UNSEEN_CATEGORY_CODE: usize = 0;

/// Bijection from the value universe observed at training time to a dense
/// integer range. Codes follow the sorted order of the observed values, so
/// the assignment is deterministic for a given training table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    codes: HashMap<String, usize>,
}

impl CategoricalEncoder {
    /// Build an encoder from the observed value set
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let observed: BTreeSet<&str> = values.into_iter().collect();
        let codes = observed
            .into_iter()
            .enumerate()
            .map(|(idx, value)| (value.to_string(), idx))
            .collect();
        Self { codes }
    }

    /// Encode one value; unseen values map to [`UNSEEN_CATEGORY_CODE`]
    pub fn encode(&self, value: &str) -> usize {
        self.codes.get(value).copied().unwrap_or(UNSEEN_CATEGORY_CODE)
    }

    /// Number of distinct values seen at fit time
    pub fn cardinality(&self) -> usize {
        self.codes.len()
    }
}

/// Turns a resolved record into a fixed-order numeric feature vector.
///
/// The feature-name order is frozen at fit time and becomes part of the
/// model artifacts; transform reproduces it exactly for every record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureBuilder {
    encoders: HashMap<String, CategoricalEncoder>,
    feature_names: Vec<String>,
    is_fitted: bool,
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureBuilder {
    pub fn new() -> Self {
        Self {
            encoders: HashMap::new(),
            feature_names: Vec::new(),
            is_fitted: false,
        }
    }

    /// Fit one encoder per categorical column and freeze the feature order
    pub fn fit(&mut self, records: &[ResolvedRecord]) -> Result<()> {
        if records.is_empty() {
            return Err(EngineError::Data(
                "cannot fit feature builder on an empty training table".to_string(),
            ));
        }

        self.encoders.clear();
        for column in CATEGORICAL_FEATURES {
            let encoder =
                CategoricalEncoder::fit(records.iter().map(|r| categorical_value(r, column)));
            self.encoders.insert(column.to_string(), encoder);
        }

        self.feature_names = NUMERIC_FEATURES
            .iter()
            .map(|name| name.to_string())
            .chain(
                CATEGORICAL_FEATURES
                    .iter()
                    .map(|name| format!("{}_encoded", name)),
            )
            .collect();
        self.is_fitted = true;

        Ok(())
    }

    /// Transform one record into a feature vector matching the frozen order
    pub fn transform(&self, record: &ResolvedRecord) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(EngineError::Inference(
                "feature builder must be fitted before transform".to_string(),
            ));
        }

        let mut features = Vec::with_capacity(self.feature_names.len());

        for name in NUMERIC_FEATURES {
            features.push(numeric_value(record, name));
        }

        for name in CATEGORICAL_FEATURES {
            let encoder = self.encoders.get(name).ok_or_else(|| {
                EngineError::Inference(format!("missing encoder for column {}", name))
            })?;
            features.push(encoder.encode(categorical_value(record, name)) as f64);
        }

        if features.len() != self.feature_names.len() {
            return Err(EngineError::Inference(format!(
                "feature vector length {} does not match frozen feature order {}",
                features.len(),
                self.feature_names.len()
            )));
        }

        Ok(Array1::from(features))
    }

    /// Fit and transform the whole training table in one step
    pub fn fit_transform(&mut self, records: &[ResolvedRecord]) -> Result<Array2<f64>> {
        self.fit(records)?;

        let n_features = self.feature_names.len();
        let mut matrix = Array2::zeros((records.len(), n_features));
        for (i, record) in records.iter().enumerate() {
            let row = self.transform(record)?;
            matrix.row_mut(i).assign(&row);
        }
        Ok(matrix)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn encoder(&self, column: &str) -> Option<&CategoricalEncoder> {
        self.encoders.get(column)
    }
}

fn numeric_value(record: &ResolvedRecord, name: &str) -> f64 {
    match name {
        "age" => record.age,
        "missions" => record.missions as f64,
        "space_time" => record.space_time,
        "mission_complexity" => record.mission_complexity,
        "success_probability" => record.success_probability,
        "military_numeric" => record.military as u8 as f64,
        _ => 0.0,
    }
}

fn categorical_value<'a>(record: &'a ResolvedRecord, name: &str) -> &'a str {
    match name {
        "nationality" => &record.nationality,
        "mission_type" => &record.mission_type,
        "role" => &record.role,
        "launch_weather" => &record.launch_weather,
        "manufacturer" => &record.manufacturer,
        "experience_level" => &record.experience_level,
        "age_group" => &record.age_group,
        "career_stage" => &record.career_stage,
        _ => "",
    }
}

/// Column-wise standardization fit on the train split only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Array1<f64>,
    std: Array1<f64>,
}

impl StandardScaler {
    /// Fit per-column mean and standard deviation
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        let n_rows = x.nrows();
        if n_rows == 0 {
            return Err(EngineError::Training(
                "cannot fit scaler on an empty matrix".to_string(),
            ));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| EngineError::Training("failed to compute column means".to_string()))?;

        let mut std = Array1::zeros(x.ncols());
        for (j, column) in x.axis_iter(Axis(1)).enumerate() {
            let m = mean[j];
            let variance = column.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n_rows as f64;
            let sd = variance.sqrt();
            // Zero-variance columns pass through unscaled
            std[j] = if sd > 0.0 { sd } else { 1.0 };
        }

        Ok(Self { mean, std })
    }

    /// Standardize a matrix fitted on the same feature order
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.mean.len() {
            return Err(EngineError::Inference(format!(
                "scaler fitted on {} features, got {}",
                self.mean.len(),
                x.ncols()
            )));
        }
        Ok((x - &self.mean) / &self.std)
    }

    /// Standardize a single feature vector
    pub fn transform_row(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        if x.len() != self.mean.len() {
            return Err(EngineError::Inference(format!(
                "scaler fitted on {} features, got {}",
                self.mean.len(),
                x.len()
            )));
        }
        Ok((x - &self.mean) / &self.std)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AstronautRecord;

    fn test_records() -> Vec<ResolvedRecord> {
        vec![
            AstronautRecord::new("A", 35.0, "USA", 2, 100.0)
                .with_role("commander")
                .resolve(),
            AstronautRecord::new("B", 45.0, "Japan", 5, 400.0)
                .with_role("pilot")
                .resolve(),
            AstronautRecord::new("C", 52.0, "Russia", 1, 60.0).resolve(),
        ]
    }

    #[test]
    fn test_encoder_assigns_sorted_codes() {
        let encoder = CategoricalEncoder::fit(["USA", "Japan", "Russia", "Japan"]);

        assert_eq!(encoder.cardinality(), 3);
        assert_eq!(encoder.encode("Japan"), 0);
        assert_eq!(encoder.encode("Russia"), 1);
        assert_eq!(encoder.encode("USA"), 2);
    }

    #[test]
    fn test_encoder_unseen_maps_to_default_code() {
        let encoder = CategoricalEncoder::fit(["Clear", "Poor"]);

        assert_eq!(encoder.encode("Hailstorm"), UNSEEN_CATEGORY_CODE);
        // Same result as the value that holds the default code
        assert_eq!(encoder.encode("Hailstorm"), encoder.encode("Clear"));
    }

    #[test]
    fn test_feature_order_is_frozen() {
        let mut builder = FeatureBuilder::new();
        builder.fit(&test_records()).unwrap();

        let names = builder.feature_names();
        assert_eq!(names.len(), 14);
        assert_eq!(names[0], "age");
        assert_eq!(names[5], "military_numeric");
        assert_eq!(names[6], "nationality_encoded");
        assert_eq!(names[13], "career_stage_encoded");
    }

    #[test]
    fn test_transform_matches_frozen_length() {
        let records = test_records();
        let mut builder = FeatureBuilder::new();
        let matrix = builder.fit_transform(&records).unwrap();

        assert_eq!(matrix.shape(), &[3, 14]);

        let row = builder.transform(&records[0]).unwrap();
        assert_eq!(row.len(), builder.n_features());
        assert_eq!(row[0], 35.0);
        assert_eq!(row[1], 2.0);
    }

    #[test]
    fn test_transform_requires_fit() {
        let builder = FeatureBuilder::new();
        let record = AstronautRecord::new("A", 35.0, "USA", 2, 100.0).resolve();

        assert!(builder.transform(&record).is_err());
    }

    #[test]
    fn test_unseen_category_does_not_fail_transform() {
        let mut builder = FeatureBuilder::new();
        builder.fit(&test_records()).unwrap();

        let unseen = AstronautRecord::new("D", 40.0, "Canada", 3, 200.0)
            .with_launch_weather("Hailstorm")
            .resolve();
        let row = builder.transform(&unseen).unwrap();

        // nationality "Canada" and weather "Hailstorm" were not observed
        assert_eq!(row[6], UNSEEN_CATEGORY_CODE as f64);
        assert_eq!(row[9], UNSEEN_CATEGORY_CODE as f64);
    }

    #[test]
    fn test_military_flag_casts_to_numeric() {
        let mut builder = FeatureBuilder::new();
        builder.fit(&test_records()).unwrap();

        let military = AstronautRecord::new("E", 40.0, "USA", 3, 200.0)
            .with_military(true)
            .resolve();
        let row = builder.transform(&military).unwrap();
        assert_eq!(row[5], 1.0);

        let civilian = AstronautRecord::new("F", 40.0, "USA", 3, 200.0).resolve();
        let row = builder.transform(&civilian).unwrap();
        assert_eq!(row[5], 0.0);
    }

    #[test]
    fn test_scaler_standardizes_columns() {
        let x = ndarray::arr2(&[[1.0, 10.0], [3.0, 10.0], [5.0, 10.0]]);
        let scaler = StandardScaler::fit(&x).unwrap();
        let scaled = scaler.transform(&x).unwrap();

        // First column standardized, zero-variance column passes through
        assert!((scaled[[0, 0]] + 1.224_744_871).abs() < 1e-6);
        assert!((scaled[[1, 0]]).abs() < 1e-9);
        assert_eq!(scaled[[0, 1]], 0.0);
    }

    #[test]
    fn test_scaler_rejects_dimension_mismatch() {
        let x = ndarray::arr2(&[[1.0, 2.0], [3.0, 4.0]]);
        let scaler = StandardScaler::fit(&x).unwrap();

        let wrong = ndarray::arr1(&[1.0, 2.0, 3.0]);
        assert!(scaler.transform_row(&wrong).is_err());
    }
}
