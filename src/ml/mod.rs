//! The numeric pipeline: training data, feature engineering, the stacked
//! ensemble, risk scoring, and the prediction service that ties them
//! together.

pub mod dataset;
pub mod features;
pub mod regressor;
pub mod risk;
pub mod service;
pub mod trainer;

pub use dataset::MissionDataset;
pub use features::{FeatureBuilder, StandardScaler};
pub use regressor::StackedRegressor;
pub use risk::{assess, RiskAssessment, RiskInput};
pub use service::PredictionService;
pub use trainer::{train, ModelArtifacts};
