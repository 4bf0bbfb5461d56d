//! Mission duration prediction and crew risk assessment engine
//!
//! The crate trains a stacked regression ensemble over historical (or
//! synthetic) mission records and serves duration estimates with
//! confidence intervals, rule-based risk scores, and operational
//! recommendations.
//!
//! # Components
//!
//! - **Training Set Provider** (`ml::dataset`): CSV load-and-repair with a
//!   seeded synthetic fallback
//! - **Feature Builder** (`ml::features`): frozen 14-column feature order,
//!   categorical encoders, standard scaling
//! - **Stacked Ensemble** (`ml::regressor`): random forest, gradient
//!   boosting, and RBF kernel ridge under a ridge meta-learner
//! - **Risk Engine** (`ml::risk`): ordered additive rules with explanations
//!   and a recommendation checklist
//! - **Prediction Service** (`ml::service`): lazy once-only training,
//!   concurrent inference, lifecycle status
//! - **Analytics** (`analytics`): descriptive statistics over the training
//!   table
//!
//! # Example
//!
//! ```no_run
//! use mission_risk_engine::{AstronautRecord, EngineConfig, PredictionService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::load()?;
//!     let service = PredictionService::new(config);
//!
//!     let record = AstronautRecord::new("J. Doe", 42.0, "USA", 3, 200.0)
//!         .with_role("commander");
//!     let prediction = service.predict(&record).await?;
//!
//!     println!(
//!         "{}h predicted, risk {:?}",
//!         prediction.predicted_duration_hours, prediction.risk_level
//!     );
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod config;
pub mod error;
pub mod ml;
pub mod models;

pub use analytics::{dataset_report, DatasetReport};
pub use config::{init_tracing, EngineConfig};
pub use error::{EngineError, Result};
pub use ml::service::PredictionService;
pub use models::{
    AstronautRecord, MissionPrediction, ModelStatus, ResolvedRecord, RiskLevel, TrainingScore,
};
