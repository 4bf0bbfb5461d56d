use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};
use validator::Validate;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::ml::risk::{self, RiskInput};
use crate::ml::trainer::{self, ModelArtifacts};
use crate::models::{
    AstronautRecord, MissionPrediction, ModelStatus, TrainingScore, MODEL_TYPE,
};

const CONFIDENCE_Z: f64 = 1.96;
const MIN_PREDICTED_LOWER_BOUND: f64 = 24.0;

/// Prediction orchestrator owning the model lifecycle.
///
/// Training runs lazily on the first prediction. The mutex guarantees at
/// most one training in flight; every waiter observes the trained state
/// once the winner finishes. A failed run leaves the service untrained so
/// a later call can retry.
pub struct PredictionService {
    config: EngineConfig,
    artifacts: RwLock<Option<Arc<ModelArtifacts>>>,
    train_guard: Mutex<()>,
    prediction_count: AtomicU64,
}

impl PredictionService {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            artifacts: RwLock::new(None),
            train_guard: Mutex::new(()),
            prediction_count: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn is_trained(&self) -> bool {
        self.artifacts.read().await.is_some()
    }

    pub fn prediction_count(&self) -> u64 {
        self.prediction_count.load(Ordering::Relaxed)
    }

    /// Train now instead of waiting for the first prediction. No-op when
    /// already trained.
    pub async fn train(&self) -> Result<TrainingScore> {
        let artifacts = self.ensure_trained().await?;
        Ok(artifacts.score.clone())
    }

    /// Re-run the training pipeline and swap in the fresh artifacts.
    /// The prediction counter restarts with the new model.
    pub async fn retrain(&self) -> Result<TrainingScore> {
        let _guard = self.train_guard.lock().await;
        info!("explicit retrain requested");

        let artifacts = Arc::new(trainer::train(&self.config)?);
        let score = artifacts.score.clone();
        *self.artifacts.write().await = Some(artifacts);
        self.prediction_count.store(0, Ordering::Relaxed);
        Ok(score)
    }

    /// Predict mission duration and assess risk for one astronaut
    pub async fn predict(&self, record: &AstronautRecord) -> Result<MissionPrediction> {
        record.validate()?;
        let artifacts = self.ensure_trained().await?;
        let resolved = record.resolve();

        let raw = artifacts.features.transform(&resolved)?;
        let scaled = artifacts.scaler.transform_row(&raw)?;
        let estimate = artifacts.model.predict_one(&scaled)?;
        if !estimate.is_finite() {
            return Err(EngineError::Inference(
                "model produced a non-finite duration estimate".to_string(),
            ));
        }

        let margin = CONFIDENCE_Z * artifacts.score.rmse;
        let lower = (estimate - margin).max(MIN_PREDICTED_LOWER_BOUND);
        let upper = estimate + margin;

        let assessment = risk::assess(&RiskInput {
            age: resolved.age,
            missions: resolved.missions,
            predicted_duration: estimate,
            mission_complexity: resolved.mission_complexity,
            success_probability: resolved.success_probability,
            role: &resolved.role,
            launch_weather: &resolved.launch_weather,
            military: resolved.military,
        });

        self.prediction_count.fetch_add(1, Ordering::Relaxed);

        Ok(MissionPrediction {
            astronaut: resolved,
            predicted_duration_hours: round1(estimate),
            predicted_duration_days: round1(estimate / 24.0),
            confidence_interval_hours: [round1(lower), round1(upper)],
            risk_score: round3(assessment.risk_score),
            risk_level: assessment.risk_level,
            risk_factors: assessment.risk_factors,
            recommendations: assessment.recommendations,
            model_version: self.config.model_version.clone(),
            confidence: round3(artifacts.score.r2_score),
            timestamp: chrono::Utc::now(),
        })
    }

    /// Descriptive statistics over the training table, with the current
    /// metrics attached when the model is trained
    pub async fn statistics(&self) -> crate::analytics::DatasetReport {
        let metrics = self
            .artifacts
            .read()
            .await
            .as_ref()
            .map(|artifacts| artifacts.score.clone());
        crate::analytics::dataset_report(&self.config, metrics)
    }

    /// Lifecycle snapshot, served trained or untrained
    pub async fn status(&self) -> ModelStatus {
        let artifacts = self.artifacts.read().await;
        match artifacts.as_ref() {
            Some(artifacts) => ModelStatus {
                is_trained: true,
                model_version: self.config.model_version.clone(),
                feature_names: artifacts.features.feature_names().to_vec(),
                training_score: Some(artifacts.score.clone()),
                prediction_count: self.prediction_count(),
                last_updated: Some(artifacts.trained_at),
                model_type: MODEL_TYPE.to_string(),
            },
            None => ModelStatus {
                is_trained: false,
                model_version: self.config.model_version.clone(),
                feature_names: Vec::new(),
                training_score: None,
                prediction_count: self.prediction_count(),
                last_updated: None,
                model_type: MODEL_TYPE.to_string(),
            },
        }
    }

    async fn ensure_trained(&self) -> Result<Arc<ModelArtifacts>> {
        if let Some(artifacts) = self.artifacts.read().await.as_ref() {
            return Ok(Arc::clone(artifacts));
        }

        let _guard = self.train_guard.lock().await;
        if let Some(artifacts) = self.artifacts.read().await.as_ref() {
            return Ok(Arc::clone(artifacts));
        }

        match trainer::train(&self.config) {
            Ok(artifacts) => {
                let artifacts = Arc::new(artifacts);
                *self.artifacts.write().await = Some(Arc::clone(&artifacts));
                Ok(artifacts)
            }
            Err(e) => {
                error!(error = %e, "lazy model training failed");
                Err(EngineError::ModelUnavailable(e.to_string()))
            }
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
