//! Domain types for the mission duration and risk prediction engine
//!
//! `AstronautRecord` is the validated inbound observation, `ResolvedRecord`
//! is the same observation with every optional attribute defaulted, and
//! `MissionPrediction` / `ModelStatus` are the structured results the engine
//! hands back to its host.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Nationalities accepted by the external validation contract;
/// anything else must be submitted as "Other".
pub const VALID_NATIONALITIES: [&str; 12] = [
    "USA", "Russia", "Japan", "ESA", "Canada", "China", "India", "France", "Germany", "Italy",
    "UK", "Other",
];

/// Human-readable description of the fitted model
pub const MODEL_TYPE: &str = "Stacking Ensemble (Random Forest + Gradient Boosting + Kernel Ridge)";

// Defaults applied when optional attributes are absent
pub const DEFAULT_MISSION_TYPE: &str = "ISS Expedition";
pub const DEFAULT_ROLE: &str = "mission_specialist";
pub const DEFAULT_LAUNCH_WEATHER: &str = "Clear";
pub const DEFAULT_MANUFACTURER: &str = "Other";
pub const DEFAULT_EXPERIENCE_LEVEL: &str = "Intermediate";
pub const DEFAULT_AGE_GROUP: &str = "Middle";
pub const DEFAULT_CAREER_STAGE: &str = "Mid";
pub const DEFAULT_MISSION_COMPLEXITY: f64 = 0.5;
pub const DEFAULT_SUCCESS_PROBABILITY: f64 = 0.9;

/// One astronaut-mission observation as submitted by the host.
///
/// Required-field presence and ranges are the host's responsibility
/// (`validate()` expresses that contract); the engine defensively defaults
/// every optional attribute via [`AstronautRecord::resolve`].
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AstronautRecord {
    #[validate(length(min = 1))]
    pub name: String,

    #[validate(range(min = 18.0, max = 80.0))]
    pub age: f64,

    #[validate(custom(function = validate_nationality))]
    pub nationality: String,

    #[validate(range(min = 0, max = 20))]
    pub missions: u32,

    /// Cumulative time in space, hours
    #[validate(range(min = 0.0, max = 10000.0))]
    pub space_time: f64,

    #[serde(default)]
    pub mission_type: Option<String>,

    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub launch_weather: Option<String>,

    #[serde(default)]
    pub manufacturer: Option<String>,

    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0))]
    pub mission_complexity: Option<f64>,

    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0))]
    pub success_probability: Option<f64>,

    #[serde(default)]
    pub military: Option<bool>,

    #[serde(default)]
    pub experience_level: Option<String>,

    #[serde(default)]
    pub age_group: Option<String>,

    #[serde(default)]
    pub career_stage: Option<String>,
}

fn validate_nationality(nationality: &str) -> Result<(), ValidationError> {
    if VALID_NATIONALITIES.contains(&nationality) {
        Ok(())
    } else {
        Err(ValidationError::new("unknown_nationality"))
    }
}

impl AstronautRecord {
    /// Create a record with only the required attributes set
    pub fn new(name: &str, age: f64, nationality: &str, missions: u32, space_time: f64) -> Self {
        Self {
            name: name.to_string(),
            age,
            nationality: nationality.to_string(),
            missions,
            space_time,
            mission_type: None,
            role: None,
            launch_weather: None,
            manufacturer: None,
            mission_complexity: None,
            success_probability: None,
            military: None,
            experience_level: None,
            age_group: None,
            career_stage: None,
        }
    }

    pub fn with_mission_type(mut self, mission_type: &str) -> Self {
        self.mission_type = Some(mission_type.to_string());
        self
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    pub fn with_launch_weather(mut self, weather: &str) -> Self {
        self.launch_weather = Some(weather.to_string());
        self
    }

    pub fn with_manufacturer(mut self, manufacturer: &str) -> Self {
        self.manufacturer = Some(manufacturer.to_string());
        self
    }

    pub fn with_mission_complexity(mut self, complexity: f64) -> Self {
        self.mission_complexity = Some(complexity);
        self
    }

    pub fn with_success_probability(mut self, probability: f64) -> Self {
        self.success_probability = Some(probability);
        self
    }

    pub fn with_military(mut self, military: bool) -> Self {
        self.military = Some(military);
        self
    }

    pub fn with_experience_level(mut self, level: &str) -> Self {
        self.experience_level = Some(level.to_string());
        self
    }

    /// Apply documented defaults to every absent optional attribute
    pub fn resolve(&self) -> ResolvedRecord {
        ResolvedRecord {
            name: self.name.clone(),
            age: self.age,
            nationality: self.nationality.clone(),
            missions: self.missions,
            space_time: self.space_time,
            mission_type: self
                .mission_type
                .clone()
                .unwrap_or_else(|| DEFAULT_MISSION_TYPE.to_string()),
            role: self.role.clone().unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            launch_weather: self
                .launch_weather
                .clone()
                .unwrap_or_else(|| DEFAULT_LAUNCH_WEATHER.to_string()),
            manufacturer: self
                .manufacturer
                .clone()
                .unwrap_or_else(|| DEFAULT_MANUFACTURER.to_string()),
            mission_complexity: self
                .mission_complexity
                .unwrap_or(DEFAULT_MISSION_COMPLEXITY),
            success_probability: self
                .success_probability
                .unwrap_or(DEFAULT_SUCCESS_PROBABILITY),
            military: self.military.unwrap_or(false),
            experience_level: self
                .experience_level
                .clone()
                .unwrap_or_else(|| DEFAULT_EXPERIENCE_LEVEL.to_string()),
            age_group: self
                .age_group
                .clone()
                .unwrap_or_else(|| DEFAULT_AGE_GROUP.to_string()),
            career_stage: self
                .career_stage
                .clone()
                .unwrap_or_else(|| DEFAULT_CAREER_STAGE.to_string()),
        }
    }
}

/// An astronaut-mission observation with every attribute resolved.
///
/// This is the record the feature builder consumes and the attribute echo
/// returned inside [`MissionPrediction`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedRecord {
    pub name: String,
    pub age: f64,
    pub nationality: String,
    pub missions: u32,
    pub space_time: f64,
    pub mission_type: String,
    pub role: String,
    pub launch_weather: String,
    pub manufacturer: String,
    pub mission_complexity: f64,
    pub success_probability: f64,
    pub military: bool,
    pub experience_level: String,
    pub age_group: String,
    pub career_stage: String,
}

/// Risk band derived from the clamped risk score
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Band thresholds: Low < 0.3, Medium < 0.6, else High
    pub fn from_score(score: f64) -> Self {
        if score < 0.3 {
            RiskLevel::Low
        } else if score < 0.6 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

/// Train/held-out evaluation metrics of the fitted ensemble
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingScore {
    /// Held-out R²
    pub r2_score: f64,

    /// Held-out root-mean-squared error, hours
    pub rmse: f64,

    /// Train-split R²
    pub train_r2: f64,

    /// Train-split root-mean-squared error, hours
    pub train_rmse: f64,
}

/// Structured prediction result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionPrediction {
    /// All resolved attributes actually used for this prediction
    pub astronaut: ResolvedRecord,

    /// Predicted mission duration, hours (rounded to 0.1)
    pub predicted_duration_hours: f64,

    /// Predicted mission duration, days (rounded to 0.1)
    pub predicted_duration_days: f64,

    /// 95%-style interval from the held-out RMSE; lower bound floored at 24h
    pub confidence_interval_hours: [f64; 2],

    /// Clamped to [0.05, 1.0]
    pub risk_score: f64,

    pub risk_level: RiskLevel,

    /// Ordered explanations, one per non-zero risk contribution
    pub risk_factors: Vec<String>,

    /// Ordered recommendations from the triggered checklist
    pub recommendations: Vec<String>,

    pub model_version: String,

    /// Held-out R² rounded to 3 decimals
    pub confidence: f64,

    pub timestamp: DateTime<Utc>,
}

/// Model lifecycle snapshot returned by the status query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub is_trained: bool,
    pub model_version: String,
    pub feature_names: Vec<String>,
    pub training_score: Option<TrainingScore>,
    pub prediction_count: u64,
    pub last_updated: Option<DateTime<Utc>>,
    pub model_type: String,
}
