//! Descriptive statistics over the training table.
//!
//! Read-only and independent of the prediction path: the report is
//! recomputed from the dataset on demand and never touches the fitted
//! model beyond echoing its current metrics.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::ml::dataset::MissionDataset;
use crate::models::TrainingScore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetReport {
    pub statistics: DatasetStatistics,
    pub charts: ChartData,
    /// Current training metrics; absent while the model is untrained
    pub model_metrics: Option<TrainingScore>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetStatistics {
    /// Distinct astronauts; repeat fliers count once
    pub total_astronauts: usize,
    /// One mission observation per table row
    pub total_missions: u64,
    pub average_duration_hours: f64,
    pub countries_represented: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartData {
    /// Counts per age bucket: Under 30 / 30-39 / 40-49 / 50+
    pub age_distribution: BTreeMap<String, usize>,
    pub nationality_distribution: BTreeMap<String, usize>,
    /// Duration-derived categories: <=150h Low, <=250h Medium, else High
    pub risk_distribution: BTreeMap<String, usize>,
    /// Average duration and age per completed-mission count
    pub experience_analysis: Vec<ExperienceBucket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceBucket {
    pub missions: u32,
    pub astronauts: usize,
    pub average_duration_hours: f64,
    pub average_age: f64,
}

/// Build the report from the configured training table
pub fn dataset_report(config: &EngineConfig, metrics: Option<TrainingScore>) -> DatasetReport {
    let dataset = MissionDataset::load_or_generate(&config.dataset);
    report_for(&dataset, metrics)
}

pub fn report_for(dataset: &MissionDataset, metrics: Option<TrainingScore>) -> DatasetReport {
    let n = dataset.len();

    let mut age_distribution = BTreeMap::new();
    let mut nationality_distribution = BTreeMap::new();
    let mut risk_distribution = BTreeMap::new();
    let mut by_missions: BTreeMap<u32, (usize, f64, f64)> = BTreeMap::new();

    let mut astronauts: HashSet<&str> = HashSet::new();
    let mut duration_sum = 0.0;

    for (record, duration) in dataset.records.iter().zip(dataset.targets.iter()) {
        astronauts.insert(record.name.as_str());
        *age_distribution
            .entry(age_bucket(record.age).to_string())
            .or_insert(0) += 1;
        *nationality_distribution
            .entry(record.nationality.clone())
            .or_insert(0) += 1;
        *risk_distribution
            .entry(duration_risk_category(*duration).to_string())
            .or_insert(0) += 1;

        let bucket = by_missions.entry(record.missions).or_insert((0, 0.0, 0.0));
        bucket.0 += 1;
        bucket.1 += duration;
        bucket.2 += record.age;

        duration_sum += duration;
    }

    let experience_analysis = by_missions
        .into_iter()
        .map(|(missions, (count, durations, ages))| ExperienceBucket {
            missions,
            astronauts: count,
            average_duration_hours: durations / count as f64,
            average_age: ages / count as f64,
        })
        .collect();

    DatasetReport {
        statistics: DatasetStatistics {
            total_astronauts: astronauts.len(),
            total_missions: n as u64,
            average_duration_hours: if n == 0 { 0.0 } else { duration_sum / n as f64 },
            countries_represented: nationality_distribution.len(),
        },
        charts: ChartData {
            age_distribution,
            nationality_distribution,
            risk_distribution,
            experience_analysis,
        },
        model_metrics: metrics,
        timestamp: Utc::now(),
    }
}

fn age_bucket(age: f64) -> &'static str {
    if age < 30.0 {
        "Under 30"
    } else if age < 40.0 {
        "30-39"
    } else if age < 50.0 {
        "40-49"
    } else {
        "50+"
    }
}

fn duration_risk_category(duration: f64) -> &'static str {
    if duration <= 150.0 {
        "Low"
    } else if duration <= 250.0 {
        "Medium"
    } else {
        "High"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AstronautRecord;

    fn tiny_dataset() -> MissionDataset {
        let records = vec![
            AstronautRecord::new("A", 28.0, "USA", 0, 50.0).resolve(),
            AstronautRecord::new("B", 35.0, "USA", 2, 120.0).resolve(),
            AstronautRecord::new("C", 45.0, "Japan", 2, 300.0).resolve(),
            AstronautRecord::new("D", 55.0, "Russia", 6, 800.0).resolve(),
        ];
        let targets = vec![100.0, 150.0, 200.0, 400.0];
        MissionDataset { records, targets }
    }

    #[test]
    fn test_age_buckets() {
        assert_eq!(age_bucket(29.9), "Under 30");
        assert_eq!(age_bucket(30.0), "30-39");
        assert_eq!(age_bucket(49.9), "40-49");
        assert_eq!(age_bucket(50.0), "50+");
    }

    #[test]
    fn test_duration_categories_are_inclusive_at_bounds() {
        assert_eq!(duration_risk_category(150.0), "Low");
        assert_eq!(duration_risk_category(250.0), "Medium");
        assert_eq!(duration_risk_category(250.1), "High");
    }

    #[test]
    fn test_report_totals() {
        let report = report_for(&tiny_dataset(), None);

        assert_eq!(report.statistics.total_astronauts, 4);
        assert_eq!(report.statistics.total_missions, 4);
        assert_eq!(report.statistics.countries_represented, 3);
        assert!((report.statistics.average_duration_hours - 212.5).abs() < 1e-9);
        assert!(report.model_metrics.is_none());
    }

    #[test]
    fn test_repeat_flier_counted_once() {
        // One astronaut, two mission rows
        let records = vec![
            AstronautRecord::new("Alice", 38.0, "USA", 1, 100.0).resolve(),
            AstronautRecord::new("Alice", 40.0, "USA", 2, 250.0).resolve(),
        ];
        let targets = vec![180.0, 220.0];
        let report = report_for(&MissionDataset { records, targets }, None);

        assert_eq!(report.statistics.total_astronauts, 1);
        assert_eq!(report.statistics.total_missions, 2);
        assert_eq!(report.statistics.countries_represented, 1);
    }

    #[test]
    fn test_report_distributions() {
        let report = report_for(&tiny_dataset(), None);

        assert_eq!(report.charts.age_distribution["Under 30"], 1);
        assert_eq!(report.charts.age_distribution["30-39"], 1);
        assert_eq!(report.charts.age_distribution["40-49"], 1);
        assert_eq!(report.charts.age_distribution["50+"], 1);

        assert_eq!(report.charts.nationality_distribution["USA"], 2);
        assert_eq!(report.charts.risk_distribution["Low"], 2);
        assert_eq!(report.charts.risk_distribution["Medium"], 1);
        assert_eq!(report.charts.risk_distribution["High"], 1);
    }

    #[test]
    fn test_experience_buckets_average_per_mission_count() {
        let report = report_for(&tiny_dataset(), None);
        let buckets = &report.charts.experience_analysis;

        assert_eq!(buckets.len(), 3);
        let two_missions = buckets.iter().find(|b| b.missions == 2).unwrap();
        assert_eq!(two_missions.astronauts, 2);
        assert!((two_missions.average_duration_hours - 175.0).abs() < 1e-9);
        assert!((two_missions.average_age - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_report_from_synthetic_table() {
        let config = EngineConfig::default();
        let report = dataset_report(&config, None);

        assert_eq!(report.statistics.total_astronauts, 200);
        assert!(report.statistics.average_duration_hours >= 24.0);
        let bucket_total: usize = report.charts.age_distribution.values().sum();
        assert_eq!(bucket_total, 200);
    }
}
