use crate::config::DatasetConfig;
use crate::error::Result;
use crate::models::ResolvedRecord;
use ndarray_rand::rand_distr::StandardNormal;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Mission duration is never trained below this floor, hours
pub const MIN_DURATION_HOURS: f64 = 24.0;

const NATIONALITY_POOL: [&str; 6] = ["USA", "Russia", "Japan", "ESA", "Canada", "China"];
const MISSION_TYPE_POOL: [&str; 4] = [
    "ISS Expedition",
    "Space Shuttle",
    "Commercial Crew",
    "Lunar Mission",
];
const ROLE_POOL: [&str; 4] = ["commander", "pilot", "mission_specialist", "flight_engineer"];
const WEATHER_POOL: [&str; 4] = ["Clear", "Partly Cloudy", "Overcast", "Poor"];
const MANUFACTURER_POOL: [&str; 4] = ["SpaceX", "Boeing", "Roscosmos", "Other"];

/// The training table: ordered records plus the duration target column
#[derive(Debug, Clone)]
pub struct MissionDataset {
    pub records: Vec<ResolvedRecord>,
    pub targets: Vec<f64>,
}

impl MissionDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Produce the training table.
    ///
    /// Loads and repairs the configured CSV source when one is usable;
    /// any failure degrades to the synthetic generator with a warning.
    /// This never surfaces an error to the caller.
    pub fn load_or_generate(config: &DatasetConfig) -> Self {
        if let Some(path) = &config.source_path {
            match Self::load_from_csv(path, config) {
                Ok(dataset) if !dataset.is_empty() => {
                    info!(
                        rows = dataset.len(),
                        path = %path.display(),
                        "loaded mission dataset"
                    );
                    return dataset;
                }
                Ok(_) => {
                    warn!(
                        path = %path.display(),
                        "mission dataset had no usable rows, falling back to synthetic data"
                    );
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to load mission dataset, falling back to synthetic data"
                    );
                }
            }
        }

        Self::generate_synthetic(config)
    }

    /// Load a real source table, dropping rows that miss identity, date, or
    /// mission identifiers and backfilling the columns the schema requires
    /// but the source lacks with bounded seeded draws.
    pub fn load_from_csv(path: &Path, config: &DatasetConfig) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut mission_counts: HashMap<String, u32> = HashMap::new();
        let mut records = Vec::new();
        let mut targets = Vec::new();

        for row in reader.deserialize::<RawMissionRow>() {
            let row = row?;

            // Identity, date, and mission identifiers are mandatory
            let name = match row.name.filter(|n| !n.trim().is_empty()) {
                Some(name) => name,
                None => continue,
            };
            if row.year.as_deref().map_or(true, |y| y.trim().is_empty())
                || row.mission.as_deref().map_or(true, |m| m.trim().is_empty())
            {
                continue;
            }

            let age = row
                .age
                .unwrap_or_else(|| rng.gen_range(25..60) as f64);
            let space_time = row
                .space_time
                .unwrap_or_else(|| rng.gen_range(50..500) as f64);
            let nationality = row.nationality.unwrap_or_else(|| "Other".to_string());

            // Per-subject running mission count
            let missions = {
                let count = mission_counts.entry(name.clone()).or_insert(0);
                *count += 1;
                *count
            };

            let record = ResolvedRecord {
                name,
                age,
                nationality,
                missions,
                space_time,
                mission_type: MISSION_TYPE_POOL[rng.gen_range(0..MISSION_TYPE_POOL.len())]
                    .to_string(),
                role: ROLE_POOL[rng.gen_range(0..ROLE_POOL.len())].to_string(),
                launch_weather: WEATHER_POOL[rng.gen_range(0..WEATHER_POOL.len())].to_string(),
                manufacturer: MANUFACTURER_POOL[rng.gen_range(0..MANUFACTURER_POOL.len())]
                    .to_string(),
                mission_complexity: rng.gen_range(0.1..1.0),
                success_probability: rng.gen_range(0.7..0.99),
                military: rng.gen_bool(0.5),
                experience_level: experience_level_for(missions).to_string(),
                age_group: age_group_for(age).to_string(),
                career_stage: career_stage_for(missions).to_string(),
            };

            let noise: f64 = rng.sample::<f64, _>(StandardNormal) * 50.0 + 200.0;
            let duration = noise
                + (record.age - 35.0) * -2.0
                + record.missions as f64 * 10.0
                + record.space_time * 0.5;

            targets.push(duration.max(MIN_DURATION_HOURS));
            records.push(record);
        }

        Ok(Self { records, targets })
    }

    /// Generate a fully synthetic training table with a fixed seed and a
    /// closed-form relationship between attributes and target.
    pub fn generate_synthetic(config: &DatasetConfig) -> Self {
        let n = config.synthetic_samples.max(1);
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut records = Vec::with_capacity(n);
        let mut targets = Vec::with_capacity(n);

        info!(rows = n, seed = config.seed, "generating synthetic mission dataset");

        for i in 0..n {
            let age = rng.gen_range(25..60) as f64;
            let nationality = NATIONALITY_POOL[rng.gen_range(0..NATIONALITY_POOL.len())];
            let missions = rng.gen_range(1..8u32);
            let space_time = rng.gen_range(50..1000) as f64;
            let mission_type = MISSION_TYPE_POOL[rng.gen_range(0..MISSION_TYPE_POOL.len())];
            let role = ROLE_POOL[rng.gen_range(0..ROLE_POOL.len())];
            let launch_weather = WEATHER_POOL[rng.gen_range(0..WEATHER_POOL.len())];
            let manufacturer = MANUFACTURER_POOL[rng.gen_range(0..MANUFACTURER_POOL.len())];
            let mission_complexity = rng.gen_range(0.1..1.0);
            let success_probability = rng.gen_range(0.7..0.99);
            let military = rng.gen_bool(0.5);

            let role_bonus = match role {
                "commander" => 20.0,
                "pilot" => 10.0,
                _ => 0.0,
            };
            let weather_penalty = match launch_weather {
                "Poor" => 10.0,
                "Overcast" => 5.0,
                _ => 0.0,
            };

            let noise: f64 = rng.sample::<f64, _>(StandardNormal) * 50.0 + 200.0;
            let duration = noise
                + (age - 35.0) * -2.0
                + missions as f64 * 15.0
                + space_time * 0.3
                + mission_complexity * 100.0
                + role_bonus
                + weather_penalty;

            records.push(ResolvedRecord {
                name: format!("Astronaut_{}", i),
                age,
                nationality: nationality.to_string(),
                missions,
                space_time,
                mission_type: mission_type.to_string(),
                role: role.to_string(),
                launch_weather: launch_weather.to_string(),
                manufacturer: manufacturer.to_string(),
                mission_complexity,
                success_probability,
                military,
                experience_level: experience_level_for(missions).to_string(),
                age_group: age_group_for(age).to_string(),
                career_stage: career_stage_for(missions).to_string(),
            });
            targets.push(duration.max(MIN_DURATION_HOURS));
        }

        Self { records, targets }
    }
}

/// Junior below 2 missions, Senior above 4, Intermediate between
pub fn experience_level_for(missions: u32) -> &'static str {
    if missions < 2 {
        "Junior"
    } else if missions > 4 {
        "Senior"
    } else {
        "Intermediate"
    }
}

/// Young below 35, Senior above 50, Middle between
pub fn age_group_for(age: f64) -> &'static str {
    if age < 35.0 {
        "Young"
    } else if age > 50.0 {
        "Senior"
    } else {
        "Middle"
    }
}

/// Early below 3 missions, Experienced above 5, Mid between
pub fn career_stage_for(missions: u32) -> &'static str {
    if missions < 3 {
        "Early"
    } else if missions > 5 {
        "Experienced"
    } else {
        "Mid"
    }
}

/// One raw source row; unknown columns are ignored, missing ones default
#[derive(Debug, Deserialize)]
struct RawMissionRow {
    #[serde(default, alias = "Name")]
    name: Option<String>,

    #[serde(default, alias = "Year")]
    year: Option<String>,

    #[serde(default, alias = "Mission")]
    mission: Option<String>,

    #[serde(default, alias = "Age")]
    age: Option<f64>,

    #[serde(default, alias = "Space_time")]
    space_time: Option<f64>,

    #[serde(default, alias = "Nationality")]
    nationality: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetConfig;
    use std::io::Write;

    fn test_config() -> DatasetConfig {
        DatasetConfig {
            source_path: None,
            synthetic_samples: 120,
            seed: 42,
        }
    }

    #[test]
    fn test_synthetic_generation_is_deterministic() {
        let config = test_config();
        let a = MissionDataset::generate_synthetic(&config);
        let b = MissionDataset::generate_synthetic(&config);

        assert_eq!(a.len(), 120);
        assert_eq!(a.targets, b.targets);
        assert_eq!(a.records[0].nationality, b.records[0].nationality);
        assert_eq!(a.records[17].role, b.records[17].role);
    }

    #[test]
    fn test_synthetic_targets_are_floored() {
        let dataset = MissionDataset::generate_synthetic(&test_config());
        assert!(dataset.targets.iter().all(|&t| t >= MIN_DURATION_HOURS));
    }

    #[test]
    fn test_synthetic_derived_labels() {
        let dataset = MissionDataset::generate_synthetic(&test_config());
        for record in &dataset.records {
            assert_eq!(record.experience_level, experience_level_for(record.missions));
            assert_eq!(record.age_group, age_group_for(record.age));
            assert_eq!(record.career_stage, career_stage_for(record.missions));
        }
    }

    #[test]
    fn test_missing_source_falls_back_to_synthetic() {
        let config = DatasetConfig {
            source_path: Some("/definitely/not/here.csv".into()),
            synthetic_samples: 50,
            seed: 42,
        };
        let dataset = MissionDataset::load_or_generate(&config);

        assert_eq!(dataset.len(), 50);
    }

    #[test]
    fn test_csv_load_drops_incomplete_rows_and_counts_missions() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Name,Year,Mission,Age").unwrap();
        writeln!(file, "Alice,1998,STS-90,38").unwrap();
        writeln!(file, ",1999,STS-96,41").unwrap();
        writeln!(file, "Alice,2000,STS-101,40").unwrap();
        writeln!(file, "Bob,2001,,45").unwrap();
        file.flush().unwrap();

        let config = DatasetConfig {
            source_path: Some(file.path().to_path_buf()),
            synthetic_samples: 10,
            seed: 42,
        };
        let dataset = MissionDataset::load_from_csv(file.path(), &config).unwrap();

        // Two usable Alice rows, missing-name and missing-mission rows dropped
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records[0].missions, 1);
        assert_eq!(dataset.records[1].missions, 2);
        assert_eq!(dataset.records[0].age, 38.0);
        assert!(dataset.targets.iter().all(|&t| t >= MIN_DURATION_HOURS));
    }

    #[test]
    fn test_corrupt_source_falls_back_to_synthetic() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not,a,real").unwrap();
        writeln!(file, "csv file at all \" broken").unwrap();
        file.flush().unwrap();

        let config = DatasetConfig {
            source_path: Some(file.path().to_path_buf()),
            synthetic_samples: 30,
            seed: 42,
        };
        let dataset = MissionDataset::load_or_generate(&config);

        assert_eq!(dataset.len(), 30);
    }

    #[test]
    fn test_label_helpers() {
        assert_eq!(experience_level_for(1), "Junior");
        assert_eq!(experience_level_for(3), "Intermediate");
        assert_eq!(experience_level_for(5), "Senior");
        assert_eq!(age_group_for(30.0), "Young");
        assert_eq!(age_group_for(40.0), "Middle");
        assert_eq!(age_group_for(55.0), "Senior");
        assert_eq!(career_stage_for(2), "Early");
        assert_eq!(career_stage_for(4), "Mid");
        assert_eq!(career_stage_for(6), "Experienced");
    }
}
