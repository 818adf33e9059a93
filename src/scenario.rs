use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    clock::{ClockError, SimulationClock, TickPeriod},
    evacuation::Shelter,
    fire::FireProgression,
    population::{self, PopulationCenter},
    weather::WeatherStation,
};

pub const BUNDLED_SCENARIO: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/scenarios/coachella_valley.yaml"
));

fn default_start_hour() -> u8 {
    6
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("scenario validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationSource {
    pub name: String,
    #[serde(default)]
    pub centers: Vec<PopulationCenter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_start_hour")]
    pub start_hour: u8,
    #[serde(default, rename = "tick_period_ms")]
    pub tick_period: TickPeriod,
    pub progression: FireProgression,
    pub population_sources: Vec<PopulationSource>,
    #[serde(default)]
    pub weather_stations: Vec<WeatherStation>,
    #[serde(default)]
    pub shelters: Vec<Shelter>,
}

impl Scenario {
    pub fn from_yaml_str(text: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_yaml::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn bundled() -> Result<Self, ScenarioError> {
        Self::from_yaml_str(BUNDLED_SCENARIO)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.name.trim().is_empty() {
            return Err(ScenarioError::Validation(
                "scenario must define a name".to_string(),
            ));
        }
        if self.start_hour > 23 {
            return Err(ScenarioError::Validation(format!(
                "start hour {} is outside 0..=23",
                self.start_hour
            )));
        }
        self.progression.validate()?;
        if self.population_sources.iter().all(|s| s.centers.is_empty()) {
            return Err(ScenarioError::Validation(
                "scenario must define at least one population center".into(),
            ));
        }
        Ok(())
    }

    /// All population sources merged into one list, first source winning on
    /// duplicate ids.
    pub fn population_centers(&self) -> Vec<PopulationCenter> {
        population::merge_sources(
            self.population_sources
                .iter()
                .map(|source| source.centers.clone()),
        )
    }

    pub fn clock(&self) -> Result<SimulationClock, ClockError> {
        SimulationClock::new(self.start_hour, self.tick_period)
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario = Scenario::from_yaml_str(&data)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        Ok(scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskLevel;

    const MINIMAL: &str = r#"
name: minimal
progression:
  fires:
    - { id: alpha, name: Alpha Fire }
  timeline:
    9:
      - { fire_id: alpha, center: [33.7, -116.3], radius_m: 400, intensity: high, acres: 40, containment: 5 }
population_sources:
  - name: only
    centers:
      - { id: town, name: Town, coordinates: [33.71, -116.31], population: 900, base_risk: HIGH }
"#;

    #[test]
    fn test_minimal_defaults() {
        let scenario = Scenario::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(scenario.start_hour, 6);
        assert_eq!(scenario.tick_period, TickPeriod::Normal);
        assert!(scenario.weather_stations.is_empty());
        assert!(scenario.shelters.is_empty());
        assert_eq!(scenario.progression.resolve(9).len(), 1);
        assert_eq!(scenario.population_centers()[0].base_risk, RiskLevel::High);
    }

    #[test]
    fn test_bad_tick_period_is_parse_error() {
        let text = format!("tick_period_ms: 750\n{MINIMAL}");
        assert!(matches!(
            Scenario::from_yaml_str(&text),
            Err(ScenarioError::Parse(_))
        ));
    }

    #[test]
    fn test_requires_population() {
        let text = MINIMAL.replace(
            "    centers:\n      - { id: town, name: Town, coordinates: [33.71, -116.31], population: 900, base_risk: HIGH }\n",
            "    centers: []\n",
        );
        assert!(matches!(
            Scenario::from_yaml_str(&text),
            Err(ScenarioError::Validation(_))
        ));
    }

    #[test]
    fn test_bundled_scenario_loads() {
        let scenario = Scenario::bundled().unwrap();
        assert_eq!(scenario.name, "coachella_valley");
        assert_eq!(scenario.progression.fires().len(), 4);
        // palm-springs appears in both sources and is kept once
        let centers = scenario.population_centers();
        let palm_springs: Vec<_> = centers.iter().filter(|c| c.id == "palm-springs").collect();
        assert_eq!(palm_springs.len(), 1);
        assert_eq!(palm_springs[0].base_risk, RiskLevel::Moderate);
        assert_eq!(scenario.weather_stations.len(), 4);
        assert_eq!(scenario.shelters.len(), 8);
    }

    #[test]
    fn test_loader_reads_relative_to_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("minimal.yaml"), MINIMAL).unwrap();
        let scenario = ScenarioLoader::new(dir.path()).load("minimal.yaml").unwrap();
        assert_eq!(scenario.name, "minimal");
        assert!(ScenarioLoader::new(dir.path()).load("missing.yaml").is_err());
    }
}
