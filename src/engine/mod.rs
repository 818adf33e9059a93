//! Scene recomputation: one hour in, one consistent scene out.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::{
    clock::format_hour,
    evacuation::{self, EvacuationAssignment, EvacuationZone, Shelter, StatusCounts},
    fire::{FireOrder, FirePerimeter, FireProgression},
    narrative,
    population::PopulationCenter,
    risk::{self, CommunityRisk, RiskCounts, RiskLevel},
    scenario::Scenario,
    weather::{self, WeatherObservation, WeatherStation},
};

/// Everything a renderer needs for one hour. Every field is derived from the
/// same resolved perimeter list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub scenario: String,
    pub hour: u8,
    pub time_label: String,
    pub fires: Vec<FirePerimeter>,
    pub fire_orders: Vec<FireOrder>,
    pub community_risks: Vec<CommunityRisk>,
    pub zones: Vec<EvacuationZone>,
    pub assignments: Vec<EvacuationAssignment>,
    pub narrative: String,
    pub evacuation_status: String,
    pub conditions: String,
    pub time_risk: RiskLevel,
    pub weather: Vec<WeatherObservation>,
}

impl Scene {
    pub fn total_acres(&self) -> f64 {
        self.fires.iter().map(|fire| fire.acres).sum()
    }

    pub fn status_counts(&self) -> StatusCounts {
        StatusCounts::tally(&self.assignments)
    }

    pub fn risk_counts(&self) -> RiskCounts {
        RiskCounts::tally(self.community_risks.iter().map(|risk| &risk.level))
    }
}

#[derive(Clone, Debug)]
pub struct StageReport {
    pub name: &'static str,
    pub duration_ms: f64,
}

#[derive(Clone, Debug)]
pub struct SceneReport {
    pub scene: Scene,
    pub stages: Vec<StageReport>,
}

pub struct Engine {
    scenario_name: String,
    progression: FireProgression,
    centers: Vec<PopulationCenter>,
    stations: Vec<WeatherStation>,
    shelters: Vec<Shelter>,
}

impl Engine {
    pub fn new(
        scenario_name: impl Into<String>,
        progression: FireProgression,
        centers: Vec<PopulationCenter>,
        stations: Vec<WeatherStation>,
    ) -> Self {
        Self {
            scenario_name: scenario_name.into(),
            progression,
            centers,
            stations,
            shelters: Vec::new(),
        }
    }

    pub fn with_shelters(mut self, shelters: Vec<Shelter>) -> Self {
        self.shelters = shelters;
        self
    }

    pub fn from_scenario(scenario: &Scenario) -> Self {
        Self::new(
            scenario.name.clone(),
            scenario.progression.clone(),
            scenario.population_centers(),
            scenario.weather_stations.clone(),
        )
        .with_shelters(scenario.shelters.clone())
    }

    pub fn scenario_name(&self) -> &str {
        &self.scenario_name
    }

    pub fn progression(&self) -> &FireProgression {
        &self.progression
    }

    pub fn centers(&self) -> &[PopulationCenter] {
        &self.centers
    }

    /// Runs resolve, orders, classify, zones, assignments and narrative in
    /// that order over a single perimeter snapshot.
    pub fn compute(&self, hour: u8) -> SceneReport {
        let mut stages = Vec::with_capacity(8);

        let fires = timed(&mut stages, "resolve", || self.progression.resolve(hour));
        let fire_orders: Vec<FireOrder> = timed(&mut stages, "orders", || {
            fires
                .iter()
                .map(|fire| FireOrder::for_fire(fire, hour))
                .collect()
        });
        let community_risks = timed(&mut stages, "classify", || {
            risk::classify_all(&self.centers, fires)
        });
        let zones = timed(&mut stages, "zones", || evacuation::derive_zones(fires));
        let assignments = timed(&mut stages, "assignments", || {
            evacuation::derive_assignments_with_shelters(fires, &self.centers, &self.shelters)
        });
        let (narrative, evacuation_status) = timed(&mut stages, "narrative", || {
            (
                narrative::compose(hour, fires, &assignments),
                narrative::evacuation_status(&assignments),
            )
        });
        let weather: Vec<WeatherObservation> = timed(&mut stages, "weather", || {
            self.stations
                .iter()
                .map(|station| station.observe(hour))
                .collect()
        });

        log::debug!(
            "hour {hour}: {} fires, {} zones, {} assignments",
            fires.len(),
            zones.len(),
            assignments.len()
        );

        SceneReport {
            scene: Scene {
                scenario: self.scenario_name.clone(),
                hour,
                time_label: format_hour(hour),
                fires: fires.to_vec(),
                fire_orders,
                community_risks,
                zones,
                assignments,
                narrative,
                evacuation_status,
                conditions: narrative::hourly_conditions(hour).to_string(),
                time_risk: weather::time_risk_level(hour),
                weather,
            },
            stages,
        }
    }
}

fn timed<T>(stages: &mut Vec<StageReport>, name: &'static str, stage: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let output = stage();
    let elapsed = start.elapsed();
    log::trace!("stage {name} took {:?}", elapsed);
    stages.push(StageReport {
        name,
        duration_ms: elapsed.as_secs_f64() * 1_000.0,
    });
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        Engine::from_scenario(&Scenario::bundled().unwrap())
    }

    #[test]
    fn test_stage_order() {
        let report = engine().compute(12);
        let names: Vec<_> = report.stages.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "resolve",
                "orders",
                "classify",
                "zones",
                "assignments",
                "narrative",
                "weather"
            ]
        );
    }

    #[test]
    fn test_quiet_hour() {
        let scene = engine().compute(3).scene;
        assert!(scene.fires.is_empty());
        assert!(scene.zones.is_empty());
        assert!(scene.assignments.is_empty());
        assert_eq!(scene.total_acres(), 0.0);
        assert!(scene.narrative.contains("No active fires"));
        // every community keeps its base risk
        for risk in &scene.community_risks {
            assert_eq!(risk.level, risk.base_risk);
        }
    }

    #[test]
    fn test_zones_match_fires() {
        let scene = engine().compute(16).scene;
        assert_eq!(scene.zones.len(), scene.fires.len() * 3);
        for (fire, zones) in scene.fires.iter().zip(scene.zones.chunks(3)) {
            for zone in zones {
                assert_eq!(zone.fire_id, fire.fire_id);
                assert!(zone.radius_m > fire.radius_m);
            }
        }
    }

    #[test]
    fn test_orders_and_shelters_at_peak() {
        let scene = engine().compute(14).scene;
        assert_eq!(scene.fire_orders.len(), scene.fires.len());
        let main = scene
            .fire_orders
            .iter()
            .find(|order| order.fire_id.as_str() == "san-jacinto")
            .unwrap();
        assert_eq!(main.order, crate::fire::EvacuationOrder::Mandatory);
        assert_eq!(main.radius_m, 15_000.0);

        let town = scene
            .assignments
            .iter()
            .find(|a| a.center_id == "san-jacinto")
            .unwrap();
        assert_eq!(
            town.shelter.as_ref().unwrap().name,
            "San Jacinto Community Center"
        );
        assert!(scene.evacuation_status.starts_with("EVACUATION STATUS:"));
        assert!(scene.evacuation_status.contains(" IMMEDIATE ("));
    }
}
