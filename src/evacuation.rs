//! Evacuation buffers around active fires and the communities they reach.

use serde::{Deserialize, Serialize};

use crate::fire::{FireId, FirePerimeter};
use crate::geo::{self, LatLon};
use crate::population::PopulationCenter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferKind {
    Immediate,
    Warning,
    Advisory,
}

impl BufferKind {
    /// Emission order for every fire.
    pub const ALL: [BufferKind; 3] = [
        BufferKind::Immediate,
        BufferKind::Warning,
        BufferKind::Advisory,
    ];

    pub fn distance_miles(self) -> f64 {
        match self {
            BufferKind::Immediate => 0.5,
            BufferKind::Warning => 2.0,
            BufferKind::Advisory => 5.0,
        }
    }

    pub fn distance_m(self) -> f64 {
        geo::miles_to_meters(self.distance_miles())
    }

    pub fn status(self) -> EvacuationStatus {
        match self {
            BufferKind::Immediate => EvacuationStatus::Immediate,
            BufferKind::Warning => EvacuationStatus::Warning,
            BufferKind::Advisory => EvacuationStatus::Advisory,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvacuationStatus {
    Safe,
    Advisory,
    Warning,
    Immediate,
}

impl EvacuationStatus {
    pub fn priority(self) -> u8 {
        match self {
            EvacuationStatus::Safe => 0,
            EvacuationStatus::Advisory => 1,
            EvacuationStatus::Warning => 2,
            EvacuationStatus::Immediate => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EvacuationStatus::Safe => "SAFE",
            EvacuationStatus::Advisory => "EVACUATION ADVISORY",
            EvacuationStatus::Warning => "EVACUATION WARNING",
            EvacuationStatus::Immediate => "IMMEDIATE EVACUATION",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvacuationZone {
    pub fire_id: FireId,
    pub center: LatLon,
    pub kind: BufferKind,
    pub radius_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvacuationAssignment {
    pub center_id: String,
    pub center_name: String,
    pub population: u64,
    /// Nearest active fire by center distance.
    pub fire_id: FireId,
    pub distance_miles: f64,
    /// Fire whose buffer produced `status`.
    pub triggered_by: FireId,
    pub status: EvacuationStatus,
    pub priority: u8,
    pub estimated_minutes: u32,
    /// Seniors, children and residents with disabilities, when known.
    pub vulnerable_residents: u64,
    pub shelter: Option<ShelterReferral>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShelterStatus {
    #[default]
    Available,
    Full,
    Closed,
}

/// Evacuation center that can receive residents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shelter {
    pub name: String,
    pub coordinates: LatLon,
    pub capacity: u32,
    #[serde(default)]
    pub status: ShelterStatus,
    #[serde(default)]
    pub features: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShelterReferral {
    pub name: String,
    pub capacity: u32,
    pub distance_miles: f64,
}

/// Closest available shelter in a straight line.
pub fn nearest_shelter(from: &LatLon, shelters: &[Shelter]) -> Option<ShelterReferral> {
    shelters
        .iter()
        .filter(|shelter| shelter.status == ShelterStatus::Available)
        .map(|shelter| (shelter, from.distance_miles(&shelter.coordinates)))
        .fold(None::<(&Shelter, f64)>, |best, (shelter, miles)| match best {
            Some((_, best_miles)) if best_miles <= miles => best,
            _ => Some((shelter, miles)),
        })
        .map(|(shelter, distance_miles)| ShelterReferral {
            name: shelter.name.clone(),
            capacity: shelter.capacity,
            distance_miles,
        })
}

/// Three concentric buffers per fire, Immediate first. Buffer distances are
/// fixed and do not depend on intensity.
pub fn derive_zones(fires: &[FirePerimeter]) -> Vec<EvacuationZone> {
    fires
        .iter()
        .flat_map(|fire| {
            BufferKind::ALL.into_iter().map(move |kind| EvacuationZone {
                fire_id: fire.fire_id.clone(),
                center: fire.center,
                kind,
                radius_m: fire.radius_m + kind.distance_m(),
            })
        })
        .collect()
}

fn buffer_status(distance_m: f64, fire: &FirePerimeter) -> EvacuationStatus {
    BufferKind::ALL
        .into_iter()
        .find(|kind| distance_m <= fire.radius_m + kind.distance_m())
        .map_or(EvacuationStatus::Safe, BufferKind::status)
}

/// Assigns each community the most severe buffer it falls inside across all
/// fires. Safe communities are left out; the rest are ordered by descending
/// priority, ties keeping the input order.
pub fn derive_assignments(
    fires: &[FirePerimeter],
    centers: &[PopulationCenter],
) -> Vec<EvacuationAssignment> {
    derive_assignments_with_shelters(fires, centers, &[])
}

/// [`derive_assignments`], referring each community to its nearest
/// available shelter.
pub fn derive_assignments_with_shelters(
    fires: &[FirePerimeter],
    centers: &[PopulationCenter],
    shelters: &[Shelter],
) -> Vec<EvacuationAssignment> {
    let mut assignments = Vec::new();

    for center in centers {
        let location = match center.location() {
            Ok(location) => location,
            Err(err) => {
                log::warn!("skipping evacuation assignment: {err}");
                continue;
            }
        };

        let mut nearest: Option<(&FirePerimeter, f64)> = None;
        let mut worst: Option<(&FirePerimeter, EvacuationStatus)> = None;

        for fire in fires {
            let distance_m = location.distance_m(&fire.center);
            if nearest.map_or(true, |(_, best)| distance_m < best) {
                nearest = Some((fire, distance_m));
            }
            let status = buffer_status(distance_m, fire);
            if worst.map_or(true, |(_, current)| status > current) {
                worst = Some((fire, status));
            }
        }

        let (Some((nearest_fire, nearest_m)), Some((trigger, status))) = (nearest, worst) else {
            continue;
        };
        if status == EvacuationStatus::Safe {
            continue;
        }

        assignments.push(EvacuationAssignment {
            center_id: center.id.clone(),
            center_name: center.name.clone(),
            population: center.population,
            fire_id: nearest_fire.fire_id.clone(),
            distance_miles: geo::meters_to_miles(nearest_m),
            triggered_by: trigger.fire_id.clone(),
            status,
            priority: status.priority(),
            estimated_minutes: estimate_evacuation_minutes(center, status),
            vulnerable_residents: center
                .demographics
                .map_or(0, |demographics| demographics.vulnerable_total()),
            shelter: nearest_shelter(&location, shelters),
        });
    }

    assignments.sort_by(|a, b| b.priority.cmp(&a.priority));
    assignments
}

/// Rough time to clear a community, scaled by size, urgency and how
/// vulnerable its residents are.
pub fn estimate_evacuation_minutes(center: &PopulationCenter, status: EvacuationStatus) -> u32 {
    let mut minutes = 30.0_f64;
    if center.population > 5_000 {
        minutes += 20.0;
    } else if center.population > 1_000 {
        minutes += 10.0;
    }

    minutes *= match status {
        EvacuationStatus::Immediate => 0.5,
        EvacuationStatus::Warning => 0.8,
        _ => 1.0,
    };

    if center.vulnerability.is_some_and(|score| score >= 4) {
        minutes *= 1.5;
    }
    minutes.round() as u32
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub immediate: usize,
    pub warning: usize,
    pub advisory: usize,
    pub immediate_population: u64,
    pub warning_population: u64,
    pub advisory_population: u64,
}

impl StatusCounts {
    pub fn tally(assignments: &[EvacuationAssignment]) -> Self {
        let mut counts = Self::default();
        for assignment in assignments {
            let population = assignment.population;
            match assignment.status {
                EvacuationStatus::Immediate => {
                    counts.immediate += 1;
                    counts.immediate_population += population;
                }
                EvacuationStatus::Warning => {
                    counts.warning += 1;
                    counts.warning_population += population;
                }
                EvacuationStatus::Advisory => {
                    counts.advisory += 1;
                    counts.advisory_population += population;
                }
                EvacuationStatus::Safe => {}
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.immediate + self.warning + self.advisory
    }

    pub fn total_population(&self) -> u64 {
        self.immediate_population + self.warning_population + self.advisory_population
    }
}
