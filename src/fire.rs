//! Fire perimeters and the hour -> perimeter progression table.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geo::LatLon;
use crate::risk::RiskLevel;
use crate::scenario::ScenarioError;

/// Stable identifier carried by every perimeter of the same fire across hours.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FireId(String);

impl FireId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Contained,
    Low,
    Moderate,
    High,
    Extreme,
}

impl Intensity {
    pub fn label(self) -> &'static str {
        match self {
            Intensity::Contained => "contained",
            Intensity::Low => "low",
            Intensity::Moderate => "moderate",
            Intensity::High => "high",
            Intensity::Extreme => "extreme",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirePerimeter {
    pub fire_id: FireId,
    pub center: LatLon,
    pub radius_m: f64,
    pub intensity: Intensity,
    pub acres: f64,
    pub containment: u8,
}

impl FirePerimeter {
    /// Threat label shown alongside a perimeter, independent of any community.
    pub fn threat_level(&self) -> RiskLevel {
        match self.intensity {
            Intensity::Extreme => RiskLevel::Extreme,
            Intensity::High if self.containment < 50 => RiskLevel::High,
            Intensity::Moderate if self.containment < 50 => RiskLevel::Moderate,
            _ if self.containment >= 75 => RiskLevel::Low,
            _ => RiskLevel::Moderate,
        }
    }

    /// Order issued for this fire on its own, independent of the fixed
    /// community buffers.
    pub fn evacuation_order(&self, hour: u8) -> EvacuationOrder {
        let afternoon_peak = (12..=18).contains(&hour);
        let weather_peak = (13..=17).contains(&hour);
        match self.intensity {
            Intensity::Extreme => return EvacuationOrder::Mandatory,
            Intensity::High if self.containment < 25 && afternoon_peak => {
                return EvacuationOrder::Mandatory
            }
            Intensity::High if self.containment < 50 => return EvacuationOrder::Mandatory,
            _ => {}
        }
        if self.acres > 1_000.0 && self.containment < 30 {
            EvacuationOrder::Mandatory
        } else if matches!(self.intensity, Intensity::High | Intensity::Moderate) && weather_peak {
            EvacuationOrder::Warning
        } else if self.containment >= 75 {
            EvacuationOrder::Advisory
        } else {
            EvacuationOrder::Warning
        }
    }

    /// Radius of the per-fire order: 2 km past the perimeter, scaled by
    /// intensity and rounded to the meter.
    pub fn evacuation_radius_m(&self) -> f64 {
        let multiplier = match self.intensity {
            Intensity::Contained => 0.8,
            Intensity::Low => 1.0,
            Intensity::Moderate => 1.2,
            Intensity::High => 1.5,
            Intensity::Extreme => 2.0,
        };
        ((self.radius_m + ORDER_MARGIN_M) * multiplier).round()
    }
}

const ORDER_MARGIN_M: f64 = 2_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EvacuationOrder {
    Advisory,
    Warning,
    Mandatory,
}

impl EvacuationOrder {
    pub fn label(self) -> &'static str {
        match self {
            EvacuationOrder::Advisory => "Advisory",
            EvacuationOrder::Warning => "Warning",
            EvacuationOrder::Mandatory => "Mandatory",
        }
    }
}

/// Per-fire summary shown next to each perimeter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireOrder {
    pub fire_id: FireId,
    pub threat: RiskLevel,
    pub order: EvacuationOrder,
    pub radius_m: f64,
}

impl FireOrder {
    pub fn for_fire(fire: &FirePerimeter, hour: u8) -> Self {
        Self {
            fire_id: fire.fire_id.clone(),
            threat: fire.threat_level(),
            order: fire.evacuation_order(hour),
            radius_m: fire.evacuation_radius_m(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireDescriptor {
    pub id: FireId,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FireProgression {
    #[serde(default)]
    fires: Vec<FireDescriptor>,
    #[serde(default)]
    timeline: BTreeMap<u8, Vec<FirePerimeter>>,
}

impl FireProgression {
    pub fn new(fires: Vec<FireDescriptor>, timeline: BTreeMap<u8, Vec<FirePerimeter>>) -> Self {
        Self { fires, timeline }
    }

    /// Active perimeters for `hour`. Hours without an entry have no active
    /// fires, which is a normal state rather than an error.
    pub fn resolve(&self, hour: u8) -> &[FirePerimeter] {
        self.timeline
            .get(&hour)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn total_acres(&self, hour: u8) -> f64 {
        self.resolve(hour).iter().map(|fire| fire.acres).sum()
    }

    pub fn fires(&self) -> &[FireDescriptor] {
        &self.fires
    }

    pub fn fire_name(&self, id: &FireId) -> Option<&str> {
        self.fires
            .iter()
            .find(|fire| &fire.id == id)
            .map(|fire| fire.name.as_str())
    }

    pub fn hours(&self) -> impl Iterator<Item = u8> + '_ {
        self.timeline.keys().copied()
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        let mut known = Vec::with_capacity(self.fires.len());
        for fire in &self.fires {
            if known.contains(&&fire.id) {
                return Err(ScenarioError::Validation(format!(
                    "fire id '{}' declared more than once",
                    fire.id
                )));
            }
            known.push(&fire.id);
        }

        for (hour, perimeters) in &self.timeline {
            if *hour > 23 {
                return Err(ScenarioError::Validation(format!(
                    "progression hour {hour} is outside 0..=23"
                )));
            }
            for perimeter in perimeters {
                if !known.contains(&&perimeter.fire_id) {
                    return Err(ScenarioError::Validation(format!(
                        "hour {hour} references undeclared fire '{}'",
                        perimeter.fire_id
                    )));
                }
                if perimeter.containment > 100 {
                    return Err(ScenarioError::Validation(format!(
                        "fire '{}' at hour {hour} has containment {}%",
                        perimeter.fire_id, perimeter.containment
                    )));
                }
                if !perimeter.radius_m.is_finite() || perimeter.radius_m < 0.0 {
                    return Err(ScenarioError::Validation(format!(
                        "fire '{}' at hour {hour} has invalid radius {}",
                        perimeter.fire_id, perimeter.radius_m
                    )));
                }
                if !perimeter.acres.is_finite() || perimeter.acres < 0.0 {
                    return Err(ScenarioError::Validation(format!(
                        "fire '{}' at hour {hour} has invalid acreage {}",
                        perimeter.fire_id, perimeter.acres
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perimeter(id: &str, intensity: Intensity, containment: u8) -> FirePerimeter {
        FirePerimeter {
            fire_id: FireId::new(id),
            center: LatLon::new(33.78, -116.95),
            radius_m: 1_000.0,
            intensity,
            acres: 100.0,
            containment,
        }
    }

    fn progression() -> FireProgression {
        let mut timeline = BTreeMap::new();
        timeline.insert(6, vec![perimeter("a", Intensity::Low, 0)]);
        timeline.insert(
            7,
            vec![
                perimeter("a", Intensity::Moderate, 0),
                perimeter("b", Intensity::Low, 0),
            ],
        );
        FireProgression::new(
            vec![
                FireDescriptor {
                    id: FireId::new("a"),
                    name: "Alpha Fire".into(),
                },
                FireDescriptor {
                    id: FireId::new("b"),
                    name: "Bravo Fire".into(),
                },
            ],
            timeline,
        )
    }

    #[test]
    fn test_resolve_missing_hour_is_empty() {
        let progression = progression();
        assert!(progression.resolve(0).is_empty());
        assert!(progression.resolve(5).is_empty());
        assert_eq!(progression.resolve(7).len(), 2);
    }

    #[test]
    fn test_total_acres() {
        let progression = progression();
        assert_eq!(progression.total_acres(7), 200.0);
        assert_eq!(progression.total_acres(3), 0.0);
    }

    #[test]
    fn test_fire_name_lookup() {
        let progression = progression();
        assert_eq!(progression.fire_name(&FireId::new("b")), Some("Bravo Fire"));
        assert_eq!(progression.fire_name(&FireId::new("z")), None);
    }

    #[test]
    fn test_validate_rejects_unknown_fire() {
        let mut timeline = BTreeMap::new();
        timeline.insert(8, vec![perimeter("ghost", Intensity::Low, 0)]);
        let progression = FireProgression::new(Vec::new(), timeline);
        assert!(progression.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_containment() {
        let mut progression = progression();
        progression.timeline.get_mut(&6).unwrap()[0].containment = 101;
        assert!(progression.validate().is_err());
    }

    #[test]
    fn test_threat_level() {
        assert_eq!(
            perimeter("a", Intensity::Extreme, 90).threat_level(),
            RiskLevel::Extreme
        );
        assert_eq!(
            perimeter("a", Intensity::High, 20).threat_level(),
            RiskLevel::High
        );
        assert_eq!(
            perimeter("a", Intensity::High, 60).threat_level(),
            RiskLevel::Moderate
        );
        assert_eq!(
            perimeter("a", Intensity::Contained, 95).threat_level(),
            RiskLevel::Low
        );
    }

    #[test]
    fn test_evacuation_order_rules() {
        let mut fire = perimeter("a", Intensity::Extreme, 90);
        assert_eq!(fire.evacuation_order(3), EvacuationOrder::Mandatory);

        fire.intensity = Intensity::High;
        fire.containment = 40;
        assert_eq!(fire.evacuation_order(8), EvacuationOrder::Mandatory);
        fire.containment = 60;
        assert_eq!(fire.evacuation_order(14), EvacuationOrder::Warning);
        fire.containment = 80;
        assert_eq!(fire.evacuation_order(20), EvacuationOrder::Advisory);

        // large, barely contained fires are mandatory whatever the intensity
        let mut large = perimeter("b", Intensity::Low, 10);
        large.acres = 1_500.0;
        assert_eq!(large.evacuation_order(2), EvacuationOrder::Mandatory);

        assert_eq!(
            perimeter("c", Intensity::Low, 0).evacuation_order(9),
            EvacuationOrder::Warning
        );
    }

    #[test]
    fn test_evacuation_radius_scales_with_intensity() {
        assert_eq!(perimeter("a", Intensity::Low, 0).evacuation_radius_m(), 3_000.0);
        assert_eq!(perimeter("a", Intensity::High, 0).evacuation_radius_m(), 4_500.0);
        assert_eq!(perimeter("a", Intensity::Extreme, 0).evacuation_radius_m(), 6_000.0);
        assert_eq!(perimeter("a", Intensity::Contained, 0).evacuation_radius_m(), 2_400.0);

        let order = FireOrder::for_fire(&perimeter("a", Intensity::Moderate, 0), 15);
        assert_eq!(order.order, EvacuationOrder::Warning);
        assert_eq!(order.threat, RiskLevel::Moderate);
        assert_eq!(order.radius_m, 3_600.0);
    }
}
