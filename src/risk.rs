//! Community risk classification from proximity to active fires.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fire::{FireId, FirePerimeter, Intensity};
use crate::population::PopulationCenter;

/// Fires farther than this from a community leave its base risk alone.
pub const CONSIDERATION_WINDOW_KM: f64 = 10.0;
pub const EXTREME_RANGE_KM: f64 = 3.0;
pub const HIGH_RANGE_KM: f64 = 7.0;
pub const MODERATE_RANGE_KM: f64 = 10.0;
pub const CONTAINMENT_DAMPING_PCT: u8 = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Extreme,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Moderate,
        RiskLevel::High,
        RiskLevel::Extreme,
    ];

    pub fn priority(self) -> u8 {
        match self {
            RiskLevel::Low => 1,
            RiskLevel::Moderate => 2,
            RiskLevel::High => 3,
            RiskLevel::Extreme => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
            RiskLevel::Extreme => "extreme",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
            RiskLevel::Extreme => "Extreme",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown risk level '{0}'")]
pub struct UnknownRiskLevel(pub String);

impl FromStr for RiskLevel {
    type Err = UnknownRiskLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "low" => Ok(RiskLevel::Low),
            "moderate" => Ok(RiskLevel::Moderate),
            "high" | "very high" => Ok(RiskLevel::High),
            "extreme" => Ok(RiskLevel::Extreme),
            _ => Err(UnknownRiskLevel(s.to_string())),
        }
    }
}

impl TryFrom<String> for RiskLevel {
    type Error = UnknownRiskLevel;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RiskLevel> for &'static str {
    fn from(value: RiskLevel) -> Self {
        value.as_str()
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("population center '{center_id}' has malformed coordinates {raw:?}")]
pub struct InvalidCoordinate {
    pub center_id: String,
    pub raw: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestFire {
    pub fire_id: FireId,
    pub distance_km: f64,
    pub intensity: Intensity,
    pub acres: f64,
    pub containment: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub nearest: Option<NearestFire>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityRisk {
    pub center_id: String,
    pub center_name: String,
    pub base_risk: RiskLevel,
    pub level: RiskLevel,
    pub nearest: Option<NearestFire>,
}

/// Threat a single fire poses to a community `distance_km` away. Only
/// meaningful inside the consideration window.
pub fn fire_threat_level(distance_km: f64, fire: &FirePerimeter) -> RiskLevel {
    if fire.containment >= CONTAINMENT_DAMPING_PCT {
        return RiskLevel::Low;
    }
    match fire.intensity {
        Intensity::Extreme if distance_km < EXTREME_RANGE_KM => RiskLevel::Extreme,
        Intensity::High if distance_km < HIGH_RANGE_KM => RiskLevel::High,
        Intensity::Moderate if distance_km < MODERATE_RANGE_KM => RiskLevel::Moderate,
        _ => RiskLevel::Moderate,
    }
}

/// Classifies one community against every active fire.
///
/// The result is the highest threat among fires within
/// [`CONSIDERATION_WINDOW_KM`]; when none are that close the community keeps
/// its base risk. The nearest fire is reported regardless of range.
pub fn classify(
    center: &PopulationCenter,
    fires: &[FirePerimeter],
) -> Result<RiskAssessment, InvalidCoordinate> {
    let location = center.location()?;

    let mut nearest: Option<NearestFire> = None;
    let mut escalated: Option<RiskLevel> = None;

    for fire in fires {
        let distance_km = location.distance_km(&fire.center);
        if nearest
            .as_ref()
            .map_or(true, |current| distance_km < current.distance_km)
        {
            nearest = Some(NearestFire {
                fire_id: fire.fire_id.clone(),
                distance_km,
                intensity: fire.intensity,
                acres: fire.acres,
                containment: fire.containment,
            });
        }

        if distance_km <= CONSIDERATION_WINDOW_KM {
            let threat = fire_threat_level(distance_km, fire);
            escalated = Some(escalated.map_or(threat, |level| level.max(threat)));
        }
    }

    Ok(RiskAssessment {
        level: escalated.unwrap_or(center.base_risk),
        nearest,
    })
}

/// Classifies every usable community. Centers with malformed coordinates
/// are skipped with a warning.
pub fn classify_all(centers: &[PopulationCenter], fires: &[FirePerimeter]) -> Vec<CommunityRisk> {
    centers
        .iter()
        .filter_map(|center| match classify(center, fires) {
            Ok(assessment) => Some(CommunityRisk {
                center_id: center.id.clone(),
                center_name: center.name.clone(),
                base_risk: center.base_risk,
                level: assessment.level,
                nearest: assessment.nearest,
            }),
            Err(err) => {
                log::warn!("skipping risk classification: {err}");
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskCounts {
    pub low: usize,
    pub moderate: usize,
    pub high: usize,
    pub extreme: usize,
}

impl RiskCounts {
    pub fn tally<'a>(levels: impl IntoIterator<Item = &'a RiskLevel>) -> Self {
        let mut counts = Self::default();
        for level in levels {
            match level {
                RiskLevel::Low => counts.low += 1,
                RiskLevel::Moderate => counts.moderate += 1,
                RiskLevel::High => counts.high += 1,
                RiskLevel::Extreme => counts.extreme += 1,
            }
        }
        counts
    }

    pub fn get(&self, level: RiskLevel) -> usize {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Moderate => self.moderate,
            RiskLevel::High => self.high,
            RiskLevel::Extreme => self.extreme,
        }
    }
}
