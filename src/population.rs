use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::geo::LatLon;
use crate::risk::{InvalidCoordinate, RiskLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Demographics {
    #[serde(default)]
    pub seniors: u64,
    #[serde(default)]
    pub children: u64,
    #[serde(default)]
    pub disabled: u64,
}

impl Demographics {
    pub fn vulnerable_total(&self) -> u64 {
        self.seniors + self.children + self.disabled
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationCenter {
    pub id: String,
    pub name: String,
    /// Raw `[lat, lon]`; anything else makes the center unusable for
    /// distance calculations.
    #[serde(default)]
    pub coordinates: Vec<f64>,
    #[serde(default)]
    pub population: u64,
    pub base_risk: RiskLevel,
    #[serde(default)]
    pub demographics: Option<Demographics>,
    #[serde(default)]
    pub vulnerability: Option<u8>,
}

impl PopulationCenter {
    pub fn location(&self) -> Result<LatLon, InvalidCoordinate> {
        LatLon::from_pair(&self.coordinates).ok_or_else(|| InvalidCoordinate {
            center_id: self.id.clone(),
            raw: self.coordinates.clone(),
        })
    }
}

/// Merges several center sources; the first record for a given id wins.
pub fn merge_sources<I>(sources: I) -> Vec<PopulationCenter>
where
    I: IntoIterator<Item = Vec<PopulationCenter>>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for source in sources {
        for center in source {
            if seen.insert(center.id.clone()) {
                merged.push(center);
            } else {
                log::debug!("dropping duplicate population center '{}'", center.id);
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn center(id: &str, coordinates: Vec<f64>) -> PopulationCenter {
        PopulationCenter {
            id: id.into(),
            name: id.to_uppercase(),
            coordinates,
            population: 1_000,
            base_risk: RiskLevel::Moderate,
            demographics: None,
            vulnerability: None,
        }
    }

    #[test]
    fn test_location() {
        assert!(center("ok", vec![33.66, -116.31]).location().is_ok());
        let err = center("bad", vec![33.66]).location().unwrap_err();
        assert_eq!(err.center_id, "bad");
    }

    #[test]
    fn test_merge_keeps_first_occurrence() {
        let primary = vec![center("a", vec![1.0, 1.0]), center("b", vec![2.0, 2.0])];
        let secondary = vec![center("b", vec![9.0, 9.0]), center("c", vec![3.0, 3.0])];
        let merged = merge_sources(vec![primary, secondary]);
        let ids: Vec<_> = merged.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(merged[1].coordinates, vec![2.0, 2.0]);
    }

    #[test]
    fn test_vulnerable_total() {
        let demographics = Demographics {
            seniors: 10,
            children: 5,
            disabled: 2,
        };
        assert_eq!(demographics.vulnerable_total(), 17);
    }
}
