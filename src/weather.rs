//! Time-of-day fire weather.

use serde::{Deserialize, Serialize};

use crate::geo::LatLon;
use crate::risk::RiskLevel;

/// How much the hour of day amplifies fire danger.
pub fn time_risk_multiplier(hour: u8) -> f64 {
    match hour {
        14..=16 => 2.0,
        12..=18 => 1.5,
        10..=20 => 1.2,
        _ => 0.8,
    }
}

pub fn time_risk_level(hour: u8) -> RiskLevel {
    let multiplier = time_risk_multiplier(hour);
    if multiplier >= 1.8 {
        RiskLevel::Extreme
    } else if multiplier >= 1.4 {
        RiskLevel::High
    } else if multiplier >= 1.1 {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    }
}

/// Diurnal swing applied to the station baselines (multiplier x 15).
fn diurnal_swing(hour: u8) -> f64 {
    match hour {
        0..=7 => -4.5,
        8..=11 => 0.0,
        12..=15 => 10.5,
        _ => 3.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindDirection {
    #[serde(rename = "E")]
    East,
    #[serde(rename = "SW")]
    Southwest,
    #[serde(rename = "W")]
    West,
    #[serde(rename = "NW")]
    Northwest,
}

impl WindDirection {
    pub fn for_hour(hour: u8) -> Self {
        match hour {
            0..=9 => WindDirection::East,
            10..=13 => WindDirection::Southwest,
            14..=17 => WindDirection::West,
            _ => WindDirection::Northwest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherStation {
    pub name: String,
    pub coordinates: LatLon,
    pub base_temp_f: f64,
    pub base_humidity_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub station: String,
    pub hour: u8,
    pub temperature_f: i32,
    pub humidity_pct: i32,
    pub wind_mph: i32,
    pub wind_direction: WindDirection,
    pub fire_weather: RiskLevel,
}

impl WeatherStation {
    pub fn observe(&self, hour: u8) -> WeatherObservation {
        let swing = diurnal_swing(hour);
        let humidity_pct = ((self.base_humidity_pct - swing).round() as i32).max(10);
        let fire_weather = if humidity_pct < 20 {
            RiskLevel::High
        } else if humidity_pct < 30 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        };
        WeatherObservation {
            station: self.name.clone(),
            hour,
            temperature_f: (self.base_temp_f + swing).round() as i32,
            humidity_pct,
            wind_mph: (5.0 + swing).round() as i32,
            wind_direction: WindDirection::for_hour(hour),
            fire_weather,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station() -> WeatherStation {
        WeatherStation {
            name: "Palm Springs Station".into(),
            coordinates: LatLon::new(33.8303, -116.5453),
            base_temp_f: 85.0,
            base_humidity_pct: 25.0,
        }
    }

    #[test]
    fn test_time_risk_bands() {
        assert_eq!(time_risk_level(15), RiskLevel::Extreme);
        assert_eq!(time_risk_level(12), RiskLevel::High);
        assert_eq!(time_risk_level(19), RiskLevel::Moderate);
        assert_eq!(time_risk_level(3), RiskLevel::Low);
        assert_eq!(time_risk_multiplier(21), 0.8);
    }

    #[test]
    fn test_afternoon_observation() {
        let obs = station().observe(14);
        assert_eq!(obs.temperature_f, 96);
        assert_eq!(obs.humidity_pct, 15);
        assert_eq!(obs.wind_mph, 16);
        assert_eq!(obs.wind_direction, WindDirection::West);
        assert_eq!(obs.fire_weather, RiskLevel::High);
    }

    #[test]
    fn test_morning_observation() {
        let obs = station().observe(6);
        assert_eq!(obs.temperature_f, 81);
        assert_eq!(obs.humidity_pct, 30);
        assert_eq!(obs.wind_direction, WindDirection::East);
        assert_eq!(obs.fire_weather, RiskLevel::Low);
    }

    #[test]
    fn test_humidity_floor() {
        let mut dry = station();
        dry.base_humidity_pct = 12.0;
        assert_eq!(dry.observe(13).humidity_pct, 10);
    }
}
