//! Risk assessment export.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::format_hour;
use crate::engine::Scene;
use crate::evacuation::StatusCounts;
use crate::fire::EvacuationOrder;
use crate::risk::{RiskCounts, RiskLevel};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("report encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Point-in-time summary of a scene, suitable for handing to other teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessmentReport {
    pub timestamp: DateTime<Utc>,
    pub scenario: String,
    pub hour: u8,
    pub current_time: String,
    pub fire_perimeters: usize,
    pub total_acres: f64,
    pub evacuation_zones: usize,
    pub buffer_intersections: usize,
    pub affected_residents: u64,
    pub mandatory_orders: usize,
    pub evacuations: StatusCounts,
    pub community_risk: RiskCounts,
    pub risk_level: RiskLevel,
    pub narrative: String,
}

impl RiskAssessmentReport {
    pub fn from_scene(scene: &Scene, generated_at: DateTime<Utc>) -> Self {
        Self {
            timestamp: generated_at,
            scenario: scene.scenario.clone(),
            hour: scene.hour,
            current_time: format_hour(scene.hour),
            fire_perimeters: scene.fires.len(),
            total_acres: scene.total_acres(),
            evacuation_zones: scene.zones.len(),
            buffer_intersections: scene.assignments.len(),
            affected_residents: scene.status_counts().total_population(),
            mandatory_orders: scene
                .fire_orders
                .iter()
                .filter(|order| order.order == EvacuationOrder::Mandatory)
                .count(),
            evacuations: scene.status_counts(),
            community_risk: scene.risk_counts(),
            risk_level: scene.time_risk,
            narrative: scene.narrative.clone(),
        }
    }

    pub fn file_name(&self) -> String {
        format!(
            "wildfire-risk-assessment-{}.json",
            self.timestamp.format("%Y-%m-%d")
        )
    }

    /// Writes the report as pretty JSON into `dir`, creating it if needed.
    pub fn write_json(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ReportError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(&path)?;
        file.write_all(json.as_bytes())?;
        log::info!("risk assessment written to {}", path.display());
        Ok(path)
    }
}
