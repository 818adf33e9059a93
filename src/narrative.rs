//! Human-readable status lines for a scene.

use crate::clock::format_hour;
use crate::evacuation::{EvacuationAssignment, StatusCounts};
use crate::fire::{FirePerimeter, Intensity};

const HOURLY_CONDITIONS: [&str; 24] = [
    "Midnight: Coolest conditions, highest humidity. Lowest fire risk period.",
    "Early morning hours: Stable conditions, opportunity for suppression activities.",
    "Deep night: Most favorable conditions for fire suppression.",
    "Pre-dawn: Coolest temperatures, highest humidity of the day.",
    "Before sunrise: Optimal conditions for firefighting operations.",
    "Dawn approaching: Preparing for another day of fire weather.",
    "Early morning conditions: Light winds, low humidity. Fire risk is moderate.",
    "Dawn breaking: Temperatures beginning to rise, humidity dropping slightly.",
    "Morning warming begins. Humidity dropping, wind speeds increasing slightly.",
    "Mid-morning: Solar heating starting to drive wind patterns.",
    "Late morning: Temperatures rising, fire weather conditions developing.",
    "Pre-noon: Critical fire weather thresholds approaching.",
    "Noon conditions: Heat building, relative humidity falling below critical thresholds.",
    "Early afternoon: Wind speeds intensifying, extreme fire danger developing.",
    "Peak danger time: Winds reaching maximum speeds at 2:00 PM. Highest fire risk across the region.",
    "Peak conditions continue: Maximum fire weather severity. All resources on high alert.",
    "Late afternoon: Extreme fire weather continues. Enhanced evacuation readiness recommended.",
    "Early evening: Conditions remain critical but may begin to moderate.",
    "Evening approach: Fire weather typically begins to calm, but risks persist.",
    "Sunset: Winds should start to diminish, but vigilance required.",
    "Dusk: Fire weather conditions moderating but remain dangerous.",
    "Night falling: Cooling temperatures, increasing humidity expected.",
    "Late evening: Fire weather subsiding, but overnight monitoring continues.",
    "Night conditions: Lower fire risk, but hot spots may remain active.",
];

/// Background conditions message for an hour of the day.
pub fn hourly_conditions(hour: u8) -> &'static str {
    HOURLY_CONDITIONS[usize::from(hour % 24)]
}

/// Summarises the scene in one line: fire count, acreage, overall fire
/// behaviour and the most severe evacuation tier reached.
pub fn compose(hour: u8, fires: &[FirePerimeter], assignments: &[EvacuationAssignment]) -> String {
    let time = format_hour(hour);
    let tier = risk_tier(&StatusCounts::tally(assignments));

    if fires.is_empty() {
        return format!("{time}: No active fires. {tier}");
    }

    let count = fires.len();
    let plural = if count == 1 { "" } else { "s" };
    let acres: f64 = fires.iter().map(|fire| fire.acres).sum();
    format!(
        "{time}: {count} active fire{plural} burning {} acres. {} {tier}",
        format_acres(acres),
        fire_status(fires)
    )
}

/// Evacuation status line: communities and residents affected, broken
/// down by tier.
pub fn evacuation_status(assignments: &[EvacuationAssignment]) -> String {
    let counts = StatusCounts::tally(assignments);
    if counts.total() == 0 {
        return "No evacuation zones currently active. All population centers are at safe distances from active fires.".to_string();
    }

    let mut message = format!(
        "EVACUATION STATUS: {} communities affected ({} residents).",
        counts.total(),
        format_count(counts.total_population())
    );
    let tiers = [
        ("IMMEDIATE", counts.immediate, counts.immediate_population),
        ("WARNING", counts.warning, counts.warning_population),
        ("ADVISORY", counts.advisory, counts.advisory_population),
    ];
    for (label, communities, residents) in tiers {
        if communities > 0 {
            message.push_str(&format!(
                " {communities} {label} ({} people).",
                format_count(residents)
            ));
        }
    }
    message
}

fn risk_tier(counts: &StatusCounts) -> String {
    if counts.immediate > 0 {
        format!("{} communities at EXTREME risk!", counts.immediate)
    } else if counts.warning > 0 {
        format!("{} communities at HIGH risk", counts.warning)
    } else if counts.advisory > 0 {
        format!("{} communities at elevated risk", counts.advisory)
    } else {
        "All communities at normal risk levels".to_string()
    }
}

fn fire_status(fires: &[FirePerimeter]) -> &'static str {
    let worst = fires.iter().map(|fire| fire.intensity).max();
    match worst {
        Some(Intensity::Extreme) => "Extreme fire behavior observed.",
        Some(Intensity::High) => "Fires spreading actively.",
        Some(Intensity::Moderate) => "Moderate fire activity.",
        Some(Intensity::Low) => "Fire activity is low.",
        Some(Intensity::Contained) | None => "All fires contained.",
    }
}

/// Thousands separators, `48899` -> `"48,899"`.
fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn format_acres(acres: f64) -> String {
    if acres.fract() == 0.0 {
        format!("{acres:.0}")
    } else {
        format!("{acres:.1}")
    }
}
