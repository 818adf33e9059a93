use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use tokio_stream::StreamExt;

use wildfire_scene::{
    Engine, Playback, RiskAssessmentReport, Scenario, ScenarioLoader, Scene, SceneFrame,
    TickPeriod,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Wildfire scene recomputation runner")]
struct Cli {
    /// Path to a scenario YAML file (bundled Coachella Valley data when omitted)
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Hour of day to render, 0-23 (scenario start hour when omitted)
    #[arg(long)]
    hour: Option<i64>,

    /// Play the timeline forward instead of rendering one hour
    #[arg(long)]
    play: bool,

    /// Number of ticks to play
    #[arg(long, default_value_t = 18)]
    ticks: u64,

    /// Tick period in milliseconds: 500, 1000 or 2000
    #[arg(long)]
    period_ms: Option<u64>,

    /// Write a risk assessment for the final scene into this directory
    #[arg(long)]
    report_dir: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new().with_level(level).init()?;

    let scenario = match &cli.scenario {
        Some(path) => ScenarioLoader::new(".").load(path)?,
        None => Scenario::bundled().context("Bundled scenario failed to load")?,
    };

    let mut clock = scenario.clock()?;
    if let Some(ms) = cli.period_ms {
        clock.set_tick_period(TickPeriod::from_millis(ms)?);
    }
    if let Some(hour) = cli.hour {
        clock.set_hour(hour)?;
    }

    let playback = Playback::new(Engine::from_scenario(&scenario), clock);
    let initial = playback
        .refresh()
        .context("Initial scene computation was skipped")?;

    let last = if cli.play {
        play(&playback, cli.ticks).await?.unwrap_or(initial)
    } else {
        initial
    };
    print_scene(&last.scene);

    if let Some(dir) = cli.report_dir {
        let report = RiskAssessmentReport::from_scene(&last.scene, Utc::now());
        let path = report.write_json(&dir)?;
        println!("Risk assessment saved to {}", path.display());
    }
    Ok(())
}

async fn play(playback: &Playback, ticks: u64) -> Result<Option<SceneFrame>> {
    let mut frames = Box::pin(playback.frames());
    playback.start()?;

    let mut last = None;
    let mut remaining = ticks;
    while remaining > 0 {
        tokio::select! {
            frame = frames.next() => {
                let Some(frame) = frame else { break };
                println!(
                    "{} | {} fires | {} acres | {} evacuations",
                    frame.scene.time_label,
                    frame.scene.fires.len(),
                    frame.scene.total_acres(),
                    frame.scene.assignments.len()
                );
                last = Some(frame);
                remaining -= 1;
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("interrupted, stopping playback");
                break;
            }
        }
    }

    playback.stop();
    Ok(last)
}

fn print_scene(scene: &Scene) {
    println!("Scenario '{}' at {}", scene.scenario, scene.time_label);
    println!("{}", scene.narrative);
    println!("{}", scene.conditions);
    println!("{}", scene.evacuation_status);
    println!("Time-of-day fire risk: {}", scene.time_risk.label());
    for order in &scene.fire_orders {
        println!(
            "  {} ({} threat): {} evacuation within {:.1} km",
            order.fire_id,
            order.threat.label(),
            order.order.label(),
            order.radius_m / 1_000.0
        );
    }
    for assignment in &scene.assignments {
        println!(
            "  [{}] {} ({} residents) {:.1} mi from {}, est. {} min",
            assignment.status.label(),
            assignment.center_name,
            assignment.population,
            assignment.distance_miles,
            assignment.triggered_by,
            assignment.estimated_minutes
        );
        if let Some(shelter) = &assignment.shelter {
            println!(
                "      shelter: {} ({} beds, {:.1} mi)",
                shelter.name, shelter.capacity, shelter.distance_miles
            );
        }
    }
    for obs in &scene.weather {
        println!(
            "  {}: {}F, {}% RH, {} mph {:?}, fire weather {}",
            obs.station,
            obs.temperature_f,
            obs.humidity_pct,
            obs.wind_mph,
            obs.wind_direction,
            obs.fire_weather.label()
        );
    }
}
