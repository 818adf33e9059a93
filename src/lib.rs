pub mod clock;
pub mod engine;
pub mod evacuation;
pub mod fire;
pub mod geo;
pub mod narrative;
pub mod playback;
pub mod population;
pub mod report;
pub mod risk;
pub mod scenario;
pub mod weather;

pub use clock::{ClockError, SimulationClock, TickPeriod};
pub use engine::{Engine, Scene, SceneReport};
pub use evacuation::{derive_assignments, derive_zones};
pub use playback::{FrameCause, Playback, SceneFrame};
pub use report::RiskAssessmentReport;
pub use risk::{classify, RiskLevel};
pub use scenario::{Scenario, ScenarioLoader};
