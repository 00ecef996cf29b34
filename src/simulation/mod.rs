pub mod cycle;
pub mod heart_data;
pub mod state;

pub use cycle::{CycleConfig, ResidentSimulation, SimulationBuilder, TriggerOutcome};
pub use heart_data::{CriticalKind, Reading};
pub use state::SimulationState;
