pub mod scheduler;
pub mod timer;

pub use scheduler::{Scheduler, SchedulerMessage};
pub use timer::{CancelHandle, RepeatingTimer};
