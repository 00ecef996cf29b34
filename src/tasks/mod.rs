pub mod alarm;
pub mod logger;
pub mod sensor;

pub use alarm::dispatch_alert;
pub use logger::ReadingLog;
pub use sensor::submit_reading;
