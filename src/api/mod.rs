pub mod client;
pub mod models;

pub use client::{Endpoints, HttpVitalsApi, VitalsApi};
pub use models::{AlertSubmission, Device, ReadingSubmission, Resident, ResidentId};
