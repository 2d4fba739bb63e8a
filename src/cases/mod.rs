//! Patient cases and their persistent history

mod lock;
mod patient;
mod record;
mod store;

pub use lock::StoreLock;
pub use patient::{body_mass_index, Gender, PatientRecord, MAX_AGE};
pub use record::{AnalysisEntry, CaseRecord};
pub use store::{CaseRepository, JsonCaseStore, DEFAULT_LOCK_TIMEOUT, STALE_LOCK_AGE};
