//! Valve screening
//!
//! Maps `(valve, features)` to a diagnosis through per-valve decision
//! tables. The tables are deliberately simple placeholders; their exact
//! boundaries are part of the behaviour.

mod classifier;
mod label;
pub mod rules;
mod valve;

pub use classifier::{DiagnosisResult, DiagnosticClassifier};
pub use label::DiagnosisLabel;
pub use rules::{rules_for, Rule};
pub use valve::Valve;
