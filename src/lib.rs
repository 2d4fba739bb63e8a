//! PCGScope - Phonocardiogram Screening
//!
//! Turns per-valve heart-sound recordings into:
//! 1. Feature vectors - time-domain statistics, optionally spectral/cepstral
//! 2. Rule-based screening - a fixed decision table per valve
//! 3. Waveform views - scaled, noise-gated and windowed for display
//!
//! # Architecture
//!
//! `audio` decodes WAV bytes into raw-unit samples; `analysis` and
//! `diagnosis` are pure functions over them; `pipeline` wires one session
//! together, consulting an optional `narrative` provider; `cases` persists
//! patient visits in an append-only JSON store.

pub mod analysis;
pub mod audio;
pub mod cases;
pub mod cli;
pub mod config;
pub mod diagnosis;
pub mod error;
pub mod narrative;
pub mod pipeline;

pub use error::{PcgError, Result};
