//! Audio Module
//!
//! - WAV decoding into raw-unit recordings
//! - The recording type shared by every analysis stage
//! - Synthetic signals and WAV encoding for fixtures

pub mod decode;
pub mod sample;
pub mod synth;

pub use decode::{decode_wav, decode_wav_file};
pub use sample::AudioSample;
pub use synth::{encode_wav, encode_wav_float, write_wav_file};
