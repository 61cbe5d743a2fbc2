//! Live MIDI-driven tone synthesis: a note registry fed by a MIDI polling
//! thread, a catalog of block waveform generators, and a real-time renderer
//! that mixes the held notes into the output device's blocks.

pub mod audio;
pub mod config;
pub mod error;
pub mod input;
pub mod runtime;
pub mod synth;

pub use config::SynthConfig;
pub use error::{Error, ErrorKind, Result};
