use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;

pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
pub const DEFAULT_GENERATOR: &str = "sine";
pub const MOD_WHEEL_MAX: u8 = 127;

/// Live control block written by the control layer and read once per block
/// by the renderer.
///
/// Every field is an atomic or an atomically swapped pointer, so the audio
/// thread never takes a lock to read it. Validation of values happens in
/// [`Synth`](super::core::Synth) before they land here.
#[derive(Debug)]
pub struct SynthParams {
    sample_rate: AtomicU32,
    amplitude_bits: AtomicU32,
    mod_wheel: AtomicU8,
    generator: ArcSwap<String>,
}

/// Consistent copy of [`SynthParams`] taken at the start of a render block.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamsSnapshot {
    pub sample_rate: u32,
    pub amplitude: f32,
    pub mod_wheel: u8,
    pub generator: Arc<String>,
}

impl SynthParams {
    pub fn new(sample_rate: u32, amplitude: f32, generator: &str, mod_wheel: u8) -> Self {
        Self {
            sample_rate: AtomicU32::new(sample_rate),
            amplitude_bits: AtomicU32::new(amplitude.to_bits()),
            mod_wheel: AtomicU8::new(mod_wheel.min(MOD_WHEEL_MAX)),
            generator: ArcSwap::from_pointee(generator.to_string()),
        }
    }

    #[inline]
    pub fn snapshot(&self) -> ParamsSnapshot {
        ParamsSnapshot {
            sample_rate: self.sample_rate(),
            amplitude: self.amplitude(),
            mod_wheel: self.mod_wheel(),
            generator: self.generator.load_full(),
        }
    }

    /// Requested output rate. Only changed while the output stream is stopped.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_sample_rate(&self, sample_rate: u32) {
        self.sample_rate.store(sample_rate, Ordering::Release);
    }

    #[inline]
    pub fn amplitude(&self) -> f32 {
        f32::from_bits(self.amplitude_bits.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set_amplitude(&self, amplitude: f32) {
        self.amplitude_bits
            .store(amplitude.to_bits(), Ordering::Relaxed);
    }

    #[inline]
    pub fn mod_wheel(&self) -> u8 {
        self.mod_wheel.load(Ordering::Relaxed)
    }

    /// Stores the mod wheel position, clamped to the MIDI data range.
    #[inline]
    pub fn set_mod_wheel(&self, value: u8) {
        self.mod_wheel
            .store(value.min(MOD_WHEEL_MAX), Ordering::Relaxed);
    }

    pub fn generator(&self) -> Arc<String> {
        self.generator.load_full()
    }

    pub fn set_generator(&self, name: &str) {
        self.generator.store(Arc::new(name.to_string()));
    }
}

impl Default for SynthParams {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE, 1.0, DEFAULT_GENERATOR, 0)
    }
}
