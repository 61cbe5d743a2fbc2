use super::registry::ActiveNoteSet;
use crate::error::{Error, Result};
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

const VIBRATO_DEPTH: f64 = 5.0; // Hz
const VIBRATO_RATE: f64 = 5.0; // Hz
const PWM_MIN_WIDTH: f64 = 0.1;
const PWM_RANGE: f64 = 0.8;

/// Everything a generator may look at when producing one block.
///
/// Every built-in generator evaluates its formula at the absolute time
/// `t + time_offset`, not at the block-local `t`. That includes triangle,
/// sawtooth and square_pwm, so each waveform picks up where the previous
/// block left off.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorInput<'a> {
    /// Block-local sample times, `i / sample_rate`.
    pub times: &'a [f64],
    pub notes: &'a ActiveNoteSet,
    /// Seconds rendered before this block.
    pub time_offset: f64,
    pub mod_wheel: u8,
}

impl GeneratorInput<'_> {
    /// Absolute time of each sample in the block.
    pub fn absolute_times(&self) -> impl Iterator<Item = f64> + '_ {
        let offset = self.time_offset;
        self.times.iter().map(move |t| t + offset)
    }

    pub fn mod_depth(&self) -> f64 {
        self.mod_wheel as f64 / 127.0
    }

    /// Evaluates `wave(frequency, absolute_time)` for every note over the block.
    pub fn per_note<F>(&self, wave: F) -> Vec<Vec<f32>>
    where
        F: Fn(f64, f64) -> f64,
    {
        self.notes
            .values()
            .map(|&freq| {
                self.absolute_times()
                    .map(|t| wave(freq as f64, t) as f32)
                    .collect()
            })
            .collect()
    }
}

/// Pure block generator: one sample sequence per active note, each as long as the block.
pub type GeneratorFn = Arc<dyn Fn(&GeneratorInput<'_>) -> Vec<Vec<f32>> + Send + Sync>;

/// Name-keyed table of generators, enumerated in registration order.
#[derive(Clone)]
pub struct WaveformCatalog {
    entries: Vec<(String, GeneratorFn)>,
}

impl WaveformCatalog {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Catalog holding the built-in waveforms.
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        catalog.register("sine", sine);
        catalog.register("sine_vibrato", sine_vibrato);
        catalog.register("square", square);
        catalog.register("square_pwm", square_pwm);
        catalog.register("triangle", triangle);
        catalog.register("sawtooth", sawtooth);
        catalog
    }

    /// Adds a generator, replacing any existing one with the same name in place.
    pub fn register<F>(&mut self, name: &str, generator: F)
    where
        F: Fn(&GeneratorInput<'_>) -> Vec<Vec<f32>> + Send + Sync + 'static,
    {
        let generator: GeneratorFn = Arc::new(generator);
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = generator,
            None => self.entries.push((name.to_string(), generator)),
        }
    }

    pub fn get(&self, name: &str) -> Result<&GeneratorFn> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, generator)| generator)
            .ok_or_else(|| Error::GeneratorNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for WaveformCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for WaveformCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Fractional position within the current cycle, centred on zero: `x - floor(x + 0.5)`.
#[inline]
fn centred_cycle(cycles: f64) -> f64 {
    cycles - (cycles + 0.5).floor()
}

pub fn sine(input: &GeneratorInput<'_>) -> Vec<Vec<f32>> {
    input.per_note(|freq, t| (2.0 * PI * freq * t).sin())
}

pub fn sine_vibrato(input: &GeneratorInput<'_>) -> Vec<Vec<f32>> {
    let depth = input.mod_depth() * VIBRATO_DEPTH;
    input.per_note(|freq, t| {
        let vibrato = depth * (2.0 * PI * VIBRATO_RATE * t).sin();
        (2.0 * PI * freq * t + vibrato).sin()
    })
}

pub fn square(input: &GeneratorInput<'_>) -> Vec<Vec<f32>> {
    input.per_note(|freq, t| {
        let s = (2.0 * PI * freq * t).sin();
        // sign(0) is 0, so the exact zero crossing stays silent
        if s > 0.0 {
            1.0
        } else if s < 0.0 {
            -1.0
        } else {
            0.0
        }
    })
}

pub fn square_pwm(input: &GeneratorInput<'_>) -> Vec<Vec<f32>> {
    let pulse_width = PWM_MIN_WIDTH + input.mod_depth() * PWM_RANGE;
    input.per_note(|freq, t| {
        if (t * freq).rem_euclid(1.0) < pulse_width {
            1.0
        } else {
            -1.0
        }
    })
}

pub fn triangle(input: &GeneratorInput<'_>) -> Vec<Vec<f32>> {
    input.per_note(|freq, t| 2.0 * (2.0 * centred_cycle(t * freq)).abs() - 1.0)
}

pub fn sawtooth(input: &GeneratorInput<'_>) -> Vec<Vec<f32>> {
    input.per_note(|freq, t| 2.0 * centred_cycle(t * freq))
}
