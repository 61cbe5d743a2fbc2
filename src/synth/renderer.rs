use super::params::SynthParams;
use super::registry::{ActiveNoteSet, NoteRegistry};
use super::scope::ScopeSender;
use super::waveform::{GeneratorInput, WaveformCatalog};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// The block renderer called from the audio device callback.
///
/// Time is tracked as a frame count at the current rate so that `N` blocks
/// of `F` frames always land exactly on `N * F / rate` seconds.
pub struct AudioRenderer {
    registry: Arc<NoteRegistry>,
    params: Arc<SynthParams>,
    catalog: Arc<WaveformCatalog>,
    scope: Option<ScopeSender>,
    sample_rate: u32,
    frames_elapsed: u64,
    times: Vec<f64>,
    notes: ActiveNoteSet,
    silent_blocks: u64,
}

impl AudioRenderer {
    pub fn new(
        registry: Arc<NoteRegistry>,
        params: Arc<SynthParams>,
        catalog: Arc<WaveformCatalog>,
    ) -> Self {
        let sample_rate = params.sample_rate();
        Self {
            registry,
            params,
            catalog,
            scope: None,
            sample_rate,
            frames_elapsed: 0,
            times: Vec::new(),
            notes: ActiveNoteSet::new(),
            silent_blocks: 0,
        }
    }

    pub fn with_scope(mut self, scope: ScopeSender) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn set_scope(&mut self, scope: Option<ScopeSender>) {
        self.scope = scope;
    }

    /// Seconds rendered since the last reset.
    pub fn time_offset(&self) -> f64 {
        self.frames_elapsed as f64 / self.sample_rate as f64
    }

    pub fn frames_elapsed(&self) -> u64 {
        self.frames_elapsed
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Blocks that fell back to silence because the generator was missing or misbehaved.
    pub fn silent_blocks(&self) -> u64 {
        self.silent_blocks
    }

    pub fn reset_time(&mut self) {
        self.frames_elapsed = 0;
    }

    /// Adopts the rate currently requested in the parameters. Must be called
    /// while no stream is driving this renderer. A changed rate restarts time at 0.
    pub fn prepare(&mut self) -> u32 {
        let requested = self.params.sample_rate();
        if requested != self.sample_rate {
            self.sample_rate = requested;
            self.times.clear();
            self.reset_time();
        }
        self.sample_rate
    }

    /// Renders one mono block into `output`. Never panics on generator failure;
    /// the block is silent instead.
    pub fn render(&mut self, output: &mut [f32]) {
        let frames = output.len();
        let rate = self.sample_rate as f64;
        let time_offset = self.time_offset();

        if self.times.len() != frames {
            self.times.clear();
            self.times.extend((0..frames).map(|i| i as f64 / rate));
        }

        self.registry.snapshot_into(&mut self.notes);
        let params = self.params.snapshot();

        if self.notes.is_empty() {
            output.fill(0.0);
        } else {
            let input = GeneratorInput {
                times: &self.times,
                notes: &self.notes,
                time_offset,
                mod_wheel: params.mod_wheel,
            };
            let mixed = self
                .catalog
                .get(&params.generator)
                .ok()
                .and_then(|generator| {
                    catch_unwind(AssertUnwindSafe(|| generator(&input))).ok()
                })
                .filter(|waves| {
                    waves.len() == self.notes.len() && waves.iter().all(|w| w.len() == frames)
                });

            match mixed {
                Some(waves) => mix_average(output, &waves, params.amplitude),
                None => {
                    output.fill(0.0);
                    self.silent_blocks += 1;
                }
            }
        }

        if let Some(scope) = &self.scope {
            let mut frame = scope.frame();
            frame.times.extend(self.times.iter().map(|t| t + time_offset));
            frame.samples.extend_from_slice(output);
            scope.publish(frame);
        }

        self.frames_elapsed += frames as u64;
    }

    /// Renders one block and copies it to every channel of an interleaved buffer.
    pub fn render_interleaved(&mut self, data: &mut [f32], channels: usize, scratch: &mut Vec<f32>) {
        let channels = channels.max(1);
        scratch.resize(data.len() / channels, 0.0);
        self.render(scratch);
        for (frame, sample) in data.chunks_mut(channels).zip(scratch.iter()) {
            frame.fill(*sample);
        }
    }
}

/// Sums the per-note waves element-wise, divides by the note count and scales by `amplitude`.
fn mix_average(output: &mut [f32], waves: &[Vec<f32>], amplitude: f32) {
    output.fill(0.0);
    for wave in waves {
        for (out, sample) in output.iter_mut().zip(wave) {
            *out += *sample;
        }
    }
    let gain = amplitude / waves.len() as f32;
    for out in output.iter_mut() {
        *out *= gain;
    }
}
