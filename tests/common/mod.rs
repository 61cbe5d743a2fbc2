#![allow(dead_code)]

use miditone::synth::{AudioRenderer, NoteRegistry, SynthParams, WaveformCatalog};
use std::sync::Arc;

pub struct Rig {
    pub registry: Arc<NoteRegistry>,
    pub params: Arc<SynthParams>,
    pub renderer: AudioRenderer,
}

/// A renderer over the built-in catalog at `sample_rate`, amplitude 1, generator `generator`.
pub fn rig(sample_rate: u32, generator: &str) -> Rig {
    rig_with_catalog(sample_rate, generator, WaveformCatalog::builtin())
}

pub fn rig_with_catalog(sample_rate: u32, generator: &str, catalog: WaveformCatalog) -> Rig {
    let registry = Arc::new(NoteRegistry::new());
    let params = Arc::new(SynthParams::new(sample_rate, 1.0, generator, 0));
    let renderer = AudioRenderer::new(registry.clone(), params.clone(), Arc::new(catalog));
    Rig {
        registry,
        params,
        renderer,
    }
}

impl Rig {
    pub fn render(&mut self, frames: usize) -> Vec<f32> {
        let mut out = vec![f32::NAN; frames];
        self.renderer.render(&mut out);
        out
    }
}
