use super::params::{SynthParams, MOD_WHEEL_MAX};
use super::registry::NoteRegistry;
use super::renderer::AudioRenderer;
use super::scope::{scope_channel, ScopeReceiver};
use super::waveform::WaveformCatalog;
use crate::config::SynthConfig;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Owned synth state shared by the MIDI listener, the output stream and the
/// control layer. Cloning shares the same state.
#[derive(Clone)]
pub struct Synth {
    registry: Arc<NoteRegistry>,
    params: Arc<SynthParams>,
    catalog: Arc<WaveformCatalog>,
    renderer: Arc<Mutex<AudioRenderer>>,
}

impl Synth {
    pub fn new() -> Self {
        Self::with_catalog(WaveformCatalog::builtin(), SynthParams::default())
    }

    pub fn with_catalog(catalog: WaveformCatalog, params: SynthParams) -> Self {
        let registry = Arc::new(NoteRegistry::new());
        let params = Arc::new(params);
        let catalog = Arc::new(catalog);
        let renderer = AudioRenderer::new(registry.clone(), params.clone(), catalog.clone());
        Self {
            registry,
            params,
            catalog,
            renderer: Arc::new(Mutex::new(renderer)),
        }
    }

    /// Builds a synth from a validated config, with a scope channel of the configured capacity.
    pub fn from_config(config: &SynthConfig) -> Result<(Self, ScopeReceiver)> {
        config.validate()?;
        let catalog = WaveformCatalog::builtin();
        catalog.get(&config.generator)?;

        let params = SynthParams::new(
            config.sample_rate,
            config.amplitude,
            &config.generator,
            config.mod_wheel,
        );
        let synth = Self::with_catalog(catalog, params);
        let (scope_tx, scope_rx) = scope_channel(config.scope_capacity);
        synth.renderer.lock().set_scope(Some(scope_tx));
        Ok((synth, scope_rx))
    }

    pub fn registry(&self) -> &Arc<NoteRegistry> {
        &self.registry
    }

    pub fn params(&self) -> &Arc<SynthParams> {
        &self.params
    }

    pub fn catalog(&self) -> &Arc<WaveformCatalog> {
        &self.catalog
    }

    pub fn renderer(&self) -> &Arc<Mutex<AudioRenderer>> {
        &self.renderer
    }

    pub fn generator_names(&self) -> Vec<&str> {
        self.catalog.names().collect()
    }

    pub fn set_generator(&self, name: &str) -> Result<()> {
        self.catalog.get(name)?;
        self.params.set_generator(name);
        info!("Generator set to {}", name);
        Ok(())
    }

    pub fn set_amplitude(&self, amplitude: f32) -> Result<()> {
        if !amplitude.is_finite() || amplitude <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "amplitude must be a positive number, got {amplitude}"
            )));
        }
        self.params.set_amplitude(amplitude);
        Ok(())
    }

    pub fn set_mod_wheel(&self, value: u8) -> Result<()> {
        if value > MOD_WHEEL_MAX {
            return Err(Error::InvalidConfig(format!(
                "mod wheel must be within 0..={MOD_WHEEL_MAX}, got {value}"
            )));
        }
        self.params.set_mod_wheel(value);
        Ok(())
    }

    /// Records a new output rate and restarts time at 0.
    ///
    /// The output stream must be stopped while this runs; a stream opened at
    /// the old rate would play every note off-pitch. [`NativeSynth::set_sample_rate`]
    /// wraps it in the stop/restart sequence.
    ///
    /// [`NativeSynth::set_sample_rate`]: crate::runtime::NativeSynth::set_sample_rate
    pub(crate) fn set_sample_rate(&self, sample_rate: u32) -> Result<()> {
        if sample_rate == 0 {
            return Err(Error::InvalidConfig("sample rate must be positive".into()));
        }
        self.params.set_sample_rate(sample_rate);
        let mut renderer = self.renderer.lock();
        renderer.prepare();
        renderer.reset_time();
        Ok(())
    }
}

impl Default for Synth {
    fn default() -> Self {
        Self::new()
    }
}
