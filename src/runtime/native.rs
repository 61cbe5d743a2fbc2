use crate::audio::AudioBackend;
use crate::config::SynthConfig;
use crate::error::{Error, Result};
use crate::input::{ListenerHandle, ListenerState, MidiListener, MidiSource};
use crate::synth::registry::ActiveNoteSet;
use crate::synth::scope::ScopeReceiver;
use crate::synth::Synth;
use std::time::Duration;
use tracing::{error, info, warn};

/// Control-layer facade: owns the synth state, the output backend and the
/// MIDI listener thread, and sequences their lifecycles.
pub struct NativeSynth {
    synth: Synth,
    backend: Box<dyn AudioBackend>,
    listener: Option<ListenerHandle>,
    scope: ScopeReceiver,
    poll_interval: Duration,
    shutdown_timeout: Duration,
}

impl NativeSynth {
    /// Builds the synth from `config` and hands the shared renderer to `make_backend`.
    pub fn new<F>(config: &SynthConfig, make_backend: F) -> Result<Self>
    where
        F: FnOnce(&Synth) -> Box<dyn AudioBackend>,
    {
        let (synth, scope) = Synth::from_config(config)?;
        let backend = make_backend(&synth);
        Ok(Self {
            synth,
            backend,
            listener: None,
            scope,
            poll_interval: config.poll_interval(),
            shutdown_timeout: config.shutdown_timeout(),
        })
    }

    /// Synth wired to the default cpal output device.
    #[cfg(feature = "native")]
    pub fn with_cpal(config: &SynthConfig) -> Result<Self> {
        let buffer_size = config.buffer_size;
        Self::new(config, |synth| {
            let backend: Box<dyn AudioBackend> = Box::new(crate::audio::CpalBackend::new(
                synth.renderer().clone(),
                buffer_size,
            ));
            backend
        })
    }

    pub fn synth(&self) -> &Synth {
        &self.synth
    }

    pub fn scope(&self) -> &ScopeReceiver {
        &self.scope
    }

    pub fn generator_names(&self) -> Vec<&str> {
        self.synth.generator_names()
    }

    pub fn active_notes(&self) -> ActiveNoteSet {
        self.synth.registry().snapshot()
    }

    pub fn is_playing(&self) -> bool {
        self.backend.is_running()
    }

    /// Starts output. A request while the stream is already open is ignored.
    pub fn request_start(&mut self) -> Result<()> {
        if self.backend.is_running() {
            info!("Audio stream already running, ignoring start request");
            return Ok(());
        }
        self.backend.start()
    }

    pub fn request_stop(&mut self) -> Result<()> {
        self.backend.stop()
    }

    pub fn set_generator(&self, name: &str) -> Result<()> {
        self.synth.set_generator(name)
    }

    pub fn set_amplitude(&self, amplitude: f32) -> Result<()> {
        self.synth.set_amplitude(amplitude)
    }

    pub fn set_mod_wheel(&self, value: u8) -> Result<()> {
        self.synth.set_mod_wheel(value)
    }

    /// Switches the output rate: stop, mutate, reset time, restart if it was playing.
    pub fn set_sample_rate(&mut self, sample_rate: u32) -> Result<()> {
        if sample_rate == 0 {
            return Err(Error::InvalidConfig("sample rate must be positive".into()));
        }
        let was_playing = self.backend.is_running();
        self.backend.stop()?;
        self.synth.set_sample_rate(sample_rate)?;
        info!("Sample rate set to {} Hz", sample_rate);
        if was_playing {
            self.backend.start()?;
        }
        Ok(())
    }

    /// Starts listening on `source`, replacing any running listener.
    pub fn start_listener(&mut self, source: Option<Box<dyn MidiSource>>) -> Result<()> {
        let Some(source) = source else {
            warn!("No MIDI port selected.");
            return Err(Error::NoInputDevice);
        };
        self.stop_listener();

        let listener = MidiListener::new(self.synth.registry().clone())
            .with_mod_wheel(self.synth.params().clone())
            .with_poll_interval(self.poll_interval);
        self.listener = Some(listener.spawn(Some(source))?);
        Ok(())
    }

    pub fn listener_state(&self) -> ListenerState {
        self.listener
            .as_ref()
            .map_or(ListenerState::Terminated, ListenerHandle::state)
    }

    /// Stops the listener, waiting at most the configured shutdown timeout.
    pub fn stop_listener(&mut self) {
        if let Some(handle) = self.listener.take() {
            info!("Stopping MIDI input handling.");
            match handle.shutdown(self.shutdown_timeout) {
                Some(Err(e)) => error!("MIDI listener ended with error: {}", e),
                Some(Ok(())) => {}
                None => warn!("MIDI listener still running after {:?}", self.shutdown_timeout),
            }
        }
    }

    /// Best-effort teardown: listener first, then the output stream.
    pub fn shutdown(mut self) {
        self.stop_listener();
        if let Err(e) = self.backend.stop() {
            error!("Failed to stop audio stream: {}", e);
        }
        info!("Shut down");
    }
}
