use crate::audio::AudioBackend;
use crate::error::{Error, Result};
use crate::synth::renderer::AudioRenderer;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleFormat, SampleRate, Stream, StreamConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{error, info};

/// Plays the renderer through the default cpal output device.
///
/// The renderer is shared with the control layer so its time base survives
/// stop/start cycles. The audio callback only ever `try_lock`s it: if the
/// control layer holds it, that block is silent rather than late.
pub struct CpalBackend {
    stream: Option<Stream>,
    renderer: Arc<Mutex<AudioRenderer>>,
    buffer_size: Option<u32>,
}

impl CpalBackend {
    pub fn new(renderer: Arc<Mutex<AudioRenderer>>, buffer_size: Option<u32>) -> Self {
        Self {
            stream: None,
            renderer,
            buffer_size,
        }
    }

    fn select_output_device(&self, host: &cpal::Host) -> Result<cpal::Device> {
        if cfg!(target_os = "linux") {
            // Prefer the sound server over raw hardware nodes
            for device in host.output_devices()? {
                let name = device.name().unwrap_or_default().to_lowercase();
                if name.starts_with("default") || name.contains("pipewire") {
                    return Ok(device);
                }
            }
        }
        host.default_output_device()
            .ok_or_else(|| Error::AudioDevice("No output device available".into()))
    }

    fn build_stream(&mut self) -> Result<Stream> {
        let host = cpal::default_host();
        let device = self.select_output_device(&host)?;
        info!(
            "Selected output device: {}",
            device.name().unwrap_or_default()
        );

        let supported_config = device.default_output_config()?;
        if supported_config.sample_format() != SampleFormat::F32 {
            return Err(Error::AudioDevice(format!(
                "Unsupported sample format {:?}",
                supported_config.sample_format()
            )));
        }

        let sample_rate = self.renderer.lock().prepare();
        let stream_config = StreamConfig {
            channels: supported_config.channels(),
            sample_rate: SampleRate(sample_rate),
            buffer_size: match self.buffer_size {
                Some(frames) => BufferSize::Fixed(frames),
                None => BufferSize::Default,
            },
        };
        let channels = stream_config.channels as usize;
        info!(
            "Output stream: {} Hz, {} channel(s), buffer {:?}",
            sample_rate, channels, stream_config.buffer_size
        );

        let renderer = self.renderer.clone();
        let mut scratch: Vec<f32> = Vec::with_capacity(4096);

        let stream = device.build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| match renderer.try_lock() {
                Some(mut renderer) => renderer.render_interleaved(data, channels, &mut scratch),
                None => data.fill(0.0),
            },
            |err| error!("Stream error: {}", err),
            None,
        )?;

        Ok(stream)
    }
}

impl AudioBackend for CpalBackend {
    fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            info!("Audio stream already running");
            return Ok(());
        }
        info!("Starting audio stream");
        let stream = self.build_stream()?;
        stream.play()?;
        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            info!("Stopping audio stream");
            let paused = stream.pause();
            // dropping the stream closes it and joins the callback
            drop(stream);
            paused?;
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for CpalBackend {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("Failed to stop audio stream: {}", e);
        }
    }
}
