//! Background MIDI polling loop feeding the note registry.

use super::message::{MidiMessage, RawMidi, MOD_WHEEL_CC};
use crate::error::{Error, Result};
use crate::synth::params::SynthParams;
use crate::synth::registry::NoteRegistry;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, trace};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A pollable supplier of raw MIDI messages.
pub trait MidiSource: Send {
    fn name(&self) -> &str;

    /// Appends every pending message to `out` without blocking and returns how many were added.
    fn read(&mut self, out: &mut Vec<RawMidi>) -> Result<usize>;

    /// Releases the underlying device.
    fn close(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Listening,
    Stopping,
    Terminated,
}

pub struct MidiListener {
    registry: Arc<NoteRegistry>,
    params: Option<Arc<SynthParams>>,
    alive: Arc<AtomicBool>,
    poll_interval: Duration,
}

impl MidiListener {
    pub fn new(registry: Arc<NoteRegistry>) -> Self {
        Self {
            registry,
            params: None,
            alive: Arc::new(AtomicBool::new(true)),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Routes mod wheel control changes into `params`.
    pub fn with_mod_wheel(mut self, params: Arc<SynthParams>) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Asks the loop to exit; honored within one poll interval.
    pub fn stop(&self) {
        self.alive.store(false, Ordering::Release);
    }

    /// Applies one raw message to the registry (or the mod wheel).
    pub fn handle(&self, raw: RawMidi) {
        match MidiMessage::from_raw(raw) {
            Some(MidiMessage::NoteOn { note, velocity }) => {
                let frequency = self.registry.note_on(note);
                debug!("Note ON {} (vel {}) -> {:.2} Hz", note, velocity, frequency);
            }
            Some(MidiMessage::NoteOff { note }) => {
                if self.registry.note_off(note) {
                    debug!("Note OFF {}", note);
                }
            }
            Some(MidiMessage::ControlChange { controller, value }) => match &self.params {
                Some(params) if controller == MOD_WHEEL_CC => {
                    params.set_mod_wheel(value);
                    trace!("Mod wheel -> {}", value);
                }
                _ => trace!("Ignoring control change {} = {}", controller, value),
            },
            None => trace!("Ignoring MIDI message {:02X?}", raw),
        }
    }

    /// Runs the polling loop on the current thread until stopped or the source fails.
    ///
    /// With no source this logs and returns immediately.
    pub fn run(&self, source: Option<Box<dyn MidiSource>>) -> Result<()> {
        let Some(mut source) = source else {
            info!("No MIDI input source selected, listener not started");
            return Ok(());
        };

        // notes left hanging by a previous listener
        self.registry.clear();
        info!("Listening on MIDI input: {}", source.name());

        let mut pending: Vec<RawMidi> = Vec::with_capacity(16);
        let result = loop {
            if !self.is_alive() {
                break Ok(());
            }
            pending.clear();
            match source.read(&mut pending) {
                Ok(0) => thread::sleep(self.poll_interval),
                Ok(_) => {
                    for raw in pending.drain(..) {
                        self.handle(raw);
                    }
                }
                Err(e) => break Err(e),
            }
        };

        source.close();
        match &result {
            Ok(()) => info!("MIDI input handling thread terminating"),
            Err(e) => error!("Error in MIDI input handling: {}", e),
        }
        result
    }

    /// Moves the listener onto its own thread.
    pub fn spawn(self, source: Option<Box<dyn MidiSource>>) -> Result<ListenerHandle> {
        let alive = self.alive.clone();
        // never sent on; the receiver sees a disconnect when the thread ends
        let (done_tx, done_rx) = bounded::<()>(0);
        let thread = thread::Builder::new()
            .name("midi-listener".into())
            .spawn(move || {
                let _done = done_tx;
                self.run(source)
            })?;

        Ok(ListenerHandle {
            alive,
            done: done_rx,
            thread: Some(thread),
        })
    }
}

/// Owner side of a spawned listener.
pub struct ListenerHandle {
    alive: Arc<AtomicBool>,
    done: Receiver<()>,
    thread: Option<JoinHandle<Result<()>>>,
}

impl ListenerHandle {
    pub fn state(&self) -> ListenerState {
        let finished = self.thread.as_ref().map_or(true, |t| t.is_finished());
        if finished {
            ListenerState::Terminated
        } else if self.alive.load(Ordering::Acquire) {
            ListenerState::Listening
        } else {
            ListenerState::Stopping
        }
    }

    pub fn stop(&self) {
        self.alive.store(false, Ordering::Release);
    }

    /// Waits up to `timeout` for the thread to exit.
    ///
    /// Returns `None` if it is still running (or was already joined), otherwise its result.
    pub fn join_timeout(&mut self, timeout: Duration) -> Option<Result<()>> {
        self.thread.as_ref()?;
        match self.done.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => None,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                let thread = self.thread.take()?;
                Some(
                    thread
                        .join()
                        .unwrap_or_else(|_| Err(Error::MidiDevice("listener thread panicked".into()))),
                )
            }
        }
    }

    /// Stops the loop and waits at most `timeout`; a stalled device is abandoned.
    pub fn shutdown(mut self, timeout: Duration) -> Option<Result<()>> {
        self.stop();
        let result = self.join_timeout(timeout);
        if result.is_none() {
            debug!("MIDI listener did not exit within {:?}, detaching", timeout);
        }
        result
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
