use super::listener::MidiSource;
use super::message::{MidiMessage, RawMidi};
use crate::error::{Error, Result};
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use device_query::{DeviceQuery, DeviceState, Keycode};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

const KEY_VELOCITY: u8 = 100;
const SCAN_INTERVAL: Duration = Duration::from_millis(5);

fn key_to_note() -> HashMap<Keycode, u8> {
    [
        // Bottom row - natural notes
        (Keycode::A, 57),         // A3
        (Keycode::S, 59),         // B3
        (Keycode::D, 60),         // C4
        (Keycode::F, 62),         // D4
        (Keycode::G, 64),         // E4
        (Keycode::H, 65),         // F4
        (Keycode::J, 67),         // G4
        (Keycode::K, 69),         // A4
        (Keycode::L, 71),         // B4
        (Keycode::Semicolon, 72), // C5
        // Top row - sharps
        (Keycode::W, 58),           // A#3
        (Keycode::R, 61),           // C#4
        (Keycode::T, 63),           // D#4
        (Keycode::U, 66),           // F#4
        (Keycode::I, 68),           // G#4
        (Keycode::O, 70),           // A#4
        (Keycode::LeftBracket, 73), // C#5
    ]
    .into_iter()
    .collect()
}

/// Computer keyboard as a note source, for playing without a controller.
///
/// Keys are scanned on a private thread (the platform key state handle stays
/// on that thread) and edges are turned into raw note-on/note-off messages.
pub struct KeyboardSource {
    receiver: Receiver<RawMidi>,
    running: Arc<AtomicBool>,
    scanner: Option<JoinHandle<()>>,
}

impl KeyboardSource {
    pub fn new() -> Result<Self> {
        let (sender, receiver) = unbounded();
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let scanner = thread::Builder::new()
            .name("keyboard-scan".into())
            .spawn(move || scan_keys(sender, flag))?;
        info!("Computer keyboard input enabled (A..; and W..[)");
        Ok(Self {
            receiver,
            running,
            scanner: Some(scanner),
        })
    }
}

fn scan_keys(sender: Sender<RawMidi>, running: Arc<AtomicBool>) {
    let device_state = DeviceState::new();
    let key_to_note = key_to_note();
    let mut held: HashMap<Keycode, bool> = key_to_note.keys().map(|k| (*k, false)).collect();

    while running.load(Ordering::Acquire) {
        let keys: Vec<Keycode> = device_state.get_keys();
        for (key, note) in &key_to_note {
            let is_pressed = keys.contains(key);
            let was_pressed = held.get(key).copied().unwrap_or(false);
            if is_pressed == was_pressed {
                continue;
            }
            debug!("Key '{:?}' {}", key, if is_pressed { "pressed" } else { "released" });
            let raw = if is_pressed {
                MidiMessage::note_on(*note, KEY_VELOCITY)
            } else {
                MidiMessage::note_off(*note)
            };
            if sender.send(raw).is_err() {
                return;
            }
            held.insert(*key, is_pressed);
        }
        thread::sleep(SCAN_INTERVAL);
    }
}

impl MidiSource for KeyboardSource {
    fn name(&self) -> &str {
        "computer keyboard"
    }

    fn read(&mut self, out: &mut Vec<RawMidi>) -> Result<usize> {
        let start = out.len();
        loop {
            match self.receiver.try_recv() {
                Ok(raw) => out.push(raw),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    return Err(Error::MidiDevice("keyboard scanner stopped".into()))
                }
            }
        }
        Ok(out.len() - start)
    }

    fn close(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(scanner) = self.scanner.take() {
            let _ = scanner.join();
        }
    }
}

impl Drop for KeyboardSource {
    fn drop(&mut self) {
        self.close();
    }
}
