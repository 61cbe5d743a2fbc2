const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const CONTROL_CHANGE: u8 = 0xB0;

/// Controller number of the modulation wheel.
pub const MOD_WHEEL_CC: u8 = 1;

/// A raw channel message as delivered by an input source: status plus two data bytes.
pub type RawMidi = (u8, u8, u8);

/// The subset of MIDI the synth reacts to. The channel is not tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
    ControlChange { controller: u8, value: u8 },
}

impl MidiMessage {
    /// Decodes a message. Unknown statuses, short messages and data bytes
    /// outside 0..=127 yield `None`.
    ///
    /// A note-on with velocity 0 is reported as `NoteOff`.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [status, data1, data2, ..] => Self::from_raw((*status, *data1, *data2)),
            _ => None,
        }
    }

    pub fn from_raw((status, data1, data2): RawMidi) -> Option<Self> {
        if data1 > 0x7F || data2 > 0x7F {
            return None;
        }
        match status & 0xF0 {
            NOTE_ON if data2 > 0 => Some(MidiMessage::NoteOn {
                note: data1,
                velocity: data2,
            }),
            NOTE_ON | NOTE_OFF => Some(MidiMessage::NoteOff { note: data1 }),
            CONTROL_CHANGE => Some(MidiMessage::ControlChange {
                controller: data1,
                value: data2,
            }),
            _ => None,
        }
    }

    pub fn note_on(note: u8, velocity: u8) -> RawMidi {
        (NOTE_ON, note, velocity)
    }

    pub fn note_off(note: u8) -> RawMidi {
        (NOTE_OFF, note, 0)
    }

    pub fn control_change(controller: u8, value: u8) -> RawMidi {
        (CONTROL_CHANGE, controller, value)
    }
}
