use super::pitch::frequency_of;
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Currently sounding notes, keyed by MIDI note number, valued by frequency in Hz.
pub type ActiveNoteSet = BTreeMap<u8, f32>;

/// Thread-safe set of held notes shared between the MIDI listener (writer)
/// and the audio renderer (reader).
///
/// Every operation holds the lock only for the map mutation or copy itself.
#[derive(Debug, Default)]
pub struct NoteRegistry {
    notes: Mutex<ActiveNoteSet>,
}

impl NoteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `note` as sounding. Returns its frequency.
    pub fn note_on(&self, note: u8) -> f32 {
        let frequency = frequency_of(note as i32);
        self.notes.lock().insert(note, frequency);
        frequency
    }

    /// Releases `note`. Returns whether it was sounding.
    pub fn note_off(&self, note: u8) -> bool {
        self.notes.lock().remove(&note).is_some()
    }

    /// Releases every note.
    pub fn clear(&self) {
        self.notes.lock().clear();
    }

    pub fn snapshot(&self) -> ActiveNoteSet {
        self.notes.lock().clone()
    }

    /// Copies the current set into `out`, reusing its storage where possible.
    pub fn snapshot_into(&self, out: &mut ActiveNoteSet) {
        out.clone_from(&self.notes.lock());
    }

    pub fn len(&self) -> usize {
        self.notes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.lock().is_empty()
    }

    pub fn contains(&self, note: u8) -> bool {
        self.notes.lock().contains_key(&note)
    }
}
