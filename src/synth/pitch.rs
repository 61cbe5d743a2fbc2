/// MIDI note number of concert A.
pub const A4_NOTE: i32 = 69;
/// Frequency of concert A in Hz.
pub const A4_FREQUENCY: f32 = 440.0;

/// Equal-temperament frequency of a MIDI note, in Hz.
///
/// Valid for any integer; callers normally stay within 0..=127.
pub fn frequency_of(note: i32) -> f32 {
    let semitones = (note - A4_NOTE) as f64 / 12.0;
    (A4_FREQUENCY as f64 * 2f64.powf(semitones)) as f32
}
