mod common;

use approx::assert_abs_diff_eq;
use common::{rig, rig_with_catalog};
use miditone::synth::{scope_channel, GeneratorInput, WaveformCatalog};

#[test]
fn time_offset_advances_by_block_duration() {
    let mut rig = rig(44_100, "sine");
    for _ in 0..10 {
        rig.render(512);
    }
    assert_eq!(rig.renderer.time_offset(), (10 * 512) as f64 / 44_100.0);

    // advancing does not depend on notes being held
    rig.registry.note_on(60);
    for _ in 0..5 {
        rig.render(512);
    }
    assert_eq!(rig.renderer.time_offset(), (15 * 512) as f64 / 44_100.0);
}

#[test]
fn empty_registry_renders_silence_for_every_generator() {
    let catalog = WaveformCatalog::builtin();
    for name in catalog.names() {
        let mut rig = rig(48_000, name);
        rig.params.set_amplitude(7.5);
        rig.params.set_mod_wheel(127);
        let block = rig.render(256);
        assert!(block.iter().all(|s| *s == 0.0), "{name} was not silent");
    }
}

#[test]
fn sine_starts_at_zero_and_peaks_at_quarter_period() {
    // note 69 = 440 Hz; at 17600 Hz sample 10 sits exactly a quarter period in
    let mut rig = rig(17_600, "sine");
    rig.registry.note_on(69);
    let block = rig.render(64);
    assert_abs_diff_eq!(block[0], 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(block[10], 1.0, epsilon = 1e-5);
    assert_abs_diff_eq!(block[20], 0.0, epsilon = 1e-5);
    assert_abs_diff_eq!(block[30], -1.0, epsilon = 1e-5);
}

#[test]
fn phase_is_continuous_across_blocks() {
    let mut split = rig(8_000, "sine");
    let mut whole = rig(8_000, "sine");
    split.registry.note_on(57);
    whole.registry.note_on(57);

    let mut joined = split.render(100);
    joined.extend(split.render(100));
    let reference = whole.render(200);

    for (a, b) in joined.iter().zip(&reference) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-5);
    }
}

#[test]
fn sawtooth_is_continuous_across_blocks() {
    let mut split = rig(8_000, "sawtooth");
    let mut whole = rig(8_000, "sawtooth");
    split.registry.note_on(45);
    whole.registry.note_on(45);

    let mut joined = split.render(37);
    joined.extend(split.render(37));
    let reference = whole.render(74);

    for (a, b) in joined.iter().zip(&reference) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-4);
    }
}

#[test]
fn notes_are_averaged_then_amplified() {
    let mut rig = rig(44_100, "square");
    rig.params.set_amplitude(0.5);
    rig.registry.note_on(69);
    rig.registry.note_on(81);

    let block = rig.render(32);
    // sample 1: both squares are positive -> (1 + 1) / 2 * 0.5
    assert_abs_diff_eq!(block[1], 0.5, epsilon = 1e-6);
    assert!(block.iter().all(|s| s.abs() <= 0.5 + 1e-6));
}

#[test]
fn generator_switch_applies_to_next_block_only() {
    let mut rig = rig(44_100, "sine");
    let mut reference = common::rig(44_100, "square");
    rig.registry.note_on(64);
    reference.registry.note_on(64);

    let first = rig.render(128);
    reference.render(128);
    assert!(first.iter().any(|s| s.abs() > 0.0 && s.abs() < 0.99));

    rig.params.set_generator("square");
    let second = rig.render(128);
    let expected = reference.render(128);

    assert_eq!(second, expected);
    assert_eq!(rig.renderer.time_offset(), reference.renderer.time_offset());
    assert_eq!(rig.renderer.time_offset(), 256.0 / 44_100.0);
}

#[test]
fn unknown_generator_degrades_to_silence() {
    let mut rig = rig(44_100, "organ");
    rig.registry.note_on(60);
    let block = rig.render(64);
    assert!(block.iter().all(|s| *s == 0.0));
    assert_eq!(rig.renderer.silent_blocks(), 1);
    assert_eq!(rig.renderer.frames_elapsed(), 64);
}

#[test]
fn misbehaving_generators_degrade_to_silence() {
    let mut catalog = WaveformCatalog::builtin();
    catalog.register("short", |input: &GeneratorInput<'_>| {
        input.notes.values().map(|_| vec![1.0; 3]).collect()
    });
    catalog.register("panics", |_: &GeneratorInput<'_>| -> Vec<Vec<f32>> {
        panic!("generator failure")
    });

    let mut rig = rig_with_catalog(44_100, "short", catalog);
    rig.registry.note_on(60);
    assert!(rig.render(16).iter().all(|s| *s == 0.0));

    rig.params.set_generator("panics");
    assert!(rig.render(16).iter().all(|s| *s == 0.0));

    assert_eq!(rig.renderer.silent_blocks(), 2);
    assert_eq!(rig.renderer.frames_elapsed(), 32);
}

#[test]
fn prepare_resets_time_only_when_rate_changes() {
    let mut rig = rig(44_100, "sine");
    rig.render(441);
    assert_eq!(rig.renderer.prepare(), 44_100);
    assert_eq!(rig.renderer.frames_elapsed(), 441);

    rig.params.set_sample_rate(48_000);
    assert_eq!(rig.renderer.prepare(), 48_000);
    assert_eq!(rig.renderer.time_offset(), 0.0);

    rig.render(480);
    assert_eq!(rig.renderer.time_offset(), 0.01);
}

#[test]
fn scope_receives_absolute_times_and_output() {
    let (tx, rx) = scope_channel(4);
    let mut rig = rig(1_000, "sine");
    rig.renderer.set_scope(Some(tx));
    rig.registry.note_on(69);
    rig.params.set_amplitude(0.3);

    rig.render(10);
    let second = rig.render(10);

    let frames: Vec<_> = std::iter::from_fn(|| rx.try_recv()).collect();
    assert_eq!(frames.len(), 2);
    assert_abs_diff_eq!(frames[1].times[0], 0.01, epsilon = 1e-12);
    assert_abs_diff_eq!(frames[1].times[9], 0.019, epsilon = 1e-12);
    assert_eq!(frames[1].samples, second);
}

#[test]
fn slow_scope_consumer_never_blocks_rendering() {
    let (tx, rx) = scope_channel(2);
    let mut rig = rig(1_000, "sine");
    rig.renderer.set_scope(Some(tx));
    for _ in 0..50 {
        rig.render(10);
    }
    assert_eq!(rx.len(), 2);
    let latest = rx.latest().expect("frame");
    assert_abs_diff_eq!(latest.times[0], 0.49, epsilon = 1e-9);
}

#[test]
fn recycled_scope_frames_are_refilled_in_place() {
    let (tx, rx) = scope_channel(2);
    let mut rig = rig(1_000, "sine");
    rig.renderer.set_scope(Some(tx));
    rig.registry.note_on(69);

    rig.render(32);
    let first = rx.try_recv().expect("frame");
    let (times_ptr, samples_ptr) = (first.times.as_ptr(), first.samples.as_ptr());
    rx.recycle(first);

    let out = rig.render(32);
    let second = rx.try_recv().expect("frame");
    assert_eq!(second.times.as_ptr(), times_ptr);
    assert_eq!(second.samples.as_ptr(), samples_ptr);
    assert_eq!(second.samples, out);
    assert_abs_diff_eq!(second.times[0], 0.032, epsilon = 1e-12);
}

#[test]
fn interleaved_output_copies_mono_to_each_channel() {
    let mut rig = rig(17_600, "sine");
    rig.registry.note_on(69);
    let mut data = vec![0.0f32; 64 * 2];
    let mut scratch = Vec::new();
    rig.renderer.render_interleaved(&mut data, 2, &mut scratch);

    assert_eq!(scratch.len(), 64);
    for (frame, mono) in data.chunks(2).zip(&scratch) {
        assert_eq!(frame, &[*mono, *mono]);
    }
    assert_eq!(rig.renderer.frames_elapsed(), 64);
}
