use miditone::error::{Error, ErrorKind, Result};
use miditone::input::{ListenerState, MidiListener, MidiMessage, MidiSource, RawMidi};
use miditone::synth::{NoteRegistry, SynthParams};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Replays canned batches, then reports nothing pending forever.
struct ScriptedSource {
    batches: VecDeque<Result<Vec<RawMidi>>>,
    closed: Arc<AtomicBool>,
}

impl ScriptedSource {
    fn new(batches: Vec<Result<Vec<RawMidi>>>) -> (Box<dyn MidiSource>, Arc<AtomicBool>) {
        let closed = Arc::new(AtomicBool::new(false));
        let source = Self {
            batches: batches.into(),
            closed: closed.clone(),
        };
        (Box::new(source), closed)
    }
}

impl MidiSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn read(&mut self, out: &mut Vec<RawMidi>) -> Result<usize> {
        match self.batches.pop_front() {
            Some(Ok(batch)) => {
                out.extend_from_slice(&batch);
                Ok(batch.len())
            }
            Some(Err(e)) => Err(e),
            None => Ok(0),
        }
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    false
}

#[test]
fn note_on_and_off_semantics() {
    let registry = Arc::new(NoteRegistry::new());
    let listener = MidiListener::new(registry.clone());

    listener.handle(MidiMessage::note_on(60, 100));
    listener.handle(MidiMessage::note_on(64, 90));
    listener.handle(MidiMessage::note_on(67, 80));
    assert_eq!(registry.len(), 3);

    listener.handle(MidiMessage::note_off(60));
    listener.handle(MidiMessage::note_on(64, 0));
    let held: Vec<u8> = registry.snapshot().keys().copied().collect();
    assert_eq!(held, [67]);
}

#[test]
fn unrelated_statuses_are_ignored() {
    let registry = Arc::new(NoteRegistry::new());
    let listener = MidiListener::new(registry.clone());

    listener.handle((0xE0, 0x00, 0x40)); // pitch bend
    listener.handle((0xC0, 5, 0)); // program change
    listener.handle(MidiMessage::control_change(1, 99)); // no params attached
    listener.handle((0x90, 0xFF, 100)); // malformed data byte
    assert!(registry.is_empty());
}

#[test]
fn mod_wheel_control_change_updates_params() {
    let registry = Arc::new(NoteRegistry::new());
    let params = Arc::new(SynthParams::default());
    let listener = MidiListener::new(registry).with_mod_wheel(params.clone());

    listener.handle(MidiMessage::control_change(1, 99));
    assert_eq!(params.mod_wheel(), 99);

    listener.handle(MidiMessage::control_change(7, 12));
    assert_eq!(params.mod_wheel(), 99);
}

#[test]
fn run_without_source_returns_immediately() {
    let registry = Arc::new(NoteRegistry::new());
    registry.note_on(50);
    let listener = MidiListener::new(registry.clone());
    assert!(listener.run(None).is_ok());
    // nothing was started, so nothing was cleared
    assert!(registry.contains(50));
}

#[test]
fn device_error_terminates_the_loop_and_closes_the_source() {
    let registry = Arc::new(NoteRegistry::new());
    let (source, closed) = ScriptedSource::new(vec![
        Ok(vec![MidiMessage::note_on(60, 100), MidiMessage::note_on(62, 100)]),
        Err(Error::MidiDevice("unplugged".into())),
        Ok(vec![MidiMessage::note_on(64, 100)]),
    ]);

    let listener = MidiListener::new(registry.clone()).with_poll_interval(Duration::from_millis(1));
    let err = listener.run(Some(source)).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Device);
    assert!(closed.load(Ordering::SeqCst));
    // notes stay on after a device failure
    let held: Vec<u8> = registry.snapshot().keys().copied().collect();
    assert_eq!(held, [60, 62]);
}

#[test]
fn starting_clears_stuck_notes() {
    let registry = Arc::new(NoteRegistry::new());
    registry.note_on(40);
    registry.note_on(41);
    let (source, _) = ScriptedSource::new(vec![Err(Error::MidiDevice("gone".into()))]);
    let _ = MidiListener::new(registry.clone()).run(Some(source));
    assert!(registry.is_empty());
}

#[test]
fn spawned_listener_applies_events_and_stops_on_request() {
    let registry = Arc::new(NoteRegistry::new());
    let (source, closed) = ScriptedSource::new(vec![
        Ok(vec![MidiMessage::note_on(69, 100), MidiMessage::note_on(72, 100)]),
        Ok(vec![MidiMessage::note_off(72)]),
    ]);

    let mut handle = MidiListener::new(registry.clone())
        .with_poll_interval(Duration::from_millis(2))
        .spawn(Some(source))
        .expect("spawn listener");

    assert!(wait_until(|| registry.contains(69) && !registry.contains(72)));
    assert_eq!(handle.state(), ListenerState::Listening);

    handle.stop();
    let result = handle.join_timeout(Duration::from_secs(2));
    assert!(matches!(result, Some(Ok(()))));
    assert_eq!(handle.state(), ListenerState::Terminated);
    assert!(closed.load(Ordering::SeqCst));
}

#[test]
fn stop_is_honored_within_a_poll_interval() {
    let registry = Arc::new(NoteRegistry::new());
    let (source, _) = ScriptedSource::new(Vec::new());
    let handle = MidiListener::new(registry)
        .with_poll_interval(Duration::from_millis(10))
        .spawn(Some(source))
        .expect("spawn listener");

    thread::sleep(Duration::from_millis(30));
    let started = Instant::now();
    let result = handle.shutdown(Duration::from_secs(1));
    assert!(matches!(result, Some(Ok(()))));
    assert!(started.elapsed() < Duration::from_millis(500));
}

#[test]
fn join_timeout_gives_up_on_a_stalled_source() {
    struct Stalled;
    impl MidiSource for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }
        fn read(&mut self, _: &mut Vec<RawMidi>) -> Result<usize> {
            thread::sleep(Duration::from_millis(300));
            Ok(0)
        }
    }

    let handle = MidiListener::new(Arc::new(NoteRegistry::new()))
        .spawn(Some(Box::new(Stalled)))
        .expect("spawn listener");
    thread::sleep(Duration::from_millis(20));

    let started = Instant::now();
    assert!(handle.shutdown(Duration::from_millis(20)).is_none());
    assert!(started.elapsed() < Duration::from_millis(250));
}
