//! Outbound channel from the renderer to a waveform display.
//!
//! The channel is bounded. When the display falls behind, the oldest pending
//! frame is discarded so the audio thread never waits on the consumer.
//! Frames handed back through [`ScopeReceiver::recycle`] (and evicted ones)
//! are reused by the producer, so a steady display loop stops allocating.

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};

/// One rendered block: absolute sample times and the samples sent to the device.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeFrame {
    pub times: Vec<f64>,
    pub samples: Vec<f32>,
}

impl ScopeFrame {
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}

/// Producer half, owned by the renderer.
#[derive(Debug, Clone)]
pub struct ScopeSender {
    tx: Sender<ScopeFrame>,
    // used only to evict the oldest frame when full
    evict: Receiver<ScopeFrame>,
    spare_tx: Sender<ScopeFrame>,
    spare_rx: Receiver<ScopeFrame>,
}

/// Consumer half, owned by the display.
#[derive(Debug, Clone)]
pub struct ScopeReceiver {
    rx: Receiver<ScopeFrame>,
    spare: Sender<ScopeFrame>,
}

pub fn scope_channel(capacity: usize) -> (ScopeSender, ScopeReceiver) {
    let capacity = capacity.max(1);
    let (tx, rx) = bounded(capacity);
    let (spare_tx, spare_rx) = bounded(capacity);
    (
        ScopeSender {
            tx,
            evict: rx.clone(),
            spare_tx: spare_tx.clone(),
            spare_rx,
        },
        ScopeReceiver {
            rx,
            spare: spare_tx,
        },
    )
}

impl ScopeSender {
    /// An empty frame, reusing recycled storage when any is available.
    pub fn frame(&self) -> ScopeFrame {
        match self.spare_rx.try_recv() {
            Ok(mut frame) => {
                frame.times.clear();
                frame.samples.clear();
                frame
            }
            Err(_) => ScopeFrame {
                times: Vec::new(),
                samples: Vec::new(),
            },
        }
    }

    /// Publishes `frame` without blocking. Returns `false` if it was dropped.
    pub fn publish(&self, frame: ScopeFrame) -> bool {
        let mut frame = frame;
        // a concurrent consumer can refill the gap, so retry a bounded number of times
        for _ in 0..2 {
            match self.tx.try_send(frame) {
                Ok(()) => return true,
                Err(TrySendError::Full(rejected)) => {
                    if let Ok(stale) = self.evict.try_recv() {
                        let _ = self.spare_tx.try_send(stale);
                    }
                    frame = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
        false
    }
}

impl ScopeReceiver {
    pub fn try_recv(&self) -> Option<ScopeFrame> {
        match self.rx.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Drains everything pending and returns the newest frame. Older frames are recycled.
    pub fn latest(&self) -> Option<ScopeFrame> {
        let mut latest = None;
        for frame in self.rx.try_iter() {
            if let Some(stale) = latest.replace(frame) {
                self.recycle(stale);
            }
        }
        latest
    }

    /// Returns a consumed frame's storage to the producer. Dropped if the pool is full.
    pub fn recycle(&self, frame: ScopeFrame) {
        let _ = self.spare.try_send(frame);
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
