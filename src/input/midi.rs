use super::listener::MidiSource;
use super::message::RawMidi;
use crate::error::{Error, Result};
use crossbeam_channel::{bounded, Receiver, TryRecvError, TrySendError};
use midir::{Ignore, MidiInput, MidiInputConnection};
use tracing::{info, warn};

const CLIENT_NAME: &str = "miditone input";
const QUEUE_CAPACITY: usize = 1024;

/// Names of the available MIDI input ports, in port index order.
pub fn input_port_names() -> Result<Vec<String>> {
    let midi_in = MidiInput::new(CLIENT_NAME)?;
    midi_in
        .ports()
        .iter()
        .map(|port| midi_in.port_name(port).map_err(Error::from))
        .collect()
}

/// A [`MidiSource`] backed by a midir connection.
///
/// midir delivers messages on its own callback thread; they are queued here
/// and handed to the listener when it polls.
pub struct MidirSource {
    /// Holds the connection to keep it alive
    connection: Option<MidiInputConnection<()>>,
    receiver: Receiver<RawMidi>,
    port_name: String,
}

impl MidirSource {
    pub fn open(port_index: usize) -> Result<Self> {
        let mut midi_in = MidiInput::new(CLIENT_NAME)?;
        midi_in.ignore(Ignore::All);

        let ports = midi_in.ports();
        let port = ports.get(port_index).ok_or_else(|| {
            Error::MidiPort(format!(
                "MIDI port {} not found ({} available)",
                port_index,
                ports.len()
            ))
        })?;
        let port_name = midi_in.port_name(port)?;

        let (sender, receiver) = bounded(QUEUE_CAPACITY);
        let connection = midi_in.connect(
            port,
            "miditone-read-input",
            move |_, message, _| {
                if message.len() >= 3 {
                    if let Err(TrySendError::Full(_)) =
                        sender.try_send((message[0], message[1], message[2]))
                    {
                        warn!("MIDI input queue full, dropping message");
                    }
                }
            },
            (),
        )?;

        info!("Opened MIDI port: {}", port_name);

        Ok(Self {
            connection: Some(connection),
            receiver,
            port_name,
        })
    }
}

impl MidiSource for MidirSource {
    fn name(&self) -> &str {
        &self.port_name
    }

    fn read(&mut self, out: &mut Vec<RawMidi>) -> Result<usize> {
        let start = out.len();
        loop {
            match self.receiver.try_recv() {
                Ok(raw) => out.push(raw),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    return Err(Error::MidiDevice(format!(
                        "MIDI port '{}' disconnected",
                        self.port_name
                    )))
                }
            }
        }
        Ok(out.len() - start)
    }

    fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            let _ = connection.close();
            info!("Closed MIDI port: {}", self.port_name);
        }
    }
}

impl Drop for MidirSource {
    fn drop(&mut self) {
        self.close();
    }
}
