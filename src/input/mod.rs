#[cfg(feature = "native")]
mod keyboard;
pub mod listener;
pub mod message;
#[cfg(feature = "native")]
mod midi;

#[cfg(feature = "native")]
pub use self::keyboard::KeyboardSource;
pub use self::listener::{ListenerHandle, ListenerState, MidiListener, MidiSource};
pub use self::message::{MidiMessage, RawMidi};
#[cfg(feature = "native")]
pub use self::midi::{input_port_names, MidirSource};
