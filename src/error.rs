//! Error types for the synth core and its device collaborators.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Audio generator '{0}' not found")]
    GeneratorNotFound(String),

    #[error("No MIDI input device selected")]
    NoInputDevice,

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("MIDI device error: {0}")]
    MidiDevice(String),

    #[error("MIDI port error: {0}")]
    MidiPort(String),

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used by callers to decide between reporting and tearing down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad request from the control layer; nothing was changed.
    Configuration,
    /// An input or output device failed; the owning loop has stopped.
    Device,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::GeneratorNotFound(_)
            | Error::NoInputDevice
            | Error::InvalidConfig(_)
            | Error::ConfigParse(_) => ErrorKind::Configuration,
            Error::MidiDevice(_) | Error::MidiPort(_) | Error::AudioDevice(_) | Error::Io(_) => {
                ErrorKind::Device
            }
        }
    }
}

#[cfg(feature = "native")]
impl From<midir::InitError> for Error {
    fn from(e: midir::InitError) -> Self {
        Error::MidiDevice(e.to_string())
    }
}

#[cfg(feature = "native")]
impl From<midir::PortInfoError> for Error {
    fn from(e: midir::PortInfoError) -> Self {
        Error::MidiPort(e.to_string())
    }
}

#[cfg(feature = "native")]
impl From<midir::ConnectError<midir::MidiInput>> for Error {
    fn from(e: midir::ConnectError<midir::MidiInput>) -> Self {
        Error::MidiPort(e.to_string())
    }
}

#[cfg(feature = "native")]
impl From<cpal::DevicesError> for Error {
    fn from(e: cpal::DevicesError) -> Self {
        Error::AudioDevice(e.to_string())
    }
}

#[cfg(feature = "native")]
impl From<cpal::DefaultStreamConfigError> for Error {
    fn from(e: cpal::DefaultStreamConfigError) -> Self {
        Error::AudioDevice(e.to_string())
    }
}

#[cfg(feature = "native")]
impl From<cpal::BuildStreamError> for Error {
    fn from(e: cpal::BuildStreamError) -> Self {
        Error::AudioDevice(e.to_string())
    }
}

#[cfg(feature = "native")]
impl From<cpal::PlayStreamError> for Error {
    fn from(e: cpal::PlayStreamError) -> Self {
        Error::AudioDevice(e.to_string())
    }
}

#[cfg(feature = "native")]
impl From<cpal::PauseStreamError> for Error {
    fn from(e: cpal::PauseStreamError) -> Self {
        Error::AudioDevice(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
