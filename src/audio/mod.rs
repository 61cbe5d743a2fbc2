#[cfg(feature = "native")]
mod cpal_backend;
#[cfg(feature = "native")]
pub use self::cpal_backend::CpalBackend;

use crate::error::Result;

/// An output device that drives the renderer once per block while running.
pub trait AudioBackend {
    /// Opens the stream and starts periodic rendering. A no-op when already running.
    fn start(&mut self) -> Result<()>;
    /// Halts rendering and closes the stream. A no-op when stopped.
    fn stop(&mut self) -> Result<()>;
    fn is_running(&self) -> bool;
}
