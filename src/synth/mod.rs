pub mod core;
pub mod params;
pub mod pitch;
pub mod registry;
pub mod renderer;
pub mod scope;
pub mod waveform;

pub use self::core::Synth;
pub use self::params::{ParamsSnapshot, SynthParams};
pub use self::pitch::frequency_of;
pub use self::registry::{ActiveNoteSet, NoteRegistry};
pub use self::renderer::AudioRenderer;
pub use self::scope::{scope_channel, ScopeFrame, ScopeReceiver, ScopeSender};
pub use self::waveform::{GeneratorFn, GeneratorInput, WaveformCatalog};
