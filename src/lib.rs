pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod handlers;
pub mod js_templates;
pub mod output;
pub mod recorder;
pub mod timeouts;
pub mod utils;

pub use compiler::{Dialect, GeneratedScript, ScriptOptions, compile};
pub use config::{Config, OutputConfig, RecordingConfig};
pub use error::RecorderError;
pub use recorder::{Recorder, RecordingSession, SessionState, StepSequence};

pub type Result<T> = std::result::Result<T, RecorderError>;
