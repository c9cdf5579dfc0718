mod import_error;
mod import_parameters;
mod import_phase;
mod import_result;
mod import_warning;
mod internal_state;
mod orchestrator;
mod progress;

pub use import_error::ImportError;
pub use import_parameters::{
    ImportParameters, LayoverParameters, DEFAULT_AGENCY_COLOR, DEFAULT_LINE_COLOR,
    DEFAULT_NODE_COLOR,
};
pub use import_phase::ImportPhase;
pub use import_result::ImportResult;
pub use import_warning::ImportWarning;
pub use internal_state::InternalState;
pub use orchestrator::ImportOrchestrator;
pub use progress::{ProgressEvent, ProgressSink, IMPORT_PROGRESS_NAME};
