use serde::Serialize;

/// progress of a named task, from 0.0 to 1.0. the whole import reports under
/// the name [`IMPORT_PROGRESS_NAME`], each phase under its own name.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub name: String,
    pub progress: f64,
}

pub const IMPORT_PROGRESS_NAME: &str = "import";

pub trait ProgressSink {
    fn notify(&self, event: ProgressEvent);
}
