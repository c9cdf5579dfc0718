use std::sync::Mutex;

use kdam::{Bar, BarExt};

use super::AppError;
use crate::import::{ProgressEvent, ProgressSink, IMPORT_PROGRESS_NAME};

/// shows the overall import progress on the terminal. phase events are
/// logged.
pub struct BarProgress {
    bar: Mutex<Bar>,
}

impl BarProgress {
    pub fn new() -> Result<Self, AppError> {
        let bar = Bar::builder()
            .desc("gtfs import")
            .total(100)
            .build()
            .map_err(|e| AppError::Runtime(format!("failure building progress bar: {e}")))?;
        Ok(Self {
            bar: Mutex::new(bar),
        })
    }
}

impl ProgressSink for BarProgress {
    fn notify(&self, event: ProgressEvent) {
        if event.name != IMPORT_PROGRESS_NAME {
            log::debug!("{}: {:.0}%", event.name, event.progress * 100.0);
            return;
        }
        if let Ok(mut bar) = self.bar.lock() {
            let _ = bar.update_to((event.progress * 100.0).round() as usize);
        }
    }
}
