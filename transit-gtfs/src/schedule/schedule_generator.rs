use crate::import::{ImportError, ImportWarning, InternalState};

/// last import phase: turns the imported trips and their paths into
/// schedules.
#[allow(async_fn_in_trait)]
pub trait ScheduleGenerator {
    async fn generate_schedules(
        &self,
        state: &InternalState,
    ) -> Result<Vec<ImportWarning>, ImportError>;
}
