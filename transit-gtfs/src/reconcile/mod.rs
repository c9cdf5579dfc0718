//! reconcilers decide what happens to each selected candidate against the
//! network and persist the outcome.
mod agency_reconciler;
mod id_ops;
mod line_reconciler;
mod service_reconciler;
mod settle;

pub use agency_reconciler::import_agencies;
pub use id_ops::unique_id;
pub use line_reconciler::import_lines;
pub use service_reconciler::import_services;
pub use settle::{settle_saves, PlannedSave, Reconciled};
