mod app_error;
mod bar_progress;
mod gtfs_app;
mod import_feed;
mod prepare_feed;

pub use app_error::AppError;
pub use bar_progress::BarProgress;
pub use gtfs_app::{GtfsApp, GtfsOperation};
pub use import_feed::{parameters_from_source, read_parameters};
pub use prepare_feed::prepare_candidates;
