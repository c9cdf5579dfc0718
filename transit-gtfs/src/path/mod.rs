//! paths of the imported trips: node sequences of the trips, their geography
//! placed on the feed shapes, and the timing metrics used by the schedules.
pub mod geometry_snapper;
mod path_metrics;
mod path_reconciler;
mod shape_line;
mod trip_nodes;

pub use path_metrics::{apply_timing, layover_seconds};
pub use path_reconciler::{
    generate_paths, trips_by_line_id, PathGeneration, PathGenerationOptions,
};
pub use shape_line::{Projection, ShapeLine};
pub use trip_nodes::TripNodes;
