mod node_index;
mod stop_aggregator;
mod walking_router;

pub use node_index::NodeIndex;
pub use stop_aggregator::{aggregate_stops, StopAggregation, StopAggregationOptions};
pub use walking_router::{BirdDistanceRouter, WalkingRouter};
