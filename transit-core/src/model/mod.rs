mod agency;
mod line;
mod network_entity;
mod node;
mod path;
mod schedule;
mod service;

pub use agency::{Agency, GtfsAgencyData};
pub use line::{GtfsRouteData, Line, LineMode};
pub use network_entity::NetworkEntity;
pub use node::{Node, NodeStop};
pub use path::{Path, PathData, PathDirection, PathSegment};
pub use schedule::{Period, PeriodGroup, Schedule, SchedulePeriod, ScheduleTrip};
pub use service::Service;
