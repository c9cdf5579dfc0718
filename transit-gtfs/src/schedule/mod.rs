mod schedule_generator;
mod schedule_importer;
mod trip_departures;

pub use schedule_generator::ScheduleGenerator;
pub use schedule_importer::ScheduleImporter;
pub use trip_departures::{departure_times, schedule_trips};
