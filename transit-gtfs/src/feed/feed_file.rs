use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// the files of a GTFS feed read by the import. file names are fixed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedFile {
    Agency,
    Routes,
    Calendar,
    CalendarDates,
    Stops,
    Trips,
    Shapes,
    StopTimes,
    Frequencies,
}

impl FeedFile {
    pub fn file_name(&self) -> &'static str {
        match self {
            FeedFile::Agency => "agency.txt",
            FeedFile::Routes => "routes.txt",
            FeedFile::Calendar => "calendar.txt",
            FeedFile::CalendarDates => "calendar_dates.txt",
            FeedFile::Stops => "stops.txt",
            FeedFile::Trips => "trips.txt",
            FeedFile::Shapes => "shapes.txt",
            FeedFile::StopTimes => "stop_times.txt",
            FeedFile::Frequencies => "frequencies.txt",
        }
    }
}

impl Display for FeedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_name())
    }
}
