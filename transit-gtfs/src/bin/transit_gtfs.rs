use clap::Parser;
use transit_gtfs::app::{AppError, GtfsApp};

fn main() -> Result<(), AppError> {
    env_logger::init();
    let args = GtfsApp::parse();
    args.op.run()
}
