use std::path::Path;

use config::{Config, Environment, File};
use itertools::Itertools;
use transit_core::collection::{MemoryNetworkStore, NetworkSnapshot};

use super::{AppError, BarProgress};
use crate::aggregate::BirdDistanceRouter;
use crate::feed::CsvDirectorySource;
use crate::import::{ImportOrchestrator, ImportParameters};
use crate::schedule::ScheduleImporter;

/// import parameters from a TOML file, with environment overrides.
pub fn read_parameters(config_file: &Path) -> Result<ImportParameters, AppError> {
    parameters_from_source(File::from(config_file), &config_file.to_string_lossy())
}

/// import parameters from any configuration source, with environment
/// overrides such as `TRANSIT_GTFS__WALKING_SPEED_KPH=4.5`.
pub fn parameters_from_source<T>(source: T, source_name: &str) -> Result<ImportParameters, AppError>
where
    T: config::Source + Send + Sync + 'static,
{
    let configuration_error = |e: config::ConfigError| AppError::Configuration {
        source_name: source_name.to_string(),
        message: e.to_string(),
    };
    Config::builder()
        .add_source(source)
        .add_source(
            Environment::with_prefix("TRANSIT_GTFS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(configuration_error)?
        .try_deserialize::<ImportParameters>()
        .map_err(configuration_error)
}

pub fn run(
    feed_directory: &Path,
    config_file: &Path,
    network_file: Option<&Path>,
    output_file: Option<&Path>,
) -> Result<(), AppError> {
    let parameters = read_parameters(config_file)?;
    let snapshot = match network_file {
        Some(path) => NetworkSnapshot::read_json(path)?,
        None => NetworkSnapshot::default(),
    };
    log::info!(
        "importing feed '{}' into a network of {} nodes, {} lines",
        feed_directory.to_string_lossy(),
        snapshot.nodes.len(),
        snapshot.lines.len()
    );
    let store = MemoryNetworkStore::from_snapshot(snapshot);
    let source = CsvDirectorySource::new(feed_directory.to_path_buf());
    let router = BirdDistanceRouter::new(parameters.walking_speed_kph);
    let schedules = ScheduleImporter::new(&store);
    let progress = BarProgress::new()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::Runtime(format!("failure creating async runtime: {e}")))?;

    let orchestrator = ImportOrchestrator::new(&store, &source, &router, &schedules, parameters)
        .with_progress(&progress);
    let result = runtime.block_on(orchestrator.run());
    eprintln!();

    let summary = serde_json::to_string_pretty(&result.to_json())
        .map_err(|e| AppError::Output(e.to_string()))?;
    println!("{summary}");
    match snapshot_target(network_file, output_file, result.is_success()) {
        Some(output) => {
            store.to_snapshot().write_json(output)?;
            log::info!("network written to '{}'", output.to_string_lossy());
        }
        None if network_file.is_some() => {
            log::warn!("import failed, network file left unchanged")
        }
        None => {}
    }
    if result.is_success() {
        Ok(())
    } else {
        Err(AppError::ImportFailed(
            result.errors().iter().map(|e| e.to_string()).join("; "),
        ))
    }
}

/// where the resulting network goes. the network file is only overwritten
/// by a successful import; an explicit output file is always written.
fn snapshot_target<'a>(
    network_file: Option<&'a Path>,
    output_file: Option<&'a Path>,
    success: bool,
) -> Option<&'a Path> {
    output_file.or(network_file.filter(|_| success))
}
