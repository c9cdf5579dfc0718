use std::collections::{BTreeMap, HashMap, HashSet};

use transit_core::collection::{EntityStore, NetworkCollection};
use transit_core::model::{Path, PathDirection};

use super::{geometry_snapper, TripNodes};
use crate::import::{ImportError, ImportWarning, InternalState, LayoverParameters};
use crate::prepare::FeedTrip;

#[derive(Clone, Debug, Default)]
pub struct PathGenerationOptions {
    pub layover: LayoverParameters,
}

#[derive(Debug, Default)]
pub struct PathGeneration {
    pub path_id_by_trip_id: HashMap<String, String>,
    pub new_paths: Vec<Path>,
    pub warnings: Vec<ImportWarning>,
}

/// the trips to import grouped by network line, in line id order. trips keep
/// their feed order within a line.
pub fn trips_by_line_id(state: &InternalState) -> BTreeMap<String, Vec<FeedTrip>> {
    let mut grouped: BTreeMap<String, Vec<FeedTrip>> = BTreeMap::new();
    for trip in state.trips_to_import.iter() {
        if let Some(line_id) = state.line_id_by_route_id.get(&trip.route_id) {
            grouped.entry(line_id.clone()).or_default().push(trip.clone());
        }
    }
    grouped
}

/// finds or creates the path of every trip, one line at a time. a trip reuses
/// a path of its line with the same feed shape and node sequence; otherwise a
/// new path is built from the shape, or from the stop locations for trips
/// without a shape. a line that fails is left out with a warning.
///
/// new paths are inserted in a single bulk call. trip to path assignments are
/// recorded in the state.
///
/// # Returns
///
/// an error only if the new paths could not be inserted.
pub async fn generate_paths<S: EntityStore<Path>>(
    store: &S,
    trips_by_line_id: &BTreeMap<String, Vec<FeedTrip>>,
    existing: &NetworkCollection<Path>,
    state: &mut InternalState,
    options: &PathGenerationOptions,
) -> Result<PathGeneration, ImportError> {
    let mut result = PathGeneration::default();
    for (line_id, trips) in trips_by_line_id.iter() {
        match generate_line_paths(line_id, trips, existing, state, options) {
            Ok(line_paths) => {
                log::debug!(
                    "line '{line_id}': {} trips, {} new paths",
                    line_paths.assignments.len(),
                    line_paths.new_paths.len()
                );
                result.path_id_by_trip_id.extend(line_paths.assignments);
                result.new_paths.extend(line_paths.new_paths);
                result.warnings.extend(line_paths.warnings);
            }
            Err(message) => {
                let warning = ImportWarning::LinePathsFailed {
                    line_id: line_id.clone(),
                    message,
                };
                log::warn!("{warning}");
                result.warnings.push(warning);
            }
        }
    }
    if !result.new_paths.is_empty() {
        store.insert_many(&result.new_paths).await?;
    }
    log::info!(
        "{} trips assigned to paths, {} new paths",
        result.path_id_by_trip_id.len(),
        result.new_paths.len()
    );
    state.path_id_by_trip_id.extend(
        result
            .path_id_by_trip_id
            .iter()
            .map(|(trip_id, path_id)| (trip_id.clone(), path_id.clone())),
    );
    Ok(result)
}

struct LinePaths {
    assignments: Vec<(String, String)>,
    new_paths: Vec<Path>,
    warnings: Vec<ImportWarning>,
}

struct PooledPath {
    path_id: String,
    nodes: Vec<String>,
    consistent: bool,
    /// position in the new paths of the line, None for existing paths
    new_index: Option<usize>,
}

fn generate_line_paths(
    line_id: &str,
    trips: &[FeedTrip],
    existing: &NetworkCollection<Path>,
    state: &InternalState,
    options: &PathGenerationOptions,
) -> Result<LinePaths, String> {
    let mut pools: HashMap<Option<String>, Vec<PooledPath>> = HashMap::new();
    for path in existing.features().filter(|p| p.line_id == line_id) {
        pools
            .entry(path.data.gtfs_shape_id.clone())
            .or_default()
            .push(PooledPath {
                path_id: path.id.clone(),
                nodes: path.nodes.clone(),
                consistent: path.has_consistent_segments(),
                new_index: None,
            });
    }
    let mut result = LinePaths {
        assignments: vec![],
        new_paths: vec![],
        warnings: vec![],
    };
    let mut seen_trip_ids: HashSet<&str> = HashSet::new();

    for trip in trips.iter() {
        if state.path_id_by_trip_id.contains_key(&trip.trip_id)
            || !seen_trip_ids.insert(trip.trip_id.as_str())
        {
            log::debug!("trip '{}' already has a path", trip.trip_id);
            continue;
        }
        let trip_nodes = match TripNodes::from_state(&trip.trip_id, state) {
            Ok(nodes) => nodes,
            Err(warning) => {
                log::warn!("{warning}");
                result.warnings.push(warning);
                continue;
            }
        };
        let shape = match &trip.shape_id {
            Some(shape_id) => match state.shapes_by_shape_id.get(shape_id) {
                Some(points) => Some((shape_id, points)),
                None => {
                    result.warnings.push(ImportWarning::UnknownShape {
                        trip_id: trip.trip_id.clone(),
                        shape_id: shape_id.clone(),
                    });
                    None
                }
            },
            None => {
                result.warnings.push(ImportWarning::TripWithoutShape {
                    trip_id: trip.trip_id.clone(),
                });
                None
            }
        };
        let pool = pools
            .entry(shape.map(|(shape_id, _)| shape_id.clone()))
            .or_default();

        if let Some(pooled) = pool.iter().find(|p| p.nodes == trip_nodes.node_ids) {
            if !pooled.consistent {
                return Err(format!(
                    "path '{}' has inconsistent segments",
                    pooled.path_id
                ));
            }
            if let Some(path) = pooled.new_index.and_then(|i| result.new_paths.get_mut(i)) {
                path.data.gtfs_trip_ids.push(trip.trip_id.clone());
            }
            result
                .assignments
                .push((trip.trip_id.clone(), pooled.path_id.clone()));
            continue;
        }

        let mut path = Path::new(
            uuid::Uuid::new_v4().to_string(),
            line_id.to_string(),
            PathDirection::from_direction_id(trip.direction_id),
            trip_nodes.node_ids.clone(),
        );
        path.name = trip.headsign.clone();
        path.data.from_gtfs = true;
        path.data.gtfs_trip_ids = vec![trip.trip_id.clone()];
        let warnings = match shape {
            Some((shape_id, points)) => {
                path.data.gtfs_shape_id = Some(shape_id.clone());
                geometry_snapper::from_shape(&mut path, points, &trip_nodes, &options.layover)
            }
            None => geometry_snapper::from_stop_times(&mut path, &trip_nodes, &options.layover),
        };
        result.warnings.extend(warnings);
        if !path.has_consistent_segments() {
            return Err(format!("path '{}' has inconsistent segments", path.id));
        }
        pool.push(PooledPath {
            path_id: path.id.clone(),
            nodes: path.nodes.clone(),
            consistent: true,
            new_index: Some(result.new_paths.len()),
        });
        result
            .assignments
            .push((trip.trip_id.clone(), path.id.clone()));
        result.new_paths.push(path);
    }
    Ok(result)
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use geo::{Coord, Point};
    use transit_core::collection::{MemoryNetworkStore, NetworkCollection};
    use transit_core::model::{Path, PathDirection};

    use super::{generate_paths, trips_by_line_id, PathGenerationOptions};
    use crate::import::{ImportWarning, InternalState};
    use crate::prepare::{FeedShapePoint, FeedStopTime, FeedTrip};

    fn trip(trip_id: &str, route_id: &str, shape_id: Option<&str>) -> FeedTrip {
        FeedTrip {
            trip_id: trip_id.to_string(),
            route_id: route_id.to_string(),
            service_id: String::from("WD"),
            shape_id: shape_id.map(String::from),
            direction_id: Some(1),
            headsign: Some(String::from("Downtown")),
            short_name: None,
            block_id: None,
        }
    }

    fn stop_times(trip_id: &str, start: u32) -> Vec<FeedStopTime> {
        ["A", "B", "C"]
            .iter()
            .enumerate()
            .map(|(i, stop_id)| FeedStopTime {
                trip_id: trip_id.to_string(),
                stop_id: stop_id.to_string(),
                stop_sequence: i as u32 + 1,
                arrival_time: Some(start + 180 * i as u32),
                departure_time: Some(start + 180 * i as u32),
                shape_dist_traveled: None,
                pickup_type: None,
                drop_off_type: None,
            })
            .collect()
    }

    fn state(trips: Vec<FeedTrip>) -> InternalState {
        let mut state = InternalState::default();
        for (stop_id, node_id, lat) in [("A", "n1", 45.5), ("B", "n2", 45.505), ("C", "n3", 45.51)] {
            state
                .node_id_by_stop_id
                .insert(stop_id.to_string(), node_id.to_string());
            state
                .stop_coordinates
                .insert(stop_id.to_string(), Point::new(-73.6, lat));
        }
        state
            .line_id_by_route_id
            .insert(String::from("R1"), String::from("line-1"));
        state.shapes_by_shape_id.insert(
            String::from("SH1"),
            (0..=10)
                .map(|i| FeedShapePoint {
                    shape_id: String::from("SH1"),
                    coord: Coord {
                        x: -73.6,
                        y: 45.5 + 0.001 * i as f64,
                    },
                    sequence: i,
                    dist_traveled: None,
                })
                .collect(),
        );
        for (i, trip) in trips.iter().enumerate() {
            state
                .stop_times_by_trip_id
                .insert(trip.trip_id.clone(), stop_times(&trip.trip_id, 3600 * (6 + i as u32)));
        }
        state.trips_to_import = trips;
        state
    }

    #[tokio::test]
    async fn test_trips_share_path() {
        let store = MemoryNetworkStore::default();
        let mut state = state(vec![
            trip("T1", "R1", Some("SH1")),
            trip("T2", "R1", Some("SH1")),
            trip("T2", "R1", Some("SH1")),
        ]);
        let grouped = trips_by_line_id(&state);
        let result = generate_paths(
            &store,
            &grouped,
            &NetworkCollection::default(),
            &mut state,
            &PathGenerationOptions::default(),
        )
        .await
        .unwrap();
        assert!(result.warnings.is_empty());
        assert_eq!(result.new_paths.len(), 1);
        assert_eq!(store.paths.bulk_insert_count(), 1);
        assert_eq!(state.path_id_by_trip_id["T1"], state.path_id_by_trip_id["T2"]);
        let path = store.paths.get(&state.path_id_by_trip_id["T1"]).unwrap();
        assert_eq!(path.line_id, "line-1");
        assert_eq!(path.direction, PathDirection::Inbound);
        assert_eq!(path.name.as_deref(), Some("Downtown"));
        assert_eq!(path.data.gtfs_shape_id.as_deref(), Some("SH1"));
        assert_eq!(path.data.gtfs_trip_ids, vec!["T1", "T2"]);
        assert!(path.geography.is_some());
    }

    #[tokio::test]
    async fn test_shapeless_trips_use_their_own_pool() {
        let store = MemoryNetworkStore::default();
        let mut state = state(vec![
            trip("T1", "R1", Some("SH1")),
            trip("T2", "R1", None),
            trip("T3", "R1", Some("MISSING")),
        ]);
        let grouped = trips_by_line_id(&state);
        let result = generate_paths(
            &store,
            &grouped,
            &NetworkCollection::default(),
            &mut state,
            &PathGenerationOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(result.new_paths.len(), 2);
        assert_eq!(result.warnings.len(), 2);
        assert!(matches!(result.warnings[0], ImportWarning::TripWithoutShape { .. }));
        assert!(matches!(result.warnings[1], ImportWarning::UnknownShape { .. }));
        assert_ne!(state.path_id_by_trip_id["T1"], state.path_id_by_trip_id["T2"]);
        assert_eq!(state.path_id_by_trip_id["T2"], state.path_id_by_trip_id["T3"]);
    }

    #[tokio::test]
    async fn test_existing_path_is_reused() {
        let mut existing_path = Path::new(
            String::from("p-existing"),
            String::from("line-1"),
            PathDirection::Inbound,
            vec![String::from("n1"), String::from("n2"), String::from("n3")],
        );
        existing_path.segments = vec![Default::default(), Default::default()];
        existing_path.dwell_times_seconds = vec![0, 0, 0];
        existing_path.data.gtfs_shape_id = Some(String::from("SH1"));
        let store = MemoryNetworkStore::default();
        let mut state = state(vec![trip("T1", "R1", Some("SH1"))]);
        let grouped = trips_by_line_id(&state);
        let existing = NetworkCollection::new(vec![existing_path]);
        let result = generate_paths(
            &store,
            &grouped,
            &existing,
            &mut state,
            &PathGenerationOptions::default(),
        )
        .await
        .unwrap();
        assert!(result.new_paths.is_empty());
        assert_eq!(store.paths.bulk_insert_count(), 0);
        assert_eq!(state.path_id_by_trip_id["T1"], "p-existing");
    }

    #[tokio::test]
    async fn test_failing_line_is_left_out() {
        // existing path of line-2 without segments
        let broken = Path::new(
            String::from("p-broken"),
            String::from("line-2"),
            PathDirection::Outbound,
            vec![String::from("n1"), String::from("n2"), String::from("n3")],
        );
        let store = MemoryNetworkStore::default();
        let mut state = state(vec![trip("T1", "R1", None), trip("T2", "R2", None)]);
        state
            .line_id_by_route_id
            .insert(String::from("R2"), String::from("line-2"));
        let grouped: BTreeMap<_, _> = trips_by_line_id(&state);
        let result = generate_paths(
            &store,
            &grouped,
            &NetworkCollection::new(vec![broken]),
            &mut state,
            &PathGenerationOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(result.new_paths.len(), 1);
        assert!(result
            .warnings
            .iter()
            .any(|w| matches!(w, ImportWarning::LinePathsFailed { line_id, .. } if line_id == "line-2")));
        assert!(state.path_id_by_trip_id.contains_key("T1"));
        assert!(!state.path_id_by_trip_id.contains_key("T2"));
    }
}
