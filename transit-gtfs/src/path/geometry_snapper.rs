use geo::{Coord, LineString};
use transit_core::model::{Path, PathSegment};
use transit_core::util::geo_utils;

use super::path_metrics::apply_timing;
use super::{ShapeLine, TripNodes};
use crate::import::{ImportWarning, LayoverParameters};
use crate::prepare::FeedShapePoint;

/// farthest a stop may be from the shape to be placed on it.
pub const MAX_STOP_SHAPE_DISTANCE_METERS: f64 = 150.0;

/// builds the path geography by placing the trip stops on the feed shape,
/// then sets its timing. when the stops cannot be placed, the path keeps its
/// timing with no geography and no segment distances.
///
/// stops are placed with the first strategy that works:
///   1. the shape_dist_traveled of both the stop times and the shape points
///   2. the nearest point of the whole shape, for every stop
///   3. a scan of the shape segments from the previous stop
pub fn from_shape(
    path: &mut Path,
    shape_points: &[FeedShapePoint],
    trip: &TripNodes,
    layover: &LayoverParameters,
) -> Vec<ImportWarning> {
    let mut warnings = vec![];
    let placed = match ShapeLine::new(shape_points.iter().map(|p| p.coord)) {
        None => Err(String::from("shape has fewer than two distinct points")),
        Some(shape) => feed_distances(&shape, shape_points, trip)
            .or_else(|| whole_shape_projection(&shape, trip))
            .map(Ok)
            .unwrap_or_else(|| segment_scan_projection(&shape, trip))
            .map(|distances| stitch_shape(&shape, &distances)),
    };
    match placed {
        Ok((coords, segments)) => {
            path.geography = Some(LineString::new(coords));
            path.segments = segments;
            path.data.geography_error = None;
        }
        Err(message) => warnings.push(geography_failure(path, trip, message)),
    }
    apply_timing(path, trip, layover);
    warnings
}

/// builds the path geography with straight lines between the trip stops, then
/// sets its timing.
pub fn from_stop_times(
    path: &mut Path,
    trip: &TripNodes,
    layover: &LayoverParameters,
) -> Vec<ImportWarning> {
    let mut warnings = vec![];
    let mut coords: Vec<Coord<f64>> = vec![];
    let mut segments = vec![];
    for (idx, point) in trip.coordinates.iter().enumerate() {
        let coord = Coord::from(*point);
        if coords.last() != Some(&coord) {
            coords.push(coord);
        }
        if idx + 1 < trip.coordinates.len() {
            segments.push(PathSegment {
                start_coordinate_index: Some(coords.len() - 1),
                travel_time_seconds: None,
                distance_meters: Some(geo_utils::haversine_meters(
                    point,
                    &trip.coordinates[idx + 1],
                )),
            });
        }
    }
    if coords.len() < 2 {
        warnings.push(geography_failure(
            path,
            trip,
            String::from("all stops are at the same location"),
        ));
    } else {
        path.geography = Some(LineString::new(coords));
        path.segments = segments;
        path.data.geography_error = None;
    }
    apply_timing(path, trip, layover);
    warnings
}

fn geography_failure(path: &mut Path, trip: &TripNodes, message: String) -> ImportWarning {
    log::warn!("path '{}' has no geography: {message}", path.id);
    path.geography = None;
    path.segments = vec![PathSegment::default(); trip.node_ids.len().saturating_sub(1)];
    path.data.geography_error = Some(message.clone());
    ImportWarning::PathGeographyFailed {
        path_id: path.id.clone(),
        line_id: path.line_id.clone(),
        message,
    }
}

/// feed distances scaled to the shape length in meters. None unless every
/// stop time and shape point has one, and they increase along the trip.
fn feed_distances(
    shape: &ShapeLine,
    shape_points: &[FeedShapePoint],
    trip: &TripNodes,
) -> Option<Vec<f64>> {
    let stop_distances = trip
        .stop_times
        .iter()
        .map(|st| st.shape_dist_traveled)
        .collect::<Option<Vec<f64>>>()?;
    let shape_distances = shape_points
        .iter()
        .map(|p| p.dist_traveled)
        .collect::<Option<Vec<f64>>>()?;
    let first = *shape_distances.first()?;
    let span = *shape_distances.last()? - first;
    if span <= 0.0 {
        return None;
    }
    let to_meters = shape.length() / span;
    let distances = stop_distances
        .iter()
        .map(|d| ((d - first) * to_meters).clamp(0.0, shape.length()))
        .collect::<Vec<_>>();
    if strictly_increasing(&distances) {
        Some(distances)
    } else {
        log::debug!("feed distances decrease along the trip, stops are projected instead");
        None
    }
}

/// terminals at both shape ends, every other stop at its nearest shape point.
fn whole_shape_projection(shape: &ShapeLine, trip: &TripNodes) -> Option<Vec<f64>> {
    let stop_count = trip.coordinates.len();
    let mut distances = vec![0.0];
    for point in trip.coordinates[1..stop_count - 1].iter() {
        let projection = shape.project(point);
        if projection.offset > MAX_STOP_SHAPE_DISTANCE_METERS {
            return None;
        }
        distances.push(projection.distance_along);
    }
    distances.push(shape.length());
    strictly_increasing(&distances).then_some(distances)
}

/// terminals at both shape ends. every other stop is placed at the first
/// local minimum of its distance to the shape segments, scanning from the
/// segment of the previous stop. the stop must be close enough and come after
/// the previous stop.
fn segment_scan_projection(shape: &ShapeLine, trip: &TripNodes) -> Result<Vec<f64>, String> {
    let stop_count = trip.coordinates.len();
    let segment_count = shape.segment_count();
    let mut distances = vec![0.0];
    let mut from_segment = 0;
    for (idx, point) in trip.coordinates[1..stop_count - 1].iter().enumerate() {
        let stop_number = idx + 1;
        let mut placed = None;
        for segment in from_segment..segment_count {
            let projection = shape.project_on_segment(segment, point);
            if projection.offset > MAX_STOP_SHAPE_DISTANCE_METERS {
                continue;
            }
            let next_offset = match segment + 1 < segment_count {
                true => shape.project_on_segment(segment + 1, point).offset,
                false => f64::INFINITY,
            };
            if next_offset >= projection.offset {
                placed = Some((segment, projection.distance_along));
                break;
            }
        }
        let previous = distances.last().copied().unwrap_or_default();
        match placed {
            Some((segment, distance)) if distance > previous => {
                distances.push(distance);
                from_segment = segment;
            }
            Some(_) => {
                return Err(format!(
                    "stop {stop_number} is placed before the previous stop on the shape"
                ))
            }
            None => {
                return Err(format!(
                    "stop {stop_number} is more than {MAX_STOP_SHAPE_DISTANCE_METERS}m from the shape"
                ))
            }
        }
    }
    let previous = distances.last().copied().unwrap_or_default();
    if shape.length() <= previous {
        return Err(String::from("the last stop is placed before the previous stop"));
    }
    distances.push(shape.length());
    Ok(distances)
}

/// the shape cut at each stop distance. consecutive pieces share their
/// boundary coordinate.
fn stitch_shape(shape: &ShapeLine, distances: &[f64]) -> (Vec<Coord<f64>>, Vec<PathSegment>) {
    let mut coords: Vec<Coord<f64>> = vec![];
    let mut segments = vec![];
    for pair in distances.windows(2) {
        let piece = shape.slice(pair[0], pair[1]);
        let shared = coords.last() == piece.first();
        let start = if shared { coords.len() - 1 } else { coords.len() };
        coords.extend(piece.into_iter().skip(usize::from(shared)));
        segments.push(PathSegment {
            start_coordinate_index: Some(start),
            travel_time_seconds: None,
            distance_meters: Some(pair[1] - pair[0]),
        });
    }
    (coords, segments)
}

fn strictly_increasing(distances: &[f64]) -> bool {
    distances.windows(2).all(|w| w[0] < w[1])
}
