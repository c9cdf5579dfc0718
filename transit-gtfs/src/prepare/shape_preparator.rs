use std::collections::{HashMap, HashSet};

use geo::Coord;
use serde::Serialize;

use super::field_ops::{parse_field, parse_required, required_field, RowRef};
use crate::feed::{FeedError, FeedFile, FeedRow, RowSource};
use crate::import::ImportWarning;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedShapePoint {
    pub shape_id: String,
    pub coord: Coord<f64>,
    pub sequence: u32,
    /// in the feed's own unit
    pub dist_traveled: Option<f64>,
}

/// prepares the points of the given shapes, grouped by shape id and sorted by
/// sequence. shapes.txt is optional.
pub fn prepare_shapes(
    source: &dyn RowSource,
    shape_ids: &HashSet<String>,
) -> Result<(HashMap<String, Vec<FeedShapePoint>>, Vec<ImportWarning>), FeedError> {
    let mut warnings = vec![];
    let mut shapes: HashMap<String, Vec<FeedShapePoint>> = HashMap::new();
    source.read_rows(FeedFile::Shapes, &mut |row, row_number| {
        let at = RowRef::new(FeedFile::Shapes, row_number);
        match parse_shape_row(&row, &at) {
            Ok(point) if shape_ids.contains(&point.shape_id) => {
                shapes.entry(point.shape_id.clone()).or_default().push(point)
            }
            Ok(_) => {}
            Err(warning) => {
                log::warn!("{warning}");
                warnings.push(warning);
            }
        }
    })?;
    for points in shapes.values_mut() {
        points.sort_by_key(|p| p.sequence);
    }
    log::debug!("prepared {} shapes", shapes.len());
    Ok((shapes, warnings))
}

fn parse_shape_row(row: &FeedRow, at: &RowRef) -> Result<FeedShapePoint, ImportWarning> {
    let shape_id = required_field(row, at, "shape_id")?.to_string();
    let lat = parse_required::<f64>(row, at, "shape_pt_lat")?;
    let lon = parse_required::<f64>(row, at, "shape_pt_lon")?;
    let sequence = parse_required::<i64>(row, at, "shape_pt_sequence")?;
    let sequence =
        u32::try_from(sequence).map_err(|_| at.invalid("shape_pt_sequence", &sequence.to_string()))?;
    let dist_traveled = parse_field::<f64>(row, at, "shape_dist_traveled")?;
    if let Some(dist) = dist_traveled.filter(|d| *d < 0.0) {
        return Err(at.invalid("shape_dist_traveled", &dist.to_string()));
    }
    Ok(FeedShapePoint {
        shape_id,
        coord: Coord { x: lon, y: lat },
        sequence,
        dist_traveled,
    })
}
