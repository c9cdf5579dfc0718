use geo::{Closest, ClosestPoint, Coord, Line, Point};
use transit_core::util::geo_utils;

/// where a point falls on a shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    /// meters from the shape start to the nearest shape point
    pub distance_along: f64,
    /// meters from the point to the shape
    pub offset: f64,
}

/// a shape polyline with the distance in meters to each of its coordinates.
///
/// # Invariants
///
/// no two consecutive coordinates are equal, and there are at least two.
#[derive(Clone, Debug)]
pub struct ShapeLine {
    coords: Vec<Coord<f64>>,
    cumulative: Vec<f64>,
}

impl ShapeLine {
    /// None when fewer than two distinct coordinates remain once consecutive
    /// duplicates are removed.
    pub fn new(coords: impl IntoIterator<Item = Coord<f64>>) -> Option<ShapeLine> {
        let mut cleaned: Vec<Coord<f64>> = vec![];
        for coord in coords.into_iter() {
            if cleaned.last() != Some(&coord) {
                cleaned.push(coord);
            }
        }
        if cleaned.len() < 2 {
            return None;
        }
        let mut cumulative = Vec::with_capacity(cleaned.len());
        cumulative.push(0.0);
        for pair in cleaned.windows(2) {
            let last = cumulative.last().copied().unwrap_or_default();
            cumulative.push(last + geo_utils::coord_distance_meters(&pair[0], &pair[1]));
        }
        Some(ShapeLine {
            coords: cleaned,
            cumulative,
        })
    }

    pub fn coords(&self) -> &[Coord<f64>] {
        &self.coords
    }

    pub fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or_default()
    }

    pub fn segment_count(&self) -> usize {
        self.coords.len() - 1
    }

    pub fn project_on_segment(&self, segment: usize, point: &Point<f64>) -> Projection {
        let start = self.coords[segment];
        let end = self.coords[segment + 1];
        let closest = match Line::new(start, end).closest_point(point) {
            Closest::Intersection(p) | Closest::SinglePoint(p) => p,
            Closest::Indeterminate => Point::from(start),
        };
        let distance_along = (self.cumulative[segment]
            + geo_utils::haversine_meters(&Point::from(start), &closest))
        .min(self.cumulative[segment + 1]);
        Projection {
            distance_along,
            offset: geo_utils::haversine_meters(point, &closest),
        }
    }

    /// nearest projection over the whole shape. the first one wins a tie.
    pub fn project(&self, point: &Point<f64>) -> Projection {
        (0..self.segment_count())
            .map(|segment| self.project_on_segment(segment, point))
            .fold(None, |nearest: Option<Projection>, p| match nearest {
                Some(n) if n.offset <= p.offset => Some(n),
                _ => Some(p),
            })
            .unwrap_or(Projection {
                distance_along: 0.0,
                offset: f64::INFINITY,
            })
    }

    /// coordinate at `distance` meters from the start, clamped to the shape.
    pub fn point_at(&self, distance: f64) -> Coord<f64> {
        let distance = distance.clamp(0.0, self.length());
        let segment = self
            .cumulative
            .partition_point(|d| *d <= distance)
            .saturating_sub(1)
            .min(self.segment_count() - 1);
        let start = self.coords[segment];
        let end = self.coords[segment + 1];
        let span = self.cumulative[segment + 1] - self.cumulative[segment];
        if span <= 0.0 {
            return start;
        }
        let fraction = (distance - self.cumulative[segment]) / span;
        if fraction >= 1.0 {
            return end;
        }
        Coord {
            x: start.x + (end.x - start.x) * fraction,
            y: start.y + (end.y - start.y) * fraction,
        }
    }

    /// the part of the shape between two distances, ends included.
    pub fn slice(&self, from: f64, to: f64) -> Vec<Coord<f64>> {
        let mut sliced = vec![self.point_at(from)];
        let inner = self
            .coords
            .iter()
            .zip(self.cumulative.iter())
            .filter(|(_, d)| **d > from && **d < to)
            .map(|(c, _)| *c);
        for coord in inner.chain(std::iter::once(self.point_at(to))) {
            if sliced.last() != Some(&coord) {
                sliced.push(coord);
            }
        }
        sliced
    }
}

#[cfg(test)]
mod test {
    use geo::{Coord, Point};

    use super::ShapeLine;

    fn shape() -> ShapeLine {
        // three 111m steps north
        ShapeLine::new(vec![
            Coord { x: -73.6, y: 45.5 },
            Coord { x: -73.6, y: 45.5 },
            Coord { x: -73.6, y: 45.501 },
            Coord { x: -73.6, y: 45.502 },
            Coord { x: -73.6, y: 45.503 },
        ])
        .unwrap()
    }

    #[test]
    fn test_duplicates_removed() {
        let line = shape();
        assert_eq!(line.coords().len(), 4);
        assert!((line.length() - 333.6).abs() < 1.0);
        assert!(ShapeLine::new(vec![Coord { x: 1.0, y: 1.0 }, Coord { x: 1.0, y: 1.0 }]).is_none());
    }

    #[test]
    fn test_project() {
        let line = shape();
        let projection = line.project(&Point::new(-73.5999, 45.5015));
        assert!((projection.distance_along - 166.8).abs() < 1.0);
        assert!((projection.offset - 7.8).abs() < 0.5);
    }

    #[test]
    fn test_slice() {
        let line = shape();
        let sliced = line.slice(50.0, 250.0);
        assert_eq!(sliced.len(), 4);
        assert_eq!(sliced[1], Coord { x: -73.6, y: 45.501 });
        assert_eq!(sliced[2], Coord { x: -73.6, y: 45.502 });
        let whole = line.slice(0.0, line.length());
        assert_eq!(whole, line.coords().to_vec());
    }
}
