use geo::Point;
use rstar::primitives::GeomWithData;
use rstar::{RTree, AABB};
use transit_core::model::Node;
use transit_core::util::geo_utils;

type IndexedNode = GeomWithData<[f64; 2], String>;

/// meters per degree of latitude, slightly underestimated so the search
/// envelope always covers the radius.
const METERS_PER_DEGREE: f64 = 110_000.0;

/// spatial index of node locations, by node id.
pub struct NodeIndex {
    tree: RTree<IndexedNode>,
}

impl NodeIndex {
    pub fn new<'a>(nodes: impl Iterator<Item = &'a Node>) -> Self {
        let entries = nodes.map(entry).collect::<Vec<_>>();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    pub fn insert(&mut self, node: &Node) {
        self.tree.insert(entry(node));
    }

    /// moves an indexed node. the previous location is the one it was indexed with.
    pub fn relocate(&mut self, previous: &Point<f64>, node: &Node) {
        let stale = GeomWithData::new([previous.x(), previous.y()], node.id.clone());
        self.tree.remove(&stale);
        self.tree.insert(entry(node));
    }

    /// nodes within `radius_meters` of the point, nearest first, with their
    /// location and distance in meters. a zero radius only finds nodes at
    /// exactly this location.
    pub fn within_meters(&self, point: &Point<f64>, radius_meters: f64) -> Vec<(String, Point<f64>, f64)> {
        if radius_meters <= 0.0 {
            return self
                .tree
                .locate_all_at_point(&[point.x(), point.y()])
                .map(|n| (n.data.clone(), *point, 0.0))
                .collect();
        }
        let dlat = radius_meters / METERS_PER_DEGREE;
        let cos_lat = point.y().to_radians().cos().abs().max(0.01);
        let dlon = dlat / cos_lat;
        let envelope = AABB::from_corners(
            [point.x() - dlon, point.y() - dlat],
            [point.x() + dlon, point.y() + dlat],
        );
        let mut found = self
            .tree
            .locate_in_envelope(&envelope)
            .map(|n| {
                let [x, y] = *n.geom();
                let location = Point::new(x, y);
                let distance = geo_utils::haversine_meters(point, &location);
                (n.data.clone(), location, distance)
            })
            .filter(|(_, _, distance)| *distance <= radius_meters)
            .collect::<Vec<_>>();
        found.sort_by(|a, b| a.2.total_cmp(&b.2).then_with(|| a.0.cmp(&b.0)));
        found
    }
}

fn entry(node: &Node) -> IndexedNode {
    GeomWithData::new([node.geography.x(), node.geography.y()], node.id.clone())
}

#[cfg(test)]
mod test {
    use geo::Point;
    use transit_core::model::Node;

    use super::NodeIndex;

    fn node(id: &str, lon: f64, lat: f64) -> Node {
        Node {
            id: id.to_string(),
            code: id.to_string(),
            name: None,
            geography: Point::new(lon, lat),
            color: String::from("#0086FF"),
            routing_radius_meters: 50.0,
            default_dwell_time_seconds: 20,
            stops: vec![],
        }
    }

    #[test]
    fn test_within_meters() {
        let nodes = vec![
            node("near", -73.6, 45.5003),
            node("nearest", -73.6, 45.5001),
            node("far", -73.6, 45.51),
        ];
        let index = NodeIndex::new(nodes.iter());
        let found = index.within_meters(&Point::new(-73.6, 45.5), 50.0);
        let ids = found.iter().map(|(id, _, _)| id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["nearest", "near"]);
    }

    #[test]
    fn test_zero_radius_is_exact() {
        let nodes = vec![node("a", -73.6, 45.5), node("b", -73.6, 45.50001)];
        let index = NodeIndex::new(nodes.iter());
        let found = index.within_meters(&Point::new(-73.6, 45.5), 0.0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "a");
    }

    #[test]
    fn test_relocate() {
        let mut moved = node("a", -73.6, 45.5);
        let mut index = NodeIndex::new(std::iter::once(&moved));
        let previous = moved.geography;
        moved.geography = Point::new(-73.7, 45.6);
        index.relocate(&previous, &moved);
        assert_eq!(index.len(), 1);
        assert!(index.within_meters(&previous, 10.0).is_empty());
        assert_eq!(index.within_meters(&Point::new(-73.7, 45.6), 10.0).len(), 1);
    }
}
