use std::collections::HashMap;

use futures::stream::{self, StreamExt};
use transit_core::collection::{EntityStore, NetworkCollection};
use transit_core::model::{Node, NodeStop};
use transit_core::util::geo_utils;

use super::{BirdDistanceRouter, NodeIndex, WalkingRouter};
use crate::import::{ImportParameters, ImportWarning};
use crate::prepare::FeedStop;

#[derive(Clone, Debug)]
pub struct StopAggregationOptions {
    /// 0 only aggregates stops at the exact node location
    pub radius_seconds: u32,
    pub walking_speed_kph: f64,
    pub lookup_concurrency: usize,
    pub node_color: String,
    pub routing_radius_meters: f64,
    pub default_dwell_time_seconds: u32,
}

impl From<&ImportParameters> for StopAggregationOptions {
    fn from(params: &ImportParameters) -> Self {
        Self {
            radius_seconds: params.stop_aggregation_walking_radius_seconds,
            walking_speed_kph: params.walking_speed_kph,
            lookup_concurrency: params.lookup_concurrency,
            node_color: params.node_color.clone(),
            routing_radius_meters: params.node_routing_radius_meters,
            default_dwell_time_seconds: params.node_default_dwell_time_seconds,
        }
    }
}

#[derive(Debug, Default)]
pub struct StopAggregation {
    pub node_id_by_stop_id: HashMap<String, String>,
    pub created: usize,
    pub updated: usize,
    pub warnings: Vec<ImportWarning>,
}

impl StopAggregation {
    pub fn nodes_dirty(&self) -> bool {
        self.created + self.updated > 0
    }
}

/// assigns every stop to the node nearest in walking time within the
/// aggregation radius, or to a new node. node lookups run concurrently, chunk
/// by chunk, while node updates and saves run one at a time.
pub async fn aggregate_stops<S, R>(
    store: &S,
    router: &R,
    stops: &[FeedStop],
    existing: &NetworkCollection<Node>,
    options: &StopAggregationOptions,
) -> StopAggregation
where
    S: EntityStore<Node>,
    R: WalkingRouter,
{
    let mut result = StopAggregation::default();
    let mut nodes: HashMap<String, Node> = existing
        .features()
        .map(|n| (n.id.clone(), n.clone()))
        .collect();
    let mut index = NodeIndex::new(existing.features());
    let attached: HashMap<String, String> = existing
        .features()
        .flat_map(|n| n.stops.iter().map(|s| (s.id.clone(), n.id.clone())))
        .collect();
    let mut next_code = existing
        .features()
        .filter_map(|n| n.code.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
        + 1;
    let bird = BirdDistanceRouter::new(options.walking_speed_kph);
    let radius_meters =
        geo_utils::walking_radius_meters(options.radius_seconds, options.walking_speed_kph);
    let concurrency = options.lookup_concurrency.max(1);

    for chunk in stops.chunks(concurrency) {
        let mut pending = vec![];
        for stop in chunk.iter() {
            match attached.get(&stop.stop_id) {
                Some(node_id) => {
                    result
                        .node_id_by_stop_id
                        .insert(stop.stop_id.clone(), node_id.clone());
                }
                None => pending.push(stop),
            }
        }
        let lookups: Vec<Vec<(String, f64)>> = {
            let index = &index;
            let bird = &bird;
            stream::iter(pending.iter())
                .map(|stop| find_nodes(index, router, bird, stop, radius_meters, options))
                .buffered(concurrency)
                .collect()
                .await
        };

        // nodes created or moved in this chunk, unknown to its lookups
        let mut touched: Vec<String> = vec![];
        for (stop, mut found) in pending.into_iter().zip(lookups) {
            for node_id in touched.iter() {
                if let Some(node) = nodes.get(node_id) {
                    if let Some(score) = touched_node_score(&bird, stop, node, options) {
                        found.push((node_id.clone(), score));
                    }
                }
            }
            found.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

            let node_stop = NodeStop {
                id: stop.stop_id.clone(),
                code: stop.code.clone(),
                name: stop.name.clone(),
                geography: stop.point,
            };
            let nearest = found.first().and_then(|(id, _)| nodes.get(id));
            let (node, created) = match nearest {
                Some(node) => {
                    let mut node = node.clone();
                    node.attach_stop(node_stop);
                    (node, false)
                }
                None => {
                    let node = Node {
                        id: uuid::Uuid::new_v4().to_string(),
                        code: format!("{next_code:04}"),
                        name: stop.name.clone(),
                        geography: stop.point,
                        color: options.node_color.clone(),
                        routing_radius_meters: options.routing_radius_meters,
                        default_dwell_time_seconds: options.default_dwell_time_seconds,
                        stops: vec![node_stop],
                    };
                    next_code += 1;
                    (node, true)
                }
            };
            if let Err(e) = store.save(&node).await {
                let warning = ImportWarning::EntitySaveFailed {
                    entity: String::from("node"),
                    id: node.id.clone(),
                    message: e.to_string(),
                };
                log::warn!("{warning}");
                result.warnings.push(warning);
                continue;
            }
            if created {
                log::debug!("stop '{}' creates node '{}'", stop.stop_id, node.id);
                result.created += 1;
                index.insert(&node);
            } else {
                log::debug!("stop '{}' joins node '{}'", stop.stop_id, node.id);
                result.updated += 1;
                if let Some(previous) = nodes.get(&node.id) {
                    if previous.geography != node.geography {
                        index.relocate(&previous.geography, &node);
                    }
                }
            }
            result
                .node_id_by_stop_id
                .insert(stop.stop_id.clone(), node.id.clone());
            if !touched.contains(&node.id) {
                touched.push(node.id.clone());
            }
            nodes.insert(node.id.clone(), node);
        }
    }
    log::info!(
        "aggregated {} stops: {} nodes created, {} nodes updated",
        result.node_id_by_stop_id.len(),
        result.created,
        result.updated
    );
    result
}

/// walking time to the indexed nodes within the aggregation radius. when the
/// router fails, bird distance at walking speed is used instead.
async fn find_nodes<R: WalkingRouter>(
    index: &NodeIndex,
    router: &R,
    bird: &BirdDistanceRouter,
    stop: &FeedStop,
    radius_meters: f64,
    options: &StopAggregationOptions,
) -> Vec<(String, f64)> {
    let near = index.within_meters(&stop.point, radius_meters);
    if options.radius_seconds == 0 || near.is_empty() {
        return near.into_iter().map(|(id, _, _)| (id, 0.0)).collect();
    }
    let destinations = near.iter().map(|(_, p, _)| *p).collect::<Vec<_>>();
    let durations = match router.walking_durations(&stop.point, &destinations).await {
        Ok(durations) if durations.len() == destinations.len() => durations,
        Ok(_) | Err(_) => {
            log::debug!(
                "walking router unavailable near stop '{}', using bird distance",
                stop.stop_id
            );
            destinations
                .iter()
                .map(|p| Some(bird.duration(&stop.point, p)))
                .collect()
        }
    };
    let limit = options.radius_seconds as f64;
    near.into_iter()
        .zip(durations)
        .filter_map(|((id, _, _), duration)| duration.filter(|d| *d <= limit).map(|d| (id, d)))
        .collect()
}

fn touched_node_score(
    bird: &BirdDistanceRouter,
    stop: &FeedStop,
    node: &Node,
    options: &StopAggregationOptions,
) -> Option<f64> {
    if options.radius_seconds == 0 {
        return (node.geography == stop.point).then_some(0.0);
    }
    let duration = bird.duration(&stop.point, &node.geography);
    (duration <= options.radius_seconds as f64).then_some(duration)
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use geo::Point;
    use transit_core::collection::{MemoryNetworkStore, NetworkCollection};
    use transit_core::model::{Node, NodeStop};

    use super::{aggregate_stops, StopAggregationOptions};
    use crate::aggregate::{BirdDistanceRouter, WalkingRouter};
    use crate::prepare::FeedStop;

    struct UnavailableRouter;

    impl WalkingRouter for UnavailableRouter {
        async fn walking_durations(
            &self,
            _origin: &Point<f64>,
            _destinations: &[Point<f64>],
        ) -> Result<Vec<Option<f64>>, String> {
            Err(String::from("no street network"))
        }
    }

    fn options(radius_seconds: u32, lookup_concurrency: usize) -> StopAggregationOptions {
        StopAggregationOptions {
            radius_seconds,
            walking_speed_kph: 5.0,
            lookup_concurrency,
            node_color: String::from("#0086FF"),
            routing_radius_meters: 50.0,
            default_dwell_time_seconds: 20,
        }
    }

    fn stop(id: &str, lon: f64, lat: f64) -> FeedStop {
        FeedStop {
            stop_id: id.to_string(),
            code: None,
            name: Some(id.to_string()),
            description: None,
            point: Point::new(lon, lat),
            parent_station: None,
        }
    }

    fn distinct(ids: impl Iterator<Item = String>) -> usize {
        ids.collect::<HashSet<_>>().len()
    }

    #[tokio::test]
    async fn test_nearby_stops_share_a_node() {
        let store = MemoryNetworkStore::default();
        let router = BirdDistanceRouter::new(5.0);
        // 0.0003 degrees of latitude is about 33m, within 83m of walking
        let stops = vec![
            stop("A", -73.6, 45.5),
            stop("B", -73.6, 45.5003),
            stop("C", -73.6, 45.51),
        ];
        let result = aggregate_stops(
            &store,
            &router,
            &stops,
            &NetworkCollection::default(),
            &options(60, 10),
        )
        .await;
        assert_eq!(result.node_id_by_stop_id.len(), 3);
        assert_eq!(result.node_id_by_stop_id["A"], result.node_id_by_stop_id["B"]);
        assert_ne!(result.node_id_by_stop_id["A"], result.node_id_by_stop_id["C"]);
        assert_eq!(result.created, 2);
        assert_eq!(result.updated, 1);
        assert!(result.nodes_dirty());
        let nodes = store.nodes.rows();
        assert_eq!(nodes.len(), 2);
        let shared = store.nodes.get(&result.node_id_by_stop_id["A"]).unwrap();
        assert_eq!(shared.stops.len(), 2);
        assert!((shared.geography.y() - 45.50015).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_joins_existing_node_and_falls_back_to_bird_distance() {
        let existing = Node {
            id: String::from("n1"),
            code: String::from("0041"),
            name: None,
            geography: Point::new(-73.6, 45.5),
            color: String::from("#0086FF"),
            routing_radius_meters: 50.0,
            default_dwell_time_seconds: 20,
            stops: vec![NodeStop {
                id: String::from("OLD"),
                code: None,
                name: None,
                geography: Point::new(-73.6, 45.5),
            }],
        };
        let store = MemoryNetworkStore::default();
        let stops = vec![
            stop("OLD", -73.6, 45.5),
            stop("NEW", -73.6, 45.5002),
            stop("FAR", -73.5, 45.5),
        ];
        let result = aggregate_stops(
            &store,
            &UnavailableRouter,
            &stops,
            &NetworkCollection::new(vec![existing]),
            &options(60, 2),
        )
        .await;
        assert_eq!(result.node_id_by_stop_id["OLD"], "n1");
        assert_eq!(result.node_id_by_stop_id["NEW"], "n1");
        assert_eq!(result.updated, 1);
        assert_eq!(result.created, 1);
        let far = store.nodes.get(&result.node_id_by_stop_id["FAR"]).unwrap();
        assert_eq!(far.code, "0042");
    }

    #[tokio::test]
    async fn test_zero_radius_requires_same_location() {
        let store = MemoryNetworkStore::default();
        let router = BirdDistanceRouter::new(5.0);
        let stops = vec![
            stop("A", -73.6, 45.5),
            stop("B", -73.6, 45.5),
            stop("C", -73.6, 45.50001),
        ];
        let result = aggregate_stops(
            &store,
            &router,
            &stops,
            &NetworkCollection::default(),
            &options(0, 10),
        )
        .await;
        assert_eq!(result.node_id_by_stop_id["A"], result.node_id_by_stop_id["B"]);
        assert_eq!(distinct(result.node_id_by_stop_id.into_values()), 2);
    }

    #[tokio::test]
    async fn test_reimported_stop_is_unchanged() {
        let store = MemoryNetworkStore::default();
        let router = BirdDistanceRouter::new(5.0);
        let stops = vec![stop("A", -73.6, 45.5)];
        let first = aggregate_stops(
            &store,
            &router,
            &stops,
            &NetworkCollection::default(),
            &options(60, 10),
        )
        .await;
        let saves = store.nodes.save_count();
        let nodes = NetworkCollection::new(store.nodes.rows());
        let second = aggregate_stops(&store, &router, &stops, &nodes, &options(60, 10)).await;
        assert_eq!(first.node_id_by_stop_id, second.node_id_by_stop_id);
        assert!(!second.nodes_dirty());
        assert_eq!(store.nodes.save_count(), saves);
    }
}
