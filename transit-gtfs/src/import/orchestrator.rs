use std::collections::HashSet;

use transit_core::collection::{NetworkCollection, NetworkStore};
use transit_core::model::{Agency, Line, Node, Path, Service};

use super::{
    ImportError, ImportParameters, ImportPhase, ImportResult, ImportWarning, InternalState,
    ProgressEvent, ProgressSink, IMPORT_PROGRESS_NAME,
};
use crate::aggregate::{aggregate_stops, StopAggregationOptions, WalkingRouter};
use crate::feed::RowSource;
use crate::path::{generate_paths, trips_by_line_id, PathGenerationOptions};
use crate::prepare::{
    prepare_agencies, prepare_frequencies, prepare_lines, prepare_services, prepare_shapes,
    prepare_stop_times, prepare_stops, prepare_trips,
};
use crate::reconcile::{import_agencies, import_lines, import_services};
use crate::schedule::ScheduleGenerator;

const BASE_PHASES: [ImportPhase; 4] = [
    ImportPhase::Stops,
    ImportPhase::Agencies,
    ImportPhase::Lines,
    ImportPhase::Services,
];

/// runs one import of a feed into the network, phase after phase. the
/// network is only changed through the store.
pub struct ImportOrchestrator<'a, S, R, G> {
    store: &'a S,
    source: &'a dyn RowSource,
    router: &'a R,
    schedules: &'a G,
    progress: Option<&'a dyn ProgressSink>,
    parameters: ImportParameters,
}

impl<'a, S, R, G> ImportOrchestrator<'a, S, R, G>
where
    S: NetworkStore,
    R: WalkingRouter,
    G: ScheduleGenerator,
{
    pub fn new(
        store: &'a S,
        source: &'a dyn RowSource,
        router: &'a R,
        schedules: &'a G,
        parameters: ImportParameters,
    ) -> Self {
        Self {
            store,
            source,
            router,
            schedules,
            progress: None,
            parameters,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    /// runs the stops, agencies, lines and services phases, then the paths
    /// and schedules phases when a period group is set.
    ///
    /// a failing phase stops the run, except the schedules phase whose error
    /// is returned with the successful result. nothing is rolled back.
    pub async fn run(&self) -> ImportResult {
        if let Err(message) = self.parameters.validate() {
            log::error!("invalid import parameters: {message}");
            return ImportResult::Failed {
                errors: vec![ImportError::InvalidParameters(message)],
                nodes_dirty: false,
            };
        }
        let mut phases = BASE_PHASES.to_vec();
        if self.parameters.period_group.is_some() {
            phases.extend([ImportPhase::Paths, ImportPhase::Schedules]);
        } else {
            log::info!("no period group, paths and schedules are not imported");
        }
        let mut state = InternalState::new(self.parameters.period_group.clone());
        let mut warnings: Vec<ImportWarning> = vec![];
        let mut errors: Vec<ImportError> = vec![];
        let mut nodes_dirty = false;

        self.report(IMPORT_PROGRESS_NAME, 0.0);
        for (step, phase) in phases.iter().enumerate() {
            log::info!("importing {phase}");
            self.report(phase.name(), 0.0);
            let outcome = match phase {
                ImportPhase::Stops => self.import_stops(&mut state, &mut nodes_dirty).await,
                ImportPhase::Agencies => self.import_agencies(&mut state).await,
                ImportPhase::Lines => self.import_lines(&mut state).await,
                ImportPhase::Services => self.import_services(&mut state).await,
                ImportPhase::Paths => self.import_paths(&mut state).await,
                ImportPhase::Schedules => self.schedules.generate_schedules(&state).await,
            };
            match outcome {
                Ok(phase_warnings) => {
                    log::info!("{phase} imported with {} warnings", phase_warnings.len());
                    warnings.extend(phase_warnings);
                }
                Err(e) if *phase == ImportPhase::Schedules => {
                    log::error!("{phase} import failed: {e}");
                    errors.push(e.in_phase(*phase));
                }
                Err(e) => {
                    log::error!("{phase} import failed: {e}");
                    return ImportResult::Failed {
                        errors: vec![e.in_phase(*phase)],
                        nodes_dirty,
                    };
                }
            }
            self.report(phase.name(), 1.0);
            self.report(
                IMPORT_PROGRESS_NAME,
                (step + 1) as f64 / phases.len() as f64,
            );
        }
        ImportResult::Success {
            warnings,
            errors,
            nodes_dirty,
        }
    }

    fn report(&self, name: &str, progress: f64) {
        if let Some(sink) = self.progress {
            sink.notify(ProgressEvent {
                name: name.to_string(),
                progress,
            });
        }
    }

    async fn import_stops(
        &self,
        state: &mut InternalState,
        nodes_dirty: &mut bool,
    ) -> Result<Vec<ImportWarning>, ImportError> {
        let prepared = prepare_stops(self.source)?;
        let mut nodes: NetworkCollection<Node> = NetworkCollection::default();
        nodes.load_from_server(self.store).await?;
        let options = StopAggregationOptions::from(&self.parameters);
        let aggregation =
            aggregate_stops(self.store, self.router, &prepared.candidates, &nodes, &options).await;
        *nodes_dirty = aggregation.nodes_dirty();
        log::info!(
            "{} stops: {} nodes created, {} nodes updated",
            prepared.candidates.len(),
            aggregation.created,
            aggregation.updated
        );
        for stop in prepared.candidates.iter() {
            state.stop_coordinates.insert(stop.stop_id.clone(), stop.point);
        }
        state
            .node_id_by_stop_id
            .extend(aggregation.node_id_by_stop_id);
        let mut warnings = prepared.warnings;
        warnings.extend(aggregation.warnings);
        Ok(warnings)
    }

    async fn import_agencies(
        &self,
        state: &mut InternalState,
    ) -> Result<Vec<ImportWarning>, ImportError> {
        let mut agencies: NetworkCollection<Agency> = NetworkCollection::default();
        agencies.load_from_server(self.store).await?;
        let mut prepared = prepare_agencies(self.source, &agencies)?;
        for candidate in prepared.candidates.iter_mut() {
            candidate.apply_selection(self.parameters.agencies.get(&candidate.data.agency_id));
        }
        let reconciled = import_agencies(
            self.store,
            &prepared.candidates,
            &agencies,
            state,
            &self.parameters.agency_color,
        )
        .await;
        let mut warnings = prepared.warnings;
        warnings.extend(reconciled.warnings);
        Ok(warnings)
    }

    async fn import_lines(&self, state: &mut InternalState) -> Result<Vec<ImportWarning>, ImportError> {
        let mut lines: NetworkCollection<Line> = NetworkCollection::default();
        lines.load_from_server(self.store).await?;
        let mut prepared = prepare_lines(self.source, &state.agency_id_by_feed_id, &lines)?;
        for candidate in prepared.candidates.iter_mut() {
            candidate.apply_selection(self.parameters.lines.get(&candidate.data.route_id));
        }
        let reconciled = import_lines(
            self.store,
            &prepared.candidates,
            &lines,
            state,
            &self.parameters.line_color,
        )
        .await;
        let mut warnings = prepared.warnings;
        warnings.extend(reconciled.warnings);
        Ok(warnings)
    }

    async fn import_services(
        &self,
        state: &mut InternalState,
    ) -> Result<Vec<ImportWarning>, ImportError> {
        let mut services: NetworkCollection<Service> = NetworkCollection::default();
        services.load_from_server(self.store).await?;
        let mut lines: NetworkCollection<Line> = NetworkCollection::default();
        lines.load_from_server(self.store).await?;
        let mut prepared = prepare_services(
            self.source,
            &services,
            self.parameters.merge_same_days_services,
        )?;
        for candidate in prepared.candidates.iter_mut() {
            candidate.apply_selection(self.parameters.services.get(&candidate.data.name));
        }
        let reconciled =
            import_services(self.store, &prepared.candidates, &services, &lines, state).await;
        let mut warnings = prepared.warnings;
        warnings.extend(reconciled.warnings);
        Ok(warnings)
    }

    /// reads the trips of the imported lines and services with their shapes,
    /// stop times and frequencies, then generates their paths.
    async fn import_paths(&self, state: &mut InternalState) -> Result<Vec<ImportWarning>, ImportError> {
        let trips = prepare_trips(
            self.source,
            &state.line_id_by_route_id,
            &state.service_id_by_feed_id,
        )?;
        let mut warnings = trips.warnings;
        state.trips_to_import = trips.candidates;
        if state.trips_to_import.is_empty() {
            log::info!("no trip to import");
            return Ok(warnings);
        }
        let trip_ids: HashSet<String> = state
            .trips_to_import
            .iter()
            .map(|t| t.trip_id.clone())
            .collect();
        let shape_ids: HashSet<String> = state
            .trips_to_import
            .iter()
            .filter_map(|t| t.shape_id.clone())
            .collect();

        let (shapes, shape_warnings) = prepare_shapes(self.source, &shape_ids)?;
        let (stop_times, stop_time_warnings) = prepare_stop_times(self.source, &trip_ids)?;
        let (frequencies, frequency_warnings) = prepare_frequencies(self.source, &trip_ids)?;
        state.shapes_by_shape_id = shapes;
        state.stop_times_by_trip_id = stop_times;
        state.frequencies_by_trip_id = frequencies;
        warnings.extend(shape_warnings);
        warnings.extend(stop_time_warnings);
        warnings.extend(frequency_warnings);

        let mut paths: NetworkCollection<Path> = NetworkCollection::default();
        paths.load_from_server(self.store).await?;
        let options = PathGenerationOptions {
            layover: self.parameters.layover.clone(),
        };
        let grouped = trips_by_line_id(state);
        let generated = generate_paths(self.store, &grouped, &paths, state, &options).await?;
        warnings.extend(generated.warnings);
        Ok(warnings)
    }
}

#[cfg(test)]
mod test {
    use std::cell::{Cell, RefCell};

    use transit_core::collection::MemoryNetworkStore;
    use transit_core::model::{Period, PeriodGroup};

    use super::ImportOrchestrator;
    use crate::aggregate::BirdDistanceRouter;
    use crate::feed::{FeedFile, InMemoryRowSource};
    use crate::import::{
        ImportError, ImportParameters, ImportPhase, ImportWarning, InternalState, ProgressEvent,
        ProgressSink, IMPORT_PROGRESS_NAME,
    };
    use crate::schedule::{ScheduleGenerator, ScheduleImporter};

    struct FakeSchedules {
        calls: Cell<usize>,
        fail: bool,
    }

    impl FakeSchedules {
        fn new(fail: bool) -> Self {
            Self {
                calls: Cell::new(0),
                fail,
            }
        }
    }

    impl ScheduleGenerator for FakeSchedules {
        async fn generate_schedules(
            &self,
            _state: &InternalState,
        ) -> Result<Vec<ImportWarning>, ImportError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                Err(ImportError::Internal(String::from("schedule generation failed")))
            } else {
                Ok(vec![])
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        events: RefCell<Vec<ProgressEvent>>,
    }

    impl ProgressSink for RecordingSink {
        fn notify(&self, event: ProgressEvent) {
            self.events.borrow_mut().push(event);
        }
    }

    fn feed() -> InMemoryRowSource {
        InMemoryRowSource::new()
            .with_file(FeedFile::Agency, "agency_id,agency_name\nSTM,City Transit\n")
            .with_file(
                FeedFile::Routes,
                "route_id,agency_id,route_short_name,route_long_name,route_type\n\
                24,STM,24,Sherbrooke,3\n",
            )
            .with_file(
                FeedFile::Calendar,
                "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
                WK,1,1,1,1,1,0,0,20240101,20240630\n",
            )
            .with_file(
                FeedFile::Stops,
                "stop_id,stop_name,stop_lat,stop_lon\n\
                A,First,45.5,-73.6\n\
                B,Second,45.505,-73.6\n\
                C,Third,45.51,-73.6\n",
            )
            .with_file(
                FeedFile::Trips,
                "route_id,service_id,trip_id,shape_id,direction_id\n\
                24,WK,T1,SH1,0\n\
                24,WK,T2,SH1,0\n",
            )
            .with_file(
                FeedFile::Shapes,
                "shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence\n\
                SH1,45.5,-73.6,1\n\
                SH1,45.505,-73.6,2\n\
                SH1,45.51,-73.6,3\n",
            )
            .with_file(
                FeedFile::StopTimes,
                "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
                T1,07:00:00,07:00:00,A,1\n\
                T1,07:05:00,07:05:30,B,2\n\
                T1,07:10:00,07:10:00,C,3\n\
                T2,08:00:00,08:00:00,A,1\n\
                T2,,,B,2\n\
                T2,08:10:00,08:10:00,C,3\n",
            )
    }

    fn parameters(with_period_group: bool) -> ImportParameters {
        ImportParameters {
            period_group: with_period_group.then(|| PeriodGroup {
                shortname: String::from("default"),
                periods: vec![Period {
                    shortname: String::from("day"),
                    start_hour: 4,
                    end_hour: 28,
                }],
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_full_import() {
        let store = MemoryNetworkStore::default();
        let source = feed();
        let router = BirdDistanceRouter::new(5.0);
        let schedules = ScheduleImporter::new(&store);
        let sink = RecordingSink::default();
        let result = ImportOrchestrator::new(&store, &source, &router, &schedules, parameters(true))
            .with_progress(&sink)
            .run()
            .await;
        assert!(result.is_success(), "{:?}", result.errors());
        assert!(result.errors().is_empty());
        assert!(result.nodes_dirty());
        assert_eq!(store.nodes.rows().len(), 3);
        assert_eq!(store.agencies.rows().len(), 1);
        assert_eq!(store.lines.rows().len(), 1);
        assert_eq!(store.paths.rows().len(), 1);
        assert_eq!(store.paths.bulk_insert_count(), 1);
        let schedules = store.schedules.rows();
        assert_eq!(schedules.len(), 1);
        assert_eq!(schedules[0].periods[0].trips.len(), 2);
        let service = &store.services.rows()[0];
        assert!(service.scheduled_line_ids.contains(&store.lines.rows()[0].id));

        let events = sink.events.borrow();
        let overall = events
            .iter()
            .filter(|e| e.name == IMPORT_PROGRESS_NAME)
            .map(|e| e.progress)
            .collect::<Vec<_>>();
        assert_eq!(overall.len(), 7);
        assert_eq!(overall.last(), Some(&1.0));
        assert!(events.iter().any(|e| e.name == "paths" && e.progress == 1.0));
    }

    #[tokio::test]
    async fn test_failing_services_phase_stops_the_run() {
        let store = MemoryNetworkStore::default();
        store.services.fail_loads(true);
        let source = feed();
        let router = BirdDistanceRouter::new(5.0);
        let schedules = FakeSchedules::new(false);
        let result = ImportOrchestrator::new(&store, &source, &router, &schedules, parameters(true))
            .run()
            .await;
        assert!(!result.is_success());
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].phase(), Some(ImportPhase::Services));
        assert!(result.warnings().is_empty());
        assert!(result.nodes_dirty());
        assert_eq!(schedules.calls.get(), 0);
        assert_eq!(store.paths.bulk_insert_count(), 0);
        assert_eq!(store.lines.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_no_period_group() {
        let store = MemoryNetworkStore::default();
        let source = feed();
        let router = BirdDistanceRouter::new(5.0);
        let schedules = FakeSchedules::new(false);
        let result = ImportOrchestrator::new(&store, &source, &router, &schedules, parameters(false))
            .run()
            .await;
        assert!(result.is_success());
        assert_eq!(store.services.rows().len(), 1);
        assert!(store.paths.rows().is_empty());
        assert_eq!(store.paths.load_count(), 0);
        assert_eq!(schedules.calls.get(), 0);
    }

    #[tokio::test]
    async fn test_schedule_errors_come_with_success() {
        let store = MemoryNetworkStore::default();
        let source = feed();
        let router = BirdDistanceRouter::new(5.0);
        let schedules = FakeSchedules::new(true);
        let result = ImportOrchestrator::new(&store, &source, &router, &schedules, parameters(true))
            .run()
            .await;
        assert!(result.is_success());
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].phase(), Some(ImportPhase::Schedules));
        assert_eq!(schedules.calls.get(), 1);
        assert_eq!(store.paths.rows().len(), 1);
        let json = result.to_json();
        assert_eq!(json["status"], "success");
        assert_eq!(json["errors"][0]["phase"], "schedules");
    }

    #[tokio::test]
    async fn test_missing_required_file() {
        let store = MemoryNetworkStore::default();
        let source = InMemoryRowSource::new();
        let router = BirdDistanceRouter::new(5.0);
        let schedules = FakeSchedules::new(false);
        let result = ImportOrchestrator::new(&store, &source, &router, &schedules, parameters(true))
            .run()
            .await;
        assert!(!result.is_success());
        assert_eq!(result.errors()[0].phase(), Some(ImportPhase::Stops));
        assert!(!result.nodes_dirty());
    }
}
