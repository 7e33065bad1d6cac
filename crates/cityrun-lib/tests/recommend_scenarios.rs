mod common;

use std::sync::atomic::Ordering;

use cityrun_lib::recommend::quality_score;
use cityrun_lib::{
    check_outlier, evaluate_loop, find_via_candidates, recommend, recommend_with_cancel,
    select_best, CancelToken, Coordinate, CostModel, Error, GraphStore, GridBuilder,
    InMemoryGraphStore, Preferences, ReachableVertex, RecommendConfig, RecommendRequest, Result,
    RoadEdge, VertexId,
};

use common::{CountingStore, Streets, SEOUL};

const BUSAN: Coordinate = Coordinate {
    lat: 35.1796,
    lng: 129.0756,
};

fn prefs(minimize_crosswalks: bool) -> Preferences {
    Preferences {
        minimize_crosswalks,
        ..Preferences::default()
    }
}

/// Start 1; a busy avenue east to 2 (2.4 km, 4 crossings) and a quiet
/// side street north to 3 (1 km).
fn avenue_and_side_street() -> InMemoryGraphStore {
    Streets::new()
        .vertex(1, 0.0, 0.0)
        .vertex(2, 0.0, 2_400.0)
        .vertex(3, 1_000.0, 0.0)
        .street(1, 2, 2_400.0, 4)
        .street(1, 3, 1_000.0, 0)
        .store()
}

/// Start 1 and turn-around 2 joined by a short street full of crossings,
/// plus a long clear detour through 3.
fn crossing_heavy_shortcut() -> InMemoryGraphStore {
    Streets::new()
        .vertex(1, 0.0, 0.0)
        .vertex(2, 0.0, 1_000.0)
        .vertex(3, 2_000.0, 1_000.0)
        .street(1, 2, 1_000.0, 30)
        .street(1, 3, 2_600.0, 0)
        .street(3, 2, 1_900.0, 0)
        .store()
}

/// Two turn-arounds: 2 hits the target exactly over a busy street, 3 falls
/// 100 m short over a clear one.
fn busy_exact_or_clear_short() -> InMemoryGraphStore {
    Streets::new()
        .vertex(1, 0.0, 0.0)
        .vertex(2, 0.0, 2_500.0)
        .vertex(3, 2_400.0, 0.0)
        .street(1, 2, 2_500.0, 10)
        .street(1, 3, 2_400.0, 0)
        .store()
}

#[test]
fn accepted_loop_scores_only_distance_error() {
    let store = avenue_and_side_street();
    let request = RecommendRequest::new(5.0, SEOUL, prefs(false));

    let result = recommend(&store, &request, &RecommendConfig::default()).expect("loop accepted");
    let route = &result.route;

    assert_eq!(result.start_vertex, 1);
    assert_eq!(result.via_vertex, 2);
    assert_eq!(route.distance_meters, 4_800.0);
    assert_eq!(route.crosswalk_count, 8);
    assert_eq!(route.final_score, 200.0);
    assert!((route.quality_score - 90.0).abs() < 1e-9);
    assert!((result.distance_ratio - 0.96).abs() < 1e-9);
    assert_eq!(result.candidates_evaluated, 2);
    assert_eq!(route.name, "Loop course (5.0 km target)");
    assert_eq!(route.uphill_meters, 0.0);
    assert_eq!(route.night_score, 70);
    assert_eq!(route.crowd_score, 60);
    assert_eq!((route.origin_lat, route.origin_lng), (SEOUL.lat, SEOUL.lng));
    assert_eq!((route.dest_lat, route.dest_lng), (SEOUL.lat, SEOUL.lng));
    assert_eq!(route.geometry.part_count(), 2);
    assert_eq!(result.message(), "Loop route from node 1 via node 2");
}

#[test]
fn overshooting_loop_scores_the_same_distance_error() {
    // A 2.6 km avenue with 4 crossings gives a 5.2 km, 8-crossing loop.
    let store = Streets::new()
        .vertex(1, 0.0, 0.0)
        .vertex(2, 0.0, 2_600.0)
        .street(1, 2, 2_600.0, 4)
        .store();
    let config = RecommendConfig::default();

    let route = evaluate_loop(&store, 1, 2, 5_000.0, &CostModel::length_only(), 200.0)
        .unwrap()
        .expect("loop exists");
    assert_eq!(route.total_distance_m, 5_200.0);
    assert_eq!(route.total_crossing_count, 8);
    assert_eq!(route.score, 200.0);

    let best = select_best(vec![route], 5.0).unwrap();
    check_outlier(&best, 5_000.0, 5.0, &config).expect("within bounds");
    assert!((best.distance_ratio(5_000.0) - 1.04).abs() < 1e-9);
    assert!((quality_score(5_200.0, 8, 5_000.0) - 90.0).abs() < 1e-9);
}

#[test]
fn forced_long_detour_is_rejected_as_outlier() {
    let store = crossing_heavy_shortcut();
    let request = RecommendRequest::new(5.0, SEOUL, prefs(true));

    let err = recommend(&store, &request, &RecommendConfig::default()).unwrap_err();
    match err {
        Error::OutlierRoute {
            distance_ratio,
            crosswalks,
            max_crosswalks_allowed,
        } => {
            assert!((distance_ratio - 1.8).abs() < 1e-9, "ratio {distance_ratio}");
            assert_eq!(crosswalks, 0);
            assert_eq!(max_crosswalks_allowed, 60.0);
        }
        other => panic!("expected outlier, got {other:?}"),
    }
}

#[test]
fn short_turnaround_is_rejected_as_outlier() {
    let store = crossing_heavy_shortcut();
    let request = RecommendRequest::new(5.0, SEOUL, prefs(false));

    let err = recommend(&store, &request, &RecommendConfig::default()).unwrap_err();
    assert!(
        matches!(err, Error::OutlierRoute { crosswalks: 60, .. }),
        "got {err:?}"
    );
}

#[test]
fn far_origin_fails_after_a_single_lookup() {
    let store = CountingStore::new(avenue_and_side_street());
    let request = RecommendRequest::new(5.0, BUSAN, prefs(false));

    let err = recommend(&store, &request, &RecommendConfig::default()).unwrap_err();
    assert!(matches!(err, Error::NoStartNode { .. }));
    assert_eq!(store.counts(), (1, 0, 0));
}

#[test]
fn invalid_input_never_reaches_the_store() {
    let store = CountingStore::new(avenue_and_side_street());
    let request = RecommendRequest::new(0.0, SEOUL, prefs(false));

    let err = recommend(&store, &request, &RecommendConfig::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidInput { .. }));
    assert_eq!(store.counts(), (0, 0, 0));
}

#[test]
fn avoiding_crossings_never_adds_crossings() {
    let store = busy_exact_or_clear_short();
    let config = RecommendConfig::default();

    let off = recommend(&store, &RecommendRequest::new(5.0, SEOUL, prefs(false)), &config)
        .expect("off loop");
    let on = recommend(&store, &RecommendRequest::new(5.0, SEOUL, prefs(true)), &config)
        .expect("on loop");

    assert_eq!(off.via_vertex, 2);
    assert_eq!(off.route.crosswalk_count, 20);
    assert_eq!(off.route.final_score, 0.0);

    assert_eq!(on.via_vertex, 3);
    assert_eq!(on.route.crosswalk_count, 0);
    assert_eq!(on.route.final_score, 200.0);
    assert!(on.route.crosswalk_count <= off.route.crosswalk_count);
}

#[test]
fn grid_recommendation_is_deterministic() {
    let builder = GridBuilder::new(SEOUL);
    let store = InMemoryGraphStore::new(builder.build().expect("grid builds"));
    let request = RecommendRequest::new(3.0, SEOUL, prefs(false));
    let config = RecommendConfig::default();

    let first = recommend(&store, &request, &config).expect("grid loop");
    let second = recommend(&store, &request, &config).expect("grid loop");

    assert_eq!(first, second);
    assert_eq!(first.start_vertex, builder.center_vertex());
    assert_eq!(
        first.route.final_score,
        (first.route.distance_meters - 3_000.0).abs()
    );
    assert_eq!(first.route.distance_meters, 3_000.0);
    assert_eq!(first.candidates_evaluated, config.candidate_via_limit);
}

#[test]
fn isolated_start_has_no_candidates() {
    let store = Streets::new().vertex(1, 0.0, 0.0).store();
    let err = recommend(
        &store,
        &RecommendRequest::new(5.0, SEOUL, prefs(false)),
        &RecommendConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::NoViaCandidates { .. }));
}

#[derive(Clone, Copy)]
enum PathFault {
    Unreachable,
    FailThrough(VertexId),
    FailAll,
}

/// Wraps a store and injects faults into path queries.
struct FaultyPaths<S> {
    inner: S,
    fault: PathFault,
}

impl<S: GraphStore> GraphStore for FaultyPaths<S> {
    fn nearest_vertex(&self, point: Coordinate) -> Result<Option<VertexId>> {
        self.inner.nearest_vertex(point)
    }

    fn one_to_many_distance(
        &self,
        from: VertexId,
        budget: f64,
        cost: &CostModel,
    ) -> Result<Vec<ReachableVertex>> {
        self.inner.one_to_many_distance(from, budget, cost)
    }

    fn shortest_path(
        &self,
        from: VertexId,
        to: VertexId,
        cost: &CostModel,
    ) -> Result<Option<Vec<RoadEdge>>> {
        match self.fault {
            PathFault::Unreachable => Ok(None),
            PathFault::FailAll => Err(Error::upstream("connection reset")),
            PathFault::FailThrough(via) if via == from || via == to => {
                Err(Error::upstream("connection reset"))
            }
            PathFault::FailThrough(_) => self.inner.shortest_path(from, to, cost),
        }
    }
}

fn recommend_with_fault(fault: PathFault) -> Result<cityrun_lib::Recommendation> {
    let store = FaultyPaths {
        inner: avenue_and_side_street(),
        fault,
    };
    recommend(
        &store,
        &RecommendRequest::new(5.0, SEOUL, prefs(false)),
        &RecommendConfig::default(),
    )
}

#[test]
fn unreachable_candidates_give_no_loop_route() {
    let err = recommend_with_fault(PathFault::Unreachable).unwrap_err();
    assert!(matches!(err, Error::NoLoopRoute { .. }));
}

#[test]
fn failing_candidate_is_skipped() {
    let result =
        recommend_with_fault(PathFault::FailThrough(3)).expect("remaining candidate succeeds");
    assert_eq!(result.via_vertex, 2);
}

#[test]
fn all_candidates_failing_upstream_surfaces_unavailability() {
    let err = recommend_with_fault(PathFault::FailAll).unwrap_err();
    assert!(matches!(err, Error::UpstreamUnavailable { .. }));
}

#[test]
fn cancelled_request_never_reaches_the_store() {
    let store = CountingStore::new(avenue_and_side_street());
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = recommend_with_cancel(
        &store,
        &RecommendRequest::new(5.0, SEOUL, prefs(false)),
        &RecommendConfig::default(),
        &cancel,
    )
    .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(store.counts(), (0, 0, 0));
}

/// Cancels the shared token as soon as the first path query arrives.
struct CancelOnFirstPath {
    inner: CountingStore<InMemoryGraphStore>,
    cancel: CancelToken,
}

impl GraphStore for CancelOnFirstPath {
    fn nearest_vertex(&self, point: Coordinate) -> Result<Option<VertexId>> {
        self.inner.nearest_vertex(point)
    }

    fn one_to_many_distance(
        &self,
        from: VertexId,
        budget: f64,
        cost: &CostModel,
    ) -> Result<Vec<ReachableVertex>> {
        self.inner.one_to_many_distance(from, budget, cost)
    }

    fn shortest_path(
        &self,
        from: VertexId,
        to: VertexId,
        cost: &CostModel,
    ) -> Result<Option<Vec<RoadEdge>>> {
        self.cancel.cancel();
        self.inner.shortest_path(from, to, cost)
    }
}

#[test]
fn cancelling_mid_search_stops_further_path_queries() {
    let grid = InMemoryGraphStore::new(GridBuilder::new(SEOUL).build().expect("grid builds"));
    let config = RecommendConfig::default();
    let start = grid.nearest_vertex(SEOUL).unwrap().expect("grid start");
    let candidates =
        find_via_candidates(&grid, start, 3_000.0, config.candidate_via_limit).unwrap();
    assert!(candidates.len() > 1);

    let cancel = CancelToken::new();
    let store = CancelOnFirstPath {
        inner: CountingStore::new(grid),
        cancel: cancel.clone(),
    };

    let err = recommend_with_cancel(
        &store,
        &RecommendRequest::new(3.0, SEOUL, prefs(false)),
        &config,
        &cancel,
    )
    .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    // Out legs already past the check may finish; no back leg starts.
    let paths = store.inner.shortest_path_calls.load(Ordering::SeqCst);
    assert!(paths >= 1);
    assert!(paths <= candidates.len(), "{paths} path queries");
}
