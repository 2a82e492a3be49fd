//! Integration tests for the concurrent quorum search.

use async_trait::async_trait;
use geo::{Distance, Haversine, Point as GeoPoint};
use nearby_core::config::SearchConfig;
use nearby_core::error::{NearbyError, Result};
use nearby_core::models::{Candidate, ContainmentQuery, Point, Predicate, RecordKind};
use nearby_search::QuorumSearchCoordinator;
use nearby_store::{MemorySpatialStore, Record, SpatialStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const ORIGIN: Point = Point { lat: 51.5, lng: -0.1 };

/// Five-ring config: 4, 6, 8, 10 and 12 km.
fn five_rings() -> SearchConfig {
    SearchConfig { ring_step: 2.0, max_radius: 12.0, ..SearchConfig::default() }
}

fn job_candidate(id: u64) -> Candidate {
    Candidate {
        id,
        name: format!("job{id}"),
        kind: RecordKind::Job,
        lat: ORIGIN.lat,
        lng: ORIGIN.lng,
        relevance: 0.5,
        category: None,
        posted_at: None,
        ambit: 0.0,
        distance: id as f64,
        area: 0.0,
    }
}

/// What a scripted store does when the ring of a given radius queries it.
struct RingRule {
    radius: f64,
    delay: Duration,
    outcome: Outcome,
}

enum Outcome {
    Rows { id_base: u64, count: usize },
    Error,
}

/// A store scripted per ring radius. Rings with no rule return no rows.
struct ScriptedStore {
    rules: Vec<RingRule>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedStore {
    fn new(rules: Vec<RingRule>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Self { rules, calls: Arc::clone(&calls) }, calls)
    }
}

/// Recover the ring radius from a query: the NE corner sits at exactly the
/// ring's distance from the origin.
fn ring_of(query: &ContainmentQuery) -> f64 {
    let origin = GeoPoint::new(query.origin.lng, query.origin.lat);
    let ne = GeoPoint::new(query.bounds.ne.lng, query.bounds.ne.lat);
    Haversine.distance(origin, ne) / 1000.0
}

#[async_trait]
impl SpatialStore for ScriptedStore {
    async fn containment_query(&self, query: &ContainmentQuery) -> Result<Vec<Candidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let ring = ring_of(query);

        let Some(rule) = self.rules.iter().find(|r| (r.radius - ring).abs() < 0.05) else {
            return Ok(Vec::new());
        };

        if !rule.delay.is_zero() {
            tokio::time::sleep(rule.delay).await;
        }

        match &rule.outcome {
            Outcome::Rows { id_base, count } => {
                Ok((0..*count as u64).map(|i| job_candidate(id_base + i)).collect())
            }
            Outcome::Error => Err(NearbyError::Store { reason: "ring query lost".to_string() }),
        }
    }
}

fn rows(radius: f64, id_base: u64, count: usize) -> RingRule {
    RingRule { radius, delay: Duration::ZERO, outcome: Outcome::Rows { id_base, count } }
}

#[tokio::test]
async fn quorum_adopts_the_ring_that_crosses_the_threshold() {
    // Every ring has 3 rows except the 10 km ring, which has 12.
    let (store, _) = ScriptedStore::new(vec![
        rows(4.0, 100, 3),
        rows(6.0, 200, 3),
        rows(8.0, 300, 3),
        rows(10.0, 400, 12),
        rows(12.0, 500, 3),
    ]);

    let coordinator = QuorumSearchCoordinator::new(Arc::new(store), five_rings());
    let results = coordinator.find_ranked(ORIGIN, &Predicate::jobs(0.10), 10).await;

    assert_eq!(results.len(), 12);
    assert!(results.iter().all(|c| c.id >= 400 && c.id < 412));
    assert!(results.iter().all(|c| c.ambit == 10.0), "adopted rows carry their ring size");
}

#[tokio::test]
async fn late_rings_never_overwrite_the_adopted_answer() {
    // The smallest ring satisfies the quorum instantly; the largest ring
    // would return twice as many rows, but arrives long after adoption.
    let (store, calls) = ScriptedStore::new(vec![
        rows(4.0, 100, 10),
        RingRule {
            radius: 12.0,
            delay: Duration::from_millis(150),
            outcome: Outcome::Rows { id_base: 900, count: 20 },
        },
    ]);

    let coordinator = QuorumSearchCoordinator::new(Arc::new(store), five_rings());
    let results = coordinator.find_ranked(ORIGIN, &Predicate::jobs(0.10), 10).await;

    assert_eq!(results.len(), 10);
    assert!(results.iter().all(|c| c.id >= 100 && c.id < 110), "slow ring was ignored");

    // The losing ring was not cancelled: all five ring queries still ran.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn exhausted_ladder_returns_the_best_short_set() {
    // Nothing ever reaches the limit; the best observed set (3 rows) wins.
    let (store, _) = ScriptedStore::new(vec![rows(8.0, 300, 3)]);

    let coordinator = QuorumSearchCoordinator::new(Arc::new(store), five_rings());
    let results = coordinator.find_ranked(ORIGIN, &Predicate::jobs(0.10), 10).await;

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|c| c.id >= 300 && c.id < 303));
}

#[tokio::test]
async fn all_rings_empty_returns_an_empty_list() {
    let (store, calls) = ScriptedStore::new(Vec::new());

    let coordinator = QuorumSearchCoordinator::new(Arc::new(store), five_rings());
    let results = coordinator.find_ranked(ORIGIN, &Predicate::jobs(0.10), 10).await;

    assert!(results.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 5, "every ring was still queried");
}

#[tokio::test]
async fn failed_rings_contribute_nothing_and_surface_no_error() {
    let (store, _) = ScriptedStore::new(vec![
        RingRule { radius: 4.0, delay: Duration::ZERO, outcome: Outcome::Error },
        RingRule { radius: 6.0, delay: Duration::ZERO, outcome: Outcome::Error },
        rows(8.0, 300, 3),
        RingRule { radius: 10.0, delay: Duration::ZERO, outcome: Outcome::Error },
        RingRule { radius: 12.0, delay: Duration::ZERO, outcome: Outcome::Error },
    ]);

    let coordinator = QuorumSearchCoordinator::new(Arc::new(store), five_rings());
    let results = coordinator.find_ranked(ORIGIN, &Predicate::jobs(0.10), 10).await;

    assert_eq!(results.len(), 3, "the one healthy ring still contributes");
}

#[tokio::test]
async fn unknown_origin_short_circuits_before_spawning_rings() {
    let (store, calls) = ScriptedStore::new(vec![rows(4.0, 100, 10)]);

    let coordinator = QuorumSearchCoordinator::new(Arc::new(store), five_rings());
    let results = coordinator.find_ranked(Point::new(0.0, 0.0), &Predicate::jobs(0.10), 10).await;

    assert!(results.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn zero_limit_is_an_empty_answer() {
    let (store, calls) = ScriptedStore::new(vec![rows(4.0, 100, 10)]);

    let coordinator = QuorumSearchCoordinator::new(Arc::new(store), five_rings());
    let results = coordinator.find_ranked(ORIGIN, &Predicate::jobs(0.10), 0).await;

    assert!(results.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn default_ladder_runs_from_twice_step_to_max_radius() {
    let coordinator = QuorumSearchCoordinator::new(
        Arc::new(MemorySpatialStore::new()),
        SearchConfig::default(),
    );
    let ladder = coordinator.ring_ladder();

    assert_eq!(ladder.len(), 31);
    assert_eq!(ladder[0], 4.0);
    assert_eq!(*ladder.last().unwrap(), 64.0);
}

#[tokio::test]
async fn end_to_end_against_the_memory_store() {
    let store = MemorySpatialStore::new();
    for i in 0..15u64 {
        store.store_record(Record {
            relevance: 0.1 + 0.01 * i as f64,
            ..Record::point(i, &format!("job{i}"), RecordKind::Job, 51.5 + 0.001 * i as f64, -0.1)
        });
    }

    let coordinator =
        QuorumSearchCoordinator::new(Arc::new(store), SearchConfig::default());
    let results = coordinator.find_ranked(ORIGIN, &Predicate::jobs(0.10), 10).await;

    // All 15 jobs sit well inside even the smallest ring, so every ring
    // returns the same store-ranked top ten and any adoption order yields it.
    assert_eq!(results.len(), 10);
    let ids: Vec<u64> = results.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![14, 13, 12, 11, 10, 9, 8, 7, 6, 5]);
    assert!(results.iter().all(|c| c.ambit >= 4.0), "every candidate is stamped with a ring");
}
