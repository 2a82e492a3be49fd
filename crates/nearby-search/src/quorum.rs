//! Concurrent quorum search.
//!
//! Finds up to `limit` proximity-ranked listings around a point. Rather than
//! growing one box and re-querying, every ring size in the ladder is queried
//! at once and the completions race: the first one that pushes the best
//! observed result set past `limit` decides the answer. Wall-clock cost is
//! the fastest sufficient ring rather than the sum of all rings; the store
//! absorbs the extra concurrent load in exchange.
//!
//! Rings that complete after the answer is adopted are discarded, not
//! cancelled. Every launched query always runs to completion on the store, so
//! backend load is "all rings", every time. That is a deliberate trade, not
//! an oversight; cancelling losers would change the load characteristics.
//!
//! Which ring's rows are adopted when several could satisfy the quorum
//! depends on completion order, so repeated searches over identical data may
//! return different (equally valid) sets.

use nearby_core::config::SearchConfig;
use nearby_core::geo::{bounding_box, BoxMode};
use nearby_core::models::{Candidate, ContainmentQuery, Point, Predicate, RankOrder};
use nearby_store::SpatialStore;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};

/// Per-request coordination state, shared by the ring tasks. Created when a
/// search starts, dropped when it returns; never reused across requests.
struct SearchState {
    best: Vec<Candidate>,
    remaining: usize,
    satisfied: bool,
    signal: Option<oneshot::Sender<()>>,
}

/// Drives the concurrent ring search.
pub struct QuorumSearchCoordinator<S> {
    store: Arc<S>,
    config: SearchConfig,
}

impl<S: SpatialStore + 'static> QuorumSearchCoordinator<S> {
    pub fn new(store: Arc<S>, config: SearchConfig) -> Self {
        Self { store, config }
    }

    /// The fixed ladder of ring radii, in kilometres: `2*step, 3*step, ...`
    /// up to the maximum radius.
    pub fn ring_ladder(&self) -> Vec<f64> {
        let step = self.config.ring_step;
        let mut rings = Vec::new();
        let mut i = 2u32;
        while f64::from(i) * step <= self.config.max_radius {
            rings.push(f64::from(i) * step);
            i += 1;
        }
        rings
    }

    /// Return up to `limit` ranked candidates around `origin`.
    ///
    /// May return fewer than `limit` if the maximum radius is exhausted
    /// without reaching it, and an empty vec for the `(0, 0)` sentinel
    /// origin. Ring query failures degrade to empty rings; no error surfaces
    /// to the caller. The coordinator imposes no timeout of its own; wrap the
    /// call in a deadline if one is needed.
    pub async fn find_ranked(
        &self,
        origin: Point,
        predicate: &Predicate,
        limit: usize,
    ) -> Vec<Candidate> {
        if origin.is_unknown() || limit == 0 {
            return Vec::new();
        }

        let rings = self.ring_ladder();
        if rings.is_empty() {
            return Vec::new();
        }

        let (tx, rx) = oneshot::channel();
        let state = Arc::new(Mutex::new(SearchState {
            best: Vec::new(),
            remaining: rings.len(),
            satisfied: false,
            signal: Some(tx),
        }));

        for radius in rings {
            let store = Arc::clone(&self.store);
            let state = Arc::clone(&state);
            let query = ContainmentQuery {
                origin,
                bounds: bounding_box(origin, radius, BoxMode::Geodesic),
                predicate: predicate.clone(),
                order: RankOrder::BestThenNearest,
                limit,
            };

            tokio::spawn(async move {
                let mut rows = match store.containment_query(&query).await {
                    Ok(rows) => rows,
                    Err(e) => {
                        tracing::warn!(ring = radius, error = %e, "ring query failed");
                        Vec::new()
                    }
                };

                for candidate in &mut rows {
                    candidate.ambit = radius;
                }

                let mut st = state.lock().await;

                if st.satisfied {
                    // The answer was adopted while this ring was in flight.
                    return;
                }

                // Ties favour the most recently completed ring, not the
                // smallest one.
                if rows.len() >= st.best.len() {
                    st.best = rows;
                }

                st.remaining -= 1;

                if st.best.len() >= limit || st.remaining == 0 {
                    // Either we found enough or we have run out of rings.
                    // Take the best seen so far; `satisfied` flips exactly
                    // once and nothing mutates `best` after it.
                    st.satisfied = true;
                    if let Some(signal) = st.signal.take() {
                        let _ = signal.send(());
                    }
                }
            });
        }

        // The sender is consumed on the satisfying completion, so this cannot
        // miss the signal.
        let _ = rx.await;

        let mut st = state.lock().await;
        std::mem::take(&mut st.best)
    }
}
