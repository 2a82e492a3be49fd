//! Sequential nearest-match search.
//!
//! Resolves a point to its nearest postcode. Postcodes are dense where people
//! are, so the first box is about two metres across and usually hits; where
//! it misses, the box doubles until something turns up or the ceiling says
//! there is nothing sensible nearby. Small boxes keep the store's spatial
//! index fast in dense areas, and the misses in sparse areas are cheap
//! precisely because their boxes are small.

use nearby_core::config::SearchConfig;
use nearby_core::geo::{bounding_box, BoxMode};
use nearby_core::models::{Candidate, ContainmentQuery, Point, Predicate, RankOrder};
use nearby_store::SpatialStore;

/// Drives the expanding-box nearest-match search.
pub struct SequentialExpander<S> {
    store: S,
    config: SearchConfig,
}

impl<S: SpatialStore> SequentialExpander<S> {
    pub fn new(store: S, config: SearchConfig) -> Self {
        Self { store, config }
    }

    /// Find the single nearest row matching `predicate`, or `None` if nothing
    /// matches within the scan ceiling.
    ///
    /// Fully sequential and deterministic given a deterministic store. A
    /// store failure counts as an empty box and the scan keeps widening; the
    /// caller cannot tell the difference, by design. The `(0, 0)` sentinel
    /// origin short-circuits before any store call.
    pub async fn find_nearest(&self, origin: Point, predicate: &Predicate) -> Option<Candidate> {
        if origin.is_unknown() {
            return None;
        }

        let mut scan = self.config.seed_scan;

        loop {
            let query = ContainmentQuery {
                origin,
                bounds: bounding_box(origin, scan, BoxMode::Planar),
                predicate: predicate.clone(),
                order: RankOrder::NearestWins,
                limit: 1,
            };

            let rows = match self.store.containment_query(&query).await {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::warn!(scan, error = %e, "nearest-match scan query failed");
                    Vec::new()
                }
            };

            if let Some(first) = rows.into_iter().next() {
                return Some(first);
            }

            // Each widened box strictly contains the previous one, so nothing
            // already searched is ever lost on the way out.
            scan *= 2.0;

            if scan > self.config.max_scan {
                return None;
            }
        }
    }
}
