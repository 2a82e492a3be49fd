use async_trait::async_trait;
use nearby_core::error::Result;
use nearby_core::models::{Candidate, ContainmentQuery};

/// Port for spatial containment queries.
///
/// One logical operation: select rows whose geometry lies within a bounding
/// polygon, filtered by the query's predicate, ranked and limited by the
/// store itself. Distance and area are computed server-side; callers never
/// re-rank what comes back.
#[async_trait]
pub trait SpatialStore: Send + Sync {
    /// Execute a containment query and return ranked candidates.
    ///
    /// Wide boxes can be slow; callers that care wrap this in their own
    /// deadline.
    async fn containment_query(&self, query: &ContainmentQuery) -> Result<Vec<Candidate>>;
}
