//! Nearby Search - proximity search coordinators
//!
//! Two strategies over the same [`nearby_store::SpatialStore`] port:
//!
//! - [`SequentialExpander`] resolves a point to its nearest postcode by
//!   scanning a doubling box, one query at a time, stopping at the first hit.
//! - [`QuorumSearchCoordinator`] finds proximity-ranked listings by racing
//!   one query per ring size and adopting the best result set as soon as any
//!   completion pushes it past the requested count.

pub mod expander;
pub mod quorum;

pub use expander::SequentialExpander;
pub use quorum::QuorumSearchCoordinator;
