//! Domain model types for proximity search.
//!
//! The engine resolves two kinds of questions: "which postcode is this point
//! in?" and "which listings are worth showing near this point?". Both are
//! answered by containment queries against a spatial store; the types here are
//! the vocabulary of those queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A geographic coordinate (WGS84-style lat/lng, stored SRID 3857).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
}

impl Point {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// `(0, 0)` is the platform's sentinel for "location unknown". Searching
    /// around it would scan the whole planet, so callers short-circuit on it.
    pub fn is_unknown(&self) -> bool {
        self.lat == 0.0 && self.lng == 0.0
    }
}

/// An axis-aligned query box, stored as its four corners.
///
/// Constructed by [`crate::geo::bounding_box`]; consumed by the store as a
/// five-point closed ring (SW first, anticlockwise, SW repeated to close).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub sw: Point,
    pub nw: Point,
    pub ne: Point,
    pub se: Point,
}

impl BoundingBox {
    /// The closed five-point ring, in the vertex order the store expects.
    pub fn ring(&self) -> [Point; 5] {
        [self.sw, self.nw, self.ne, self.se, self.sw]
    }

    /// Convert to a `geo` polygon (x = lng, y = lat) for client-side
    /// containment and area computation.
    pub fn to_polygon(&self) -> geo::Polygon<f64> {
        let coords: Vec<geo::Coord<f64>> =
            self.ring().iter().map(|p| geo::Coord { x: p.lng, y: p.lat }).collect();
        geo::Polygon::new(geo::LineString::new(coords), vec![])
    }
}

/// The kind of row a search is interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    /// A postcode point (or occasionally a small polygon).
    Postcode,
    /// A named area polygon enclosing many postcodes.
    Area,
    /// A job listing placed at or around a location.
    Job,
}

/// Row-level filters applied inside a containment query.
///
/// These are the only business rules the engine knows about; anything beyond
/// (spam, per-user visibility) belongs to the layers above.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Predicate {
    /// Restrict to one kind of record.
    pub kind: Option<RecordKind>,
    /// Drop rows whose relevance score is below this value.
    pub min_relevance: Option<f64>,
    /// Drop rows not flagged visible.
    pub visible_only: bool,
    /// Restrict to categories starting with this (sanitized) prefix.
    pub category: Option<String>,
    /// Drop polygon rows whose area exceeds this multiple of the query box
    /// area. Point-like rows always pass. Excludes coarse enclosing
    /// geometries (a county polygon is never a useful "nearby" match).
    pub max_area_ratio: Option<f64>,
}

impl Predicate {
    /// The postcode-resolution predicate: postcodes only.
    pub fn postcodes() -> Self {
        Self { kind: Some(RecordKind::Postcode), ..Self::default() }
    }

    /// The job-search predicate: visible jobs above a minimum relevance, with
    /// the coarse-geometry guard.
    pub fn jobs(min_relevance: f64) -> Self {
        Self {
            kind: Some(RecordKind::Job),
            min_relevance: Some(min_relevance),
            visible_only: true,
            max_area_ratio: Some(2.0),
            ..Self::default()
        }
    }

    /// Set a category filter, sanitized first. An empty result after
    /// sanitization means "any category".
    pub fn with_category(mut self, category: &str) -> Self {
        let clean = sanitize_category(category);
        self.category = if clean.is_empty() { None } else { Some(clean) };
        self
    }
}

/// Strip everything except letters, space and forward slash from a category
/// string. Categories are caller-supplied free text that ends up inside store
/// queries, so the character set is a strict allowlist.
pub fn sanitize_category(category: &str) -> String {
    category.chars().filter(|c| c.is_ascii_alphabetic() || *c == ' ' || *c == '/').collect()
}

/// The total order the store applies to each query's results.
///
/// Ranking is computed store-side; the coordinators never re-rank (re-ranking
/// client-side would require fetching unranked full ring contents, defeating
/// the per-ring limit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankOrder {
    /// Distance ascending, then geometry area ascending. Used by postcode
    /// resolution: prefers a precise postcode point over an enclosing area
    /// polygon at equal distance.
    NearestWins,
    /// Relevance descending, then distance ascending, then posted-at
    /// descending. Used by job search: better-paying jobs are worth showing a
    /// bit further away.
    BestThenNearest,
}

impl RankOrder {
    /// Compare two candidates under this order.
    pub fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
        match self {
            RankOrder::NearestWins => total_cmp(a.distance, b.distance)
                .then_with(|| total_cmp(a.area, b.area)),
            RankOrder::BestThenNearest => total_cmp(b.relevance, a.relevance)
                .then_with(|| total_cmp(a.distance, b.distance))
                .then_with(|| b.posted_at.cmp(&a.posted_at)),
        }
    }
}

fn total_cmp(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

/// One containment query: everything the store needs to select, rank and
/// limit rows inside a bounding polygon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainmentQuery {
    /// The point distances are measured from.
    pub origin: Point,
    pub bounds: BoundingBox,
    pub predicate: Predicate,
    pub order: RankOrder,
    pub limit: usize,
}

/// A domain row annotated with the store's server-computed ranking fields.
///
/// `distance` and `area` are read-only outputs of the query; the search
/// coordinators never mutate them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: u64,
    pub name: String,
    pub kind: RecordKind,
    pub lat: f64,
    pub lng: f64,
    /// Domain relevance score (for jobs, cost-per-click times clickability).
    pub relevance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<DateTime<Utc>>,
    /// The ring radius that produced this row, stamped by the quorum search.
    pub ambit: f64,
    /// Distance from the query origin to the row's geometry.
    pub distance: f64,
    /// 0 for point-like geometries, else the polygon area.
    pub area: f64,
}
