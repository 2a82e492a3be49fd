//! In-memory spatial store for development and testing.
//!
//! Containment, distance and area are computed with the `geo` crate instead
//! of in SQL, but the observable contract matches the MySQL backend: ranked,
//! limited candidates with server-computed distance and area.
//!
//! This implementation uses `RwLock::unwrap()` intentionally. Lock poisoning
//! only occurs when another thread panicked while holding the lock, which is
//! an unrecoverable state. For production workloads, use the MySQL backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use geo::algorithm::centroid::Centroid;
use geo::algorithm::contains::Contains;
use geo::{Area, Distance, Geometry as GeoGeometry, Haversine, Point as GeoPoint};
use nearby_core::error::Result;
use nearby_core::models::{Candidate, ContainmentQuery, RecordKind};
use std::sync::{Arc, RwLock};

use crate::ports::SpatialStore;

/// A domain row as the backing store holds it, before any query annotates it
/// with distance or area.
#[derive(Debug, Clone)]
pub struct Record {
    pub id: u64,
    pub name: String,
    pub kind: RecordKind,
    /// Row geometry, x = lng, y = lat.
    pub geometry: GeoGeometry<f64>,
    pub relevance: f64,
    pub visible: bool,
    /// Semicolon-separated category list, as the jobs feed supplies it.
    pub category: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
}

impl Record {
    /// A point-like record with no job fields set.
    pub fn point(id: u64, name: &str, kind: RecordKind, lat: f64, lng: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind,
            geometry: GeoGeometry::Point(GeoPoint::new(lng, lat)),
            relevance: 0.0,
            visible: true,
            category: None,
            posted_at: None,
        }
    }
}

/// In-memory implementation of [`SpatialStore`].
#[derive(Debug, Clone, Default)]
pub struct MemorySpatialStore {
    records: Arc<RwLock<Vec<Record>>>,
}

impl MemorySpatialStore {
    /// Create a new, empty in-memory spatial store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record.
    pub fn store_record(&self, record: Record) {
        self.records.write().unwrap().push(record);
    }

    /// Add a batch of records.
    pub fn store_records(&self, records: impl IntoIterator<Item = Record>) {
        self.records.write().unwrap().extend(records);
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().unwrap().is_empty()
    }
}

#[async_trait]
impl SpatialStore for MemorySpatialStore {
    async fn containment_query(&self, query: &ContainmentQuery) -> Result<Vec<Candidate>> {
        let bounds = GeoGeometry::Polygon(query.bounds.to_polygon());
        let box_area = bounds.unsigned_area();
        let origin = GeoPoint::new(query.origin.lng, query.origin.lat);

        let records = self.records.read().unwrap();

        let mut candidates: Vec<Candidate> = records
            .iter()
            .filter(|r| matches_predicate(r, query))
            .filter(|r| bounds.contains(&r.geometry))
            .filter_map(|r| annotate(r, origin, box_area, query))
            .collect();

        candidates.sort_by(|a, b| query.order.compare(a, b));
        candidates.truncate(query.limit);

        Ok(candidates)
    }
}

fn matches_predicate(record: &Record, query: &ContainmentQuery) -> bool {
    let p = &query.predicate;

    if let Some(kind) = p.kind {
        if record.kind != kind {
            return false;
        }
    }

    if p.visible_only && !record.visible {
        return false;
    }

    if let Some(min) = p.min_relevance {
        if record.relevance < min {
            return false;
        }
    }

    if let Some(prefix) = &p.category {
        if !category_matches(record.category.as_deref(), prefix) {
            return false;
        }
    }

    true
}

/// A record matches a category prefix if any segment of its semicolon-separated
/// category list starts with it.
fn category_matches(category: Option<&str>, prefix: &str) -> bool {
    match category {
        Some(list) => list.split(';').any(|segment| segment.trim().starts_with(prefix)),
        None => false,
    }
}

/// Compute the ranking annotations, applying the coarse-geometry guard.
fn annotate(
    record: &Record,
    origin: GeoPoint<f64>,
    box_area: f64,
    query: &ContainmentQuery,
) -> Option<Candidate> {
    let centroid = record.geometry.centroid()?;
    let distance = Haversine.distance(origin, centroid);
    let area = record.geometry.unsigned_area();

    if let Some(max_ratio) = query.predicate.max_area_ratio {
        // Point-like rows always pass; polygons may not dwarf the query box.
        if area > 0.0 && (box_area <= 0.0 || area / box_area >= max_ratio) {
            return None;
        }
    }

    Some(Candidate {
        id: record.id,
        name: record.name.clone(),
        kind: record.kind,
        lat: centroid.y(),
        lng: centroid.x(),
        relevance: record.relevance,
        category: record.category.clone(),
        posted_at: record.posted_at,
        ambit: 0.0,
        distance,
        area,
    })
}
