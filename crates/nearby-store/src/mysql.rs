//! MySQL spatial store backend.
//!
//! A thin adapter over the platform's MySQL schema: `jobs` for listings,
//! `locations` joined to `locations_spatial` for postcodes and areas. The
//! heavy lifting (containment against the spatial index, `ST_Distance`,
//! `ST_Area`, ordering, limiting) happens server-side, which is the whole
//! point: each ring query fetches at most `limit` ranked rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nearby_core::error::{NearbyError, Result};
use nearby_core::models::{Candidate, ContainmentQuery, RankOrder, RecordKind};
use sqlx::mysql::MySqlPool;
use sqlx::Row;

use crate::ports::SpatialStore;

/// SRID of the stored geometry columns.
pub const SRID: u32 = 3857;

/// MySQL implementation of [`SpatialStore`].
#[derive(Debug, Clone)]
pub struct MySqlSpatialStore {
    pool: MySqlPool,
}

impl MySqlSpatialStore {
    /// Wrap an existing connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Connect to the given database URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(url)
            .await
            .map_err(|e| NearbyError::Store { reason: format!("connect failed: {e}") })?;
        Ok(Self { pool })
    }
}

/// `ST_SRID(POLYGON(LINESTRING(...)), SRID)` with one `POINT(?, ?)`
/// placeholder pair per ring vertex. Callers bind lng, lat for each of the
/// five vertices in ring order.
fn polygon_expr() -> String {
    format!(
        "ST_SRID(POLYGON(LINESTRING(POINT(?, ?), POINT(?, ?), POINT(?, ?), POINT(?, ?), POINT(?, ?))), {SRID})"
    )
}

fn order_clause(order: RankOrder) -> &'static str {
    match order {
        RankOrder::NearestWins => "dist ASC, area ASC",
        RankOrder::BestThenNearest => "relevance DESC, dist ASC, posted_at DESC",
    }
}

#[async_trait]
impl SpatialStore for MySqlSpatialStore {
    async fn containment_query(&self, query: &ContainmentQuery) -> Result<Vec<Candidate>> {
        match query.predicate.kind {
            Some(RecordKind::Postcode) | Some(RecordKind::Area) => {
                self.location_query(query).await
            }
            _ => self.job_query(query).await,
        }
    }
}

impl MySqlSpatialStore {
    async fn job_query(&self, query: &ContainmentQuery) -> Result<Vec<Candidate>> {
        let poly = polygon_expr();
        let mut sql = format!(
            "SELECT jobs.id, jobs.title AS name, \
             ST_Y(ST_Centroid(jobs.geometry)) AS lat, ST_X(ST_Centroid(jobs.geometry)) AS lng, \
             jobs.cpc * jobs.clickability AS relevance, jobs.category, jobs.posted_at, \
             ST_Distance(jobs.geometry, ST_SRID(POINT(?, ?), {SRID})) AS dist, \
             CASE WHEN ST_Dimension(jobs.geometry) < 2 THEN 0 ELSE ST_Area(jobs.geometry) END AS area \
             FROM jobs \
             WHERE ST_Within(jobs.geometry, {poly})"
        );

        let p = &query.predicate;
        if p.max_area_ratio.is_some() {
            sql.push_str(&format!(
                " AND (ST_Dimension(jobs.geometry) < 2 OR ST_Area(jobs.geometry) / ST_Area({poly}) < ?)"
            ));
        }
        if p.min_relevance.is_some() {
            sql.push_str(" AND jobs.cpc >= ?");
        }
        if p.visible_only {
            sql.push_str(" AND jobs.visible = 1");
        }
        if p.category.is_some() {
            sql.push_str(" AND jobs.category REGEXP ?");
        }
        sql.push_str(&format!(" ORDER BY {} LIMIT ?", order_clause(query.order)));

        let mut q = sqlx::query(&sql).bind(query.origin.lng).bind(query.origin.lat);
        for v in query.bounds.ring() {
            q = q.bind(v.lng).bind(v.lat);
        }
        if let Some(ratio) = p.max_area_ratio {
            for v in query.bounds.ring() {
                q = q.bind(v.lng).bind(v.lat);
            }
            q = q.bind(ratio);
        }
        if let Some(min) = p.min_relevance {
            q = q.bind(min);
        }
        if let Some(category) = &p.category {
            // Categories are a semicolon-separated list; match any segment
            // starting with the (already sanitized) prefix.
            q = q.bind(format!("(^|;){category}"));
        }
        q = q.bind(query.limit as u64);

        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| NearbyError::Store { reason: format!("job query failed: {e}") })?;

        rows.iter()
            .map(|row| {
                Ok(Candidate {
                    id: row.try_get("id").map_err(store_err)?,
                    name: row.try_get("name").map_err(store_err)?,
                    kind: RecordKind::Job,
                    lat: row.try_get("lat").map_err(store_err)?,
                    lng: row.try_get("lng").map_err(store_err)?,
                    relevance: row.try_get("relevance").map_err(store_err)?,
                    category: row.try_get::<Option<String>, _>("category").map_err(store_err)?,
                    posted_at: row
                        .try_get::<Option<DateTime<Utc>>, _>("posted_at")
                        .map_err(store_err)?,
                    ambit: 0.0,
                    distance: row.try_get("dist").map_err(store_err)?,
                    area: row.try_get("area").map_err(store_err)?,
                })
            })
            .collect()
    }

    async fn location_query(&self, query: &ContainmentQuery) -> Result<Vec<Candidate>> {
        let poly = polygon_expr();
        let kind = query.predicate.kind.unwrap_or(RecordKind::Postcode);
        let type_name = match kind {
            RecordKind::Postcode => "Postcode",
            RecordKind::Area => "Area",
            RecordKind::Job => unreachable!("job queries are dispatched separately"),
        };

        // Envelope containment keeps the spatial index effective; ranking
        // then uses the true geometry.
        let sql = format!(
            "SELECT l1.id, l1.name, CAST(l1.lat AS DOUBLE) AS lat, CAST(l1.lng AS DOUBLE) AS lng, \
             ST_Distance(locations_spatial.geometry, ST_SRID(POINT(?, ?), {SRID})) AS dist, \
             CASE WHEN ST_Dimension(locations_spatial.geometry) < 2 THEN 0 ELSE ST_Area(locations_spatial.geometry) END AS area \
             FROM locations_spatial \
             INNER JOIN locations l1 ON l1.id = locations_spatial.locationid \
             WHERE MBRContains(ST_Envelope({poly}), locations_spatial.geometry) \
             AND l1.type = ? \
             ORDER BY {} LIMIT ?",
            order_clause(query.order)
        );

        let mut q = sqlx::query(&sql).bind(query.origin.lng).bind(query.origin.lat);
        for v in query.bounds.ring() {
            q = q.bind(v.lng).bind(v.lat);
        }
        q = q.bind(type_name).bind(query.limit as u64);

        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| NearbyError::Store { reason: format!("location query failed: {e}") })?;

        rows.iter()
            .map(|row| {
                Ok(Candidate {
                    id: row.try_get("id").map_err(store_err)?,
                    name: row.try_get("name").map_err(store_err)?,
                    kind,
                    lat: row.try_get("lat").map_err(store_err)?,
                    lng: row.try_get("lng").map_err(store_err)?,
                    relevance: 0.0,
                    category: None,
                    posted_at: None,
                    ambit: 0.0,
                    distance: row.try_get("dist").map_err(store_err)?,
                    area: row.try_get("area").map_err(store_err)?,
                })
            })
            .collect()
    }
}

fn store_err(e: sqlx::Error) -> NearbyError {
    NearbyError::Store { reason: format!("row decode failed: {e}") }
}
