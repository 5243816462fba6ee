use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// One recorded visit (page view or QR scan).
#[derive(Debug, Clone)]
pub struct VisitRecord {
    pub timestamp: DateTime<Utc>,
    pub ip_address: String,
    pub country: String,
    pub city: String,
    pub device: String,
    pub browser: String,
    pub referrer: String,
    pub user_agent: String,
    pub source: String,
    pub path: String,
}

/// A (label, count) aggregation bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountBucket {
    pub label: String,
    pub count: i64,
}

/// Aggregated visit statistics for a date range.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsStats {
    pub total_visits: i64,
    pub unique_visitors: i64,
    pub qr_scans: i64,
    pub visits_by_source: Vec<CountBucket>,
    pub visits_by_country: Vec<CountBucket>,
    pub visits_by_device: Vec<CountBucket>,
    pub visits_by_browser: Vec<CountBucket>,
}

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Initialize database connection and create tables
    pub fn new(database_path: &str) -> Result<Self> {
        let conn = Connection::open(database_path)
            .context(format!("Failed to open database at {}", database_path))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS visits (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                ip_address TEXT NOT NULL,
                country TEXT NOT NULL,
                city TEXT NOT NULL,
                device TEXT NOT NULL,
                browser TEXT NOT NULL,
                referrer TEXT NOT NULL,
                user_agent TEXT NOT NULL,
                source TEXT NOT NULL,
                path TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create visits table")?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_visits_timestamp ON visits (timestamp)",
            [],
        )
        .context("Failed to create visits timestamp index")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Record a visit. Returns the new row id.
    pub fn create_visit(&self, record: &VisitRecord) -> Result<i64> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO visits (timestamp, ip_address, country, city, device, browser, referrer, user_agent, source, path)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.timestamp.to_rfc3339(),
                record.ip_address,
                record.country,
                record.city,
                record.device,
                record.browser,
                record.referrer,
                record.user_agent,
                record.source,
                record.path,
            ],
        )
        .context("Failed to insert visit")?;

        Ok(conn.last_insert_rowid())
    }

    /// Aggregate visit statistics over [start, end).
    pub fn visit_stats(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<AnalyticsStats> {
        let conn = self.conn.lock().unwrap();
        let start = start.to_rfc3339();
        let end = end.to_rfc3339();

        let total_visits: i64 = conn.query_row(
            "SELECT COUNT(*) FROM visits WHERE timestamp >= ?1 AND timestamp < ?2",
            params![start, end],
            |row| row.get(0),
        )?;

        let unique_visitors: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT ip_address) FROM visits WHERE timestamp >= ?1 AND timestamp < ?2",
            params![start, end],
            |row| row.get(0),
        )?;

        let qr_scans: i64 = conn.query_row(
            "SELECT COUNT(*) FROM visits WHERE timestamp >= ?1 AND timestamp < ?2 AND source LIKE 'qr-%'",
            params![start, end],
            |row| row.get(0),
        )?;

        Ok(AnalyticsStats {
            total_visits,
            unique_visitors,
            qr_scans,
            visits_by_source: count_by(&conn, "source", &start, &end)?,
            visits_by_country: count_by(&conn, "country", &start, &end)?,
            visits_by_device: count_by(&conn, "device", &start, &end)?,
            visits_by_browser: count_by(&conn, "browser", &start, &end)?,
        })
    }

    /// Total number of recorded visits (all time)
    pub fn visit_count(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM visits", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Count visits grouped by one column, descending. The column name comes
/// from a fixed internal list, never from request input.
fn count_by(
    conn: &Connection,
    column: &str,
    start: &str,
    end: &str,
) -> Result<Vec<CountBucket>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {column}, COUNT(*) AS n FROM visits
         WHERE timestamp >= ?1 AND timestamp < ?2
         GROUP BY {column}
         ORDER BY n DESC, {column} ASC"
    ))?;

    let buckets = stmt
        .query_map(params![start, end], |row| {
            Ok(CountBucket {
                label: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(buckets)
}
