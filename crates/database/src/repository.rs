use crate::DbError;
use async_trait::async_trait;
use core_types::{Bin, Coordinates, NewBin, NewReport, Report, REPORT_STATUS_DONE};
use sqlx::postgres::{PgPool, Postgres};
use sqlx::{PgExecutor, Transaction};

/// Storage capabilities for bins.
///
/// Implementations must keep `location` unique and must never overwrite a
/// coordinate that is already set.
#[async_trait]
pub trait BinRepository: Send + Sync {
    /// Inserts a new bin. Fails with [`DbError::DuplicateLocation`] if the location is taken.
    async fn insert_bin(&self, bin: &NewBin) -> Result<Bin, DbError>;

    async fn get_bin(&self, bin_id: i32) -> Result<Option<Bin>, DbError>;

    async fn get_bin_by_location(&self, location: &str) -> Result<Option<Bin>, DbError>;

    /// All bins, newest id first.
    async fn get_all_bins(&self) -> Result<Vec<Bin>, DbError>;

    /// Fills in whichever of the bin's coordinates are still null.
    async fn update_bin_coordinates(
        &self,
        bin_id: i32,
        coordinates: Coordinates,
    ) -> Result<Bin, DbError>;

    /// Registers a bin by location: inserts it if the location is new, otherwise
    /// back-fills the existing bin's missing coordinates and returns it.
    async fn upsert_bin(&self, bin: &NewBin) -> Result<Bin, DbError>;

    /// Deletes a bin and, through the cascade, all of its reports.
    /// Returns `false` if no bin had that id.
    async fn delete_bin(&self, bin_id: i32) -> Result<bool, DbError>;
}

/// Storage capabilities for reports.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Inserts a report stamped with the server time. Fails with
    /// [`DbError::NotFound`] if the referenced bin does not exist.
    async fn insert_report(&self, report: &NewReport) -> Result<Report, DbError>;

    async fn get_report(&self, report_id: i32) -> Result<Option<Report>, DbError>;

    /// All reports, most recently created first.
    async fn get_all_reports(&self) -> Result<Vec<Report>, DbError>;

    /// The reports of one bin, most recently created first.
    async fn get_reports_for_bin(&self, bin_id: i32) -> Result<Vec<Report>, DbError>;

    /// Marks a report as done and stamps `cleared_at`, whatever its current state.
    /// Returns `None` if no report had that id.
    async fn clear_report(&self, report_id: i32) -> Result<Option<Report>, DbError>;
}

/// Everything the HTTP handlers need from storage.
pub trait Repository: BinRepository + ReportRepository {}

impl<T: BinRepository + ReportRepository> Repository for T {}

/// The PostgreSQL implementation of the repository traits.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Writes the merged coordinates. `COALESCE` keeps already-set values even if the
/// caller passes different ones.
async fn set_missing_coordinates<'e, E>(
    executor: E,
    bin_id: i32,
    coordinates: Coordinates,
) -> Result<Option<Bin>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Bin>(
        r#"
        UPDATE bins
        SET latitude = COALESCE(latitude, $2), longitude = COALESCE(longitude, $3)
        WHERE id = $1
        RETURNING id, location, latitude, longitude
        "#,
    )
    .bind(bin_id)
    .bind(coordinates.latitude)
    .bind(coordinates.longitude)
    .fetch_optional(executor)
    .await
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

#[async_trait]
impl BinRepository for DbRepository {
    async fn insert_bin(&self, bin: &NewBin) -> Result<Bin, DbError> {
        sqlx::query_as::<_, Bin>(
            r#"
            INSERT INTO bins (location, latitude, longitude)
            VALUES ($1, $2, $3)
            RETURNING id, location, latitude, longitude
            "#,
        )
        .bind(&bin.location)
        .bind(bin.latitude)
        .bind(bin.longitude)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DbError::DuplicateLocation(bin.location.clone())
            } else {
                e.into()
            }
        })
    }

    async fn get_bin(&self, bin_id: i32) -> Result<Option<Bin>, DbError> {
        let bin = sqlx::query_as::<_, Bin>(
            "SELECT id, location, latitude, longitude FROM bins WHERE id = $1",
        )
        .bind(bin_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(bin)
    }

    async fn get_bin_by_location(&self, location: &str) -> Result<Option<Bin>, DbError> {
        let bin = sqlx::query_as::<_, Bin>(
            "SELECT id, location, latitude, longitude FROM bins WHERE location = $1",
        )
        .bind(location)
        .fetch_optional(&self.pool)
        .await?;
        Ok(bin)
    }

    async fn get_all_bins(&self) -> Result<Vec<Bin>, DbError> {
        let bins = sqlx::query_as::<_, Bin>(
            "SELECT id, location, latitude, longitude FROM bins ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(bins)
    }

    async fn update_bin_coordinates(
        &self,
        bin_id: i32,
        coordinates: Coordinates,
    ) -> Result<Bin, DbError> {
        set_missing_coordinates(&self.pool, bin_id, coordinates)
            .await?
            .ok_or(DbError::NotFound)
    }

    /// Runs in one transaction. The `UNIQUE` constraint on `location` together with
    /// `ON CONFLICT DO NOTHING` means two concurrent registrations of a new location
    /// produce a single row; the loser then locks that row and back-fills it.
    async fn upsert_bin(&self, bin: &NewBin) -> Result<Bin, DbError> {
        let mut tx: Transaction<Postgres> = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, Bin>(
            r#"
            INSERT INTO bins (location, latitude, longitude)
            VALUES ($1, $2, $3)
            ON CONFLICT (location) DO NOTHING
            RETURNING id, location, latitude, longitude
            "#,
        )
        .bind(&bin.location)
        .bind(bin.latitude)
        .bind(bin.longitude)
        .fetch_optional(&mut *tx)
        .await?;

        let stored = match inserted {
            Some(created) => {
                tracing::info!(bin_id = created.id, location = %created.location, "Registered new bin.");
                created
            }
            None => {
                let existing = sqlx::query_as::<_, Bin>(
                    "SELECT id, location, latitude, longitude FROM bins WHERE location = $1 FOR UPDATE",
                )
                .bind(&bin.location)
                .fetch_one(&mut *tx)
                .await?;

                match existing.coordinate_backfill(bin.coordinates()) {
                    Some(merged) => {
                        tracing::info!(bin_id = existing.id, "Back-filling bin coordinates.");
                        set_missing_coordinates(&mut *tx, existing.id, merged)
                            .await?
                            .ok_or(DbError::NotFound)?
                    }
                    None => existing,
                }
            }
        };

        tx.commit().await?;
        Ok(stored)
    }

    async fn delete_bin(&self, bin_id: i32) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM bins WHERE id = $1")
            .bind(bin_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ReportRepository for DbRepository {
    async fn insert_report(&self, report: &NewReport) -> Result<Report, DbError> {
        sqlx::query_as::<_, Report>(
            r#"
            INSERT INTO reports (bin_id, status, created_at)
            VALUES ($1, $2, NOW())
            RETURNING id, bin_id, status, created_at, cleared_at
            "#,
        )
        .bind(report.bin_id)
        .bind(&report.status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                DbError::NotFound
            } else {
                e.into()
            }
        })
    }

    async fn get_report(&self, report_id: i32) -> Result<Option<Report>, DbError> {
        let report = sqlx::query_as::<_, Report>(
            "SELECT id, bin_id, status, created_at, cleared_at FROM reports WHERE id = $1",
        )
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(report)
    }

    async fn get_all_reports(&self) -> Result<Vec<Report>, DbError> {
        let reports = sqlx::query_as::<_, Report>(
            "SELECT id, bin_id, status, created_at, cleared_at FROM reports ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(reports)
    }

    async fn get_reports_for_bin(&self, bin_id: i32) -> Result<Vec<Report>, DbError> {
        let reports = sqlx::query_as::<_, Report>(
            r#"
            SELECT id, bin_id, status, created_at, cleared_at
            FROM reports
            WHERE bin_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(bin_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reports)
    }

    async fn clear_report(&self, report_id: i32) -> Result<Option<Report>, DbError> {
        let report = sqlx::query_as::<_, Report>(
            r#"
            UPDATE reports
            SET status = $2, cleared_at = NOW()
            WHERE id = $1
            RETURNING id, bin_id, status, created_at, cleared_at
            "#,
        )
        .bind(report_id)
        .bind(REPORT_STATUS_DONE)
        .fetch_optional(&self.pool)
        .await?;
        Ok(report)
    }
}
