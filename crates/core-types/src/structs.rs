use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Status given to a report when the client does not supply one.
pub const REPORT_STATUS_FULL: &str = "full";
/// Status of a report once it has been cleared.
pub const REPORT_STATUS_DONE: &str = "done";

/// A physical collection point. Rows of the `bins` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Bin {
    pub id: i32,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// The nullable coordinate pair of a bin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Bin {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// Computes the coordinates this bin should have after merging `candidate` into it.
    ///
    /// Only absent values are filled in; a coordinate that is already set is never
    /// overwritten. Returns `None` when nothing would change, so callers can skip the write.
    pub fn coordinate_backfill(&self, candidate: Coordinates) -> Option<Coordinates> {
        let merged = Coordinates {
            latitude: self.latitude.or(candidate.latitude),
            longitude: self.longitude.or(candidate.longitude),
        };
        if merged == self.coordinates() {
            None
        } else {
            Some(merged)
        }
    }
}

/// One fullness/status observation against a bin. Rows of the `reports` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Report {
    pub id: i32,
    pub bin_id: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub cleared_at: Option<DateTime<Utc>>,
}

/// A bin together with every report filed against it, as returned by `GET /api/bins/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinWithReports {
    #[serde(flatten)]
    pub bin: Bin,
    pub reports: Vec<Report>,
}
