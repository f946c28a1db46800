//! Inbound payload shapes and their validation.
//!
//! The `*Create` structs mirror what clients send; `validate` turns them into the
//! `New*` values the repository accepts, so nothing unchecked reaches storage.

use crate::error::CoreError;
use crate::structs::{Coordinates, REPORT_STATUS_FULL};
use serde::Deserialize;

/// Body of `POST /api/bins`.
#[derive(Debug, Clone, Deserialize)]
pub struct BinCreate {
    pub location: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// A validated bin registration.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBin {
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl NewBin {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

impl BinCreate {
    pub fn validate(self) -> Result<NewBin, CoreError> {
        let location = self.location.trim();
        if location.is_empty() {
            return Err(CoreError::invalid("location", "must not be empty"));
        }
        if let Some(latitude) = self.latitude {
            check_range("latitude", latitude, 90.0)?;
        }
        if let Some(longitude) = self.longitude {
            check_range("longitude", longitude, 180.0)?;
        }

        Ok(NewBin {
            location: location.to_string(),
            latitude: self.latitude,
            longitude: self.longitude,
        })
    }
}

fn check_range(field: &str, value: f64, limit: f64) -> Result<(), CoreError> {
    if !value.is_finite() || value.abs() > limit {
        return Err(CoreError::invalid(
            field,
            format!("must be between -{limit} and {limit}"),
        ));
    }
    Ok(())
}

/// Body of `POST /api/reports`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportCreate {
    pub bin_id: i32,
    #[serde(default)]
    pub status: Option<String>,
}

/// A validated report submission.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub bin_id: i32,
    pub status: String,
}

impl ReportCreate {
    pub fn validate(self) -> Result<NewReport, CoreError> {
        let status = match self.status {
            Some(status) => {
                let status = status.trim();
                if status.is_empty() {
                    return Err(CoreError::invalid("status", "must not be empty"));
                }
                status.to_string()
            }
            None => REPORT_STATUS_FULL.to_string(),
        };

        Ok(NewReport {
            bin_id: self.bin_id,
            status,
        })
    }
}
