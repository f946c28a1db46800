//! Test doubles for driving the router without PostgreSQL.

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use chrono::Utc;
use core_types::{Bin, Coordinates, NewBin, NewReport, Report, REPORT_STATUS_DONE};
use database::{BinRepository, DbError, ReportRepository};
use notifier::{Notifier, ReportNotification, error::NotifierError};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use web_server::{AppState, router};

#[derive(Default)]
struct Tables {
    bins: Vec<Bin>,
    reports: Vec<Report>,
    next_bin_id: i32,
    next_report_id: i32,
}

/// Keeps bins and reports in memory with the same rules as the PostgreSQL schema:
/// unique locations, no coordinate overwrites, and cascading deletes.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: Mutex<Tables>,
}

impl InMemoryRepository {
    pub fn report_count(&self) -> usize {
        self.tables.lock().unwrap().reports.len()
    }
}

fn merge(bin: &mut Bin, coordinates: Coordinates) {
    bin.latitude = bin.latitude.or(coordinates.latitude);
    bin.longitude = bin.longitude.or(coordinates.longitude);
}

fn newest_first(reports: &mut [Report]) {
    reports.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
}

#[async_trait]
impl BinRepository for InMemoryRepository {
    async fn insert_bin(&self, bin: &NewBin) -> Result<Bin, DbError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.bins.iter().any(|b| b.location == bin.location) {
            return Err(DbError::DuplicateLocation(bin.location.clone()));
        }
        tables.next_bin_id += 1;
        let created = Bin {
            id: tables.next_bin_id,
            location: bin.location.clone(),
            latitude: bin.latitude,
            longitude: bin.longitude,
        };
        tables.bins.push(created.clone());
        Ok(created)
    }

    async fn get_bin(&self, bin_id: i32) -> Result<Option<Bin>, DbError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.bins.iter().find(|b| b.id == bin_id).cloned())
    }

    async fn get_bin_by_location(&self, location: &str) -> Result<Option<Bin>, DbError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.bins.iter().find(|b| b.location == location).cloned())
    }

    async fn get_all_bins(&self) -> Result<Vec<Bin>, DbError> {
        let mut bins = self.tables.lock().unwrap().bins.clone();
        bins.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(bins)
    }

    async fn update_bin_coordinates(
        &self,
        bin_id: i32,
        coordinates: Coordinates,
    ) -> Result<Bin, DbError> {
        let mut tables = self.tables.lock().unwrap();
        let bin = tables
            .bins
            .iter_mut()
            .find(|b| b.id == bin_id)
            .ok_or(DbError::NotFound)?;
        merge(bin, coordinates);
        Ok(bin.clone())
    }

    async fn upsert_bin(&self, bin: &NewBin) -> Result<Bin, DbError> {
        let existing = self.get_bin_by_location(&bin.location).await?;
        match existing {
            None => self.insert_bin(bin).await,
            Some(existing) => match existing.coordinate_backfill(bin.coordinates()) {
                Some(merged) => self.update_bin_coordinates(existing.id, merged).await,
                None => Ok(existing),
            },
        }
    }

    async fn delete_bin(&self, bin_id: i32) -> Result<bool, DbError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.bins.len();
        tables.bins.retain(|b| b.id != bin_id);
        tables.reports.retain(|r| r.bin_id != bin_id);
        Ok(tables.bins.len() != before)
    }
}

#[async_trait]
impl ReportRepository for InMemoryRepository {
    async fn insert_report(&self, report: &NewReport) -> Result<Report, DbError> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.bins.iter().any(|b| b.id == report.bin_id) {
            return Err(DbError::NotFound);
        }
        tables.next_report_id += 1;
        let created = Report {
            id: tables.next_report_id,
            bin_id: report.bin_id,
            status: report.status.clone(),
            created_at: Utc::now(),
            cleared_at: None,
        };
        tables.reports.push(created.clone());
        Ok(created)
    }

    async fn get_report(&self, report_id: i32) -> Result<Option<Report>, DbError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.reports.iter().find(|r| r.id == report_id).cloned())
    }

    async fn get_all_reports(&self) -> Result<Vec<Report>, DbError> {
        let mut reports = self.tables.lock().unwrap().reports.clone();
        newest_first(&mut reports);
        Ok(reports)
    }

    async fn get_reports_for_bin(&self, bin_id: i32) -> Result<Vec<Report>, DbError> {
        let mut reports: Vec<Report> = self
            .tables
            .lock()
            .unwrap()
            .reports
            .iter()
            .filter(|r| r.bin_id == bin_id)
            .cloned()
            .collect();
        newest_first(&mut reports);
        Ok(reports)
    }

    async fn clear_report(&self, report_id: i32) -> Result<Option<Report>, DbError> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables
            .reports
            .iter_mut()
            .find(|r| r.id == report_id)
            .map(|report| {
                report.status = REPORT_STATUS_DONE.to_string();
                report.cleared_at = Some(Utc::now());
                report.clone()
            }))
    }
}

/// Remembers every notification it is handed.
#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<ReportNotification>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: &ReportNotification) -> Result<(), NotifierError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// A notifier whose delivery always fails.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _event: &ReportNotification) -> Result<(), NotifierError> {
        Err(NotifierError::ApiError("503: unavailable".to_string()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub repo: Arc<InMemoryRepository>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestApp {
    pub fn new() -> Self {
        let repo = Arc::new(InMemoryRepository::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let router = router(AppState {
            db_repo: repo.clone(),
            notifier: notifier.clone(),
            service_name: "dumpTrac".to_string(),
        });
        Self {
            router,
            repo,
            notifier,
        }
    }

    pub fn with_notifier(notifier: Arc<dyn Notifier>) -> Self {
        let mut app = Self::new();
        app.router = router(AppState {
            db_repo: app.repo.clone(),
            notifier,
            service_name: "dumpTrac".to_string(),
        });
        app
    }

    /// Sends one request and returns the status and the decoded JSON body.
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}
