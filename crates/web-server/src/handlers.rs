use crate::{AppState, error::AppError};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use core_types::{Bin, BinCreate, BinWithReports, Report, ReportCreate};
use notifier::ReportNotification;
use serde_json::{Value, json};
use std::sync::Arc;

/// # GET /
/// Static health payload.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": format!("{} API", state.service_name),
    }))
}

/// # POST /api/bins
/// Registers a bin, or returns the existing bin at that location with any missing
/// coordinates back-filled from the request.
pub async fn create_bin(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BinCreate>, JsonRejection>,
) -> Result<Json<Bin>, AppError> {
    let Json(payload) = payload?;
    let new_bin = payload.validate()?;
    let bin = state.db_repo.upsert_bin(&new_bin).await?;
    Ok(Json(bin))
}

/// # GET /api/bins
pub async fn get_bins(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Bin>>, AppError> {
    let bins = state.db_repo.get_all_bins().await?;
    Ok(Json(bins))
}

/// # GET /api/bins/:bin_id
pub async fn get_bin(
    Path(bin_id): Path<i32>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<BinWithReports>, AppError> {
    let bin = state
        .db_repo
        .get_bin(bin_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Bin {bin_id} not found")))?;
    let reports = state.db_repo.get_reports_for_bin(bin_id).await?;
    Ok(Json(BinWithReports { bin, reports }))
}

/// # POST /api/reports
/// Files a report against an existing bin and hands it to the notifier.
pub async fn create_report(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReportCreate>, JsonRejection>,
) -> Result<Json<Report>, AppError> {
    let Json(payload) = payload?;
    let new_report = payload.validate()?;

    let bin = state
        .db_repo
        .get_bin(new_report.bin_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Bin {} not found", new_report.bin_id)))?;
    let report = state.db_repo.insert_report(&new_report).await?;

    // The report is already committed; a delivery failure must not fail the request.
    let event = ReportNotification::new(&bin, &report);
    if let Err(e) = state.notifier.notify(&event).await {
        tracing::warn!(error = ?e, report_id = report.id, "Failed to send report notification.");
    }

    Ok(Json(report))
}

/// # GET /api/reports
pub async fn get_reports(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Report>>, AppError> {
    let reports = state.db_repo.get_all_reports().await?;
    Ok(Json(reports))
}

/// # PUT /api/reports/:report_id/clear
/// Marks a report done. Clearing an already-cleared report succeeds and refreshes
/// `cleared_at`.
pub async fn clear_report(
    Path(report_id): Path<i32>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Report>, AppError> {
    let report = state
        .db_repo
        .clear_report(report_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report {report_id} not found")))?;
    tracing::info!(report_id, bin_id = report.bin_id, "Report cleared.");
    Ok(Json(report))
}
