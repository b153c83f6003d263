// HTTP request handlers
use crate::application::reading_service::{BillSummary, SaveReport};
use crate::domain::cost::cost_breakdown;
use crate::domain::error::{DraftWarning, ReadingError};
use crate::domain::format::{
    distribution_label, fmt_amount, fmt_cost, fmt_reading, meter_kind, meter_price_display,
};
use crate::domain::meter::{Meter, ReadingStatus};
use crate::domain::reading_board::{ReadingBoard, ReadingEntry};
use crate::presentation::api_error::ApiResult;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct ApartmentsQuery {
    pub apartments: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct MeterView {
    pub id: String,
    pub name: String,
    pub unit: String,
    pub kind: &'static str,
    pub price: String,
    pub price_missing: bool,
    pub distribution: &'static str,
    pub previous_reading: String,
    pub current_reading: String,
    pub consumption: String,
    pub cost: String,
    pub status: ReadingStatus,
    pub awaiting_approval: bool,
    pub requires_photo: bool,
    pub photo_url: Option<String>,
}

pub fn meter_view(meter: &Meter, apartment_count: u32) -> MeterView {
    let breakdown = cost_breakdown(meter, apartment_count);
    MeterView {
        id: meter.id.clone(),
        name: meter.name.clone(),
        unit: meter.unit.to_string(),
        kind: meter_kind(meter).label(),
        price: meter_price_display(meter),
        price_missing: meter.price_missing(),
        distribution: distribution_label(meter.distribution_method),
        previous_reading: fmt_reading(meter.previous_reading),
        current_reading: fmt_reading(meter.current_reading),
        consumption: fmt_amount(Some(breakdown.consumption)),
        cost: fmt_cost(Some(breakdown.unit_cost)),
        status: meter.status,
        awaiting_approval: meter.status.is_awaiting(),
        requires_photo: meter.requires_photo,
        photo_url: meter.photo_url.clone(),
    }
}

#[derive(Debug, Serialize)]
pub struct BillLineView {
    pub meter_id: String,
    pub name: String,
    pub kind: &'static str,
    pub consumption: String,
    pub total_cost: String,
    pub apartment_cost: String,
}

#[derive(Debug, Serialize)]
pub struct BillView {
    pub property_id: String,
    pub apartment_count: u32,
    pub lines: Vec<BillLineView>,
    pub total: f64,
    pub total_display: String,
}

impl From<BillSummary> for BillView {
    fn from(bill: BillSummary) -> Self {
        Self {
            property_id: bill.property_id,
            apartment_count: bill.apartment_count,
            lines: bill
                .lines
                .into_iter()
                .map(|line| BillLineView {
                    meter_id: line.meter_id,
                    name: line.name,
                    kind: line.kind.label(),
                    consumption: fmt_amount(Some(line.consumption)),
                    total_cost: fmt_cost(Some(line.total_cost)),
                    apartment_cost: fmt_cost(Some(line.unit_cost)),
                })
                .collect(),
            total_display: fmt_cost(Some(bill.total)),
            total: bill.total,
        }
    }
}

#[derive(Deserialize)]
pub struct SaveReadingsRequest {
    pub apartments: Option<u32>,
    pub entries: Vec<ReadingEntryBody>,
}

#[derive(Deserialize)]
pub struct ReadingEntryBody {
    pub meter_id: String,
    pub current_reading: String,
    #[serde(default)]
    pub previous_reading: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RowMessage {
    pub meter_id: String,
    pub message: String,
}

#[derive(Debug, Serialize, Default)]
pub struct SaveReadingsResponse {
    pub saved: Vec<String>,
    pub failed: Vec<RowMessage>,
    pub warnings: Vec<RowMessage>,
}

#[derive(Deserialize)]
pub struct ApproveRequest {
    pub current_reading: f64,
}

#[derive(Deserialize)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_meters(
    Path(property_id): Path<String>,
    Query(query): Query<ApartmentsQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<MeterView>>> {
    let board = state
        .reading_service
        .load_board(&property_id, query.apartments)
        .await?;
    let views = board
        .meters()
        .iter()
        .map(|m| meter_view(m, board.apartment_count()))
        .collect();
    Ok(Json(views))
}

pub async fn property_bill(
    Path(property_id): Path<String>,
    Query(query): Query<ApartmentsQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<BillView>> {
    let board = state
        .reading_service
        .load_board(&property_id, query.apartments)
        .await?;
    Ok(Json(state.reading_service.bill(&board).into()))
}

/// Stage a batch of raw inputs and save it when every row is valid
pub async fn save_readings(
    Path(property_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<SaveReadingsRequest>,
) -> ApiResult<Response> {
    let mut board = state
        .reading_service
        .load_board(&property_id, request.apartments)
        .await?;

    let entries: Vec<ReadingEntry> = request
        .entries
        .into_iter()
        .map(|e| ReadingEntry {
            meter_id: e.meter_id,
            current_reading: e.current_reading,
            previous_reading: e.previous_reading,
        })
        .collect();
    board.stage_batch(&entries)?;

    let warnings = row_warnings(&board);
    if board.error_count() > 0 {
        let body = SaveReadingsResponse {
            failed: row_issues(&board),
            warnings,
            ..Default::default()
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response());
    }

    let report = match state.reading_service.save(&mut board).await {
        Ok(report) => report,
        // every value matched what is already stored
        Err(ReadingError::NothingToSave) => SaveReport::default(),
        Err(err) => return Err(err.into()),
    };

    let status = save_status(&report);
    let body = SaveReadingsResponse {
        saved: report.saved,
        failed: report
            .failed
            .iter()
            .map(|err| RowMessage {
                meter_id: failed_meter_id(err),
                message: err.to_string(),
            })
            .collect(),
        warnings,
    };
    Ok((status, Json(body)).into_response())
}

pub async fn approve_reading(
    Path((property_id, meter_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ApproveRequest>,
) -> ApiResult<Json<MeterView>> {
    let service = &state.reading_service;
    let mut board = service.load_board(&property_id, None).await?;
    service
        .approve(&mut board, &meter_id, request.current_reading)
        .await?;
    current_view(&board, &meter_id)
}

pub async fn reject_reading(
    Path((property_id, meter_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    request: Option<Json<RejectRequest>>,
) -> ApiResult<Json<MeterView>> {
    let service = &state.reading_service;
    let reason = request.and_then(|Json(body)| body.reason);
    let mut board = service.load_board(&property_id, None).await?;
    service
        .reject(&mut board, &meter_id, reason.as_deref())
        .await?;
    current_view(&board, &meter_id)
}

fn current_view(board: &ReadingBoard, meter_id: &str) -> ApiResult<Json<MeterView>> {
    let meter = board
        .meter(meter_id)
        .ok_or_else(|| ReadingError::UnknownMeter(meter_id.to_string()))?;
    Ok(Json(meter_view(meter, board.apartment_count())))
}

fn row_issues(board: &ReadingBoard) -> Vec<RowMessage> {
    board
        .flagged_ids()
        .into_iter()
        .filter_map(|id| {
            let issue = board.row_state(&id)?.issue?;
            Some(RowMessage {
                message: issue.to_string(),
                meter_id: id,
            })
        })
        .collect()
}

fn row_warnings(board: &ReadingBoard) -> Vec<RowMessage> {
    board
        .dirty_ids()
        .into_iter()
        .filter_map(|id| {
            let DraftWarning::ReadingRegression { previous, current } =
                board.row_state(&id)?.warning?;
            Some(RowMessage {
                message: format!("reading {current} is below previous {previous}"),
                meter_id: id,
            })
        })
        .collect()
}

fn save_status(report: &SaveReport) -> StatusCode {
    let timed_out = |err: &ReadingError| matches!(err, ReadingError::TimedOut { .. });
    if report.failed.is_empty() {
        StatusCode::OK
    } else if report.saved.is_empty() && report.failed.iter().all(timed_out) {
        StatusCode::GATEWAY_TIMEOUT
    } else {
        StatusCode::MULTI_STATUS
    }
}

fn failed_meter_id(err: &ReadingError) -> String {
    match err {
        ReadingError::PersistenceFailure { meter_id, .. }
        | ReadingError::InvalidInput { meter_id, .. }
        | ReadingError::TimedOut { meter_id, .. } => meter_id.clone(),
        ReadingError::UnknownMeter(id) | ReadingError::NotAwaitingApproval(id) => id.clone(),
        _ => String::new(),
    }
}
