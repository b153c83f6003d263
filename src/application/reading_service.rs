// Reading service - Loading, saving and approving meter readings
use crate::application::meter_repository::MeterRepository;
use crate::domain::cost::{apartment_total, cost_breakdown};
use crate::domain::error::{DraftIssue, ReadingError};
use crate::domain::format::{MeterKind, meter_kind};
use crate::domain::reading_board::{ReadingBoard, SaveOutcome};
use crate::infrastructure::config::BillingSettings;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SaveReport {
    pub saved: Vec<String>,
    pub failed: Vec<ReadingError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BillLine {
    pub meter_id: String,
    pub name: String,
    pub kind: MeterKind,
    pub consumption: f64,
    pub total_cost: f64,
    pub unit_cost: f64,
    pub price_missing: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BillSummary {
    pub property_id: String,
    pub apartment_count: u32,
    pub lines: Vec<BillLine>,
    /// What one apartment pays for all meters together.
    pub total: f64,
}

#[derive(Clone)]
pub struct ReadingService {
    repository: Arc<dyn MeterRepository>,
    billing: BillingSettings,
}

impl ReadingService {
    pub fn new(repository: Arc<dyn MeterRepository>, billing: BillingSettings) -> Self {
        Self {
            repository,
            billing,
        }
    }

    fn save_timeout(&self) -> Duration {
        Duration::from_millis(self.billing.save_timeout_ms)
    }

    /// Fetch a property's meters into a fresh board. The apartment count comes
    /// from `apartments`, then the store, then the configured default.
    pub async fn load_board(
        &self,
        property_id: &str,
        apartments: Option<u32>,
    ) -> anyhow::Result<ReadingBoard> {
        let meters = self.repository.list_meters(property_id).await?;
        let apartment_count = match apartments {
            Some(n) => n,
            None => self
                .repository
                .apartment_count(property_id)
                .await?
                .unwrap_or(self.billing.default_apartment_count),
        };

        tracing::debug!(
            property_id,
            meters = meters.len(),
            apartment_count,
            "loaded meter board"
        );
        Ok(ReadingBoard::new(property_id, meters, apartment_count))
    }

    /// Re-fetch the meter list, e.g. after a tenant submitted a reading.
    pub async fn refresh(&self, board: &mut ReadingBoard) -> anyhow::Result<()> {
        let meters = self.repository.list_meters(board.property_id()).await?;
        board.replace_meters(meters);
        Ok(())
    }

    /// Submit every dirty row. Rows are written independently: a failed or
    /// timed out row keeps its draft and does not undo the others.
    pub async fn save(&self, board: &mut ReadingBoard) -> Result<SaveReport, ReadingError> {
        let updates = board.begin_save()?;
        let timeout = self.save_timeout();
        tracing::info!(
            property_id = board.property_id(),
            rows = updates.len(),
            "saving meter readings"
        );

        // each row gets its own deadline so rows that finished still commit
        let submits = updates.iter().map(|update| async move {
            let result =
                match tokio::time::timeout(timeout, self.repository.save_reading(update)).await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(ReadingError::persistence(&update.meter_id, &e)),
                    Err(_) => Err(ReadingError::TimedOut {
                        meter_id: update.meter_id.clone(),
                        after: timeout,
                    }),
                };
            SaveOutcome {
                meter_id: update.meter_id.clone(),
                result,
            }
        });
        let outcomes = join_all(submits).await;

        let mut report = SaveReport::default();
        for outcome in &outcomes {
            match &outcome.result {
                Ok(()) => report.saved.push(outcome.meter_id.clone()),
                Err(err) => {
                    tracing::warn!(meter_id = %outcome.meter_id, "{}", err);
                    report.failed.push(err.clone());
                }
            }
        }
        board.finish_save(outcomes);
        Ok(report)
    }

    pub async fn approve(
        &self,
        board: &mut ReadingBoard,
        meter_id: &str,
        current_reading: f64,
    ) -> Result<(), ReadingError> {
        ensure_awaiting(board, meter_id)?;
        if !current_reading.is_finite() || current_reading < 0.0 {
            let issue = if current_reading.is_finite() {
                DraftIssue::Negative
            } else {
                DraftIssue::NotANumber
            };
            return Err(ReadingError::InvalidInput {
                meter_id: meter_id.to_string(),
                issue,
            });
        }

        self.repository
            .approve_reading(meter_id, current_reading)
            .await
            .map_err(|e| ReadingError::persistence(meter_id, &e))?;

        tracing::info!(meter_id, current_reading, "approved submitted reading");
        board.apply_approval(meter_id, current_reading);
        Ok(())
    }

    pub async fn reject(
        &self,
        board: &mut ReadingBoard,
        meter_id: &str,
        reason: Option<&str>,
    ) -> Result<(), ReadingError> {
        ensure_awaiting(board, meter_id)?;

        self.repository
            .reject_reading(meter_id, reason)
            .await
            .map_err(|e| ReadingError::persistence(meter_id, &e))?;

        tracing::info!(meter_id, reason, "rejected submitted reading");
        board.apply_rejection(meter_id);
        Ok(())
    }

    /// Per-meter cost lines for one apartment, from the stored readings.
    pub fn bill(&self, board: &ReadingBoard) -> BillSummary {
        let apartment_count = board.apartment_count();
        let lines = board
            .meters()
            .iter()
            .map(|meter| {
                let breakdown = cost_breakdown(meter, apartment_count);
                let price_missing = meter.price_missing();
                if price_missing {
                    tracing::debug!(meter_id = %meter.id, "meter has no price configured");
                }
                BillLine {
                    meter_id: meter.id.clone(),
                    name: meter.name.clone(),
                    kind: meter_kind(meter),
                    consumption: breakdown.consumption,
                    total_cost: breakdown.total_cost,
                    unit_cost: breakdown.unit_cost,
                    price_missing,
                }
            })
            .collect();

        BillSummary {
            property_id: board.property_id().to_string(),
            apartment_count,
            lines,
            total: apartment_total(board.meters(), apartment_count),
        }
    }
}

fn ensure_awaiting(board: &ReadingBoard, meter_id: &str) -> Result<(), ReadingError> {
    let meter = board
        .meter(meter_id)
        .ok_or_else(|| ReadingError::UnknownMeter(meter_id.to_string()))?;
    if meter.status.is_awaiting() {
        Ok(())
    } else {
        Err(ReadingError::NotAwaitingApproval(meter_id.to_string()))
    }
}
