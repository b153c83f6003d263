// Mapper between stored meter rows and domain meters
use crate::domain::meter::{
    DistributionMethod, Meter, MeterCategory, MeterScope, MeterUnit, ReadingStatus, UnknownVariant,
};
use crate::domain::reading_board::ReadingUpdate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A meter as the hosted database returns it. Older rows use camelCase keys
/// and keep the current reading in `value`.
#[derive(Debug, Clone, Deserialize)]
pub struct MeterRow {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "type")]
    pub scope: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, alias = "pricePerUnit")]
    pub price_per_unit: Option<f64>,
    #[serde(default, alias = "fixedPrice")]
    pub fixed_price: Option<f64>,
    #[serde(default, alias = "distributionMethod")]
    pub distribution_method: Option<String>,
    #[serde(default, alias = "previousReading")]
    pub previous_reading: Option<f64>,
    #[serde(default, alias = "currentReading")]
    pub current_reading: Option<f64>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default, alias = "requiresPhoto")]
    pub requires_photo: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "photoUrl")]
    pub photo_url: Option<String>,
}

impl TryFrom<MeterRow> for Meter {
    type Error = UnknownVariant;

    fn try_from(row: MeterRow) -> Result<Self, Self::Error> {
        let distribution_method = row
            .distribution_method
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<DistributionMethod>)
            .transpose()?;
        let status = match row.status.as_deref() {
            Some(s) => s.parse::<ReadingStatus>()?,
            None => ReadingStatus::Missing,
        };

        Ok(Meter {
            name: row.name.unwrap_or_else(|| row.id.clone()),
            id: row.id,
            category: parse_category(row.category.as_deref()),
            scope: parse_scope(row.scope.as_deref()),
            unit: MeterUnit::parse(row.unit.as_deref().unwrap_or_default()),
            price_per_unit: row.price_per_unit,
            fixed_price: row.fixed_price,
            distribution_method,
            previous_reading: row.previous_reading,
            current_reading: row.current_reading.or(row.value),
            requires_photo: row.requires_photo.unwrap_or(false),
            status,
            photo_url: row.photo_url,
        })
    }
}

fn parse_category(category: Option<&str>) -> MeterCategory {
    match category.map(str::trim) {
        Some("electricity") => MeterCategory::Electricity,
        Some("cold_water" | "water_cold") => MeterCategory::ColdWater,
        Some("hot_water" | "water_hot") => MeterCategory::HotWater,
        Some("heating") => MeterCategory::Heating,
        Some("gas") => MeterCategory::Gas,
        _ => MeterCategory::Custom,
    }
}

// Only an explicit "individual" bills the meter to one unit.
fn parse_scope(scope: Option<&str>) -> MeterScope {
    match scope.map(str::trim) {
        Some("individual") => MeterScope::Individual,
        _ => MeterScope::Communal,
    }
}

/// Map rows, skipping any the domain cannot represent.
pub fn meters_from_rows(rows: Vec<MeterRow>) -> Vec<Meter> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id.clone();
            match Meter::try_from(row) {
                Ok(meter) => Some(meter),
                Err(e) => {
                    tracing::warn!(meter_id = %id, "skipping meter row: {}", e);
                    None
                }
            }
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct ReadingPatch {
    pub previous_reading: Option<f64>,
    pub current_reading: Option<f64>,
    pub consumption: f64,
    pub cost: f64,
    pub status: ReadingStatus,
    pub updated_at: DateTime<Utc>,
}

impl ReadingPatch {
    pub fn from_update(update: &ReadingUpdate, now: DateTime<Utc>) -> Self {
        Self {
            previous_reading: update.previous_reading,
            current_reading: update.current_reading,
            consumption: update.consumption,
            cost: update.cost,
            status: update.status,
            updated_at: now,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApprovalPatch {
    pub current_reading: f64,
    pub status: ReadingStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RejectionPatch<'a> {
    pub current_reading: Option<f64>,
    pub photo_url: Option<String>,
    pub status: ReadingStatus,
    pub rejection_reason: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}
