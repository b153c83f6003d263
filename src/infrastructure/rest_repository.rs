// Hosted database repository over a PostgREST-style HTTP API
use crate::application::meter_repository::MeterRepository;
use crate::domain::meter::{Meter, ReadingStatus};
use crate::domain::reading_board::ReadingUpdate;
use crate::infrastructure::meter_mapper::{
    ApprovalPatch, MeterRow, ReadingPatch, RejectionPatch, meters_from_rows,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct RestRepository {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    meters_table: String,
    apartments_table: String,
}

#[derive(Debug, Deserialize)]
struct IdRow {
    #[allow(dead_code)]
    id: serde_json::Value,
}

impl RestRepository {
    pub fn new(base_url: String, api_key: String, meters_table: String, apartments_table: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            meters_table,
            apartments_table,
        }
    }

    fn table_url(&self, table: &str, filter_column: &str, filter_value: &str, extra: &str) -> String {
        format!(
            "{}/rest/v1/{}?{}=eq.{}{}",
            self.base_url,
            table,
            filter_column,
            urlencoding::encode(filter_value),
            extra
        )
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
    }

    async fn select<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>> {
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .context("Failed to send request to meter store")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Meter store query failed with status {}: {}", status, body);
        }

        response
            .json::<Vec<T>>()
            .await
            .context("Failed to parse meter store response")
    }

    async fn patch_meter<B: Serialize + Sync>(&self, meter_id: &str, body: &B) -> Result<()> {
        let url = self.table_url(&self.meters_table, "id", meter_id, "");
        tracing::debug!("Patching meter {}", meter_id);

        let response = self
            .authorized(self.client.patch(&url))
            .header("Prefer", "return=minimal")
            .json(body)
            .send()
            .await
            .context("Failed to send update to meter store")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Meter update failed with status {}: {}", status, body);
        }
        Ok(())
    }
}

#[async_trait]
impl MeterRepository for RestRepository {
    async fn list_meters(&self, property_id: &str) -> Result<Vec<Meter>> {
        let url = self.table_url(
            &self.meters_table,
            "property_id",
            property_id,
            "&select=*&order=created_at.asc",
        );
        let rows: Vec<MeterRow> = self.select(&url).await?;
        tracing::debug!("Fetched {} meter rows for property {}", rows.len(), property_id);
        Ok(meters_from_rows(rows))
    }

    async fn apartment_count(&self, property_id: &str) -> Result<Option<u32>> {
        let url = self.table_url(&self.apartments_table, "property_id", property_id, "&select=id");
        let rows: Vec<IdRow> = self.select(&url).await?;
        let count = u32::try_from(rows.len()).context("Apartment count out of range")?;
        Ok((count > 0).then_some(count))
    }

    async fn save_reading(&self, update: &ReadingUpdate) -> Result<()> {
        let patch = ReadingPatch::from_update(update, chrono::Utc::now());
        self.patch_meter(&update.meter_id, &patch).await
    }

    async fn approve_reading(&self, meter_id: &str, current_reading: f64) -> Result<()> {
        let patch = ApprovalPatch {
            current_reading,
            status: ReadingStatus::Ok,
            updated_at: chrono::Utc::now(),
        };
        self.patch_meter(meter_id, &patch).await
    }

    async fn reject_reading(&self, meter_id: &str, reason: Option<&str>) -> Result<()> {
        let patch = RejectionPatch {
            current_reading: None,
            photo_url: None,
            status: ReadingStatus::Missing,
            rejection_reason: reason,
            updated_at: chrono::Utc::now(),
        };
        self.patch_meter(meter_id, &patch).await
    }
}
