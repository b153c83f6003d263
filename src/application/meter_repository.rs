// Repository trait for meter and reading persistence
use crate::domain::meter::Meter;
use crate::domain::reading_board::ReadingUpdate;
use async_trait::async_trait;

#[async_trait]
pub trait MeterRepository: Send + Sync {
    /// All meters of a property, in display order
    async fn list_meters(&self, property_id: &str) -> anyhow::Result<Vec<Meter>>;

    /// Number of billable apartments; `None` when the property has none recorded
    async fn apartment_count(&self, property_id: &str) -> anyhow::Result<Option<u32>>;

    /// Write one operator-entered reading with its derived consumption and cost
    async fn save_reading(&self, update: &ReadingUpdate) -> anyhow::Result<()>;

    /// Accept a tenant-submitted reading
    async fn approve_reading(&self, meter_id: &str, current_reading: f64) -> anyhow::Result<()>;

    /// Drop a tenant-submitted reading and ask for a new one
    async fn reject_reading(&self, meter_id: &str, reason: Option<&str>) -> anyhow::Result<()>;
}
