use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    pub billing: BillingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_addr: String,
}

/// Hosted database exposed through a PostgREST-style HTTP API.
#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    pub url: String,
    pub api_key: String,
    pub meters_table: String,
    pub apartments_table: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BillingSettings {
    /// Upper bound for one batch save, all rows together
    pub save_timeout_ms: u64,
    /// Used when a property has no apartments recorded
    pub default_apartment_count: u32,
}

/// Load `config/app.*` with `METER_BILLING__SECTION__KEY` environment overrides.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .set_default("server.bind_addr", "0.0.0.0:8080")?
        .set_default("backend.meters_table", "meters")?
        .set_default("backend.apartments_table", "apartments")?
        .set_default("billing.save_timeout_ms", 10_000)?
        .set_default("billing.default_apartment_count", 1)?
        .add_source(config::File::with_name("config/app").required(false))
        .add_source(config::Environment::with_prefix("METER_BILLING").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
