// Display helpers for meter rows
use super::meter::{DistributionMethod, Meter, MeterScope, Pricing};

pub const EMPTY: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeterKind {
    FixedFee,
    Individual,
    Communal,
}

impl MeterKind {
    pub fn label(self) -> &'static str {
        match self {
            MeterKind::FixedFee => "Fiksuotas mokestis",
            MeterKind::Individual => "Individualus skaitiklis",
            MeterKind::Communal => "Bendras skaitiklis",
        }
    }
}

pub fn meter_kind(meter: &Meter) -> MeterKind {
    if meter.is_fixed_fee() {
        return MeterKind::FixedFee;
    }
    match meter.scope {
        MeterScope::Individual => MeterKind::Individual,
        MeterScope::Communal => MeterKind::Communal,
    }
}

pub fn meter_type_label(meter: &Meter) -> &'static str {
    meter_kind(meter).label()
}

/// "15€/mėn." for flat fees, "1.1€/m3" for metered utilities.
pub fn meter_price_display(meter: &Meter) -> String {
    match meter.pricing() {
        Pricing::Fixed { monthly } => format!("{}€/mėn.", monthly.unwrap_or(0.0)),
        Pricing::Metered { per_unit } => {
            format!("{}€/{}", per_unit.unwrap_or(0.0), meter.unit)
        }
    }
}

pub fn distribution_label(method: Option<DistributionMethod>) -> &'static str {
    match method {
        Some(DistributionMethod::PerConsumption) => "Pagal suvartojimą",
        Some(DistributionMethod::PerApartment) => "Pagal butų skaičių",
        Some(DistributionMethod::PerPerson) => "Pagal gyventojų skaičių",
        Some(DistributionMethod::PerArea) => "Pagal plotą",
        Some(DistributionMethod::FixedSplit) => "Fiksuotas padalijimas",
        None => "Nenurodyta",
    }
}

/// Meter readings. Zero renders as the empty marker, never as `0`.
pub fn fmt_reading(value: Option<f64>) -> String {
    fmt_amount(value)
}

/// Consumption amounts; zero renders as the empty marker.
pub fn fmt_amount(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() && v != 0.0 => format!("{v:.2}"),
        _ => EMPTY.to_string(),
    }
}

pub fn fmt_cost(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() && v != 0.0 => format!("{v:.2} €"),
        _ => EMPTY.to_string(),
    }
}
