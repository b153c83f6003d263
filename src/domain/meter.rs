// Meter domain model
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unit label that switches a meter to the flat monthly fee path ("Other").
pub const FIXED_FEE_UNIT: &str = "Kitas";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeterCategory {
    Electricity,
    ColdWater,
    HotWater,
    Heating,
    Gas,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeterScope {
    Individual,
    Communal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeterUnit {
    CubicMeter,
    Kwh,
    Gigajoule,
    Other,
    Custom(String),
}

impl MeterUnit {
    pub fn as_str(&self) -> &str {
        match self {
            MeterUnit::CubicMeter => "m3",
            MeterUnit::Kwh => "kWh",
            MeterUnit::Gigajoule => "GJ",
            MeterUnit::Other => FIXED_FEE_UNIT,
            MeterUnit::Custom(label) => label,
        }
    }

    pub fn parse(label: &str) -> Self {
        match label.trim() {
            "m3" | "m³" => MeterUnit::CubicMeter,
            "kWh" | "kwh" => MeterUnit::Kwh,
            "GJ" | "gj" => MeterUnit::Gigajoule,
            FIXED_FEE_UNIT => MeterUnit::Other,
            other => MeterUnit::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for MeterUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionMethod {
    PerConsumption,
    PerApartment,
    PerPerson,
    PerArea,
    FixedSplit,
}

impl DistributionMethod {
    pub const ALL: [DistributionMethod; 5] = [
        DistributionMethod::PerConsumption,
        DistributionMethod::PerApartment,
        DistributionMethod::PerPerson,
        DistributionMethod::PerArea,
        DistributionMethod::FixedSplit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DistributionMethod::PerConsumption => "per_consumption",
            DistributionMethod::PerApartment => "per_apartment",
            DistributionMethod::PerPerson => "per_person",
            DistributionMethod::PerArea => "per_area",
            DistributionMethod::FixedSplit => "fixed_split",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for DistributionMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DistributionMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| UnknownVariant {
                kind: "distribution method",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    Missing,
    /// Evidence photo submitted, awaiting approval.
    Photo,
    Pending,
    Ok,
}

impl ReadingStatus {
    /// `photo` and `pending` are shown the same way.
    pub fn is_awaiting(self) -> bool {
        matches!(self, ReadingStatus::Photo | ReadingStatus::Pending)
    }
}

impl FromStr for ReadingStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "missing" => Ok(ReadingStatus::Missing),
            "photo" => Ok(ReadingStatus::Photo),
            "pending" => Ok(ReadingStatus::Pending),
            "ok" => Ok(ReadingStatus::Ok),
            other => Err(UnknownVariant {
                kind: "reading status",
                value: other.to_string(),
            }),
        }
    }
}

/// The single operative price of a meter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pricing {
    Fixed { monthly: Option<f64> },
    Metered { per_unit: Option<f64> },
}

/// A normalized meter record. Built once at the persistence boundary so the
/// cost and formatting code never deals with legacy field aliases.
#[derive(Debug, Clone, PartialEq)]
pub struct Meter {
    pub id: String,
    pub name: String,
    pub category: MeterCategory,
    pub scope: MeterScope,
    pub unit: MeterUnit,
    pub price_per_unit: Option<f64>,
    pub fixed_price: Option<f64>,
    pub distribution_method: Option<DistributionMethod>,
    pub previous_reading: Option<f64>,
    pub current_reading: Option<f64>,
    pub requires_photo: bool,
    pub status: ReadingStatus,
    pub photo_url: Option<String>,
}

impl Meter {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: MeterCategory::Custom,
            scope: MeterScope::Individual,
            unit: MeterUnit::Kwh,
            price_per_unit: None,
            fixed_price: None,
            distribution_method: None,
            previous_reading: None,
            current_reading: None,
            requires_photo: false,
            status: ReadingStatus::Missing,
            photo_url: None,
        }
    }

    /// Flat monthly fee meters ignore readings entirely.
    pub fn is_fixed_fee(&self) -> bool {
        self.distribution_method == Some(DistributionMethod::FixedSplit)
            || self.unit == MeterUnit::Other
    }

    pub fn pricing(&self) -> Pricing {
        if self.is_fixed_fee() {
            Pricing::Fixed {
                monthly: self.fixed_price,
            }
        } else {
            Pricing::Metered {
                per_unit: self.price_per_unit,
            }
        }
    }

    pub fn price_missing(&self) -> bool {
        match self.pricing() {
            Pricing::Fixed { monthly } => monthly.is_none(),
            Pricing::Metered { per_unit } => per_unit.is_none(),
        }
    }

    /// Consumption between the two stored readings, never negative.
    pub fn consumption(&self) -> f64 {
        consumption_between(self.previous_reading, self.current_reading)
    }
}

/// A negative or non-finite reading counts as missing.
pub fn consumption_between(previous: Option<f64>, current: Option<f64>) -> f64 {
    let consumption = usable_reading(current) - usable_reading(previous);
    if consumption.is_finite() && consumption > 0.0 {
        consumption
    } else {
        0.0
    }
}

fn usable_reading(reading: Option<f64>) -> f64 {
    match reading {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_fee_detection() {
        let mut meter = Meter::new("m1", "Internetas");
        assert!(!meter.is_fixed_fee());

        meter.unit = MeterUnit::Other;
        assert!(meter.is_fixed_fee());

        meter.unit = MeterUnit::CubicMeter;
        meter.distribution_method = Some(DistributionMethod::FixedSplit);
        assert!(meter.is_fixed_fee());
        assert_eq!(meter.pricing(), Pricing::Fixed { monthly: None });
        assert!(meter.price_missing());
    }

    #[test]
    fn test_consumption_never_negative() {
        assert_eq!(consumption_between(Some(100.0), Some(150.0)), 50.0);
        assert_eq!(consumption_between(Some(150.0), Some(100.0)), 0.0);
        assert_eq!(consumption_between(None, None), 0.0);
        assert_eq!(consumption_between(None, Some(12.5)), 12.5);
        assert_eq!(consumption_between(Some(f64::NAN), Some(1.0)), 1.0);
    }

    #[test]
    fn test_unusable_readings_count_as_missing() {
        assert_eq!(consumption_between(None, Some(f64::INFINITY)), 0.0);
        assert_eq!(consumption_between(Some(f64::NEG_INFINITY), Some(5.0)), 5.0);
        assert_eq!(consumption_between(Some(-f64::MAX), Some(f64::MAX)), f64::MAX);
        assert_eq!(consumption_between(Some(-20.0), Some(30.0)), 30.0);
        assert_eq!(consumption_between(Some(10.0), Some(f64::NAN)), 0.0);
    }

    #[test]
    fn test_distribution_method_parsing() {
        for method in DistributionMethod::ALL {
            assert_eq!(method.as_str().parse::<DistributionMethod>(), Ok(method));
        }
        let err = "per_household".parse::<DistributionMethod>().unwrap_err();
        assert_eq!(err.value, "per_household");
    }

    #[test]
    fn test_unit_labels() {
        assert_eq!(MeterUnit::parse("Kitas"), MeterUnit::Other);
        assert_eq!(MeterUnit::parse("m3").to_string(), "m3");
        assert_eq!(MeterUnit::parse("vnt."), MeterUnit::Custom("vnt.".to_string()));
    }

    #[test]
    fn test_awaiting_statuses() {
        assert!(ReadingStatus::Photo.is_awaiting());
        assert!(ReadingStatus::Pending.is_awaiting());
        assert!(!ReadingStatus::Ok.is_awaiting());
        assert!(!ReadingStatus::Missing.is_awaiting());
    }
}
