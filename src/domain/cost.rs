// Utility cost distribution
use super::meter::{DistributionMethod, Meter, MeterScope, consumption_between};

/// Derived projection for one meter. Never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostBreakdown {
    pub consumption: f64,
    /// Whole cost of the meter before it is split between apartments.
    pub total_cost: f64,
    /// Share billed to a single apartment.
    pub unit_cost: f64,
}

/// Cost attributable to one rental unit. Missing data degrades to 0; this
/// runs while rendering a list of meters and must not fail.
pub fn calculate_meter_cost(meter: Option<&Meter>, apartment_count: u32) -> f64 {
    match meter {
        Some(meter) => cost_breakdown(meter, apartment_count).unit_cost,
        None => 0.0,
    }
}

pub fn cost_breakdown(meter: &Meter, apartment_count: u32) -> CostBreakdown {
    let apartments = f64::from(apartment_count.max(1));

    if meter.is_fixed_fee() {
        let total_cost = non_negative(meter.fixed_price);
        return CostBreakdown {
            consumption: 0.0,
            total_cost,
            unit_cost: total_cost / apartments,
        };
    }

    let consumption = consumption_between(meter.previous_reading, meter.current_reading);
    let total_cost = non_negative(Some(consumption * non_negative(meter.price_per_unit)));

    let unit_cost = match meter.distribution_method {
        Some(DistributionMethod::PerConsumption) => total_cost,
        // Per-person and per-area weighting needs headcount and floor area,
        // neither of which is known here; both split equally per apartment.
        Some(DistributionMethod::PerApartment)
        | Some(DistributionMethod::PerPerson)
        | Some(DistributionMethod::PerArea) => total_cost / apartments,
        // Handled by the fixed-fee path above.
        Some(DistributionMethod::FixedSplit) => total_cost / apartments,
        None => match meter.scope {
            MeterScope::Individual => total_cost,
            MeterScope::Communal => total_cost / apartments,
        },
    };

    CostBreakdown {
        consumption,
        total_cost,
        unit_cost,
    }
}

/// Sum of the per-apartment shares of every meter.
pub fn apartment_total(meters: &[Meter], apartment_count: u32) -> f64 {
    meters
        .iter()
        .map(|m| calculate_meter_cost(Some(m), apartment_count))
        .sum()
}

fn non_negative(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}
