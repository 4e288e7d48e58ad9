//! Steel product helpers
//!
//! Weights and slitting yields used when describing coils on a sale line.
//! Dimensions are millimetres, weights are metric tons. Negative or
//! non-finite inputs count as 0.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use crate::money::{sanitize, to_f64};

/// Density of carbon steel, t/m³
pub const STEEL_DENSITY: f64 = 7.85;

#[inline]
fn dim(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { 0.0 }
}

/// Weight of a coil strip of the given length
pub fn coil_weight(thickness_mm: f64, width_mm: f64, length_mm: f64) -> f64 {
    let volume_m3 = dim(thickness_mm) / 1000.0 * dim(width_mm) / 1000.0 * dim(length_mm) / 1000.0;
    volume_m3 * STEEL_DENSITY
}

/// Total weight of `count` identical sheets
pub fn sheet_weight(length_mm: f64, width_mm: f64, thickness_mm: f64, count: u32) -> f64 {
    coil_weight(thickness_mm, width_mm, length_mm) * f64::from(count)
}

/// Outcome of slitting a coil into narrower strips
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlittingYield {
    pub strips_count: u32,
    /// Percent of the original width turned into strips, minus expected waste
    pub yield_percentage: f64,
    /// Leftover edge width in mm
    pub waste_amount: f64,
}

/// Strips obtainable from `original_width_mm` at `target_width_mm` each
///
/// A zero target width (or original width) yields no strips.
pub fn slitting_yield(original_width_mm: f64, target_width_mm: f64, waste_percentage: f64) -> SlittingYield {
    let original = dim(original_width_mm);
    let target = dim(target_width_mm);
    if original == 0.0 || target == 0.0 {
        return SlittingYield {
            strips_count: 0,
            yield_percentage: 0.0,
            waste_amount: original,
        };
    }

    let strips_count = (original / target).floor() as u32;
    let used = f64::from(strips_count) * target;
    let yield_percentage = used / original * 100.0 - dim(waste_percentage);

    SlittingYield {
        strips_count,
        yield_percentage: yield_percentage.max(0.0),
        waste_amount: original - used,
    }
}

/// Material cost and margin of a line priced per ton
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub material_cost: f64,
    pub total_amount: f64,
    pub profit: f64,
    /// Percent of `total_amount`; 0 when nothing is sold
    pub profit_margin: f64,
}

pub fn cost_breakdown(
    quantity: f64,
    price_per_ton: f64,
    weight_tons: f64,
    material_cost_per_ton: f64,
) -> CostBreakdown {
    let material_cost = sanitize(weight_tons) * sanitize(material_cost_per_ton);
    let total = sanitize(quantity) * sanitize(price_per_ton);
    let profit = total - material_cost;
    let margin = if total.is_zero() {
        Decimal::ZERO
    } else {
        profit / total * Decimal::ONE_HUNDRED
    };

    CostBreakdown {
        material_cost: to_f64(material_cost),
        total_amount: to_f64(total),
        profit: to_f64(profit),
        profit_margin: to_f64(margin),
    }
}
