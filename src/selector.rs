//! Best-vendor selection: a pure function over a set of normalized
//! candidates. No I/O, no clock — deterministic given its input.

use crate::normalize::NormalizedRecord;

const PRICE_EPSILON: f64 = 1e-6;
const SPREAD_THRESHOLD_PERCENT: f64 = 10.0;

pub fn select_best(candidates: &[NormalizedRecord]) -> Option<&NormalizedRecord> {
    let in_stock: Vec<&NormalizedRecord> = candidates.iter().filter(|c| c.stock > 0).collect();

    if in_stock.is_empty() {
        return None;
    }
    if in_stock.len() == 1 {
        return Some(in_stock[0]);
    }

    let min_price = in_stock
        .iter()
        .map(|c| c.price)
        .fold(f64::INFINITY, f64::min);
    let max_price = in_stock
        .iter()
        .map(|c| c.price)
        .fold(f64::NEG_INFINITY, f64::max);

    let spread = (max_price - min_price) / min_price * 100.0;

    if spread > SPREAD_THRESHOLD_PERCENT {
        Some(pick_by(in_stock, |a, b| {
            b.stock
                .cmp(&a.stock)
                .then_with(|| compare_price(a.price, b.price))
                .then_with(|| a.vendor_name.cmp(&b.vendor_name))
        }))
    } else {
        Some(pick_by(in_stock, |a, b| {
            compare_price(a.price, b.price)
                .then_with(|| b.stock.cmp(&a.stock))
                .then_with(|| a.vendor_name.cmp(&b.vendor_name))
        }))
    }
}

fn compare_price(a: f64, b: f64) -> std::cmp::Ordering {
    if (a - b).abs() < PRICE_EPSILON {
        std::cmp::Ordering::Equal
    } else {
        a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
    }
}

/// Picks the minimum element of `candidates` under `cmp`, where `cmp(a, b)`
/// returns `Less` when `a` should win.
fn pick_by<'a>(
    candidates: Vec<&'a NormalizedRecord>,
    cmp: impl Fn(&NormalizedRecord, &NormalizedRecord) -> std::cmp::Ordering,
) -> &'a NormalizedRecord {
    let mut best = candidates[0];
    for candidate in &candidates[1..] {
        if cmp(candidate, best) == std::cmp::Ordering::Less {
            best = candidate;
        }
    }
    best
}
