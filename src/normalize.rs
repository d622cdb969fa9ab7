//! Pure normalization: maps each vendor-specific shape to the canonical
//! record, applying the stock and price rules in order, then the freshness
//! check. No I/O, no shared state.

use crate::clock::Clock;
use crate::vendor::VendorRawRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The canonical record handed to the selector.
///
/// `request_id` is a log-correlation handle only: it is stamped on after
/// construction (the aggregator assigns one per incoming request), never
/// serialized into the cached JSON value, and excluded from equality —
/// two records describing the same vendor quote are equal regardless of
/// which request produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub sku: String,
    pub vendor_name: String,
    pub price: f64,
    pub stock: u32,
    pub source_timestamp: DateTime<Utc>,
    #[serde(skip)]
    pub request_id: u64,
}

impl PartialEq for NormalizedRecord {
    fn eq(&self, other: &Self) -> bool {
        self.sku == other.sku
            && self.vendor_name == other.vendor_name
            && self.price == other.price
            && self.stock == other.stock
            && self.source_timestamp == other.source_timestamp
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    NonPositivePrice,
    PriceParseFailure,
    NonFinitePrice,
    Stale { age: Duration, window: Duration },
    InvalidTimestamp,
}

/// The literal "present but unspecified" quantity used when a vendor
/// reports in-stock availability without a numeric count. Policy constant,
/// not an estimate.
const UNSPECIFIED_PRESENT_QUANTITY: u32 = 5;

pub fn normalize(
    raw: &VendorRawRecord,
    freshness_window: Duration,
    clock: &dyn Clock,
) -> Result<NormalizedRecord, RejectionReason> {
    match raw {
        VendorRawRecord::IntegerInventory {
            product_code,
            inventory_count,
            unit_price,
            availability_status,
            last_updated,
        } => {
            check_freshness(*last_updated, freshness_window, clock)?;

            let stock = match inventory_count {
                None if availability_status == "IN_STOCK" => UNSPECIFIED_PRESENT_QUANTITY,
                None => 0,
                Some(count) => (*count).max(0) as u32,
            };

            let price = validate_price(*unit_price)?;

            Ok(NormalizedRecord {
                sku: product_code.clone(),
                vendor_name: String::new(),
                price,
                stock,
                source_timestamp: *last_updated,
                request_id: 0,
            })
        }

        VendorRawRecord::BooleanInStock {
            sku,
            stock_level,
            price_usd,
            in_stock,
            updated_at,
        } => {
            check_freshness(*updated_at, freshness_window, clock)?;

            let stock = match stock_level {
                None if *in_stock => UNSPECIFIED_PRESENT_QUANTITY,
                None => 0,
                Some(level) => (*level).max(0) as u32,
            };

            let price = parse_decimal_string(price_usd)?;
            let price = validate_price(price)?;

            Ok(NormalizedRecord {
                sku: sku.clone(),
                vendor_name: String::new(),
                price,
                stock,
                source_timestamp: *updated_at,
                request_id: 0,
            })
        }

        VendorRawRecord::StringQuantity {
            id,
            qty,
            cost,
            available,
            updated_at,
        } => {
            check_freshness(*updated_at, freshness_window, clock)?;

            let availability = available.to_ascii_lowercase();
            let parsed_qty: i64 = qty
                .as_deref()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(0);
            let parsed_qty = parsed_qty.max(0) as u32;

            let stock = if availability == "no" {
                0
            } else if parsed_qty == 0 && availability == "yes" {
                UNSPECIFIED_PRESENT_QUANTITY
            } else {
                parsed_qty
            };

            let price = validate_price(*cost)?;

            Ok(NormalizedRecord {
                sku: id.clone(),
                vendor_name: String::new(),
                price,
                stock,
                source_timestamp: *updated_at,
                request_id: 0,
            })
        }
    }
}

fn check_freshness(
    source_timestamp: DateTime<Utc>,
    freshness_window: Duration,
    clock: &dyn Clock,
) -> Result<(), RejectionReason> {
    let now = clock.now();
    let age = now.signed_duration_since(source_timestamp);
    let age = age.to_std().unwrap_or(Duration::ZERO);
    if age > freshness_window {
        return Err(RejectionReason::Stale {
            age,
            window: freshness_window,
        });
    }
    Ok(())
}

fn validate_price(price: f64) -> Result<f64, RejectionReason> {
    if !price.is_finite() {
        return Err(RejectionReason::NonFinitePrice);
    }
    if price <= 0.0 {
        return Err(RejectionReason::NonPositivePrice);
    }
    Ok(price)
}

/// Locale-independent decimal grammar: `[0-9]+(\.[0-9]+)?`. Rejects
/// anything else rather than leaning on a locale-aware parser.
fn parse_decimal_string(raw: &str) -> Result<f64, RejectionReason> {
    let trimmed = raw.trim();
    let valid_grammar = {
        let mut chars = trimmed.chars().peekable();
        let mut saw_digit = false;
        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() {
                saw_digit = true;
                chars.next();
            } else {
                break;
            }
        }
        if !saw_digit {
            false
        } else if chars.peek() == Some(&'.') {
            chars.next();
            let mut saw_fraction_digit = false;
            while let Some(&c) = chars.peek() {
                if c.is_ascii_digit() {
                    saw_fraction_digit = true;
                    chars.next();
                } else {
                    break;
                }
            }
            saw_fraction_digit && chars.next().is_none()
        } else {
            chars.next().is_none()
        }
    };

    if !valid_grammar {
        return Err(RejectionReason::PriceParseFailure);
    }

    trimmed.parse().map_err(|_| RejectionReason::PriceParseFailure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;

    fn clock_at(ts: DateTime<Utc>) -> FixedClock {
        FixedClock::new(ts)
    }

    fn integer_inventory(
        inventory_count: Option<i64>,
        unit_price: f64,
        availability_status: &str,
        last_updated: DateTime<Utc>,
    ) -> VendorRawRecord {
        VendorRawRecord::IntegerInventory {
            product_code: "SKU001".to_string(),
            inventory_count,
            unit_price,
            availability_status: availability_status.to_string(),
            last_updated,
        }
    }

    #[test]
    fn null_inventory_with_in_stock_status_yields_five() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let clock = clock_at(now);
        let raw = integer_inventory(None, 149.99, "IN_STOCK", now);
        let normalized = normalize(&raw, Duration::from_secs(600), &clock).unwrap();
        assert_eq!(normalized.stock, 5);
        assert_eq!(normalized.price, 149.99);
    }

    #[test]
    fn null_inventory_without_in_stock_status_yields_zero() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let clock = clock_at(now);
        let raw = integer_inventory(None, 10.0, "OUT_OF_STOCK", now);
        let normalized = normalize(&raw, Duration::from_secs(600), &clock).unwrap();
        assert_eq!(normalized.stock, 0);
    }

    #[test]
    fn negative_inventory_clamps_to_zero() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let clock = clock_at(now);
        let raw = integer_inventory(Some(-3), 10.0, "IN_STOCK", now);
        let normalized = normalize(&raw, Duration::from_secs(600), &clock).unwrap();
        assert_eq!(normalized.stock, 0);
    }

    #[test]
    fn non_positive_price_is_rejected_not_clamped() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let clock = clock_at(now);
        let raw = integer_inventory(Some(5), -10.0, "IN_STOCK", now);
        assert_eq!(
            normalize(&raw, Duration::from_secs(600), &clock),
            Err(RejectionReason::NonPositivePrice)
        );
    }

    #[test]
    fn stale_record_is_rejected() {
        let source_time = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let clock = clock_at(source_time + chrono::Duration::minutes(11));
        let raw = integer_inventory(Some(5), 10.0, "IN_STOCK", source_time);
        assert!(matches!(
            normalize(&raw, Duration::from_secs(600), &clock),
            Err(RejectionReason::Stale { .. })
        ));
    }

    #[test]
    fn record_at_exactly_the_freshness_boundary_is_accepted() {
        let source_time = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let clock = clock_at(source_time + chrono::Duration::seconds(600));
        let raw = integer_inventory(Some(5), 10.0, "IN_STOCK", source_time);
        assert!(normalize(&raw, Duration::from_secs(600), &clock).is_ok());
    }

    #[test]
    fn boolean_in_stock_null_stock_with_true_flag_yields_five() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let clock = clock_at(now);
        let raw = VendorRawRecord::BooleanInStock {
            sku: "SKU002".to_string(),
            stock_level: None,
            price_usd: "95.50".to_string(),
            in_stock: true,
            updated_at: now,
        };
        let normalized = normalize(&raw, Duration::from_secs(600), &clock).unwrap();
        assert_eq!(normalized.stock, 5);
        assert_eq!(normalized.price, 95.50);
    }

    #[test]
    fn boolean_in_stock_price_parse_failure_is_rejected() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let clock = clock_at(now);
        let raw = VendorRawRecord::BooleanInStock {
            sku: "SKU002".to_string(),
            stock_level: Some(10),
            price_usd: "not-a-number".to_string(),
            in_stock: true,
            updated_at: now,
        };
        assert_eq!(
            normalize(&raw, Duration::from_secs(600), &clock),
            Err(RejectionReason::PriceParseFailure)
        );
    }

    #[test]
    fn string_quantity_available_no_forces_zero_stock() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let clock = clock_at(now);
        let raw = VendorRawRecord::StringQuantity {
            id: "SKU003".to_string(),
            qty: Some("42".to_string()),
            cost: 10.0,
            available: "No".to_string(),
            updated_at: now,
        };
        let normalized = normalize(&raw, Duration::from_secs(600), &clock).unwrap();
        assert_eq!(normalized.stock, 0);
    }

    #[test]
    fn string_quantity_zero_qty_with_yes_yields_five() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let clock = clock_at(now);
        let raw = VendorRawRecord::StringQuantity {
            id: "SKU003".to_string(),
            qty: None,
            cost: 10.0,
            available: "YES".to_string(),
            updated_at: now,
        };
        let normalized = normalize(&raw, Duration::from_secs(600), &clock).unwrap();
        assert_eq!(normalized.stock, 5);
    }

    #[test]
    fn string_quantity_parse_failure_defaults_to_zero() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let clock = clock_at(now);
        let raw = VendorRawRecord::StringQuantity {
            id: "SKU003".to_string(),
            qty: Some("not-a-number".to_string()),
            cost: 10.0,
            available: "no".to_string(),
            updated_at: now,
        };
        let normalized = normalize(&raw, Duration::from_secs(600), &clock).unwrap();
        assert_eq!(normalized.stock, 0);
    }

    #[test]
    fn decimal_grammar_rejects_locale_formatted_strings() {
        assert_eq!(
            parse_decimal_string("1,234.56"),
            Err(RejectionReason::PriceParseFailure)
        );
        assert_eq!(parse_decimal_string("99.99"), Ok(99.99));
        assert_eq!(parse_decimal_string("100"), Ok(100.0));
    }
}
