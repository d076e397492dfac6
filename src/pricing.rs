//! Pricing engine
//!
//! Pure price computation over cart items using `Decimal` internally and
//! `f64` at the boundaries. Monetary results are rounded to 2 decimal
//! places, half-up (MidpointAwayFromZero).

use rust_decimal::prelude::*;

use crate::error::{AppError, AppResult};
use crate::models::{CartItem, ItemKind};

/// Rounding: 2 decimal places, half-up
const DECIMAL_PLACES: u32 = 2;

/// Policy-fixed unit price for merchandise items. Deliberately ignores any
/// price stored on the item so a tampered cart cannot change it.
pub const MERCH_UNIT_PRICE: f64 = 149.99;

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

fn to_money(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Convert a major-unit price to minor currency units (cents) for the
/// gateway, half-up. Amounts that do not fit are an error, never a zero
/// price.
pub fn to_minor_units(value: f64) -> AppResult<i64> {
    (to_decimal(value) * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| AppError::validation(format!("amount out of range: {value}")))
}

/// Effective unit price of a cart item. Merch is always priced at
/// [`MERCH_UNIT_PRICE`]; other kinds use the stored unit price.
pub fn unit_price(item: &CartItem) -> f64 {
    match item.kind {
        ItemKind::Merch => MERCH_UNIT_PRICE,
        _ => item.unit_price,
    }
}

/// Sum of `unit_price * quantity` over all items, rounded to 2 dp
pub fn cart_total(items: &[CartItem]) -> f64 {
    let total = items
        .iter()
        .map(|item| to_decimal(unit_price(item)) * Decimal::from(item.quantity))
        .sum::<Decimal>();
    to_money(total)
}

/// Total quantity across all items
pub fn item_count(items: &[CartItem]) -> i64 {
    items.iter().map(|item| item.quantity).sum()
}

/// Price of a document print job.
///
/// `page_ranges` is a comma-separated list of `"a-b"` (inclusive) or single
/// page numbers; empty falls back to `total_document_pages` (default 1).
/// Multipliers: color x1.5, double-sided x0.75, A3 x1.25.
pub fn document_price(
    base_price_per_page: f64,
    copies: i64,
    page_ranges: &str,
    color: bool,
    double_sided: bool,
    paper_size: &str,
    total_document_pages: Option<i64>,
) -> AppResult<f64> {
    if copies <= 0 {
        return Err(AppError::validation("copies must be positive"));
    }

    let total_pages = count_pages(page_ranges, total_document_pages)?;

    let mut per_page = to_decimal(base_price_per_page);
    if color {
        per_page *= Decimal::new(15, 1); // 1.5
    }
    if double_sided {
        per_page *= Decimal::new(75, 2); // 0.75
    }
    if paper_size.eq_ignore_ascii_case("a3") {
        per_page *= Decimal::new(125, 2); // 1.25
    }

    let total = Decimal::from(total_pages) * Decimal::from(copies) * per_page;
    Ok(to_money(total))
}

/// Count pages selected by a range expression like "1-3,5".
fn count_pages(page_ranges: &str, total_document_pages: Option<i64>) -> AppResult<i64> {
    let trimmed = page_ranges.trim();
    if trimmed.is_empty() {
        let total = total_document_pages.unwrap_or(1);
        if total <= 0 {
            return Err(AppError::validation("document page count must be positive"));
        }
        return Ok(total);
    }

    let mut pages: i64 = 0;
    for part in trimmed.split(',') {
        let part = part.trim();
        match part.split_once('-') {
            Some((start, end)) => {
                let a = parse_page(start)?;
                let b = parse_page(end)?;
                if b < a {
                    return Err(AppError::validation(format!(
                        "invalid page range '{part}': end before start"
                    )));
                }
                pages += b - a + 1;
            }
            None => {
                parse_page(part)?;
                pages += 1;
            }
        }
    }
    Ok(pages)
}

fn parse_page(s: &str) -> AppResult<i64> {
    let page: i64 = s
        .trim()
        .parse()
        .map_err(|_| AppError::validation(format!("invalid page number '{}'", s.trim())))?;
    if page < 1 {
        return Err(AppError::validation(format!("invalid page number '{page}'")));
    }
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemOptions;

    fn item(kind: ItemKind, unit_price: f64, quantity: i64) -> CartItem {
        CartItem {
            service_id: "svc-1".into(),
            kind,
            name: "item".into(),
            unit_price,
            quantity,
            options: ItemOptions::default(),
        }
    }

    #[test]
    fn cart_total_sums_per_item_contributions() {
        let items = vec![
            item(ItemKind::Service, 10.50, 2),
            item(ItemKind::Document, 1.20, 3),
        ];
        assert_eq!(cart_total(&items), 24.60);
    }

    #[test]
    fn merch_price_ignores_tampered_price_field() {
        // Client claims the hoodie costs one cent
        let items = vec![item(ItemKind::Merch, 0.01, 3)];
        assert_eq!(cart_total(&items), 449.97); // 149.99 * 3
    }

    #[test]
    fn item_count_sums_quantities() {
        let items = vec![
            item(ItemKind::Service, 1.0, 2),
            item(ItemKind::Merch, 1.0, 5),
        ];
        assert_eq!(item_count(&items), 7);
        assert_eq!(item_count(&[]), 0);
    }

    #[test]
    fn document_price_with_ranges_and_modifiers() {
        // 4 pages x 2 copies x (0.10 x 1.5 x 1.25) = 1.50
        let price = document_price(0.10, 2, "1-3,5", true, false, "A3", Some(10)).unwrap();
        assert_eq!(price, 1.50);
    }

    #[test]
    fn document_price_empty_ranges_falls_back_to_total_pages() {
        let price = document_price(0.10, 1, "", false, false, "A4", Some(7)).unwrap();
        assert_eq!(price, 0.70);
    }

    #[test]
    fn document_price_defaults_to_single_page() {
        let price = document_price(0.10, 1, "", false, false, "A4", None).unwrap();
        assert_eq!(price, 0.10);
    }

    #[test]
    fn document_price_double_sided_discount() {
        // 10 pages x 1 copy x (0.10 x 0.75) = 0.75
        let price = document_price(0.10, 1, "1-10", false, true, "A4", None).unwrap();
        assert_eq!(price, 0.75);
    }

    #[test]
    fn malformed_page_ranges_are_rejected() {
        assert!(document_price(0.10, 1, "3-1", false, false, "A4", None).is_err());
        assert!(document_price(0.10, 1, "1-x", false, false, "A4", None).is_err());
        assert!(document_price(0.10, 1, "0", false, false, "A4", None).is_err());
        assert!(document_price(0.10, 1, "1,,3", false, false, "A4", None).is_err());
        assert!(document_price(0.10, 0, "1", false, false, "A4", None).is_err());
    }

    #[test]
    fn minor_units_are_exact_for_money_values() {
        assert_eq!(to_minor_units(149.99).unwrap(), 14999);
        assert_eq!(to_minor_units(0.10).unwrap(), 10);
        assert_eq!(to_minor_units(24.60).unwrap(), 2460);
    }

    #[test]
    fn minor_units_reject_amounts_that_do_not_fit() {
        assert!(to_minor_units(1e18).is_err());
    }

    #[test]
    fn rounding_is_half_up() {
        // 1 page x 1 copy x 0.125 -> 0.13
        let price = document_price(0.125, 1, "1", false, false, "A4", None).unwrap();
        assert_eq!(price, 0.13);
    }
}
