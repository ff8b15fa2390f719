//! Presentation helpers: money, quantities, dates, phone masks, and the
//! cart summary shared by the cart screen, order confirmations, and admin
//! notifications.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use greengrocer_core::{CartItem, PhoneNumber, Unit};

use crate::store::JsonStore;

/// Format an amount of money, always with two decimals: `180.50 ₽`.
#[must_use]
pub fn money(amount: Decimal) -> String {
    format!("{:.2} ₽", amount.round_dp(2))
}

/// Format money compactly, trimming trailing zeros: `180 ₽`, `0.5 ₽`.
#[must_use]
pub fn money_compact(amount: Decimal) -> String {
    format!("{} ₽", amount.round_dp(2).normalize())
}

/// Format a quantity in its unit: `2 pc`, `0.5 kg`.
#[must_use]
pub fn quantity(amount: Decimal, unit: Unit) -> String {
    format!("{} {}", amount.round_dp(2).normalize(), unit.label())
}

/// Format a timestamp for display: `15.01.2026 10:30`.
#[must_use]
pub fn date(at: DateTime<Utc>) -> String {
    at.format("%d.%m.%Y %H:%M").to_string()
}

/// Render the phone pad's progress mask: `912___-__-__` style fill over
/// the `XXX-XXX-XX-XX` national shape.
#[must_use]
pub fn phone_mask(digits: &str) -> String {
    let mut out = String::with_capacity(13);
    let mut taken = digits.chars().filter(char::is_ascii_digit);
    for (i, _) in "XXX-XXX-XX-XX".char_indices() {
        if matches!(i, 3 | 7 | 10) {
            out.push('-');
        } else {
            out.push(taken.next().unwrap_or('_'));
        }
    }
    out
}

/// Parse a user-typed decimal: comma accepted as the decimal point, must
/// be strictly positive.
#[must_use]
pub fn parse_decimal_input(text: &str) -> Option<Decimal> {
    let cleaned = text.trim().replace(',', ".");
    let value: Decimal = cleaned.parse().ok()?;
    (value > Decimal::ZERO).then_some(value)
}

/// One display line of a cart or order snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryLine {
    /// Product name.
    pub name: String,
    /// Quantity with unit, formatted.
    pub quantity: String,
    /// Line total, formatted.
    pub line_total: String,
}

/// Rendered cart or order-snapshot contents.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// One line per product still in the catalogue.
    pub lines: Vec<SummaryLine>,
    /// Sum over the rendered lines.
    pub total: Decimal,
}

impl Summary {
    /// Whether nothing could be rendered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Render as a text block, one line per product plus the total.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&format!(
                "• {} — {} — {}\n",
                line.name, line.quantity, line.line_total
            ));
        }
        out.push_str(&format!("\nTotal: {}", money(self.total)));
        out
    }
}

/// Build a [`Summary`] from cart lines against the current catalogue.
///
/// Lines whose product has been deleted are skipped entirely; they show
/// nowhere and contribute nothing to the total.
#[must_use]
pub fn summarize(store: &JsonStore, items: &[CartItem]) -> Summary {
    let mut lines = Vec::new();
    let mut total = Decimal::ZERO;
    for item in items {
        let Some(product) = store.product(item.product_id) else {
            continue;
        };
        let line_total = product.price * item.quantity;
        total += line_total;
        lines.push(SummaryLine {
            name: product.name.clone(),
            quantity: quantity(item.quantity, product.unit),
            line_total: money(line_total),
        });
    }
    Summary { lines, total }
}

/// Render an order header for detail screens and notifications.
#[must_use]
pub fn order_header(
    order_id: greengrocer_core::OrderId,
    created_at: DateTime<Utc>,
    phone: &PhoneNumber,
    address: &str,
) -> String {
    format!(
        "Order #{order_id} from {}\nPhone: {phone}\nAddress: {address}",
        date(created_at)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_money_always_two_decimals() {
        assert_eq!(money(Decimal::new(1805, 1)), "180.50 ₽");
        assert_eq!(money(Decimal::new(100, 0)), "100.00 ₽");
    }

    #[test]
    fn test_money_compact_trims_zeros() {
        assert_eq!(money_compact(Decimal::new(18000, 2)), "180 ₽");
        assert_eq!(money_compact(Decimal::new(50, 2)), "0.5 ₽");
    }

    #[test]
    fn test_quantity_by_unit() {
        assert_eq!(quantity(Decimal::new(2, 0), Unit::Piece), "2 pc");
        assert_eq!(quantity(Decimal::new(25, 2), Unit::Kg), "0.25 kg");
        assert_eq!(quantity(Decimal::new(500, 3), Unit::Kg), "0.5 kg");
    }

    #[test]
    fn test_date_format() {
        let at = Utc.with_ymd_and_hms(2026, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(date(at), "15.01.2026 10:30");
    }

    #[test]
    fn test_phone_mask_fill() {
        assert_eq!(phone_mask(""), "___-___-__-__");
        assert_eq!(phone_mask("912"), "912-___-__-__");
        assert_eq!(phone_mask("91234"), "912-34_-__-__");
        assert_eq!(phone_mask("9123456789"), "912-345-67-89");
    }

    #[test]
    fn test_parse_decimal_input_accepts_comma() {
        assert_eq!(parse_decimal_input("1,5"), Some(Decimal::new(15, 1)));
        assert_eq!(parse_decimal_input(" 180.50 "), Some(Decimal::new(18050, 2)));
        assert_eq!(parse_decimal_input("0"), None);
        assert_eq!(parse_decimal_input("-3"), None);
        assert_eq!(parse_decimal_input("abc"), None);
    }

    #[test]
    fn test_summary_text_contains_total() {
        let summary = Summary {
            lines: vec![SummaryLine {
                name: "Apples".to_owned(),
                quantity: "0.5 kg".to_owned(),
                line_total: "50.00 ₽".to_owned(),
            }],
            total: Decimal::new(5000, 2),
        };
        let text = summary.to_text();
        assert!(text.contains("Apples"));
        assert!(text.contains("Total: 50.00 ₽"));
    }
}
