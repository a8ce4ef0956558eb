use rust_decimal::{Decimal, RoundingStrategy};

use crate::pricing::evaluator::PriceBreakdown;

/// Plain two-decimal amount, used for wire payloads and audit metadata.
/// Amounts are rounded here and nowhere upstream.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

/// Two-decimal currency rendering for display surfaces.
pub fn format_aed(amount: Decimal) -> String {
    format!("AED {}", format_amount(amount))
}

/// Renders a breakdown as ordered display lines: every line item, the
/// subtotal, the volume discount when one applies, the promo deduction
/// when one was supplied, and the final total.
pub fn render_breakdown(breakdown: &PriceBreakdown) -> Vec<String> {
    let mut lines = Vec::with_capacity(breakdown.line_items.len() + 4);

    for item in &breakdown.line_items {
        lines.push(format!("{}: {}", item.label, format_aed(item.amount)));
    }
    lines.push(format!("Subtotal: {}", format_aed(breakdown.subtotal)));

    if breakdown.discount_rate > Decimal::ZERO {
        let percent = (breakdown.discount_rate * Decimal::ONE_HUNDRED).normalize();
        lines.push(format!(
            "Volume discount ({percent}%): -{}",
            format_aed(breakdown.discount_amount)
        ));
    }
    if let Some(promo) = &breakdown.promo_discount {
        lines.push(format!("Promo code {}: -{}", promo.code, format_aed(promo.amount)));
    }

    lines.push(format!("Total: {}", format_aed(breakdown.total)));
    lines
}

pub fn format_total(breakdown: &PriceBreakdown) -> String {
    format_aed(breakdown.total)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::pricing::evaluator::{LineItem, PriceBreakdown, PromoDiscount};

    use super::{format_aed, render_breakdown};

    #[test]
    fn amounts_render_with_two_decimals_and_currency() {
        assert_eq!(format_aed(Decimal::new(15000, 2)), "AED 150.00");
        assert_eq!(format_aed(Decimal::new(61750, 2)), "AED 617.50");
        assert_eq!(format_aed(Decimal::from(80)), "AED 80.00");
    }

    #[test]
    fn presentation_rounds_midpoints_away_from_zero() {
        assert_eq!(format_aed(Decimal::new(99995, 3)), "AED 100.00");
        assert_eq!(format_aed(Decimal::new(12345, 3)), "AED 12.35");
    }

    #[test]
    fn rendered_breakdown_lists_items_discount_and_total_in_order() {
        let breakdown = PriceBreakdown {
            line_items: vec![
                LineItem { label: "Base".to_string(), amount: Decimal::new(10000, 2) },
                LineItem { label: "bathrooms × 5".to_string(), amount: Decimal::new(40000, 2) },
                LineItem { label: "Window Cleaning".to_string(), amount: Decimal::new(15000, 2) },
            ],
            subtotal: Decimal::new(65000, 2),
            discount_rate: Decimal::new(5, 2),
            discount_amount: Decimal::new(3250, 2),
            promo_discount: None,
            total: Decimal::new(61750, 2),
        };

        let lines = render_breakdown(&breakdown);
        assert_eq!(
            lines,
            vec![
                "Base: AED 100.00".to_string(),
                "bathrooms × 5: AED 400.00".to_string(),
                "Window Cleaning: AED 150.00".to_string(),
                "Subtotal: AED 650.00".to_string(),
                "Volume discount (5%): -AED 32.50".to_string(),
                "Total: AED 617.50".to_string(),
            ]
        );
    }

    #[test]
    fn promo_renders_as_its_own_deduction_line() {
        let breakdown = PriceBreakdown {
            line_items: vec![LineItem {
                label: "Base".to_string(),
                amount: Decimal::new(40000, 2),
            }],
            subtotal: Decimal::new(40000, 2),
            discount_rate: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            promo_discount: Some(PromoDiscount {
                code: "WELCOME50".to_string(),
                amount: Decimal::new(5000, 2),
            }),
            total: Decimal::new(35000, 2),
        };

        let lines = render_breakdown(&breakdown);
        assert!(lines.contains(&"Promo code WELCOME50: -AED 50.00".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("Total: AED 350.00"));
    }
}
