use rust_decimal::Decimal;

/// Volume discount ladder applied to every breakdown regardless of
/// strategy. Ties at a boundary take the higher rate.
pub fn discount_rate(subtotal: Decimal) -> Decimal {
    if subtotal >= Decimal::new(100000, 2) {
        Decimal::new(7, 2)
    } else if subtotal >= Decimal::new(50000, 2) {
        Decimal::new(5, 2)
    } else {
        Decimal::ZERO
    }
}
