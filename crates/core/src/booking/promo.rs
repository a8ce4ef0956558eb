use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::service::ServiceId;

/// The result of checking one promo code against an order. An invalid
/// outcome carries a customer-facing reason and a zero discount.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromoOutcome {
    pub valid: bool,
    pub discount: Decimal,
    pub reason: Option<String>,
}

impl PromoOutcome {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self { valid: false, discount: Decimal::ZERO, reason: Some(reason.into()) }
    }
}

/// Promo validation seam. The remote implementation lives in the relay
/// crate; `StaticPromoValidator` covers offline use.
#[async_trait]
pub trait PromoValidator: Send + Sync {
    async fn validate(
        &self,
        code: &str,
        order_amount: Decimal,
        service_ids: &[ServiceId],
    ) -> PromoOutcome;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PromoKind {
    Percent,
    Flat,
}

/// Seed rows for the built-in promo table. `value` is whole percent for
/// `Percent` codes and fils for `Flat` codes; `min_order` is fils.
#[derive(Debug, Clone, Copy)]
struct PromoSeed {
    code: &'static str,
    kind: PromoKind,
    value: i64,
    min_order: i64,
}

const PROMO_SEEDS: &[PromoSeed] = &[
    PromoSeed { code: "WELCOME10", kind: PromoKind::Percent, value: 10, min_order: 0 },
    PromoSeed { code: "CLEAN50", kind: PromoKind::Flat, value: 5_000, min_order: 30_000 },
    PromoSeed { code: "SPARKLE15", kind: PromoKind::Percent, value: 15, min_order: 50_000 },
];

/// Validates codes against the compiled-in promo table. Codes match
/// case-insensitively; the discount never exceeds the order amount.
#[derive(Clone, Debug, Default)]
pub struct StaticPromoValidator;

#[async_trait]
impl PromoValidator for StaticPromoValidator {
    async fn validate(
        &self,
        code: &str,
        order_amount: Decimal,
        _service_ids: &[ServiceId],
    ) -> PromoOutcome {
        let normalized = code.trim().to_ascii_uppercase();
        let Some(seed) = PROMO_SEEDS.iter().find(|seed| seed.code == normalized) else {
            return PromoOutcome::invalid("This promo code is not recognised.");
        };

        let min_order = Decimal::new(seed.min_order, 2);
        if order_amount < min_order {
            return PromoOutcome::invalid(format!(
                "This code needs a minimum order of AED {min_order:.2}."
            ));
        }

        let discount = match seed.kind {
            PromoKind::Percent => order_amount * Decimal::new(seed.value, 2),
            PromoKind::Flat => Decimal::new(seed.value, 2),
        };

        PromoOutcome { valid: true, discount: discount.min(order_amount), reason: None }
    }
}
