use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use pricebook_core::booking::promo::{PromoOutcome, PromoValidator};
use pricebook_core::config::PromoConfig;
use pricebook_core::domain::service::ServiceId;
use pricebook_core::pricing::format::format_amount;

const UNCHECKABLE: &str = "We could not check this promo code right now.";

/// Checks promo codes against the remote promotion service. Any transport
/// or decoding failure degrades to an invalid outcome with a customer
/// notice; a promo check never blocks quoting.
pub struct HttpPromoValidator {
    client: Client,
    endpoint: String,
}

impl HttpPromoValidator {
    pub fn from_config(config: &PromoConfig) -> Result<Self> {
        let endpoint =
            config.endpoint.clone().ok_or_else(|| anyhow!("promo.endpoint is not configured"))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build promo HTTP client")?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl PromoValidator for HttpPromoValidator {
    async fn validate(
        &self,
        code: &str,
        order_amount: Decimal,
        service_ids: &[ServiceId],
    ) -> PromoOutcome {
        let payload = WirePromoCheck {
            code: code.trim().to_string(),
            order_amount: format_amount(order_amount),
            service_ids: service_ids.iter().map(|id| id.0.clone()).collect(),
        };

        let response = match self.client.post(&self.endpoint).json(&payload).send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(error = %error, "promo validation request failed");
                return PromoOutcome::invalid(UNCHECKABLE);
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "promo service returned a failure status");
            return PromoOutcome::invalid(UNCHECKABLE);
        }

        match response.json::<WirePromoVerdict>().await {
            Ok(verdict) => outcome_from_verdict(verdict, order_amount),
            Err(error) => {
                warn!(error = %error, "promo service returned an unreadable verdict");
                PromoOutcome::invalid(UNCHECKABLE)
            }
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WirePromoCheck {
    code: String,
    order_amount: String,
    service_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WirePromoVerdict {
    valid: bool,
    #[serde(default)]
    discount: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

fn outcome_from_verdict(verdict: WirePromoVerdict, order_amount: Decimal) -> PromoOutcome {
    if !verdict.valid {
        return PromoOutcome {
            valid: false,
            discount: Decimal::ZERO,
            reason: verdict.reason.or_else(|| Some("This promo code is not valid.".to_string())),
        };
    }

    let discount = match verdict.discount.as_deref().map(str::parse::<Decimal>) {
        Some(Ok(discount)) => discount.max(Decimal::ZERO).min(order_amount),
        Some(Err(_)) | None => {
            warn!("promo verdict was valid but carried no usable discount");
            return PromoOutcome::invalid(UNCHECKABLE);
        }
    };

    PromoOutcome { valid: true, discount, reason: None }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{outcome_from_verdict, WirePromoCheck, WirePromoVerdict};

    #[test]
    fn check_request_uses_camel_case_and_formatted_amount() {
        let payload = WirePromoCheck {
            code: "WELCOME10".to_string(),
            order_amount: "912.00".to_string(),
            service_ids: vec!["maid-service".to_string()],
        };
        let value = serde_json::to_value(&payload).expect("payload serializes");

        assert_eq!(value["code"], "WELCOME10");
        assert_eq!(value["orderAmount"], "912.00");
        assert_eq!(value["serviceIds"][0], "maid-service");
    }

    #[test]
    fn valid_verdict_parses_and_caps_the_discount() {
        let verdict: WirePromoVerdict =
            serde_json::from_str(r#"{ "valid": true, "discount": "150.00" }"#)
                .expect("verdict parses");

        let outcome = outcome_from_verdict(verdict, Decimal::new(10_000, 2));
        assert!(outcome.valid);
        assert_eq!(outcome.discount, Decimal::new(10_000, 2));
    }

    #[test]
    fn invalid_verdict_carries_the_service_reason() {
        let verdict: WirePromoVerdict =
            serde_json::from_str(r#"{ "valid": false, "reason": "Code expired." }"#)
                .expect("verdict parses");

        let outcome = outcome_from_verdict(verdict, Decimal::new(10_000, 2));
        assert!(!outcome.valid);
        assert_eq!(outcome.discount, Decimal::ZERO);
        assert_eq!(outcome.reason.as_deref(), Some("Code expired."));
    }

    #[test]
    fn valid_verdict_without_a_discount_is_treated_as_uncheckable() {
        let verdict: WirePromoVerdict =
            serde_json::from_str(r#"{ "valid": true }"#).expect("verdict parses");

        let outcome = outcome_from_verdict(verdict, Decimal::new(10_000, 2));
        assert!(!outcome.valid);
        assert!(outcome.reason.is_some());
    }
}
