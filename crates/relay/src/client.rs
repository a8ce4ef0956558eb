use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use pricebook_core::booking::relay::{BookingRelay, RelayError, RelayReceipt};
use pricebook_core::booking::submission::BookingRequest;
use pricebook_core::config::BookingConfig;
use pricebook_core::pricing::format::format_amount;

/// Delivers bookings to the backend over HTTPS. One POST per submission,
/// no retries; retry policy belongs to the caller presenting the notice.
pub struct HttpBookingRelay {
    client: Client,
    endpoint: String,
    api_key: Option<SecretString>,
}

impl HttpBookingRelay {
    pub fn from_config(config: &BookingConfig) -> Result<Self> {
        let endpoint = config
            .relay_url
            .clone()
            .ok_or_else(|| anyhow!("booking.relay_url is not configured"))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.relay_timeout_secs))
            .build()
            .context("failed to build booking relay HTTP client")?;

        Ok(Self { client, endpoint, api_key: config.relay_api_key.clone() })
    }
}

#[async_trait]
impl BookingRelay for HttpBookingRelay {
    async fn deliver(&self, request: &BookingRequest) -> Result<RelayReceipt, RelayError> {
        let payload = WireBooking::from_request(request);
        debug!(service_id = %request.service_id.0, endpoint = %self.endpoint, "delivering booking");

        let mut http_request = self.client.post(&self.endpoint).json(&payload);
        if let Some(api_key) = &self.api_key {
            http_request = http_request.bearer_auth(api_key.expose_secret());
        }

        let response = http_request.send().await.map_err(|error| {
            warn!(error = %error, "booking relay request failed");
            RelayError::Unreachable { reason: error.to_string() }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let receipt: WireReceipt = response.json().await.map_err(|error| {
            RelayError::Rejected {
                reason: format!("booking service returned an unreadable acknowledgement: {error}"),
            }
        })?;

        info!(reference = %receipt.reference, "booking accepted by relay");
        Ok(RelayReceipt { reference: receipt.reference })
    }
}

fn classify_failure(status: StatusCode, body: &str) -> RelayError {
    let snippet: String = body.chars().take(200).collect();
    let reason = if snippet.trim().is_empty() {
        format!("booking service returned {status}")
    } else {
        format!("booking service returned {status}: {}", snippet.trim())
    };

    if status.is_server_error() {
        RelayError::Unreachable { reason }
    } else {
        RelayError::Rejected { reason }
    }
}

/// Wire shape of a booking submission. The backend speaks camelCase and
/// expects monetary amounts as two-decimal strings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireBooking {
    customer_name: String,
    customer_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_email: Option<String>,
    service_id: String,
    selections: WireSelections,
    breakdown: WireBreakdown,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireSelections {
    #[serde(skip_serializing_if = "Option::is_none")]
    unit_type: Option<String>,
    counts: std::collections::BTreeMap<String, u32>,
    add_on_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireBreakdown {
    line_items: Vec<WireLineItem>,
    subtotal: String,
    discount_rate: String,
    discount_amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    promo_discount: Option<WirePromo>,
    total: String,
}

#[derive(Debug, Serialize)]
struct WireLineItem {
    label: String,
    amount: String,
}

#[derive(Debug, Serialize)]
struct WirePromo {
    code: String,
    amount: String,
}

#[derive(Debug, Deserialize)]
struct WireReceipt {
    reference: String,
}

impl WireBooking {
    fn from_request(request: &BookingRequest) -> Self {
        let email = request
            .customer
            .email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(str::to_string);

        Self {
            customer_name: request.customer.name.clone(),
            customer_phone: request.customer.phone.clone(),
            customer_email: email,
            service_id: request.service_id.0.clone(),
            selections: WireSelections {
                unit_type: request.selections.selected_unit_type.clone(),
                counts: request.selections.counts.clone(),
                add_on_ids: request
                    .selections
                    .selected_add_on_ids
                    .iter()
                    .map(|id| id.0.clone())
                    .collect(),
            },
            breakdown: WireBreakdown {
                line_items: request
                    .breakdown
                    .line_items
                    .iter()
                    .map(|item| WireLineItem {
                        label: item.label.clone(),
                        amount: format_amount(item.amount),
                    })
                    .collect(),
                subtotal: format_amount(request.breakdown.subtotal),
                discount_rate: request.breakdown.discount_rate.to_string(),
                discount_amount: format_amount(request.breakdown.discount_amount),
                promo_discount: request.breakdown.promo_discount.as_ref().map(|promo| {
                    WirePromo { code: promo.code.clone(), amount: format_amount(promo.amount) }
                }),
                total: format_amount(request.breakdown.total),
            },
        }
    }
}
