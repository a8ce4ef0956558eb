use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::booking::relay::{BookingRelay, RelayError, RelayReceipt};
use crate::domain::customer::CustomerDetails;
use crate::domain::service::ServiceId;
use crate::pricing::evaluator::PriceBreakdown;
use crate::pricing::format::format_amount;
use crate::pricing::state::CustomizationState;

/// One field-level problem found while validating a submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

/// All field issues for one submission attempt. Blocks delivery until the
/// customer fixes the listed fields.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("booking validation failed with {} issue(s)", .issues.len())]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

/// Everything the booking backend needs to act on a confirmed quote.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub customer: CustomerDetails,
    pub service_id: ServiceId,
    pub selections: CustomizationState,
    pub breakdown: PriceBreakdown,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum BookingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Relay(#[from] RelayError),
}

/// Checks the customer fields a submission must carry. Collects every
/// issue rather than stopping at the first, so a form can highlight all
/// problem fields at once.
pub fn validate_customer(customer: &CustomerDetails) -> Result<(), ValidationError> {
    let mut issues = Vec::new();

    if customer.name.trim().is_empty() {
        issues.push(FieldIssue {
            field: "name".to_string(),
            code: "REQUIRED_FIELD_EMPTY".to_string(),
            message: "Please tell us your name.".to_string(),
        });
    }

    let phone = customer.phone.trim();
    if phone.is_empty() {
        issues.push(FieldIssue {
            field: "phone".to_string(),
            code: "REQUIRED_FIELD_EMPTY".to_string(),
            message: "Please provide a contact number.".to_string(),
        });
    } else if phone.chars().filter(|ch| ch.is_ascii_digit()).count() < 7 {
        issues.push(FieldIssue {
            field: "phone".to_string(),
            code: "INVALID_PHONE".to_string(),
            message: "Enter a phone number with at least 7 digits.".to_string(),
        });
    }

    if let Some(email) = customer.email.as_deref() {
        let email = email.trim();
        if !email.is_empty() && !looks_like_email(email) {
            issues.push(FieldIssue {
                field: "email".to_string(),
                code: "INVALID_EMAIL".to_string(),
                message: "Enter an email address like name@example.com.".to_string(),
            });
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { issues })
    }
}

fn looks_like_email(candidate: &str) -> bool {
    let mut parts = candidate.splitn(2, '@');
    matches!(
        (parts.next(), parts.next()),
        (Some(local), Some(domain)) if !local.is_empty() && !domain.is_empty()
    )
}

/// Validates and delivers one booking. Exactly one delivery attempt is
/// made; a relay failure is returned to the caller to present as a notice,
/// never retried here.
pub async fn submit_booking<R, S>(
    relay: &R,
    sink: &S,
    audit: &AuditContext,
    request: &BookingRequest,
) -> Result<RelayReceipt, BookingError>
where
    R: BookingRelay,
    S: AuditSink,
{
    if let Err(validation) = validate_customer(&request.customer) {
        sink.emit(
            AuditEvent::new(
                Some(request.service_id.clone()),
                None,
                audit.correlation_id.clone(),
                "booking.validation_rejected",
                AuditCategory::Booking,
                audit.actor.clone(),
                AuditOutcome::Rejected,
            )
            .with_metadata("issues", validation.issues.len().to_string()),
        );
        return Err(validation.into());
    }

    match relay.deliver(request).await {
        Ok(receipt) => {
            sink.emit(
                AuditEvent::new(
                    Some(request.service_id.clone()),
                    Some(receipt.reference.clone()),
                    audit.correlation_id.clone(),
                    "booking.submission_accepted",
                    AuditCategory::Booking,
                    audit.actor.clone(),
                    AuditOutcome::Success,
                )
                .with_metadata("total", format_amount(request.breakdown.total)),
            );
            Ok(receipt)
        }
        Err(error) => {
            sink.emit(
                AuditEvent::new(
                    Some(request.service_id.clone()),
                    None,
                    audit.correlation_id.clone(),
                    "booking.submission_failed",
                    AuditCategory::Booking,
                    audit.actor.clone(),
                    AuditOutcome::Failed,
                )
                .with_metadata("error", error.to_string()),
            );
            Err(error.into())
        }
    }
}
