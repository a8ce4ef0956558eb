use uuid::Uuid;

use crate::commands::{
    apply_selection, build_runtime, load_catalog, resolve_promo, CommandResult, Failure,
};
use pricebook_core::audit::{
    AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink,
};
use pricebook_core::booking::relay::NoopRelay;
use pricebook_core::booking::submission::{
    submit_booking, BookingError, BookingRequest, ValidationError,
};
use pricebook_core::config::{AppConfig, LoadOptions};
use pricebook_core::domain::customer::CustomerDetails;
use pricebook_core::errors::ApplicationError;
use pricebook_core::pricing::format::format_total;
use pricebook_relay::{quote_handoff_link, HttpBookingRelay};

#[derive(Debug, Clone)]
pub struct BookOptions {
    pub load: LoadOptions,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub service: String,
    pub size: Option<String>,
    pub counts: Vec<String>,
    pub add_ons: Vec<String>,
    pub promo_code: Option<String>,
    pub send: bool,
}

pub fn run(options: BookOptions) -> CommandResult {
    match execute(options) {
        Ok(result) => result,
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("book", error_class, message, exit_code)
        }
    }
}

fn execute(options: BookOptions) -> Result<CommandResult, Failure> {
    let config = AppConfig::load(options.load.clone())
        .map_err(|error| ("config_validation", format!("configuration issue: {error}"), 2u8))?;
    let catalog = load_catalog(&config)?;

    let mut session = apply_selection(
        &catalog,
        &options.service,
        options.size.as_deref(),
        &options.counts,
        &options.add_ons,
    )?;

    let runtime = build_runtime()?;
    let mut notices = Vec::new();
    if let Some(code) = &options.promo_code {
        if let Some(reason) = resolve_promo(&runtime, &config, &mut session, code)? {
            notices.push(format!(
                "promo code {} was not applied: {reason}",
                code.trim().to_ascii_uppercase()
            ));
        }
    }

    let request = BookingRequest {
        customer: CustomerDetails {
            name: options.name.clone(),
            phone: options.phone.clone(),
            email: options.email.clone(),
        },
        service_id: session.service().id.clone(),
        selections: session.state().clone(),
        breakdown: session.breakdown().clone(),
    };

    let sink = InMemoryAuditSink::default();
    let audit = AuditContext::new(
        Some(request.service_id.clone()),
        None,
        Uuid::new_v4().to_string(),
        "pricebook-cli",
    );

    // A degraded price is still bookable, but the trail records that the
    // submitted total came from the base-price fallback.
    if let Some(error) = session.last_error() {
        sink.emit(
            AuditEvent::new(
                audit.service_id.clone(),
                None,
                audit.correlation_id.clone(),
                "pricing.fallback_applied",
                AuditCategory::Pricing,
                audit.actor.clone(),
                AuditOutcome::Success,
            )
            .with_metadata("reason", error.to_string()),
        );
    }

    let outcome = if options.send {
        if config.booking.relay_url.is_none() {
            return Err((
                "relay_unconfigured",
                "booking.relay_url is not configured; drop --send to keep the booking local"
                    .to_string(),
                2u8,
            ));
        }
        let relay = HttpBookingRelay::from_config(&config.booking)
            .map_err(|error| ("relay_client", format!("{error:#}"), 1u8))?;
        runtime.block_on(submit_booking(&relay, &sink, &audit, &request))
    } else {
        runtime.block_on(submit_booking(&NoopRelay::default(), &sink, &audit, &request))
    };
    log_audit_trail(&sink);

    let receipt = match outcome {
        Ok(receipt) => receipt,
        Err(BookingError::Validation(validation)) => {
            return Err(("booking_validation", render_issues(&validation), 2u8));
        }
        Err(BookingError::Relay(error)) => {
            let notice = ApplicationError::Relay(error.to_string())
                .into_interface(audit.correlation_id.clone())
                .user_message();
            return Err(("relay_delivery", format!("{notice} ({error})"), 1u8));
        }
    };

    let mut message = if options.send {
        format!(
            "booking delivered for {} (reference {})",
            session.service().name,
            receipt.reference
        )
    } else {
        format!(
            "booking for {} validated and kept local (reference {}); pass --send to deliver",
            session.service().name,
            receipt.reference
        )
    };
    message.push_str(&format!("\n  - total: {}", format_total(session.breakdown())));
    for notice in &notices {
        message.push_str(&format!("\n  - {notice}"));
    }
    match &config.booking.whatsapp_phone {
        Some(phone) => {
            let link = quote_handoff_link(phone, session.service(), session.breakdown())
                .map_err(|error| ("handoff_link", format!("{error:#}"), 1u8))?;
            message.push_str(&format!("\n  - whatsapp: {link}"));
        }
        None => {
            message
                .push_str("\n  - whatsapp: unavailable (booking.whatsapp_phone is not configured)");
        }
    }

    Ok(CommandResult::success("book", message))
}

fn render_issues(validation: &ValidationError) -> String {
    let mut lines = vec![format!("booking rejected with {} issue(s):", validation.issues.len())];
    for issue in &validation.issues {
        lines.push(format!("  - {}: {} ({})", issue.field, issue.message, issue.code));
    }
    lines.join("\n")
}

fn log_audit_trail(sink: &InMemoryAuditSink) {
    for event in sink.events() {
        tracing::info!(
            event_name = %event.event_type,
            correlation_id = %event.correlation_id,
            outcome = ?event.outcome,
            "audit event"
        );
    }
}
