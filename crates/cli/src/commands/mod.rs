pub mod book;
pub mod catalog;
pub mod config;
pub mod doctor;
pub mod quote;

use serde::Serialize;
use tokio::runtime::Runtime;

use pricebook_core::booking::promo::{PromoValidator, StaticPromoValidator};
use pricebook_core::config::AppConfig;
use pricebook_core::domain::addon::AddOnId;
use pricebook_core::domain::service::ServiceId;
use pricebook_core::pricing::evaluator::PromoDiscount;
use pricebook_core::pricing::session::QuoteSession;
use pricebook_core::pricing::table::Catalog;
use pricebook_relay::HttpPromoValidator;

/// Command failure as (error class, message, exit code).
pub(crate) type Failure = (&'static str, String, u8);

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Catalog sourcing shared by every command: the configured JSON file
/// when one is set, the embedded seeds otherwise.
pub(crate) fn load_catalog(config: &AppConfig) -> Result<Catalog, Failure> {
    match &config.catalog.path {
        Some(path) => {
            Catalog::from_json_file(path).map_err(|error| ("catalog_source", error.to_string(), 1u8))
        }
        None => Ok(Catalog::embedded()),
    }
}

pub(crate) fn build_runtime() -> Result<Runtime, Failure> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        ("runtime_init", format!("failed to initialize async runtime: {error}"), 1u8)
    })
}

/// Opens a quote session and applies the selection flags in order: size
/// first, then count dials, then add-on toggles. Unknown dial keys and
/// add-on ids fall through silently, the same as disabled controls.
pub(crate) fn apply_selection(
    catalog: &Catalog,
    service: &str,
    size: Option<&str>,
    counts: &[String],
    add_ons: &[String],
) -> Result<QuoteSession, Failure> {
    let service_id = ServiceId(service.to_string());
    let mut session = QuoteSession::open(catalog, &service_id)
        .map_err(|error| ("unknown_service", error.to_string(), 2u8))?;

    if let Some(label) = size {
        session.select_unit_type(label);
    }
    for raw in counts {
        let (key, target) = parse_count(raw)?;
        set_count(&mut session, &key, target);
    }
    for raw in add_ons {
        session.toggle_add_on(&AddOnId(raw.clone()));
    }

    Ok(session)
}

pub(crate) fn parse_count(raw: &str) -> Result<(String, u32), Failure> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(("selection_parse", format!("--count expects KEY=VALUE, got `{raw}`"), 2u8));
    };

    let target = value.trim().parse::<u32>().map_err(|_| {
        (
            "selection_parse",
            format!("--count {} expects a whole number, got `{}`", key.trim(), value.trim()),
            2u8,
        )
    })?;

    Ok((key.trim().to_string(), target))
}

/// Moves a count dial to an absolute target. The session API is built
/// around +/- deltas, so the target is translated against the current
/// effective count and still clamps at the dial bounds.
fn set_count(session: &mut QuoteSession, key: &str, target: u32) {
    let Some(current) = session
        .rule()
        .and_then(|rule| rule.dial(key))
        .map(|dial| dial.effective(&session.state().counts))
    else {
        return;
    };

    let delta = i64::from(target) - i64::from(current);
    session.adjust_count(key, delta.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32);
}

/// Checks a promo code with the configured endpoint, or the built-in code
/// table when none is set. A valid code is applied to the session; a
/// rejected code comes back as a notice and the quote stays usable.
pub(crate) fn resolve_promo(
    runtime: &Runtime,
    config: &AppConfig,
    session: &mut QuoteSession,
    code: &str,
) -> Result<Option<String>, Failure> {
    let normalized = code.trim().to_ascii_uppercase();
    let order_amount = session.breakdown().total;
    let service_ids = [session.service().id.clone()];

    let outcome = match &config.promo.endpoint {
        Some(_) => {
            let validator = HttpPromoValidator::from_config(&config.promo)
                .map_err(|error| ("promo_client", format!("{error:#}"), 1u8))?;
            runtime.block_on(validator.validate(&normalized, order_amount, &service_ids))
        }
        None => {
            runtime.block_on(StaticPromoValidator.validate(&normalized, order_amount, &service_ids))
        }
    };

    if outcome.valid {
        session.apply_promo(PromoDiscount { code: normalized, amount: outcome.discount });
        return Ok(None);
    }

    Ok(Some(outcome.reason.unwrap_or_else(|| "This promo code is not valid.".to_string())))
}
