use serde::Serialize;

use crate::commands::{
    apply_selection, build_runtime, load_catalog, resolve_promo, CommandResult, Failure,
};
use pricebook_core::config::{AppConfig, LoadOptions};
use pricebook_core::pricing::evaluator::PriceBreakdown;
use pricebook_core::pricing::format::render_breakdown;

#[derive(Debug, Clone)]
pub struct QuoteOptions {
    pub load: LoadOptions,
    pub service: String,
    pub size: Option<String>,
    pub counts: Vec<String>,
    pub add_ons: Vec<String>,
    pub promo_code: Option<String>,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct QuoteReport<'a> {
    command: &'static str,
    status: &'static str,
    service_id: &'a str,
    service_name: &'a str,
    breakdown: &'a PriceBreakdown,
    notices: &'a [String],
}

pub fn run(options: QuoteOptions) -> CommandResult {
    match execute(options) {
        Ok(result) => result,
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("quote", error_class, message, exit_code)
        }
    }
}

fn execute(options: QuoteOptions) -> Result<CommandResult, Failure> {
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

    let mut notices = Vec::new();
    if let Some(code) = &options.promo_code {
        let runtime = build_runtime()?;
        if let Some(reason) = resolve_promo(&runtime, &config, &mut session, code)? {
            notices.push(format!(
                "promo code {} was not applied: {reason}",
                code.trim().to_ascii_uppercase()
            ));
        }
    }
    if let Some(error) = session.last_error() {
        notices.push(format!("showing the base price only ({error})"));
    }

    if options.json {
        let report = QuoteReport {
            command: "quote",
            status: "ok",
            service_id: &session.service().id.0,
            service_name: &session.service().name,
            breakdown: session.breakdown(),
            notices: &notices,
        };
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"command\":\"quote\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
                error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
            )
        });
        return Ok(CommandResult { exit_code: 0, output });
    }

    let mut lines = vec![format!("{} ({})", session.service().name, session.service().id.0)];
    lines.extend(render_breakdown(session.breakdown()));
    lines.extend(notices.iter().map(|notice| format!("note: {notice}")));

    Ok(CommandResult { exit_code: 0, output: lines.join("\n") })
}
