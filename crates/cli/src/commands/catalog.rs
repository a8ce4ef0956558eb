use serde::Serialize;

use crate::commands::{load_catalog, CommandResult, Failure};
use pricebook_core::config::{AppConfig, LoadOptions};
use pricebook_core::pricing::format::format_amount;
use pricebook_core::pricing::rules::PricingRule;
use pricebook_core::pricing::table::CatalogViolation;

#[derive(Debug, Clone)]
pub struct CatalogOptions {
    pub load: LoadOptions,
    pub validate: bool,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ServiceRow {
    id: String,
    name: String,
    category: String,
    base_price: String,
    pricing: Option<String>,
}

#[derive(Debug, Serialize)]
struct AddOnRow {
    id: String,
    name: String,
    price: String,
    recommended: bool,
}

#[derive(Debug, Serialize)]
struct CatalogReport {
    command: &'static str,
    status: &'static str,
    source: String,
    services: Vec<ServiceRow>,
    add_ons: Vec<AddOnRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    violations: Option<Vec<CatalogViolation>>,
}

pub fn run(options: CatalogOptions) -> CommandResult {
    match execute(options) {
        Ok(result) => result,
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("catalog", error_class, message, exit_code)
        }
    }
}

fn execute(options: CatalogOptions) -> Result<CommandResult, Failure> {
    let config = AppConfig::load(options.load.clone())
        .map_err(|error| ("config_validation", format!("configuration issue: {error}"), 2u8))?;
    let catalog = load_catalog(&config)?;
    let source = config
        .catalog
        .path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "embedded seeds".to_string());

    let violations = options.validate.then(|| catalog.verify_integrity());
    let clean = violations.as_ref().map_or(true, |violations| violations.is_empty());

    let services: Vec<ServiceRow> = catalog
        .services()
        .iter()
        .map(|service| ServiceRow {
            id: service.id.0.clone(),
            name: service.name.clone(),
            category: service.category.clone(),
            base_price: format_amount(service.base_price),
            pricing: catalog.rule_for(&service.id).ok().map(describe_rule),
        })
        .collect();
    let add_ons: Vec<AddOnRow> = catalog
        .add_ons()
        .iter()
        .map(|add_on| AddOnRow {
            id: add_on.id.0.clone(),
            name: add_on.name.clone(),
            price: format_amount(add_on.price),
            recommended: add_on.recommended,
        })
        .collect();

    let status = if clean { "ok" } else { "fail" };
    let exit_code = if clean { 0 } else { 6u8 };

    if options.json {
        let report = CatalogReport { command: "catalog", status, source, services, add_ons, violations };
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"command\":\"catalog\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
                error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
            )
        });
        return Ok(CommandResult { exit_code, output });
    }

    let mut lines =
        vec![format!("catalog ({source}): {} services, {} add-ons", services.len(), add_ons.len())];
    lines.push("services:".to_string());
    for row in &services {
        let pricing = row.pricing.as_deref().unwrap_or("no pricing rule");
        lines.push(format!("- {}: {}, base AED {}, {}", row.id, row.name, row.base_price, pricing));
    }
    lines.push("add-ons:".to_string());
    for row in &add_ons {
        let mut line = format!("- {}: {}, AED {}", row.id, row.name, row.price);
        if row.recommended {
            line.push_str(", recommended");
        }
        lines.push(line);
    }

    if let Some(violations) = &violations {
        if violations.is_empty() {
            lines.push("integrity: clean".to_string());
        } else {
            lines.push(format!("integrity: {} violation(s)", violations.len()));
            for violation in violations {
                let mut line = format!("- [{}] {}", violation.code, violation.message);
                if let Some(suggestion) = &violation.suggestion {
                    line.push_str(&format!(" ({suggestion})"));
                }
                lines.push(line);
            }
        }
    }

    Ok(CommandResult { exit_code, output: lines.join("\n") })
}

fn describe_rule(rule: &PricingRule) -> String {
    let mut parts = vec![rule.strategy.as_str().to_string()];

    let dials: Vec<String> = rule
        .dials()
        .iter()
        .map(|dial| format!("{} {}..={}", dial.key, dial.min, dial.max))
        .collect();
    if !dials.is_empty() {
        parts.push(format!("[{}]", dials.join(", ")));
    }

    let sizes: Vec<&str> = rule.size_tiers().iter().map(|tier| tier.label.as_str()).collect();
    if !sizes.is_empty() {
        parts.push(format!("sizes {}", sizes.join("/")));
    }

    parts.join(" ")
}
