use serde::Serialize;

use crate::commands::{load_catalog, CommandResult};
use pricebook_core::config::{AppConfig, LoadOptions};
use pricebook_core::pricing::format::format_amount;
use pricebook_core::pricing::session::QuoteSession;
use pricebook_core::pricing::table::Catalog;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    command: &'static str,
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(load: LoadOptions, json_output: bool) -> CommandResult {
    let report = build_report(load);
    let exit_code = if report.overall_status == CheckStatus::Fail { 6 } else { 0 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"command\":\"doctor\",\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(load: LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(load) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });

            let (catalog_check, catalog) = check_catalog(&config);
            checks.push(catalog_check);

            match &catalog {
                Some(catalog) => checks.push(check_pricing_determinism(catalog)),
                None => checks.push(DoctorCheck {
                    name: "pricing_determinism",
                    status: CheckStatus::Skipped,
                    details: "skipped because the catalog did not load".to_string(),
                }),
            }

            checks.push(check_relay_endpoint(&config));
            checks.push(check_promo_endpoint(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["catalog_integrity", "pricing_determinism", "relay_endpoint", "promo_endpoint"]
            {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { command: "doctor", overall_status, summary, checks }
}

fn check_catalog(config: &AppConfig) -> (DoctorCheck, Option<Catalog>) {
    let source = config
        .catalog
        .path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "embedded seeds".to_string());

    let catalog = match load_catalog(config) {
        Ok(catalog) => catalog,
        Err((_, message, _)) => {
            let check =
                DoctorCheck { name: "catalog_integrity", status: CheckStatus::Fail, details: message };
            return (check, None);
        }
    };

    let violations = catalog.verify_integrity();
    let check = if violations.is_empty() {
        DoctorCheck {
            name: "catalog_integrity",
            status: CheckStatus::Pass,
            details: format!(
                "{} services and {} add-ons verified from {source}",
                catalog.services().len(),
                catalog.add_ons().len()
            ),
        }
    } else {
        let codes: Vec<&str> = violations.iter().map(|violation| violation.code.as_str()).collect();
        DoctorCheck {
            name: "catalog_integrity",
            status: CheckStatus::Fail,
            details: format!("{} violation(s): {}", violations.len(), codes.join(", ")),
        }
    };

    (check, Some(catalog))
}

fn check_pricing_determinism(catalog: &Catalog) -> DoctorCheck {
    let Some(service) = catalog.services().first() else {
        return DoctorCheck {
            name: "pricing_determinism",
            status: CheckStatus::Fail,
            details: "catalog has no services to price".to_string(),
        };
    };

    let first = QuoteSession::open(catalog, &service.id);
    let second = QuoteSession::open(catalog, &service.id);
    match (first, second) {
        (Ok(first), Ok(second)) if first.breakdown() == second.breakdown() => DoctorCheck {
            name: "pricing_determinism",
            status: CheckStatus::Pass,
            details: format!(
                "`{}` prices identically across repeat evaluations (total AED {})",
                service.id.0,
                format_amount(first.breakdown().total)
            ),
        },
        (Ok(_), Ok(_)) => DoctorCheck {
            name: "pricing_determinism",
            status: CheckStatus::Fail,
            details: format!("repeat evaluations of `{}` diverged", service.id.0),
        },
        (Err(error), _) | (_, Err(error)) => DoctorCheck {
            name: "pricing_determinism",
            status: CheckStatus::Fail,
            details: format!("could not open a pricing session: {error}"),
        },
    }
}

fn check_relay_endpoint(config: &AppConfig) -> DoctorCheck {
    match &config.booking.relay_url {
        Some(url) => DoctorCheck {
            name: "relay_endpoint",
            status: CheckStatus::Pass,
            details: format!("relay endpoint configured: `{url}`"),
        },
        None => DoctorCheck {
            name: "relay_endpoint",
            status: CheckStatus::Skipped,
            details: "booking.relay_url is not configured; bookings stay local".to_string(),
        },
    }
}

fn check_promo_endpoint(config: &AppConfig) -> DoctorCheck {
    match &config.promo.endpoint {
        Some(url) => DoctorCheck {
            name: "promo_endpoint",
            status: CheckStatus::Pass,
            details: format!("promo endpoint configured: `{url}`"),
        },
        None => DoctorCheck {
            name: "promo_endpoint",
            status: CheckStatus::Skipped,
            details: "promo.endpoint is not configured; the built-in code table applies".to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
