pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use pricebook_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "pricebook",
    about = "Pricebook operator CLI",
    long_about = "Quote home services, inspect the catalog, hand bookings to the relay, and check runtime readiness.",
    after_help = "Examples:\n  pricebook quote --service maid-service --count maids=3 --count hours=4\n  pricebook book --service sofa-cleaning --count seats=5 --name \"Ayesha Khan\" --phone 971501234567 --email ayesha@example.com\n  pricebook doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, value_name = "PATH", help = "Path to a pricebook.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, value_name = "LEVEL", help = "Override the configured log level")]
    log_level: Option<String>,
    #[arg(
        long,
        global = true,
        value_name = "FORMAT",
        help = "Override the configured log format (compact, pretty, json)"
    )]
    log_format: Option<LogFormat>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Price a service selection and print the itemized breakdown")]
    Quote {
        #[arg(long, value_name = "SERVICE_ID", help = "Service to price, e.g. maid-service")]
        service: String,
        #[arg(long, value_name = "LABEL", help = "Size tier label, e.g. \"2 Bedroom\"")]
        size: Option<String>,
        #[arg(
            long = "count",
            value_name = "KEY=VALUE",
            help = "Set a count dial, e.g. --count maids=3 (repeatable)"
        )]
        counts: Vec<String>,
        #[arg(
            long = "add-on",
            value_name = "ADD_ON_ID",
            help = "Attach an add-on, e.g. --add-on window-cleaning (repeatable)"
        )]
        add_ons: Vec<String>,
        #[arg(long, value_name = "CODE", help = "Apply a promo code to the quote")]
        promo_code: Option<String>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List catalog services and add-ons, optionally verifying integrity")]
    Catalog {
        #[arg(long, help = "Verify catalog integrity and fail on violations")]
        validate: bool,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Validate a booking and hand it to the relay or keep it local")]
    Book {
        #[arg(long, value_name = "NAME", help = "Customer full name")]
        name: String,
        #[arg(long, value_name = "PHONE", help = "Customer phone number")]
        phone: String,
        #[arg(long, value_name = "EMAIL", help = "Customer email address")]
        email: Option<String>,
        #[arg(long, value_name = "SERVICE_ID", help = "Service to book")]
        service: String,
        #[arg(long, value_name = "LABEL", help = "Size tier label, e.g. \"2 Bedroom\"")]
        size: Option<String>,
        #[arg(
            long = "count",
            value_name = "KEY=VALUE",
            help = "Set a count dial, e.g. --count seats=5 (repeatable)"
        )]
        counts: Vec<String>,
        #[arg(
            long = "add-on",
            value_name = "ADD_ON_ID",
            help = "Attach an add-on, e.g. --add-on ironing-service (repeatable)"
        )]
        add_ons: Vec<String>,
        #[arg(long, value_name = "CODE", help = "Apply a promo code to the booking total")]
        promo_code: Option<String>,
        #[arg(long, help = "Deliver the booking to the configured relay endpoint")]
        send: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(
        about = "Validate config, catalog integrity, pricing determinism, and endpoint readiness"
    )]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let load = load_options(&cli);
    init_logging(&load);

    let result = match cli.command {
        Command::Quote { service, size, counts, add_ons, promo_code, json } => {
            commands::quote::run(commands::quote::QuoteOptions {
                load,
                service,
                size,
                counts,
                add_ons,
                promo_code,
                json,
            })
        }
        Command::Catalog { validate, json } => {
            commands::catalog::run(commands::catalog::CatalogOptions { load, validate, json })
        }
        Command::Book { name, phone, email, service, size, counts, add_ons, promo_code, send } => {
            commands::book::run(commands::book::BookOptions {
                load,
                name,
                phone,
                email,
                service,
                size,
                counts,
                add_ons,
                promo_code,
                send,
            })
        }
        Command::Config => commands::config::run(load),
        Command::Doctor { json } => commands::doctor::run(load, json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn load_options(cli: &Cli) -> LoadOptions {
    LoadOptions {
        config_path: cli.config.clone(),
        require_file: cli.config.is_some(),
        overrides: ConfigOverrides {
            log_level: cli.log_level.clone(),
            log_format: cli.log_format,
            ..ConfigOverrides::default()
        },
    }
}

// Logging falls back to defaults when the config cannot load; the command
// itself reports the validation failure.
fn init_logging(load: &LoadOptions) {
    use pricebook_core::config::LogFormat::*;
    use tracing::Level;

    let config = AppConfig::load(load.clone()).unwrap_or_default();
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}
