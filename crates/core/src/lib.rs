pub mod audit;
pub mod booking;
pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;

pub use booking::promo::{PromoOutcome, PromoValidator, StaticPromoValidator};
pub use booking::relay::{BookingRelay, NoopRelay, RelayError, RelayReceipt};
pub use booking::submission::{
    submit_booking, validate_customer, BookingError, BookingRequest, FieldIssue, ValidationError,
};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::addon::{AddOnId, AddOnService};
pub use domain::customer::CustomerDetails;
pub use domain::service::{Service, ServiceId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use pricing::evaluator::{
    evaluate, fallback_breakdown, price_service, LineItem, PriceBreakdown, PromoDiscount,
};
pub use pricing::rules::{
    ConfigurationError, CountDial, PricingRule, SizeTier, StrategyKind, StrategyParams,
};
pub use pricing::session::QuoteSession;
pub use pricing::state::CustomizationState;
pub use pricing::table::{Catalog, CatalogViolation};
