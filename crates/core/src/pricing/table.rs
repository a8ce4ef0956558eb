use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::addon::{AddOnId, AddOnService};
use crate::domain::service::{Service, ServiceId};
use crate::errors::ApplicationError;
use crate::pricing::rules::{ConfigurationError, CountDial, PricingRule, SizeTier, StrategyKind, StrategyParams};

/// The read-only pricing catalog: services, their rules, and the add-on
/// pool. Loaded once, from the embedded seeds or a JSON catalog file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    services: Vec<Service>,
    rules: Vec<PricingRule>,
    add_ons: Vec<AddOnService>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogViolation {
    pub code: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl Catalog {
    pub fn new(services: Vec<Service>, rules: Vec<PricingRule>, add_ons: Vec<AddOnService>) -> Self {
        Self { services, rules, add_ons }
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn rules(&self) -> &[PricingRule] {
        &self.rules
    }

    pub fn add_ons(&self) -> &[AddOnService] {
        &self.add_ons
    }

    pub fn find_service(&self, service_id: &ServiceId) -> Option<&Service> {
        self.services.iter().find(|service| &service.id == service_id)
    }

    pub fn find_add_on(&self, add_on_id: &AddOnId) -> Option<&AddOnService> {
        self.add_ons.iter().find(|add_on| &add_on.id == add_on_id)
    }

    /// Rule lookup by service id. A miss is the configuration error the
    /// caller degrades from, never a crash.
    pub fn rule_for(&self, service_id: &ServiceId) -> Result<&PricingRule, ConfigurationError> {
        self.rules
            .iter()
            .find(|rule| &rule.service_id == service_id)
            .ok_or_else(|| ConfigurationError::UnknownService { service_id: service_id.clone() })
    }

    /// The add-ons offered alongside a main service. The service itself is
    /// filtered out; recommended add-ons lead and order is otherwise stable.
    pub fn add_ons_for(&self, main_service_id: &ServiceId) -> Vec<&AddOnService> {
        let offered =
            |add_on: &&AddOnService| add_on.id.0 != main_service_id.0;
        let mut view: Vec<&AddOnService> =
            self.add_ons.iter().filter(offered).filter(|add_on| add_on.recommended).collect();
        view.extend(self.add_ons.iter().filter(offered).filter(|add_on| !add_on.recommended));
        view
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ApplicationError> {
        let raw = std::fs::read_to_string(path).map_err(|error| {
            ApplicationError::CatalogSource(format!(
                "failed to read catalog file {}: {error}",
                path.display()
            ))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ApplicationError> {
        serde_json::from_str(raw).map_err(|error| {
            ApplicationError::CatalogSource(format!("failed to parse catalog JSON: {error}"))
        })
    }

    /// Walks the whole catalog for configuration defects. Used by the
    /// catalog and doctor commands; an empty result means every rule can
    /// be evaluated as declared.
    pub fn verify_integrity(&self) -> Vec<CatalogViolation> {
        let mut violations = Vec::new();

        let mut seen_services: HashSet<&str> = HashSet::new();
        for service in &self.services {
            if !seen_services.insert(service.id.0.as_str()) {
                violations.push(CatalogViolation {
                    code: "DUPLICATE_SERVICE_ID".to_string(),
                    message: format!("Duplicate service id in catalog: {}", service.id.0),
                    suggestion: Some("Service ids must be unique".to_string()),
                });
            }
            if service.base_price < Decimal::ZERO {
                violations.push(CatalogViolation {
                    code: "NEGATIVE_PRICE".to_string(),
                    message: format!("Service {} has a negative base price", service.id.0),
                    suggestion: Some("Use a zero or positive AED amount".to_string()),
                });
            }
        }

        let mut seen_rules: HashSet<&str> = HashSet::new();
        for rule in &self.rules {
            let service_id = rule.service_id.0.as_str();
            if !seen_rules.insert(service_id) {
                violations.push(CatalogViolation {
                    code: "DUPLICATE_RULE".to_string(),
                    message: format!("More than one pricing rule for service: {service_id}"),
                    suggestion: Some("Keep exactly one rule per service".to_string()),
                });
            }
            if self.find_service(&rule.service_id).is_none() {
                violations.push(CatalogViolation {
                    code: "RULE_WITHOUT_SERVICE".to_string(),
                    message: format!("Pricing rule references unknown service: {service_id}"),
                    suggestion: Some("Add the service or remove the rule".to_string()),
                });
            }
            if let Err(ConfigurationError::ParameterMismatch { declared, found, .. }) =
                rule.verify_parameters()
            {
                violations.push(CatalogViolation {
                    code: "STRATEGY_PARAMETER_MISMATCH".to_string(),
                    message: format!(
                        "Rule for {service_id} declares {} but carries {} parameters",
                        declared.as_str(),
                        found.as_str()
                    ),
                    suggestion: Some("Align the strategy tag with the parameter shape".to_string()),
                });
            }
            if rule.base_price < Decimal::ZERO {
                violations.push(CatalogViolation {
                    code: "NEGATIVE_PRICE".to_string(),
                    message: format!("Rule for {service_id} has a negative base price"),
                    suggestion: Some("Use a zero or positive AED amount".to_string()),
                });
            }

            self.check_rule_shape(rule, &mut violations);
        }

        let mut seen_add_ons: HashSet<&str> = HashSet::new();
        for add_on in &self.add_ons {
            if !seen_add_ons.insert(add_on.id.0.as_str()) {
                violations.push(CatalogViolation {
                    code: "DUPLICATE_ADD_ON_ID".to_string(),
                    message: format!("Duplicate add-on id in catalog: {}", add_on.id.0),
                    suggestion: Some("Add-on ids must be unique".to_string()),
                });
            }
            if add_on.price < Decimal::ZERO {
                violations.push(CatalogViolation {
                    code: "NEGATIVE_PRICE".to_string(),
                    message: format!("Add-on {} has a negative price", add_on.id.0),
                    suggestion: Some("Use a zero or positive AED amount".to_string()),
                });
            }
        }

        violations
    }

    fn check_rule_shape(&self, rule: &PricingRule, violations: &mut Vec<CatalogViolation>) {
        let service_id = rule.service_id.0.as_str();

        let dials = rule.dials();
        if matches!(rule.parameters, StrategyParams::PerCountMultiplier { .. }) && dials.is_empty()
        {
            violations.push(CatalogViolation {
                code: "EMPTY_DIAL_LIST".to_string(),
                message: format!("Rule for {service_id} declares no count dials"),
                suggestion: Some("Declare at least one count dial".to_string()),
            });
        }
        let mut seen_keys: HashSet<&str> = HashSet::new();
        for dial in dials {
            if !seen_keys.insert(dial.key.as_str()) {
                violations.push(CatalogViolation {
                    code: "DUPLICATE_DIAL_KEY".to_string(),
                    message: format!("Rule for {service_id} repeats dial key: {}", dial.key),
                    suggestion: Some("Dial keys must be unique within a rule".to_string()),
                });
            }
            if dial.min > dial.max {
                violations.push(CatalogViolation {
                    code: "INVERTED_DIAL_BOUNDS".to_string(),
                    message: format!(
                        "Rule for {service_id} has dial {} with min {} above max {}",
                        dial.key, dial.min, dial.max
                    ),
                    suggestion: Some("Swap the bounds so min <= max".to_string()),
                });
            }
        }

        let tiers = rule.size_tiers();
        if matches!(
            rule.parameters,
            StrategyParams::TieredBySize { .. } | StrategyParams::MatrixBySizeAndCategory { .. }
        ) && tiers.is_empty()
        {
            violations.push(CatalogViolation {
                code: "EMPTY_TIER_LIST".to_string(),
                message: format!("Rule for {service_id} declares no size tiers"),
                suggestion: Some("Declare at least one size tier".to_string()),
            });
        }
        let mut seen_labels: HashSet<&str> = HashSet::new();
        for tier in tiers {
            if !seen_labels.insert(tier.label.as_str()) {
                violations.push(CatalogViolation {
                    code: "DUPLICATE_TIER_LABEL".to_string(),
                    message: format!("Rule for {service_id} repeats size label: {}", tier.label),
                    suggestion: Some("Size labels must be unique within a rule".to_string()),
                });
            }
            if tier.price < Decimal::ZERO {
                violations.push(CatalogViolation {
                    code: "NEGATIVE_PRICE".to_string(),
                    message: format!(
                        "Rule for {service_id} prices size {} below zero",
                        tier.label
                    ),
                    suggestion: Some("Use a zero or positive AED amount".to_string()),
                });
            }
        }

        if let StrategyParams::FlatUnit { price_per_unit, .. }
        | StrategyParams::PerCountMultiplier { price_per_unit, .. } = &rule.parameters
        {
            if *price_per_unit < Decimal::ZERO {
                violations.push(CatalogViolation {
                    code: "NEGATIVE_PRICE".to_string(),
                    message: format!("Rule for {service_id} has a negative per-unit price"),
                    suggestion: Some("Use a zero or positive AED amount".to_string()),
                });
            }
        }
    }
}

/// Seed rows for the embedded default catalog, mirroring the services the
/// booking site sells today.
#[derive(Debug, Clone, Copy)]
struct ServiceSeed {
    id: &'static str,
    name: &'static str,
    category: &'static str,
    base_price_minor: i64,
}

const SERVICE_SEEDS: &[ServiceSeed] = &[
    ServiceSeed {
        id: "maid-service",
        name: "Maid Service",
        category: "cleaning",
        base_price_minor: 8_000,
    },
    ServiceSeed {
        id: "bathroom-deep-cleaning",
        name: "Bathroom Deep Cleaning",
        category: "cleaning",
        base_price_minor: 10_000,
    },
    ServiceSeed {
        id: "carpet-cleaning",
        name: "Carpet Cleaning",
        category: "cleaning",
        base_price_minor: 5_000,
    },
    ServiceSeed {
        id: "sofa-cleaning",
        name: "Sofa Cleaning",
        category: "cleaning",
        base_price_minor: 3_000,
    },
    ServiceSeed {
        id: "ac-maintenance",
        name: "AC Maintenance",
        category: "maintenance",
        base_price_minor: 14_900,
    },
    ServiceSeed {
        id: "pest-control",
        name: "Pest Control",
        category: "maintenance",
        base_price_minor: 14_900,
    },
    ServiceSeed {
        id: "holiday-home-housekeeping",
        name: "Holiday Home Housekeeping",
        category: "housekeeping",
        base_price_minor: 18_000,
    },
    ServiceSeed {
        id: "office-ac-maintenance",
        name: "Office AC Maintenance",
        category: "corporate",
        base_price_minor: 12_000,
    },
];

#[derive(Debug, Clone, Copy)]
struct AddOnSeed {
    id: &'static str,
    name: &'static str,
    price_minor: i64,
    category: &'static str,
    recommended: bool,
}

const ADD_ON_SEEDS: &[AddOnSeed] = &[
    AddOnSeed {
        id: "window-cleaning",
        name: "Window Cleaning",
        price_minor: 15_000,
        category: "cleaning",
        recommended: true,
    },
    AddOnSeed {
        id: "balcony-cleaning",
        name: "Balcony Cleaning",
        price_minor: 12_000,
        category: "cleaning",
        recommended: false,
    },
    AddOnSeed {
        id: "fridge-cleaning",
        name: "Fridge Cleaning",
        price_minor: 7_500,
        category: "appliances",
        recommended: false,
    },
    AddOnSeed {
        id: "oven-cleaning",
        name: "Oven Cleaning",
        price_minor: 7_500,
        category: "appliances",
        recommended: false,
    },
    AddOnSeed {
        id: "ironing-service",
        name: "Ironing Service",
        price_minor: 5_000,
        category: "finishing",
        recommended: true,
    },
    // Also sold as a main service; the per-service view filters the
    // self-reference out.
    AddOnSeed {
        id: "sofa-cleaning",
        name: "Sofa Cleaning",
        price_minor: 9_900,
        category: "cleaning",
        recommended: false,
    },
];

fn dial(key: &str, min: u32, max: u32) -> CountDial {
    CountDial { key: key.to_string(), min, max }
}

fn tier(label: &str, price_minor: i64) -> SizeTier {
    SizeTier { label: label.to_string(), price: Decimal::new(price_minor, 2) }
}

fn embedded_rules() -> Vec<PricingRule> {
    vec![
        PricingRule {
            service_id: ServiceId("maid-service".to_string()),
            base_price: Decimal::new(8_000, 2),
            strategy: StrategyKind::PerCountMultiplier,
            parameters: StrategyParams::PerCountMultiplier {
                price_per_unit: Decimal::new(8_000, 2),
                dials: vec![dial("maids", 1, 6), dial("hours", 1, 8)],
            },
        },
        PricingRule {
            service_id: ServiceId("bathroom-deep-cleaning".to_string()),
            base_price: Decimal::new(10_000, 2),
            strategy: StrategyKind::PerCountMultiplier,
            parameters: StrategyParams::PerCountMultiplier {
                price_per_unit: Decimal::new(10_000, 2),
                dials: vec![dial("bathrooms", 1, 8)],
            },
        },
        PricingRule {
            service_id: ServiceId("carpet-cleaning".to_string()),
            base_price: Decimal::new(5_000, 2),
            strategy: StrategyKind::MatrixBySizeAndCategory,
            parameters: StrategyParams::MatrixBySizeAndCategory {
                rows: vec![tier("Small", 5_000), tier("Medium", 7_500), tier("Large", 12_000)],
                dial: dial("carpets", 1, 10),
            },
        },
        PricingRule {
            service_id: ServiceId("sofa-cleaning".to_string()),
            base_price: Decimal::new(3_000, 2),
            strategy: StrategyKind::FlatUnit,
            parameters: StrategyParams::FlatUnit {
                dial: dial("seats", 1, 12),
                price_per_unit: Decimal::new(3_000, 2),
            },
        },
        PricingRule {
            service_id: ServiceId("ac-maintenance".to_string()),
            base_price: Decimal::new(14_900, 2),
            strategy: StrategyKind::PerCountMultiplier,
            parameters: StrategyParams::PerCountMultiplier {
                price_per_unit: Decimal::new(14_900, 2),
                dials: vec![dial("units", 1, 8)],
            },
        },
        PricingRule {
            service_id: ServiceId("pest-control".to_string()),
            base_price: Decimal::new(14_900, 2),
            strategy: StrategyKind::TieredBySize,
            parameters: StrategyParams::TieredBySize {
                tiers: vec![
                    tier("Studio", 14_900),
                    tier("1 Bedroom", 19_900),
                    tier("2 Bedroom", 24_900),
                    tier("3 Bedroom", 29_900),
                    tier("Villa", 39_900),
                ],
            },
        },
        PricingRule {
            service_id: ServiceId("holiday-home-housekeeping".to_string()),
            base_price: Decimal::new(18_000, 2),
            strategy: StrategyKind::TieredBySize,
            parameters: StrategyParams::TieredBySize {
                tiers: vec![
                    tier("Studio", 18_000),
                    tier("1 Bedroom", 22_000),
                    tier("2 Bedroom", 28_000),
                    tier("3 Bedroom", 35_000),
                ],
            },
        },
        PricingRule {
            service_id: ServiceId("office-ac-maintenance".to_string()),
            base_price: Decimal::new(12_000, 2),
            strategy: StrategyKind::MatrixBySizeAndCategory,
            parameters: StrategyParams::MatrixBySizeAndCategory {
                rows: vec![
                    tier("Small Office", 12_000),
                    tier("Medium Office", 16_000),
                    tier("Large Office", 20_000),
                ],
                dial: dial("units", 1, 8),
            },
        },
    ]
}

impl Catalog {
    /// The catalog compiled into the binary, used whenever no catalog file
    /// is configured.
    pub fn embedded() -> Self {
        let services = SERVICE_SEEDS
            .iter()
            .map(|seed| Service {
                id: ServiceId(seed.id.to_string()),
                name: seed.name.to_string(),
                category: seed.category.to_string(),
                base_price: Decimal::new(seed.base_price_minor, 2),
            })
            .collect();
        let add_ons = ADD_ON_SEEDS
            .iter()
            .map(|seed| AddOnService {
                id: AddOnId(seed.id.to_string()),
                name: seed.name.to_string(),
                price: Decimal::new(seed.price_minor, 2),
                category: seed.category.to_string(),
                recommended: seed.recommended,
            })
            .collect();

        Self { services, add_ons, rules: embedded_rules() }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rust_decimal::Decimal;

    use crate::domain::service::ServiceId;
    use crate::errors::ApplicationError;
    use crate::pricing::rules::{ConfigurationError, StrategyKind};

    use super::Catalog;

    #[test]
    fn embedded_catalog_passes_integrity_checks() {
        let catalog = Catalog::embedded();
        let violations = catalog.verify_integrity();
        assert!(violations.is_empty(), "unexpected violations: {violations:?}");
    }

    #[test]
    fn embedded_catalog_covers_every_service_with_a_rule() {
        let catalog = Catalog::embedded();
        for service in catalog.services() {
            assert!(
                catalog.rule_for(&service.id).is_ok(),
                "service {} has no rule",
                service.id.0
            );
        }
    }

    #[test]
    fn rule_lookup_miss_reports_unknown_service() {
        let catalog = Catalog::embedded();
        let missing = ServiceId("chimney-sweeping".to_string());

        let error = catalog.rule_for(&missing).expect_err("lookup should miss");
        assert_eq!(error, ConfigurationError::UnknownService { service_id: missing });
    }

    #[test]
    fn add_on_view_filters_self_reference_and_leads_with_recommended() {
        let catalog = Catalog::embedded();
        let view = catalog.add_ons_for(&ServiceId("sofa-cleaning".to_string()));

        assert!(view.iter().all(|add_on| add_on.id.0 != "sofa-cleaning"));
        let first_regular =
            view.iter().position(|add_on| !add_on.recommended).unwrap_or(view.len());
        assert!(
            view[..first_regular].iter().all(|add_on| add_on.recommended),
            "recommended add-ons should lead the view"
        );
    }

    #[test]
    fn integrity_check_reports_mismatch_and_duplicates() {
        let mut catalog = Catalog::embedded();
        let mut broken = catalog.rules[0].clone();
        broken.strategy = StrategyKind::TieredBySize;
        catalog.rules.push(broken);
        catalog.services.push(catalog.services[0].clone());

        let violations = catalog.verify_integrity();
        assert!(violations.iter().any(|v| v.code == "STRATEGY_PARAMETER_MISMATCH"));
        assert!(violations.iter().any(|v| v.code == "DUPLICATE_RULE"));
        assert!(violations.iter().any(|v| v.code == "DUPLICATE_SERVICE_ID"));
    }

    #[test]
    fn integrity_check_reports_inverted_bounds_and_negative_prices() {
        let raw = r#"{
            "services": [
                { "id": "test-service", "name": "Test Service", "category": "cleaning", "base_price": "-1.00" }
            ],
            "rules": [
                {
                    "service_id": "test-service",
                    "base_price": "10.00",
                    "strategy": "flat_unit",
                    "parameters": {
                        "shape": "flat_unit",
                        "dial": { "key": "units", "min": 5, "max": 2 },
                        "price_per_unit": "10.00"
                    }
                }
            ],
            "add_ons": []
        }"#;

        let catalog = Catalog::from_json_str(raw).expect("catalog should parse");
        let violations = catalog.verify_integrity();
        assert!(violations.iter().any(|v| v.code == "INVERTED_DIAL_BOUNDS"));
        assert!(violations.iter().any(|v| v.code == "NEGATIVE_PRICE"));
    }

    #[test]
    fn catalog_round_trips_through_a_json_file() {
        let catalog = Catalog::embedded();
        let serialized = serde_json::to_string(&catalog).expect("serialize catalog");

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(serialized.as_bytes()).expect("write catalog");

        let loaded = Catalog::from_json_file(file.path()).expect("load catalog");
        assert_eq!(loaded, catalog);
    }

    #[test]
    fn missing_catalog_file_surfaces_a_source_error() {
        let error = Catalog::from_json_file(std::path::Path::new("/nonexistent/catalog.json"))
            .expect_err("load should fail");
        assert!(matches!(error, ApplicationError::CatalogSource(_)));
    }

    #[test]
    fn carpet_rule_prices_medium_at_seventy_five() {
        let catalog = Catalog::embedded();
        let rule = catalog
            .rule_for(&ServiceId("carpet-cleaning".to_string()))
            .expect("carpet rule exists");
        let medium =
            rule.size_tiers().iter().find(|tier| tier.label == "Medium").expect("medium row");
        assert_eq!(medium.price, Decimal::new(7_500, 2));
    }
}
