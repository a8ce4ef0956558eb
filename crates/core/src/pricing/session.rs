use crate::domain::addon::{AddOnId, AddOnService};
use crate::domain::service::{Service, ServiceId};
use crate::pricing::evaluator::{evaluate, fallback_breakdown, PriceBreakdown, PromoDiscount};
use crate::pricing::rules::{ConfigurationError, PricingRule};
use crate::pricing::state::CustomizationState;
use crate::pricing::table::Catalog;

/// One customer's live customization of a single service. Every mutation
/// re-derives the breakdown, so `breakdown()` is always current and the
/// struct never holds a stale total.
#[derive(Clone, Debug)]
pub struct QuoteSession {
    service: Service,
    rule: Option<PricingRule>,
    add_ons: Vec<AddOnService>,
    state: CustomizationState,
    promo: Option<PromoDiscount>,
    breakdown: PriceBreakdown,
    last_error: Option<ConfigurationError>,
}

impl QuoteSession {
    /// Opens a session against a catalog service. The service must exist;
    /// a missing or malformed pricing rule is non-fatal and degrades the
    /// session to base-price quoting, recorded in `last_error`.
    pub fn open(catalog: &Catalog, service_id: &ServiceId) -> Result<Self, ConfigurationError> {
        let service = catalog
            .find_service(service_id)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownService { service_id: service_id.clone() })?;
        let rule = catalog.rule_for(service_id).ok().cloned();
        let add_ons = catalog.add_ons_for(service_id).into_iter().cloned().collect();

        let mut session = Self {
            service,
            rule,
            add_ons,
            state: CustomizationState::default(),
            promo: None,
            breakdown: PriceBreakdown::default(),
            last_error: None,
        };
        session.reprice();
        Ok(session)
    }

    pub fn service(&self) -> &Service {
        &self.service
    }

    pub fn rule(&self) -> Option<&PricingRule> {
        self.rule.as_ref()
    }

    pub fn add_ons(&self) -> &[AddOnService] {
        &self.add_ons
    }

    pub fn state(&self) -> &CustomizationState {
        &self.state
    }

    pub fn breakdown(&self) -> &PriceBreakdown {
        &self.breakdown
    }

    pub fn promo(&self) -> Option<&PromoDiscount> {
        self.promo.as_ref()
    }

    /// The most recent pricing degradation, if the last evaluation fell
    /// back to the base price.
    pub fn last_error(&self) -> Option<&ConfigurationError> {
        self.last_error.as_ref()
    }

    pub fn select_unit_type(&mut self, label: &str) {
        if let Some(rule) = &self.rule {
            self.state.select_unit_type(rule, label);
        }
        self.reprice();
    }

    pub fn adjust_count(&mut self, key: &str, delta: i32) {
        if let Some(rule) = &self.rule {
            self.state.adjust_count(rule, key, delta);
        }
        self.reprice();
    }

    pub fn toggle_add_on(&mut self, add_on_id: &AddOnId) {
        self.state.toggle_add_on(add_on_id);
        self.reprice();
    }

    pub fn apply_promo(&mut self, promo: PromoDiscount) {
        self.promo = Some(promo);
        self.reprice();
    }

    pub fn clear_promo(&mut self) {
        self.promo = None;
        self.reprice();
    }

    fn reprice(&mut self) {
        self.last_error = None;
        self.breakdown = match &self.rule {
            Some(rule) => {
                match evaluate(rule, &self.add_ons, &self.state, self.promo.as_ref()) {
                    Ok(breakdown) => breakdown,
                    Err(error) => {
                        let fallback = fallback_breakdown(
                            &self.service,
                            &self.add_ons,
                            &self.state,
                            self.promo.as_ref(),
                        );
                        self.last_error = Some(error);
                        fallback
                    }
                }
            }
            None => {
                self.last_error = Some(ConfigurationError::UnknownService {
                    service_id: self.service.id.clone(),
                });
                fallback_breakdown(&self.service, &self.add_ons, &self.state, self.promo.as_ref())
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::addon::AddOnId;
    use crate::domain::service::{Service, ServiceId};
    use crate::pricing::evaluator::PromoDiscount;
    use crate::pricing::rules::ConfigurationError;
    use crate::pricing::table::Catalog;

    use super::QuoteSession;

    fn service_id(raw: &str) -> ServiceId {
        ServiceId(raw.to_string())
    }

    #[test]
    fn open_rejects_unknown_service() {
        let catalog = Catalog::embedded();
        let error = QuoteSession::open(&catalog, &service_id("chimney-sweeping"))
            .expect_err("unknown service cannot open");
        assert!(matches!(error, ConfigurationError::UnknownService { .. }));
    }

    #[test]
    fn open_starts_at_minimum_selection() {
        let catalog = Catalog::embedded();
        let session =
            QuoteSession::open(&catalog, &service_id("maid-service")).expect("session opens");

        // One maid for one hour at 80/hour.
        assert_eq!(session.breakdown().total, Decimal::new(8_000, 2));
        assert!(session.last_error().is_none());
    }

    #[test]
    fn maid_service_walkthrough_reaches_discounted_total() {
        let catalog = Catalog::embedded();
        let mut session =
            QuoteSession::open(&catalog, &service_id("maid-service")).expect("session opens");

        session.adjust_count("maids", 2);
        session.adjust_count("hours", 3);

        let breakdown = session.breakdown();
        assert_eq!(breakdown.subtotal, Decimal::new(96_000, 2));
        assert_eq!(breakdown.discount_rate, Decimal::new(5, 2));
        assert_eq!(breakdown.total, Decimal::new(91_200, 2));
    }

    #[test]
    fn carpet_session_prices_selected_row() {
        let catalog = Catalog::embedded();
        let mut session =
            QuoteSession::open(&catalog, &service_id("carpet-cleaning")).expect("session opens");

        session.select_unit_type("Medium");
        session.adjust_count("carpets", 1);

        assert_eq!(session.breakdown().subtotal, Decimal::new(15_000, 2));
        assert_eq!(session.breakdown().discount_rate, Decimal::ZERO);
    }

    #[test]
    fn toggling_an_add_on_twice_restores_the_breakdown() {
        let catalog = Catalog::embedded();
        let mut session = QuoteSession::open(&catalog, &service_id("bathroom-deep-cleaning"))
            .expect("session opens");
        let before = session.breakdown().clone();

        let windows = AddOnId("window-cleaning".to_string());
        session.toggle_add_on(&windows);
        assert_ne!(session.breakdown(), &before);

        session.toggle_add_on(&windows);
        assert_eq!(session.breakdown(), &before);
    }

    #[test]
    fn promo_applies_and_clears() {
        let catalog = Catalog::embedded();
        let mut session =
            QuoteSession::open(&catalog, &service_id("pest-control")).expect("session opens");
        session.select_unit_type("Villa");
        let undiscounted = session.breakdown().total;

        session.apply_promo(PromoDiscount {
            code: "WELCOME10".to_string(),
            amount: Decimal::new(5_000, 2),
        });
        assert_eq!(session.breakdown().total, undiscounted - Decimal::new(5_000, 2));

        session.clear_promo();
        assert_eq!(session.breakdown().total, undiscounted);
    }

    #[test]
    fn service_without_a_rule_degrades_to_base_price() {
        let mut catalog = Catalog::embedded();
        let orphan = Service {
            id: service_id("mattress-cleaning"),
            name: "Mattress Cleaning".to_string(),
            category: "cleaning".to_string(),
            base_price: Decimal::new(12_000, 2),
        };
        catalog = Catalog::new(
            {
                let mut services = catalog.services().to_vec();
                services.push(orphan);
                services
            },
            catalog.rules().to_vec(),
            catalog.add_ons().to_vec(),
        );

        let mut session = QuoteSession::open(&catalog, &service_id("mattress-cleaning"))
            .expect("session opens without a rule");
        assert_eq!(session.breakdown().total, Decimal::new(12_000, 2));
        assert!(matches!(
            session.last_error(),
            Some(ConfigurationError::UnknownService { .. })
        ));

        // Dial mutations have nothing to act on but never crash.
        session.adjust_count("units", 3);
        assert_eq!(session.breakdown().total, Decimal::new(12_000, 2));
    }
}
