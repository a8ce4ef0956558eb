use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::addon::AddOnService;
use crate::domain::service::Service;
use crate::pricing::discount::discount_rate;
use crate::pricing::rules::{ConfigurationError, CountDial, PricingRule, StrategyParams};
use crate::pricing::state::CustomizationState;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub label: String,
    pub amount: Decimal,
}

/// An externally validated promo result the caller chooses to apply.
/// Whether and how it combines with the volume discount is the caller's
/// policy; the evaluator only records it as its own deduction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromoDiscount {
    pub code: String,
    pub amount: Decimal,
}

/// The computed output of one evaluation. Recomputed fresh on every state
/// mutation and never mutated in place or persisted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub line_items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub discount_rate: Decimal,
    pub discount_amount: Decimal,
    pub promo_discount: Option<PromoDiscount>,
    pub total: Decimal,
}

/// Pure evaluation of one rule against one customization state. Line items
/// come out in fixed order: the base service line, then one line per active
/// customization, then one line per selected add-on. Amounts always sum
/// exactly to the subtotal; rounding happens only at presentation.
pub fn evaluate(
    rule: &PricingRule,
    add_ons: &[AddOnService],
    state: &CustomizationState,
    promo: Option<&PromoDiscount>,
) -> Result<PriceBreakdown, ConfigurationError> {
    rule.verify_parameters()?;

    let mut line_items = strategy_lines(rule, state);
    append_add_on_lines(&mut line_items, add_ons, state, &rule.service_id.0);

    Ok(finish(line_items, promo))
}

/// Total pricing entry point: degrades to the service's own base price when
/// the rule is missing or misconfigured. A price is always displayable.
pub fn price_service(
    service: &Service,
    rule: Option<&PricingRule>,
    add_ons: &[AddOnService],
    state: &CustomizationState,
    promo: Option<&PromoDiscount>,
) -> PriceBreakdown {
    match rule {
        Some(rule) => evaluate(rule, add_ons, state, promo)
            .unwrap_or_else(|_| fallback_breakdown(service, add_ons, state, promo)),
        None => fallback_breakdown(service, add_ons, state, promo),
    }
}

/// The degraded breakdown used when no rule applies: the base price line
/// with zero customization lines. Selected add-ons still price normally.
pub fn fallback_breakdown(
    service: &Service,
    add_ons: &[AddOnService],
    state: &CustomizationState,
    promo: Option<&PromoDiscount>,
) -> PriceBreakdown {
    let mut line_items =
        vec![LineItem { label: "Base".to_string(), amount: service.base_price }];
    append_add_on_lines(&mut line_items, add_ons, state, &service.id.0);

    finish(line_items, promo)
}

fn strategy_lines(rule: &PricingRule, state: &CustomizationState) -> Vec<LineItem> {
    match &rule.parameters {
        StrategyParams::FlatUnit { dial, price_per_unit } => {
            count_lines(*price_per_unit, std::slice::from_ref(dial), state)
        }
        StrategyParams::PerCountMultiplier { price_per_unit, dials } => {
            count_lines(*price_per_unit, dials, state)
        }
        StrategyParams::TieredBySize { tiers } => {
            let selected = state
                .selected_unit_type
                .as_deref()
                .and_then(|label| tiers.iter().find(|tier| tier.label == label));
            match selected {
                Some(tier) => vec![LineItem {
                    label: format!("Base ({})", tier.label),
                    amount: tier.price,
                }],
                None => vec![LineItem { label: "Base".to_string(), amount: rule.base_price }],
            }
        }
        StrategyParams::MatrixBySizeAndCategory { rows, dial } => {
            let selected_row = state
                .selected_unit_type
                .as_deref()
                .and_then(|label| rows.iter().find(|row| row.label == label));
            match selected_row {
                // Both axes must be selected; the count axis counts as
                // selected only when its key is present in state.
                Some(row) if state.counts.contains_key(&dial.key) => {
                    let count = dial.effective(&state.counts);
                    let base = row.price * Decimal::from(dial.min);
                    let mut lines =
                        vec![LineItem { label: format!("Base ({})", row.label), amount: base }];
                    if count > dial.min {
                        lines.push(LineItem {
                            label: format!("{} × {}", dial.key, count),
                            amount: row.price * Decimal::from(count) - base,
                        });
                    }
                    lines
                }
                _ => vec![LineItem { label: "Base".to_string(), amount: rule.base_price }],
            }
        }
    }
}

/// Builds the base line at the dial minimums plus one incremental line per
/// dial raised above its minimum. Increments telescope (each dial's line is
/// priced with earlier dials at their chosen counts and later dials at
/// their minimums), so the lines sum exactly to the multiplied total.
fn count_lines(
    price_per_unit: Decimal,
    dials: &[CountDial],
    state: &CustomizationState,
) -> Vec<LineItem> {
    let amount_with = |chosen_up_to: usize| -> Decimal {
        let mut amount = price_per_unit;
        for (index, dial) in dials.iter().enumerate() {
            let count =
                if index < chosen_up_to { dial.effective(&state.counts) } else { dial.min };
            amount *= Decimal::from(count);
        }
        amount
    };

    let mut lines = vec![LineItem { label: "Base".to_string(), amount: amount_with(0) }];
    let mut previous = amount_with(0);

    for (index, dial) in dials.iter().enumerate() {
        let count = dial.effective(&state.counts);
        if count > dial.min {
            let raised = amount_with(index + 1);
            lines.push(LineItem {
                label: format!("{} × {}", dial.key, count),
                amount: raised - previous,
            });
            previous = raised;
        }
    }

    lines
}

fn append_add_on_lines(
    line_items: &mut Vec<LineItem>,
    add_ons: &[AddOnService],
    state: &CustomizationState,
    main_service_id: &str,
) {
    for id in &state.selected_add_on_ids {
        // A stale selection of the main service itself never prices.
        if id.0 == main_service_id {
            continue;
        }
        // Unknown ids are skipped rather than failing the computation.
        let Some(add_on) = add_ons.iter().find(|add_on| &add_on.id == id) else {
            continue;
        };
        line_items.push(LineItem { label: add_on.name.clone(), amount: add_on.price });
    }
}

fn finish(line_items: Vec<LineItem>, promo: Option<&PromoDiscount>) -> PriceBreakdown {
    let subtotal: Decimal = line_items.iter().map(|item| item.amount).sum();
    let discount_rate = discount_rate(subtotal);
    let discount_amount = subtotal * discount_rate;

    // The applied promo never pushes the total below zero.
    let promo_discount = promo.map(|promo| PromoDiscount {
        code: promo.code.clone(),
        amount: promo.amount.max(Decimal::ZERO).min(subtotal - discount_amount),
    });
    let promo_amount =
        promo_discount.as_ref().map(|promo| promo.amount).unwrap_or(Decimal::ZERO);

    PriceBreakdown {
        line_items,
        subtotal,
        discount_rate,
        discount_amount,
        promo_discount,
        total: subtotal - discount_amount - promo_amount,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::addon::{AddOnId, AddOnService};
    use crate::domain::service::{Service, ServiceId};
    use crate::pricing::rules::{
        ConfigurationError, CountDial, PricingRule, SizeTier, StrategyKind, StrategyParams,
    };
    use crate::pricing::state::CustomizationState;

    use super::{evaluate, price_service, PromoDiscount};

    fn carpet_rule() -> PricingRule {
        PricingRule {
            service_id: ServiceId("carpet-cleaning".to_string()),
            base_price: Decimal::new(5000, 2),
            strategy: StrategyKind::MatrixBySizeAndCategory,
            parameters: StrategyParams::MatrixBySizeAndCategory {
                rows: vec![
                    SizeTier { label: "Small".to_string(), price: Decimal::new(5000, 2) },
                    SizeTier { label: "Medium".to_string(), price: Decimal::new(7500, 2) },
                    SizeTier { label: "Large".to_string(), price: Decimal::new(12000, 2) },
                ],
                dial: CountDial { key: "carpets".to_string(), min: 1, max: 10 },
            },
        }
    }

    fn maid_rule() -> PricingRule {
        PricingRule {
            service_id: ServiceId("maid-service".to_string()),
            base_price: Decimal::new(8000, 2),
            strategy: StrategyKind::PerCountMultiplier,
            parameters: StrategyParams::PerCountMultiplier {
                price_per_unit: Decimal::new(8000, 2),
                dials: vec![
                    CountDial { key: "maids".to_string(), min: 1, max: 6 },
                    CountDial { key: "hours".to_string(), min: 1, max: 8 },
                ],
            },
        }
    }

    fn bathroom_rule() -> PricingRule {
        PricingRule {
            service_id: ServiceId("bathroom-deep-cleaning".to_string()),
            base_price: Decimal::new(10000, 2),
            strategy: StrategyKind::PerCountMultiplier,
            parameters: StrategyParams::PerCountMultiplier {
                price_per_unit: Decimal::new(10000, 2),
                dials: vec![CountDial { key: "bathrooms".to_string(), min: 1, max: 8 }],
            },
        }
    }

    fn window_cleaning() -> AddOnService {
        AddOnService {
            id: AddOnId("window-cleaning".to_string()),
            name: "Window Cleaning".to_string(),
            price: Decimal::new(15000, 2),
            category: "cleaning".to_string(),
            recommended: true,
        }
    }

    #[test]
    fn carpet_medium_quantity_two_prices_without_discount() {
        let rule = carpet_rule();
        let mut state = CustomizationState::new();
        state.select_unit_type(&rule, "Medium");
        state.adjust_count(&rule, "carpets", 1);

        let breakdown = evaluate(&rule, &[], &state, None).expect("carpet evaluation");

        assert_eq!(breakdown.subtotal, Decimal::new(15000, 2));
        assert_eq!(breakdown.discount_rate, Decimal::ZERO);
        assert_eq!(breakdown.total, Decimal::new(15000, 2));
    }

    #[test]
    fn maid_service_multiplies_both_dials_and_discounts() {
        let rule = maid_rule();
        let mut state = CustomizationState::new();
        state.adjust_count(&rule, "maids", 2);
        state.adjust_count(&rule, "hours", 3);

        let breakdown = evaluate(&rule, &[], &state, None).expect("maid evaluation");

        assert_eq!(breakdown.subtotal, Decimal::new(96000, 2));
        assert_eq!(breakdown.discount_rate, Decimal::new(5, 2));
        assert_eq!(breakdown.discount_amount, Decimal::new(4800, 2));
        assert_eq!(breakdown.total, Decimal::new(91200, 2));
    }

    #[test]
    fn bathroom_with_add_on_crosses_the_discount_threshold() {
        let rule = bathroom_rule();
        let mut state = CustomizationState::new();
        state.adjust_count(&rule, "bathrooms", 4);
        state.toggle_add_on(&AddOnId("window-cleaning".to_string()));

        let breakdown =
            evaluate(&rule, &[window_cleaning()], &state, None).expect("bathroom evaluation");

        assert_eq!(breakdown.subtotal, Decimal::new(65000, 2));
        assert_eq!(breakdown.discount_rate, Decimal::new(5, 2));
        assert_eq!(breakdown.total, Decimal::new(61750, 2));
    }

    #[test]
    fn line_items_sum_exactly_to_the_subtotal() {
        let rule = maid_rule();
        let mut state = CustomizationState::new();
        state.adjust_count(&rule, "maids", 2);
        state.adjust_count(&rule, "hours", 3);
        state.toggle_add_on(&AddOnId("window-cleaning".to_string()));

        let breakdown =
            evaluate(&rule, &[window_cleaning()], &state, None).expect("maid evaluation");

        let summed: Decimal = breakdown.line_items.iter().map(|item| item.amount).sum();
        assert_eq!(summed, breakdown.subtotal);
        assert_eq!(breakdown.total, breakdown.subtotal - breakdown.discount_amount);
    }

    #[test]
    fn line_items_keep_base_then_customizations_then_add_ons_order() {
        let rule = bathroom_rule();
        let mut state = CustomizationState::new();
        state.adjust_count(&rule, "bathrooms", 2);
        state.toggle_add_on(&AddOnId("window-cleaning".to_string()));

        let breakdown =
            evaluate(&rule, &[window_cleaning()], &state, None).expect("bathroom evaluation");

        let labels: Vec<&str> =
            breakdown.line_items.iter().map(|item| item.label.as_str()).collect();
        assert_eq!(labels, vec!["Base", "bathrooms × 3", "Window Cleaning"]);
    }

    #[test]
    fn evaluation_is_pure_for_identical_inputs() {
        let rule = carpet_rule();
        let mut state = CustomizationState::new();
        state.select_unit_type(&rule, "Large");
        state.adjust_count(&rule, "carpets", 4);

        let first = evaluate(&rule, &[window_cleaning()], &state, None).expect("first run");
        let second = evaluate(&rule, &[window_cleaning()], &state, None).expect("second run");
        assert_eq!(first, second);
    }

    #[test]
    fn raising_any_count_never_decreases_the_subtotal() {
        let rule = maid_rule();
        let mut state = CustomizationState::new();
        state.adjust_count(&rule, "maids", 1);
        state.adjust_count(&rule, "hours", 2);

        let before = evaluate(&rule, &[], &state, None).expect("before").subtotal;
        for key in ["maids", "hours"] {
            let mut raised = state.clone();
            raised.adjust_count(&rule, key, 1);
            let after = evaluate(&rule, &[], &raised, None).expect("after").subtotal;
            assert!(after >= before, "raising {key} lowered the subtotal");
        }
    }

    #[test]
    fn toggling_an_add_on_twice_restores_the_breakdown() {
        let rule = bathroom_rule();
        let catalog = [window_cleaning()];
        let mut state = CustomizationState::new();
        state.adjust_count(&rule, "bathrooms", 2);

        let before = evaluate(&rule, &catalog, &state, None).expect("before");
        state.toggle_add_on(&AddOnId("window-cleaning".to_string()));
        state.toggle_add_on(&AddOnId("window-cleaning".to_string()));
        let after = evaluate(&rule, &catalog, &state, None).expect("after");

        assert_eq!(before, after);
    }

    #[test]
    fn oversized_adjustment_evaluates_at_the_dial_maximum() {
        let rule = bathroom_rule();
        let mut state = CustomizationState::new();
        state.adjust_count(&rule, "bathrooms", 1000);

        let breakdown = evaluate(&rule, &[], &state, None).expect("clamped evaluation");
        assert_eq!(breakdown.subtotal, Decimal::new(80000, 2));
    }

    #[test]
    fn out_of_range_counts_in_a_raw_state_clamp_at_evaluation() {
        let rule = bathroom_rule();
        let mut state = CustomizationState::new();
        state.counts.insert("bathrooms".to_string(), 50);

        let breakdown = evaluate(&rule, &[], &state, None).expect("clamped evaluation");
        assert_eq!(breakdown.subtotal, Decimal::new(80000, 2));
    }

    #[test]
    fn unknown_add_on_ids_are_skipped() {
        let rule = bathroom_rule();
        let mut state = CustomizationState::new();
        state.adjust_count(&rule, "bathrooms", 1);
        state.toggle_add_on(&AddOnId("retired-add-on".to_string()));

        let breakdown = evaluate(&rule, &[window_cleaning()], &state, None).expect("evaluation");
        assert_eq!(breakdown.line_items.len(), 2);
        assert_eq!(breakdown.subtotal, Decimal::new(20000, 2));
    }

    #[test]
    fn self_referential_add_on_selection_never_prices() {
        let rule = bathroom_rule();
        let self_add_on = AddOnService {
            id: AddOnId("bathroom-deep-cleaning".to_string()),
            name: "Bathroom Deep Cleaning".to_string(),
            price: Decimal::new(9900, 2),
            category: "cleaning".to_string(),
            recommended: false,
        };
        let mut state = CustomizationState::new();
        state.toggle_add_on(&AddOnId("bathroom-deep-cleaning".to_string()));

        let breakdown = evaluate(&rule, &[self_add_on], &state, None).expect("evaluation");
        assert_eq!(breakdown.line_items.len(), 1);
        assert_eq!(breakdown.subtotal, Decimal::new(10000, 2));
    }

    #[test]
    fn tiered_rule_without_a_selection_falls_back_to_base_price() {
        let rule = PricingRule {
            service_id: ServiceId("pest-control".to_string()),
            base_price: Decimal::new(14900, 2),
            strategy: StrategyKind::TieredBySize,
            parameters: StrategyParams::TieredBySize {
                tiers: vec![
                    SizeTier { label: "Studio".to_string(), price: Decimal::new(14900, 2) },
                    SizeTier { label: "Villa".to_string(), price: Decimal::new(39900, 2) },
                ],
            },
        };

        let breakdown =
            evaluate(&rule, &[], &CustomizationState::new(), None).expect("evaluation");
        assert_eq!(breakdown.subtotal, Decimal::new(14900, 2));
        assert_eq!(breakdown.line_items.len(), 1);
    }

    #[test]
    fn matrix_rule_without_a_count_selection_falls_back_to_base_price() {
        let rule = carpet_rule();
        let mut state = CustomizationState::new();
        state.select_unit_type(&rule, "Medium");

        let breakdown = evaluate(&rule, &[], &state, None).expect("evaluation");
        assert_eq!(breakdown.subtotal, Decimal::new(5000, 2));
    }

    #[test]
    fn missing_rule_degrades_to_the_service_base_price() {
        let service = Service {
            id: ServiceId("sofa-polishing".to_string()),
            name: "Sofa Polishing".to_string(),
            category: "cleaning".to_string(),
            base_price: Decimal::new(19900, 2),
        };
        let mut state = CustomizationState::new();
        state.counts.insert("seats".to_string(), 5);

        let breakdown = price_service(&service, None, &[], &state, None);

        assert_eq!(breakdown.line_items.len(), 1, "fallback carries zero customization lines");
        assert_eq!(breakdown.subtotal, Decimal::new(19900, 2));
    }

    #[test]
    fn mismatched_rule_degrades_to_the_service_base_price() {
        let service = Service {
            id: ServiceId("bathroom-deep-cleaning".to_string()),
            name: "Bathroom Deep Cleaning".to_string(),
            category: "cleaning".to_string(),
            base_price: Decimal::new(10000, 2),
        };
        let mut rule = bathroom_rule();
        rule.strategy = StrategyKind::TieredBySize;
        assert!(matches!(
            evaluate(&rule, &[], &CustomizationState::new(), None),
            Err(ConfigurationError::ParameterMismatch { .. })
        ));

        let breakdown = price_service(&service, Some(&rule), &[], &CustomizationState::new(), None);
        assert_eq!(breakdown.subtotal, Decimal::new(10000, 2));
    }

    #[test]
    fn promo_discount_stacks_below_the_volume_discount() {
        let rule = maid_rule();
        let mut state = CustomizationState::new();
        state.adjust_count(&rule, "maids", 2);
        state.adjust_count(&rule, "hours", 3);
        let promo = PromoDiscount { code: "WELCOME50".to_string(), amount: Decimal::new(5000, 2) };

        let breakdown = evaluate(&rule, &[], &state, Some(&promo)).expect("promo evaluation");

        assert_eq!(breakdown.discount_amount, Decimal::new(4800, 2));
        let applied = breakdown.promo_discount.as_ref().expect("promo applied");
        assert_eq!(applied.amount, Decimal::new(5000, 2));
        assert_eq!(
            breakdown.total,
            breakdown.subtotal - breakdown.discount_amount - applied.amount
        );
    }

    #[test]
    fn promo_discount_never_pushes_the_total_negative() {
        let rule = bathroom_rule();
        let state = CustomizationState::new();
        let promo =
            PromoDiscount { code: "EVERYTHING".to_string(), amount: Decimal::new(100000, 2) };

        let breakdown = evaluate(&rule, &[], &state, Some(&promo)).expect("promo evaluation");

        assert_eq!(breakdown.total, Decimal::ZERO);
        let applied = breakdown.promo_discount.expect("promo applied");
        assert_eq!(applied.amount, breakdown.subtotal - breakdown.discount_amount);
    }
}
