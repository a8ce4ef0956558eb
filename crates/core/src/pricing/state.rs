use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::addon::AddOnId;
use crate::pricing::rules::PricingRule;

/// The selection a user builds up for one service. Owned by a single
/// booking session; every mutation is synchronous and the owning session
/// recomputes the breakdown before the next render.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomizationState {
    pub selected_unit_type: Option<String>,
    pub counts: BTreeMap<String, u32>,
    pub selected_add_on_ids: BTreeSet<AddOnId>,
}

impl CustomizationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the selected size label. Labels the rule does not declare
    /// are ignored, leaving the previous selection in place.
    pub fn select_unit_type(&mut self, rule: &PricingRule, label: &str) {
        if rule.size_tiers().iter().any(|tier| tier.label == label) {
            self.selected_unit_type = Some(label.to_string());
        }
    }

    /// Applies a signed adjustment to a count dial. Values clamp silently
    /// to the dial bounds, matching +/- controls that disable at the ends;
    /// an unset count starts from the dial minimum. Keys the rule declares
    /// no dial for are ignored.
    pub fn adjust_count(&mut self, rule: &PricingRule, key: &str, delta: i32) {
        let Some(dial) = rule.dial(key) else {
            return;
        };
        let current = self.counts.get(key).copied().unwrap_or(dial.min);
        let adjusted = dial.bound(current.saturating_add_signed(delta));
        self.counts.insert(key.to_string(), adjusted);
    }

    /// Adds the id if absent, removes it if present. A toggle, not a
    /// stacking counter.
    pub fn toggle_add_on(&mut self, id: &AddOnId) {
        if !self.selected_add_on_ids.remove(id) {
            self.selected_add_on_ids.insert(id.clone());
        }
    }
}
